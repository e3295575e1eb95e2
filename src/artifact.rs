//! The compiled-module artifact (§6.4a): a `serde`-friendly snapshot of
//! a [`StubLibrary`]'s arenas, serialized with `serde_json` by the CLI's
//! `build` subcommand and read back in for `--import`. Explicitly a
//! convenience format, not a spec'd wire format — the one contract it
//! has to honor is the round-trip property in §8: importing a
//! deserialized artifact and re-resolving it must reproduce the
//! original type identities.

use crate::stub_library::StubLibrary;
use crate::stubs::ids::{
    ClassId, ConstantId, ConstantValueId, EnumId, EnumOptionId, FileId, FunctionArgId, FunctionId,
    ModuleId, ModuleImportId, PropertyId, TypeDeclId, TypeNameId, TypeRefId,
};
use crate::stubs::kinds::{
    Class, Constant, ConstantValue, Enum, EnumOption, File, Function, FunctionArg, Module,
    ModuleImport, Property, TypeDecl, TypeName, TypeRef,
};
use crate::arena::IdArena;
use crate::string_interning::StringTable;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ModuleArtifact {
    pub strings: StringTable,
    pub modules: IdArena<ModuleId, Module>,
    pub files: IdArena<FileId, File>,
    pub module_imports: IdArena<ModuleImportId, ModuleImport>,
    pub classes: IdArena<ClassId, Class>,
    pub enums: IdArena<EnumId, Enum>,
    pub enum_options: IdArena<EnumOptionId, EnumOption>,
    pub properties: IdArena<PropertyId, Property>,
    pub functions: IdArena<FunctionId, Function>,
    pub function_args: IdArena<FunctionArgId, FunctionArg>,
    pub constants: IdArena<ConstantId, Constant>,
    pub constant_values: IdArena<ConstantValueId, ConstantValue>,
    pub type_names: IdArena<TypeNameId, TypeName>,
    pub type_refs: IdArena<TypeRefId, TypeRef>,
    pub type_decls: IdArena<TypeDeclId, TypeDecl>,
    pub primary_module: Option<ModuleId>,
}

impl ModuleArtifact {
    /// The primary module's own name, as it should be matched against an
    /// `import <name>;` declaration in whatever compilation imports this
    /// artifact.
    pub fn module_name(&self) -> Option<&str> {
        let id = self.primary_module?;
        let name = self.modules.try_get(id)?.name;
        self.strings.try_resolve(name)
    }

    pub fn from_library(lib: &StubLibrary) -> Self {
        Self {
            strings: lib.strings.clone(),
            modules: lib.modules.clone(),
            files: lib.files.clone(),
            module_imports: lib.module_imports.clone(),
            classes: lib.classes.clone(),
            enums: lib.enums.clone(),
            enum_options: lib.enum_options.clone(),
            properties: lib.properties.clone(),
            functions: lib.functions.clone(),
            function_args: lib.function_args.clone(),
            constants: lib.constants.clone(),
            constant_values: lib.constant_values.clone(),
            type_names: lib.type_names.clone(),
            type_refs: lib.type_refs.clone(),
            type_decls: lib.type_decls.clone(),
            primary_module: lib.primary_module,
        }
    }

    pub fn into_library(self) -> StubLibrary {
        StubLibrary::from_arenas(
            self.strings,
            self.modules,
            self.files,
            self.module_imports,
            self.classes,
            self.enums,
            self.enum_options,
            self.properties,
            self.functions,
            self.function_args,
            self.constants,
            self.constant_values,
            self.type_names,
            self.type_refs,
            self.type_decls,
            self.primary_module,
        )
    }
}
