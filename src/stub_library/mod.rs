//! C4 — the stub library: the owning registry of every declared and
//! imported stub for one module compilation (§4.3). Creation APIs live
//! here; the resolution/validation/linking passes that turn a freshly
//! populated library into a fully resolved one are split out by concern
//! into sibling modules, mirroring the way the teacher splits HIR
//! construction (`hir_builder.rs`) from HIR datatypes and display.

mod access_control;
mod class_linking;
mod ctor_dtor_synthesis;
mod enum_validation;
mod function_validation;
mod import_merge;
mod import_prune;
mod name_resolution;
mod operator_naming;
mod type_resolution;

pub use access_control::is_accessible;
pub use name_resolution::ResolvedStub;

use crate::arena::IdArena;
use crate::diagnostics::ErrorSink;
use crate::stubs::ids::{
    ClassId, ConstantId, ConstantValueId, EnumId, EnumOptionId, FileId, FunctionArgId, FunctionId,
    ModuleId, ModuleImportId, PropertyId, StubOwner, TypeDeclId, TypeNameId, TypeRefId,
};
use crate::stubs::kinds::{
    Class, ClassMember, Constant, ConstantValue, EngineType, Enum, EnumOption, File, Function,
    FunctionArg, Module, ModuleImport, Property, TopLevelMember, TypeDecl, TypeName, TypeRef,
};
use crate::stubs::{ClassFlags, FunctionFlags, MemberFlags, SourceLocation};
use crate::interned_path::InternedPath;
use crate::string_interning::{StringId, StringTable};
use rustc_hash::FxHashMap;
use std::path::PathBuf;

/// Owning registry of every stub belonging to one compilation: the
/// primary module plus every import merged into it (§4.3.9). Mutating
/// APIs are plain `&mut self` methods rather than behind a lock — this
/// crate parses files sequentially (§5's "for simplicity a sequential
/// per-file pass is also acceptable" escape hatch) rather than fanning
/// creation out across threads, so there's nothing to contend on.
pub struct StubLibrary {
    pub strings: StringTable,
    pub errors: ErrorSink,

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

    /// The module being compiled; everything else reachable from it is
    /// either declared directly or pulled in via `merge_import`.
    pub primary_module: Option<ModuleId>,

    /// Canonicalization cache: one `TypeDecl` per engine primitive (§4.3
    /// Creation APIs).
    engine_type_cache: FxHashMap<EngineType, TypeDeclId>,
    /// Canonicalization cache for `TypeRef`s: same owner context and same
    /// dotted name reuse one id, so two mentions of the same name in the
    /// same scope share a single unresolved-list entry.
    type_ref_cache: FxHashMap<(Option<StubOwner>, InternedPath), TypeRefId>,

    /// Populated by the `TypeRef`/`TypeDecl` creators (§4.3 Creation
    /// APIs) so the resolution passes (§4.3.2) don't need to re-walk
    /// every arena looking for work.
    unresolved_type_refs: Vec<TypeRefId>,
    unresolved_type_decls: Vec<TypeDeclId>,
}

impl StubLibrary {
    pub fn new() -> Self {
        Self {
            strings: StringTable::new(),
            errors: ErrorSink::new(),
            modules: IdArena::new(),
            files: IdArena::new(),
            module_imports: IdArena::new(),
            classes: IdArena::new(),
            enums: IdArena::new(),
            enum_options: IdArena::new(),
            properties: IdArena::new(),
            functions: IdArena::new(),
            function_args: IdArena::new(),
            constants: IdArena::new(),
            constant_values: IdArena::new(),
            type_names: IdArena::new(),
            type_refs: IdArena::new(),
            type_decls: IdArena::new(),
            primary_module: None,
            engine_type_cache: FxHashMap::default(),
            type_ref_cache: FxHashMap::default(),
            unresolved_type_refs: Vec::new(),
            unresolved_type_decls: Vec::new(),
        }
    }

    /// Rebuilds a library from the arenas of a deserialized
    /// [`crate::artifact::ModuleArtifact`] (§6.4a). The caches and
    /// worklists `new()` would otherwise populate are left empty: the
    /// unresolved-ref/decl lists only matter mid-compilation, and an
    /// artifact is only ever produced after a clean compile, so nothing
    /// should still be pending.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_arenas(
        strings: StringTable,
        modules: IdArena<crate::stubs::ids::ModuleId, Module>,
        files: IdArena<crate::stubs::ids::FileId, File>,
        module_imports: IdArena<crate::stubs::ids::ModuleImportId, ModuleImport>,
        classes: IdArena<crate::stubs::ids::ClassId, Class>,
        enums: IdArena<crate::stubs::ids::EnumId, Enum>,
        enum_options: IdArena<crate::stubs::ids::EnumOptionId, EnumOption>,
        properties: IdArena<crate::stubs::ids::PropertyId, Property>,
        functions: IdArena<crate::stubs::ids::FunctionId, Function>,
        function_args: IdArena<crate::stubs::ids::FunctionArgId, FunctionArg>,
        constants: IdArena<crate::stubs::ids::ConstantId, Constant>,
        constant_values: IdArena<crate::stubs::ids::ConstantValueId, ConstantValue>,
        type_names: IdArena<crate::stubs::ids::TypeNameId, TypeName>,
        type_refs: IdArena<crate::stubs::ids::TypeRefId, TypeRef>,
        type_decls: IdArena<crate::stubs::ids::TypeDeclId, TypeDecl>,
        primary_module: Option<crate::stubs::ids::ModuleId>,
    ) -> Self {
        Self {
            strings,
            errors: ErrorSink::new(),
            modules,
            files,
            module_imports,
            classes,
            enums,
            enum_options,
            properties,
            functions,
            function_args,
            constants,
            constant_values,
            type_names,
            type_refs,
            type_decls,
            primary_module,
            engine_type_cache: FxHashMap::default(),
            type_ref_cache: FxHashMap::default(),
            unresolved_type_refs: Vec::new(),
            unresolved_type_decls: Vec::new(),
        }
    }

    pub fn file_abs_path(&self, file: FileId) -> PathBuf {
        self.files.get(file).abs_path.clone()
    }

    fn module_of_owner(&self, owner: StubOwner) -> ModuleId {
        match owner {
            StubOwner::Module(m) => m,
            StubOwner::File(f) => self.files.get(f).owner,
            StubOwner::Class(c) => self.module_of_owner(self.classes.get(c).owner),
            StubOwner::Function(fun) => self.module_of_owner(self.functions.get(fun).owner),
        }
    }

    /// The file a diagnostic about `owner` should be blamed on, walking
    /// up until a `File` owner is found. Used when a stub's own location
    /// isn't available (e.g. class-level validation messages), and by
    /// the driver to find which file's token stream a function body
    /// range indexes into.
    pub fn file_of_owner(&self, owner: StubOwner) -> Option<FileId> {
        match owner {
            StubOwner::Module(_) => None,
            StubOwner::File(f) => Some(f),
            StubOwner::Class(c) => self.file_of_owner(self.classes.get(c).owner),
            StubOwner::Function(fun) => self.file_of_owner(self.functions.get(fun).owner),
        }
    }

    // ---------------------------------------------------------------
    // Creation APIs (§4.3 "One creator per stub kind")
    // ---------------------------------------------------------------

    pub fn create_module(&mut self, name: StringId) -> ModuleId {
        self.modules.alloc(Module { name, files: Vec::new(), imported_modules: Vec::new(), members: Vec::new() })
    }

    pub fn create_file(&mut self, owner: ModuleId, depot_path: StringId, abs_path: PathBuf) -> FileId {
        let file = self.files.alloc(File { owner, depot_path, abs_path, top_level: Vec::new() });
        self.modules.get_mut(owner).files.push(file);
        file
    }

    pub fn create_module_import(&mut self, owner: FileId, location: SourceLocation, name: StringId) -> ModuleImportId {
        self.module_imports.alloc(ModuleImport { owner, location, name, resolved: None })
    }

    pub fn create_class(&mut self, owner: StubOwner, location: SourceLocation, name: StringId, flags: ClassFlags) -> ClassId {
        let id = self.classes.alloc(Class {
            owner,
            location,
            name,
            flags,
            base_name: None,
            base_resolved: None,
            parent_name: None,
            parent_resolved: None,
            engine_alias: None,
            members: Vec::new(),
            member_names: Vec::new(),
            derived_classes: Vec::new(),
            child_classes: Vec::new(),
        });
        self.attach(owner, location, name, TopLevelMember::Class(id), Some(ClassMember::NestedClass(id)));
        id
    }

    pub fn create_enum(&mut self, owner: StubOwner, location: SourceLocation, name: StringId, flags: MemberFlags) -> EnumId {
        let id = self.enums.alloc(Enum { owner, location, name, flags, engine_alias: None, options: Vec::new(), option_names: Vec::new() });
        self.attach(owner, location, name, TopLevelMember::Enum(id), Some(ClassMember::Enum(id)));
        id
    }

    pub fn create_enum_option(&mut self, owner: EnumId, location: SourceLocation, name: StringId, user_value: Option<i64>) -> EnumOptionId {
        let id = self.enum_options.alloc(EnumOption {
            owner,
            location,
            name,
            value: user_value.unwrap_or(0),
            has_user_assigned_value: user_value.is_some(),
        });
        let e = self.enums.get_mut(owner);
        if e.option_names.iter().any(|(n, _)| *n == name) {
            self.errors.report_error(self.files_abs_path_for_enum(owner), location.line, format!("duplicate enum option `{}`", name.resolve(&self.strings)));
        }
        e.options.push(id);
        e.option_names.push((name, id));
        id
    }

    fn files_abs_path_for_enum(&self, e: EnumId) -> PathBuf {
        self.file_of_owner(self.enums.get(e).owner).map(|f| self.file_abs_path(f)).unwrap_or_default()
    }

    pub fn create_property(&mut self, owner: StubOwner, location: SourceLocation, name: StringId, flags: MemberFlags, type_decl: TypeDeclId, default_value: Option<ConstantValueId>) -> PropertyId {
        let id = self.properties.alloc(Property { owner, location, name, flags, type_decl, default_value });
        self.attach(owner, location, name, TopLevelMember::Property(id), Some(ClassMember::Property(id)));
        id
    }

    pub fn create_function(&mut self, owner: StubOwner, location: SourceLocation, name: StringId, flags: FunctionFlags, return_type: Option<TypeDeclId>) -> FunctionId {
        let id = self.functions.alloc(Function {
            owner,
            location,
            name,
            return_type,
            args: Vec::new(),
            flags,
            operator_symbol: None,
            opcode_name: None,
            alias_name: None,
            cast_cost: None,
            cast_explicit: false,
            base_function: None,
            body_tokens: None,
            opcodes: Vec::new(),
        });
        self.attach(owner, location, name, TopLevelMember::Function(id), Some(ClassMember::Function(id)));
        id
    }

    pub fn create_function_arg(&mut self, owner: FunctionId, location: SourceLocation, name: StringId, type_decl: TypeDeclId, flags: crate::stubs::ArgFlags, default_value: Option<ConstantValueId>) -> FunctionArgId {
        let index = self.functions.get(owner).args.len() as u32;
        if self.functions.get(owner).args.iter().any(|&a| self.function_args.get(a).name == name) {
            let path = self.file_of_owner(self.functions.get(owner).owner).map(|f| self.file_abs_path(f)).unwrap_or_default();
            self.errors.report_error(path, location.line, format!("duplicate argument name `{}`", name.resolve(&self.strings)));
        }
        let id = self.function_args.alloc(FunctionArg { owner, location, name, type_decl, flags, default_value, index });
        self.functions.get_mut(owner).args.push(id);
        id
    }

    pub fn create_constant(&mut self, owner: StubOwner, location: SourceLocation, name: StringId, type_decl: TypeDeclId, value: ConstantValueId) -> ConstantId {
        let id = self.constants.alloc(Constant { owner, location, name, flags: MemberFlags::empty(), type_decl, value });
        self.attach(owner, location, name, TopLevelMember::Constant(id), Some(ClassMember::Constant(id)));
        id
    }

    pub fn create_constant_value(&mut self, value: ConstantValue) -> ConstantValueId {
        self.constant_values.alloc(value)
    }

    /// `TypeName` has no `ClassMember` counterpart (§3.1 only lists type
    /// aliases as a top-level/file-scope construct); declaring one inside
    /// a class is rejected rather than silently dropped.
    pub fn create_type_name(&mut self, owner: StubOwner, location: SourceLocation, name: StringId, aliased: TypeDeclId) -> TypeNameId {
        if let StubOwner::Class(_) = owner {
            let path = self.file_of_owner(owner).map(|f| self.file_abs_path(f)).unwrap_or_default();
            self.errors.report_error(path, location.line, "type aliases may only be declared at module scope");
        }
        let id = self.type_names.alloc(TypeName { owner, location, name, aliased });
        self.attach(owner, location, name, TopLevelMember::TypeName(id), None);
        id
    }

    /// De-duplicated per `(owner, name)` (§4.3 Creation APIs).
    pub fn create_type_ref(&mut self, owner: Option<StubOwner>, location: SourceLocation, name: InternedPath) -> TypeRefId {
        let key = (owner, name.clone());
        if let Some(&existing) = self.type_ref_cache.get(&key) {
            return existing;
        }
        let id = self.type_refs.alloc(TypeRef { owner, location, name, resolved: None });
        self.type_ref_cache.insert(key, id);
        self.unresolved_type_refs.push(id);
        id
    }

    /// De-duplicated by `EngineType` (§4.3 Creation APIs).
    pub fn engine_type_decl(&mut self, engine: EngineType) -> TypeDeclId {
        if let Some(&id) = self.engine_type_cache.get(&engine) {
            return id;
        }
        let id = self.type_decls.alloc(TypeDecl::Engine(engine));
        self.engine_type_cache.insert(engine, id);
        id
    }

    pub fn simple_type_decl(&mut self, type_ref: TypeRefId) -> TypeDeclId {
        self.new_type_decl(TypeDecl::Simple(type_ref))
    }

    pub fn class_type_decl(&mut self, type_ref: TypeRefId) -> TypeDeclId {
        self.new_type_decl(TypeDecl::ClassType(type_ref))
    }

    pub fn ptr_type_decl(&mut self, type_ref: TypeRefId) -> TypeDeclId {
        self.new_type_decl(TypeDecl::PtrType(type_ref))
    }

    pub fn weak_ptr_type_decl(&mut self, type_ref: TypeRefId) -> TypeDeclId {
        self.new_type_decl(TypeDecl::WeakPtrType(type_ref))
    }

    pub fn static_array_type_decl(&mut self, inner: TypeDeclId, size: u32) -> TypeDeclId {
        self.new_type_decl(TypeDecl::StaticArrayType { inner, size })
    }

    pub fn dynamic_array_type_decl(&mut self, inner: TypeDeclId) -> TypeDeclId {
        self.new_type_decl(TypeDecl::DynamicArrayType { inner })
    }

    fn new_type_decl(&mut self, decl: TypeDecl) -> TypeDeclId {
        let id = self.type_decls.alloc(decl);
        self.unresolved_type_decls.push(id);
        id
    }

    /// Attaches a freshly created stub to its owner: a top-level member
    /// list for `Module`/`File` owners, the name-keyed member list for a
    /// `Class` owner (when the kind has one). Functions cannot own
    /// top-level declarations other than their arguments, which go
    /// through `create_function_arg`.
    fn attach(&mut self, owner: StubOwner, location: SourceLocation, name: StringId, top_level: TopLevelMember, class_member: Option<ClassMember>) {
        match owner {
            StubOwner::Module(_) | StubOwner::File(f) => {
                self.files.get_mut(f).top_level.push(top_level);
            }
            StubOwner::Class(c) => {
                let Some(class_member) = class_member else {
                    let path = self.file_of_owner(StubOwner::Class(c)).map(|f| self.file_abs_path(f)).unwrap_or_default();
                    self.errors.report_error(path, location.line, "this declaration cannot appear inside a class");
                    return;
                };
                let class = self.classes.get_mut(c);
                if class.member_names.iter().any(|(n, _)| *n == name) {
                    let path = self.file_of_owner(StubOwner::Class(c)).map(|f| self.file_abs_path(f)).unwrap_or_default();
                    self.errors.report_error(path, location.line, format!("`{}` is already declared in this class", name.resolve(&self.strings)));
                }
                class.member_names.push((name, class_member));
                class.members.push(class_member);
            }
            StubOwner::Function(_) => {
                // Only arguments and locals belong to a function; the
                // latter live in the Function AST (C7), not here.
            }
        }
    }

    /// Builds each module's aggregated name→member map from its files'
    /// top-level lists (§3.1 Module's "name→top-level member map built
    /// during finalization"). Call once per module after all its files
    /// are populated by C6, before name resolution runs.
    pub fn finalize_module_members(&mut self, module: ModuleId) {
        let file_ids = self.modules.get(module).files.clone();
        let mut members = Vec::new();
        for file in file_ids {
            let top_level = self.files.get(file).top_level.clone();
            for member in top_level {
                let name = self.top_level_member_name(member);
                if members.iter().any(|(n, _): &(StringId, TopLevelMember)| *n == name) {
                    self.errors.report_error(self.file_abs_path(file), 0, format!("`{}` is already declared in this module", name.resolve(&self.strings)));
                    continue;
                }
                members.push((name, member));
            }
        }
        self.modules.get_mut(module).members = members;
    }

    pub(crate) fn top_level_member_name(&self, member: TopLevelMember) -> StringId {
        match member {
            TopLevelMember::Class(id) => self.classes.get(id).name,
            TopLevelMember::Enum(id) => self.enums.get(id).name,
            TopLevelMember::Function(id) => self.functions.get(id).name,
            TopLevelMember::Property(id) => self.properties.get(id).name,
            TopLevelMember::Constant(id) => self.constants.get(id).name,
            TopLevelMember::TypeName(id) => self.type_names.get(id).name,
        }
    }

    pub(crate) fn class_member_name(&self, member: ClassMember) -> StringId {
        match member {
            ClassMember::Property(id) => self.properties.get(id).name,
            ClassMember::Function(id) => self.functions.get(id).name,
            ClassMember::NestedClass(id) => self.classes.get(id).name,
            ClassMember::Constant(id) => self.constants.get(id).name,
            ClassMember::Enum(id) => self.enums.get(id).name,
        }
    }
}

impl Default for StubLibrary {
    fn default() -> Self {
        Self::new()
    }
}
