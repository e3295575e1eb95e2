//! Name resolution (§4.3.1): a dotted identifier plus a context stub,
//! resolved by walking up the owner chain for the head component and
//! then descending as a child lookup for each remaining component.

use super::StubLibrary;
use crate::interned_path::InternedPath;
use crate::stubs::ids::{
    ClassId, ConstantId, EnumId, EnumOptionId, FileId, FunctionArgId, FunctionId, ModuleId,
    ModuleImportId, PropertyId, StubOwner, TypeNameId,
};
use crate::stubs::kinds::{ClassMember, TopLevelMember};
use crate::string_interning::StringId;

/// Any stub `resolve_name` can terminate on. A superset of
/// [`crate::stubs::ResolvedSymbol`] (which only needs Class/Enum/TypeName
/// for `TypeRef` targets) since general name resolution inside function
/// bodies (C9) and base-class lookups (§4.3.3) can land on any kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolvedStub {
    Module(ModuleId),
    File(FileId),
    ModuleImport(ModuleImportId),
    Class(ClassId),
    Enum(EnumId),
    EnumOption(EnumOptionId),
    Property(PropertyId),
    Function(FunctionId),
    FunctionArg(FunctionArgId),
    Constant(ConstantId),
    TypeName(TypeNameId),
}

impl From<TopLevelMember> for ResolvedStub {
    fn from(m: TopLevelMember) -> Self {
        match m {
            TopLevelMember::Class(id) => ResolvedStub::Class(id),
            TopLevelMember::Enum(id) => ResolvedStub::Enum(id),
            TopLevelMember::Function(id) => ResolvedStub::Function(id),
            TopLevelMember::Property(id) => ResolvedStub::Property(id),
            TopLevelMember::Constant(id) => ResolvedStub::Constant(id),
            TopLevelMember::TypeName(id) => ResolvedStub::TypeName(id),
        }
    }
}

impl From<ClassMember> for ResolvedStub {
    fn from(m: ClassMember) -> Self {
        match m {
            ClassMember::Property(id) => ResolvedStub::Property(id),
            ClassMember::Function(id) => ResolvedStub::Function(id),
            ClassMember::NestedClass(id) => ResolvedStub::Class(id),
            ClassMember::Constant(id) => ResolvedStub::Constant(id),
            ClassMember::Enum(id) => ResolvedStub::Enum(id),
        }
    }
}

impl StubLibrary {
    /// `a.b.c` resolved starting from `context` (§4.3.1).
    pub fn resolve_name(&self, path: &InternedPath, context: StubOwner) -> Option<ResolvedStub> {
        let parts = path.as_components().to_vec();
        let (&head, rest) = parts.split_first()?;
        let mut resolved = self.root_lookup(head, context)?;
        for &part in rest {
            resolved = self.child_lookup(resolved, part)?;
        }
        Some(resolved)
    }

    /// Step 2: walk up the owner chain from `context`, checking each
    /// level for a direct child named `name`; if no level matches, fall
    /// back to the primary module's imports.
    fn root_lookup(&self, name: StringId, context: StubOwner) -> Option<ResolvedStub> {
        let mut current = Some(context);
        while let Some(owner) = current {
            if let Some(found) = self.direct_child_named(owner, name) {
                return Some(found);
            }
            current = self.parent_of(owner);
        }
        self.lookup_in_imports(name)
    }

    fn parent_of(&self, owner: StubOwner) -> Option<StubOwner> {
        match owner {
            StubOwner::Module(_) => None,
            StubOwner::File(f) => Some(StubOwner::Module(self.files.get(f).owner)),
            StubOwner::Class(c) => Some(self.classes.get(c).owner),
            StubOwner::Function(fun) => Some(self.functions.get(fun).owner),
        }
    }

    fn direct_child_named(&self, owner: StubOwner, name: StringId) -> Option<ResolvedStub> {
        match owner {
            StubOwner::Module(m) => self
                .modules
                .get(m)
                .members
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, member)| (*member).into()),
            StubOwner::File(f) => self
                .files
                .get(f)
                .top_level
                .iter()
                .find(|&&member| self.top_level_member_name(member) == name)
                .map(|&member| member.into()),
            StubOwner::Class(c) => self
                .classes
                .get(c)
                .member_names
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, member)| (*member).into()),
            StubOwner::Function(fun) => self
                .functions
                .get(fun)
                .args
                .iter()
                .find(|&&a| self.function_args.get(a).name == name)
                .map(|&a| ResolvedStub::FunctionArg(a)),
        }
    }

    fn lookup_in_imports(&self, name: StringId) -> Option<ResolvedStub> {
        let primary = self.primary_module?;
        for &imported in &self.modules.get(primary).imported_modules {
            if let Some(found) = self.direct_child_named(StubOwner::Module(imported), name) {
                return Some(found);
            }
        }
        None
    }

    /// Step 3: look up `name` as a child of an already-resolved stub.
    fn child_lookup(&self, resolved: ResolvedStub, name: StringId) -> Option<ResolvedStub> {
        match resolved {
            ResolvedStub::Module(m) => self.direct_child_named(StubOwner::Module(m), name),
            ResolvedStub::Class(c) => self.direct_child_named(StubOwner::Class(c), name),
            ResolvedStub::File(f) => self.direct_child_named(StubOwner::File(f), name),
            ResolvedStub::ModuleImport(mi) => {
                let target = self.module_imports.get(mi).resolved?;
                self.direct_child_named(StubOwner::Module(target), name)
            }
            ResolvedStub::Function(fun) => self.direct_child_named(StubOwner::Function(fun), name),
            _ => None,
        }
    }
}
