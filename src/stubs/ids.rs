//! Typed arena handles for every stub kind (§9 Design Notes: "represent
//! the stub set as an arena of typed slots indexed by a small integer
//! handle"). One id type per kind rather than a single sum `StubId`,
//! matching the teacher's `HirNodeId`/`BlockId`/`TypeId` split — each
//! arena lives in its own `Vec` on `StubLibrary` and every cross-reference
//! (owner, base, resolved) is one of these `Copy` handles.

use crate::define_arena_id;

define_arena_id!(
    /// A top-level namespace; owns a set of files and a list of imports.
    ModuleId
);
define_arena_id!(
    /// One source file belonging to a module.
    FileId
);
define_arena_id!(
    /// A `import Foo.Bar;` declaration, resolved to a `ModuleId` once
    /// dependency loading completes.
    ModuleImportId
);
define_arena_id!(
    /// A class or struct declaration (struct-ness is a flag, not a
    /// separate kind).
    ClassId
);
define_arena_id!(EnumId);
define_arena_id!(EnumOptionId);
define_arena_id!(PropertyId);
define_arena_id!(FunctionId);
define_arena_id!(FunctionArgId);
define_arena_id!(ConstantId);
define_arena_id!(ConstantValueId);
define_arena_id!(
    /// A named type alias, e.g. `typealias Vec3 = Vector3;`.
    TypeNameId
);
define_arena_id!(
    /// A pending or resolved by-name reference to a class or enum.
    TypeRefId
);
define_arena_id!(
    /// A type expression (§3.1 `TypeDecl`).
    TypeDeclId
);

/// The containment-tree parent of a stub. Every stub except a `Module`
/// has one; the primary module's files point back at their module, a
/// class's members point back at the class, and so on (§3.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum StubOwner {
    Module(ModuleId),
    File(FileId),
    Class(ClassId),
    Function(FunctionId),
}

/// What a resolved [`TypeRef`](crate::stubs::kinds::TypeRef) or the
/// resolved-stub slot of a `TypeDecl` can point at. `TypeName` targets
/// are inlined away during type-decl resolution (§4.3.2) but the
/// `TypeRef` itself may still observe one before that pass runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ResolvedSymbol {
    Class(ClassId),
    Enum(EnumId),
    TypeName(TypeNameId),
}

impl ResolvedSymbol {
    pub fn as_class(self) -> Option<ClassId> {
        match self {
            ResolvedSymbol::Class(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_enum(self) -> Option<EnumId> {
        match self {
            ResolvedSymbol::Enum(id) => Some(id),
            _ => None,
        }
    }
}
