//! C3 — the stub taxonomy: the tagged variants of declarable entities
//! and the type-expression language they're typed with (§3.1).
//!
//! This module only defines the shapes. Creating, linking, resolving and
//! querying them is [`crate::stub_library`] (C4) and
//! [`crate::cast_matrix`] (C5).

pub mod flags;
pub mod ids;
pub mod kinds;
pub mod location;

pub use flags::{ArgFlags, ClassFlags, FunctionFlags, MemberFlags};
pub use ids::{
    ClassId, ConstantId, ConstantValueId, EnumId, EnumOptionId, FileId, FunctionArgId, FunctionId,
    ModuleId, ModuleImportId, PropertyId, ResolvedSymbol, StubOwner, TypeDeclId, TypeNameId,
    TypeRefId,
};
pub use kinds::{
    Class, ClassMember, Constant, ConstantValue, EngineType, Enum, EnumOption, File, Function,
    FunctionArg, Module, ModuleImport, Property, TopLevelMember, TypeDecl, TypeName, TypeRef,
};
pub use location::SourceLocation;
