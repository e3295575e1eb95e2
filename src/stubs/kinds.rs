//! The stub taxonomy itself (§3.1): one struct per kind, holding exactly
//! the fields the spec lists. Shared-header fields (owner, name,
//! location) are not factored into a common base struct — the design
//! notes call either approach acceptable, and keeping them inline reads
//! closer to the teacher's `HirModule`/`HirBlock` node structs, which do
//! the same.

use crate::stubs::flags::{ArgFlags, ClassFlags, FunctionFlags, MemberFlags};
use crate::stubs::ids::{
    ClassId, ConstantId, ConstantValueId, EnumId, EnumOptionId, FileId, FunctionArgId, FunctionId,
    ModuleId, ModuleImportId, PropertyId, ResolvedSymbol, StubOwner, TypeDeclId, TypeNameId,
    TypeRefId,
};
use crate::stubs::location::SourceLocation;
use crate::string_interning::StringId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub name: StringId,
    pub files: Vec<FileId>,
    /// Other modules this one imports, in import-declaration order.
    pub imported_modules: Vec<ModuleId>,
    /// name -> top-level member, built during finalization (§3.3).
    pub members: Vec<(StringId, TopLevelMember)>,
}

/// Anything that can live directly under a module or file (§3.1: File's
/// "owned list of top-level stubs").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TopLevelMember {
    Class(ClassId),
    Enum(EnumId),
    Function(FunctionId),
    Property(PropertyId),
    Constant(ConstantId),
    TypeName(TypeNameId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct File {
    pub owner: ModuleId,
    /// Path relative to the source depot root, as handed in by the cooker.
    pub depot_path: StringId,
    pub abs_path: std::path::PathBuf,
    pub top_level: Vec<TopLevelMember>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleImport {
    pub owner: FileId,
    pub location: SourceLocation,
    pub name: StringId,
    pub resolved: Option<ModuleId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Class {
    pub owner: StubOwner,
    pub location: SourceLocation,
    pub name: StringId,
    pub flags: ClassFlags,
    pub base_name: Option<StringId>,
    pub base_resolved: Option<ClassId>,
    pub parent_name: Option<StringId>,
    pub parent_resolved: Option<ClassId>,
    /// Engine-side alias this class maps to when `IMPORT` is set.
    pub engine_alias: Option<StringId>,
    pub members: Vec<ClassMember>,
    pub member_names: Vec<(StringId, ClassMember)>,
    /// Back-links, not ownership (§3.1).
    pub derived_classes: Vec<ClassId>,
    pub child_classes: Vec<ClassId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassMember {
    Property(PropertyId),
    Function(FunctionId),
    NestedClass(ClassId),
    Constant(ConstantId),
    Enum(EnumId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enum {
    pub owner: StubOwner,
    pub location: SourceLocation,
    pub name: StringId,
    pub flags: MemberFlags,
    pub engine_alias: Option<StringId>,
    pub options: Vec<EnumOptionId>,
    pub option_names: Vec<(StringId, EnumOptionId)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumOption {
    pub owner: EnumId,
    pub location: SourceLocation,
    pub name: StringId,
    pub value: i64,
    pub has_user_assigned_value: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub owner: StubOwner,
    pub location: SourceLocation,
    pub name: StringId,
    pub flags: MemberFlags,
    pub type_decl: TypeDeclId,
    pub default_value: Option<ConstantValueId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub owner: StubOwner,
    pub location: SourceLocation,
    pub name: StringId,
    pub return_type: Option<TypeDeclId>,
    pub args: Vec<FunctionArgId>,
    pub flags: FunctionFlags,
    /// Operator symbol, e.g. `opAdd`, set when `OPERATOR` is set.
    pub operator_symbol: Option<StringId>,
    /// Native opcode this function compiles to, set when `OPCODE_ALIAS`
    /// is set (§4.9.1).
    pub opcode_name: Option<StringId>,
    /// Overload-set name distinct from the mangled `name` (§4.3.7,
    /// Glossary "Alias function").
    pub alias_name: Option<StringId>,
    /// Cost/explicitness of this function when it is a `cast` function;
    /// consumed by the type cast matrix (C5).
    pub cast_cost: Option<u32>,
    pub cast_explicit: bool,
    pub base_function: Option<FunctionId>,
    /// Raw token range for the body, filled in by C6; consumed and
    /// cleared by C8.
    pub body_tokens: Option<crate::tokens::TokenRange>,
    pub opcodes: Vec<crate::opcode_emitter::Opcode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionArg {
    pub owner: FunctionId,
    pub location: SourceLocation,
    pub name: StringId,
    pub type_decl: TypeDeclId,
    pub flags: ArgFlags,
    pub default_value: Option<ConstantValueId>,
    pub index: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constant {
    pub owner: StubOwner,
    pub location: SourceLocation,
    pub name: StringId,
    pub flags: MemberFlags,
    pub type_decl: TypeDeclId,
    pub value: ConstantValueId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ConstantValue {
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Bool(bool),
    Name(StringId),
    String(StringId),
    Compound { type_decl: TypeDeclId, inner: Vec<ConstantValueId> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeName {
    pub owner: StubOwner,
    pub location: SourceLocation,
    pub name: StringId,
    pub aliased: TypeDeclId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeRef {
    pub owner: Option<StubOwner>,
    pub location: SourceLocation,
    /// The dotted name as written, e.g. `Game.Entity`.
    pub name: crate::interned_path::InternedPath,
    pub resolved: Option<ResolvedSymbol>,
}

impl TypeRef {
    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }
}

/// An engine-primitive intern-name (§3.1 `MetaType::Engine`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineType {
    Int,
    Uint,
    Int64,
    Uint64,
    Int16,
    Int8,
    Uint8,
    Uint16,
    Float,
    Double,
    Bool,
    /// Interned name (`strid`).
    Strid,
    String,
    Variant,
    Void,
}

impl EngineType {
    pub fn name(self) -> &'static str {
        match self {
            EngineType::Int => "int",
            EngineType::Uint => "uint",
            EngineType::Int64 => "int64",
            EngineType::Uint64 => "uint64",
            EngineType::Int16 => "int16",
            EngineType::Int8 => "int8",
            EngineType::Uint8 => "uint8",
            EngineType::Uint16 => "uint16",
            EngineType::Float => "float",
            EngineType::Double => "double",
            EngineType::Bool => "bool",
            EngineType::Strid => "strid",
            EngineType::String => "string",
            EngineType::Variant => "Variant",
            EngineType::Void => "void",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            EngineType::Int
                | EngineType::Uint
                | EngineType::Int64
                | EngineType::Uint64
                | EngineType::Int16
                | EngineType::Int8
                | EngineType::Uint8
                | EngineType::Uint16
                | EngineType::Float
                | EngineType::Double
        )
    }

    pub fn is_integer(self) -> bool {
        self.is_numeric() && !matches!(self, EngineType::Float | EngineType::Double)
    }

    /// Inclusive range a constant of this type may hold, used by the
    /// overflow check in `makeIntoMatchingType` (§4.8.3). `None` for
    /// non-integer kinds.
    pub fn integer_range(self) -> Option<(i128, i128)> {
        match self {
            EngineType::Int8 => Some((i8::MIN as i128, i8::MAX as i128)),
            EngineType::Uint8 => Some((0, u8::MAX as i128)),
            EngineType::Int16 => Some((i16::MIN as i128, i16::MAX as i128)),
            EngineType::Uint16 => Some((0, u16::MAX as i128)),
            EngineType::Int => Some((i32::MIN as i128, i32::MAX as i128)),
            EngineType::Uint => Some((0, u32::MAX as i128)),
            EngineType::Int64 => Some((i64::MIN as i128, i64::MAX as i128)),
            EngineType::Uint64 => Some((0, u64::MAX as i128)),
            _ => None,
        }
    }
}

/// A type expression (§3.1 `TypeDecl`). `MetaType` is expressed directly
/// as the enum discriminant rather than a separate tag field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeDecl {
    Engine(EngineType),
    Simple(TypeRefId),
    ClassType(TypeRefId),
    PtrType(TypeRefId),
    WeakPtrType(TypeRefId),
    StaticArrayType { inner: TypeDeclId, size: u32 },
    DynamicArrayType { inner: TypeDeclId },
}

impl TypeDecl {
    /// The single source of truth for type equality (§3.2): matches on
    /// `MetaType` and recursively on referenced name / inner type / size.
    /// Two `TypeRef`s compare equal here only by their *resolved target*,
    /// not by spelling, since aliases may resolve differently in
    /// different import contexts before resolution runs; callers are
    /// expected to pass already-resolved decls (post `resolveTypeDecls`,
    /// §4.3.2).
    pub fn structurally_equal(
        a: TypeDeclId,
        b: TypeDeclId,
        arena: &crate::arena::IdArena<TypeDeclId, TypeDecl>,
        type_refs: &crate::arena::IdArena<TypeRefId, TypeRef>,
    ) -> bool {
        if a == b {
            return true;
        }
        match (arena.get(a), arena.get(b)) {
            (TypeDecl::Engine(x), TypeDecl::Engine(y)) => x == y,
            (TypeDecl::Simple(x), TypeDecl::Simple(y))
            | (TypeDecl::ClassType(x), TypeDecl::ClassType(y))
            | (TypeDecl::PtrType(x), TypeDecl::PtrType(y))
            | (TypeDecl::WeakPtrType(x), TypeDecl::WeakPtrType(y)) => {
                type_refs.get(*x).resolved == type_refs.get(*y).resolved
            }
            (
                TypeDecl::StaticArrayType { inner: xi, size: xs },
                TypeDecl::StaticArrayType { inner: yi, size: ys },
            ) => xs == ys && TypeDecl::structurally_equal(*xi, *yi, arena, type_refs),
            (
                TypeDecl::DynamicArrayType { inner: xi },
                TypeDecl::DynamicArrayType { inner: yi },
            ) => TypeDecl::structurally_equal(*xi, *yi, arena, type_refs),
            _ => false,
        }
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, TypeDecl::PtrType(_) | TypeDecl::WeakPtrType(_))
    }

    pub fn is_shared_ptr(&self) -> bool {
        matches!(self, TypeDecl::PtrType(_))
    }

    pub fn is_weak_ptr(&self) -> bool {
        matches!(self, TypeDecl::WeakPtrType(_))
    }

    pub fn is_class_meta(&self) -> bool {
        matches!(self, TypeDecl::ClassType(_))
    }

    pub fn is_variant(&self) -> bool {
        matches!(self, TypeDecl::Engine(EngineType::Variant))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, TypeDecl::Engine(EngineType::Bool))
    }

    pub fn is_enum(&self, type_refs: &crate::arena::IdArena<TypeRefId, TypeRef>) -> bool {
        self.type_ref()
            .and_then(|r| type_refs.get(r).resolved)
            .map(|s| matches!(s, ResolvedSymbol::Enum(_)))
            .unwrap_or(false)
    }

    pub fn type_ref(&self) -> Option<TypeRefId> {
        match self {
            TypeDecl::Simple(r) | TypeDecl::ClassType(r) | TypeDecl::PtrType(r) | TypeDecl::WeakPtrType(r) => {
                Some(*r)
            }
            _ => None,
        }
    }
}
