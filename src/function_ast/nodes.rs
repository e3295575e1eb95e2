//! C7 — the tagged tree a function body parses into and is elaborated
//! in place (well, functionally rewritten — §9 Design Notes) over (§4.6).
//!
//! Rather than ~70 separate Rust types, `NodeKind` is one tagged enum;
//! the children list's meaning (condition/body/etc.) is positional and
//! documented per variant, matching the source's uniform `children:
//! Vec<NodeId>` representation that the design notes call out as
//! translating directly.

use crate::cast_matrix::CastKind;
use crate::function_ast::scope::ScopeId;
use crate::stubs::ids::{ConstantValueId, EnumId, EnumOptionId, FunctionId, PropertyId, TypeDeclId};
use crate::string_interning::StringId;
use crate::define_arena_id;

define_arena_id!(NodeId);

/// Per-node computed type (§4.6): the `TypeDecl` plus whether the value
/// is a reference and/or const. Left `None` until `resolveTypes` visits
/// the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionTypeInfo {
    pub type_decl: TypeDeclId,
    pub is_reference: bool,
    pub is_const: bool,
}

impl FunctionTypeInfo {
    pub fn value(type_decl: TypeDeclId) -> Self {
        Self { type_decl, is_reference: false, is_const: false }
    }

    pub fn reference(type_decl: TypeDeclId, is_const: bool) -> Self {
        Self { type_decl, is_reference: true, is_const }
    }
}

/// Candidate set attached to an unresolved `FunctionAlias` node, pending
/// overload resolution (§4.8.2).
#[derive(Debug, Clone)]
pub struct AliasCandidates {
    pub alias_name: StringId,
    pub candidates: Vec<FunctionId>,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    // --- statements ---
    /// No-op placeholder, e.g. a `Var` with no initializer after
    /// `resolveVars` (§4.8).
    Nop,
    /// A single statement wrapping one expression/sub-statement;
    /// children[0] is the wrapped node.
    Statement,
    /// Introduces a new lexical scope; children are the statements in
    /// source order. `scope` on the node itself is the scope it owns
    /// (not the enclosing one).
    Scope,
    /// A flat sequence of statements with no new scope.
    StatementList,
    /// A flat sequence of expressions, e.g. constructor argument lists.
    ExpressionList,
    /// children: [condition, then-branch, else-branch?].
    IfThenElse,
    /// children: [subject, case*, default?].
    Switch,
    /// children: [value, body].
    Case,
    /// children: [body].
    DefaultCase,
    /// children: [condition, increment, body]. `While`/`DoWhile` store
    /// `Nop` for the absent increment slot (§4.8.1).
    For,
    While,
    DoWhile,
    /// children: [expr?].
    Return,
    Break,
    Continue,

    // --- expressions (raw) ---
    /// children: [lvalue, rvalue].
    Assign,
    /// Unresolved operator use. `sym` is the operator symbol (`opAdd`,
    /// …); children are [a] or [a, b].
    Operator(StringId),
    /// children: [callee, args...].
    Call,
    /// children: [type, ctor-args...].
    New,
    /// A bare type reference used as a value (e.g. `class<Foo>` literal
    /// or the callee of a cast/constructor call before resolution).
    Type(TypeDeclId),
    /// An unresolved identifier, raw text as written.
    Ident(StringId),
    /// children: [context]; `member` is the field/member name.
    AccessMember(StringId),
    /// children: [context, index].
    AccessIndex,
    /// Unelaborated local declaration. children: [initializer?]. `name`
    /// and declared `type_decl` are carried directly.
    Var { name: StringId, type_decl: TypeDeclId },
    /// A literal constant.
    Const(ConstantValueId),
    Null,
    This,
    /// children: [condition, then-expr, else-expr].
    Conditional,

    // --- resolved variants ---
    VarArg(u32),
    VarClass(PropertyId),
    VarLocal(crate::function_ast::scope::ScopeId, StringId),
    FunctionVirtual(FunctionId),
    FunctionStatic(FunctionId),
    FunctionFinal(FunctionId),
    FunctionAlias(AliasCandidates),
    EnumConst { enum_ref: EnumId, option: EnumOptionId },
    /// children: [context?, args...].
    CallFinal(FunctionId),
    CallVirtual(FunctionId),
    CallStatic(FunctionId),
    /// Wraps a context expression around a member access; children: [ctx, inner].
    Context,
    ContextRef,
    /// children: [ctx]; the property being offset to.
    MemberOffset(PropertyId),
    MemberOffsetRef(PropertyId),
    /// children: [args...] — struct value construction.
    Construct(TypeDeclId),
    /// children: [inner] — loads a value out of a reference.
    MakeValueFromRef,

    // --- comparison primitives ---
    GeneralEqual,
    GeneralNotEqual,
    PointerEqual,
    PointerNotEqual,

    /// A cast wrapper inserted by `makeIntoMatchingType` (§4.8.3);
    /// children: [inner].
    Cast(CastKind),
}

/// One node in a function's AST (§4.6). `scope` is set by `connectScopes`
/// for every node to the scope it evaluates *in* — except a `Scope` node
/// itself, which overwrites the field with the fresh child scope it owns
/// instead (see the `Scope` variant above).
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub location: crate::stubs::SourceLocation,
    pub children: Vec<NodeId>,
    pub type_info: Option<FunctionTypeInfo>,
    pub scope: Option<ScopeId>,
    /// Set on loop/switch `Scope` nodes so `Break`/`Continue` lowering
    /// can find their target without re-walking the tree (§4.9.1).
    pub loop_break_label: Option<u32>,
    pub loop_continue_label: Option<u32>,
    /// For `Break`/`Continue`: which enclosing loop/switch scope they
    /// target (§4.9.1 "the one stored in contextNode").
    pub context_node: Option<NodeId>,
}

impl Node {
    pub fn new(kind: NodeKind, location: crate::stubs::SourceLocation) -> Self {
        Self {
            kind,
            location,
            children: Vec::new(),
            type_info: None,
            scope: None,
            loop_break_label: None,
            loop_continue_label: None,
            context_node: None,
        }
    }

    pub fn with_children(mut self, children: Vec<NodeId>) -> Self {
        self.children = children;
        self
    }
}
