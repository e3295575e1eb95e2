//! Cast insertion and literal retyping (§4.8.3). `find_best_cast` only
//! knows about identical types, pointer/variant/enum/class-meta
//! conversions and user `cast` functions — plain numeric widening or
//! narrowing between distinct engine types is never a matching rule, so
//! the only way a literal `5` can feed an `int64` parameter is the
//! free compile-time retyping done here before a real cast is attempted.

use crate::cast_matrix::{CastContext, CastKind, CastMatrix, TypeCast};
use crate::diagnostics::CompilerMessage;
use crate::function_ast::{FunctionAst, FunctionTypeInfo, Node, NodeId, NodeKind};
use crate::stub_library::StubLibrary;
use crate::stubs::ids::{TypeDeclId, TypeRefId};
use crate::stubs::kinds::{ConstantValue, EngineType, TypeDecl};
use crate::stubs::ResolvedSymbol;

pub fn cast_ctx(lib: &StubLibrary) -> CastContext<'_> {
    CastContext {
        decls: &lib.type_decls,
        type_refs: &lib.type_refs,
        classes: &lib.classes,
        functions: &lib.functions,
        function_args: &lib.function_args,
    }
}

pub fn is_assignable(ast: &FunctionAst, node: NodeId) -> bool {
    matches!(
        ast.get(node).kind,
        NodeKind::VarLocal(..)
            | NodeKind::VarArg(_)
            | NodeKind::VarClass(_)
            | NodeKind::MemberOffsetRef(_)
            | NodeKind::AccessIndex
    )
}

fn render_type_ref(lib: &StubLibrary, type_ref: TypeRefId) -> String {
    let r = lib.type_refs.get(type_ref);
    match r.resolved {
        Some(ResolvedSymbol::Class(c)) => lib.classes.get(c).name.resolve(&lib.strings).to_string(),
        Some(ResolvedSymbol::Enum(e)) => lib.enums.get(e).name.resolve(&lib.strings).to_string(),
        Some(ResolvedSymbol::TypeName(t)) => lib.type_names.get(t).name.resolve(&lib.strings).to_string(),
        None => r.name.to_qualified_string(&lib.strings),
    }
}

/// Renders a `TypeDecl` for diagnostics only; never consulted by any
/// resolution or emission logic.
pub fn render_type(lib: &StubLibrary, type_decl: TypeDeclId) -> String {
    match lib.type_decls.get(type_decl) {
        TypeDecl::Engine(e) => e.name().to_string(),
        TypeDecl::Simple(r) => render_type_ref(lib, *r),
        TypeDecl::ClassType(r) => format!("{}::meta", render_type_ref(lib, *r)),
        TypeDecl::PtrType(r) => format!("{}@", render_type_ref(lib, *r)),
        TypeDecl::WeakPtrType(r) => format!("{}@weak", render_type_ref(lib, *r)),
        TypeDecl::StaticArrayType { inner, size } => format!("{}[{size}]", render_type(lib, *inner)),
        TypeDecl::DynamicArrayType { inner } => format!("{}[]", render_type(lib, *inner)),
    }
}

fn render_literal(value: &ConstantValue) -> String {
    match value {
        ConstantValue::Integer(v) => v.to_string(),
        ConstantValue::Unsigned(v) => v.to_string(),
        ConstantValue::Float(v) => v.to_string(),
        ConstantValue::Bool(b) => b.to_string(),
        ConstantValue::Name(_) | ConstantValue::String(_) => "<string>".to_string(),
        ConstantValue::Compound { .. } => "<compound>".to_string(),
    }
}

fn set_value_type(ast: &mut FunctionAst, node: NodeId, type_decl: TypeDeclId) {
    ast.get_mut(node).type_info = Some(FunctionTypeInfo::value(type_decl));
}

fn retype_in_place(ast: &mut FunctionAst, node: NodeId, type_decl: TypeDeclId) {
    if let Some(info) = ast.get_mut(node).type_info.as_mut() {
        info.type_decl = type_decl;
    }
}

/// Drops the reference-ness of a value, inserting `MakeValueFromRef` when
/// the node actually carries one (§4.9.1's load/dereference step).
pub fn make_into_value(ast: &mut FunctionAst, node: NodeId) -> NodeId {
    let info = ast.get(node).type_info.expect("make_into_value needs a type-resolved node");
    if !info.is_reference {
        return node;
    }
    let loc = ast.get(node).location;
    let wrapper = ast.alloc(Node::new(NodeKind::MakeValueFromRef, loc).with_children(vec![node]));
    set_value_type(ast, wrapper, info.type_decl);
    wrapper
}

/// Free retyping of an integer/float literal to a different numeric
/// engine type, with an overflow diagnostic when the literal's value
/// doesn't fit. `None` means `node` isn't a literal constant and the
/// caller should fall back to `CastMatrix::find_best_cast`.
pub fn try_retype_literal(lib: &StubLibrary, ast: &mut FunctionAst, node: NodeId, dest_type: TypeDeclId) -> Option<NodeId> {
    let NodeKind::Const(value_id) = ast.get(node).kind else { return None };
    let dest_engine = match lib.type_decls.get(dest_type) {
        TypeDecl::Engine(e) if e.is_numeric() => *e,
        _ => return None,
    };
    let value = lib.constant_values.get(value_id).clone();
    let fits = match &value {
        ConstantValue::Integer(v) => match dest_engine.integer_range() {
            Some((lo, hi)) => (*v as i128) >= lo && (*v as i128) <= hi,
            None => matches!(dest_engine, EngineType::Float | EngineType::Double),
        },
        ConstantValue::Unsigned(v) => match dest_engine.integer_range() {
            Some((lo, hi)) => (*v as i128) >= lo && (*v as i128) <= hi,
            None => matches!(dest_engine, EngineType::Float | EngineType::Double),
        },
        ConstantValue::Float(_) => matches!(dest_engine, EngineType::Float | EngineType::Double),
        _ => return None,
    };
    if !fits {
        let loc = ast.get(node).location;
        lib.errors.report_error(
            lib.file_abs_path(loc.file),
            loc.line,
            CompilerMessage::ConstantOverflow { value: render_literal(&value), target_type: dest_engine.name().to_string() },
        );
    }
    set_value_type(ast, node, dest_type);
    Some(node)
}

/// Lowers a resolved `TypeCast` onto `node`: retypes in place for the two
/// passthrough kinds, wraps a user cast function as a direct call (never
/// a `Cast` node — C10 would reject that), and wraps everything else in
/// `Cast(kind)`.
pub fn apply_cast(ast: &mut FunctionAst, node: NodeId, cast: TypeCast, dest_type: TypeDeclId) -> NodeId {
    match cast.kind {
        CastKind::Passthrough | CastKind::PassthroughNoRef => {
            retype_in_place(ast, node, dest_type);
            node
        }
        CastKind::CastFunc => {
            let function = cast.function.expect("CastFunc always carries its resolved function");
            let loc = ast.get(node).location;
            let value = make_into_value(ast, node);
            let call = ast.alloc(Node::new(NodeKind::CallStatic(function), loc).with_children(vec![value]));
            set_value_type(ast, call, dest_type);
            call
        }
        kind => {
            let loc = ast.get(node).location;
            let value = make_into_value(ast, node);
            let cast_node = ast.alloc(Node::new(NodeKind::Cast(kind), loc).with_children(vec![value]));
            set_value_type(ast, cast_node, dest_type);
            cast_node
        }
    }
}

/// `makeIntoMatchingType` (§4.8.3): tries free literal retyping first,
/// then `findBestCast`; reports a `TypeError` and leaves `node` in place
/// when neither applies. `allow_explicit` is false at every implicit
/// conversion site (assignment, argument passing, return) and true only
/// where source syntax spelled out an explicit cast.
pub fn make_into_matching_type(
    lib: &StubLibrary,
    matrix: &CastMatrix,
    ast: &mut FunctionAst,
    node: NodeId,
    dest_type: TypeDeclId,
    allow_explicit: bool,
    context: &str,
) -> NodeId {
    if let Some(retyped) = try_retype_literal(lib, ast, node, dest_type) {
        return retyped;
    }
    let info = ast.get(node).type_info.expect("make_into_matching_type needs a type-resolved node");
    let ctx = cast_ctx(lib);
    let cast = matrix.find_best_cast(info.type_decl, dest_type, &ctx);
    if !cast.is_possible() || (cast.explicit && !allow_explicit) {
        let loc = ast.get(node).location;
        lib.errors.report_error(
            lib.file_abs_path(loc.file),
            loc.line,
            CompilerMessage::TypeError {
                expected: render_type(lib, dest_type),
                found: render_type(lib, info.type_decl),
                context: context.to_string(),
            },
        );
        return node;
    }
    apply_cast(ast, node, cast, dest_type)
}
