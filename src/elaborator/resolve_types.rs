//! resolveTypes (§4.8.2/§4.8.3): the bottom-up pass that turns every raw
//! expression node `connectScopes` left behind into a type-resolved,
//! dispatch-resolved one — operator lowering, overload resolution, member
//! and index access, construction/cast calls, and the cast insertion at
//! every assignment/argument/return/condition site. Runs after
//! `connect_scopes` has wired locals, arguments, properties, constants,
//! enum options and loop labels.

use crate::cast_matrix::CastMatrix;
use crate::diagnostics::CompilerMessage;
use crate::elaborator::casts::{cast_ctx, is_assignable, make_into_value, render_type};
use crate::function_ast::{FunctionAst, FunctionTypeInfo, Node, NodeId, NodeKind};
use crate::interned_path::InternedPath;
use crate::stub_library::StubLibrary;
use crate::stubs::ids::{ClassId, EnumId, FunctionArgId, FunctionId, TypeDeclId};
use crate::stubs::kinds::{ClassMember, ConstantValue, EngineType, TopLevelMember, TypeDecl, TypeRef};
use crate::stubs::{FunctionFlags, ResolvedSymbol, StubOwner};
use crate::string_interning::StringId;
use rustc_hash::FxHashMap;

pub fn resolve_types(lib: &mut StubLibrary, matrix: &CastMatrix, owner: FunctionId, ast: &mut FunctionAst) {
    let mut resolver = TypeResolver { lib, matrix, owner, enum_type_cache: FxHashMap::default() };
    if let Some(root) = ast.root {
        let new_root = resolver.visit(ast, root);
        ast.root = Some(new_root);
    }
}

struct TypeResolver<'a> {
    lib: &'a mut StubLibrary,
    matrix: &'a CastMatrix,
    owner: FunctionId,
    enum_type_cache: FxHashMap<EnumId, TypeDeclId>,
}

impl<'a> TypeResolver<'a> {
    fn bool_type(&mut self) -> TypeDeclId {
        self.lib.engine_type_decl(EngineType::Bool)
    }

    fn enum_type_decl(&mut self, enum_ref: EnumId) -> TypeDeclId {
        if let Some(&decl) = self.enum_type_cache.get(&enum_ref) {
            return decl;
        }
        let loc = self.lib.enums.get(enum_ref).location;
        let mut name = InternedPath::new();
        name.push(self.lib.enums.get(enum_ref).name);
        let type_ref = self.lib.type_refs.alloc(TypeRef { owner: None, location: loc, name, resolved: Some(ResolvedSymbol::Enum(enum_ref)) });
        let decl = self.lib.simple_type_decl(type_ref);
        self.enum_type_cache.insert(enum_ref, decl);
        decl
    }

    fn class_of_type(&self, decl: TypeDeclId) -> Option<ClassId> {
        let type_ref = self.lib.type_decls.get(decl).type_ref()?;
        self.lib.type_refs.get(type_ref).resolved.and_then(|s| s.as_class())
    }

    fn report(&self, node_loc: crate::stubs::SourceLocation, message: CompilerMessage) {
        self.lib.errors.report_error(self.lib.file_abs_path(node_loc.file), node_loc.line, message);
    }

    fn scope_label(&self) -> String {
        format!("function `{}`", self.lib.functions.get(self.owner).name.resolve(&self.lib.strings))
    }

    /// `makeIntoMatchingType`, extended to retype a bare `null` literal for
    /// free the same way `try_retype_literal` already does for numeric
    /// constants — `find_best_cast` has no rule for `Null` at all, since
    /// it isn't a `TypeDecl`.
    fn cast_to(&mut self, ast: &mut FunctionAst, node: NodeId, dest: TypeDeclId, allow_explicit: bool, context: &str) -> NodeId {
        if matches!(ast.get(node).kind, NodeKind::Null) {
            let dst = self.lib.type_decls.get(dest);
            if dst.is_pointer() || dst.is_class_meta() || dst.is_variant() {
                ast.get_mut(node).type_info = Some(FunctionTypeInfo::value(dest));
                return node;
            }
        }
        crate::elaborator::casts::make_into_matching_type(self.lib, self.matrix, ast, node, dest, allow_explicit, context)
    }

    fn functions_named(&self, owner: StubOwner, alias: StringId) -> Vec<FunctionId> {
        match owner {
            StubOwner::Class(c) => {
                let mut cur = Some(c);
                while let Some(cid) = cur {
                    let found: Vec<FunctionId> = self
                        .lib
                        .classes
                        .get(cid)
                        .members
                        .iter()
                        .filter_map(|m| match m {
                            ClassMember::Function(f) if self.lib.functions.get(*f).alias_name == Some(alias) => Some(*f),
                            _ => None,
                        })
                        .collect();
                    if !found.is_empty() {
                        return found;
                    }
                    cur = self.lib.classes.get(cid).base_resolved;
                }
                Vec::new()
            }
            StubOwner::Module(m) => self
                .lib
                .modules
                .get(m)
                .members
                .iter()
                .filter_map(|(_, member)| match member {
                    TopLevelMember::Function(f) if self.lib.functions.get(*f).alias_name == Some(alias) => Some(*f),
                    _ => None,
                })
                .collect(),
            StubOwner::File(f) => self
                .lib
                .files
                .get(f)
                .top_level
                .iter()
                .filter_map(|member| match member {
                    TopLevelMember::Function(fid) if self.lib.functions.get(*fid).alias_name == Some(alias) => Some(*fid),
                    _ => None,
                })
                .collect(),
            StubOwner::Function(_) => Vec::new(),
        }
    }

    fn parent_of(&self, owner: StubOwner) -> Option<StubOwner> {
        match owner {
            StubOwner::Function(f) => Some(self.lib.functions.get(f).owner),
            StubOwner::Class(c) => Some(self.lib.classes.get(c).owner),
            StubOwner::File(f) => Some(StubOwner::Module(self.lib.files.get(f).owner)),
            StubOwner::Module(_) => None,
        }
    }

    /// Candidate search for a bare call name (§4.8.2): climbs the lexical
    /// owner chain from the call site, stopping at the first level with
    /// any match at all (ordinary shadowing), then falls back to the
    /// primary module's resolved imports.
    fn free_call_candidates(&self, alias: StringId) -> Vec<FunctionId> {
        let mut owner = Some(StubOwner::Function(self.owner));
        while let Some(o) = owner {
            let found = self.functions_named(o, alias);
            if !found.is_empty() {
                return found;
            }
            owner = self.parent_of(o);
        }
        let Some(primary) = self.lib.primary_module else { return Vec::new() };
        for &imported in &self.lib.modules.get(primary).imported_modules.clone() {
            let found = self.functions_named(StubOwner::Module(imported), alias);
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    fn method_candidates(&self, class: ClassId, alias: StringId) -> Vec<FunctionId> {
        self.functions_named(StubOwner::Class(class), alias)
    }

    /// Cost-minimizing overload pick over an already visited, type-resolved
    /// argument list (§4.8.2). Candidates whose arity doesn't fit (counting
    /// defaulted trailing arguments) or whose arguments need an explicit
    /// cast are dropped; a cost tie between two or more survivors is
    /// ambiguous.
    fn pick_overload(&self, ast: &FunctionAst, candidates: &[FunctionId], args: &[NodeId]) -> Result<Option<FunctionId>, ()> {
        let ctx = cast_ctx(self.lib);
        let mut best: Option<(FunctionId, i32)> = None;
        let mut tied = false;
        for &f in candidates {
            let func = self.lib.functions.get(f);
            if args.len() > func.args.len() {
                continue;
            }
            let required = func.args.iter().filter(|a| self.lib.function_args.get(**a).default_value.is_none()).count();
            if args.len() < required {
                continue;
            }
            let mut total = 0;
            let mut ok = true;
            for (i, &arg) in args.iter().enumerate() {
                let param = self.lib.function_args.get(func.args[i]);
                let arg_type = ast.get(arg).type_info.expect("call argument must be type-resolved").type_decl;
                let cast = self.matrix.find_best_cast(arg_type, param.type_decl, &ctx);
                if !cast.is_possible() || cast.explicit {
                    ok = false;
                    break;
                }
                total += cast.cost;
            }
            if !ok {
                continue;
            }
            match best {
                None => best = Some((f, total)),
                Some((_, cost)) if total < cost => {
                    best = Some((f, total));
                    tied = false;
                }
                Some((_, cost)) if total == cost => tied = true,
                _ => {}
            }
        }
        if tied {
            return Err(());
        }
        Ok(best.map(|(f, _)| f))
    }

    fn dispatch_kind(&self, function: FunctionId) -> fn(FunctionId) -> NodeKind {
        let func = self.lib.functions.get(function);
        if func.flags.contains(FunctionFlags::STATIC) {
            return NodeKind::CallStatic;
        }
        let is_struct_owner = match func.owner {
            StubOwner::Class(c) => self.lib.classes.get(c).flags.contains(crate::stubs::ClassFlags::STRUCT),
            _ => false,
        };
        let is_final = func.flags.contains(FunctionFlags::FINAL)
            || func.flags.contains(FunctionFlags::CONSTRUCTOR)
            || func.flags.contains(FunctionFlags::DESTRUCTOR);
        if is_struct_owner || is_final {
            NodeKind::CallFinal
        } else {
            NodeKind::CallVirtual
        }
    }

    fn cast_args_to(&mut self, ast: &mut FunctionAst, function: FunctionId, args: Vec<NodeId>) -> Vec<NodeId> {
        let param_args: Vec<FunctionArgId> = self.lib.functions.get(function).args.clone();
        args.into_iter()
            .enumerate()
            .map(|(i, arg)| {
                let Some(&param_id) = param_args.get(i) else { return arg };
                let dest = self.lib.function_args.get(param_id).type_decl;
                self.cast_to(ast, arg, dest, false, "argument")
            })
            .collect()
    }

    fn build_call(&mut self, ast: &mut FunctionAst, loc: crate::stubs::SourceLocation, function: FunctionId, context: Option<NodeId>, args: Vec<NodeId>) -> NodeId {
        let kind_ctor = self.dispatch_kind(function);
        let args = self.cast_args_to(ast, function, args);
        let mut children = Vec::with_capacity(args.len() + 1);
        if !matches!(kind_ctor(function), NodeKind::CallStatic(_)) {
            if let Some(ctx) = context {
                children.push(make_into_value(ast, ctx));
            }
        }
        children.extend(args);
        let node = ast.alloc(Node::new(kind_ctor(function), loc).with_children(children));
        let return_type = self.lib.functions.get(function).return_type.unwrap_or_else(|| self.lib.engine_type_decl(EngineType::Void));
        ast.get_mut(node).type_info = Some(FunctionTypeInfo::value(return_type));
        node
    }

    fn report_no_candidate(&self, loc: crate::stubs::SourceLocation, name: StringId) {
        self.report(loc, CompilerMessage::UnresolvedSymbol { name: name.resolve(&self.lib.strings).to_string(), scope: self.scope_label() });
    }

    fn report_ambiguous(&self, loc: crate::stubs::SourceLocation, call: StringId, candidates: &[FunctionId]) {
        let names = candidates
            .iter()
            .map(|&f| {
                let func = self.lib.functions.get(f);
                func.alias_name.unwrap_or(func.name).resolve(&self.lib.strings).to_string()
            })
            .collect();
        self.report(loc, CompilerMessage::OverloadAmbiguity { call: call.resolve(&self.lib.strings).to_string(), candidates: names });
    }

    fn lower_free_call(&mut self, ast: &mut FunctionAst, loc: crate::stubs::SourceLocation, name: StringId, args: Vec<NodeId>) -> NodeId {
        let candidates = self.free_call_candidates(name);
        if candidates.is_empty() {
            self.report_no_candidate(loc, name);
            return ast.alloc(Node::new(NodeKind::Nop, loc));
        }
        match self.pick_overload(ast, &candidates, &args) {
            Ok(Some(function)) => self.build_call(ast, loc, function, None, args),
            Ok(None) => {
                self.report_no_candidate(loc, name);
                ast.alloc(Node::new(NodeKind::Nop, loc))
            }
            Err(()) => {
                self.report_ambiguous(loc, name, &candidates);
                ast.alloc(Node::new(NodeKind::Nop, loc))
            }
        }
    }

    fn lower_method_call(&mut self, ast: &mut FunctionAst, loc: crate::stubs::SourceLocation, receiver: NodeId, name: StringId, args: Vec<NodeId>) -> NodeId {
        let receiver_type = ast.get(receiver).type_info.expect("method receiver must be type-resolved").type_decl;
        let Some(class) = self.class_of_type(receiver_type) else {
            self.report(loc, CompilerMessage::TypeError { expected: "class instance".to_string(), found: render_type(self.lib, receiver_type), context: "method call".to_string() });
            return ast.alloc(Node::new(NodeKind::Nop, loc));
        };
        let candidates = self.method_candidates(class, name);
        if candidates.is_empty() {
            self.report_no_candidate(loc, name);
            return ast.alloc(Node::new(NodeKind::Nop, loc));
        }
        match self.pick_overload(ast, &candidates, &args) {
            Ok(Some(function)) => self.build_call(ast, loc, function, Some(receiver), args),
            Ok(None) => {
                self.report_no_candidate(loc, name);
                ast.alloc(Node::new(NodeKind::Nop, loc))
            }
            Err(()) => {
                self.report_ambiguous(loc, name, &candidates);
                ast.alloc(Node::new(NodeKind::Nop, loc))
            }
        }
    }

    /// A `Type`-callee call is construction when given any argument count
    /// other than exactly one primitive-to-primitive conversion, and an
    /// explicit cast (`int(x)`, `float(x)`, …) in the single-argument
    /// primitive case (§4.8.3).
    fn lower_construct_or_cast(&mut self, ast: &mut FunctionAst, loc: crate::stubs::SourceLocation, decl: TypeDeclId, args: Vec<NodeId>) -> NodeId {
        if args.len() == 1 && matches!(self.lib.type_decls.get(decl), TypeDecl::Engine(_)) {
            return self.cast_to(ast, args[0], decl, true, "explicit cast");
        }
        let node = ast.alloc(Node::new(NodeKind::Construct(decl), loc).with_children(args));
        ast.get_mut(node).type_info = Some(FunctionTypeInfo::value(decl));
        node
    }

    fn lower_index(&mut self, ast: &mut FunctionAst, loc: crate::stubs::SourceLocation, object: NodeId, index: NodeId) -> NodeId {
        let object_type = ast.get(object).type_info.expect("indexed value must be type-resolved").type_decl;
        let index_type = ast.get(index).type_info.expect("index must be type-resolved").type_decl;
        let symbol = self.lib.strings.get_or_intern("opIndex".to_string());
        let ctx = cast_ctx(self.lib);
        let found = self.matrix.find_operator(symbol, object_type, is_assignable(ast, object), Some(index_type), true, &ctx);
        let Some((function, _)) = found else {
            self.report(loc, CompilerMessage::UnresolvedSymbol { name: "operator[]".to_string(), scope: self.scope_label() });
            return ast.alloc(Node::new(NodeKind::Nop, loc));
        };
        self.build_call(ast, loc, function, Some(object), vec![index])
    }

    fn lower_access_member(&mut self, ast: &mut FunctionAst, loc: crate::stubs::SourceLocation, object: NodeId, name: StringId) -> NodeId {
        let object_type = ast.get(object).type_info.expect("member access target must be type-resolved").type_decl;
        let Some(class) = self.class_of_type(object_type) else {
            self.report(loc, CompilerMessage::TypeError { expected: "class instance".to_string(), found: render_type(self.lib, object_type), context: "member access".to_string() });
            return ast.alloc(Node::new(NodeKind::Nop, loc));
        };
        let mut cur = Some(class);
        let mut property = None;
        while let Some(cid) = cur {
            property = self.lib.classes.get(cid).member_names.iter().find_map(|(n, m)| match m {
                ClassMember::Property(p) if *n == name => Some(*p),
                _ => None,
            });
            if property.is_some() {
                break;
            }
            cur = self.lib.classes.get(cid).base_resolved;
        }
        let Some(property) = property else {
            self.report_no_candidate(loc, name);
            return ast.alloc(Node::new(NodeKind::Nop, loc));
        };
        let type_decl = self.lib.properties.get(property).type_decl;
        let node = ast.alloc(Node::new(NodeKind::MemberOffsetRef(property), loc).with_children(vec![object]));
        ast.get_mut(node).type_info = Some(FunctionTypeInfo::reference(type_decl, false));
        node
    }

    fn lower_operator(&mut self, ast: &mut FunctionAst, node: NodeId, sym: StringId, children: Vec<NodeId>) -> NodeId {
        let loc = ast.get(node).location;
        let left_type = ast.get(children[0]).type_info.expect("operator operand must be type-resolved").type_decl;
        let right_type = children.get(1).map(|&c| ast.get(c).type_info.expect("operator operand must be type-resolved").type_decl);
        let ctx = cast_ctx(self.lib);
        let found = self.matrix.find_operator(sym, left_type, is_assignable(ast, children[0]), right_type, true, &ctx);
        if let Some((function, _)) = found {
            return self.build_call(ast, loc, function, None, children);
        }

        let is_equality = sym.eq_str(&self.lib.strings, "opEqual") || sym.eq_str(&self.lib.strings, "opNotEqual");
        if is_equality && children.len() == 2 {
            let right = children[1];
            let right_type = right_type.unwrap();
            let left = children[0];
            let right = self.cast_to(ast, right, left_type, false, "comparison");
            let is_ptr = self.lib.type_decls.get(left_type).is_pointer() || self.lib.type_decls.get(right_type).is_pointer();
            let kind = if sym.eq_str(&self.lib.strings, "opEqual") {
                if is_ptr { NodeKind::PointerEqual } else { NodeKind::GeneralEqual }
            } else if is_ptr {
                NodeKind::PointerNotEqual
            } else {
                NodeKind::GeneralNotEqual
            };
            let cmp = ast.alloc(Node::new(kind, loc).with_children(vec![left, right]));
            let bool_ty = self.bool_type();
            ast.get_mut(cmp).type_info = Some(FunctionTypeInfo::value(bool_ty));
            return cmp;
        }

        self.report(loc, CompilerMessage::UnresolvedSymbol { name: format!("operator{}", sym.resolve(&self.lib.strings)), scope: self.scope_label() });
        ast.alloc(Node::new(NodeKind::Nop, loc))
    }

    fn visit_children(&mut self, ast: &mut FunctionAst, node: NodeId) {
        let children = ast.get(node).children.clone();
        let mut new_children = Vec::with_capacity(children.len());
        for c in children {
            new_children.push(self.visit(ast, c));
        }
        ast.get_mut(node).children = new_children;
    }

    fn visit(&mut self, ast: &mut FunctionAst, node: NodeId) -> NodeId {
        match ast.get(node).kind.clone() {
            NodeKind::Nop
            | NodeKind::VarArg(_)
            | NodeKind::VarClass(_)
            | NodeKind::VarLocal(..)
            | NodeKind::This
            | NodeKind::Null => {}

            NodeKind::Const(value_id) => {
                if ast.get(node).type_info.is_none() {
                    let value = self.lib.constant_values.get(value_id).clone();
                    let engine = match value {
                        ConstantValue::Integer(_) => EngineType::Int,
                        ConstantValue::Unsigned(_) => EngineType::Uint,
                        ConstantValue::Float(_) => EngineType::Double,
                        ConstantValue::Bool(_) => EngineType::Bool,
                        ConstantValue::Name(_) => EngineType::Strid,
                        ConstantValue::String(_) => EngineType::String,
                        ConstantValue::Compound { type_decl, .. } => {
                            ast.get_mut(node).type_info = Some(FunctionTypeInfo::value(type_decl));
                            return node;
                        }
                    };
                    let decl = self.lib.engine_type_decl(engine);
                    ast.get_mut(node).type_info = Some(FunctionTypeInfo::value(decl));
                }
            }

            NodeKind::EnumConst { enum_ref, .. } => {
                let decl = self.enum_type_decl(enum_ref);
                ast.get_mut(node).type_info = Some(FunctionTypeInfo::value(decl));
            }

            NodeKind::Statement | NodeKind::StatementList | NodeKind::ExpressionList | NodeKind::Break | NodeKind::Continue | NodeKind::DefaultCase => {
                self.visit_children(ast, node);
            }

            NodeKind::Scope => {
                self.visit_children(ast, node);
            }

            NodeKind::Var { type_decl, .. } => {
                let children = ast.get(node).children.clone();
                return if let Some(&init) = children.first() {
                    let init = self.visit(ast, init);
                    let casted = self.cast_to(ast, init, type_decl, false, "variable initializer");
                    let loc = ast.get(node).location;
                    // the lvalue itself was never materialized as a node by
                    // the parser (`Var` carries name/type directly), so the
                    // assign target is the same `VarLocal` the declaration
                    // installed into scope.
                    let scope = ast.get(node).scope.expect("declared var must have a scope");
                    let NodeKind::Var { name, .. } = ast.get(node).kind.clone() else { unreachable!() };
                    let lvalue = ast.alloc(Node::new(NodeKind::VarLocal(scope, name), loc));
                    ast.get_mut(lvalue).type_info = Some(FunctionTypeInfo::reference(type_decl, false));
                    let assign = ast.alloc(Node::new(NodeKind::Assign, loc).with_children(vec![lvalue, casted]));
                    ast.get_mut(assign).type_info = Some(FunctionTypeInfo::value(type_decl));
                    assign
                } else {
                    ast.get_mut(node).kind = NodeKind::Nop;
                    node
                };
            }

            NodeKind::IfThenElse => {
                let children = ast.get(node).children.clone();
                let cond = self.visit(ast, children[0]);
                let bool_ty = self.bool_type();
                let cond = self.cast_to(ast, cond, bool_ty, false, "if condition");
                let mut new_children = vec![cond];
                for &c in &children[1..] {
                    new_children.push(self.visit(ast, c));
                }
                ast.get_mut(node).children = new_children;
            }

            NodeKind::For => {
                let children = ast.get(node).children.clone();
                let (cond, step, body) = (children[0], children[1], children[2]);
                let cond = if matches!(ast.get(cond).kind, NodeKind::Nop) {
                    cond
                } else {
                    let cond = self.visit(ast, cond);
                    let bool_ty = self.bool_type();
                    self.cast_to(ast, cond, bool_ty, false, "for condition")
                };
                let step = self.visit(ast, step);
                let body = self.visit(ast, body);
                ast.get_mut(node).children = vec![cond, step, body];
            }

            NodeKind::While | NodeKind::DoWhile => {
                let children = ast.get(node).children.clone();
                let cond = self.visit(ast, children[0]);
                let bool_ty = self.bool_type();
                let cond = self.cast_to(ast, cond, bool_ty, false, "loop condition");
                let body = self.visit(ast, children[1]);
                ast.get_mut(node).children = vec![cond, body];
            }

            NodeKind::Switch => {
                let children = ast.get(node).children.clone();
                let subject = self.visit(ast, children[0]);
                let subject_type = ast.get(subject).type_info.expect("switch subject must be type-resolved").type_decl;
                let mut new_children = vec![subject];
                for &c in &children[1..] {
                    new_children.push(self.visit_case(ast, c, subject_type));
                }
                ast.get_mut(node).children = new_children;
            }

            NodeKind::Case => unreachable!("Case is only visited through Switch"),

            NodeKind::Return => {
                let children = ast.get(node).children.clone();
                let return_type = self.lib.functions.get(self.owner).return_type;
                if let (Some(&expr), Some(rt)) = (children.first(), return_type) {
                    let expr = self.visit(ast, expr);
                    let expr = self.cast_to(ast, expr, rt, false, "return value");
                    ast.get_mut(node).children = vec![expr];
                } else {
                    self.visit_children(ast, node);
                }
            }

            NodeKind::Assign => {
                let children = ast.get(node).children.clone();
                let lvalue = self.visit(ast, children[0]);
                let rvalue = self.visit(ast, children[1]);
                if !is_assignable(ast, lvalue) {
                    let loc = ast.get(node).location;
                    let lvalue_type = match ast.get(lvalue).type_info {
                        Some(info) => info.type_decl,
                        None => self.lib.engine_type_decl(EngineType::Variant),
                    };
                    let found = render_type(self.lib, lvalue_type);
                    self.report(loc, CompilerMessage::TypeError { expected: "assignable location".to_string(), found, context: "assignment".to_string() });
                }
                let dest = ast.get(lvalue).type_info.expect("assignment target must be type-resolved").type_decl;
                let rvalue = self.cast_to(ast, rvalue, dest, false, "assignment");
                ast.get_mut(node).children = vec![lvalue, rvalue];
                ast.get_mut(node).type_info = Some(FunctionTypeInfo::value(dest));
            }

            NodeKind::Operator(sym) => {
                self.visit_children(ast, node);
                let children = ast.get(node).children.clone();
                return self.lower_operator(ast, node, sym, children);
            }

            NodeKind::Call => {
                let children = ast.get(node).children.clone();
                let callee = children[0];
                let loc = ast.get(node).location;
                return match ast.get(callee).kind.clone() {
                    NodeKind::Type(decl) => {
                        let args = children[1..].iter().map(|&a| self.visit(ast, a)).collect();
                        self.lower_construct_or_cast(ast, loc, decl, args)
                    }
                    NodeKind::Ident(name) => {
                        let args = children[1..].iter().map(|&a| self.visit(ast, a)).collect();
                        self.lower_free_call(ast, loc, name, args)
                    }
                    NodeKind::AccessMember(name) => {
                        let receiver = ast.get(callee).children[0];
                        let receiver = self.visit(ast, receiver);
                        let args = children[1..].iter().map(|&a| self.visit(ast, a)).collect();
                        self.lower_method_call(ast, loc, receiver, name, args)
                    }
                    _ => {
                        self.report(loc, CompilerMessage::InternalError { detail: "unsupported call callee".to_string() });
                        ast.alloc(Node::new(NodeKind::Nop, loc))
                    }
                };
            }

            NodeKind::New => {
                let children = ast.get(node).children.clone();
                let loc = ast.get(node).location;
                let NodeKind::Type(decl) = ast.get(children[0]).kind.clone() else {
                    self.report(loc, CompilerMessage::InternalError { detail: "New missing a type node".to_string() });
                    return ast.alloc(Node::new(NodeKind::Nop, loc));
                };
                let args = children[1..].iter().map(|&a| self.visit(ast, a)).collect();
                return self.lower_construct_or_cast(ast, loc, decl, args);
            }

            NodeKind::AccessMember(name) => {
                let children = ast.get(node).children.clone();
                let object = self.visit(ast, children[0]);
                let loc = ast.get(node).location;
                return self.lower_access_member(ast, loc, object, name);
            }

            NodeKind::AccessIndex => {
                let children = ast.get(node).children.clone();
                let object = self.visit(ast, children[0]);
                let index = self.visit(ast, children[1]);
                let loc = ast.get(node).location;
                return self.lower_index(ast, loc, object, index);
            }

            NodeKind::Conditional => {
                let children = ast.get(node).children.clone();
                let cond = self.visit(ast, children[0]);
                let bool_ty = self.bool_type();
                let cond = self.cast_to(ast, cond, bool_ty, false, "conditional expression");
                let then_branch = self.visit(ast, children[1]);
                let else_branch = self.visit(ast, children[2]);
                let then_type = ast.get(then_branch).type_info.expect("conditional branch must be type-resolved").type_decl;
                let loc = ast.get(node).location;
                let (then_branch, else_branch, result_type) = {
                    let ctx = cast_ctx(self.lib);
                    let try_else_to_then = self.matrix.find_best_cast(ast.get(else_branch).type_info.unwrap().type_decl, then_type, &ctx);
                    if try_else_to_then.is_possible() && !try_else_to_then.explicit {
                        let else_branch = self.cast_to(ast, else_branch, then_type, false, "conditional expression");
                        (then_branch, else_branch, then_type)
                    } else {
                        let else_type = ast.get(else_branch).type_info.unwrap().type_decl;
                        let then_branch = self.cast_to(ast, then_branch, else_type, false, "conditional expression");
                        (then_branch, else_branch, else_type)
                    }
                };
                ast.get_mut(node).children = vec![cond, then_branch, else_branch];
                ast.get_mut(node).type_info = Some(FunctionTypeInfo::value(result_type));
            }

            NodeKind::Ident(name) => {
                // scopes.rs leaves a bare `Ident` only when it named a
                // function (deferred here) or never resolved at all
                // (already reported). Standing alone outside a `Call`
                // callee position, neither case has a value to produce.
                let loc = ast.get(node).location;
                let _ = name;
                let variant = self.lib.engine_type_decl(EngineType::Variant);
                ast.get_mut(node).type_info = Some(FunctionTypeInfo::value(variant));
            }

            NodeKind::Type(_)
            | NodeKind::FunctionVirtual(_)
            | NodeKind::FunctionStatic(_)
            | NodeKind::FunctionFinal(_)
            | NodeKind::FunctionAlias(_) => {
                let loc = ast.get(node).location;
                self.report(loc, CompilerMessage::InternalError { detail: "type or function name used outside call position".to_string() });
            }

            NodeKind::CallFinal(_)
            | NodeKind::CallVirtual(_)
            | NodeKind::CallStatic(_)
            | NodeKind::Context
            | NodeKind::ContextRef
            | NodeKind::MemberOffset(_)
            | NodeKind::MemberOffsetRef(_)
            | NodeKind::Construct(_)
            | NodeKind::MakeValueFromRef
            | NodeKind::GeneralEqual
            | NodeKind::GeneralNotEqual
            | NodeKind::PointerEqual
            | NodeKind::PointerNotEqual
            | NodeKind::Cast(_) => {
                // Already-lowered shapes this pass itself produces; never
                // present in the tree it receives from `connect_scopes`.
                self.visit_children(ast, node);
            }
        }
        node
    }

    fn visit_case(&mut self, ast: &mut FunctionAst, node: NodeId, subject_type: TypeDeclId) -> NodeId {
        match ast.get(node).kind.clone() {
            NodeKind::Case => {
                let children = ast.get(node).children.clone();
                let value = self.visit(ast, children[0]);
                let value = self.cast_to(ast, value, subject_type, false, "case value");
                let body = self.visit(ast, children[1]);
                ast.get_mut(node).children = vec![value, body];
                node
            }
            NodeKind::DefaultCase => self.visit(ast, node),
            _ => self.visit(ast, node),
        }
    }
}
