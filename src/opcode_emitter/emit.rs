//! The emission recursion itself (§4.9.1/§4.9.3): `generate_inner_opcodes`
//! is a large match over `NodeKind`, threading the active-scope stack so
//! `Break`/`Continue` can unwind the right set of local destructors and a
//! monotonic label counter for every jump the walk inserts.

use crate::arena::IdArena;
use crate::cast_matrix::CastKind;
use crate::diagnostics::ErrorSink;
use crate::function_ast::{FunctionAst, Node, NodeId, NodeKind};
use crate::opcode_emitter::{ArgPassingMode, Opcode, OpcodeList, encode_call_args};
use crate::stubs::ids::{ClassId, ConstantValueId, EnumOptionId, FileId, FunctionArgId, FunctionId, TypeDeclId, TypeRefId};
use crate::stubs::kinds::{ConstantValue, EngineType, EnumOption, File, Function, FunctionArg, TypeDecl, TypeRef};
use crate::stubs::ArgFlags;
use crate::string_interning::{StringId, StringTable};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitError {
    /// Raised instead of panicking when a `break`/`continue` has no
    /// `context_node` at all — malformed input reaching C10 rather than
    /// an internal miscount (§4.9.1).
    BreakOutsideLoop { location: crate::stubs::SourceLocation },
    ContinueOutsideLoop { location: crate::stubs::SourceLocation },
}

pub struct Emitter<'a> {
    ast: &'a FunctionAst,
    types: &'a IdArena<TypeDeclId, TypeDecl>,
    type_refs: &'a IdArena<TypeRefId, TypeRef>,
    functions: &'a IdArena<FunctionId, Function>,
    function_args: &'a IdArena<FunctionArgId, FunctionArg>,
    enum_options: &'a IdArena<EnumOptionId, EnumOption>,
    constant_values: &'a IdArena<ConstantValueId, ConstantValue>,
    files: &'a IdArena<FileId, File>,
    strings: &'a StringTable,
    errors: &'a ErrorSink,
    active_scopes: Vec<crate::function_ast::ScopeId>,
    next_label: u32,
    list: OpcodeList,
    first_error: Option<EmitError>,
}

impl<'a> Emitter<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ast: &'a FunctionAst,
        types: &'a IdArena<TypeDeclId, TypeDecl>,
        type_refs: &'a IdArena<TypeRefId, TypeRef>,
        functions: &'a IdArena<FunctionId, Function>,
        function_args: &'a IdArena<FunctionArgId, FunctionArg>,
        enum_options: &'a IdArena<EnumOptionId, EnumOption>,
        constant_values: &'a IdArena<ConstantValueId, ConstantValue>,
        files: &'a IdArena<FileId, File>,
        strings: &'a StringTable,
        errors: &'a ErrorSink,
    ) -> Self {
        Self {
            ast,
            types,
            type_refs,
            functions,
            function_args,
            enum_options,
            constant_values,
            files,
            strings,
            errors,
            active_scopes: Vec::new(),
            next_label: 0,
            list: OpcodeList::new(),
            first_error: None,
        }
    }

    fn fresh_label(&mut self) -> u32 {
        let label = self.next_label;
        self.next_label += 1;
        label
    }

    fn node(&self, id: NodeId) -> &Node {
        self.ast.get(id)
    }

    fn last_is_terminator(&self) -> bool {
        self.list.opcodes.last().map(Opcode::is_unconditional_terminator).unwrap_or(false)
    }

    fn resolved_class(&self, type_decl: Option<TypeDeclId>) -> Option<ClassId> {
        type_decl
            .and_then(|t| self.types.get(t).type_ref())
            .and_then(|r| self.type_refs.get(r).resolved)
            .and_then(|s| s.as_class())
    }

    /// Entry point: emits the whole function body, returning the
    /// finished list, or the first structural error encountered.
    pub fn emit_function(mut self, root: NodeId) -> Result<OpcodeList, EmitError> {
        self.generate_inner_opcodes(root);
        match self.first_error {
            Some(err) => Err(err),
            None => Ok(self.list),
        }
    }

    pub fn generate_inner_opcodes(&mut self, id: NodeId) {
        if self.first_error.is_some() {
            return;
        }
        let node = self.node(id).clone();
        match &node.kind {
            NodeKind::Nop => {}

            NodeKind::Scope => {
                let scope_id = node.scope.expect("Scope node missing its owned scope");
                self.active_scopes.push(scope_id);
                let vars = self.declared_vars(scope_id);
                for var in &vars {
                    self.list.push(Opcode::LocalCtor { var_index: var.index, type_decl: var.type_decl });
                }
                for &child in &node.children {
                    self.generate_inner_opcodes(child);
                }
                if !self.last_is_terminator() {
                    for var in vars.iter().rev() {
                        self.list.push(Opcode::LocalDtor { var_index: var.index, type_decl: var.type_decl });
                    }
                }
                self.active_scopes.pop();
            }

            NodeKind::StatementList => {
                let mut terminated = false;
                for &child in &node.children {
                    if terminated {
                        let loc = self.node(child).location;
                        self.errors.report_warning(self.files.get(loc.file).abs_path.clone(), loc.line, "unreachable code");
                        break;
                    }
                    self.generate_inner_opcodes(child);
                    terminated = self.last_is_terminator();
                }
            }

            NodeKind::ExpressionList | NodeKind::Statement | NodeKind::Context | NodeKind::ContextRef => {
                for &child in &node.children {
                    self.generate_inner_opcodes(child);
                }
            }

            NodeKind::IfThenElse => {
                let condition = node.children[0];
                let then_branch = node.children[1];
                let else_branch = node.children.get(2).copied();
                self.generate_inner_opcodes(condition);
                let end_label = self.fresh_label();
                if let Some(else_branch) = else_branch {
                    let false_label = self.fresh_label();
                    self.list.push(Opcode::JumpIfFalse(false_label));
                    self.generate_inner_opcodes(then_branch);
                    self.list.push(Opcode::Jump(end_label));
                    self.list.push(Opcode::Label(false_label));
                    self.generate_inner_opcodes(else_branch);
                } else {
                    self.list.push(Opcode::JumpIfFalse(end_label));
                    self.generate_inner_opcodes(then_branch);
                }
                self.list.push(Opcode::Label(end_label));
            }

            NodeKind::Switch => {
                let subject = node.children[0];
                self.generate_inner_opcodes(subject);
                for &case in &node.children[1..] {
                    self.generate_inner_opcodes(case);
                }
                if let Some(break_label) = node.loop_break_label {
                    self.list.push(Opcode::Label(break_label));
                }
            }

            NodeKind::Case => {
                self.generate_inner_opcodes(node.children[0]);
                self.generate_inner_opcodes(node.children[1]);
            }

            NodeKind::DefaultCase => {
                self.generate_inner_opcodes(node.children[0]);
            }

            NodeKind::For => {
                let condition = node.children[0];
                let increment = node.children[1];
                let body = node.children[2];
                let loop_start = self.fresh_label();
                let break_label = node.loop_break_label.unwrap_or_else(|| self.fresh_label());
                let continue_label = node.loop_continue_label.unwrap_or_else(|| self.fresh_label());

                self.list.push(Opcode::Label(loop_start));
                if !matches!(self.node(condition).kind, NodeKind::Nop) {
                    self.generate_inner_opcodes(condition);
                    self.list.push(Opcode::JumpIfFalse(break_label));
                }
                self.generate_inner_opcodes(body);
                self.list.push(Opcode::Label(continue_label));
                if !matches!(self.node(increment).kind, NodeKind::Nop) {
                    self.generate_inner_opcodes(increment);
                }
                self.list.push(Opcode::Jump(loop_start));
                self.list.push(Opcode::Label(break_label));
            }

            NodeKind::While => {
                let condition = node.children[0];
                let body = node.children[2];
                let loop_start = self.fresh_label();
                let break_label = node.loop_break_label.unwrap_or_else(|| self.fresh_label());
                let continue_label = node.loop_continue_label.unwrap_or_else(|| self.fresh_label());

                self.list.push(Opcode::Label(loop_start));
                self.generate_inner_opcodes(condition);
                self.list.push(Opcode::JumpIfFalse(break_label));
                self.generate_inner_opcodes(body);
                self.list.push(Opcode::Label(continue_label));
                self.list.push(Opcode::Jump(loop_start));
                self.list.push(Opcode::Label(break_label));
            }

            NodeKind::DoWhile => {
                let condition = node.children[0];
                let body = node.children[2];
                let loop_start = self.fresh_label();
                let break_label = node.loop_break_label.unwrap_or_else(|| self.fresh_label());
                let continue_label = node.loop_continue_label.unwrap_or_else(|| self.fresh_label());

                self.list.push(Opcode::Label(loop_start));
                self.generate_inner_opcodes(body);
                self.list.push(Opcode::Label(continue_label));
                self.generate_inner_opcodes(condition);
                self.list.push(Opcode::JumpIfFalse(break_label));
                self.list.push(Opcode::Jump(loop_start));
                self.list.push(Opcode::Label(break_label));
            }

            NodeKind::Break => self.unwind_to_loop(node.context_node, node.location, true),
            NodeKind::Continue => self.unwind_to_loop(node.context_node, node.location, false),

            NodeKind::Return => {
                for &scope in self.active_scopes.clone().iter().rev() {
                    for var in self.declared_vars(scope).into_iter().rev() {
                        self.list.push(Opcode::LocalDtor { var_index: var.index, type_decl: var.type_decl });
                    }
                }
                if let Some(&expr) = node.children.first() {
                    self.generate_inner_opcodes(expr);
                    if let Some(info) = self.node(expr).type_info {
                        let ret_opcode = if info.is_reference {
                            self.return_load_opcode(info.type_decl)
                        } else {
                            Opcode::ReturnDirect(info.type_decl)
                        };
                        self.list.push(ret_opcode);
                    }
                }
                self.list.push(Opcode::Exit);
            }

            NodeKind::Assign => {
                let lvalue = node.children[0];
                let rvalue = node.children[1];
                let type_decl = self
                    .node(lvalue)
                    .type_info
                    .or_else(|| self.node(rvalue).type_info)
                    .expect("assignment operands must be type-resolved before emission")
                    .type_decl;
                self.list.push(self.assign_opcode(type_decl));
                self.generate_inner_opcodes(lvalue);
                self.generate_inner_opcodes(rvalue);
            }

            NodeKind::Const(value_id) => {
                self.emit_const(*value_id, node.type_info.map(|t| t.type_decl));
            }

            NodeKind::Null => self.list.push(Opcode::Null),

            NodeKind::This => self.list.push(Opcode::ThisObject),

            NodeKind::VarArg(index) => self.list.push(Opcode::ParamVar(*index)),

            NodeKind::VarLocal(scope, name) => {
                let var = self
                    .ast
                    .scopes
                    .find_var(*scope, *name)
                    .expect("resolved local variable must exist in its scope chain");
                self.list.push(Opcode::LocalVar { var_index: var.index, type_decl: var.type_decl });
            }

            NodeKind::VarClass(property) => self.list.push(Opcode::ContextVar(*property)),
            NodeKind::MemberOffset(property) => self.list.push(Opcode::StructMember(*property)),
            NodeKind::MemberOffsetRef(property) => self.list.push(Opcode::StructMemberRef(*property)),

            NodeKind::EnumConst { enum_ref, option } => {
                let name = self.enum_options.get(*option).name;
                self.list.push(Opcode::EnumConst { enum_ref: *enum_ref, name });
            }

            NodeKind::MakeValueFromRef => {
                let inner = node.children[0];
                self.generate_inner_opcodes(inner);
                let type_decl = self.node(inner).type_info.expect("reference value must be type-resolved").type_decl;
                self.list.push(self.load_opcode(type_decl));
            }

            NodeKind::CallStatic(function) | NodeKind::CallVirtual(function) | NodeKind::CallFinal(function) => {
                self.emit_call(&node, *function);
            }

            NodeKind::Construct(type_decl) => {
                for &arg in &node.children {
                    self.generate_inner_opcodes(arg);
                }
                let type_decl = *type_decl;
                if self.types.get(type_decl).is_shared_ptr() {
                    let class = self
                        .resolved_class(Some(type_decl))
                        .expect("pointer construction must resolve to a class");
                    self.list.push(Opcode::New(class));
                }
                self.list.push(Opcode::Constructor { type_decl, argc: node.children.len() as u32 });
            }

            NodeKind::Cast(kind) => self.emit_cast(&node, *kind),

            NodeKind::GeneralEqual | NodeKind::PointerEqual => {
                let (a, b) = (node.children[0], node.children[1]);
                self.generate_inner_opcodes(a);
                self.generate_inner_opcodes(b);
                let type_decl = self.node(a).type_info.expect("comparison operand must be type-resolved").type_decl;
                self.list.push(Opcode::TestEqual(type_decl));
            }

            NodeKind::GeneralNotEqual | NodeKind::PointerNotEqual => {
                let (a, b) = (node.children[0], node.children[1]);
                self.generate_inner_opcodes(a);
                self.generate_inner_opcodes(b);
                let type_decl = self.node(a).type_info.expect("comparison operand must be type-resolved").type_decl;
                self.list.push(Opcode::TestNotEqual(type_decl));
            }

            NodeKind::Conditional => {
                let (condition, then_expr, else_expr) = (node.children[0], node.children[1], node.children[2]);
                self.generate_inner_opcodes(condition);
                let else_label = self.fresh_label();
                let end_label = self.fresh_label();
                self.list.push(Opcode::JumpIfFalse(else_label));
                self.generate_inner_opcodes(then_expr);
                self.list.push(Opcode::Jump(end_label));
                self.list.push(Opcode::Label(else_label));
                self.generate_inner_opcodes(else_expr);
                self.list.push(Opcode::Label(end_label));
            }

            // `Ident`/`Var`/`Operator`/`Call`/`New`/`Type`/`AccessMember`/
            // `AccessIndex`/the bare `FunctionVirtual`/`FunctionStatic`/
            // `FunctionFinal`/`FunctionAlias` value forms never reach C10:
            // elaboration (§4.8) rewrites every one of them into a
            // resolved variant above before opcode generation runs.
            other => unreachable!("unelaborated node reached the emitter: {other:?}"),
        }
    }

    fn declared_vars(&self, scope_id: crate::function_ast::ScopeId) -> Vec<crate::function_ast::FunctionVar> {
        let scope = self.ast.scopes.get(scope_id);
        scope.declaration_order.iter().map(|name| scope.find_local_var(*name).unwrap().clone()).collect()
    }

    fn unwind_to_loop(&mut self, context_node: Option<NodeId>, location: crate::stubs::SourceLocation, is_break: bool) {
        if self.first_error.is_some() {
            return;
        }
        let Some(context) = context_node else {
            self.first_error = Some(if is_break {
                EmitError::BreakOutsideLoop { location }
            } else {
                EmitError::ContinueOutsideLoop { location }
            });
            return;
        };
        let target_scope = self.node(context).scope;
        let mut unwound = Vec::new();
        for &scope in self.active_scopes.iter().rev() {
            if Some(scope) == target_scope {
                break;
            }
            unwound.push(scope);
        }
        for scope in unwound {
            for var in self.declared_vars(scope).into_iter().rev() {
                self.list.push(Opcode::LocalDtor { var_index: var.index, type_decl: var.type_decl });
            }
        }
        let label = if is_break { self.node(context).loop_break_label } else { self.node(context).loop_continue_label };
        self.list.push(Opcode::Jump(label.expect("loop/switch context node must carry its break/continue label")));
    }

    fn emit_call(&mut self, node: &Node, function: FunctionId) {
        let func = self.functions.get(function);
        if let Some(opcode_name) = func.opcode_name {
            self.emit_opcode_alias_call(node, opcode_name);
            return;
        }

        let (context, args): (Option<NodeId>, &[NodeId]) = match node.kind {
            NodeKind::CallStatic(_) => (None, &node.children[..]),
            NodeKind::CallVirtual(_) | NodeKind::CallFinal(_) => (node.children.first().copied(), &node.children[1..]),
            _ => unreachable!("emit_call only handles the three resolved call kinds"),
        };

        let modes: Vec<ArgPassingMode> = func
            .args
            .iter()
            .map(|&arg_id| {
                if self.function_args.get(arg_id).flags.contains(ArgFlags::REF) {
                    ArgPassingMode::Ref
                } else {
                    ArgPassingMode::TypedValue
                }
            })
            .collect();
        let encoding = encode_call_args(&modes);

        let call_opcode = match node.kind {
            NodeKind::CallStatic(f) => Opcode::StaticFunc { function: f, encoding },
            NodeKind::CallVirtual(f) => Opcode::VirtualFunc { function: f, encoding },
            NodeKind::CallFinal(f) => Opcode::FinalFunc { function: f, encoding },
            _ => unreachable!(),
        };

        if let Some(ctx) = context {
            let return_type = node
                .type_info
                .map(|t| t.type_decl)
                .or(func.return_type)
                .expect("a call used as an expression must carry a resolved type");
            let label = self.fresh_label();
            let ctx_info = self.node(ctx).type_info.expect("call context must be type-resolved");
            let wrapper = if self.types.get(ctx_info.type_decl).is_shared_ptr() {
                if ctx_info.is_reference {
                    Opcode::ContextFromPtrRef { label, return_type }
                } else {
                    Opcode::ContextFromPtr { label, return_type }
                }
            } else if ctx_info.is_reference {
                Opcode::ContextFromRef { label, return_type }
            } else {
                Opcode::ContextFromValue { label, return_type }
            };
            self.list.push(wrapper);
            self.generate_inner_opcodes(ctx);
            self.list.push(Opcode::Label(label));
        }
        self.list.push(call_opcode);
        for &arg in args {
            self.generate_inner_opcodes(arg);
        }
    }

    /// Native-implemented functions translate into a single opcode rather
    /// than a call (`OPCODE_ALIAS`, §4.9.1); the short-circuit operators
    /// need their own end label instead of a plain opcode emission.
    fn emit_opcode_alias_call(&mut self, node: &Node, opcode_name: StringId) {
        if opcode_name.eq_str(self.strings, "LogicOr") {
            self.generate_inner_opcodes(node.children[0]);
            let end = self.fresh_label();
            self.list.push(Opcode::LogicOr(end));
            self.generate_inner_opcodes(node.children[1]);
            self.list.push(Opcode::Label(end));
            return;
        }
        if opcode_name.eq_str(self.strings, "LogicAnd") {
            self.generate_inner_opcodes(node.children[0]);
            let end = self.fresh_label();
            self.list.push(Opcode::LogicAnd(end));
            self.generate_inner_opcodes(node.children[1]);
            self.list.push(Opcode::Label(end));
            return;
        }
        for &child in &node.children {
            self.generate_inner_opcodes(child);
        }
        self.list.push(Opcode::Nop);
    }

    fn emit_cast(&mut self, node: &Node, kind: CastKind) {
        let inner = node.children[0];
        self.generate_inner_opcodes(inner);
        if matches!(kind, CastKind::Passthrough | CastKind::PassthroughNoRef) {
            return;
        }
        let inner_type = self.node(inner).type_info.map(|t| t.type_decl);
        let dest_type = node.type_info.map(|t| t.type_decl);
        let dest_class = self.resolved_class(dest_type);
        self.list.push(cast_kind_to_opcode(kind, inner_type, dest_type, dest_class));
    }

    fn emit_const(&mut self, value_id: ConstantValueId, type_decl: Option<TypeDeclId>) {
        let engine = type_decl.and_then(|t| match self.types.get(t) {
            TypeDecl::Engine(e) => Some(*e),
            _ => None,
        });
        let opcode = match self.constant_values.get(value_id).clone() {
            ConstantValue::Integer(v) => int_const_opcode(v, engine),
            ConstantValue::Unsigned(v) => uint_const_opcode(v, engine),
            ConstantValue::Float(v) => {
                if engine == Some(EngineType::Double) {
                    Opcode::DoubleConst(v)
                } else {
                    Opcode::FloatConst(v as f32)
                }
            }
            ConstantValue::Bool(b) => {
                if b {
                    Opcode::BoolTrue
                } else {
                    Opcode::BoolFalse
                }
            }
            ConstantValue::Name(s) => Opcode::NameConst(s),
            ConstantValue::String(s) => Opcode::StringConst(s),
            ConstantValue::Compound { .. } => {
                unreachable!("compound constants lower to Construct nodes before reaching the emitter")
            }
        };
        self.list.push(opcode);
    }

    fn return_load_opcode(&self, type_decl: TypeDeclId) -> Opcode {
        match self.types.get(type_decl) {
            TypeDecl::Engine(EngineType::Int8) | TypeDecl::Engine(EngineType::Uint8) => Opcode::ReturnLoad1(type_decl),
            TypeDecl::Engine(EngineType::Int16) | TypeDecl::Engine(EngineType::Uint16) => Opcode::ReturnLoad2(type_decl),
            TypeDecl::Engine(EngineType::Int) | TypeDecl::Engine(EngineType::Uint) => Opcode::ReturnLoad4(type_decl),
            TypeDecl::Engine(EngineType::Int64) | TypeDecl::Engine(EngineType::Uint64) => Opcode::ReturnLoad8(type_decl),
            _ => Opcode::ReturnAny(type_decl),
        }
    }

    fn load_opcode(&self, type_decl: TypeDeclId) -> Opcode {
        match self.types.get(type_decl) {
            TypeDecl::Engine(EngineType::Int8) => Opcode::LoadInt1,
            TypeDecl::Engine(EngineType::Uint8) => Opcode::LoadUint1,
            TypeDecl::Engine(EngineType::Int16) => Opcode::LoadInt2,
            TypeDecl::Engine(EngineType::Uint16) => Opcode::LoadUint2,
            TypeDecl::Engine(EngineType::Int) => Opcode::LoadInt4,
            TypeDecl::Engine(EngineType::Uint) => Opcode::LoadUint4,
            TypeDecl::Engine(EngineType::Int64) => Opcode::LoadInt8,
            TypeDecl::Engine(EngineType::Uint64) => Opcode::LoadUint8,
            TypeDecl::Engine(EngineType::Float) => Opcode::LoadFloat,
            TypeDecl::Engine(EngineType::Double) => Opcode::LoadDouble,
            TypeDecl::PtrType(_) => Opcode::LoadStrongPtr,
            TypeDecl::WeakPtrType(_) => Opcode::LoadWeakPtr,
            _ => Opcode::LoadAny(type_decl),
        }
    }

    fn assign_opcode(&self, type_decl: TypeDeclId) -> Opcode {
        match self.types.get(type_decl) {
            TypeDecl::Engine(EngineType::Int8) => Opcode::AssignInt1,
            TypeDecl::Engine(EngineType::Uint8) => Opcode::AssignUint1,
            TypeDecl::Engine(EngineType::Int16) => Opcode::AssignInt2,
            TypeDecl::Engine(EngineType::Uint16) => Opcode::AssignUint2,
            TypeDecl::Engine(EngineType::Int) => Opcode::AssignInt4,
            TypeDecl::Engine(EngineType::Uint) => Opcode::AssignUint4,
            TypeDecl::Engine(EngineType::Int64) => Opcode::AssignInt8,
            TypeDecl::Engine(EngineType::Uint64) => Opcode::AssignUint8,
            TypeDecl::Engine(EngineType::Float) => Opcode::AssignFloat,
            TypeDecl::Engine(EngineType::Double) => Opcode::AssignDouble,
            _ => Opcode::AssignAny(type_decl),
        }
    }
}

fn int_const_opcode(v: i64, engine: Option<EngineType>) -> Opcode {
    match engine {
        Some(EngineType::Int) if v == 0 => Opcode::IntZero,
        Some(EngineType::Int) if v == 1 => Opcode::IntOne,
        Some(EngineType::Int8) => Opcode::IntConst1(v as i8),
        Some(EngineType::Int16) => Opcode::IntConst2(v as i16),
        Some(EngineType::Int64) => Opcode::IntConst8(v),
        _ => Opcode::IntConst4(v as i32),
    }
}

fn uint_const_opcode(v: u64, engine: Option<EngineType>) -> Opcode {
    match engine {
        Some(EngineType::Uint8) => Opcode::UintConst1(v as u8),
        Some(EngineType::Uint16) => Opcode::UintConst2(v as u16),
        Some(EngineType::Uint64) => Opcode::UintConst8(v),
        _ => Opcode::UintConst4(v as u32),
    }
}

fn cast_kind_to_opcode(
    kind: CastKind,
    inner_type: Option<TypeDeclId>,
    dest_type: Option<TypeDeclId>,
    dest_class: Option<ClassId>,
) -> Opcode {
    match kind {
        CastKind::CastStrongPtrToBool => Opcode::StrongToBool,
        CastKind::CastWeakPtrToBool => Opcode::WeakToBool,
        CastKind::CastVariantToType => {
            Opcode::CastFromVariant(dest_type.expect("variant-to-type cast needs the resolved destination type"))
        }
        CastKind::CastTypeToVariant => {
            Opcode::CastToVariant(inner_type.expect("type-to-variant cast needs the resolved source type"))
        }
        CastKind::EnumToInt64 => Opcode::EnumToInt64,
        CastKind::EnumToInt32 => Opcode::EnumToInt32,
        CastKind::Int64ToEnum => Opcode::Int64ToEnum,
        CastKind::Int32ToEnum => Opcode::Int32ToEnum,
        CastKind::EnumToName => Opcode::EnumToName,
        CastKind::NameToEnum => Opcode::NameToEnum,
        CastKind::EnumToString => Opcode::EnumToString,
        CastKind::CastStrongToWeak => Opcode::StrongToWeak,
        CastKind::CastWeakToStrong => Opcode::WeakToStrong,
        CastKind::CastDownStrong => Opcode::DynamicCast(dest_class.expect("downcast needs a resolved destination class")),
        CastKind::CastDownWeak => {
            Opcode::DynamicWeakCast(dest_class.expect("weak downcast needs a resolved destination class"))
        }
        CastKind::CastClassMetaDownCast => {
            Opcode::MetaCast(dest_class.expect("class-meta downcast needs a resolved destination class"))
        }
        CastKind::CastClassToBool => Opcode::ClassToBool,
        CastKind::CastClassToName => Opcode::ClassToName,
        CastKind::CastClassToString => Opcode::ClassToString,
        CastKind::Passthrough | CastKind::PassthroughNoRef => unreachable!("handled before reaching the opcode table"),
        CastKind::CastFunc => unreachable!("user casts lower to a direct call node, not a Cast wrapper"),
    }
}
