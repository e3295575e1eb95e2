//! connectScopes + resolveVars (§4.8.1): a single top-down walk that
//! allocates a `ScopeArena` entry per `Scope` node, declares `var`
//! locals into it, pre-assigns the break/continue label every loop or
//! switch will use, and rewrites every `Ident` that names a local, an
//! argument, an instance property, a named constant or an enum option
//! into its resolved `NodeKind`. A bare identifier naming a function is
//! left alone for `resolve_types`'s call-site overload search; anything
//! else that fails to resolve here is reported and left untouched.

use crate::diagnostics::CompilerMessage;
use crate::function_ast::{FunctionAst, FunctionTypeInfo, FunctionVar, NodeId, NodeKind, ScopeId};
use crate::interned_path::InternedPath;
use crate::stub_library::{ResolvedStub, StubLibrary};
use crate::stubs::ids::FunctionId;
use crate::stubs::StubOwner;
use crate::string_interning::StringId;

/// The top bit keeps every label this pass hands out from ever
/// colliding with C10's own `fresh_label()` counter, which starts at 0
/// and is scoped to the same function body (§4.9.1).
const LABEL_TAG: u32 = 0x8000_0000;

struct ScopeWalker<'lib> {
    lib: &'lib StubLibrary,
    owner: FunctionId,
    next_label: u32,
    loop_stack: Vec<NodeId>,
    break_stack: Vec<NodeId>,
}

pub fn connect_scopes(lib: &StubLibrary, owner: FunctionId, ast: &mut FunctionAst) {
    let mut walker = ScopeWalker { lib, owner, next_label: 0, loop_stack: Vec::new(), break_stack: Vec::new() };
    if let Some(root) = ast.root {
        walker.walk(ast, None, root);
    }
}

impl<'lib> ScopeWalker<'lib> {
    fn fresh_label(&mut self) -> u32 {
        let label = LABEL_TAG | self.next_label;
        self.next_label += 1;
        label
    }

    fn walk(&mut self, ast: &mut FunctionAst, scope: Option<ScopeId>, node: NodeId) {
        // Every node records the scope it evaluates in; `Scope` itself
        // overwrites this right below with the fresh child scope it owns,
        // which is what `unwind_to_loop` and LocalCtor/Dtor emission
        // (opcode_emitter) read back.
        ast.get_mut(node).scope = scope;
        match ast.get(node).kind.clone() {
            NodeKind::Scope => {
                let inner = ast.scopes.alloc(scope);
                ast.get_mut(node).scope = Some(inner);
                let children = ast.get(node).children.clone();
                for child in children {
                    self.walk(ast, Some(inner), child);
                }
            }

            NodeKind::Var { name, type_decl } => {
                let children = ast.get(node).children.clone();
                for &child in &children {
                    self.walk(ast, scope, child);
                }
                let Some(scope_id) = scope else { return };
                let index = ast.next_var_index();
                let location = ast.get(node).location;
                ast.scopes.get_mut(scope_id).declare(FunctionVar { name, location, type_decl, scope: scope_id, index });
            }

            NodeKind::For | NodeKind::While | NodeKind::DoWhile => {
                let break_label = self.fresh_label();
                let continue_label = self.fresh_label();
                let n = ast.get_mut(node);
                n.loop_break_label = Some(break_label);
                n.loop_continue_label = Some(continue_label);
                self.loop_stack.push(node);
                self.break_stack.push(node);
                let children = ast.get(node).children.clone();
                for child in children {
                    self.walk(ast, scope, child);
                }
                self.loop_stack.pop();
                self.break_stack.pop();
            }

            NodeKind::Switch => {
                let break_label = self.fresh_label();
                ast.get_mut(node).loop_break_label = Some(break_label);
                self.break_stack.push(node);
                let children = ast.get(node).children.clone();
                for child in children {
                    self.walk(ast, scope, child);
                }
                self.break_stack.pop();
            }

            NodeKind::Break => {
                let target = self.break_stack.last().copied();
                ast.get_mut(node).context_node = target;
            }

            NodeKind::Continue => {
                let target = self.loop_stack.last().copied();
                ast.get_mut(node).context_node = target;
            }

            NodeKind::Ident(name) => self.resolve_ident(ast, scope, node, name),

            // A bare function name in callee position can't be resolved by
            // a single exact-name lookup when it's overloaded (§4.3.7):
            // distinct overloads share one `alias_name` but have distinct
            // mangled `name`s, so `resolve_name` only ever finds the
            // unoverloaded case. Leave the callee alone here; the full
            // candidate search happens in `resolve_types` where the whole
            // argument list is available to pick among them. A method
            // callee (`obj.method(...)`) still needs its receiver
            // expression walked for locals/args inside it.
            NodeKind::Call => {
                let children = ast.get(node).children.clone();
                let callee = children[0];
                match ast.get(callee).kind.clone() {
                    NodeKind::Ident(_) => {}
                    NodeKind::AccessMember(_) => {
                        let receiver_children = ast.get(callee).children.clone();
                        for child in receiver_children {
                            self.walk(ast, scope, child);
                        }
                    }
                    _ => self.walk(ast, scope, callee),
                }
                for &arg in &children[1..] {
                    self.walk(ast, scope, arg);
                }
            }

            _ => {
                let children = ast.get(node).children.clone();
                for child in children {
                    self.walk(ast, scope, child);
                }
            }
        }
    }

    fn resolve_ident(&mut self, ast: &mut FunctionAst, scope: Option<ScopeId>, node: NodeId, name: StringId) {
        if let Some(scope_id) = scope {
            if let Some(var) = ast.scopes.find_var(scope_id, name) {
                let var_scope = var.scope;
                let type_decl = var.type_decl;
                ast.get_mut(node).kind = NodeKind::VarLocal(var_scope, name);
                ast.get_mut(node).type_info = Some(FunctionTypeInfo::reference(type_decl, false));
                return;
            }
        }

        let mut path = InternedPath::new();
        path.push(name);
        let resolved = self.lib.resolve_name(&path, StubOwner::Function(self.owner));
        match resolved {
            Some(ResolvedStub::FunctionArg(arg)) => {
                let index = self.lib.function_args.get(arg).index;
                let type_decl = self.lib.function_args.get(arg).type_decl;
                ast.get_mut(node).kind = NodeKind::VarArg(index);
                ast.get_mut(node).type_info = Some(FunctionTypeInfo::reference(type_decl, false));
            }
            Some(ResolvedStub::Property(p)) => {
                let type_decl = self.lib.properties.get(p).type_decl;
                ast.get_mut(node).kind = NodeKind::VarClass(p);
                ast.get_mut(node).type_info = Some(FunctionTypeInfo::reference(type_decl, false));
            }
            Some(ResolvedStub::Constant(c)) => {
                let value = self.lib.constants.get(c).value;
                let type_decl = self.lib.constants.get(c).type_decl;
                ast.get_mut(node).kind = NodeKind::Const(value);
                ast.get_mut(node).type_info = Some(FunctionTypeInfo::value(type_decl));
            }
            Some(ResolvedStub::EnumOption(opt)) => {
                let enum_ref = self.lib.enum_options.get(opt).owner;
                ast.get_mut(node).kind = NodeKind::EnumConst { enum_ref, option: opt };
            }
            // Left as `Ident`; `resolve_types` resolves it at the
            // enclosing `Call` node, where the full overload set is
            // visible under its alias name.
            Some(ResolvedStub::Function(_)) => {}
            Some(_) | None => {
                let loc = ast.get(node).location;
                self.lib.errors.report_error(
                    self.lib.file_abs_path(loc.file),
                    loc.line,
                    CompilerMessage::UnresolvedSymbol {
                        name: name.resolve(&self.lib.strings).to_string(),
                        scope: format!("function `{}`", self.lib.functions.get(self.owner).name.resolve(&self.lib.strings)),
                    },
                );
            }
        }
    }
}
