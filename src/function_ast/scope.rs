//! Lexical scopes within one function body (§4.6).

use crate::stubs::ids::TypeDeclId;
use crate::string_interning::StringId;
use crate::arena::IdArena;
use crate::define_arena_id;
use rustc_hash::FxHashMap;

define_arena_id!(ScopeId);

/// A local variable declared within a [`Scope`].
#[derive(Debug, Clone)]
pub struct FunctionVar {
    pub name: StringId,
    pub location: crate::stubs::SourceLocation,
    pub type_decl: TypeDeclId,
    pub scope: ScopeId,
    /// Monotonically increasing per-function index, assigned in
    /// declaration order by `resolveVars` (§4.8).
    pub index: u32,
}

/// One lexical scope. Owned by a `Scope` AST node; `findVar` walks the
/// parent chain, `findLocalVar` does not (§4.6).
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub locals: FxHashMap<StringId, FunctionVar>,
    /// Declaration order, since ctor/dtor emission order matters (§4.9.1).
    pub declaration_order: Vec<StringId>,
}

impl Scope {
    pub fn new(parent: Option<ScopeId>) -> Self {
        Self { parent, locals: FxHashMap::default(), declaration_order: Vec::new() }
    }

    pub fn declare(&mut self, var: FunctionVar) {
        self.declaration_order.push(var.name);
        self.locals.insert(var.name, var);
    }

    pub fn find_local_var(&self, name: StringId) -> Option<&FunctionVar> {
        self.locals.get(&name)
    }
}

/// Owning store of every scope allocated while elaborating one function.
#[derive(Debug, Clone, Default)]
pub struct ScopeArena {
    scopes: IdArena<ScopeId, Scope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self { scopes: IdArena::new() }
    }

    pub fn alloc(&mut self, parent: Option<ScopeId>) -> ScopeId {
        self.scopes.alloc(Scope::new(parent))
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        self.scopes.get(id)
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        self.scopes.get_mut(id)
    }

    /// Walks from `scope` up through parents looking for `name`
    /// (`findVar`, §4.6).
    pub fn find_var(&self, scope: ScopeId, name: StringId) -> Option<&FunctionVar> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = self.scopes.get(id);
            if let Some(var) = s.locals.get(&name) {
                return Some(var);
            }
            current = s.parent;
        }
        None
    }

    /// True if `name` is declared in `scope` or any enclosing scope up to
    /// (but not past) `boundary`, inclusive. Used by the shadowing-warning
    /// check in `resolveVars`.
    pub fn find_var_excluding(
        &self,
        scope: ScopeId,
        name: StringId,
    ) -> Option<(ScopeId, &FunctionVar)> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = self.scopes.get(id);
            if let Some(var) = s.locals.get(&name) {
                return Some((id, var));
            }
            current = s.parent;
        }
        None
    }
}
