//! Type resolution (§4.3.2): two ordered passes run after all files are
//! parsed and imports merged. First every `TypeRef` is resolved by name;
//! then every `TypeDecl` is validated (aliases inlined, `Simple` must
//! reference a struct/enum, pointers and class-meta must reference a
//! non-struct class).

use super::name_resolution::ResolvedStub;
use super::StubLibrary;
use crate::stubs::ids::ResolvedSymbol;
use crate::stubs::kinds::TypeDecl;

impl StubLibrary {
    /// Pass 1: resolve every `TypeRef` in the unresolved list (§4.3.2.1).
    pub fn resolve_type_refs(&mut self) {
        let ids = self.unresolved_type_refs.clone();
        for id in ids {
            let (owner, name, line) = {
                let r = self.type_refs.get(id);
                (r.owner, r.name.clone(), r.location.line)
            };
            let Some(owner) = owner else {
                self.errors.report_error(Default::default(), line, "type reference has no context to resolve in");
                continue;
            };
            let resolved = self.resolve_name(&name, owner).and_then(symbol_of);
            if resolved.is_none() {
                let path = self.file_of_owner(owner).map(|f| self.file_abs_path(f)).unwrap_or_default();
                self.errors.report_error(path, line, format!("unresolved symbol `{}`", name.to_qualified_string(&self.strings)));
            }
            self.type_refs.get_mut(id).resolved = resolved;
        }
    }

    /// Pass 2: inline `TypeName` aliases, then validate `Simple` /
    /// pointer / class-meta semantics (§4.3.2.2).
    pub fn resolve_type_decls(&mut self) {
        let ids = self.unresolved_type_decls.clone();
        for id in ids {
            self.inline_alias_and_validate(id);
        }
    }

    fn inline_alias_and_validate(&mut self, id: crate::stubs::ids::TypeDeclId) {
        let type_ref = match self.type_decls.get(id) {
            TypeDecl::Simple(r) | TypeDecl::ClassType(r) | TypeDecl::PtrType(r) | TypeDecl::WeakPtrType(r) => Some(*r),
            _ => None,
        };
        let Some(type_ref) = type_ref else { return };

        // Inline through TypeName aliases until the target isn't one.
        let mut seen = 0;
        loop {
            let resolved = self.type_refs.get(type_ref).resolved;
            let Some(ResolvedSymbol::TypeName(tn)) = resolved else { break };
            let aliased = self.type_names.get(tn).aliased;
            if let Some(inner_ref) = self.type_decls.get(aliased).type_ref() {
                let target = self.type_refs.get(inner_ref).resolved;
                self.type_refs.get_mut(type_ref).resolved = target;
            } else {
                // Alias target is a composite (array) type; there is no
                // single symbol to keep inlining through.
                break;
            }
            seen += 1;
            if seen > 64 {
                let path = self.file_of_owner_of_ref(type_ref);
                self.errors.report_error(path, self.type_refs.get(type_ref).location.line, "type alias chain too deep (possible cycle)");
                break;
            }
        }

        let resolved = self.type_refs.get(type_ref).resolved;
        let loc = self.type_refs.get(type_ref).location;
        let path = self.file_of_owner_of_ref(type_ref);
        match (self.type_decls.get(id), resolved) {
            (TypeDecl::Simple(_), Some(ResolvedSymbol::Class(c))) => {
                if !self.classes.get(c).flags.contains(crate::stubs::ClassFlags::STRUCT) {
                    self.errors.report_error(path, loc.line, "a bare class reference must use `ptr<X>` or `weak<X>`, not a value type");
                }
            }
            (TypeDecl::Simple(_), Some(ResolvedSymbol::Enum(_))) => {}
            (TypeDecl::Simple(_), _) => {
                self.errors.report_error(path, loc.line, "expected a struct or enum type");
            }
            (TypeDecl::PtrType(_) | TypeDecl::WeakPtrType(_) | TypeDecl::ClassType(_), Some(ResolvedSymbol::Class(c))) => {
                if self.classes.get(c).flags.contains(crate::stubs::ClassFlags::STRUCT) {
                    self.errors.report_error(path, loc.line, "structs cannot be referenced through a pointer or class-meta type");
                }
            }
            (TypeDecl::PtrType(_) | TypeDecl::WeakPtrType(_) | TypeDecl::ClassType(_), _) => {
                self.errors.report_error(path, loc.line, "expected a class type");
            }
            _ => {}
        }
    }

    fn file_of_owner_of_ref(&self, type_ref: crate::stubs::ids::TypeRefId) -> std::path::PathBuf {
        self.type_refs
            .get(type_ref)
            .owner
            .and_then(|o| self.file_of_owner(o))
            .map(|f| self.file_abs_path(f))
            .unwrap_or_default()
    }
}

fn symbol_of(resolved: ResolvedStub) -> Option<ResolvedSymbol> {
    match resolved {
        ResolvedStub::Class(c) => Some(ResolvedSymbol::Class(c)),
        ResolvedStub::Enum(e) => Some(ResolvedSymbol::Enum(e)),
        ResolvedStub::TypeName(t) => Some(ResolvedSymbol::TypeName(t)),
        _ => None,
    }
}
