//! Class linking (§4.3.3): base/parent resolution, the default
//! `Core.ScriptedObject` base, acyclicity, and derived/child back-links.

use super::StubLibrary;
use crate::interned_path::InternedPath;
use crate::stubs::ids::{ClassId, StubOwner};

impl StubLibrary {
    /// Links every class's base and parent, in whatever order they were
    /// declared. Call after `resolve_type_refs`/`resolve_type_decls` so
    /// `access_control` checks on the base reference have something to
    /// check against, but linking itself only needs names.
    pub fn link_classes(&mut self) {
        let ids: Vec<ClassId> = self.classes.ids().collect();
        for id in ids {
            self.link_base(id);
            self.link_parent(id);
        }
    }

    fn link_base(&mut self, id: ClassId) {
        let (owner, flags, base_name, location) = {
            let c = self.classes.get(id);
            (c.owner, c.flags, c.base_name, c.location)
        };
        let is_struct = flags.contains(crate::stubs::ClassFlags::STRUCT);
        let is_import = flags.contains(crate::stubs::ClassFlags::IMPORT);

        if is_struct && base_name.is_some() {
            let path = self.file_of_owner(owner).map(|f| self.file_abs_path(f)).unwrap_or_default();
            self.errors.report_error(path, location.line, "a struct may not declare a base class");
            return;
        }

        let resolved = if let Some(name) = base_name {
            let path = InternedPath::from_components(vec![name]);
            self.resolve_class_name(&path, owner, location.line)
        } else if !is_struct && !is_import {
            let default_path = default_base_path(self);
            self.resolve_class_name(&default_path, owner, location.line)
        } else {
            None
        };

        if let Some(base) = resolved {
            if self.derives_from(base, id) {
                let path = self.file_of_owner(owner).map(|f| self.file_abs_path(f)).unwrap_or_default();
                self.errors.report_error(path, location.line, "class inheritance forms a cycle");
                return;
            }
            self.classes.get_mut(id).base_resolved = Some(base);
            self.classes.get_mut(base).derived_classes.push(id);
        }
    }

    fn link_parent(&mut self, id: ClassId) {
        let (owner, parent_name, location) = {
            let c = self.classes.get(id);
            (c.owner, c.parent_name, c.location)
        };
        let Some(name) = parent_name else { return };
        let path = InternedPath::from_components(vec![name]);
        if let Some(parent) = self.resolve_class_name(&path, owner, location.line) {
            self.classes.get_mut(id).parent_resolved = Some(parent);
            self.classes.get_mut(parent).child_classes.push(id);
        }
    }

    fn resolve_class_name(&mut self, name: &InternedPath, context: StubOwner, line: u32) -> Option<ClassId> {
        match self.resolve_name(name, context) {
            Some(super::ResolvedStub::Class(c)) => Some(c),
            Some(_) => {
                let path = self.file_of_owner(context).map(|f| self.file_abs_path(f)).unwrap_or_default();
                self.errors.report_error(path, line, format!("`{}` is not a class", name.to_qualified_string(&self.strings)));
                None
            }
            None => {
                let path = self.file_of_owner(context).map(|f| self.file_abs_path(f)).unwrap_or_default();
                self.errors.report_error(path, line, format!("unresolved symbol `{}`", name.to_qualified_string(&self.strings)));
                None
            }
        }
    }

    /// Whether `derived`'s base chain reaches `base` (used both for
    /// cycle detection and, via `ResolvedSymbol`, cast-matrix upcasts).
    pub fn derives_from(&self, derived: ClassId, base: ClassId) -> bool {
        let mut current = Some(derived);
        while let Some(c) = current {
            if c == base {
                return true;
            }
            current = self.classes.get(c).base_resolved;
        }
        false
    }
}

fn default_base_path(lib: &mut StubLibrary) -> InternedPath {
    let core = lib.strings.intern("Core");
    let scripted_object = lib.strings.intern("ScriptedObject");
    InternedPath::from_components(vec![core, scripted_object])
}
