//! Import pruning (§4.3.10): after elaboration and emission, walk every
//! opcode the primary module actually produced and keep only the
//! imported stubs reachable from there. `IdArena` never frees a slot
//! (§9 Design Notes), so "dropping" a stub means removing its entry from
//! the owning module's/file's member list, not deallocating it.

use super::StubLibrary;
use crate::opcode_emitter::Opcode;
use crate::stubs::ids::{
    ClassId, ConstantId, EnumId, FunctionId, ModuleId, PropertyId, ResolvedSymbol, StubOwner,
    TypeDeclId, TypeNameId, TypeRefId,
};
use crate::stubs::kinds::{TopLevelMember, TypeDecl};
use rustc_hash::FxHashSet;

#[derive(Default)]
struct Used {
    classes: FxHashSet<ClassId>,
    enums: FxHashSet<EnumId>,
    functions: FxHashSet<FunctionId>,
    properties: FxHashSet<PropertyId>,
    constants: FxHashSet<ConstantId>,
    type_names: FxHashSet<TypeNameId>,
}

impl StubLibrary {
    pub fn prune_unused_imports(&mut self) {
        let Some(primary) = self.primary_module else { return };
        let used = self.compute_used(primary);

        let module_ids: Vec<ModuleId> = self.modules.ids().collect();
        for m in module_ids {
            if m == primary {
                continue;
            }
            self.prune_module(m, &used);
        }

        let kept: Vec<ModuleId> = self
            .modules
            .get(primary)
            .imported_modules
            .iter()
            .copied()
            .filter(|m| !self.modules.get(*m).members.is_empty())
            .collect();
        self.modules.get_mut(primary).imported_modules = kept;
    }

    fn compute_used(&self, primary: ModuleId) -> Used {
        let mut used = Used::default();
        let ids: Vec<FunctionId> = self.functions.ids().collect();
        for id in ids {
            let f = self.functions.get(id);
            if self.module_of_owner(f.owner) != primary {
                continue;
            }
            self.mark_function(&mut used, id);
        }
        used
    }

    fn mark_class(&self, used: &mut Used, id: ClassId) {
        if !used.classes.insert(id) {
            return;
        }
        let c = self.classes.get(id);
        if let Some(base) = c.base_resolved {
            self.mark_class(used, base);
        }
        if let Some(parent) = c.parent_resolved {
            self.mark_class(used, parent);
        }
    }

    fn mark_enum(&self, used: &mut Used, id: EnumId) {
        used.enums.insert(id);
    }

    fn mark_type_name(&self, used: &mut Used, id: TypeNameId) {
        if !used.type_names.insert(id) {
            return;
        }
        let aliased = self.type_names.get(id).aliased;
        self.mark_type_decl(used, aliased);
    }

    fn mark_resolved_symbol(&self, used: &mut Used, sym: ResolvedSymbol) {
        match sym {
            ResolvedSymbol::Class(c) => self.mark_class(used, c),
            ResolvedSymbol::Enum(e) => self.mark_enum(used, e),
            ResolvedSymbol::TypeName(t) => self.mark_type_name(used, t),
        }
    }

    fn mark_type_ref(&self, used: &mut Used, id: TypeRefId) {
        if let Some(sym) = self.type_refs.get(id).resolved {
            self.mark_resolved_symbol(used, sym);
        }
    }

    fn mark_type_decl(&self, used: &mut Used, id: TypeDeclId) {
        match self.type_decls.get(id) {
            TypeDecl::Engine(_) => {}
            TypeDecl::Simple(r) | TypeDecl::ClassType(r) | TypeDecl::PtrType(r) | TypeDecl::WeakPtrType(r) => {
                self.mark_type_ref(used, *r);
            }
            TypeDecl::StaticArrayType { inner, .. } | TypeDecl::DynamicArrayType { inner } => {
                self.mark_type_decl(used, *inner);
            }
        }
    }

    fn mark_property(&self, used: &mut Used, id: PropertyId) {
        if !used.properties.insert(id) {
            return;
        }
        let p = self.properties.get(id);
        self.mark_type_decl(used, p.type_decl);
        if let StubOwner::Class(c) = p.owner {
            self.mark_class(used, c);
        }
    }

    fn mark_function(&self, used: &mut Used, id: FunctionId) {
        if !used.functions.insert(id) {
            return;
        }
        let f = self.functions.get(id);
        if let StubOwner::Class(c) = f.owner {
            self.mark_class(used, c);
        }
        if let Some(ret) = f.return_type {
            self.mark_type_decl(used, ret);
        }
        for &arg in &f.args {
            let type_decl = self.function_args.get(arg).type_decl;
            self.mark_type_decl(used, type_decl);
        }
        for op in &f.opcodes {
            self.mark_opcode(used, op);
        }
    }

    fn mark_constant(&self, used: &mut Used, id: ConstantId) {
        if !used.constants.insert(id) {
            return;
        }
        let c = self.constants.get(id);
        self.mark_type_decl(used, c.type_decl);
    }

    fn mark_opcode(&self, used: &mut Used, op: &Opcode) {
        match *op {
            Opcode::LocalCtor { type_decl, .. }
            | Opcode::LocalDtor { type_decl, .. }
            | Opcode::LocalVar { type_decl, .. }
            | Opcode::ContextFromPtr { return_type: type_decl, .. }
            | Opcode::ContextFromPtrRef { return_type: type_decl, .. }
            | Opcode::ContextFromRef { return_type: type_decl, .. }
            | Opcode::ContextFromValue { return_type: type_decl, .. }
            | Opcode::Constructor { type_decl, .. }
            | Opcode::LoadAny(type_decl)
            | Opcode::AssignAny(type_decl)
            | Opcode::TestEqual(type_decl)
            | Opcode::TestNotEqual(type_decl)
            | Opcode::CastToVariant(type_decl)
            | Opcode::CastFromVariant(type_decl)
            | Opcode::ReturnDirect(type_decl)
            | Opcode::ReturnLoad1(type_decl)
            | Opcode::ReturnLoad2(type_decl)
            | Opcode::ReturnLoad4(type_decl)
            | Opcode::ReturnLoad8(type_decl)
            | Opcode::ReturnAny(type_decl) => self.mark_type_decl(used, type_decl),
            Opcode::ContextVar(p) | Opcode::ContextCtor(p) | Opcode::ContextDtor(p) | Opcode::StructMember(p) | Opcode::StructMemberRef(p) => {
                self.mark_property(used, p);
            }
            Opcode::StaticFunc { function, .. } | Opcode::VirtualFunc { function, .. } | Opcode::FinalFunc { function, .. } => {
                self.mark_function(used, function);
            }
            Opcode::EnumConst { enum_ref, .. } => self.mark_enum(used, enum_ref),
            Opcode::ClassConst(c) | Opcode::New(c) | Opcode::DynamicCast(c) | Opcode::DynamicWeakCast(c) | Opcode::MetaCast(c) => {
                self.mark_class(used, c);
            }
            _ => {}
        }
    }

    fn prune_module(&mut self, module: ModuleId, used: &Used) {
        let keep = |member: &TopLevelMember| match *member {
            TopLevelMember::Class(c) => used.classes.contains(&c),
            TopLevelMember::Enum(e) => used.enums.contains(&e),
            TopLevelMember::Function(f) => used.functions.contains(&f),
            TopLevelMember::Property(p) => used.properties.contains(&p),
            TopLevelMember::Constant(c) => used.constants.contains(&c),
            TopLevelMember::TypeName(t) => used.type_names.contains(&t),
        };
        let file_ids = self.modules.get(module).files.clone();
        for file in file_ids {
            self.files.get_mut(file).top_level.retain(keep);
        }
        self.modules.get_mut(module).members.retain(|(_, m)| keep(m));
    }
}
