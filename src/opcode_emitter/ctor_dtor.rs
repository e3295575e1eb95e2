//! Automatic constructor/destructor synthesis (§4.3.8, §4.9.2). A class
//! that does not declare its own `__ctor`/`__dtor` gets one built
//! directly as an opcode list rather than parsed from source — there is
//! no function body, so C8/C9 never run for it.
//!
//! Base-class construction is the engine's responsibility (the runtime
//! invokes the base `__ctor` before the derived one when an object is
//! allocated), so the synthesized body here only covers properties this
//! class itself declares, not inherited ones.

use crate::arena::IdArena;
use crate::opcode_emitter::Opcode;
use crate::stubs::ids::{ClassId, PropertyId};
use crate::stubs::kinds::{Class, ClassMember};

fn own_properties(class: ClassId, classes: &IdArena<ClassId, Class>) -> Vec<PropertyId> {
    classes
        .get(class)
        .members
        .iter()
        .filter_map(|m| match m {
            ClassMember::Property(p) => Some(*p),
            _ => None,
        })
        .collect()
}

/// `ContextCtor` for every own property in declaration order, then `Exit`.
pub fn synthesize_ctor(class: ClassId, classes: &IdArena<ClassId, Class>) -> Vec<Opcode> {
    let mut opcodes: Vec<Opcode> = own_properties(class, classes).into_iter().map(Opcode::ContextCtor).collect();
    opcodes.push(Opcode::Exit);
    opcodes
}

/// `ContextDtor` in reverse declaration order (last-constructed member
/// tears down first), then `Exit`.
pub fn synthesize_dtor(class: ClassId, classes: &IdArena<ClassId, Class>) -> Vec<Opcode> {
    let mut props = own_properties(class, classes);
    props.reverse();
    let mut opcodes: Vec<Opcode> = props.into_iter().map(Opcode::ContextDtor).collect();
    opcodes.push(Opcode::Exit);
    opcodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stubs::ids::StubOwner;
    use crate::stubs::{ClassFlags, MemberFlags, Property};
    use crate::string_interning::StringId;

    fn dummy_location() -> crate::stubs::SourceLocation {
        let file = IdArena::<crate::stubs::ids::FileId, ()>::new().alloc(());
        crate::stubs::SourceLocation::new(file, 1, 1)
    }

    #[test]
    fn ctor_and_dtor_visit_properties_in_opposite_order() {
        let mut classes: IdArena<ClassId, Class> = IdArena::new();
        let mut properties: IdArena<PropertyId, Property> = IdArena::new();
        let loc = dummy_location();
        let module = IdArena::<crate::stubs::ids::ModuleId, ()>::new().alloc(());

        let class_id = classes.alloc(Class {
            owner: StubOwner::Module(module),
            location: loc,
            name: StringId::from_u32(0),
            flags: ClassFlags::empty(),
            base_name: None,
            base_resolved: None,
            parent_name: None,
            parent_resolved: None,
            engine_alias: None,
            members: Vec::new(),
            member_names: Vec::new(),
            derived_classes: Vec::new(),
            child_classes: Vec::new(),
        });

        let mut type_decls: IdArena<crate::stubs::ids::TypeDeclId, ()> = IdArena::new();
        let mut prop_ids = Vec::new();
        for _ in 0..3 {
            let type_decl = type_decls.alloc(());
            let prop = properties.alloc(Property {
                owner: StubOwner::Class(class_id),
                location: loc,
                name: StringId::from_u32(0),
                flags: MemberFlags::empty(),
                type_decl,
                default_value: None,
            });
            prop_ids.push(prop);
        }
        classes.get_mut(class_id).members = prop_ids.iter().map(|&p| ClassMember::Property(p)).collect();

        let ctor = synthesize_ctor(class_id, &classes);
        let dtor = synthesize_dtor(class_id, &classes);

        assert_eq!(ctor.len(), 4);
        assert_eq!(dtor.len(), 4);
        assert!(matches!(ctor[0], Opcode::ContextCtor(p) if p == prop_ids[0]));
        assert!(matches!(dtor[0], Opcode::ContextDtor(p) if p == prop_ids[2]));
        assert_eq!(ctor.last(), Some(&Opcode::Exit));
        assert_eq!(dtor.last(), Some(&Opcode::Exit));
    }
}
