//! Constructor/destructor synthesis (§4.3.8). Classes that don't declare
//! their own `__ctor`/`__dtor` get one synthesized directly as an opcode
//! list (C10's `ctor_dtor` helpers), skipping C8/C9 entirely for that
//! function.

use super::StubLibrary;
use crate::opcode_emitter::ctor_dtor;
use crate::stubs::ids::{ClassId, StubOwner};
use crate::stubs::kinds::ClassMember;
use crate::stubs::{ClassFlags, FunctionFlags};

impl StubLibrary {
    pub fn synthesize_ctors_and_dtors(&mut self) {
        let ids: Vec<ClassId> = self.classes.ids().collect();
        for id in ids {
            if self.classes.get(id).flags.contains(ClassFlags::IMPORT) {
                continue;
            }
            self.synthesize_one(id, "__ctor", FunctionFlags::CONSTRUCTOR);
            self.synthesize_one(id, "__dtor", FunctionFlags::DESTRUCTOR);
        }
    }

    fn synthesize_one(&mut self, class: ClassId, name: &str, flag: FunctionFlags) {
        let interned = self.strings.intern(name);
        if self.has_member_named(class, interned) {
            return;
        }
        let location = self.classes.get(class).location;
        let func = self.create_function(StubOwner::Class(class), location, interned, flag, None);
        let opcodes = if flag.contains(FunctionFlags::CONSTRUCTOR) {
            ctor_dtor::synthesize_ctor(class, &self.classes)
        } else {
            ctor_dtor::synthesize_dtor(class, &self.classes)
        };
        self.functions.get_mut(func).opcodes = opcodes;
    }

    fn has_member_named(&self, class: ClassId, name: crate::string_interning::StringId) -> bool {
        self.classes.get(class).member_names.iter().any(|(n, m)| *n == name && matches!(m, ClassMember::Function(_)))
    }
}
