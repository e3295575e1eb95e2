//! Access control (§4.3.5): whether `from` may reference `target`.
//! Classes check `private` against module identity; members additionally
//! require their owning class to be accessible, then apply `private`
//! (same class) / `protected` (same class or a derived class).

use super::name_resolution::ResolvedStub;
use super::StubLibrary;
use crate::stubs::ids::{ClassId, StubOwner};
use crate::stubs::{ClassFlags, FunctionFlags, MemberFlags};

/// Run during name resolution within function bodies (C9) and against
/// base-class references (C4, §4.3.3).
pub fn is_accessible(lib: &StubLibrary, target: ResolvedStub, from: StubOwner) -> bool {
    match target {
        ResolvedStub::Class(c) => class_accessible(lib, c, from),
        ResolvedStub::Property(p) => {
            let s = lib.properties.get(p);
            member_accessible(lib, s.owner, s.flags.contains(MemberFlags::PRIVATE), s.flags.contains(MemberFlags::PROTECTED), from)
        }
        ResolvedStub::Enum(e) => {
            let s = lib.enums.get(e);
            member_accessible(lib, s.owner, s.flags.contains(MemberFlags::PRIVATE), s.flags.contains(MemberFlags::PROTECTED), from)
        }
        ResolvedStub::Constant(c) => {
            let s = lib.constants.get(c);
            member_accessible(lib, s.owner, s.flags.contains(MemberFlags::PRIVATE), s.flags.contains(MemberFlags::PROTECTED), from)
        }
        ResolvedStub::Function(f) => {
            let s = lib.functions.get(f);
            member_accessible(lib, s.owner, s.flags.contains(FunctionFlags::PRIVATE), s.flags.contains(FunctionFlags::PROTECTED), from)
        }
        // Arguments, enum options, modules, files and module-imports
        // carry no access flags of their own (§3.1).
        _ => true,
    }
}

fn class_accessible(lib: &StubLibrary, class: ClassId, from: StubOwner) -> bool {
    if lib.classes.get(class).flags.contains(ClassFlags::PRIVATE) {
        lib.module_of_owner(StubOwner::Class(class)) == lib.module_of_owner(from)
    } else {
        true
    }
}

fn member_accessible(lib: &StubLibrary, owner: StubOwner, private: bool, protected: bool, from: StubOwner) -> bool {
    if let StubOwner::Class(owner_class) = owner {
        if !class_accessible(lib, owner_class, from) {
            return false;
        }
        let from_class = enclosing_class(lib, from);
        if private {
            return from_class == Some(owner_class);
        }
        if protected {
            return from_class == Some(owner_class)
                || from_class.map(|fc| lib.derives_from(fc, owner_class)).unwrap_or(false);
        }
        true
    } else if private {
        lib.module_of_owner(owner) == lib.module_of_owner(from)
    } else {
        true
    }
}

fn enclosing_class(lib: &StubLibrary, ctx: StubOwner) -> Option<ClassId> {
    match ctx {
        StubOwner::Class(c) => Some(c),
        StubOwner::Function(f) => enclosing_class(lib, lib.functions.get(f).owner),
        StubOwner::File(_) | StubOwner::Module(_) => None,
    }
}
