//! Flag sets for the stub kinds that carry one (§3.1). Each kind gets its
//! own `bitflags` type rather than one shared mask, since the bit
//! vocabulary genuinely differs between a class, a function, and an
//! argument.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    pub struct ClassFlags: u16 {
        /// Value-type: no base class, no pointers to it, passed by value.
        const STRUCT    = 1 << 0;
        const PRIVATE   = 1 << 1;
        const PROTECTED = 1 << 2;
        /// Set on every stub cloned in by import merging (§4.3.9).
        const IMPORT    = 1 << 3;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    pub struct FunctionFlags: u32 {
        const STATIC       = 1 << 0;
        const FINAL         = 1 << 1;
        const OVERRIDE       = 1 << 2;
        const OPERATOR       = 1 << 3;
        const CAST           = 1 << 4;
        const SIGNAL         = 1 << 5;
        const CONSTRUCTOR    = 1 << 6;
        const DESTRUCTOR     = 1 << 7;
        const IMPORT         = 1 << 8;
        /// The function has a native `opcodeName` alias and compiles to a
        /// single opcode rather than a call (§4.9.1).
        const OPCODE_ALIAS   = 1 << 9;
        const PRIVATE        = 1 << 10;
        const PROTECTED      = 1 << 11;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    pub struct ArgFlags: u8 {
        const REF      = 1 << 0;
        const OUT      = 1 << 1;
        const EXPLICIT = 1 << 2;
    }
}

bitflags! {
    /// Shared by `Property`, `Enum`, and `Constant` — the smaller stub
    /// kinds that only need access control plus the import marker.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    pub struct MemberFlags: u8 {
        const PRIVATE   = 1 << 0;
        const PROTECTED = 1 << 1;
        const IMPORT    = 1 << 2;
    }
}

impl Default for ClassFlags {
    fn default() -> Self {
        ClassFlags::empty()
    }
}

impl Default for FunctionFlags {
    fn default() -> Self {
        FunctionFlags::empty()
    }
}

impl Default for ArgFlags {
    fn default() -> Self {
        ArgFlags::empty()
    }
}

impl Default for MemberFlags {
    fn default() -> Self {
        MemberFlags::empty()
    }
}
