//! C10 — walks the elaborated Function AST and produces a flat opcode
//! list, threading jump targets and inserting scope destructors (§4.9).

mod ctor_dtor;
mod emit;

use crate::stubs::ids::{ClassId, EnumId, FunctionId, PropertyId, TypeDeclId};
use crate::string_interning::StringId;
use serde::{Deserialize, Serialize};

pub use emit::{EmitError, Emitter};

/// The wire-compatible opcode catalog the emitter produces (§6.3).
/// `[SUPPLEMENT]` adds `StringIndexConst` and `DebugLine`, both
/// documented sub-cases that don't change the catalog's observable set
/// in the default configuration (SPEC_FULL.md §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Opcode {
    // Control
    Nop,
    Label(u32),
    Jump(u32),
    JumpIfFalse(u32),
    Exit,
    Breakpoint,

    // Scope
    LocalCtor { var_index: u32, type_decl: TypeDeclId },
    LocalDtor { var_index: u32, type_decl: TypeDeclId },

    // Variable access
    ParamVar(u32),
    LocalVar { var_index: u32, type_decl: TypeDeclId },
    ContextVar(PropertyId),

    // Context
    ContextFromPtr { label: u32, return_type: TypeDeclId },
    ContextFromPtrRef { label: u32, return_type: TypeDeclId },
    ContextFromRef { label: u32, return_type: TypeDeclId },
    ContextFromValue { label: u32, return_type: TypeDeclId },
    ContextCtor(PropertyId),
    ContextDtor(PropertyId),
    ThisStruct,
    ThisObject,

    // Struct access
    StructMember(PropertyId),
    StructMemberRef(PropertyId),

    // Calls
    StaticFunc { function: FunctionId, encoding: u64 },
    VirtualFunc { function: FunctionId, encoding: u64 },
    FinalFunc { function: FunctionId, encoding: u64 },

    // Constants
    IntConst1(i8),
    IntConst2(i16),
    IntConst4(i32),
    IntConst8(i64),
    UintConst1(u8),
    UintConst2(u16),
    UintConst4(u32),
    UintConst8(u64),
    IntZero,
    IntOne,
    FloatConst(f32),
    DoubleConst(f64),
    BoolTrue,
    BoolFalse,
    StringConst(StringId),
    /// `[SUPPLEMENT]` a `StringConst` specialization for name-table
    /// literals that are never inspected by value.
    StringIndexConst(StringId),
    NameConst(StringId),
    EnumConst { enum_ref: EnumId, name: StringId },
    ClassConst(ClassId),
    Null,

    // Object ops
    New(ClassId),
    Constructor { type_decl: TypeDeclId, argc: u32 },

    // Loads
    LoadInt1,
    LoadInt2,
    LoadInt4,
    LoadInt8,
    LoadUint1,
    LoadUint2,
    LoadUint4,
    LoadUint8,
    LoadFloat,
    LoadDouble,
    LoadStrongPtr,
    LoadWeakPtr,
    LoadAny(TypeDeclId),

    // Assigns
    AssignInt1,
    AssignInt2,
    AssignInt4,
    AssignInt8,
    AssignUint1,
    AssignUint2,
    AssignUint4,
    AssignUint8,
    AssignFloat,
    AssignDouble,
    AssignAny(TypeDeclId),

    // Comparisons
    TestEqual(TypeDeclId),
    TestNotEqual(TypeDeclId),

    // Casts
    WeakToStrong,
    StrongToWeak,
    DynamicCast(ClassId),
    DynamicWeakCast(ClassId),
    MetaCast(ClassId),
    EnumToInt64,
    EnumToInt32,
    Int64ToEnum,
    Int32ToEnum,
    EnumToName,
    NameToEnum,
    EnumToString,
    StrongToBool,
    WeakToBool,
    ClassToBool,
    ClassToName,
    ClassToString,
    CastToVariant(TypeDeclId),
    CastFromVariant(TypeDeclId),

    // Short-circuit
    LogicOr(u32),
    LogicAnd(u32),

    // Returns
    ReturnDirect(TypeDeclId),
    ReturnLoad1(TypeDeclId),
    ReturnLoad2(TypeDeclId),
    ReturnLoad4(TypeDeclId),
    ReturnLoad8(TypeDeclId),
    ReturnAny(TypeDeclId),

    /// `[SUPPLEMENT]` a no-op source-line marker, gated behind
    /// `Config::debug_lines` and off by default.
    DebugLine(u32),
}

impl Opcode {
    pub fn is_label(&self) -> bool {
        matches!(self, Opcode::Label(_))
    }

    /// True for the two opcodes that unconditionally end a statement
    /// list (§4.9.1 `StatementList`: "after the first child ending with
    /// `Exit` or unconditional `Jump`").
    pub fn is_unconditional_terminator(&self) -> bool {
        matches!(self, Opcode::Exit | Opcode::Jump(_))
    }
}

/// Flat, merge-friendly opcode list for one function (§9 Design Notes:
/// "a `Vec<Opcode>` with label opcodes storing their own index").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpcodeList {
    pub opcodes: Vec<Opcode>,
}

impl OpcodeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, opcode: Opcode) -> u32 {
        let index = self.opcodes.len() as u32;
        self.opcodes.push(opcode);
        index
    }

    pub fn next_index(&self) -> u32 {
        self.opcodes.len() as u32
    }

    pub fn extend(&mut self, other: OpcodeList) {
        self.opcodes.extend(other.opcodes);
    }

    /// Checks the testable invariant from §8: every `Jump`/`JumpIfFalse`
    /// target is a `Label` that appears in the same opcode list.
    pub fn jump_targets_are_valid(&self) -> bool {
        let labels: std::collections::HashSet<u32> = self
            .opcodes
            .iter()
            .filter_map(|op| match op {
                Opcode::Label(id) => Some(*id),
                _ => None,
            })
            .collect();
        self.opcodes.iter().all(|op| match op {
            Opcode::Jump(target) | Opcode::JumpIfFalse(target) => labels.contains(target),
            _ => true,
        })
    }
}

/// Bit-packed bitfield describing how each call argument is passed.
/// Packed in reverse order of argument index (argument 0 occupies the
/// LSB block) so the executor can decode by repeated shift-right (§6.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgPassingMode {
    TypedValue,
    Ref,
}

const ARG_MODE_BITS: u32 = 1;

pub fn encode_call_args(modes: &[ArgPassingMode]) -> u64 {
    let mut encoding = 0u64;
    for (i, mode) in modes.iter().enumerate() {
        let bit = match mode {
            ArgPassingMode::TypedValue => 0u64,
            ArgPassingMode::Ref => 1u64,
        };
        encoding |= bit << (i as u32 * ARG_MODE_BITS);
    }
    encoding
}

pub fn decode_call_args(mut encoding: u64, argc: usize) -> Vec<ArgPassingMode> {
    let mut modes = Vec::with_capacity(argc);
    for _ in 0..argc {
        modes.push(if encoding & 1 == 1 { ArgPassingMode::Ref } else { ArgPassingMode::TypedValue });
        encoding >>= ARG_MODE_BITS;
    }
    modes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_arg_encoding_round_trips() {
        let modes = vec![ArgPassingMode::Ref, ArgPassingMode::TypedValue, ArgPassingMode::Ref];
        let encoded = encode_call_args(&modes);
        assert_eq!(decode_call_args(encoded, modes.len()), modes);
    }

    #[test]
    fn jump_target_validity_catches_dangling_jump() {
        let mut list = OpcodeList::new();
        list.push(Opcode::Jump(99));
        assert!(!list.jump_targets_are_valid());
        list.push(Opcode::Label(99));
        assert!(list.jump_targets_are_valid());
    }
}
