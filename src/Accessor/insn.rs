// Instruction set of the host's stack machine.

use std::sync::Arc;

/// Declared shape a routine narrows its result to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A unit's probe array.
    Probes,
}

impl Shape {
    pub fn name(self) -> &'static str {
        match self {
            Shape::Probes => "probes",
        }
    }
}

/// One instruction. Operands are popped right to left: for `ArrayStore` the
/// value is on top, below it the index, below that the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insn {
    PushInt(i32),
    PushLong(i64),
    PushStr(Arc<str>),
    /// `int len` → fresh container of `len` null slots.
    NewArray,
    Dup,
    /// `long` → boxed long.
    BoxLong,
    /// `array, int index, value` → (slot written).
    ArrayStore,
    /// `array, int index` → slot value.
    ArrayLoad,
    StoreLocal(u16),
    LoadLocal(u16),
    /// → the host channel with this name.
    GetChannel(Arc<str>),
    /// `channel, string key, array params` → (delivered synchronously).
    Publish,
    /// Value → same value, fault unless it has the given shape.
    CheckCast(Shape),
    /// Value → routine result.
    Return,
}

impl Insn {
    /// Operand stack effect as `(popped, pushed)`.
    pub fn stack_effect(&self) -> (usize, usize) {
        match self {
            Insn::PushInt(_)
            | Insn::PushLong(_)
            | Insn::PushStr(_)
            | Insn::LoadLocal(_)
            | Insn::GetChannel(_) => (0, 1),
            Insn::NewArray | Insn::BoxLong | Insn::CheckCast(_) => (1, 1),
            Insn::Dup => (1, 2),
            Insn::ArrayStore | Insn::Publish => (3, 0),
            Insn::ArrayLoad => (2, 1),
            Insn::StoreLocal(_) | Insn::Return => (1, 0),
        }
    }
}
