// Routine builder: appends instructions and tracks operand stack depth and
// local slots so callers can size frames without re-scanning the code.

use super::insn::{Insn, Shape};
use std::sync::Arc;

/// A finished, immutable instruction sequence.
#[derive(Debug, Clone)]
pub struct Routine {
    pub(crate) code: Arc<[Insn]>,
    pub(crate) max_stack: usize,
    pub(crate) max_locals: u16,
}

impl Routine {
    pub fn code(&self) -> &[Insn] {
        &self.code
    }

    pub fn max_stack(&self) -> usize {
        self.max_stack
    }

    pub fn max_locals(&self) -> u16 {
        self.max_locals
    }
}

/// Marks the start of a span whose peak stack usage a caller wants to know.
///
/// Spans nest: the mark remembers the peak of whatever span was already
/// open so [`close_span`](RoutineBuilder::close_span) can hand it back.
#[derive(Debug, Clone, Copy)]
pub struct SpanMark {
    base: usize,
    saved_peak: usize,
}

#[derive(Debug, Default)]
pub struct RoutineBuilder {
    code: Vec<Insn>,
    depth: usize,
    max_stack: usize,
    span_peak: usize,
    locals: u16,
}

impl RoutineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current operand stack depth at the end of the emitted code.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn max_stack(&self) -> usize {
        self.max_stack
    }

    pub fn max_locals(&self) -> u16 {
        self.locals
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Start measuring. [`span_peak`](Self::span_peak) later reports the
    /// highest depth reached above the current depth.
    pub fn open_span(&mut self) -> SpanMark {
        let mark = SpanMark {
            base: self.depth,
            saved_peak: self.span_peak,
        };
        self.span_peak = self.depth;
        mark
    }

    pub fn span_peak(&self, mark: SpanMark) -> usize {
        self.span_peak.saturating_sub(mark.base)
    }

    /// End the span opened by `mark` and return its peak. Any enclosing
    /// span keeps the higher of its own peak and this one.
    pub fn close_span(&mut self, mark: SpanMark) -> usize {
        let peak = self.span_peak(mark);
        self.span_peak = self.span_peak.max(mark.saved_peak);
        peak
    }

    pub fn emit(&mut self, insn: Insn) -> &mut Self {
        let (pops, pushes) = insn.stack_effect();
        debug_assert!(
            pops <= self.depth,
            "{insn:?} pops {pops} with only {} on the stack",
            self.depth
        );
        self.depth = self.depth.saturating_sub(pops) + pushes;
        self.max_stack = self.max_stack.max(self.depth);
        self.span_peak = self.span_peak.max(self.depth);
        self.code.push(insn);
        self
    }

    /// Allocate a fresh local slot.
    pub fn new_local(&mut self) -> u16 {
        let slot = self.locals;
        self.locals += 1;
        slot
    }

    pub fn push_int(&mut self, v: i32) -> &mut Self {
        self.emit(Insn::PushInt(v))
    }

    pub fn push_long(&mut self, v: i64) -> &mut Self {
        self.emit(Insn::PushLong(v))
    }

    pub fn push_str(&mut self, s: &str) -> &mut Self {
        self.emit(Insn::PushStr(Arc::from(s)))
    }

    pub fn new_array(&mut self) -> &mut Self {
        self.emit(Insn::NewArray)
    }

    pub fn dup(&mut self) -> &mut Self {
        self.emit(Insn::Dup)
    }

    pub fn box_long(&mut self) -> &mut Self {
        self.emit(Insn::BoxLong)
    }

    pub fn array_store(&mut self) -> &mut Self {
        self.emit(Insn::ArrayStore)
    }

    pub fn array_load(&mut self) -> &mut Self {
        self.emit(Insn::ArrayLoad)
    }

    pub fn store_local(&mut self, slot: u16) -> &mut Self {
        self.emit(Insn::StoreLocal(slot))
    }

    pub fn load_local(&mut self, slot: u16) -> &mut Self {
        self.emit(Insn::LoadLocal(slot))
    }

    pub fn get_channel(&mut self, name: &str) -> &mut Self {
        self.emit(Insn::GetChannel(Arc::from(name)))
    }

    pub fn publish(&mut self) -> &mut Self {
        self.emit(Insn::Publish)
    }

    pub fn check_cast(&mut self, shape: Shape) -> &mut Self {
        self.emit(Insn::CheckCast(shape))
    }

    pub fn ret(&mut self) -> &mut Self {
        self.emit(Insn::Return)
    }

    pub fn finish(self) -> Routine {
        Routine {
            code: self.code.into(),
            max_stack: self.max_stack,
            max_locals: self.locals,
        }
    }
}
