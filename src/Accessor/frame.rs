// Interpreter for routines built with RoutineBuilder.

use super::builder::Routine;
use super::insn::{Insn, Shape};
use crate::error::Fault;
use crate::Channel::host::Host;
use crate::Channel::message::{ArrayRef, Message, Value};
use crate::Core::store::Record;

/// Execution state of one routine invocation on the calling thread.
pub struct Frame<'h> {
    host: &'h Host,
    stack: Vec<Value>,
    locals: Vec<Value>,
}

impl<'h> Frame<'h> {
    pub fn new(host: &'h Host) -> Self {
        Self {
            host,
            stack: Vec::new(),
            locals: Vec::new(),
        }
    }

    /// Execute `routine` from its first instruction.
    ///
    /// Returns the operand of `Return`, or the top of the stack when the code
    /// ends without one.
    pub fn run(&mut self, routine: &Routine) -> Result<Value, Fault> {
        self.stack.clear();
        self.stack.reserve(routine.max_stack());
        self.locals.clear();
        self.locals
            .resize(usize::from(routine.max_locals()), Value::Null);

        for insn in routine.code().iter() {
            if let Insn::Return = insn {
                return self.pop();
            }
            self.step(insn)?;
        }
        self.pop()
    }

    fn step(&mut self, insn: &Insn) -> Result<(), Fault> {
        match insn {
            Insn::PushInt(v) => self.stack.push(Value::Int(*v)),
            Insn::PushLong(v) => self.stack.push(Value::Long(*v)),
            Insn::PushStr(s) => self.stack.push(Value::Str(s.clone())),
            Insn::NewArray => {
                let len = match self.pop()? {
                    Value::Int(n) if n >= 0 => n as usize,
                    Value::Int(n) => {
                        return Err(Fault::IndexOutOfBounds {
                            index: i64::from(n),
                            len: 0,
                        })
                    }
                    other => return Err(mismatch("new_array", &other)),
                };
                self.stack.push(Value::Array(ArrayRef::new(len)));
            }
            Insn::Dup => {
                let top = self.stack.last().cloned().ok_or(Fault::StackUnderflow)?;
                self.stack.push(top);
            }
            Insn::BoxLong => match self.pop()? {
                Value::Long(v) => self.stack.push(Value::Boxed(v)),
                other => return Err(mismatch("box_long", &other)),
            },
            Insn::ArrayStore => {
                let value = self.pop()?;
                let index = self.pop_int("array_store")?;
                let array = self.pop_array("array_store")?;
                array.set(i64::from(index), value)?;
            }
            Insn::ArrayLoad => {
                let index = self.pop_int("array_load")?;
                let array = self.pop_array("array_load")?;
                self.stack.push(array.get(i64::from(index))?);
            }
            Insn::StoreLocal(slot) => {
                let value = self.pop()?;
                *self
                    .locals
                    .get_mut(usize::from(*slot))
                    .ok_or(Fault::BadLocal(*slot))? = value;
            }
            Insn::LoadLocal(slot) => {
                let value = self
                    .locals
                    .get(usize::from(*slot))
                    .cloned()
                    .ok_or(Fault::BadLocal(*slot))?;
                self.stack.push(value);
            }
            Insn::GetChannel(name) => {
                let channel = self.host.lookup(name)?;
                self.stack.push(Value::Channel(channel));
            }
            Insn::Publish => {
                let params = self.pop_array("publish")?;
                let key = match self.pop()? {
                    Value::Str(s) => s,
                    other => return Err(mismatch("publish", &other)),
                };
                let channel = match self.pop()? {
                    Value::Channel(c) => c,
                    other => return Err(mismatch("publish", &other)),
                };
                channel.publish(&Message::new(key, params))?;
            }
            Insn::CheckCast(shape) => {
                let top = self.stack.last().ok_or(Fault::StackUnderflow)?;
                if !conforms(top, *shape) {
                    return Err(Fault::UnexpectedPayload {
                        expected: shape.name(),
                        found: top.kind(),
                    });
                }
            }
            Insn::Return => {}
        }
        Ok(())
    }

    fn pop(&mut self) -> Result<Value, Fault> {
        self.stack.pop().ok_or(Fault::StackUnderflow)
    }

    fn pop_int(&mut self, op: &'static str) -> Result<i32, Fault> {
        match self.pop()? {
            Value::Int(v) => Ok(v),
            other => Err(mismatch(op, &other)),
        }
    }

    fn pop_array(&mut self, op: &'static str) -> Result<ArrayRef, Fault> {
        match self.pop()? {
            Value::Array(a) => Ok(a),
            other => Err(mismatch(op, &other)),
        }
    }
}

fn conforms(value: &Value, shape: Shape) -> bool {
    match shape {
        Shape::Probes => matches!(value, Value::Record(_)),
    }
}

fn mismatch(op: &'static str, found: &Value) -> Fault {
    Fault::TypeMismatch {
        op,
        found: found.kind(),
    }
}

impl Routine {
    /// Run this routine on `host` and return the record it yields.
    pub fn resolve(&self, host: &Host) -> Result<Record, Fault> {
        match Frame::new(host).run(self)? {
            Value::Record(record) => Ok(record),
            other => Err(Fault::UnexpectedPayload {
                expected: Shape::Probes.name(),
                found: other.kind(),
            }),
        }
    }
}
