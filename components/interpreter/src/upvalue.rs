//! Upvalue capture and closing
//!
//! A captured local starts out open, aliasing its stack slot. When the slot's
//! scope ends the value is copied into the upvalue, which from then on owns
//! it. At most one open upvalue exists per slot so that every closure sharing
//! a variable sees the same storage.

use core_types::{ObjRef, Value};
use memory_manager::{Obj, ObjUpvalue, UpvalueState};

use crate::vm::Vm;

impl Vm {
    /// The open upvalue for absolute stack `slot`, created if needed.
    pub(crate) fn capture_upvalue(&mut self, slot: usize) -> ObjRef {
        let heap = &self.heap;
        let search = self
            .open_upvalues
            .binary_search_by_key(&slot, |upvalue| open_slot(heap.as_upvalue(*upvalue)));
        match search {
            Ok(found) => self.open_upvalues[found],
            Err(position) => {
                let upvalue = self.alloc(Obj::Upvalue(ObjUpvalue::open(slot)));
                self.open_upvalues.insert(position, upvalue);
                upvalue
            }
        }
    }

    /// Close every open upvalue at or above stack slot `from`.
    pub(crate) fn close_upvalues(&mut self, from: usize) {
        while let Some(&upvalue) = self.open_upvalues.last() {
            let slot = open_slot(self.heap.as_upvalue(upvalue));
            if slot < from {
                break;
            }
            let value = self.stack[slot];
            self.heap.as_upvalue_mut(upvalue).state = UpvalueState::Closed(value);
            self.open_upvalues.pop();
        }
    }

    /// Current value of upvalue `index` of the running closure.
    pub(crate) fn read_upvalue(&self, closure: ObjRef, index: usize) -> Value {
        let upvalue = self.heap.as_closure(closure).upvalues[index];
        match self.heap.as_upvalue(upvalue).state {
            UpvalueState::Open(slot) => self.stack[slot],
            UpvalueState::Closed(value) => value,
        }
    }

    pub(crate) fn write_upvalue(&mut self, closure: ObjRef, index: usize, value: Value) {
        let upvalue = self.heap.as_closure(closure).upvalues[index];
        let upvalue = self.heap.as_upvalue_mut(upvalue);
        match upvalue.state {
            UpvalueState::Open(slot) => self.stack[slot] = value,
            UpvalueState::Closed(_) => upvalue.state = UpvalueState::Closed(value),
        }
    }
}

fn open_slot(upvalue: &ObjUpvalue) -> usize {
    match upvalue.open_slot() {
        Some(slot) => slot,
        None => panic!("closed upvalue left in the open list"),
    }
}
