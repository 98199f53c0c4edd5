//! Root set the engine hands to the collector
//!
//! The heap and the root-holding fields of [`Vm`] are separate fields, so a
//! collection can borrow the heap mutably while [`VmRoots`] borrows the rest.

use core_types::{ObjRef, Value};
use memory_manager::{Marker, Obj, RootSource, Table};

use crate::call_frame::CallFrame;
use crate::vm::Vm;

/// Borrowed view of everything the engine keeps alive.
pub struct VmRoots<'a> {
    pub(crate) stack: &'a [Value],
    pub(crate) frames: &'a [CallFrame],
    pub(crate) open_upvalues: &'a [ObjRef],
    pub(crate) globals: &'a Table,
    pub(crate) init_string: ObjRef,
}

impl RootSource for VmRoots<'_> {
    fn mark_roots(&self, marker: &mut Marker<'_>) {
        for value in self.stack {
            marker.mark_value(*value);
        }
        for frame in self.frames {
            marker.mark_object(frame.closure);
        }
        for upvalue in self.open_upvalues {
            marker.mark_object(*upvalue);
        }
        marker.mark_table(self.globals);
        marker.mark_object(self.init_string);
    }
}

/// Builds [`VmRoots`] from disjoint field borrows, leaving `self.heap` free.
macro_rules! vm_roots {
    ($vm:expr) => {
        $crate::gc_integration::VmRoots {
            stack: &$vm.stack,
            frames: &$vm.frames,
            open_upvalues: &$vm.open_upvalues,
            globals: &$vm.globals,
            init_string: $vm.init_string,
        }
    };
}
pub(crate) use vm_roots;

impl Vm {
    /// Allocate through the heap with the engine's roots.
    pub(crate) fn alloc(&mut self, obj: Obj) -> ObjRef {
        let roots = vm_roots!(self);
        self.heap.alloc(obj, &roots)
    }

    pub(crate) fn intern(&mut self, chars: &str) -> ObjRef {
        let roots = vm_roots!(self);
        self.heap.intern(chars, &roots)
    }

    /// Charge a new table entry of `owner` to the collector.
    pub(crate) fn account_growth(&mut self, owner: ObjRef, bytes: usize) {
        let roots = vm_roots!(self);
        self.heap.account_growth(owner, bytes, &roots);
    }
}
