//! Tri-color mark-sweep collection.
//!
//! Marking starts from a [`RootSource`], which greys every directly
//! reachable object. The heap then repeatedly pops a grey object, blackens
//! it and greys everything it references. Whatever is still white afterwards
//! is unreachable and gets swept.
//!
//! The collector never scans the host's call stack. Anything the host holds
//! outside the heap must be reported through [`RootSource::mark_roots`] or it
//! may be freed by the next allocation.

use bytecode_system::Chunk;
use core_types::{ObjRef, Value};

use crate::object::{Obj, Table, UpvalueState};

/// Mark colors for tri-color marking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MarkColor {
    /// Unmarked (not yet visited)
    White = 0,
    /// In process (reachable, needs scanning)
    Gray = 1,
    /// Fully processed (reachable, all references scanned)
    Black = 2,
}

/// Collector tuning.
///
/// # Examples
///
/// ```
/// use memory_manager::GcConfig;
///
/// let config = GcConfig::default().with_stress(true).with_grow_factor(4);
/// assert!(config.stress);
/// assert_eq!(config.grow_factor, 4);
/// assert_eq!(config.initial_threshold, 1024 * 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GcConfig {
    /// Collect on every allocation that grows the heap
    pub stress: bool,
    /// Next threshold is live bytes times this factor
    pub grow_factor: usize,
    /// Threshold before the first collection, and the floor afterwards
    pub initial_threshold: usize,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            stress: false,
            grow_factor: 2,
            initial_threshold: 1024 * 1024,
        }
    }
}

impl GcConfig {
    /// Enable or disable stress mode
    pub fn with_stress(mut self, stress: bool) -> Self {
        self.stress = stress;
        self
    }

    /// Set the heap growth factor (at least 1)
    pub fn with_grow_factor(mut self, factor: usize) -> Self {
        self.grow_factor = factor.max(1);
        self
    }

    /// Set the first collection threshold in bytes
    pub fn with_initial_threshold(mut self, bytes: usize) -> Self {
        self.initial_threshold = bytes;
        self
    }
}

/// Greys objects during the mark phase.
pub struct Marker<'a> {
    marks: &'a mut [MarkColor],
    gray: &'a mut Vec<ObjRef>,
}

impl<'a> Marker<'a> {
    pub(crate) fn new(marks: &'a mut [MarkColor], gray: &'a mut Vec<ObjRef>) -> Self {
        Self { marks, gray }
    }

    /// Grey `obj` unless it was already reached.
    pub fn mark_object(&mut self, obj: ObjRef) {
        let Some(color) = self.marks.get_mut(obj.index()) else {
            return;
        };
        if *color != MarkColor::White {
            return;
        }
        *color = MarkColor::Gray;
        self.gray.push(obj);
        tracing::trace!(target: "gc", object = %obj, "mark");
    }

    /// Grey the object `value` references, if any.
    pub fn mark_value(&mut self, value: Value) {
        if let Value::Obj(obj) = value {
            self.mark_object(obj);
        }
    }

    /// Grey every key and value of `table`.
    pub fn mark_table(&mut self, table: &Table) {
        for (key, value) in table {
            self.mark_object(*key);
            self.mark_value(*value);
        }
    }
}

/// Something holding heap references that must be greyed when reached.
pub trait Trace {
    /// Report every outgoing reference to `marker`.
    fn trace(&self, marker: &mut Marker<'_>);
}

impl Trace for Value {
    fn trace(&self, marker: &mut Marker<'_>) {
        marker.mark_value(*self);
    }
}

impl Trace for Table {
    fn trace(&self, marker: &mut Marker<'_>) {
        marker.mark_table(self);
    }
}

impl Trace for Chunk {
    fn trace(&self, marker: &mut Marker<'_>) {
        for constant in self.constants() {
            marker.mark_value(*constant);
        }
    }
}

impl Trace for Obj {
    fn trace(&self, marker: &mut Marker<'_>) {
        match self {
            Obj::String(_) | Obj::Native(_) => {}
            Obj::Function(function) => {
                if let Some(name) = function.name {
                    marker.mark_object(name);
                }
                function.chunk.trace(marker);
            }
            Obj::Closure(closure) => {
                marker.mark_object(closure.function);
                for upvalue in &closure.upvalues {
                    marker.mark_object(*upvalue);
                }
            }
            Obj::Upvalue(upvalue) => {
                // An open upvalue's slot is reached through the stack.
                if let UpvalueState::Closed(value) = upvalue.state {
                    marker.mark_value(value);
                }
            }
            Obj::Class(class) => {
                marker.mark_object(class.name);
                class.methods.trace(marker);
            }
            Obj::Instance(instance) => {
                marker.mark_object(instance.class);
                instance.fields.trace(marker);
            }
            Obj::BoundMethod(bound) => {
                marker.mark_value(bound.receiver);
                marker.mark_object(bound.method);
            }
        }
    }
}

/// The root set handed to a collection.
///
/// Implemented by the VM (stack, frames, globals, open upvalues) and by the
/// compiler for functions it is still building.
pub trait RootSource {
    /// Grey every directly reachable object.
    fn mark_roots(&self, marker: &mut Marker<'_>);
}

/// An empty root set.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRoots;

impl RootSource for NoRoots {
    fn mark_roots(&self, _marker: &mut Marker<'_>) {}
}

impl RootSource for Vec<Value> {
    fn mark_roots(&self, marker: &mut Marker<'_>) {
        for value in self {
            marker.mark_value(*value);
        }
    }
}

impl<R: RootSource + ?Sized> RootSource for &R {
    fn mark_roots(&self, marker: &mut Marker<'_>) {
        (**self).mark_roots(marker);
    }
}
