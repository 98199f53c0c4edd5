//! Object arena with byte accounting.
//!
//! Objects live in slots addressed by [`ObjRef`]; freed slots are recycled
//! through a free list. Every allocation passes through [`Heap::alloc`] (or
//! [`Heap::intern`] for strings), which charges the object's size to a
//! running counter and runs a full collection first when the counter crosses
//! the threshold or stress mode is on.
//!
//! A collection triggered by an allocation runs before the new object is
//! stored. The references held by that pending object are marked along with
//! the roots, so a caller only has to keep alive what it still holds
//! elsewhere.

use bytecode_system::ConstantResolver;
use core_types::{ObjRef, Value};

use crate::gc::{GcConfig, MarkColor, Marker, RootSource, Trace};
use crate::interner::{fnv1a, Interner};
use crate::object::{
    Obj, ObjBoundMethod, ObjClass, ObjClosure, ObjFunction, ObjInstance, ObjNative, ObjString,
    ObjType, ObjUpvalue,
};

/// Collector statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GcStats {
    /// Collections run so far
    pub collections: usize,
    /// Objects freed over all collections
    pub objects_freed: usize,
    /// Bytes freed over all collections
    pub bytes_freed: usize,
    /// Bytes currently charged to live objects
    pub bytes_allocated: usize,
    /// Counter value that triggers the next collection
    pub next_gc: usize,
    /// Objects currently stored
    pub live_objects: usize,
}

#[derive(Debug)]
struct HeapSlot {
    obj: Obj,
    size: usize,
}

/// The garbage-collected object heap.
///
/// # Examples
///
/// ```
/// use memory_manager::{Heap, NoRoots};
///
/// let mut heap = Heap::new();
/// let a = heap.intern("hello", &NoRoots);
/// let b = heap.intern("hello", &NoRoots);
/// assert_eq!(a, b);
///
/// heap.collect(&NoRoots);
/// assert!(!heap.is_live(a));
/// ```
#[derive(Debug)]
pub struct Heap {
    slots: Vec<Option<HeapSlot>>,
    marks: Vec<MarkColor>,
    free: Vec<u32>,
    gray: Vec<ObjRef>,
    strings: Interner,
    bytes_allocated: usize,
    next_gc: usize,
    config: GcConfig,
    collections: usize,
    objects_freed: usize,
    bytes_freed: usize,
    live_objects: usize,
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! typed_accessors {
    ($($variant:ident => $ty:ty, $get:ident, $get_mut:ident;)*) => {$(
        #[doc = concat!("Borrow `obj` as [`", stringify!($ty), "`].\n\n# Panics\n\nPanics if `obj` is not a live ", stringify!($ty), ".")]
        pub fn $get(&self, obj: ObjRef) -> &$ty {
            match self.get(obj) {
                Obj::$variant(inner) => inner,
                other => panic!(
                    "object {} is {:?}, expected {}",
                    obj,
                    other.obj_type(),
                    stringify!($variant)
                ),
            }
        }

        #[doc = concat!("Mutably borrow `obj` as [`", stringify!($ty), "`].\n\n# Panics\n\nPanics if `obj` is not a live ", stringify!($ty), ".")]
        pub fn $get_mut(&mut self, obj: ObjRef) -> &mut $ty {
            match self.get_mut(obj) {
                Obj::$variant(inner) => inner,
                other => panic!(
                    "object {} is {:?}, expected {}",
                    obj,
                    other.obj_type(),
                    stringify!($variant)
                ),
            }
        }
    )*};
}

impl Heap {
    /// Creates a heap with the default [`GcConfig`].
    pub fn new() -> Self {
        Self::with_config(GcConfig::default())
    }

    /// Creates a heap with the given collector tuning.
    pub fn with_config(config: GcConfig) -> Self {
        Self {
            slots: Vec::new(),
            marks: Vec::new(),
            free: Vec::new(),
            gray: Vec::new(),
            strings: Interner::new(),
            bytes_allocated: 0,
            next_gc: config.initial_threshold,
            config,
            collections: 0,
            objects_freed: 0,
            bytes_freed: 0,
            live_objects: 0,
        }
    }

    /// Current collector tuning.
    pub fn config(&self) -> GcConfig {
        self.config
    }

    /// Turn stress mode on or off.
    pub fn set_stress(&mut self, stress: bool) {
        self.config.stress = stress;
    }

    /// Store a new non-string object, collecting first if the byte counter
    /// says so.
    ///
    /// Strings must go through [`Heap::intern`].
    pub fn alloc(&mut self, obj: Obj, roots: &dyn RootSource) -> ObjRef {
        debug_assert!(
            !matches!(obj, Obj::String(_)),
            "strings are only created by interning"
        );
        self.store(obj, roots)
    }

    /// Return the canonical string for `chars`, allocating it on first use.
    pub fn intern(&mut self, chars: &str, roots: &dyn RootSource) -> ObjRef {
        let hash = fnv1a(chars.as_bytes());
        if let Some(existing) = self.find_interned(hash, chars) {
            return existing;
        }
        let string = self.store(Obj::String(ObjString::new(chars, hash)), roots);
        self.strings.insert(hash, string);
        string
    }

    /// The canonical string for `chars`, if it has been interned and is
    /// still alive.
    pub fn interned(&self, chars: &str) -> Option<ObjRef> {
        self.find_interned(fnv1a(chars.as_bytes()), chars)
    }

    fn find_interned(&self, hash: u32, chars: &str) -> Option<ObjRef> {
        let slots = &self.slots;
        self.strings.find(hash, chars, |candidate| {
            match slots.get(candidate.index()).and_then(Option::as_ref) {
                Some(HeapSlot {
                    obj: Obj::String(string),
                    ..
                }) => Some(string.as_str()),
                _ => None,
            }
        })
    }

    /// Charge `bytes` of growth of `owner` (a new field or method) to the
    /// counter, collecting if the threshold is crossed.
    pub fn account_growth(&mut self, owner: ObjRef, bytes: usize, roots: &dyn RootSource) {
        if let Some(slot) = self.slots.get_mut(owner.index()).and_then(Option::as_mut) {
            slot.size += bytes;
        }
        self.bytes_allocated += bytes;
        if self.should_collect() {
            self.collect(roots);
        }
    }

    fn should_collect(&self) -> bool {
        self.config.stress || self.bytes_allocated > self.next_gc
    }

    fn store(&mut self, obj: Obj, roots: &dyn RootSource) -> ObjRef {
        let size = obj.size_hint();
        self.bytes_allocated += size;
        if self.should_collect() {
            self.collect_with(roots, Some(&obj));
        }

        let kind = obj.obj_type();
        let slot = HeapSlot { obj, size };
        let obj = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize] = Some(slot);
                ObjRef::from_index(index)
            }
            None => {
                let index = u32::try_from(self.slots.len())
                    .unwrap_or_else(|_| panic!("heap exhausted: more than {} objects", u32::MAX));
                self.slots.push(Some(slot));
                self.marks.push(MarkColor::White);
                ObjRef::from_index(index)
            }
        };
        self.live_objects += 1;
        tracing::trace!(target: "gc", object = %obj, ?kind, size, "allocate");
        obj
    }

    /// Run a full mark-sweep collection from `roots`.
    pub fn collect(&mut self, roots: &dyn RootSource) {
        self.collect_with(roots, None);
    }

    fn collect_with(&mut self, roots: &dyn RootSource, pending: Option<&Obj>) {
        let before = self.bytes_allocated;
        tracing::debug!(target: "gc", bytes = before, "collection begin");

        {
            let mut marker = Marker::new(&mut self.marks, &mut self.gray);
            roots.mark_roots(&mut marker);
            if let Some(obj) = pending {
                obj.trace(&mut marker);
            }
        }
        self.trace_references();

        let marks = &self.marks;
        self.strings
            .retain(|string| marks[string.index()] != MarkColor::White);

        let (objects, bytes) = self.sweep();
        self.next_gc = self
            .bytes_allocated
            .saturating_mul(self.config.grow_factor)
            .max(self.config.initial_threshold);
        self.collections += 1;
        self.objects_freed += objects;
        self.bytes_freed += bytes;

        tracing::debug!(
            target: "gc",
            before,
            after = self.bytes_allocated,
            freed_bytes = bytes,
            freed_objects = objects,
            next_gc = self.next_gc,
            "collection end"
        );
    }

    fn trace_references(&mut self) {
        while let Some(obj) = self.gray.pop() {
            self.marks[obj.index()] = MarkColor::Black;
            tracing::trace!(target: "gc", object = %obj, "blacken");
            if let Some(slot) = self.slots.get(obj.index()).and_then(Option::as_ref) {
                let mut marker = Marker::new(&mut self.marks, &mut self.gray);
                slot.obj.trace(&mut marker);
            }
        }
    }

    fn sweep(&mut self) -> (usize, usize) {
        let mut objects = 0;
        let mut bytes = 0;
        for (index, (slot, mark)) in self.slots.iter_mut().zip(self.marks.iter_mut()).enumerate() {
            if *mark != MarkColor::White {
                *mark = MarkColor::White;
                continue;
            }
            if let Some(freed) = slot.take() {
                tracing::trace!(target: "gc", object = index, kind = ?freed.obj.obj_type(), "free");
                objects += 1;
                bytes += freed.size;
                self.free.push(index as u32);
            }
        }
        self.bytes_allocated = self.bytes_allocated.saturating_sub(bytes);
        self.live_objects -= objects;
        (objects, bytes)
    }

    /// True if `obj` names a stored object.
    pub fn is_live(&self, obj: ObjRef) -> bool {
        self.try_get(obj).is_some()
    }

    /// Mark color of `obj`; White for every object outside a collection.
    pub fn mark_color(&self, obj: ObjRef) -> Option<MarkColor> {
        self.is_live(obj).then(|| self.marks[obj.index()])
    }

    /// Collector statistics.
    pub fn stats(&self) -> GcStats {
        GcStats {
            collections: self.collections,
            objects_freed: self.objects_freed,
            bytes_freed: self.bytes_freed,
            bytes_allocated: self.bytes_allocated,
            next_gc: self.next_gc,
            live_objects: self.live_objects,
        }
    }

    /// Bytes currently charged to live objects.
    pub fn bytes_allocated(&self) -> usize {
        self.bytes_allocated
    }

    /// Number of stored objects.
    pub fn object_count(&self) -> usize {
        self.live_objects
    }

    /// Number of interned strings.
    pub fn interned_count(&self) -> usize {
        self.strings.len()
    }

    /// Borrow an object, or None if the handle is dangling.
    pub fn try_get(&self, obj: ObjRef) -> Option<&Obj> {
        self.slots
            .get(obj.index())
            .and_then(Option::as_ref)
            .map(|slot| &slot.obj)
    }

    /// Borrow an object.
    ///
    /// # Panics
    ///
    /// Panics if `obj` does not name a stored object.
    pub fn get(&self, obj: ObjRef) -> &Obj {
        self.try_get(obj)
            .unwrap_or_else(|| panic!("dangling object handle {}", obj))
    }

    /// Mutably borrow an object.
    ///
    /// # Panics
    ///
    /// Panics if `obj` does not name a stored object.
    pub fn get_mut(&mut self, obj: ObjRef) -> &mut Obj {
        self.slots
            .get_mut(obj.index())
            .and_then(Option::as_mut)
            .map(|slot| &mut slot.obj)
            .unwrap_or_else(|| panic!("dangling object handle {}", obj))
    }

    /// Kind of the object `value` refers to, if it is an object.
    pub fn obj_type(&self, value: Value) -> Option<ObjType> {
        match value {
            Value::Obj(obj) => self.try_get(obj).map(Obj::obj_type),
            _ => None,
        }
    }

    /// True if `value` is an object of kind `kind`.
    pub fn is_obj_type(&self, value: Value, kind: ObjType) -> bool {
        self.obj_type(value) == Some(kind)
    }

    /// Contents of `value` if it is a string.
    pub fn string_value(&self, value: Value) -> Option<&str> {
        match value {
            Value::Obj(obj) => match self.try_get(obj)? {
                Obj::String(string) => Some(string.as_str()),
                _ => None,
            },
            _ => None,
        }
    }

    /// Contents of the string `obj`.
    ///
    /// # Panics
    ///
    /// Panics if `obj` is not a live string.
    pub fn as_str(&self, obj: ObjRef) -> &str {
        self.as_string(obj).as_str()
    }

    typed_accessors! {
        String => ObjString, as_string, as_string_mut;
        Function => ObjFunction, as_function, as_function_mut;
        Closure => ObjClosure, as_closure, as_closure_mut;
        Upvalue => ObjUpvalue, as_upvalue, as_upvalue_mut;
        Native => ObjNative, as_native, as_native_mut;
        Class => ObjClass, as_class, as_class_mut;
        Instance => ObjInstance, as_instance, as_instance_mut;
        BoundMethod => ObjBoundMethod, as_bound_method, as_bound_method_mut;
    }

    /// Printable form of a value, as `print` shows it.
    pub fn render(&self, value: Value) -> String {
        match value {
            Value::Obj(obj) => self.render_object(obj),
            other => other.to_string(),
        }
    }

    fn render_object(&self, obj: ObjRef) -> String {
        match self.get(obj) {
            Obj::String(string) => string.as_str().to_string(),
            Obj::Function(function) => self.render_function(function),
            Obj::Closure(closure) => self.render_function(self.as_function(closure.function)),
            Obj::Upvalue(_) => "upvalue".to_string(),
            Obj::Native(_) => "<native fn>".to_string(),
            Obj::Class(class) => self.as_str(class.name).to_string(),
            Obj::Instance(instance) => {
                let class = self.as_class(instance.class);
                format!("{} instance", self.as_str(class.name))
            }
            Obj::BoundMethod(bound) => self.render_object(bound.method),
        }
    }

    fn render_function(&self, function: &ObjFunction) -> String {
        match function.name {
            Some(name) => format!("<fn {}>", self.as_str(name)),
            None => "<script>".to_string(),
        }
    }
}

impl ConstantResolver for Heap {
    fn upvalue_count(&self, constant: Value) -> usize {
        match constant {
            Value::Obj(obj) => match self.try_get(obj) {
                Some(Obj::Function(function)) => function.upvalue_count,
                _ => 0,
            },
            _ => 0,
        }
    }

    fn describe(&self, constant: Value) -> String {
        match constant {
            Value::Obj(obj) if !self.is_live(obj) => format!("<freed {}>", obj),
            other => self.render(other),
        }
    }
}
