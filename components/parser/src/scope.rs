//! Per-function compile state: locals, upvalues and block depth.

use core_types::ObjRef;
use memory_manager::{Marker, ObjFunction, Trace};

/// Most locals (and most upvalues) one function may have.
pub const MAX_LOCALS: usize = 256;

/// What kind of body is being compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// Top-level script
    Script,
    /// `fun` declaration
    Function,
    /// Class method
    Method,
    /// The `init` method of a class
    Initializer,
}

/// A local variable slot.
#[derive(Debug, Clone, Copy)]
pub struct Local<'src> {
    /// Variable name
    pub name: &'src str,
    /// Block depth, None while the initializer is being compiled
    pub depth: Option<usize>,
    /// True once a closure captures this slot
    pub is_captured: bool,
}

/// A captured variable of the function being compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpvalueRef {
    /// Slot (if local) or upvalue index in the enclosing function
    pub index: u8,
    /// True if it captures an enclosing local directly
    pub is_local: bool,
}

/// Compile state of one function body.
pub struct FunctionScope<'src> {
    /// The function being filled in; moved to the heap when finished
    pub function: ObjFunction,
    /// Kind of body
    pub kind: FunctionKind,
    /// Local slots, slot zero reserved
    pub locals: Vec<Local<'src>>,
    /// Captured variables
    pub upvalues: Vec<UpvalueRef>,
    /// Current block nesting
    pub scope_depth: usize,
}

impl<'src> FunctionScope<'src> {
    /// State for a new body. Slot zero holds `this` in methods and the
    /// callee otherwise.
    pub fn new(kind: FunctionKind, name: Option<ObjRef>) -> Self {
        let slot_zero = match kind {
            FunctionKind::Method | FunctionKind::Initializer => "this",
            FunctionKind::Script | FunctionKind::Function => "",
        };
        let mut locals = Vec::with_capacity(MAX_LOCALS);
        locals.push(Local {
            name: slot_zero,
            depth: Some(0),
            is_captured: false,
        });
        Self {
            function: ObjFunction {
                name,
                ..ObjFunction::new()
            },
            kind,
            locals,
            upvalues: Vec::new(),
            scope_depth: 0,
        }
    }

    /// Slot of the innermost local called `name`.
    pub fn resolve_local(&self, name: &str) -> Result<Option<u8>, &'static str> {
        for (slot, local) in self.locals.iter().enumerate().rev() {
            if local.name == name {
                if local.depth.is_none() {
                    return Err("Can't read local variable in its own initializer.");
                }
                return Ok(Some(slot as u8));
            }
        }
        Ok(None)
    }

    /// Index of the upvalue capturing (`index`, `is_local`), adding it if new.
    pub fn add_upvalue(&mut self, index: u8, is_local: bool) -> Result<u8, &'static str> {
        let wanted = UpvalueRef { index, is_local };
        if let Some(existing) = self.upvalues.iter().position(|u| *u == wanted) {
            return Ok(existing as u8);
        }
        if self.upvalues.len() == MAX_LOCALS {
            return Err("Too many closure variables in function.");
        }
        self.upvalues.push(wanted);
        self.function.upvalue_count = self.upvalues.len();
        Ok((self.upvalues.len() - 1) as u8)
    }
}

impl Trace for FunctionScope<'_> {
    fn trace(&self, marker: &mut Marker<'_>) {
        if let Some(name) = self.function.name {
            marker.mark_object(name);
        }
        self.function.chunk.trace(marker);
    }
}

/// Resolve `name` as an upvalue of the innermost function in `functions`,
/// threading the capture through every intermediate function.
pub fn resolve_upvalue(
    functions: &mut [FunctionScope<'_>],
    name: &str,
) -> Result<Option<u8>, &'static str> {
    let Some((current, enclosing)) = functions.split_last_mut() else {
        return Ok(None);
    };
    let Some(parent) = enclosing.last_mut() else {
        return Ok(None);
    };

    if let Some(slot) = parent.resolve_local(name)? {
        parent.locals[slot as usize].is_captured = true;
        return current.add_upvalue(slot, true).map(Some);
    }

    match resolve_upvalue(enclosing, name)? {
        Some(index) => current.add_upvalue(index, false).map(Some),
        None => Ok(None),
    }
}

/// Per-class compile state.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassScope {
    /// True after `< Superclass`
    pub has_superclass: bool,
}
