//! Call frame for function call stack management

use core_types::ObjRef;

/// Most frames the call stack may hold.
pub const FRAMES_MAX: usize = 64;

/// Value stack capacity: 256 slots per frame.
pub const STACK_MAX: usize = FRAMES_MAX * 256;

/// One active call.
///
/// Slot `base` of the value stack holds the callee (or the receiver for
/// methods); arguments and locals follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallFrame {
    /// Closure being executed
    pub closure: ObjRef,
    /// Its function, cached to skip one lookup per instruction
    pub function: ObjRef,
    /// Offset of the next instruction in the function's chunk
    pub ip: usize,
    /// First stack slot of this frame's window
    pub base: usize,
}

impl CallFrame {
    /// Create a frame positioned at the start of `function`
    pub fn new(closure: ObjRef, function: ObjRef, base: usize) -> Self {
        Self {
            closure,
            function,
            ip: 0,
            base,
        }
    }
}
