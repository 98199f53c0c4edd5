//! NaN-boxed value encoding.
//!
//! [`PackedValue`] squeezes a [`Value`] into a single 64-bit word:
//!
//! - Any double whose bits fall outside the reserved quiet-NaN family is
//!   stored verbatim.
//! - `nil`, `false` and `true` are small tags inside the reserved family.
//! - Object handles set the sign bit on top of the reserved family and keep
//!   the slot number in the low 48 bits.
//!
//! Doubles that happen to land inside the reserved family are canonicalised
//! to the standard quiet NaN when packed, so they stay numbers on the way
//! back out. This is a purely internal encoding; [`Value`] stays the public
//! currency of the engine.

use crate::value::{ObjRef, Value};

const SIGN_BIT: u64 = 0x8000_0000_0000_0000;
const QNAN: u64 = 0x7ffc_0000_0000_0000;
const PAYLOAD_MASK: u64 = 0x0000_ffff_ffff_ffff;

const TAG_NIL: u64 = 1;
const TAG_FALSE: u64 = 2;
const TAG_TRUE: u64 = 3;

/// A [`Value`] encoded into one machine word.
///
/// # Examples
///
/// ```
/// use core_types::{PackedValue, Value};
///
/// let packed = PackedValue::pack(Value::Number(-1.25));
/// assert_eq!(packed.unpack(), Value::Number(-1.25));
///
/// let nil = PackedValue::pack(Value::Nil);
/// assert_eq!(nil, PackedValue::NIL);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PackedValue(u64);

impl PackedValue {
    /// Packed `nil`.
    pub const NIL: PackedValue = PackedValue(QNAN | TAG_NIL);
    /// Packed `false`.
    pub const FALSE: PackedValue = PackedValue(QNAN | TAG_FALSE);
    /// Packed `true`.
    pub const TRUE: PackedValue = PackedValue(QNAN | TAG_TRUE);

    /// Encodes a value.
    pub fn pack(value: Value) -> Self {
        match value {
            Value::Nil => Self::NIL,
            Value::Bool(true) => Self::TRUE,
            Value::Bool(false) => Self::FALSE,
            Value::Number(n) => {
                let bits = n.to_bits();
                if bits & QNAN == QNAN {
                    PackedValue(f64::NAN.to_bits())
                } else {
                    PackedValue(bits)
                }
            }
            Value::Obj(r) => PackedValue(SIGN_BIT | QNAN | (u64::from(r.raw()) & PAYLOAD_MASK)),
        }
    }

    /// Decodes the word back into a value.
    pub fn unpack(self) -> Value {
        let bits = self.0;
        if bits & QNAN != QNAN {
            return Value::Number(f64::from_bits(bits));
        }
        if bits & (SIGN_BIT | QNAN) == SIGN_BIT | QNAN {
            // Handles are 32-bit slot numbers, so the payload always fits.
            return Value::Obj(ObjRef::from_index((bits & PAYLOAD_MASK) as u32));
        }
        match bits & !QNAN {
            TAG_FALSE => Value::Bool(false),
            TAG_TRUE => Value::Bool(true),
            _ => Value::Nil,
        }
    }

    /// Returns the raw encoded word.
    pub fn to_bits(self) -> u64 {
        self.0
    }

    /// Reinterprets a raw word, rejecting reserved patterns that no value
    /// encodes to.
    pub fn try_from_bits(bits: u64) -> Option<Self> {
        if bits & QNAN != QNAN {
            return Some(PackedValue(bits));
        }
        if bits & (SIGN_BIT | QNAN) == SIGN_BIT | QNAN {
            return (bits & PAYLOAD_MASK <= u64::from(u32::MAX)).then_some(PackedValue(bits));
        }
        match bits & !QNAN {
            TAG_NIL | TAG_FALSE | TAG_TRUE => Some(PackedValue(bits)),
            _ => None,
        }
    }

    /// Returns true if the word holds a number.
    pub fn is_number(self) -> bool {
        self.0 & QNAN != QNAN
    }

    /// Returns true if the word holds an object handle.
    pub fn is_obj(self) -> bool {
        self.0 & (SIGN_BIT | QNAN) == SIGN_BIT | QNAN
    }
}

impl PartialEq for PackedValue {
    fn eq(&self, other: &Self) -> bool {
        if self.is_number() && other.is_number() {
            f64::from_bits(self.0) == f64::from_bits(other.0)
        } else {
            self.0 == other.0
        }
    }
}

impl From<Value> for PackedValue {
    fn from(value: Value) -> Self {
        PackedValue::pack(value)
    }
}

impl From<PackedValue> for Value {
    fn from(packed: PackedValue) -> Self {
        packed.unpack()
    }
}
