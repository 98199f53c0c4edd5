//! Lox value representation.
//!
//! This module provides the tagged `Value` enum that every stack slot,
//! constant-pool entry and instance field holds, plus the `ObjRef` handle
//! used to reference objects living on the garbage-collected heap.

use std::fmt;

/// Handle to an object owned by the garbage-collected heap.
///
/// A handle is a slot index into the heap's object arena. Because strings are
/// interned, two string handles are equal exactly when their contents are
/// equal, so handle equality doubles as content equality for strings.
///
/// # Examples
///
/// ```
/// use core_types::ObjRef;
///
/// let handle = ObjRef::from_index(7);
/// assert_eq!(handle.index(), 7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjRef(u32);

impl ObjRef {
    /// Creates a handle for the given arena slot.
    pub const fn from_index(index: u32) -> Self {
        ObjRef(index)
    }

    /// Returns the arena slot this handle refers to.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the raw slot number.
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Represents any Lox value.
///
/// Primitive values are stored inline; heap objects (strings, functions,
/// closures, classes, instances, ...) are referenced through an [`ObjRef`].
///
/// # Examples
///
/// ```
/// use core_types::Value;
///
/// let nil = Value::Nil;
/// let number = Value::Number(42.0);
///
/// assert!(nil.is_falsey());
/// assert!(!number.is_falsey());
/// assert_eq!(number.type_name(), "number");
/// ```
#[derive(Debug, Clone, Copy)]
pub enum Value {
    /// The `nil` value
    Nil,
    /// `true` or `false`
    Bool(bool),
    /// IEEE 754 double-precision number
    Number(f64),
    /// Reference to a heap object
    Obj(ObjRef),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            // Numeric comparison, so NaN != NaN holds.
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Obj(a), Value::Obj(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// Returns whether this value is falsey in Lox semantics.
    ///
    /// Only `nil` and `false` are falsey; every other value, including `0`
    /// and the empty string, is truthy.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::Value;
    ///
    /// assert!(Value::Nil.is_falsey());
    /// assert!(Value::Bool(false).is_falsey());
    /// assert!(!Value::Number(0.0).is_falsey());
    /// ```
    pub fn is_falsey(&self) -> bool {
        matches!(self, Value::Nil | Value::Bool(false))
    }

    /// Returns true for `nil`.
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Returns true for numbers.
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    /// Returns the number payload, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean payload, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the heap handle, if this value references an object.
    pub fn as_obj(&self) -> Option<ObjRef> {
        match self {
            Value::Obj(r) => Some(*r),
            _ => None,
        }
    }

    /// Returns the name of this value's primitive type.
    ///
    /// Heap objects all report `"object"`; the heap knows their precise kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Obj(_) => "object",
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<ObjRef> for Value {
    fn from(r: ObjRef) -> Self {
        Value::Obj(r)
    }
}

/// Significant digits shown by [`format_number`].
const PRINT_PRECISION: i32 = 6;

/// Renders a number the way `print` shows it.
///
/// Follows C's `%g`: six significant digits with trailing zeros dropped,
/// switching to exponent form when the decimal exponent is below -4 or at
/// least six.
///
/// # Examples
///
/// ```
/// use core_types::format_number;
///
/// assert_eq!(format_number(3.0), "3");
/// assert_eq!(format_number(-5.2), "-5.2");
/// assert_eq!(format_number(0.1 + 0.2), "0.3");
/// assert_eq!(format_number(1234567890.0), "1.23457e+09");
/// assert_eq!(format_number(f64::NAN), "nan");
/// ```
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "nan".to_string();
    }
    if n.is_infinite() {
        return if n.is_sign_positive() { "inf" } else { "-inf" }.to_string();
    }
    if n == 0.0 {
        return if n.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // Round to the shown precision first; rounding can carry into the exponent.
    let scientific = format!("{:.*e}", (PRINT_PRECISION - 1) as usize, n);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if exponent < -4 || exponent >= PRINT_PRECISION {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.abs())
    } else {
        let decimals = (PRINT_PRECISION - 1 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, n)).to_string()
    }
}

fn trim_fraction(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}

/// Primitive rendering. Objects need the heap for their real text, so they
/// only show their handle here.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Obj(r) => write!(f, "<object {}>", r),
        }
    }
}
