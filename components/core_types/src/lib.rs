//! Core Lox value types and error handling.
//!
//! This crate provides the foundational types shared by every layer of the
//! runtime: the tagged value representation, heap handles, the optional
//! NaN-boxed encoding, and runtime error reporting.
//!
//! # Overview
//!
//! - [`Value`] - Tagged representation of Lox values
//! - [`ObjRef`] - Handle to a garbage-collected heap object
//! - [`PackedValue`] - 64-bit NaN-boxed encoding of a [`Value`]
//! - [`RuntimeError`] - Script errors with line and stack trace
//! - [`StackFrame`] - Call stack frame information
//!
//! # Examples
//!
//! ```
//! use core_types::{PackedValue, Value};
//!
//! let value = Value::Number(-5.2);
//! assert!(!value.is_falsey());
//! assert_eq!(PackedValue::pack(value).unpack(), value);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod packed;
mod source;
mod value;

pub use error::{RuntimeError, RuntimeErrorKind};
pub use packed::PackedValue;
pub use source::{StackFrame, StackTrace};
pub use value::{format_number, ObjRef, Value};
