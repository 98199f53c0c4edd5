//! Bytecode system for the Lox runtime
//!
//! This crate provides the instruction set, the chunk container that a
//! function body compiles into, and decoding/disassembly of chunks.
//!
//! # Features
//!
//! - Byte-oriented stack-machine instruction set
//! - Short (1-byte) and long (3-byte) constant addressing
//! - Run-length encoded source-line table
//! - Typed instruction decoding and textual listings
//!
//! # Example
//!
//! ```
//! use bytecode_system::{Chunk, Disassembler, Instructions, OpCode, Primitives};
//! use core_types::Value;
//!
//! let mut chunk = Chunk::new();
//!
//! // Add constants and emit loads
//! chunk.write_constant(Value::Number(1.3), 1);
//! chunk.write_op(OpCode::Negate, 1);
//! chunk.write_op(OpCode::Return, 2);
//!
//! // Decode
//! let ops: Vec<OpCode> = Instructions::new(&chunk, &Primitives)
//!     .map(|inst| inst.unwrap().opcode)
//!     .collect();
//! assert_eq!(ops, vec![OpCode::Constant, OpCode::Negate, OpCode::Return]);
//!
//! // List
//! let listing = Disassembler::new(&chunk, &Primitives).disassemble("script");
//! assert!(listing.contains("OP_NEGATE"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunk;
pub mod disassembler;
pub mod instruction;
pub mod lines;
pub mod opcode;

// Re-export main types at crate root
pub use chunk::{Chunk, MAX_CONSTANTS};
pub use disassembler::Disassembler;
pub use instruction::{
    decode, Capture, ConstantResolver, DecodeError, Instruction, Instructions, Operand, Primitives,
};
pub use lines::{LineRun, LineTable};
pub use opcode::{OpCode, UnknownOpcode};
