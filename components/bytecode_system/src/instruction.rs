//! Instruction decoding
//!
//! Turns the raw byte stream of a [`Chunk`] into typed [`Instruction`]s with
//! their operands, byte length and source line. The execution engine, the
//! disassembler and the tests all go through [`decode`].

use core_types::Value;
use thiserror::Error;

use crate::chunk::Chunk;
use crate::opcode::OpCode;

/// Supplies what decoding cannot learn from the chunk alone.
///
/// Constants may be heap objects, so rendering them and finding how many
/// capture pairs follow a closure instruction needs the owner of the heap.
pub trait ConstantResolver {
    /// Number of upvalues declared by the function constant `constant`.
    fn upvalue_count(&self, constant: Value) -> usize;

    /// Printable form of a constant.
    fn describe(&self, constant: Value) -> String;
}

/// Resolver for chunks whose constants are all primitives.
#[derive(Debug, Clone, Copy, Default)]
pub struct Primitives;

impl ConstantResolver for Primitives {
    fn upvalue_count(&self, _constant: Value) -> usize {
        0
    }

    fn describe(&self, constant: Value) -> String {
        constant.to_string()
    }
}

/// One captured variable listed after a closure instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capture {
    /// True if the enclosing function's local slot is captured, false if one
    /// of its upvalues is reused
    pub is_local: bool,
    /// Slot or upvalue index in the enclosing function
    pub index: u8,
}

/// Decoded operand of an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// No operand bytes
    None,
    /// Stack slot, upvalue index or argument count
    Byte(u8),
    /// Constant pool index
    Constant(usize),
    /// Absolute byte offset the jump lands on
    Jump {
        /// Destination offset
        target: usize,
    },
    /// Method name constant plus argument count
    Invoke {
        /// Name constant index
        constant: usize,
        /// Number of arguments
        arg_count: u8,
    },
    /// Function constant plus the captures that follow it
    Closure {
        /// Function constant index
        constant: usize,
        /// One entry per upvalue of the function
        captures: Vec<Capture>,
    },
}

/// A single decoded bytecode instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Offset of the opcode byte
    pub offset: usize,
    /// The opcode
    pub opcode: OpCode,
    /// Decoded operand
    pub operand: Operand,
    /// Source line of the opcode byte
    pub line: Option<u32>,
    /// Total encoded length in bytes
    pub len: usize,
}

impl Instruction {
    /// Offset of the following instruction.
    pub fn next_offset(&self) -> usize {
        self.offset + self.len
    }
}

/// Errors raised while decoding a byte stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The byte does not name an opcode
    #[error("Unknown opcode {byte} at offset {offset}")]
    UnknownOpcode {
        /// Offset of the bad byte
        offset: usize,
        /// The byte itself
        byte: u8,
    },
    /// Operand bytes run past the end of the chunk
    #[error("{opcode} at offset {offset} is truncated")]
    Truncated {
        /// Offset of the opcode byte
        offset: usize,
        /// Name of the opcode
        opcode: &'static str,
    },
    /// A loop jumps before the start of the chunk
    #[error("Jump at offset {offset} lands before the chunk start")]
    JumpOutOfRange {
        /// Offset of the opcode byte
        offset: usize,
    },
}

/// Decode the instruction starting at `offset`.
pub fn decode<R>(chunk: &Chunk, offset: usize, resolver: &R) -> Result<Instruction, DecodeError>
where
    R: ConstantResolver + ?Sized,
{
    let byte = chunk.byte(offset).ok_or(DecodeError::Truncated {
        offset,
        opcode: "instruction",
    })?;
    let opcode = OpCode::try_from(byte).map_err(|_| DecodeError::UnknownOpcode { offset, byte })?;
    let truncated = DecodeError::Truncated {
        offset,
        opcode: opcode.name(),
    };
    let byte_at = |at: usize| chunk.byte(at).ok_or_else(|| truncated.clone());

    let (operand, len) = match opcode {
        OpCode::Constant
        | OpCode::GetGlobal
        | OpCode::DefineGlobal
        | OpCode::SetGlobal
        | OpCode::GetProperty
        | OpCode::SetProperty
        | OpCode::GetSuper
        | OpCode::Class
        | OpCode::Method => (Operand::Constant(byte_at(offset + 1)? as usize), 2),
        OpCode::ConstantLong => {
            let index = chunk.read_u24(offset + 1).ok_or_else(|| truncated.clone())?;
            (Operand::Constant(index), 4)
        }
        OpCode::GetLocal
        | OpCode::SetLocal
        | OpCode::GetUpvalue
        | OpCode::SetUpvalue
        | OpCode::Call => (Operand::Byte(byte_at(offset + 1)?), 2),
        OpCode::Jump | OpCode::JumpIfFalse | OpCode::Loop => {
            let jump = chunk.read_u16(offset + 1).ok_or_else(|| truncated.clone())? as usize;
            let after = offset + 3;
            let target = if opcode == OpCode::Loop {
                after
                    .checked_sub(jump)
                    .ok_or(DecodeError::JumpOutOfRange { offset })?
            } else {
                after + jump
            };
            (Operand::Jump { target }, 3)
        }
        OpCode::Invoke | OpCode::SuperInvoke => {
            let constant = byte_at(offset + 1)? as usize;
            let arg_count = byte_at(offset + 2)?;
            (
                Operand::Invoke {
                    constant,
                    arg_count,
                },
                3,
            )
        }
        OpCode::Closure => {
            let constant = byte_at(offset + 1)? as usize;
            let function = chunk.constant(constant).unwrap_or(Value::Nil);
            let count = resolver.upvalue_count(function);
            let mut captures = Vec::with_capacity(count);
            for i in 0..count {
                let at = offset + 2 + i * 2;
                captures.push(Capture {
                    is_local: byte_at(at)? == 1,
                    index: byte_at(at + 1)?,
                });
            }
            (Operand::Closure { constant, captures }, 2 + count * 2)
        }
        _ => (Operand::None, 1),
    };

    Ok(Instruction {
        offset,
        opcode,
        operand,
        line: chunk.line_at(offset),
        len,
    })
}

/// Iterator over every instruction of a chunk.
///
/// Stops after the first decoding error.
pub struct Instructions<'a, R: ?Sized> {
    chunk: &'a Chunk,
    resolver: &'a R,
    offset: usize,
    failed: bool,
}

impl<'a, R: ConstantResolver + ?Sized> Instructions<'a, R> {
    /// Iterate `chunk` from offset zero.
    pub fn new(chunk: &'a Chunk, resolver: &'a R) -> Self {
        Self {
            chunk,
            resolver,
            offset: 0,
            failed: false,
        }
    }
}

impl<R: ConstantResolver + ?Sized> Iterator for Instructions<'_, R> {
    type Item = Result<Instruction, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.chunk.len() {
            return None;
        }
        match decode(self.chunk, self.offset, self.resolver) {
            Ok(instruction) => {
                self.offset = instruction.next_offset();
                Some(Ok(instruction))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}
