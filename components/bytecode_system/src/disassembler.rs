//! Human-readable chunk listings.

use std::fmt::Write;

use crate::chunk::Chunk;
use crate::instruction::{decode, ConstantResolver, Operand};

/// Renders a chunk one instruction per row.
///
/// Row layout: four-digit offset, source line (or `   |` when unchanged from
/// the previous instruction), the opcode name padded to 16 columns and the
/// operand.
///
/// # Examples
///
/// ```
/// use bytecode_system::{Chunk, Disassembler, OpCode, Primitives};
/// use core_types::Value;
///
/// let mut chunk = Chunk::new();
/// chunk.write_constant(Value::Number(1.2), 123);
/// chunk.write_op(OpCode::Return, 123);
///
/// let listing = Disassembler::new(&chunk, &Primitives).disassemble("test chunk");
/// assert_eq!(
///     listing,
///     "== test chunk ==\n\
///      0000  123 OP_CONSTANT         0 '1.2'\n\
///      0002    | OP_RETURN\n"
/// );
/// ```
pub struct Disassembler<'a, R: ?Sized> {
    chunk: &'a Chunk,
    resolver: &'a R,
}

impl<'a, R: ConstantResolver + ?Sized> Disassembler<'a, R> {
    /// Create a disassembler for `chunk`.
    pub fn new(chunk: &'a Chunk, resolver: &'a R) -> Self {
        Self { chunk, resolver }
    }

    /// Full listing headed by `== name ==`.
    pub fn disassemble(&self, name: &str) -> String {
        let mut out = format!("== {} ==\n", name);
        let mut offset = 0;
        while offset < self.chunk.len() {
            let (row, next) = self.instruction(offset);
            out.push_str(&row);
            offset = next;
        }
        out
    }

    /// Render the instruction at `offset`; returns the text (newline
    /// terminated, possibly several rows) and the next offset.
    pub fn instruction(&self, offset: usize) -> (String, usize) {
        let mut out = format!("{:04} ", offset);
        let line = self.chunk.line_at(offset);
        if offset > 0 && line == self.chunk.line_at(offset - 1) {
            out.push_str("   | ");
        } else {
            match line {
                Some(line) => {
                    let _ = write!(out, "{:4} ", line);
                }
                None => out.push_str("   ? "),
            }
        }

        let instruction = match decode(self.chunk, offset, self.resolver) {
            Ok(instruction) => instruction,
            Err(err) => {
                let _ = writeln!(out, "{}", err);
                return (out, offset + 1);
            }
        };

        let name = instruction.opcode.name();
        match &instruction.operand {
            Operand::None => {
                let _ = writeln!(out, "{}", name);
            }
            Operand::Byte(byte) => {
                let _ = writeln!(out, "{:<16} {:4}", name, byte);
            }
            Operand::Constant(index) => {
                let _ = writeln!(out, "{:<16} {:4} '{}'", name, index, self.constant(*index));
            }
            Operand::Jump { target } => {
                let _ = writeln!(out, "{:<16} {:4} -> {}", name, offset, target);
            }
            Operand::Invoke {
                constant,
                arg_count,
            } => {
                let _ = writeln!(
                    out,
                    "{:<16} ({} args) {:4} '{}'",
                    name,
                    arg_count,
                    constant,
                    self.constant(*constant)
                );
            }
            Operand::Closure { constant, captures } => {
                let _ = writeln!(out, "{:<16} {:4} {}", name, constant, self.constant(*constant));
                for (i, capture) in captures.iter().enumerate() {
                    let kind = if capture.is_local { "local" } else { "upvalue" };
                    let _ = writeln!(
                        out,
                        "{:04}      |                     {} {}",
                        offset + 2 + i * 2,
                        kind,
                        capture.index
                    );
                }
            }
        }
        (out, instruction.next_offset())
    }

    fn constant(&self, index: usize) -> String {
        match self.chunk.constant(index) {
            Some(value) => self.resolver.describe(value),
            None => "<missing>".to_string(),
        }
    }
}
