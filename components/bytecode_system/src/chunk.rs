//! Bytecode chunk - compiled bytecode container
//!
//! A chunk holds one function body: the raw instruction bytes, the source
//! line of every byte, and the constant pool.

use core_types::Value;

use crate::lines::LineTable;
use crate::opcode::OpCode;

/// Largest pool index addressable by the 3-byte constant operand.
pub const MAX_CONSTANTS: usize = 1 << 24;

/// A compiled bytecode chunk containing instructions and constants
///
/// # Examples
///
/// ```
/// use bytecode_system::{Chunk, OpCode};
/// use core_types::Value;
///
/// let mut chunk = Chunk::new();
/// chunk.write_constant(Value::Number(1.2), 123);
/// chunk.write_op(OpCode::Return, 123);
///
/// assert_eq!(chunk.code(), &[OpCode::Constant.as_byte(), 0, OpCode::Return.as_byte()]);
/// assert_eq!(chunk.line_at(2), Some(123));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    code: Vec<u8>,
    lines: LineTable,
    constants: Vec<Value>,
}

impl Chunk {
    /// Create a new empty bytecode chunk
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one byte tagged with its source line.
    pub fn write(&mut self, byte: u8, line: u32) {
        self.code.push(byte);
        self.lines.push(line);
    }

    /// Append an opcode byte.
    pub fn write_op(&mut self, op: OpCode, line: u32) {
        self.write(op.as_byte(), line);
    }

    /// Add a constant to the pool and return its index.
    ///
    /// Identical constants are not deduplicated.
    pub fn add_constant(&mut self, value: Value) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }

    /// Emit a load of an existing pool entry, choosing the short form for
    /// indices below 256 and the long form otherwise.
    pub fn write_constant_index(&mut self, index: usize, line: u32) {
        if index < 256 {
            self.write_op(OpCode::Constant, line);
            self.write(index as u8, line);
        } else {
            self.write_op(OpCode::ConstantLong, line);
            self.write(((index >> 16) & 0xff) as u8, line);
            self.write(((index >> 8) & 0xff) as u8, line);
            self.write((index & 0xff) as u8, line);
        }
    }

    /// Append a constant and emit the instruction that loads it.
    ///
    /// Returns the pool index of the new constant.
    pub fn write_constant(&mut self, value: Value, line: u32) -> usize {
        let index = self.add_constant(value);
        self.write_constant_index(index, line);
        index
    }

    /// Overwrite two bytes at `offset` with a big-endian u16.
    ///
    /// # Panics
    ///
    /// Panics if `offset + 1` is past the end of the code.
    pub fn patch_u16(&mut self, offset: usize, value: u16) {
        let [hi, lo] = value.to_be_bytes();
        self.code[offset] = hi;
        self.code[offset + 1] = lo;
    }

    /// Source line for an instruction offset, None if never recorded.
    pub fn line_at(&self, offset: usize) -> Option<u32> {
        self.lines.line_at(offset)
    }

    /// Raw instruction bytes.
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    /// The line table.
    pub fn lines(&self) -> &LineTable {
        &self.lines
    }

    /// The constant pool.
    pub fn constants(&self) -> &[Value] {
        &self.constants
    }

    /// Pool entry at `index`.
    pub fn constant(&self, index: usize) -> Option<Value> {
        self.constants.get(index).copied()
    }

    /// Byte at `offset`.
    pub fn byte(&self, offset: usize) -> Option<u8> {
        self.code.get(offset).copied()
    }

    /// Big-endian u16 starting at `offset`.
    pub fn read_u16(&self, offset: usize) -> Option<u16> {
        let hi = self.byte(offset)?;
        let lo = self.byte(offset + 1)?;
        Some(u16::from_be_bytes([hi, lo]))
    }

    /// Big-endian 24-bit value starting at `offset`.
    pub fn read_u24(&self, offset: usize) -> Option<usize> {
        let b2 = self.byte(offset)? as usize;
        let b1 = self.byte(offset + 1)? as usize;
        let b0 = self.byte(offset + 2)? as usize;
        Some((b2 << 16) | (b1 << 8) | b0)
    }

    /// Number of code bytes.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// True if no code has been written.
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Approximate heap footprint in bytes, used for collector accounting.
    pub fn size_hint(&self) -> usize {
        self.code.capacity()
            + self.lines.runs().len() * std::mem::size_of::<crate::lines::LineRun>()
            + self.constants.capacity() * std::mem::size_of::<Value>()
    }
}
