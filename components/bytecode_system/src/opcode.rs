//! Bytecode opcodes for the Lox stack machine
//!
//! Every instruction is one opcode byte followed by zero or more operand
//! bytes. The byte value of each opcode is its position in declaration order.

use thiserror::Error;

/// Error returned when a byte does not name any opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Unknown opcode {0}.")]
pub struct UnknownOpcode(pub u8);

/// Bytecode opcodes for Lox execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    // Literals
    /// Push constant from a 1-byte pool index
    Constant,
    /// Push constant from a 3-byte big-endian pool index
    ConstantLong,
    /// Push nil
    Nil,
    /// Push true
    True,
    /// Push false
    False,
    /// Discard the top of the stack
    Pop,

    // Variables
    /// Push local slot (1-byte slot operand)
    GetLocal,
    /// Store top of stack into local slot, leaving it on the stack
    SetLocal,
    /// Push global by name constant
    GetGlobal,
    /// Pop into a new global by name constant
    DefineGlobal,
    /// Store into an existing global by name constant
    SetGlobal,
    /// Push upvalue (1-byte upvalue index)
    GetUpvalue,
    /// Store into upvalue
    SetUpvalue,
    /// Replace instance on top with its field or bound method
    GetProperty,
    /// Assign field on instance below top
    SetProperty,
    /// Bind a superclass method to the receiver
    GetSuper,

    // Comparison
    /// a == b
    Equal,
    /// a != b
    NotEqual,
    /// a > b
    Greater,
    /// a >= b
    GreaterEqual,
    /// a < b
    Less,
    /// a <= b
    LessEqual,

    // Arithmetic
    /// Add numbers or concatenate strings
    Add,
    /// a - b
    Subtract,
    /// a * b
    Multiply,
    /// a / b
    Divide,
    /// Logical NOT of truthiness
    Not,
    /// Numeric negation
    Negate,

    /// Pop and print
    Print,

    // Control flow
    /// Unconditional forward jump (16-bit offset)
    Jump,
    /// Forward jump if top is falsey; does not pop
    JumpIfFalse,
    /// Unconditional backward jump (16-bit offset)
    Loop,

    // Calls
    /// Call callee below N arguments (1-byte argument count)
    Call,
    /// Fused property lookup and call (name constant, argument count)
    Invoke,
    /// Fused superclass method lookup and call (name constant, argument count)
    SuperInvoke,
    /// Create closure from function constant plus capture pairs
    Closure,
    /// Close the upvalue for the top slot and pop it
    CloseUpvalue,

    // Classes
    /// Push a new empty class
    Class,
    /// Copy superclass methods into subclass
    Inherit,
    /// Install closure on top as a method of the class below it
    Method,

    /// Return from the current function
    Return,
}

impl OpCode {
    /// Every opcode in byte-value order.
    pub const ALL: [OpCode; 41] = [
        OpCode::Constant,
        OpCode::ConstantLong,
        OpCode::Nil,
        OpCode::True,
        OpCode::False,
        OpCode::Pop,
        OpCode::GetLocal,
        OpCode::SetLocal,
        OpCode::GetGlobal,
        OpCode::DefineGlobal,
        OpCode::SetGlobal,
        OpCode::GetUpvalue,
        OpCode::SetUpvalue,
        OpCode::GetProperty,
        OpCode::SetProperty,
        OpCode::GetSuper,
        OpCode::Equal,
        OpCode::NotEqual,
        OpCode::Greater,
        OpCode::GreaterEqual,
        OpCode::Less,
        OpCode::LessEqual,
        OpCode::Add,
        OpCode::Subtract,
        OpCode::Multiply,
        OpCode::Divide,
        OpCode::Not,
        OpCode::Negate,
        OpCode::Print,
        OpCode::Jump,
        OpCode::JumpIfFalse,
        OpCode::Loop,
        OpCode::Call,
        OpCode::Invoke,
        OpCode::SuperInvoke,
        OpCode::Closure,
        OpCode::CloseUpvalue,
        OpCode::Class,
        OpCode::Inherit,
        OpCode::Method,
        OpCode::Return,
    ];

    /// Returns the byte value of this opcode.
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Returns the listing name, e.g. `OP_CONSTANT_LONG`.
    pub fn name(self) -> &'static str {
        match self {
            OpCode::Constant => "OP_CONSTANT",
            OpCode::ConstantLong => "OP_CONSTANT_LONG",
            OpCode::Nil => "OP_NIL",
            OpCode::True => "OP_TRUE",
            OpCode::False => "OP_FALSE",
            OpCode::Pop => "OP_POP",
            OpCode::GetLocal => "OP_GET_LOCAL",
            OpCode::SetLocal => "OP_SET_LOCAL",
            OpCode::GetGlobal => "OP_GET_GLOBAL",
            OpCode::DefineGlobal => "OP_DEFINE_GLOBAL",
            OpCode::SetGlobal => "OP_SET_GLOBAL",
            OpCode::GetUpvalue => "OP_GET_UPVALUE",
            OpCode::SetUpvalue => "OP_SET_UPVALUE",
            OpCode::GetProperty => "OP_GET_PROPERTY",
            OpCode::SetProperty => "OP_SET_PROPERTY",
            OpCode::GetSuper => "OP_GET_SUPER",
            OpCode::Equal => "OP_EQUAL",
            OpCode::NotEqual => "OP_NOT_EQUAL",
            OpCode::Greater => "OP_GREATER",
            OpCode::GreaterEqual => "OP_GREATER_EQUAL",
            OpCode::Less => "OP_LESS",
            OpCode::LessEqual => "OP_LESS_EQUAL",
            OpCode::Add => "OP_ADD",
            OpCode::Subtract => "OP_SUBTRACT",
            OpCode::Multiply => "OP_MULTIPLY",
            OpCode::Divide => "OP_DIVIDE",
            OpCode::Not => "OP_NOT",
            OpCode::Negate => "OP_NEGATE",
            OpCode::Print => "OP_PRINT",
            OpCode::Jump => "OP_JUMP",
            OpCode::JumpIfFalse => "OP_JUMP_IF_FALSE",
            OpCode::Loop => "OP_LOOP",
            OpCode::Call => "OP_CALL",
            OpCode::Invoke => "OP_INVOKE",
            OpCode::SuperInvoke => "OP_SUPER_INVOKE",
            OpCode::Closure => "OP_CLOSURE",
            OpCode::CloseUpvalue => "OP_CLOSE_UPVALUE",
            OpCode::Class => "OP_CLASS",
            OpCode::Inherit => "OP_INHERIT",
            OpCode::Method => "OP_METHOD",
            OpCode::Return => "OP_RETURN",
        }
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> Self {
        op as u8
    }
}

impl TryFrom<u8> for OpCode {
    type Error = UnknownOpcode;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        OpCode::ALL
            .get(byte as usize)
            .copied()
            .ok_or(UnknownOpcode(byte))
    }
}
