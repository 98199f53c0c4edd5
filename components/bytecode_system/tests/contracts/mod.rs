//! Contract tests for bytecode_system
//! Verifies the byte-level encoding other components rely on

use bytecode_system::{Chunk, OpCode};
use core_types::Value;

/// Opcode byte values are fixed by declaration order
#[test]
fn test_contract_opcode_bytes() {
    assert_eq!(OpCode::Constant.as_byte(), 0);
    assert_eq!(OpCode::ConstantLong.as_byte(), 1);
    assert_eq!(OpCode::Pop.as_byte(), 5);
    assert_eq!(OpCode::Equal.as_byte(), 16);
    assert_eq!(OpCode::Add.as_byte(), 22);
    assert_eq!(OpCode::Print.as_byte(), 28);
    assert_eq!(OpCode::Call.as_byte(), 32);
    assert_eq!(OpCode::Closure.as_byte(), 35);
    assert_eq!(OpCode::Return.as_byte(), 40);
}

/// Long constant operands are big-endian, high byte first
#[test]
fn test_contract_long_operand_byte_order() {
    let mut chunk = Chunk::new();
    for _ in 0..0x1234 {
        chunk.add_constant(Value::Nil);
    }
    chunk.write_constant(Value::Number(1.0), 1);
    assert_eq!(chunk.code(), &[1, 0x00, 0x12, 0x34]);
}

/// Jump operands are big-endian u16
#[test]
fn test_contract_jump_operand_byte_order() {
    let mut chunk = Chunk::new();
    chunk.write_op(OpCode::Jump, 1);
    chunk.write(0, 1);
    chunk.write(0, 1);
    chunk.patch_u16(1, 0xabcd);
    assert_eq!(&chunk.code()[1..], &[0xab, 0xcd]);
}
