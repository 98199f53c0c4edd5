//! Contract tests for the interpreter API
//!
//! These tests pin down the surface the CLI and embedders rely on.

use bytecode_system::{Chunk, OpCode};
use core_types::{RuntimeErrorKind, Value};
use interpreter::{Vm, FRAMES_MAX, STACK_MAX};
use memory_manager::{GcConfig, Obj, ObjFunction};

/// The documented engine bounds
#[test]
fn contract_engine_bounds() {
    assert_eq!(FRAMES_MAX, 64);
    assert_eq!(STACK_MAX, 64 * 256);
}

/// `execute` returns what the outermost frame returns
#[test]
fn contract_execute_returns_frame_result() {
    let mut vm = Vm::new();
    let mut chunk = Chunk::new();
    chunk.write_constant(Value::Number(1.3), 1);
    chunk.write_op(OpCode::Pop, 1);
    chunk.write_constant(Value::Number(1.3), 1);
    chunk.write_op(OpCode::Negate, 1);
    chunk.write_constant(Value::Number(4.0), 1);
    chunk.write_op(OpCode::Multiply, 1);
    chunk.write_op(OpCode::Return, 1);

    let (heap, roots) = vm.heap_and_roots();
    let function = heap.alloc(
        Obj::Function(ObjFunction {
            chunk,
            ..ObjFunction::new()
        }),
        &roots,
    );
    let result = vm.execute(function, &mut Vec::new()).unwrap();
    assert_eq!(result, Value::Number(-5.2));
}

/// A compiled script returns nil
#[test]
fn contract_script_returns_nil() {
    let mut vm = Vm::new();
    let (heap, roots) = vm.heap_and_roots();
    let script = parser::compile("1 + 1;", heap, &roots).unwrap();
    assert_eq!(vm.execute(script, &mut Vec::new()).unwrap(), Value::Nil);
}

/// Host functions receive the call's arguments
#[test]
fn contract_define_native() {
    let mut vm = Vm::new();
    vm.define_native("add", |args| match args {
        [Value::Number(a), Value::Number(b)] => Ok(Value::Number(a + b)),
        _ => Err("add expects two numbers".to_string()),
    });

    let (heap, roots) = vm.heap_and_roots();
    let script = parser::compile("var r = add(2, 3); print add;", heap, &roots).unwrap();
    let mut out = Vec::new();
    vm.execute(script, &mut out).unwrap();
    assert_eq!(vm.global("r"), Some(Value::Number(5.0)));
    assert_eq!(out, b"<native fn>\n");

    let (heap, roots) = vm.heap_and_roots();
    let script = parser::compile("add(1);", heap, &roots).unwrap();
    let error = vm.execute(script, &mut Vec::new()).unwrap_err();
    assert_eq!(error.kind, RuntimeErrorKind::NativeError);
    assert_eq!(error.message, "add expects two numbers");
}

/// Compiling against `heap_and_roots` keeps VM-held objects alive
#[test]
fn contract_compile_against_live_vm() {
    let mut vm = Vm::with_gc_config(GcConfig::default().with_stress(true));
    let (heap, roots) = vm.heap_and_roots();
    let first = parser::compile("var greeting = \"hello\";", heap, &roots).unwrap();
    vm.execute(first, &mut Vec::new()).unwrap();

    let (heap, roots) = vm.heap_and_roots();
    let second = parser::compile("print greeting + \" world\";", heap, &roots).unwrap();
    let mut out = Vec::new();
    vm.execute(second, &mut out).unwrap();
    assert_eq!(out, b"hello world\n");
}

/// Errors carry the line of the failing instruction
#[test]
fn contract_error_line() {
    let mut vm = Vm::new();
    let (heap, roots) = vm.heap_and_roots();
    let script = parser::compile("var a = 1;\nvar b = 2;\nprint a + nil;", heap, &roots).unwrap();
    let error = vm.execute(script, &mut Vec::new()).unwrap_err();
    assert_eq!(error.kind, RuntimeErrorKind::TypeError);
    assert_eq!(error.line, Some(3));
}
