//! Compiler output and diagnostics

use bytecode_system::{Disassembler, Instructions, OpCode, Operand};
use core_types::{ObjRef, Value};
use memory_manager::{Heap, NoRoots, ObjType};
use parser::{compile, CompileErrors};
use proptest::prelude::*;

fn opcodes(heap: &Heap, function: ObjRef) -> Vec<OpCode> {
    Instructions::new(&heap.as_function(function).chunk, heap)
        .map(|inst| inst.unwrap().opcode)
        .collect()
}

fn compile_ok(source: &str) -> (Heap, ObjRef) {
    let mut heap = Heap::new();
    let script = compile(source, &mut heap, &NoRoots).unwrap();
    (heap, script)
}

fn compile_err(source: &str) -> CompileErrors {
    let mut heap = Heap::new();
    compile(source, &mut heap, &NoRoots).unwrap_err()
}

#[test]
fn test_global_definition() {
    let (heap, script) = compile_ok("var answer = 42;");
    assert_eq!(
        opcodes(&heap, script),
        vec![OpCode::Constant, OpCode::DefineGlobal, OpCode::Nil, OpCode::Return]
    );
    let constants = heap.as_function(script).chunk.constants();
    assert_eq!(heap.string_value(constants[0]), Some("answer"));
    assert_eq!(constants[1], Value::Number(42.0));
}

#[test]
fn test_comparison_operators_have_dedicated_opcodes() {
    let (heap, script) = compile_ok("print 1 != 2; print 1 >= 2; print 1 <= 2;");
    let ops = opcodes(&heap, script);
    assert!(ops.contains(&OpCode::NotEqual));
    assert!(ops.contains(&OpCode::GreaterEqual));
    assert!(ops.contains(&OpCode::LessEqual));
    assert!(!ops.contains(&OpCode::Not));
}

#[test]
fn test_logical_operators_short_circuit() {
    let (heap, script) = compile_ok("print true and false or nil;");
    let ops = opcodes(&heap, script);
    assert_eq!(
        ops.iter().filter(|op| **op == OpCode::JumpIfFalse).count(),
        2
    );
    assert!(ops.contains(&OpCode::Jump));
}

#[test]
fn test_while_loop_jumps_back() {
    let (heap, script) = compile_ok("var i = 0; while (i < 3) i = i + 1;");
    let chunk = &heap.as_function(script).chunk;
    let jump_back = Instructions::new(chunk, &heap)
        .map(|inst| inst.unwrap())
        .find(|inst| inst.opcode == OpCode::Loop)
        .unwrap();
    let Operand::Jump { target } = jump_back.operand else {
        panic!("loop without target");
    };
    assert!(target < jump_back.offset);
    // The loop re-evaluates the condition, which starts with `GetGlobal i`.
    let first = bytecode_system::decode(chunk, target, &heap).unwrap();
    assert_eq!(first.opcode, OpCode::GetGlobal);
}

#[test]
fn test_method_calls_compile_to_invoke() {
    let (heap, script) = compile_ok("var o; o.greet(1, 2);");
    let chunk = &heap.as_function(script).chunk;
    let invoke = Instructions::new(chunk, &heap)
        .map(|inst| inst.unwrap())
        .find(|inst| inst.opcode == OpCode::Invoke)
        .unwrap();
    let Operand::Invoke { constant, arg_count } = invoke.operand else {
        panic!("invoke without operands");
    };
    assert_eq!(arg_count, 2);
    assert_eq!(heap.string_value(chunk.constants()[constant]), Some("greet"));
}

#[test]
fn test_initializer_returns_this() {
    let (heap, script) = compile_ok("class A { init() {} }");
    let listing = Disassembler::new(&heap.as_function(script).chunk, &heap).disassemble("s");
    assert!(listing.contains("OP_CLASS"));
    assert!(listing.contains("OP_METHOD"));

    let init = heap
        .as_function(script)
        .chunk
        .constants()
        .iter()
        .filter_map(|c| c.as_obj())
        .find(|obj| heap.render(Value::Obj(*obj)) == "<fn init>")
        .unwrap();
    assert_eq!(
        opcodes(&heap, init),
        vec![OpCode::GetLocal, OpCode::Return]
    );
}

#[test]
fn test_subclass_uses_super_local() {
    let (heap, script) = compile_ok(
        "class A { f() {} } class B < A { f() { return super.f(); } g() { return super.f; } }",
    );
    let ops = opcodes(&heap, script);
    assert!(ops.contains(&OpCode::Inherit));
    // The scope holding `super` is closed because methods capture it.
    assert!(ops.contains(&OpCode::CloseUpvalue));

    let methods: Vec<ObjRef> = heap
        .as_function(script)
        .chunk
        .constants()
        .iter()
        .filter_map(|c| c.as_obj())
        .filter(|obj| heap.is_obj_type(Value::Obj(*obj), ObjType::Function))
        .collect();
    let ops: Vec<OpCode> = methods.iter().flat_map(|m| opcodes(&heap, *m)).collect();
    assert!(ops.contains(&OpCode::SuperInvoke));
    assert!(ops.contains(&OpCode::GetSuper));
}

#[test]
fn test_error_positions() {
    let errors = compile_err("print 1");
    assert_eq!(
        errors.to_string(),
        "[line 1] Error at end: Expect ';' after value."
    );

    let errors = compile_err("var x = 1;\nprint @;");
    assert_eq!(errors.to_string(), "[line 2] Error: Unexpected character.");

    let errors = compile_err("fun f( { }");
    assert_eq!(errors.errors()[0].line, 1);
    assert_eq!(errors.errors()[0].message, "Expect parameter name.");
}

#[test]
fn test_one_error_per_statement() {
    let errors = compile_err("print (;\nprint );\nprint 1;\nvar 1;");
    let lines: Vec<u32> = errors.errors().iter().map(|e| e.line).collect();
    assert_eq!(lines, vec![1, 2, 4]);
}

proptest! {
    #[test]
    fn prop_compiler_never_panics(words in prop::collection::vec(
        prop::sample::select(vec![
            "var", "x", "y", "=", "1", "\"s\"", ";", "(", ")", "{", "}", "fun", "class",
            "print", "+", "-", "*", "!", "<", "this", "super", ".", ",", "return", "if",
            "else", "while", "for", "and", "or", "nil",
        ]),
        0..48,
    )) {
        let source = words.join(" ");
        let mut heap = Heap::new();
        let _ = compile(&source, &mut heap, &NoRoots);
    }
}
