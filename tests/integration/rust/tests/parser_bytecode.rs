//! Compiler to Bytecode Integration Tests
//!
//! Compiles Lox source into heap functions and checks the resulting chunks
//! through the bytecode_system decoder and disassembler.

use bytecode_system::{Capture, Disassembler, Instruction, Instructions, OpCode, Operand};
use core_types::{ObjRef, Value};
use memory_manager::{Heap, NoRoots, ObjType};
use proptest::prelude::*;

fn compile(heap: &mut Heap, source: &str) -> ObjRef {
    match parser::compile(source, heap, &NoRoots) {
        Ok(script) => script,
        Err(errors) => panic!("compile failed:\n{}", errors),
    }
}

fn instructions(heap: &Heap, function: ObjRef) -> Vec<Instruction> {
    Instructions::new(&heap.as_function(function).chunk, heap)
        .collect::<Result<_, _>>()
        .expect("compiler output decodes")
}

fn nested_functions(heap: &Heap, function: ObjRef) -> Vec<ObjRef> {
    heap.as_function(function)
        .chunk
        .constants()
        .iter()
        .filter(|value| heap.is_obj_type(**value, ObjType::Function))
        .filter_map(Value::as_obj)
        .collect()
}

/// Test: globals compile to define/get pairs and the script returns nil
#[test]
fn test_script_decodes_with_lines() {
    let mut heap = Heap::new();
    let script = compile(&mut heap, "var x = 1;\nprint x;");

    let decoded = instructions(&heap, script);
    let ops: Vec<OpCode> = decoded.iter().map(|inst| inst.opcode).collect();
    assert_eq!(
        ops,
        vec![
            OpCode::Constant,
            OpCode::DefineGlobal,
            OpCode::GetGlobal,
            OpCode::Print,
            OpCode::Nil,
            OpCode::Return,
        ]
    );
    let lines: Vec<Option<u32>> = decoded.iter().map(|inst| inst.line).collect();
    assert_eq!(lines, vec![Some(1), Some(1), Some(2), Some(2), Some(2), Some(2)]);
}

/// Test: a closure over an enclosing local records the capture in both
/// the function object and the CLOSURE operand
#[test]
fn test_closure_capture_reaches_decoder() {
    let mut heap = Heap::new();
    let script = compile(
        &mut heap,
        "fun outer() {\n  var a = 1;\n  fun inner() { return a; }\n  return inner;\n}",
    );

    let outer = nested_functions(&heap, script)[0];
    let inner = nested_functions(&heap, outer)[0];
    assert_eq!(heap.as_function(inner).upvalue_count, 1);
    assert_eq!(heap.render(Value::Obj(inner)), "<fn inner>");

    let captures: Vec<Capture> = instructions(&heap, outer)
        .into_iter()
        .find_map(|inst| match inst.operand {
            Operand::Closure { captures, .. } => Some(captures),
            _ => None,
        })
        .expect("outer creates a closure");
    assert_eq!(
        captures,
        vec![Capture {
            is_local: true,
            index: 1
        }]
    );

    let inner_ops: Vec<OpCode> = instructions(&heap, inner)
        .iter()
        .map(|inst| inst.opcode)
        .collect();
    assert_eq!(inner_ops[0], OpCode::GetUpvalue);
}

/// Test: the heap resolves constants for the disassembler
#[test]
fn test_disassembly_renders_heap_constants() {
    let mut heap = Heap::new();
    let script = compile(&mut heap, "print \"hi\";");

    let listing = Disassembler::new(&heap.as_function(script).chunk, &heap).disassemble("script");
    assert_eq!(
        listing,
        "== script ==\n\
         0000    1 OP_CONSTANT         0 'hi'\n\
         0002    | OP_PRINT\n\
         0003    | OP_NIL\n\
         0004    | OP_RETURN\n"
    );
}

/// Test: a nested function's listing shows its capture rows
#[test]
fn test_disassembly_lists_captures() {
    let mut heap = Heap::new();
    let script = compile(&mut heap, "{ var a = 1; fun f() { print a; } }");

    let listing = Disassembler::new(&heap.as_function(script).chunk, &heap).disassemble("script");
    assert!(listing.contains("OP_CLOSURE"));
    assert!(listing.contains("<fn f>"));
    assert!(listing.contains("local 1"));
    assert!(listing.contains("OP_CLOSE_UPVALUE"));
}

/// Test: identical literals in separate compilations share one string
#[test]
fn test_literals_are_interned_across_compilations() {
    let mut heap = Heap::new();
    let first = compile(&mut heap, "print \"shared\";");
    let second = compile(&mut heap, "print \"shared\";");

    let literal = |script: ObjRef| heap.as_function(script).chunk.constant(0);
    assert_eq!(literal(first), literal(second));
    assert_eq!(
        literal(first).and_then(|v| v.as_obj()),
        heap.interned("shared")
    );
}

proptest! {
    /// Test: the line table maps each instruction back to its source line
    #[test]
    fn prop_print_line_matches_source(blank_lines in 0usize..300) {
        let mut heap = Heap::new();
        let source = format!("{}print 1;", "\n".repeat(blank_lines));
        let script = compile(&mut heap, &source);

        let print = instructions(&heap, script)
            .into_iter()
            .find(|inst| inst.opcode == OpCode::Print)
            .unwrap();
        prop_assert_eq!(print.line, Some(blank_lines as u32 + 1));
    }
}
