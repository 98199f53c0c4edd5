//! Contract tests for the limits and guarantees the compiler exposes.

use bytecode_system::{Instructions, OpCode, Operand};
use core_types::Value;
use memory_manager::{GcConfig, Heap, NoRoots};
use parser::compile;

fn messages(source: &str) -> Vec<String> {
    let mut heap = Heap::new();
    match compile(source, &mut heap, &NoRoots) {
        Ok(_) => Vec::new(),
        Err(errors) => errors.errors().iter().map(|e| e.message.clone()).collect(),
    }
}

/// Literal constants past index 255 switch to the long form
#[test]
fn contract_long_constants() {
    let source: String = (0..300).map(|i| format!("print {};\n", i)).collect();
    let mut heap = Heap::new();
    let script = compile(&source, &mut heap, &NoRoots).unwrap();
    let chunk = &heap.as_function(script).chunk;

    let constants: Vec<_> = Instructions::new(chunk, &heap)
        .map(|inst| inst.unwrap())
        .filter(|inst| matches!(inst.opcode, OpCode::Constant | OpCode::ConstantLong))
        .collect();
    assert_eq!(constants.len(), 300);
    assert_eq!(constants[255].opcode, OpCode::Constant);
    assert_eq!(constants[256].opcode, OpCode::ConstantLong);
    assert_eq!(constants[299].operand, Operand::Constant(299));
    assert_eq!(constants[299].line, Some(300));
    assert_eq!(chunk.constants()[299], Value::Number(299.0));
}

/// Names are one-byte operands, so a chunk with too many of them fails
#[test]
fn contract_too_many_named_constants() {
    let source: String = (0..300).map(|i| format!("var v{} = {};\n", i, i)).collect();
    assert!(messages(&source).contains(&"Too many constants in one chunk.".to_string()));
}

/// At most 256 local slots, slot zero included
#[test]
fn contract_local_limit() {
    let ok: String = (0..255).map(|i| format!("var a{};", i)).collect();
    assert!(messages(&format!("{{ {} }}", ok)).is_empty());

    let over: String = (0..256).map(|i| format!("var a{};", i)).collect();
    assert_eq!(
        messages(&format!("{{ {} }}", over)),
        vec!["Too many local variables in function."]
    );
}

/// Parameter and argument counts stop at 255
#[test]
fn contract_arity_limits() {
    let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
    assert_eq!(
        messages(&format!("fun f({}) {{}}", params.join(", "))),
        vec!["Can't have more than 255 parameters."]
    );

    let args = vec!["nil"; 256].join(", ");
    assert_eq!(
        messages(&format!("f({});", args)),
        vec!["Can't have more than 255 arguments."]
    );
}

/// Forward jumps are 16-bit
#[test]
fn contract_jump_distance() {
    let body = "nil;".repeat(33_000);
    assert_eq!(
        messages(&format!("if (true) {{ {} }}", body)),
        vec!["Too much code to jump over."]
    );
    assert_eq!(
        messages(&format!("while (false) {{ {} }}", body)),
        vec!["Loop body too large."]
    );
}

/// Host roots survive collections the compiler triggers
#[test]
fn contract_host_roots_survive_compilation() {
    let mut heap = Heap::with_config(GcConfig::default().with_stress(true));
    let kept = heap.intern("kept", &NoRoots);
    let roots = vec![Value::Obj(kept)];
    let script = compile("var a = \"x\"; fun f() { return \"y\"; }", &mut heap, &roots).unwrap();
    assert_eq!(heap.as_str(kept), "kept");
    assert!(heap.is_live(script));
    assert!(heap.stats().collections > 0);
}
