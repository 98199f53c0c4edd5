//! Memory Manager and Interpreter Integration Tests
//!
//! Checks that the VM's roots, the interner and the collector cooperate:
//! reachable state survives every collection and garbage is reclaimed.

use core_types::{PackedValue, Value};
use integration_tests::run_in;
use interpreter::Vm;
use memory_manager::{GcConfig, MarkColor, ObjType};

/// Test: runtime concatenation yields the interned string a literal would
#[test]
fn test_concatenation_is_interned() {
    let mut vm = Vm::new();
    let out = run_in(&mut vm, "var joined = \"a\" + \"b\";\nprint joined == \"ab\";").unwrap();
    assert_eq!(out, "true\n");

    let joined = vm.global("joined").unwrap();
    assert_eq!(joined.as_obj(), vm.heap().interned("ab"));
    assert_eq!(vm.heap().string_value(joined), Some("ab"));
}

/// Test: instances created in a loop are reclaimed by threshold collections
#[test]
fn test_loop_garbage_is_reclaimed() {
    let mut vm = Vm::with_gc_config(GcConfig::default().with_initial_threshold(1024));
    let source = "class Box { init(v) { this.v = v; } }\n\
                  for (var i = 0; i < 500; i = i + 1) { Box(i); }\n\
                  print \"done\";";
    assert_eq!(run_in(&mut vm, source).unwrap(), "done\n");

    let stats = vm.heap().stats();
    assert!(stats.collections > 0);
    assert!(stats.objects_freed > 0);

    vm.collect_garbage();
    assert!(vm.heap().object_count() < 100);
}

/// Test: globals and everything they reach survive explicit collections
#[test]
fn test_globals_survive_collection() {
    let mut vm = Vm::new();
    run_in(
        &mut vm,
        "fun counter() { var n = 0; fun inc() { n = n + 1; return n; } return inc; }\n\
         var tick = counter();\n\
         tick();",
    )
    .unwrap();

    vm.collect_garbage();
    vm.collect_garbage();

    assert_eq!(run_in(&mut vm, "print tick();").unwrap(), "2\n");
    let tick = vm.global("tick").unwrap();
    assert!(vm.heap().is_obj_type(tick, ObjType::Closure));
}

/// Test: surviving objects are white again once a collection finishes
#[test]
fn test_marks_are_cleared_after_collection() {
    let mut vm = Vm::new();
    run_in(&mut vm, "class Node {}\nvar a = Node();\nvar b = Node();\na.next = b;\nb.next = a;").unwrap();
    vm.collect_garbage();

    for name in ["a", "b", "Node"] {
        let obj = vm.global(name).and_then(|v| v.as_obj()).unwrap();
        assert_eq!(vm.heap().mark_color(obj), Some(MarkColor::White), "{}", name);
    }
}

/// Test: dropping the last reference to a cycle frees it
#[test]
fn test_unreachable_cycle_is_freed() {
    let mut vm = Vm::new();
    run_in(&mut vm, "class Node {}\nvar a = Node();\nvar b = Node();\na.next = b;\nb.next = a;").unwrap();
    let a = vm.global("a").and_then(|v| v.as_obj()).unwrap();
    let b = vm.global("b").and_then(|v| v.as_obj()).unwrap();

    run_in(&mut vm, "a = nil;\nb = nil;").unwrap();
    vm.collect_garbage();

    assert!(!vm.heap().is_live(a));
    assert!(!vm.heap().is_live(b));
}

/// Test: stress collection during compilation keeps earlier VM state
#[test]
fn test_stress_compilation_keeps_vm_state() {
    let mut vm = Vm::with_gc_config(GcConfig::default().with_stress(true));
    run_in(&mut vm, "var keep = \"kept\" + \" value\";").unwrap();
    let out = run_in(
        &mut vm,
        "fun a() { return \"x\"; }\nfun b() { return a() + \"y\"; }\nprint b();\nprint keep;",
    )
    .unwrap();
    assert_eq!(out, "xy\nkept value\n");
}

/// Test: a live heap handle survives NaN-boxing
#[test]
fn test_packed_heap_reference() {
    let mut vm = Vm::new();
    run_in(&mut vm, "var s = \"boxed\";").unwrap();
    let value = vm.global("s").unwrap();

    let packed = PackedValue::pack(value);
    assert!(packed.is_obj());
    assert!(!packed.is_number());
    assert_eq!(packed.unpack(), value);
    assert_eq!(vm.heap().render(packed.unpack()), "boxed");

    let number = PackedValue::pack(Value::Number(-2.5));
    assert!(number.is_number());
    assert_eq!(number.unpack(), Value::Number(-2.5));
}
