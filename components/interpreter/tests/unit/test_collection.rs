//! Collector behaviour under a running VM

use core_types::Value;
use interpreter::Vm;
use memory_manager::{GcConfig, MarkColor};

use super::run_in;

const PROGRAM: &str = "
    class Node {
        init(value) { this.value = value; this.next = nil; }
        describe() { return \"node \" + this.value; }
    }
    class Tagged < Node {
        describe() { return super.describe() + \"!\"; }
    }
    fun chain(n) {
        var head = nil;
        for (var i = 0; i < n; i = i + 1) {
            var node = Tagged(i);
            node.next = head;
            head = node;
        }
        return head;
    }
    fun adder(k) { fun add(x) { return x + k; } return add; }
    var list = chain(20);
    var total = 0;
    while (list != nil) { total = adder(total)(list.value); list = list.next; }
    print total;
    print Tagged(\"x\").describe();
";

#[test]
fn test_stress_mode_preserves_semantics() {
    let mut normal = Vm::new();
    let expected = run_in(&mut normal, PROGRAM).unwrap();
    assert_eq!(expected, "190\nnode x!\n");

    let mut stressed = Vm::with_gc_config(GcConfig::default().with_stress(true));
    assert_eq!(run_in(&mut stressed, PROGRAM).unwrap(), expected);
    assert!(stressed.heap().stats().collections > 100);
    assert!(stressed.heap().stats().objects_freed > 0);
}

#[test]
fn test_small_threshold_preserves_semantics() {
    let config = GcConfig::default()
        .with_initial_threshold(256)
        .with_grow_factor(1);
    let mut vm = Vm::with_gc_config(config);
    assert_eq!(run_in(&mut vm, PROGRAM).unwrap(), "190\nnode x!\n");
    assert!(vm.heap().stats().collections > 0);
}

#[test]
fn test_unrooted_cycle_is_freed() {
    let setup = "class Node {}";
    let cycle = "
        class Node {}
        {
            var a = Node();
            var b = Node();
            a.other = b;
            b.other = a;
            fun f() { return b; }
            a.f = f;
        }
    ";

    let mut baseline = Vm::new();
    run_in(&mut baseline, setup).unwrap();
    baseline.collect_garbage();

    let mut vm = Vm::new();
    run_in(&mut vm, cycle).unwrap();
    vm.collect_garbage();

    assert_eq!(vm.heap().object_count(), baseline.heap().object_count());
}

#[test]
fn test_rooted_cycle_survives_with_marks_cleared() {
    let mut vm = Vm::new();
    run_in(&mut vm, "class Node {} var keep = Node(); keep.self = keep;").unwrap();
    vm.collect_garbage();

    let Some(Value::Obj(keep)) = vm.global("keep") else {
        panic!("keep is not an object");
    };
    assert!(vm.heap().is_live(keep));
    assert_eq!(vm.heap().mark_color(keep), Some(MarkColor::White));
    assert_eq!(run_in(&mut vm, "print keep.self.self;").unwrap(), "Node instance\n");
}

#[test]
fn test_concatenated_strings_are_collected() {
    let mut vm = Vm::new();
    run_in(&mut vm, "for (var i = 0; i < 50; i = i + 1) { var s = \"n\" + i; }").unwrap();
    let before = vm.heap().interned_count();
    vm.collect_garbage();
    assert!(vm.heap().interned_count() < before);
    assert_eq!(vm.heap().interned("n3"), None);
}
