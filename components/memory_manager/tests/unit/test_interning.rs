//! Interning properties

use core_types::Value;
use memory_manager::{Heap, NoRoots, ObjType};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_equal_content_same_identity(s in ".*") {
        let mut heap = Heap::new();
        let copy = s.clone();
        let a = heap.intern(&s, &NoRoots);
        let b = heap.intern(&copy, &NoRoots);
        prop_assert_eq!(a, b);
        prop_assert_eq!(heap.as_str(a), s.as_str());
    }

    #[test]
    fn prop_different_content_different_identity(s in ".*", t in ".*") {
        prop_assume!(s != t);
        let mut heap = Heap::new();
        let a = heap.intern(&s, &NoRoots);
        let b = heap.intern(&t, &NoRoots);
        prop_assert_ne!(a, b);
    }
}

#[test]
fn test_interned_strings_report_their_kind() {
    let mut heap = Heap::new();
    let s = heap.intern("name", &NoRoots);
    assert!(heap.is_obj_type(Value::Obj(s), ObjType::String));
    assert_eq!(heap.string_value(Value::Obj(s)), Some("name"));
    assert_eq!(heap.string_value(Value::Number(1.0)), None);
    assert_eq!(heap.interned("name"), Some(s));
    assert_eq!(heap.interned("other"), None);
}

#[test]
fn test_collected_string_is_reinterned_fresh() {
    let mut heap = Heap::new();
    heap.intern("temp", &NoRoots);
    assert_eq!(heap.interned_count(), 1);
    heap.collect(&NoRoots);
    assert_eq!(heap.interned_count(), 0);
    assert_eq!(heap.interned("temp"), None);
    let again = heap.intern("temp", &NoRoots);
    assert!(heap.is_live(again));
}

#[test]
fn test_stress_mode_keeps_rooted_strings() {
    let mut heap = Heap::new();
    heap.set_stress(true);
    let mut roots = Vec::new();
    for i in 0..50 {
        let s = heap.intern(&format!("s{}", i), &roots);
        roots.push(Value::Obj(s));
    }
    for (i, root) in roots.iter().enumerate() {
        assert_eq!(heap.string_value(*root), Some(format!("s{}", i).as_str()));
    }
    assert!(heap.stats().collections >= 50);
}
