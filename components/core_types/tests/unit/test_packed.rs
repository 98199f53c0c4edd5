//! Property tests for the NaN-boxed encoding

use core_types::{ObjRef, PackedValue, Value};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_numbers_survive_packing(bits in any::<u64>()) {
        let n = f64::from_bits(bits);
        let packed = PackedValue::pack(Value::Number(n));
        prop_assert!(packed.is_number());
        match packed.unpack() {
            Value::Number(back) if n.is_nan() => prop_assert!(back.is_nan()),
            Value::Number(back) => prop_assert_eq!(back.to_bits(), n.to_bits()),
            other => prop_assert!(false, "number unpacked as {:?}", other),
        }
    }

    #[test]
    fn prop_handles_survive_packing(index in any::<u32>()) {
        let handle = ObjRef::from_index(index);
        let packed = PackedValue::pack(Value::Obj(handle));
        prop_assert!(packed.is_obj());
        prop_assert_eq!(packed.unpack(), Value::Obj(handle));
        prop_assert!(PackedValue::try_from_bits(packed.to_bits()).is_some());
    }
}

#[test]
fn test_booleans_and_nil() {
    assert_eq!(PackedValue::pack(Value::Bool(true)), PackedValue::TRUE);
    assert_eq!(PackedValue::pack(Value::Bool(false)), PackedValue::FALSE);
    assert_eq!(Value::from(PackedValue::NIL), Value::Nil);
    assert!(!PackedValue::NIL.is_number());
    assert!(!PackedValue::NIL.is_obj());
}
