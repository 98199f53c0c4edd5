//! Unit tests for StackFrame rendering

use core_types::{StackFrame, StackTrace};

#[test]
fn test_function_frame() {
    let frame = StackFrame {
        function_name: Some("makeCounter".to_string()),
        line: Some(7),
    };
    assert_eq!(frame.to_string(), "[line 7] in makeCounter()");
}

#[test]
fn test_script_frame() {
    let frame = StackFrame {
        function_name: None,
        line: Some(1),
    };
    assert_eq!(frame.to_string(), "[line 1] in script");
}

#[test]
fn test_empty_trace_renders_nothing() {
    assert_eq!(StackTrace(&[]).to_string(), "");
}
