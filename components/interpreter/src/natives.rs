//! Host functions available to every script.

use std::sync::OnceLock;
use std::time::Instant;

use core_types::Value;

use crate::vm::Vm;

static START: OnceLock<Instant> = OnceLock::new();

pub(crate) fn install(vm: &mut Vm) {
    START.get_or_init(Instant::now);
    vm.define_native("clock", clock);
}

/// Seconds elapsed since the first VM was created.
pub fn clock(_args: &[Value]) -> Result<Value, String> {
    let start = START.get_or_init(Instant::now);
    Ok(Value::Number(start.elapsed().as_secs_f64()))
}
