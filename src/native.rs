//! Host-provided functions registered in the global scope.

use std::rc::Rc;

use chrono::Utc;
use log::debug;

use crate::callable::{Callable, NativeFunction};
use crate::environment::Environment;
use crate::value::Value;

/// `clock()`: seconds since the Unix epoch, millisecond resolution.
pub fn clock() -> NativeFunction {
    NativeFunction {
        name: "clock",
        arity: 0,
        func: |_args: &[Value]| {
            let millis = Utc::now().timestamp_millis();
            debug!("clock() -> {} ms", millis);
            Ok(Value::Number(millis as f64 / 1000.0))
        },
    }
}

/// Install every native function into `globals`.
pub fn define_globals(globals: &mut Environment) {
    for native in [clock()] {
        let name = native.name;
        globals.define(name, Value::Callable(Callable::Native(Rc::new(native))));
    }
}
