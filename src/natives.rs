//! Built‑in global functions.

use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::callable::NativeFunction;
use crate::environment::Environment;
use crate::interpreter::Interpreter;
use crate::value::Value;

const NATIVES: [NativeFunction; 2] = [
    NativeFunction {
        name: "print",
        arity: 1,
        func: print,
    },
    NativeFunction {
        name: "clock",
        arity: 0,
        func: clock,
    },
];

/// Install every built‑in into `globals`.
pub fn define_globals(globals: &mut Environment) {
    for native in NATIVES {
        debug!("Defining native function '{}'", native.name);

        globals.define(native.name, Value::Native(Rc::new(native)));
    }
}

/// `print(value)`: write the display form of `value` and a newline.
fn print(interpreter: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
    let text: String = args.first().map(Value::to_string).unwrap_or_default();

    interpreter
        .write_line(&text)
        .map_err(|e| format!("Print error: {}", e))?;

    Ok(Value::Nil)
}

/// `clock()`: seconds since the Unix epoch, with sub‑second precision.
fn clock(_interpreter: &mut Interpreter, _args: &[Value]) -> Result<Value, String> {
    let now = Utc::now();
    let seconds: f64 = now.timestamp_millis() as f64 / 1000.0;

    info!("Native function 'clock' returned: {}", seconds);

    Ok(Value::Number(seconds))
}
