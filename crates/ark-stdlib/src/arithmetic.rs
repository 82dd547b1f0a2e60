use ark_core::check_arity;
use ark_core::ffi::coerce_to_num;
use ark_core::{intern, with_resolved, Spur, Value};
use hashbrown::HashMap;

use crate::register_fn;

/// Binary numeric operator over host-coerced operands. Division by zero
/// and NaN propagation follow IEEE, as the host does.
fn num_op(
    table: &mut HashMap<Spur, Value>,
    name: &'static str,
    op: impl Fn(f64, f64) -> f64 + 'static,
) {
    register_fn(table, name, move |args| {
        check_arity!(args, name, 2);
        Ok(Value::Num(op(
            coerce_to_num(&args[0]),
            coerce_to_num(&args[1]),
        )))
    });
}

pub(crate) fn register(table: &mut HashMap<Spur, Value>) {
    // `+` concatenates when both operands are strings, mirroring the host
    // operator; everything else is numeric.
    register_fn(table, "+", |args| {
        check_arity!(args, "+", 2);
        if let (Value::Str(a), Value::Str(b)) = (&args[0], &args[1]) {
            let joined =
                with_resolved(*a, |left| with_resolved(*b, |right| format!("{left}{right}")));
            return Ok(Value::Str(intern(&joined)));
        }
        Ok(Value::Num(coerce_to_num(&args[0]) + coerce_to_num(&args[1])))
    });

    num_op(table, "-", |a, b| a - b);
    num_op(table, "*", |a, b| a * b);
    num_op(table, "/", |a, b| a / b);
    num_op(table, "%", |a, b| a % b);
    num_op(table, "**", f64::powf);

    register_fn(table, "pos", |args| {
        check_arity!(args, "pos", 1);
        Ok(Value::Num(coerce_to_num(&args[0])))
    });

    register_fn(table, "neg", |args| {
        check_arity!(args, "neg", 1);
        Ok(Value::Num(-coerce_to_num(&args[0])))
    });
}
