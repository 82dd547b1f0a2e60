use ark_core::check_arity;
use ark_core::ffi::{coerce_to_num, to_int32, to_uint32};
use ark_core::{Spur, Value};
use hashbrown::HashMap;

use crate::register_fn;

// Operands pass through ToInt32/ToUint32 as in the host; shift counts are
// masked to five bits.

fn int_op(
    table: &mut HashMap<Spur, Value>,
    name: &'static str,
    op: impl Fn(i32, i32) -> i32 + 'static,
) {
    register_fn(table, name, move |args| {
        check_arity!(args, name, 2);
        let l = to_int32(coerce_to_num(&args[0]));
        let r = to_int32(coerce_to_num(&args[1]));
        Ok(Value::Num(op(l, r) as f64))
    });
}

pub(crate) fn register(table: &mut HashMap<Spur, Value>) {
    int_op(table, "&", |a, b| a & b);
    int_op(table, "|", |a, b| a | b);
    int_op(table, "^", |a, b| a ^ b);

    register_fn(table, "<<", |args| {
        check_arity!(args, "<<", 2);
        let l = to_int32(coerce_to_num(&args[0]));
        let count = to_uint32(coerce_to_num(&args[1]));
        Ok(Value::Num(l.wrapping_shl(count) as f64))
    });

    register_fn(table, ">>", |args| {
        check_arity!(args, ">>", 2);
        let l = to_int32(coerce_to_num(&args[0]));
        let count = to_uint32(coerce_to_num(&args[1]));
        Ok(Value::Num(l.wrapping_shr(count) as f64))
    });

    register_fn(table, ">>>", |args| {
        check_arity!(args, ">>>", 2);
        let l = to_uint32(coerce_to_num(&args[0]));
        let count = to_uint32(coerce_to_num(&args[1]));
        Ok(Value::Num(l.wrapping_shr(count) as f64))
    });

    register_fn(table, "~", |args| {
        check_arity!(args, "~", 1);
        Ok(Value::Num(!to_int32(coerce_to_num(&args[0])) as f64))
    });
}
