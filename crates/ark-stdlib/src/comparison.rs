use std::cmp::Ordering;

use ark_core::check_arity;
use ark_core::ffi::{coerce_to_bool, coerce_to_num};
use ark_core::{compare_spurs, Spur, Value};
use hashbrown::HashMap;

use crate::register_fn;

/// Host-style ordering: two strings compare lexicographically, everything
/// else numerically. `None` means incomparable (NaN involved), which makes
/// every ordering operator false.
fn host_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Value::Str(l), Value::Str(r)) = (a, b) {
        return Some(compare_spurs(*l, *r));
    }
    coerce_to_num(a).partial_cmp(&coerce_to_num(b))
}

fn cmp_op(
    table: &mut HashMap<Spur, Value>,
    name: &'static str,
    accept: impl Fn(Ordering) -> bool + 'static,
) {
    register_fn(table, name, move |args| {
        check_arity!(args, name, 2);
        Ok(Value::Bool(
            host_cmp(&args[0], &args[1]).is_some_and(&accept),
        ))
    });
}

pub(crate) fn register(table: &mut HashMap<Spur, Value>) {
    register_fn(table, "=", |args| {
        check_arity!(args, "=", 2);
        Ok(Value::Bool(args[0].identical(&args[1])))
    });

    register_fn(table, "!=", |args| {
        check_arity!(args, "!=", 2);
        Ok(Value::Bool(!args[0].identical(&args[1])))
    });

    cmp_op(table, "<", Ordering::is_lt);
    cmp_op(table, "<=", Ordering::is_le);
    cmp_op(table, ">", Ordering::is_gt);
    cmp_op(table, ">=", Ordering::is_ge);

    register_fn(table, "not", |args| {
        check_arity!(args, "not", 1);
        Ok(Value::Bool(!coerce_to_bool(&args[0])))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup_intrinsic;
    use ark_core::{intern, EvalContext};

    fn call(name: &str, args: &[Value]) -> Value {
        let f = lookup_intrinsic(intern(name)).unwrap();
        let ctx = EvalContext::new();
        match f {
            Value::NativeFn(nf) => (nf.func)(&ctx, args).unwrap(),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_numeric_ordering() {
        assert_eq!(call("<", &[Value::Num(1.0), Value::Num(2.0)]), Value::Bool(true));
        assert_eq!(call(">=", &[Value::Num(2.0), Value::Num(2.0)]), Value::Bool(true));
    }

    #[test]
    fn test_string_ordering_is_lexicographic() {
        assert_eq!(call("<", &[Value::str("apple"), Value::str("banana")]), Value::Bool(true));
        assert_eq!(call(">", &[Value::str("10"), Value::str("9")]), Value::Bool(false));
    }

    #[test]
    fn test_nan_comparisons_are_false() {
        let nan = Value::Num(f64::NAN);
        for op in ["<", "<=", ">", ">="] {
            assert_eq!(call(op, &[nan.clone(), Value::Num(1.0)]), Value::Bool(false));
        }
    }

    #[test]
    fn test_equality_is_identity() {
        assert_eq!(call("=", &[Value::str("a"), Value::str("a")]), Value::Bool(true));
        let l1 = Value::list(vec![]);
        let l2 = Value::list(vec![]);
        assert_eq!(call("=", &[l1.clone(), l1.clone()]), Value::Bool(true));
        assert_eq!(call("=", &[l1, l2]), Value::Bool(false));
    }

    #[test]
    fn test_not() {
        assert_eq!(call("not", &[Value::Null]), Value::Bool(true));
        assert_eq!(call("not", &[Value::Num(1.0)]), Value::Bool(false));
    }
}
