use ark_core::{ArkError, Spur, Value};
use hashbrown::HashMap;

use crate::register_fn;

// The three non-local exits. Each raises its signal on the error channel;
// `loop` intercepts break/continue, a closure call intercepts return.

pub(crate) fn register(table: &mut HashMap<Spur, Value>) {
    register_fn(table, "break", |args| {
        Err(ArkError::BreakSignal(
            args.first().cloned().unwrap_or(Value::Null),
        ))
    });

    register_fn(table, "continue", |_args| Err(ArkError::ContinueSignal));

    register_fn(table, "return", |args| {
        Err(ArkError::ReturnSignal(
            args.first().cloned().unwrap_or(Value::Null),
        ))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup_intrinsic;
    use ark_core::{intern, EvalContext};

    fn call_err(name: &str, args: &[Value]) -> ArkError {
        let f = lookup_intrinsic(intern(name)).unwrap();
        let ctx = EvalContext::new();
        match f {
            Value::NativeFn(nf) => (nf.func)(&ctx, args).unwrap_err(),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_break_carries_payload() {
        match call_err("break", &[Value::Num(5.0)]) {
            ArkError::BreakSignal(v) => assert_eq!(v, Value::Num(5.0)),
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn test_break_defaults_to_null() {
        assert!(matches!(
            call_err("break", &[]),
            ArkError::BreakSignal(Value::Null)
        ));
        assert!(matches!(
            call_err("return", &[]),
            ArkError::ReturnSignal(Value::Null)
        ));
    }

    #[test]
    fn test_signals_are_signals() {
        assert!(call_err("continue", &[]).is_signal());
        assert!(call_err("return", &[Value::Null]).is_signal());
    }
}
