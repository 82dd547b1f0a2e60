use ark_core::check_arity;
use ark_core::ffi::{from_host, to_host};
use ark_core::{intern, ArkError, NativeFn, Namespace, NativeObject, Value};

use crate::globals::expect_str;

/// The `JSON` global: `parse` and `stringify` over the host boundary.
#[derive(Debug)]
struct JsonAdapter;

impl NativeObject for JsonAdapter {
    fn type_name(&self) -> &'static str {
        "JSON"
    }

    fn get_prop(&self, name: &str) -> Result<Value, ArkError> {
        match name {
            "parse" => Ok(Value::native_fn(NativeFn::simple("JSON.parse", |args| {
                check_arity!(args, "JSON.parse", 1);
                let text = expect_str(args, 0, "JSON.parse")?;
                let json: serde_json::Value = serde_json::from_str(&text)
                    .map_err(|e| ArkError::host(format!("JSON.parse: {e}")))?;
                Ok(from_host(&json))
            }))),
            "stringify" => Ok(Value::native_fn(NativeFn::simple(
                "JSON.stringify",
                |args| {
                    check_arity!(args, "JSON.stringify", 1);
                    let json = to_host(&args[0])?;
                    Ok(Value::str(&json.to_string()))
                },
            ))),
            other => Err(ArkError::runtime(format!("no property {other} on JSON"))),
        }
    }
}

pub(crate) fn register(ns: &Namespace) {
    ns.define(intern("JSON"), Value::native(JsonAdapter));
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_core::EvalContext;

    fn method(name: &str) -> Value {
        JsonAdapter.get_prop(name).unwrap()
    }

    fn call(f: &Value, args: &[Value]) -> Result<Value, ArkError> {
        let ctx = EvalContext::new();
        match f {
            Value::NativeFn(nf) => (nf.func)(&ctx, args),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_parse_then_stringify() {
        let parse = method("parse");
        let stringify = method("stringify");
        let v = call(&parse, &[Value::str(r#"{"a":[1,2]}"#)]).unwrap();
        let s = call(&stringify, &[v]).unwrap();
        assert_eq!(s, Value::str(r#"{"a":[1,2]}"#));
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        let err = call(&method("parse"), &[Value::str("{nope")]).unwrap_err();
        assert!(matches!(err, ArkError::HostConversion(_)));
    }

    #[test]
    fn test_stringify_rejects_functions() {
        let f = Value::native_fn(NativeFn::simple("f", |_| Ok(Value::Null)));
        assert!(call(&method("stringify"), &[f]).is_err());
    }

    #[test]
    fn test_unknown_property_errors() {
        assert!(JsonAdapter.get_prop("eval").is_err());
    }
}
