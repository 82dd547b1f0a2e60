use ark_core::{resolve, ArkError, Expr, Ref, Spur, Value};
use serde_json::{json, Value as Json};

/// Serialize a compiled expression back to wire JSON.
///
/// Inverse of the reader up to its documented normalization: named refs and
/// intrinsics come back as bare symbol strings, single-element sequences
/// stay collapsed, and an omitted `else` stays omitted.
pub fn serialize(expr: &Expr) -> Result<Json, ArkError> {
    match expr {
        Expr::Lit(value) => serialize_literal(value),

        // A bare resolved reference (not under Get): the ref form.
        Expr::LocalRef { name, .. }
        | Expr::CaptureRef { name, .. }
        | Expr::GlobalRef { name, .. }
        | Expr::FreeRef { name, .. } => Ok(json!(["ref", resolve(*name)])),

        Expr::Property { name, obj } => Ok(json!(["ref", prop_json(*name, obj)?])),

        Expr::Get(inner) => match &**inner {
            named if named.ref_name().is_some() => {
                Ok(Json::String(resolve(named.ref_name().unwrap())))
            }
            Expr::Property { name, obj } => prop_json(*name, obj),
            other => Ok(json!(["get", serialize(other)?])),
        },

        Expr::Set(target, value) => {
            let target = match &**target {
                Expr::Property { name, obj } => prop_json(*name, obj)?,
                other => serialize(other)?,
            };
            Ok(json!(["set", target, serialize(value)?]))
        }

        Expr::ListLit(items) => {
            let mut out = vec![json!("list")];
            for item in items {
                out.push(serialize(item)?);
            }
            Ok(Json::Array(out))
        }

        Expr::MapLit(pairs) => {
            let mut out = vec![json!("map")];
            for (k, v) in pairs {
                out.push(json!([serialize(k)?, serialize(v)?]));
            }
            Ok(Json::Array(out))
        }

        Expr::ObjectLit(entries) => {
            let mut obj = serde_json::Map::new();
            for (name, value) in entries {
                obj.insert(resolve(*name), serialize(value)?);
            }
            Ok(Json::Object(obj))
        }

        Expr::Fn(def) => Ok(json!([
            "fn",
            params_json(&def.params),
            serialize(&def.body)?
        ])),

        Expr::Call { func, args } => {
            let mut out = vec![serialize(func)?];
            for arg in args {
                out.push(serialize(arg)?);
            }
            Ok(Json::Array(out))
        }

        Expr::Let { names, body } => Ok(json!(["let", params_json(names), serialize(body)?])),

        Expr::Seq(items) => {
            let mut out = vec![json!("seq")];
            for item in items {
                out.push(serialize(item)?);
            }
            Ok(Json::Array(out))
        }

        Expr::If { cond, then, else_ } => {
            let mut out = vec![json!("if"), serialize(cond)?, serialize(then)?];
            if let Some(else_) = else_ {
                out.push(serialize(else_)?);
            }
            Ok(Json::Array(out))
        }

        Expr::And(l, r) => Ok(json!(["and", serialize(l)?, serialize(r)?])),
        Expr::Or(l, r) => Ok(json!(["or", serialize(l)?, serialize(r)?])),

        Expr::Loop(body) => Ok(json!(["loop", serialize(body)?])),
    }
}

fn serialize_literal(value: &Value) -> Result<Json, ArkError> {
    match value {
        Value::Null => Ok(Json::Null),
        Value::Bool(b) => Ok(Json::Bool(*b)),
        Value::Num(n) => num_json(*n),
        Value::Str(s) => Ok(json!(["str", resolve(*s)])),
        // Named intrinsics come back as bare symbols.
        Value::NativeFn(f) if ark_stdlib::is_intrinsic_name(&f.name) => {
            Ok(Json::String(f.name.clone()))
        }
        Value::Ref(Ref::Cell(cell)) => match cell.get() {
            Value::Expr(e) => Ok(json!(["ref", serialize(&e)?])),
            other => Err(ArkError::compiler(format!(
                "cannot serialize a reference cell holding {}",
                other.type_name()
            ))),
        },
        other => Err(ArkError::compiler(format!(
            "cannot serialize a {} literal",
            other.type_name()
        ))),
    }
}

fn num_json(n: f64) -> Result<Json, ArkError> {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 9.007_199_254_740_992e15 {
        return Ok(json!(n as i64));
    }
    serde_json::Number::from_f64(n)
        .map(Json::Number)
        .ok_or_else(|| ArkError::compiler("cannot serialize a non-finite number"))
}

fn params_json(names: &[Spur]) -> Json {
    let mut out = vec![json!("params")];
    out.extend(names.iter().map(|n| Json::String(resolve(*n))));
    Json::Array(out)
}

fn prop_json(name: Spur, obj: &Expr) -> Result<Json, ArkError> {
    Ok(json!(["prop", resolve(name), serialize(obj)?]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_core::Namespace;
    use serde_json::json;

    fn round_trip(j: Json) -> Json {
        let ns = Namespace::new();
        ark_stdlib::register_globals(&ns);
        let compiled = crate::reader::compile(&j, &ns)
            .unwrap_or_else(|e| panic!("compile failed for {j}: {e}"));
        serialize(&compiled.expr).unwrap_or_else(|e| panic!("serialize failed for {j}: {e}"))
    }

    #[test]
    fn test_atoms_round_trip() {
        for j in [json!(null), json!(true), json!(false), json!(3), json!(2.5)] {
            assert_eq!(round_trip(j.clone()), j);
        }
    }

    #[test]
    fn test_str_and_symbols_round_trip() {
        assert_eq!(round_trip(json!(["str", "hi"])), json!(["str", "hi"]));
        assert_eq!(round_trip(json!("pi")), json!("pi"));
        assert_eq!(round_trip(json!("+")), json!("+"));
    }

    #[test]
    fn test_forms_round_trip() {
        for j in [
            json!(["+", 3, 4]),
            json!(["let", ["params", "a"], ["seq", ["set", ["ref", "a"], 3], "a"]]),
            json!([["fn", ["params", "x"], ["+", "x", 1]], 41]),
            json!(["loop", ["break", 5]]),
            json!(["if", true, 1, 2]),
            json!(["if", true, 1]),
            json!(["and", true, false]),
            json!(["or", false, true]),
            json!(["list", 1, 2, 3]),
            json!(["map", [["str", "k"], 1]]),
            json!(["prop", "length", ["list", 1, 2]]),
            json!({"a": 1}),
        ] {
            assert_eq!(round_trip(j.clone()), j);
        }
    }

    #[test]
    fn test_loop_serializes_as_loop() {
        // Regression guard: the loop tag must come back as "loop".
        let out = round_trip(json!(["loop", 1]));
        assert_eq!(out[0], json!("loop"));
    }

    #[test]
    fn test_single_element_seq_stays_collapsed() {
        assert_eq!(round_trip(json!(["seq", 42])), json!(42));
    }

    #[test]
    fn test_ref_to_expression_round_trips() {
        assert_eq!(round_trip(json!(["ref", ["+", 1, 2]])), json!(["ref", ["+", 1, 2]]));
    }

    #[test]
    fn test_method_sugar_normalizes_to_a_call() {
        let out = round_trip(json!(["prop", "get", ["list", 1, 2], 0]));
        assert_eq!(out, json!([["prop", "get", ["list", 1, 2]], 0]));
        // The normalized form is stable.
        assert_eq!(round_trip(out.clone()), out);
    }

    #[test]
    fn test_unserializable_literal_errors() {
        let expr = Expr::Lit(Value::list(vec![]));
        assert!(serialize(&expr).is_err());
    }
}
