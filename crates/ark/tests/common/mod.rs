use ark::{ArkError, ArkState, Value};

/// Evaluate a JSON program with the standard globals.
pub fn eval_src(input: &str) -> Value {
    let state = ArkState::new();
    state
        .eval_json(input)
        .unwrap_or_else(|e| panic!("evaluation failed for `{input}`: {e}"))
}

/// Evaluate and project the result through the strict host conversion.
pub fn eval_host(input: &str) -> serde_json::Value {
    let result = eval_src(input);
    ark::ffi::to_host(&result)
        .unwrap_or_else(|e| panic!("host conversion failed for `{input}`: {e}"))
}

/// Evaluate, expecting an error.
pub fn eval_err(input: &str) -> ArkError {
    let state = ArkState::new();
    state
        .eval_json(input)
        .err()
        .unwrap_or_else(|| panic!("expected error for: {input}"))
}

/// Generate evaluation tests comparing host-side results.
///
/// Usage:
/// ```ignore
/// host_eval_tests! {
///     test_name: r#"["+", 3, 4]"# => 7,
/// }
/// ```
#[macro_export]
macro_rules! host_eval_tests {
    ($($name:ident : $input:expr => $expected:tt),* $(,)?) => {
        $(
            paste::paste! {
                #[test]
                fn [<eval_ $name>]() {
                    let result = common::eval_host($input);
                    assert_eq!(result, serde_json::json!($expected), "program: {}", $input);
                }
            }
        )*
    };
}
