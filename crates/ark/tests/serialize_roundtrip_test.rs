use ark::{compile, serialize, Namespace};
use proptest::prelude::*;
use serde_json::{json, Value as Json};

fn round_trip(j: &Json) -> Json {
    let ns = Namespace::new();
    ark::register_globals(&ns);
    let compiled = compile(j, &ns).unwrap_or_else(|e| panic!("compile failed for {j}: {e}"));
    serialize(&compiled.expr).unwrap_or_else(|e| panic!("serialize failed for {j}: {e}"))
}

#[test]
fn seed_programs_round_trip() {
    for j in [
        json!(["+", 3, 4]),
        json!(["seq", ["let", ["params", "a"], ["seq", ["set", ["ref", "a"], 3], "a"]], null]),
        json!([["fn", ["params", "x"], ["+", "x", 1]], 41]),
        json!(["loop", ["break", 5]]),
        json!(["list", 1, 2, 3]),
        json!(["prop", "length", ["list", 1, 2, 3]]),
        json!(["if", ["<=", "pi", 1], 1, 2]),
        json!(["and", true, ["or", false, null]]),
        json!(["map", [["str", "k"], ["str", "v"]], [1, 2]]),
        json!({"a": ["str", "x"], "b": ["list"]}),
        json!(["fn", ["params"], ["return", 1]]),
        json!(["set", ["prop", "a", {"a": 1}], 2]),
        json!(["ref", ["prop", "a", {"a": 1}]]),
    ] {
        assert_eq!(round_trip(&j), j, "round trip changed: {j}");
    }
}

#[test]
fn factorial_round_trips() {
    // The recursive seed program in canonical form: the single-element seq
    // collapsed and symbol reads as bare strings.
    let j = json!(["let", ["params", "fac"],
        ["seq",
            ["set", ["ref", "fac"],
                ["fn", ["params", "n"],
                    ["if", ["<=", "n", 1], 1, ["*", "n", ["fac", ["-", "n", 1]]]]]],
            ["fac", 5]]]);
    assert_eq!(round_trip(&j), j);
}

#[test]
fn normalizations_are_stable() {
    // Every normalization the serializer applies must be a fixed point.
    for j in [
        json!(["seq", 42]),
        json!(["prop", "get", ["list", 1], 0]),
        json!(["get", "pi"]),
        json!(["get", ["prop", "a", {"a": 1}]]),
    ] {
        let once = round_trip(&j);
        let twice = round_trip(&once);
        assert_eq!(once, twice, "normalization not stable for {j}");
    }
}

#[test]
fn get_of_symbol_flattens_to_bare_string() {
    assert_eq!(round_trip(&json!(["get", "pi"])), json!("pi"));
    assert_eq!(round_trip(&json!("pi")), json!("pi"));
}

proptest! {
    #[test]
    fn round_trip_integers(n in any::<i32>()) {
        let j = json!(n);
        prop_assert_eq!(round_trip(&j), j);
    }

    #[test]
    fn round_trip_string_literals(s in ".{0,40}") {
        let j = json!(["str", s]);
        prop_assert_eq!(round_trip(&j), j);
    }

    #[test]
    fn round_trip_number_lists(ns in proptest::collection::vec(any::<i32>(), 0..8)) {
        let mut form = vec![json!("list")];
        form.extend(ns.iter().map(|n| json!(n)));
        let j = Json::Array(form);
        prop_assert_eq!(round_trip(&j), j);
    }

    #[test]
    fn round_trip_binary_ops(
        op in proptest::sample::select(vec!["+", "-", "*", "/", "%", "<", "<=", "=", "&", "|"]),
        a in any::<i16>(),
        b in any::<i16>(),
    ) {
        let j = json!([op, a, b]);
        prop_assert_eq!(round_trip(&j), j);
    }
}
