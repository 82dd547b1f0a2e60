mod arithmetic;
mod bitwise;
mod comparison;
mod control;
mod globals;
mod io;
mod json;
mod regex_ops;
mod system;

use std::cell::OnceCell;
use std::rc::Rc;

use ark_core::{intern, NativeFn, Spur, Value};
use hashbrown::HashMap;

pub use globals::register_globals;

/// Canonical list of all intrinsic names.
///
/// This is the single source of truth: the compiler consults the table
/// built from it, and the serializer uses it to emit intrinsic literals
/// back as bare symbols.
#[rustfmt::skip]
pub const INTRINSIC_NAMES: &[&str] = &[
    // unary
    "pos", "neg", "not", "~",
    // non-local exits
    "break", "continue", "return",
    // comparison
    "=", "!=", "<", "<=", ">", ">=",
    // arithmetic
    "+", "-", "*", "/", "%", "**",
    // bitwise
    "&", "|", "^", "<<", ">>", ">>>",
];

thread_local! {
    static INTRINSICS: OnceCell<HashMap<Spur, Value>> = const { OnceCell::new() };
}

fn build_intrinsics() -> HashMap<Spur, Value> {
    let mut table = HashMap::new();
    arithmetic::register(&mut table);
    comparison::register(&mut table);
    bitwise::register(&mut table);
    control::register(&mut table);
    debug_assert_eq!(table.len(), INTRINSIC_NAMES.len());
    table
}

/// Look up an intrinsic by interned name. The table is compile-time only:
/// the compiler inlines each hit as a literal at the reference site.
pub fn lookup_intrinsic(name: Spur) -> Option<Value> {
    INTRINSICS.with(|cell| cell.get_or_init(build_intrinsics).get(&name).cloned())
}

pub fn is_intrinsic_name(name: &str) -> bool {
    INTRINSIC_NAMES.contains(&name)
}

fn register_fn(
    table: &mut HashMap<Spur, Value>,
    name: &str,
    f: impl Fn(&[Value]) -> Result<Value, ark_core::ArkError> + 'static,
) {
    table.insert(
        intern(name),
        Value::NativeFn(Rc::new(NativeFn::simple(name, f))),
    );
}
