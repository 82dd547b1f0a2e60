use ark_core::check_arity;
use ark_core::ffi::to_host_lossy;
use ark_core::{intern, ArkError, NativeFn, Namespace, Value};

use crate::{io, json, regex_ops, system};

/// Seed a namespace with the standard initial bindings: the numeric
/// constants, `print`/`debug`, and the host-object adapters.
pub fn register_globals(ns: &Namespace) {
    ns.define(intern("pi"), Value::Num(std::f64::consts::PI));
    ns.define(intern("e"), Value::Num(std::f64::consts::E));

    register_global_fn(ns, "print", |args| {
        check_arity!(args, "print", 1);
        match &args[0] {
            // Strings print unquoted.
            Value::Str(s) => ark_core::with_resolved(*s, |raw| println!("{raw}")),
            other => println!("{}", to_host_lossy(other)),
        }
        Ok(Value::Null)
    });

    register_global_fn(ns, "debug", |args| {
        check_arity!(args, "debug", 1);
        eprintln!("{}", args[0]);
        Ok(Value::Null)
    });

    json::register(ns);
    io::register(ns);
    system::register(ns);
    regex_ops::register(ns);
}

pub(crate) fn register_global_fn(
    ns: &Namespace,
    name: &str,
    f: impl Fn(&[Value]) -> Result<Value, ArkError> + 'static,
) {
    ns.define(intern(name), Value::native_fn(NativeFn::simple(name, f)));
}

/// Extract a required string argument for a native function.
pub(crate) fn expect_str(args: &[Value], index: usize, name: &str) -> Result<String, ArkError> {
    args[index].as_str().ok_or_else(|| {
        ArkError::type_error("string", format!("{} ({name})", args[index].type_name()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_are_bound() {
        let ns = Namespace::new();
        register_globals(&ns);
        let pi = ns.get(intern("pi")).unwrap().get();
        assert_eq!(pi, Value::Num(std::f64::consts::PI));
        assert!(ns.contains(intern("print")));
        assert!(ns.contains(intern("JSON")));
        assert!(ns.contains(intern("fs")));
        assert!(ns.contains(intern("process")));
        assert!(ns.contains(intern("RegExp")));
    }
}
