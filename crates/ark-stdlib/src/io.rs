use ark_core::check_arity;
use ark_core::{intern, ArkError, NativeFn, Namespace, NativeObject, Value};

use crate::globals::expect_str;

/// The `fs` global: a thin adapter over the host filesystem.
#[derive(Debug)]
struct FsAdapter;

impl NativeObject for FsAdapter {
    fn type_name(&self) -> &'static str {
        "fs"
    }

    fn get_prop(&self, name: &str) -> Result<Value, ArkError> {
        match name {
            "readFile" => Ok(Value::native_fn(NativeFn::simple("fs.readFile", |args| {
                check_arity!(args, "fs.readFile", 1);
                let path = expect_str(args, 0, "fs.readFile")?;
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| ArkError::Io(format!("fs.readFile {path}: {e}")))?;
                Ok(Value::str(&contents))
            }))),
            "writeFile" => Ok(Value::native_fn(NativeFn::simple(
                "fs.writeFile",
                |args| {
                    check_arity!(args, "fs.writeFile", 2);
                    let path = expect_str(args, 0, "fs.writeFile")?;
                    let contents = expect_str(args, 1, "fs.writeFile")?;
                    std::fs::write(&path, contents)
                        .map_err(|e| ArkError::Io(format!("fs.writeFile {path}: {e}")))?;
                    Ok(Value::Null)
                },
            ))),
            "exists" => Ok(Value::native_fn(NativeFn::simple("fs.exists", |args| {
                check_arity!(args, "fs.exists", 1);
                let path = expect_str(args, 0, "fs.exists")?;
                Ok(Value::Bool(std::path::Path::new(&path).exists()))
            }))),
            other => Err(ArkError::runtime(format!("no property {other} on fs"))),
        }
    }
}

pub(crate) fn register(ns: &Namespace) {
    ns.define(intern("fs"), Value::native(FsAdapter));
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_core::EvalContext;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_file() -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!("ark-io-test-{}-{}", std::process::id(), id))
    }

    fn call(name: &str, args: &[Value]) -> Result<Value, ArkError> {
        let f = FsAdapter.get_prop(name).unwrap();
        let ctx = EvalContext::new();
        match f {
            Value::NativeFn(nf) => (nf.func)(&ctx, args),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_write_then_read() {
        let path = temp_file();
        let path_str = path.to_string_lossy().to_string();
        call("writeFile", &[Value::str(&path_str), Value::str("hello")]).unwrap();
        assert_eq!(
            call("readFile", &[Value::str(&path_str)]).unwrap(),
            Value::str("hello")
        );
        assert_eq!(
            call("exists", &[Value::str(&path_str)]).unwrap(),
            Value::Bool(true)
        );
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let path = temp_file();
        let err = call("readFile", &[Value::str(&path.to_string_lossy())]).unwrap_err();
        assert!(matches!(err, ArkError::Io(_)));
        assert_eq!(
            call("exists", &[Value::str(&path.to_string_lossy())]).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_path_must_be_a_string() {
        assert!(matches!(
            call("readFile", &[Value::Num(1.0)]),
            Err(ArkError::Type { .. })
        ));
    }
}
