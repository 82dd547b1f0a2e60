use ark_core::{intern, ArkError, Namespace, NativeObject, Value};

/// The `process` global: command-line arguments and environment access.
#[derive(Debug)]
struct ProcessAdapter;

impl NativeObject for ProcessAdapter {
    fn type_name(&self) -> &'static str {
        "process"
    }

    fn get_prop(&self, name: &str) -> Result<Value, ArkError> {
        match name {
            "argv" => Ok(Value::list(
                std::env::args().map(|a| Value::str(&a)).collect(),
            )),
            "env" => Ok(Value::native(EnvAdapter)),
            other => Err(ArkError::runtime(format!("no property {other} on process"))),
        }
    }
}

/// `process.env`: property reads consult the environment; an unset
/// variable reads as null.
#[derive(Debug)]
struct EnvAdapter;

impl NativeObject for EnvAdapter {
    fn type_name(&self) -> &'static str {
        "env"
    }

    fn get_prop(&self, name: &str) -> Result<Value, ArkError> {
        Ok(std::env::var(name)
            .map(|v| Value::str(&v))
            .unwrap_or(Value::Null))
    }
}

pub(crate) fn register(ns: &Namespace) {
    ns.define(intern("process"), Value::native(ProcessAdapter));
}
