use ark_core::check_arity;
use ark_core::{intern, ArkError, NativeFn, Namespace, NativeObject, Value};
use regex::Regex;

use crate::globals::expect_str;

/// A compiled regular expression with `test`/`exec` methods, produced by
/// the `RegExp` constructor.
#[derive(Debug)]
struct RegexAdapter {
    source: String,
    re: Regex,
}

impl NativeObject for RegexAdapter {
    fn type_name(&self) -> &'static str {
        "RegExp"
    }

    fn get_prop(&self, name: &str) -> Result<Value, ArkError> {
        match name {
            "source" => Ok(Value::str(&self.source)),
            "test" => {
                let re = self.re.clone();
                Ok(Value::native_fn(NativeFn::simple("RegExp.test", move |args| {
                    check_arity!(args, "RegExp.test", 1);
                    let text = expect_str(args, 0, "RegExp.test")?;
                    Ok(Value::Bool(re.is_match(&text)))
                })))
            }
            "exec" => {
                let re = self.re.clone();
                Ok(Value::native_fn(NativeFn::simple("RegExp.exec", move |args| {
                    check_arity!(args, "RegExp.exec", 1);
                    let text = expect_str(args, 0, "RegExp.exec")?;
                    match re.captures(&text) {
                        None => Ok(Value::Null),
                        Some(caps) => {
                            // Group 0 is the whole match; unmatched optional
                            // groups read as null.
                            let groups: Vec<Value> = caps
                                .iter()
                                .map(|m| match m {
                                    Some(m) => Value::str(m.as_str()),
                                    None => Value::Null,
                                })
                                .collect();
                            Ok(Value::list(groups))
                        }
                    }
                })))
            }
            other => Err(ArkError::runtime(format!("no property {other} on RegExp"))),
        }
    }
}

fn build_regex(pattern: &str, flags: &str) -> Result<Regex, ArkError> {
    let mut builder = regex::RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            other => {
                return Err(ArkError::host(format!("unsupported regex flag: {other}")));
            }
        }
    }
    builder
        .build()
        .map_err(|e| ArkError::host(format!("invalid regular expression: {e}")))
}

pub(crate) fn register(ns: &Namespace) {
    ns.define(
        intern("RegExp"),
        Value::native_fn(NativeFn::simple("RegExp", |args| {
            check_arity!(args, "RegExp", 1..=2);
            let pattern = expect_str(args, 0, "RegExp")?;
            let flags = if args.len() == 2 {
                expect_str(args, 1, "RegExp")?
            } else {
                String::new()
            };
            let re = build_regex(&pattern, &flags)?;
            Ok(Value::Native(std::rc::Rc::new(RegexAdapter {
                source: pattern,
                re,
            })))
        })),
    );
}
