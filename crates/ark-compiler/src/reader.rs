use std::rc::Rc;

use ark_core::{
    intern, ArkError, CellRef, Compiled, Expr, FnDef, Namespace, Ref, Spur, Value,
};
use serde_json::Value as Json;

use crate::resolve::{Resolution, Resolver};

/// Compile a decoded JSON document against an externals namespace
/// (typically the globals). Unresolved symbols do not fail compilation;
/// they are reported in the returned free-variable map and refused by
/// `ArkState::run`.
pub fn compile(json: &Json, externals: &Namespace) -> Result<Compiled, ArkError> {
    let mut compiler = Compiler {
        resolver: Resolver::new(externals),
    };
    let expr = compiler.expr(json)?;
    let free_vars = compiler.resolver.into_free_vars();
    tracing::debug!(free_vars = free_vars.len(), "compiled program");
    Ok(Compiled { expr, free_vars })
}

/// Parse a JSON source string and compile it.
pub fn compile_str(src: &str, externals: &Namespace) -> Result<Compiled, ArkError> {
    let json: Json =
        serde_json::from_str(src).map_err(|e| ArkError::compiler(format!("invalid JSON: {e}")))?;
    compile(&json, externals)
}

struct Compiler<'a> {
    resolver: Resolver<'a>,
}

fn is_prop_form(items: &[Json]) -> bool {
    matches!(items.first(), Some(Json::String(tag)) if tag == "prop")
}

impl Compiler<'_> {
    /// Compile in value position.
    fn expr(&mut self, json: &Json) -> Result<Expr, ArkError> {
        match json {
            Json::Null => Ok(Expr::Lit(Value::Null)),
            Json::Bool(b) => Ok(Expr::Lit(Value::Bool(*b))),
            Json::Number(n) => {
                let n = n
                    .as_f64()
                    .ok_or_else(|| ArkError::compiler(format!("unrepresentable number: {n}")))?;
                Ok(Expr::Lit(Value::Num(n)))
            }
            // A bare string is a symbol reference; in value position it
            // reads its binding.
            Json::String(name) => Ok(self.sym_value(name)),
            Json::Array(items) => self.form(items),
            Json::Object(fields) => {
                let mut entries = Vec::with_capacity(fields.len());
                for (key, value) in fields {
                    entries.push((intern(key), self.expr(value)?));
                }
                Ok(Expr::ObjectLit(entries))
            }
        }
    }

    /// Resolve a symbol to the expression producing its reference (or the
    /// inlined intrinsic literal).
    fn sym_ref(&mut self, name: &str) -> Expr {
        let spur = intern(name);
        match self.resolver.resolve(spur) {
            Resolution::Intrinsic(v) => Expr::Lit(v),
            Resolution::Local { index } => Expr::LocalRef {
                name: spur,
                level: 0,
                index,
            },
            Resolution::Capture { index } => Expr::CaptureRef { name: spur, index },
            Resolution::Global { cell } => Expr::GlobalRef { name: spur, cell },
            Resolution::Free { cell } => Expr::FreeRef { name: spur, cell },
        }
    }

    /// A symbol in value position: dereference its binding. Intrinsics are
    /// values, not refs, so they pass through bare.
    fn sym_value(&mut self, name: &str) -> Expr {
        match self.sym_ref(name) {
            lit @ Expr::Lit(_) => lit,
            reference => Expr::Get(Box::new(reference)),
        }
    }

    /// Compile a `["prop", name, obj]` form to a bare `Property` node
    /// (reference position, no `Get` wrapper).
    fn prop_ref(&mut self, items: &[Json]) -> Result<Expr, ArkError> {
        if items.len() != 3 {
            return Err(ArkError::compiler(format!(
                "prop expects 2 arguments, got {}",
                items.len() - 1
            )));
        }
        let name = match &items[1] {
            Json::String(s) => intern(s),
            other => {
                return Err(ArkError::compiler(format!(
                    "prop: property name must be a string, got {other}"
                )))
            }
        };
        let obj = self.expr(&items[2])?;
        Ok(Expr::Property {
            name,
            obj: Box::new(obj),
        })
    }

    /// Compile the argument of `"ref"` / the left side of `"set"`:
    /// a bare string resolves to its reference, a prop form stays a bare
    /// `Property`, anything else compiles normally.
    fn ref_pos(&mut self, json: &Json) -> Result<Expr, ArkError> {
        match json {
            Json::String(name) => Ok(self.sym_ref(name)),
            Json::Array(items) if is_prop_form(items) => self.prop_ref(items),
            other => self.expr(other),
        }
    }

    /// Parse a `["params", name…]` list. Names must be strings and unique.
    fn params(&mut self, json: &Json) -> Result<Vec<Spur>, ArkError> {
        let items = match json {
            Json::Array(items) => items,
            other => {
                return Err(ArkError::compiler(format!(
                    "expected parameter list, got {other}"
                )))
            }
        };
        if !matches!(items.first(), Some(Json::String(tag)) if tag == "params") {
            return Err(ArkError::compiler(
                "parameter list must start with \"params\"",
            ));
        }
        let mut names = Vec::with_capacity(items.len() - 1);
        for item in &items[1..] {
            let name = match item {
                Json::String(s) => intern(s),
                other => {
                    return Err(ArkError::compiler(format!(
                        "parameter name must be a string, got {other}"
                    )))
                }
            };
            if names.contains(&name) {
                return Err(ArkError::compiler(format!(
                    "duplicate parameter name: {}",
                    ark_core::resolve(name)
                )));
            }
            names.push(name);
        }
        Ok(names)
    }

    fn exprs(&mut self, items: &[Json]) -> Result<Vec<Expr>, ArkError> {
        items.iter().map(|e| self.expr(e)).collect()
    }

    fn arity(items: &[Json], tag: &str, expected: usize) -> Result<(), ArkError> {
        if items.len() - 1 != expected {
            return Err(ArkError::compiler(format!(
                "{tag} expects {expected} argument{}, got {}",
                if expected == 1 { "" } else { "s" },
                items.len() - 1
            )));
        }
        Ok(())
    }

    /// Dispatch a form on its first element.
    fn form(&mut self, items: &[Json]) -> Result<Expr, ArkError> {
        let head = match items.first() {
            Some(head) => head,
            None => return Err(ArkError::compiler("empty form")),
        };

        let tag = match head {
            Json::String(tag) => tag.as_str(),
            // Non-symbol head: a call.
            _ => return self.call(head, &items[1..]),
        };

        match tag {
            "str" => {
                Self::arity(items, "str", 1)?;
                match &items[1] {
                    Json::String(raw) => Ok(Expr::Lit(Value::str(raw))),
                    other => Err(ArkError::compiler(format!(
                        "str expects a raw string, got {other}"
                    ))),
                }
            }

            "let" => {
                Self::arity(items, "let", 2)?;
                let names = self.params(&items[1])?;
                let saved = self.resolver.push_locals(&names);
                let body = self.expr(&items[2]);
                self.resolver.truncate_locals(saved);
                Ok(Expr::Let {
                    names,
                    body: Box::new(body?),
                })
            }

            "fn" => {
                Self::arity(items, "fn", 2)?;
                let params = self.params(&items[1])?;
                self.resolver.push_frame(params.clone());
                let body = self.expr(&items[2]);
                let captures = self.resolver.pop_frame();
                Ok(Expr::Fn(Rc::new(FnDef {
                    params,
                    captures,
                    body: body?,
                })))
            }

            "prop" => {
                // In value position a property access dereferences; extra
                // trailing arguments are method-call sugar.
                if items.len() < 3 {
                    return Err(ArkError::compiler(format!(
                        "prop expects at least 2 arguments, got {}",
                        items.len() - 1
                    )));
                }
                let prop = self.prop_ref(&items[..3])?;
                let get = Expr::Get(Box::new(prop));
                if items.len() == 3 {
                    Ok(get)
                } else {
                    Ok(Expr::Call {
                        func: Box::new(get),
                        args: self.exprs(&items[3..])?,
                    })
                }
            }

            "ref" => {
                Self::arity(items, "ref", 1)?;
                match &items[1] {
                    Json::String(name) => Ok(self.sym_ref(name)),
                    Json::Array(inner) if is_prop_form(inner) => self.prop_ref(inner),
                    other => {
                        // A ref to an arbitrary expression: a cell holding
                        // the compiled expression as a value.
                        let compiled = self.expr(other)?;
                        let cell = CellRef::new(Value::Expr(Rc::new(compiled)));
                        Ok(Expr::Lit(Value::Ref(Ref::Cell(cell))))
                    }
                }
            }

            "get" => {
                if items.len() < 2 {
                    return Err(ArkError::compiler("get expects at least 1 argument"));
                }
                let base = match &items[1] {
                    Json::String(name) => self.sym_value(name),
                    Json::Array(inner) if is_prop_form(inner) => {
                        Expr::Get(Box::new(self.prop_ref(inner)?))
                    }
                    other => Expr::Get(Box::new(self.expr(other)?)),
                };
                if items.len() == 2 {
                    Ok(base)
                } else {
                    // Method-call sugar: extra arguments apply the result.
                    Ok(Expr::Call {
                        func: Box::new(base),
                        args: self.exprs(&items[2..])?,
                    })
                }
            }

            "set" => {
                Self::arity(items, "set", 2)?;
                let target = self.ref_pos(&items[1])?;
                let value = self.expr(&items[2])?;
                Ok(Expr::Set(Box::new(target), Box::new(value)))
            }

            "list" => Ok(Expr::ListLit(self.exprs(&items[1..])?)),

            "map" => {
                let mut pairs = Vec::with_capacity(items.len() - 1);
                for item in &items[1..] {
                    match item {
                        Json::Array(pair) if pair.len() == 2 => {
                            pairs.push((self.expr(&pair[0])?, self.expr(&pair[1])?));
                        }
                        other => {
                            return Err(ArkError::compiler(format!(
                                "map entry must be a [key, value] pair, got {other}"
                            )))
                        }
                    }
                }
                Ok(Expr::MapLit(pairs))
            }

            "seq" => {
                let rest = &items[1..];
                match rest.len() {
                    // A single-element seq collapses to its element.
                    1 => self.expr(&rest[0]),
                    _ => Ok(Expr::Seq(self.exprs(rest)?)),
                }
            }

            "if" => {
                if items.len() != 3 && items.len() != 4 {
                    return Err(ArkError::compiler(format!(
                        "if expects 2 or 3 arguments, got {}",
                        items.len() - 1
                    )));
                }
                let cond = self.expr(&items[1])?;
                let then = self.expr(&items[2])?;
                let else_ = match items.get(3) {
                    Some(e) => Some(Box::new(self.expr(e)?)),
                    None => None,
                };
                Ok(Expr::If {
                    cond: Box::new(cond),
                    then: Box::new(then),
                    else_,
                })
            }

            "and" => {
                Self::arity(items, "and", 2)?;
                Ok(Expr::And(
                    Box::new(self.expr(&items[1])?),
                    Box::new(self.expr(&items[2])?),
                ))
            }

            "or" => {
                Self::arity(items, "or", 2)?;
                Ok(Expr::Or(
                    Box::new(self.expr(&items[1])?),
                    Box::new(self.expr(&items[2])?),
                ))
            }

            "loop" => {
                Self::arity(items, "loop", 1)?;
                Ok(Expr::Loop(Box::new(self.expr(&items[1])?)))
            }

            // Any other head is a call.
            _ => self.call(head, &items[1..]),
        }
    }

    fn call(&mut self, head: &Json, args: &[Json]) -> Result<Expr, ArkError> {
        Ok(Expr::Call {
            func: Box::new(self.expr(head)?),
            args: self.exprs(args)?,
        })
    }
}
