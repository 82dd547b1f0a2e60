use std::rc::Rc;

use ark_core::ffi::coerce_to_bool;
use ark_core::{
    resolve, ArkError, CapturedAddr, CellRef, Closure, Compiled, EvalContext, Expr, Frame,
    Namespace, Ref, Value,
};
use hashbrown::HashMap;

/// Recursion limit for the host call stack.
const MAX_EVAL_DEPTH: usize = 512;

/// RAII guard for the recursion depth counter.
struct DepthGuard<'a> {
    ctx: &'a EvalContext,
}

impl<'a> DepthGuard<'a> {
    fn enter(ctx: &'a EvalContext) -> Result<Self, ArkError> {
        if ctx.depth.get() >= MAX_EVAL_DEPTH {
            return Err(ArkError::runtime("maximum evaluation depth exceeded"));
        }
        ctx.depth.set(ctx.depth.get() + 1);
        Ok(DepthGuard { ctx })
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.ctx.depth.set(self.ctx.depth.get() - 1);
    }
}

// Frame pops are anchored in guards so that error returns and non-local
// exits unwind the runtime stack deterministically.

struct FrameGuard<'a> {
    ctx: &'a EvalContext,
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        self.ctx.pop_frame();
    }
}

struct LocalsGuard<'a> {
    ctx: &'a EvalContext,
    base: usize,
}

impl Drop for LocalsGuard<'_> {
    fn drop(&mut self) {
        self.ctx.truncate_locals(self.base);
    }
}

/// Evaluate an expression against the runtime stack.
pub fn eval(ctx: &EvalContext, expr: &Expr) -> Result<Value, ArkError> {
    let _depth = DepthGuard::enter(ctx)?;

    match expr {
        Expr::Lit(value) => Ok(value.clone()),

        Expr::LocalRef { level, index, .. } => Ok(Value::Ref(Ref::Stack {
            level: *level,
            index: *index,
        })),
        Expr::CaptureRef { index, .. } => Ok(Value::Ref(Ref::Capture(*index))),
        Expr::GlobalRef { cell, .. } | Expr::FreeRef { cell, .. } => {
            Ok(Value::Ref(Ref::Cell(*cell)))
        }

        Expr::ListLit(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(eval(ctx, item)?);
            }
            Ok(Value::list(values))
        }

        Expr::MapLit(pairs) => {
            let mut entries = Vec::with_capacity(pairs.len());
            for (k, v) in pairs {
                let key = eval(ctx, k)?;
                let value = eval(ctx, v)?;
                entries.push((key, value));
            }
            Ok(Value::map(entries))
        }

        Expr::ObjectLit(fields) => {
            let mut object = HashMap::with_capacity(fields.len());
            for (name, value) in fields {
                object.insert(*name, eval(ctx, value)?);
            }
            Ok(Value::object(object))
        }

        Expr::Get(inner) => {
            let target = eval(ctx, inner)?;
            let reference = match target {
                Value::Ref(r) => r,
                other => {
                    return Err(ArkError::runtime(format!(
                        "not a reference: {}",
                        other.type_name()
                    )))
                }
            };
            match reference.get(ctx)? {
                Value::Undefined => Err(ArkError::UninitializedSymbol(
                    inner
                        .ref_name()
                        .map(resolve)
                        .unwrap_or_else(|| "<expression>".to_string()),
                )),
                value => Ok(value),
            }
        }

        Expr::Set(target, value) => {
            let target = eval(ctx, target)?;
            let value = eval(ctx, value)?;
            match target {
                Value::Ref(r) => r.set(ctx, value),
                other => Err(ArkError::InvalidAssignment(other.type_name().to_string())),
            }
        }

        Expr::Property { name, obj } => {
            let target = eval(ctx, obj)?;
            Ok(Value::Ref(Ref::property(target, *name)))
        }

        Expr::Fn(def) => {
            // Resolve each captured address against the frame this fn is
            // being evaluated in.
            let mut cells = Vec::with_capacity(def.captures.len());
            for capture in &def.captures {
                let cell = match capture {
                    CapturedAddr::EnclosingLocal { index, .. } => ctx.local_cell(0, *index)?,
                    CapturedAddr::EnclosingCapture { index, .. } => ctx.capture_cell(*index)?,
                };
                cells.push(cell);
            }
            Ok(Value::Closure(Rc::new(Closure {
                def: Rc::clone(def),
                captures: Rc::new(cells),
            })))
        }

        Expr::Let { names, body } => {
            let base = ctx.locals_len();
            let _locals = LocalsGuard { ctx, base };
            for _ in names {
                ctx.push_local(CellRef::undefined());
            }
            eval(ctx, body)
        }

        Expr::Seq(items) => {
            let mut result = Value::Null;
            for item in items {
                result = eval(ctx, item)?;
            }
            Ok(result)
        }

        Expr::If { cond, then, else_ } => {
            if coerce_to_bool(&eval(ctx, cond)?) {
                eval(ctx, then)
            } else {
                match else_ {
                    Some(else_) => eval(ctx, else_),
                    None => Ok(Value::Null),
                }
            }
        }

        Expr::And(l, r) => {
            let left = eval(ctx, l)?;
            if coerce_to_bool(&left) {
                eval(ctx, r)
            } else {
                Ok(left)
            }
        }

        Expr::Or(l, r) => {
            let left = eval(ctx, l)?;
            if coerce_to_bool(&left) {
                Ok(left)
            } else {
                eval(ctx, r)
            }
        }

        Expr::Loop(body) => loop {
            match eval(ctx, body) {
                Ok(_) => {}
                Err(ArkError::BreakSignal(value)) => return Ok(value),
                Err(ArkError::ContinueSignal) => {}
                Err(e) => return Err(e),
            }
        },

        Expr::Call { func, args } => {
            let callee = eval(ctx, func)?;
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval(ctx, arg)?);
            }
            apply(ctx, &callee, &values)
        }
    }
}

/// Apply a callable to already-evaluated arguments.
pub fn apply(ctx: &EvalContext, callee: &Value, args: &[Value]) -> Result<Value, ArkError> {
    match callee {
        // Native functions are invoked directly; no frame.
        Value::NativeFn(native) => (native.func)(ctx, args),

        Value::Closure(closure) => {
            let def = &closure.def;
            let mut locals = Vec::with_capacity(def.params.len() + 1);
            for i in 0..def.params.len() {
                locals.push(CellRef::new(args.get(i).cloned().unwrap_or(Value::Undefined)));
            }
            // Extra arguments collect into a trailing list cell (the
            // variadic tail; no surface syntax reaches it).
            if args.len() > def.params.len() {
                locals.push(CellRef::new(Value::list(
                    args[def.params.len()..].to_vec(),
                )));
            }

            ctx.push_frame(Frame::new(locals, Rc::clone(&closure.captures)));
            let _frame = FrameGuard { ctx };
            match eval(ctx, &def.body) {
                // `return` ends this call; break/continue keep unwinding
                // to an enclosing loop.
                Err(ArkError::ReturnSignal(value)) => Ok(value),
                other => other,
            }
        }

        other => Err(ArkError::InvalidCall(other.type_name().to_string())),
    }
}

/// One evaluation state: a runtime stack plus the globals namespace.
/// States share the interner and the cell arena; each holds its own stack.
pub struct ArkState {
    ctx: EvalContext,
    globals: Namespace,
}

impl ArkState {
    /// A state with the standard globals.
    pub fn new() -> Self {
        let globals = Namespace::new();
        ark_stdlib::register_globals(&globals);
        ArkState {
            ctx: EvalContext::new(),
            globals,
        }
    }

    /// A state over a caller-assembled namespace.
    pub fn with_globals(globals: Namespace) -> Self {
        ArkState {
            ctx: EvalContext::new(),
            globals,
        }
    }

    pub fn globals(&self) -> &Namespace {
        &self.globals
    }

    pub fn context(&self) -> &EvalContext {
        &self.ctx
    }

    /// Evaluate a compiled program against a fresh runtime stack.
    ///
    /// Refuses to run a compilation with unresolved symbols.
    pub fn run(&self, compiled: &Compiled) -> Result<Value, ArkError> {
        if !compiled.free_vars.is_empty() {
            return Err(ArkError::UndefinedSymbols(compiled.free_var_names()));
        }
        self.ctx.reset();
        tracing::trace!("starting evaluation");
        eval(&self.ctx, &compiled.expr)
    }

    /// Parse, compile against this state's globals, and run.
    pub fn eval_json(&self, src: &str) -> Result<Value, ArkError> {
        let compiled = ark_compiler::compile_str(src, &self.globals)?;
        self.run(&compiled)
    }
}

impl Default for ArkState {
    fn default() -> Self {
        Self::new()
    }
}
