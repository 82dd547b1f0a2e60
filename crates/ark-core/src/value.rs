use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use hashbrown::HashMap;
use lasso::{Rodeo, Spur};

use crate::context::EvalContext;
use crate::error::ArkError;
use crate::expr::{Expr, FnDef};
use crate::ffi::NativeObject;
use crate::refs::Ref;

// ── String interning ──────────────────────────────────────────────

thread_local! {
    static INTERNER: RefCell<Rodeo> = RefCell::new(Rodeo::default());
}

/// Intern a string, returning a Spur key.
pub fn intern(s: &str) -> Spur {
    INTERNER.with(|r| r.borrow_mut().get_or_intern(s))
}

/// Resolve a Spur key back to a String.
pub fn resolve(spur: Spur) -> String {
    INTERNER.with(|r| r.borrow().resolve(&spur).to_string())
}

/// Resolve a Spur and call f with the &str, avoiding allocation.
pub fn with_resolved<F, R>(spur: Spur, f: F) -> R
where
    F: FnOnce(&str) -> R,
{
    INTERNER.with(|r| {
        let interner = r.borrow();
        f(interner.resolve(&spur))
    })
}

/// Compare two Spurs by their resolved string content (lexicographic).
pub fn compare_spurs(a: Spur, b: Spur) -> std::cmp::Ordering {
    if a == b {
        return std::cmp::Ordering::Equal;
    }
    INTERNER.with(|r| {
        let interner = r.borrow();
        interner.resolve(&a).cmp(interner.resolve(&b))
    })
}

// ── Cell arena ────────────────────────────────────────────────────

// Mutable binding cells live in a thread-wide arena and are addressed by
// index. Closures capture cell indices, so a closure whose cell ends up
// holding the closure itself never forms an Rc cycle.

thread_local! {
    static CELLS: RefCell<Vec<Value>> = const { RefCell::new(Vec::new()) };
}

/// Index of a mutable binding cell in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef(u32);

impl CellRef {
    /// Allocate a fresh cell holding `v`.
    pub fn new(v: Value) -> CellRef {
        CELLS.with(|c| {
            let mut cells = c.borrow_mut();
            let id = u32::try_from(cells.len()).expect("cell arena exhausted");
            cells.push(v);
            CellRef(id)
        })
    }

    /// Allocate a fresh uninitialized cell.
    pub fn undefined() -> CellRef {
        CellRef::new(Value::Undefined)
    }

    pub fn get(self) -> Value {
        CELLS.with(|c| c.borrow()[self.0 as usize].clone())
    }

    pub fn set(self, v: Value) {
        // Drop the previous value outside the borrow.
        let old = CELLS.with(|c| std::mem::replace(&mut c.borrow_mut()[self.0 as usize], v));
        drop(old);
    }
}

// ── Native functions ──────────────────────────────────────────────

/// A native function callable from Ark.
pub type NativeFnInner = dyn Fn(&EvalContext, &[Value]) -> Result<Value, ArkError>;

pub struct NativeFn {
    pub name: String,
    pub func: Box<NativeFnInner>,
}

impl NativeFn {
    pub fn simple(
        name: impl Into<String>,
        f: impl Fn(&[Value]) -> Result<Value, ArkError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Box::new(move |_ctx, args| f(args)),
        }
    }

    pub fn with_ctx(
        name: impl Into<String>,
        f: impl Fn(&EvalContext, &[Value]) -> Result<Value, ArkError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Box::new(f),
        }
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native-fn {}>", self.name)
    }
}

// ── Closures ──────────────────────────────────────────────────────

/// A user-defined function: its definition plus the binding cells it
/// captured from the frame it was created in.
#[derive(Debug, Clone)]
pub struct Closure {
    pub def: Rc<FnDef>,
    pub captures: Rc<Vec<CellRef>>,
}

// ── The value type ────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Num(f64),
    Str(Spur),
    /// Uninitialized-cell sentinel; never returned to user code.
    Undefined,
    List(Rc<RefCell<Vec<Value>>>),
    /// Identity-keyed map, stored as an association vector.
    Map(Rc<RefCell<Vec<(Value, Value)>>>),
    Object(Rc<RefCell<HashMap<Spur, Value>>>),
    Native(Rc<dyn NativeObject>),
    Closure(Rc<Closure>),
    NativeFn(Rc<NativeFn>),
    Ref(Ref),
    /// Expressions are themselves values; evaluating one as a literal is
    /// the identity.
    Expr(Rc<Expr>),
}

impl Value {
    pub fn str(s: &str) -> Value {
        Value::Str(intern(s))
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn map(entries: Vec<(Value, Value)>) -> Value {
        Value::Map(Rc::new(RefCell::new(entries)))
    }

    pub fn object(entries: HashMap<Spur, Value>) -> Value {
        Value::Object(Rc::new(RefCell::new(entries)))
    }

    pub fn native_fn(f: NativeFn) -> Value {
        Value::NativeFn(Rc::new(f))
    }

    pub fn native(obj: impl NativeObject + 'static) -> Value {
        Value::Native(Rc::new(obj))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Num(_) => "num",
            Value::Str(_) => "str",
            Value::Undefined => "undefined",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
            Value::Native(_) => "native-object",
            Value::Closure(_) => "fn",
            Value::NativeFn(_) => "native-fn",
            Value::Ref(_) => "ref",
            Value::Expr(_) => "expression",
        }
    }

    pub fn as_num(&self) -> Option<f64> {
        match self {
            Value::Num(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str_spur(&self) -> Option<Spur> {
        match self {
            Value::Str(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<String> {
        self.as_str_spur().map(resolve)
    }

    /// Raw identity: value equality for interned primitives, pointer
    /// equality for heap values. NaN is not identical to NaN, matching the
    /// host's strict equality.
    pub fn identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Undefined, Value::Undefined) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Num(a), Value::Num(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => {
                std::ptr::eq(Rc::as_ptr(a) as *const u8, Rc::as_ptr(b) as *const u8)
            }
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::NativeFn(a), Value::NativeFn(b)) => Rc::ptr_eq(a, b),
            (Value::Expr(a), Value::Expr(b)) => Rc::ptr_eq(a, b),
            (Value::Ref(a), Value::Ref(b)) => a.identical(b),
            _ => false,
        }
    }
}

// Structural equality, used by tests and by container comparison in the
// host bridge. Functions, natives and refs fall back to identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Undefined, Value::Undefined) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Num(a), Value::Num(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => *a.borrow() == *b.borrow(),
            (Value::Map(a), Value::Map(b)) => *a.borrow() == *b.borrow(),
            (Value::Object(a), Value::Object(b)) => *a.borrow() == *b.borrow(),
            _ => self.identical(other),
        }
    }
}

// ── Display ───────────────────────────────────────────────────────

fn write_num(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        write!(f, "{}", n as i64)
    } else {
        write!(f, "{n}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Num(n) => write_num(f, *n),
            Value::Str(s) => with_resolved(*s, |raw| write!(f, "\"{raw}\"")),
            Value::Undefined => write!(f, "undefined"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "map {{")?;
                for (i, (k, v)) in entries.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Object(fields) => {
                let fields = fields.borrow();
                let mut keys: Vec<Spur> = fields.keys().copied().collect();
                keys.sort_by(|a, b| compare_spurs(*a, *b));
                write!(f, "{{")?;
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    with_resolved(*key, |name| write!(f, "{name}"))?;
                    write!(f, ": {}", fields[key])?;
                }
                write!(f, "}}")
            }
            Value::Native(obj) => write!(f, "<{}>", obj.type_name()),
            Value::Closure(c) => {
                write!(f, "<fn (")?;
                for (i, p) in c.def.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    with_resolved(*p, |name| write!(f, "{name}"))?;
                }
                write!(f, ")>")
            }
            Value::NativeFn(nf) => write!(f, "<native-fn {}>", nf.name),
            Value::Ref(r) => write!(f, "{r}"),
            Value::Expr(_) => write!(f, "<expression>"),
        }
    }
}

// ── Namespaces ────────────────────────────────────────────────────

/// A mapping from names to binding cells: the globals of an `ArkState`, or
/// any externals table handed to the compiler.
#[derive(Debug, Default)]
pub struct Namespace {
    entries: RefCell<HashMap<Spur, CellRef>>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to a fresh cell holding `value`, returning the cell.
    /// Rebinding replaces the cell.
    pub fn define(&self, name: Spur, value: Value) -> CellRef {
        let cell = CellRef::new(value);
        self.entries.borrow_mut().insert(name, cell);
        cell
    }

    pub fn get(&self, name: Spur) -> Option<CellRef> {
        self.entries.borrow().get(&name).copied()
    }

    pub fn contains(&self, name: Spur) -> bool {
        self.entries.borrow().contains_key(&name)
    }

    /// All bound names, sorted by their resolved strings.
    pub fn names(&self) -> Vec<Spur> {
        let mut names: Vec<Spur> = self.entries.borrow().keys().copied().collect();
        names.sort_by(|a, b| compare_spurs(*a, *b));
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interned_strings_are_identical() {
        let a = Value::str("hello");
        let b = Value::str("hello");
        assert!(a.identical(&b));
        assert!(!a.identical(&Value::str("world")));
    }

    #[test]
    fn test_nan_is_not_identical_to_itself() {
        let nan = Value::Num(f64::NAN);
        assert!(!nan.identical(&nan.clone()));
        assert!(Value::Num(0.0).identical(&Value::Num(-0.0)));
    }

    #[test]
    fn test_heap_identity_is_per_allocation() {
        let a = Value::list(vec![Value::Num(1.0)]);
        let b = Value::list(vec![Value::Num(1.0)]);
        assert!(!a.identical(&b));
        assert!(a.identical(&a.clone()));
        // Structural equality still holds.
        assert_eq!(a, b);
    }

    #[test]
    fn test_cell_get_set() {
        let cell = CellRef::undefined();
        assert!(matches!(cell.get(), Value::Undefined));
        cell.set(Value::Num(42.0));
        assert_eq!(cell.get(), Value::Num(42.0));
    }

    #[test]
    fn test_namespace_define_and_get() {
        let ns = Namespace::new();
        let name = intern("pi");
        assert!(ns.get(name).is_none());
        ns.define(name, Value::Num(3.14));
        assert_eq!(ns.get(name).unwrap().get(), Value::Num(3.14));
    }

    #[test]
    fn test_display_forms() {
        assert_eq!(Value::Num(3.0).to_string(), "3");
        assert_eq!(Value::Num(2.5).to_string(), "2.5");
        assert_eq!(Value::str("hi").to_string(), "\"hi\"");
        assert_eq!(
            Value::list(vec![Value::Num(1.0), Value::Null]).to_string(),
            "[1, null]"
        );
    }
}
