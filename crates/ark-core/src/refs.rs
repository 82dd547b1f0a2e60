use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use lasso::Spur;

use crate::check_arity;
use crate::context::EvalContext;
use crate::error::ArkError;
use crate::ffi;
use crate::value::{intern, resolve, with_resolved, CellRef, NativeFn, Value};

/// A first-class storage location.
#[derive(Debug, Clone)]
pub enum Ref {
    /// An owned mutable cell: globals, captures, boxed parameters.
    Cell(CellRef),
    /// Lexical address: `level` frames down from the top of the runtime
    /// stack, slot `index` of that frame's locals.
    Stack { level: u16, index: u16 },
    /// Slot in the current frame's capture array.
    Capture(u16),
    /// Field of an object, container, or native object.
    Property(Rc<PropertyRef>),
}

#[derive(Debug)]
pub struct PropertyRef {
    pub target: Value,
    pub name: Spur,
}

impl Ref {
    pub fn property(target: Value, name: Spur) -> Ref {
        Ref::Property(Rc::new(PropertyRef { target, name }))
    }

    /// Read through the reference. May yield `Undefined` for an
    /// uninitialized cell; the caller decides whether that is an error.
    pub fn get(&self, ctx: &EvalContext) -> Result<Value, ArkError> {
        match self {
            Ref::Cell(cell) => Ok(cell.get()),
            Ref::Stack { level, index } => Ok(ctx.local_cell(*level, *index)?.get()),
            Ref::Capture(index) => Ok(ctx.capture_cell(*index)?.get()),
            Ref::Property(prop) => property_get(prop),
        }
    }

    /// Write through the reference, returning the written value.
    pub fn set(&self, ctx: &EvalContext, value: Value) -> Result<Value, ArkError> {
        match self {
            Ref::Cell(cell) => {
                cell.set(value.clone());
                Ok(value)
            }
            Ref::Stack { level, index } => {
                ctx.local_cell(*level, *index)?.set(value.clone());
                Ok(value)
            }
            Ref::Capture(index) => {
                ctx.capture_cell(*index)?.set(value.clone());
                Ok(value)
            }
            Ref::Property(prop) => property_set(prop, value),
        }
    }

    pub fn identical(&self, other: &Ref) -> bool {
        match (self, other) {
            (Ref::Cell(a), Ref::Cell(b)) => a == b,
            (
                Ref::Stack { level, index },
                Ref::Stack {
                    level: l2,
                    index: i2,
                },
            ) => level == l2 && index == i2,
            (Ref::Capture(a), Ref::Capture(b)) => a == b,
            (Ref::Property(a), Ref::Property(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ref::Cell(_) => write!(f, "<ref>"),
            Ref::Stack { level, index } => write!(f, "<ref {level}:{index}>"),
            Ref::Capture(index) => write!(f, "<capture {index}>"),
            Ref::Property(prop) => {
                with_resolved(prop.name, |name| write!(f, "<property {name}>"))
            }
        }
    }
}

// ── Property dispatch ─────────────────────────────────────────────

fn property_get(prop: &PropertyRef) -> Result<Value, ArkError> {
    match &prop.target {
        Value::Object(fields) => Ok(fields
            .borrow()
            .get(&prop.name)
            .cloned()
            .unwrap_or(Value::Null)),
        Value::List(items) => list_property(items, prop.name),
        Value::Map(entries) => map_property(entries, prop.name),
        Value::Native(obj) => with_resolved(prop.name, |name| obj.get_prop(name)),
        other => Err(ArkError::runtime(format!(
            "no property {} on {}",
            resolve(prop.name),
            other.type_name()
        ))),
    }
}

fn property_set(prop: &PropertyRef, value: Value) -> Result<Value, ArkError> {
    match &prop.target {
        Value::Object(fields) => {
            fields.borrow_mut().insert(prop.name, value.clone());
            Ok(value)
        }
        Value::Native(obj) => {
            with_resolved(prop.name, |name| obj.set_prop(name, value.clone()))?;
            Ok(value)
        }
        other => Err(ArkError::runtime(format!(
            "cannot set property {} on {}",
            resolve(prop.name),
            other.type_name()
        ))),
    }
}

/// Index coercion for the list methods: numeric, truncated.
fn list_index(v: &Value) -> usize {
    let n = ffi::coerce_to_num(v);
    if n.is_finite() && n >= 0.0 {
        n.trunc() as usize
    } else {
        usize::MAX
    }
}

// The length property is computed from the live vector, not snapshotted
// at construction.
fn list_property(items: &Rc<RefCell<Vec<Value>>>, name: Spur) -> Result<Value, ArkError> {
    if name == intern("length") {
        return Ok(Value::Num(items.borrow().len() as f64));
    }
    if name == intern("get") {
        let items = Rc::clone(items);
        return Ok(Value::native_fn(NativeFn::simple("List.get", move |args| {
            check_arity!(args, "List.get", 1);
            let index = list_index(&args[0]);
            Ok(items.borrow().get(index).cloned().unwrap_or(Value::Null))
        })));
    }
    if name == intern("set") {
        let items = Rc::clone(items);
        return Ok(Value::native_fn(NativeFn::simple("List.set", move |args| {
            check_arity!(args, "List.set", 2);
            let index = list_index(&args[0]);
            let mut items = items.borrow_mut();
            if index < items.len() {
                items[index] = args[1].clone();
            } else if index == items.len() {
                items.push(args[1].clone());
            } else {
                return Err(ArkError::runtime(format!(
                    "list index {index} out of range (length {})",
                    items.len()
                )));
            }
            Ok(args[1].clone())
        })));
    }
    Err(ArkError::runtime(format!(
        "no property {} on list",
        resolve(name)
    )))
}

fn map_property(
    entries: &Rc<RefCell<Vec<(Value, Value)>>>,
    name: Spur,
) -> Result<Value, ArkError> {
    if name == intern("get") {
        let entries = Rc::clone(entries);
        return Ok(Value::native_fn(NativeFn::simple("Map.get", move |args| {
            check_arity!(args, "Map.get", 1);
            let entries = entries.borrow();
            Ok(entries
                .iter()
                .find(|(k, _)| k.identical(&args[0]))
                .map(|(_, v)| v.clone())
                .unwrap_or(Value::Null))
        })));
    }
    if name == intern("set") {
        let entries = Rc::clone(entries);
        return Ok(Value::native_fn(NativeFn::simple("Map.set", move |args| {
            check_arity!(args, "Map.set", 2);
            let mut entries = entries.borrow_mut();
            match entries.iter_mut().find(|(k, _)| k.identical(&args[0])) {
                Some(entry) => entry.1 = args[1].clone(),
                None => entries.push((args[0].clone(), args[1].clone())),
            }
            Ok(args[1].clone())
        })));
    }
    Err(ArkError::runtime(format!(
        "no property {} on map",
        resolve(name)
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(f: &Value, args: &[Value]) -> Result<Value, ArkError> {
        let ctx = EvalContext::new();
        match f {
            Value::NativeFn(nf) => (nf.func)(&ctx, args),
            other => panic!("expected native fn, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_object_absent_property_is_null() {
        let obj = Value::object(Default::default());
        let r = Ref::property(obj.clone(), intern("missing"));
        let ctx = EvalContext::new();
        assert_eq!(r.get(&ctx).unwrap(), Value::Null);
        // Setting always creates the entry.
        r.set(&ctx, Value::Num(1.0)).unwrap();
        assert_eq!(r.get(&ctx).unwrap(), Value::Num(1.0));
    }

    #[test]
    fn test_list_length_is_live() {
        let list = Value::list(vec![Value::Num(1.0)]);
        let ctx = EvalContext::new();
        let len = Ref::property(list.clone(), intern("length"));
        assert_eq!(len.get(&ctx).unwrap(), Value::Num(1.0));

        let set = Ref::property(list.clone(), intern("set")).get(&ctx).unwrap();
        call(&set, &[Value::Num(1.0), Value::Num(9.0)]).unwrap();
        assert_eq!(len.get(&ctx).unwrap(), Value::Num(2.0));
    }

    #[test]
    fn test_list_get_out_of_range_is_null() {
        let list = Value::list(vec![Value::Num(1.0)]);
        let ctx = EvalContext::new();
        let get = Ref::property(list, intern("get")).get(&ctx).unwrap();
        assert_eq!(call(&get, &[Value::Num(5.0)]).unwrap(), Value::Null);
    }

    #[test]
    fn test_list_set_beyond_end_errors() {
        let list = Value::list(vec![]);
        let ctx = EvalContext::new();
        let set = Ref::property(list, intern("set")).get(&ctx).unwrap();
        assert!(call(&set, &[Value::Num(3.0), Value::Null]).is_err());
    }

    #[test]
    fn test_map_keys_compare_by_identity() {
        let map = Value::map(vec![]);
        let ctx = EvalContext::new();
        let set = Ref::property(map.clone(), intern("set")).get(&ctx).unwrap();
        let get = Ref::property(map, intern("get")).get(&ctx).unwrap();

        // Interned string keys coincide with value equality.
        call(&set, &[Value::str("k"), Value::Num(1.0)]).unwrap();
        assert_eq!(call(&get, &[Value::str("k")]).unwrap(), Value::Num(1.0));

        // Distinct list allocations are distinct keys.
        let k1 = Value::list(vec![]);
        let k2 = Value::list(vec![]);
        call(&set, &[k1.clone(), Value::Num(2.0)]).unwrap();
        assert_eq!(call(&get, &[k1]).unwrap(), Value::Num(2.0));
        assert_eq!(call(&get, &[k2]).unwrap(), Value::Null);
    }

    #[test]
    fn test_property_on_primitive_errors() {
        let ctx = EvalContext::new();
        let r = Ref::property(Value::Num(1.0), intern("x"));
        assert!(r.get(&ctx).is_err());
    }
}
