pub mod context;
pub mod error;
pub mod expr;
pub mod ffi;
pub mod refs;
pub mod value;

pub use context::{EvalContext, Frame};
pub use error::ArkError;
pub use expr::{CapturedAddr, Compiled, Expr, FnDef};
pub use ffi::NativeObject;
pub use lasso::Spur;
pub use refs::{PropertyRef, Ref};
pub use value::{
    compare_spurs, intern, resolve, with_resolved, CellRef, Closure, NativeFn, Namespace, Value,
};
