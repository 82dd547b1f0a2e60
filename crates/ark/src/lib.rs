//! The Ark language core: a small dynamically-typed expression language
//! shipped as a JSON-serialized AST plus a tree-walking evaluator.
//!
//! The pipeline: [`compile`] turns a decoded JSON document into an
//! expression graph, resolving every identifier to a lexical stack
//! address, a capture slot, an external cell, or an inlined intrinsic;
//! [`ArkState::run`] evaluates the graph against a runtime stack of
//! frames; [`serialize`] walks a graph back to wire JSON.
//!
//! ```
//! use ark::ArkState;
//!
//! let state = ArkState::new();
//! let result = state.eval_json(r#"["+", 3, 4]"#).unwrap();
//! assert_eq!(ark::ffi::to_host(&result).unwrap(), serde_json::json!(7));
//! ```

pub use ark_compiler::{compile, compile_str, serialize};
pub use ark_core::{
    ffi, intern, resolve, with_resolved, ArkError, CapturedAddr, CellRef, Closure, Compiled,
    EvalContext, Expr, FnDef, Frame, NativeFn, NativeObject, Namespace, PropertyRef, Ref, Spur,
    Value,
};
pub use ark_eval::{apply, eval, ArkState};
pub use ark_stdlib::{lookup_intrinsic, register_globals, INTRINSIC_NAMES};
