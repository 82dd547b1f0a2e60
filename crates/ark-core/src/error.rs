use crate::value::Value;

/// Check arity of a native function's arguments, returning `ArkError::Arity` on mismatch.
///
/// # Forms
///
/// ```ignore
/// check_arity!(args, "fn-name", 2);        // exactly 2
/// check_arity!(args, "fn-name", 1..=3);    // 1 to 3 inclusive
/// check_arity!(args, "fn-name", 2..);      // 2 or more
/// ```
#[macro_export]
macro_rules! check_arity {
    ($args:expr, $name:expr, $exact:literal) => {
        if $args.len() != $exact {
            return Err($crate::ArkError::arity(
                $name,
                stringify!($exact),
                $args.len(),
            ));
        }
    };
    ($args:expr, $name:expr, $lo:literal ..= $hi:literal) => {
        if $args.len() < $lo || $args.len() > $hi {
            return Err($crate::ArkError::arity(
                $name,
                concat!(stringify!($lo), "-", stringify!($hi)),
                $args.len(),
            ));
        }
    };
    ($args:expr, $name:expr, $lo:literal ..) => {
        if $args.len() < $lo {
            return Err($crate::ArkError::arity(
                $name,
                concat!(stringify!($lo), "+"),
                $args.len(),
            ));
        }
    };
}

/// All failure modes of the compiler and the evaluator.
///
/// The break/continue/return signals are not errors in the user-facing
/// sense: they ride the same `Result` channel and are intercepted by the
/// enclosing `Loop` or closure call. One that reaches the caller uncaught
/// displays as the "outside a ..." message below.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ArkError {
    #[error("Compiler error: {0}")]
    Compiler(String),

    #[error("Undefined symbols: {}", .0.join(", "))]
    UndefinedSymbols(Vec<String>),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Type error: expected {expected}, got {got}")]
    Type { expected: String, got: String },

    #[error("Arity error: {name} expects {expected} args, got {got}")]
    Arity {
        name: String,
        expected: String,
        got: usize,
    },

    #[error("Invalid call: not callable: {0}")]
    InvalidCall(String),

    #[error("Invalid assignment: not a reference: {0}")]
    InvalidAssignment(String),

    #[error("Uninitialized symbol: {0}")]
    UninitializedSymbol(String),

    #[error("Host conversion error: {0}")]
    HostConversion(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("break outside a loop")]
    BreakSignal(Value),

    #[error("continue outside a loop")]
    ContinueSignal,

    #[error("return outside a function")]
    ReturnSignal(Value),
}

impl ArkError {
    pub fn compiler(msg: impl Into<String>) -> Self {
        ArkError::Compiler(msg.into())
    }

    pub fn runtime(msg: impl Into<String>) -> Self {
        ArkError::Runtime(msg.into())
    }

    pub fn host(msg: impl Into<String>) -> Self {
        ArkError::HostConversion(msg.into())
    }

    pub fn type_error(expected: impl Into<String>, got: impl Into<String>) -> Self {
        ArkError::Type {
            expected: expected.into(),
            got: got.into(),
        }
    }

    pub fn arity(name: impl Into<String>, expected: impl Into<String>, got: usize) -> Self {
        ArkError::Arity {
            name: name.into(),
            expected: expected.into(),
            got,
        }
    }

    /// True for the non-local exit variants.
    pub fn is_signal(&self) -> bool {
        matches!(
            self,
            ArkError::BreakSignal(_) | ArkError::ContinueSignal | ArkError::ReturnSignal(_)
        )
    }
}
