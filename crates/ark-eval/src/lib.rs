pub mod eval;

pub use eval::{apply, eval, ArkState};
