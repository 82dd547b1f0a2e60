use std::rc::Rc;

use hashbrown::HashMap;
use lasso::Spur;

use crate::value::{CellRef, Value};

/// A compiled expression node.
///
/// Every identifier has already been resolved to a lexical address, a
/// capture slot, an external cell, or an inlined intrinsic literal; the
/// evaluator never sees a name it has to look up.
#[derive(Debug, Clone)]
pub enum Expr {
    Lit(Value),

    /// Lexical address: evaluates to `Ref::Stack { level, index }`.
    LocalRef { name: Spur, level: u16, index: u16 },
    /// Slot in the current frame's capture array.
    CaptureRef { name: Spur, index: u16 },
    /// External binding resolved at compile time.
    GlobalRef { name: Spur, cell: CellRef },
    /// Unresolved symbol: a placeholder cell recorded in the free-variable
    /// map. Running a program that still contains one of these is refused.
    FreeRef { name: Spur, cell: CellRef },

    ListLit(Vec<Expr>),
    MapLit(Vec<(Expr, Expr)>),
    ObjectLit(Vec<(Spur, Expr)>),

    Get(Box<Expr>),
    Set(Box<Expr>, Box<Expr>),
    Property { name: Spur, obj: Box<Expr> },

    Fn(Rc<FnDef>),
    Call { func: Box<Expr>, args: Vec<Expr> },

    Let { names: Vec<Spur>, body: Box<Expr> },
    Seq(Vec<Expr>),
    If {
        cond: Box<Expr>,
        then: Box<Expr>,
        else_: Option<Box<Expr>>,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Loop(Box<Expr>),
}

impl Expr {
    /// The symbol name behind a resolved reference node, for diagnostics.
    pub fn ref_name(&self) -> Option<Spur> {
        match self {
            Expr::LocalRef { name, .. }
            | Expr::CaptureRef { name, .. }
            | Expr::GlobalRef { name, .. }
            | Expr::FreeRef { name, .. } => Some(*name),
            _ => None,
        }
    }
}

/// A function definition: parameter names, the addresses to capture from
/// the defining frame, and the body.
#[derive(Debug, Clone)]
pub struct FnDef {
    pub params: Vec<Spur>,
    pub captures: Vec<CapturedAddr>,
    pub body: Expr,
}

/// Where a closure finds one captured binding when it is created, relative
/// to the frame the `fn` expression evaluates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturedAddr {
    /// A local slot of the defining frame.
    EnclosingLocal { name: Spur, index: u16 },
    /// A capture slot of the defining frame (transitive capture).
    EnclosingCapture { name: Spur, index: u16 },
}

impl CapturedAddr {
    pub fn name(&self) -> Spur {
        match self {
            CapturedAddr::EnclosingLocal { name, .. }
            | CapturedAddr::EnclosingCapture { name, .. } => *name,
        }
    }
}

/// Compiler output: the expression graph plus the map of unresolved
/// symbols to the placeholder cells minted for their occurrences.
#[derive(Debug)]
pub struct Compiled {
    pub expr: Expr,
    pub free_vars: HashMap<Spur, Vec<CellRef>>,
}

impl Compiled {
    /// Unresolved names, sorted by their resolved strings.
    pub fn free_var_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .free_vars
            .keys()
            .map(|s| crate::value::resolve(*s))
            .collect();
        names.sort();
        names
    }
}
