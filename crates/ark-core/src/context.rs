use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::ArkError;
use crate::value::CellRef;

/// One runtime frame: the locals pushed by parameter binding and `let`,
/// plus the capture cells inherited from the closure's creation site.
#[derive(Debug)]
pub struct Frame {
    pub locals: RefCell<Vec<CellRef>>,
    pub captures: Rc<Vec<CellRef>>,
}

impl Frame {
    pub fn new(locals: Vec<CellRef>, captures: Rc<Vec<CellRef>>) -> Frame {
        Frame {
            locals: RefCell::new(locals),
            captures,
        }
    }

    /// The implicit bottom frame holding program-level `let` bindings.
    pub fn root() -> Frame {
        Frame::new(Vec::new(), Rc::new(Vec::new()))
    }
}

/// The evaluator's one piece of state: the runtime stack, plus a recursion
/// depth counter. Interior mutability so native functions can observe it
/// through a shared reference.
#[derive(Debug)]
pub struct EvalContext {
    pub stack: RefCell<Vec<Frame>>,
    pub depth: Cell<usize>,
}

impl EvalContext {
    pub fn new() -> Self {
        EvalContext {
            stack: RefCell::new(vec![Frame::root()]),
            depth: Cell::new(0),
        }
    }

    /// Discard all frames and start over with a fresh bottom frame.
    pub fn reset(&self) {
        *self.stack.borrow_mut() = vec![Frame::root()];
        self.depth.set(0);
    }

    pub fn frame_count(&self) -> usize {
        self.stack.borrow().len()
    }

    pub fn push_frame(&self, frame: Frame) {
        self.stack.borrow_mut().push(frame);
    }

    pub fn pop_frame(&self) {
        self.stack.borrow_mut().pop();
    }

    /// Number of locals in the current frame.
    pub fn locals_len(&self) -> usize {
        let stack = self.stack.borrow();
        let frame = stack.last().expect("runtime stack is empty");
        let len = frame.locals.borrow().len();
        len
    }

    /// Append a binding cell to the current frame's locals.
    pub fn push_local(&self, cell: CellRef) {
        let stack = self.stack.borrow();
        let frame = stack.last().expect("runtime stack is empty");
        frame.locals.borrow_mut().push(cell);
    }

    /// Drop the current frame's locals back to `len` (scope exit).
    pub fn truncate_locals(&self, len: usize) {
        let stack = self.stack.borrow();
        if let Some(frame) = stack.last() {
            frame.locals.borrow_mut().truncate(len);
        }
    }

    /// The cell at lexical address `(level, index)`: `level` frames down
    /// from the top, slot `index` of that frame's locals.
    pub fn local_cell(&self, level: u16, index: u16) -> Result<CellRef, ArkError> {
        let stack = self.stack.borrow();
        let frame = stack
            .iter()
            .rev()
            .nth(level as usize)
            .ok_or_else(|| ArkError::runtime(format!("stack level {level} out of range")))?;
        let cell = frame.locals.borrow().get(index as usize).copied();
        cell.ok_or_else(|| ArkError::runtime(format!("stack slot {level}:{index} out of range")))
    }

    /// The cell at slot `index` of the current frame's capture array.
    pub fn capture_cell(&self, index: u16) -> Result<CellRef, ArkError> {
        let stack = self.stack.borrow();
        let frame = stack.last().expect("runtime stack is empty");
        frame
            .captures
            .get(index as usize)
            .copied()
            .ok_or_else(|| ArkError::runtime(format!("capture slot {index} out of range")))
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}
