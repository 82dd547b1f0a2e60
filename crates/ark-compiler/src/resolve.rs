use ark_core::{CapturedAddr, CellRef, Namespace, Spur, Value};
use hashbrown::HashMap;

/// One compile-time frame: the local names visible in it, and the
/// addresses it captures from enclosing frames.
struct CompileFrame {
    locals: Vec<Spur>,
    captures: Vec<CapturedAddr>,
}

impl CompileFrame {
    fn new(locals: Vec<Spur>) -> Self {
        CompileFrame {
            locals,
            captures: Vec::new(),
        }
    }

    /// Most recent binding wins (shadowing).
    fn find_local(&self, name: Spur) -> Option<u16> {
        self.locals.iter().rposition(|n| *n == name).map(|i| i as u16)
    }

    /// Add a capture, returning its slot. Deduplicates by name, so a name
    /// referenced twice shares one slot.
    fn add_capture(&mut self, addr: CapturedAddr) -> u16 {
        if let Some(i) = self.captures.iter().position(|c| c.name() == addr.name()) {
            return i as u16;
        }
        let index = self.captures.len() as u16;
        self.captures.push(addr);
        index
    }
}

/// How one symbol occurrence resolved.
pub enum Resolution {
    /// Intrinsics bypass the lexical environment entirely and are inlined
    /// as literals at the reference site.
    Intrinsic(Value),
    Local { index: u16 },
    Capture { index: u16 },
    Global { cell: CellRef },
    /// Unresolved: a fresh placeholder cell, recorded in the free map.
    Free { cell: CellRef },
}

/// The compile-time environment: a stack of frames mirroring the runtime
/// stack, the externals namespace, and the free-variable bookkeeping.
pub struct Resolver<'a> {
    frames: Vec<CompileFrame>,
    externals: &'a Namespace,
    free: HashMap<Spur, Vec<CellRef>>,
}

impl<'a> Resolver<'a> {
    pub fn new(externals: &'a Namespace) -> Self {
        Resolver {
            frames: vec![CompileFrame::new(Vec::new())],
            externals,
            free: HashMap::new(),
        }
    }

    /// Extend the current frame's locals (a `let`). Returns the previous
    /// length for the matching `truncate_locals`.
    pub fn push_locals(&mut self, names: &[Spur]) -> usize {
        let frame = self.frames.last_mut().unwrap();
        let saved = frame.locals.len();
        frame.locals.extend_from_slice(names);
        saved
    }

    pub fn truncate_locals(&mut self, len: usize) {
        self.frames.last_mut().unwrap().locals.truncate(len);
    }

    /// Enter a function body (a `fn`).
    pub fn push_frame(&mut self, params: Vec<Spur>) {
        self.frames.push(CompileFrame::new(params));
    }

    /// Leave a function body; the frame's capture list, ordered by first
    /// appearance, becomes the emitted `FnDef.captures`.
    pub fn pop_frame(&mut self) -> Vec<CapturedAddr> {
        self.frames.pop().unwrap().captures
    }

    pub fn resolve(&mut self, name: Spur) -> Resolution {
        if let Some(intrinsic) = ark_stdlib::lookup_intrinsic(name) {
            return Resolution::Intrinsic(intrinsic);
        }

        let top = self.frames.len() - 1;
        if let Some(index) = self.frames[top].find_local(name) {
            return Resolution::Local { index };
        }
        if top > 0 {
            if let Some(index) = self.resolve_capture(top, name) {
                return Resolution::Capture { index };
            }
        }
        if let Some(cell) = self.externals.get(name) {
            return Resolution::Global { cell };
        }

        let cell = CellRef::undefined();
        self.free.entry(name).or_default().push(cell);
        Resolution::Free { cell }
    }

    /// Try to capture `name` into the frame at `frame_idx` from an
    /// enclosing frame, building the capture chain through every
    /// intervening function.
    fn resolve_capture(&mut self, frame_idx: usize, name: Spur) -> Option<u16> {
        if frame_idx == 0 {
            return None;
        }
        let parent = frame_idx - 1;

        if let Some(index) = self.frames[parent].find_local(name) {
            let addr = CapturedAddr::EnclosingLocal { name, index };
            return Some(self.frames[frame_idx].add_capture(addr));
        }

        if let Some(parent_capture) = self.resolve_capture(parent, name) {
            let addr = CapturedAddr::EnclosingCapture {
                name,
                index: parent_capture,
            };
            return Some(self.frames[frame_idx].add_capture(addr));
        }

        None
    }

    pub fn into_free_vars(self) -> HashMap<Spur, Vec<CellRef>> {
        self.free
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_core::intern;

    #[test]
    fn test_local_resolution_prefers_most_recent_binding() {
        let ns = Namespace::new();
        let mut r = Resolver::new(&ns);
        let x = intern("x");
        r.push_locals(&[x, intern("y"), x]);
        match r.resolve(x) {
            Resolution::Local { index } => assert_eq!(index, 2),
            _ => panic!("expected local"),
        }
    }

    #[test]
    fn test_let_scope_is_restored() {
        let ns = Namespace::new();
        let mut r = Resolver::new(&ns);
        let x = intern("x");
        let saved = r.push_locals(&[x]);
        assert!(matches!(r.resolve(x), Resolution::Local { .. }));
        r.truncate_locals(saved);
        assert!(matches!(r.resolve(x), Resolution::Free { .. }));
    }

    #[test]
    fn test_capture_across_one_frame() {
        let ns = Namespace::new();
        let mut r = Resolver::new(&ns);
        let x = intern("x");
        r.push_locals(&[x]);
        r.push_frame(vec![intern("a")]);
        match r.resolve(x) {
            Resolution::Capture { index } => assert_eq!(index, 0),
            _ => panic!("expected capture"),
        }
        // Same name again shares the slot.
        match r.resolve(x) {
            Resolution::Capture { index } => assert_eq!(index, 0),
            _ => panic!("expected capture"),
        }
        let caps = r.pop_frame();
        assert_eq!(caps, vec![CapturedAddr::EnclosingLocal { name: x, index: 0 }]);
    }

    #[test]
    fn test_transitive_capture_builds_a_chain() {
        let ns = Namespace::new();
        let mut r = Resolver::new(&ns);
        let x = intern("x");
        r.push_locals(&[x]);
        r.push_frame(vec![]);
        r.push_frame(vec![]);
        assert!(matches!(r.resolve(x), Resolution::Capture { index: 0 }));
        let inner = r.pop_frame();
        assert_eq!(
            inner,
            vec![CapturedAddr::EnclosingCapture { name: x, index: 0 }]
        );
        let middle = r.pop_frame();
        assert_eq!(
            middle,
            vec![CapturedAddr::EnclosingLocal { name: x, index: 0 }]
        );
    }

    #[test]
    fn test_intrinsics_bypass_the_environment() {
        let ns = Namespace::new();
        let mut r = Resolver::new(&ns);
        let plus = intern("+");
        r.push_locals(&[plus]);
        assert!(matches!(r.resolve(plus), Resolution::Intrinsic(_)));
    }

    #[test]
    fn test_globals_and_free_vars() {
        let ns = Namespace::new();
        let pi = intern("pi");
        ns.define(pi, Value::Num(3.14));
        let mut r = Resolver::new(&ns);
        assert!(matches!(r.resolve(pi), Resolution::Global { .. }));
        assert!(matches!(r.resolve(intern("mystery")), Resolution::Free { .. }));
        let free = r.into_free_vars();
        assert_eq!(free.len(), 1);
        assert!(free.contains_key(&intern("mystery")));
    }
}
