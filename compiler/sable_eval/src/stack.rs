//! Import/mixin trace stack.
//!
//! The evaluator pushes a frame when it enters a file, an `@import`, or a
//! mixin body, and pops it on the way out. An error raised while frames are
//! live takes them as its backtrace through [`SharedStack::attach_backtrace`];
//! import expansion also scans them for loops.
//!
//! One stack serves a whole compilation. The root environment holds it and
//! the evaluator threads a [`SharedStack`] handle explicitly, so reaching it
//! never requires walking an environment chain.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use sable_diagnostic::{BacktraceEntry, SyntaxError};
use sable_ir::SourceLocation;

/// What a frame represents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameKind {
    /// The top-level file of the compilation.
    Base,
    /// An `@import` statement being expanded, with its reference.
    Import(String),
    /// A mixin body being evaluated.
    Mixin(String),
}

/// A single frame in the live trace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// File containing the statement that opened this frame.
    pub filename: Option<String>,
    pub line: u32,
    pub kind: FrameKind,
}

impl Frame {
    pub fn is_import(&self) -> bool {
        matches!(self.kind, FrameKind::Import(_))
    }

    fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.filename.clone())
    }

    fn context(&self) -> Option<String> {
        match &self.kind {
            FrameKind::Base => None,
            FrameKind::Import(reference) => Some(format!("@import \"{reference}\"")),
            FrameKind::Mixin(name) => Some(format!("mixin `{name}`")),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.location())?;
        if let Some(context) = self.context() {
            write!(f, ", in {context}")?;
        }
        Ok(())
    }
}

/// Ordered frames, outermost first.
#[derive(Clone, Debug, Default)]
pub struct Stack {
    frames: Vec<Frame>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Pop the most recent frame.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if the stack is empty. In release mode,
    /// this is a no-op on an empty stack.
    pub fn pop(&mut self) {
        debug_assert!(!self.frames.is_empty(), "Stack::pop() called on empty stack");
        self.frames.pop();
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Position of the outermost import frame opened from `filename`.
    ///
    /// A unit that is already importing something further up the stack
    /// cannot be expanded again without looping.
    pub fn importing_position(&self, filename: &str) -> Option<usize> {
        self.frames
            .iter()
            .position(|frame| frame.is_import() && frame.filename.as_deref() == Some(filename))
    }

    /// Snapshot the frames as backtrace entries, most recent first.
    ///
    /// The base frame is left out: it names the compiled file itself, not a
    /// statement the error passed through.
    pub fn capture(&self) -> Vec<BacktraceEntry> {
        self.frames
            .iter()
            .rev()
            .filter_map(|frame| {
                let context = frame.context()?;
                Some(BacktraceEntry::new(frame.location()).with_context(context))
            })
            .collect()
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, frame) in self.frames.iter().rev().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{frame}")?;
        }
        Ok(())
    }
}

/// Reference-counted handle to the compilation's stack.
///
/// Single-threaded: a stack belongs to one compilation.
#[derive(Clone, Debug, Default)]
pub struct SharedStack(Rc<RefCell<Stack>>);

impl SharedStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the stack for inspection.
    pub fn borrow(&self) -> Ref<'_, Stack> {
        self.0.borrow()
    }

    /// Push `frame`; it is popped when the returned guard drops.
    pub fn enter(&self, frame: Frame) -> FrameGuard<'_> {
        self.0.borrow_mut().push(frame);
        FrameGuard { stack: self }
    }

    /// Run `f` with a frame for the top-level file.
    pub fn with_base<T>(&self, filename: Option<&str>, line: u32, f: impl FnOnce() -> T) -> T {
        let _guard = self.enter(Frame {
            filename: filename.map(str::to_string),
            line,
            kind: FrameKind::Base,
        });
        f()
    }

    /// Run `f` with a frame for `@import "<reference>"` at `line` of
    /// `filename`.
    pub fn with_import<T>(
        &self,
        filename: Option<&str>,
        line: u32,
        reference: &str,
        f: impl FnOnce() -> T,
    ) -> T {
        let _guard = self.enter(Frame {
            filename: filename.map(str::to_string),
            line,
            kind: FrameKind::Import(reference.to_string()),
        });
        f()
    }

    /// Run `f` with a frame for an `@include` of mixin `name`.
    pub fn with_mixin<T>(
        &self,
        filename: Option<&str>,
        line: u32,
        name: &str,
        f: impl FnOnce() -> T,
    ) -> T {
        let _guard = self.enter(Frame {
            filename: filename.map(str::to_string),
            line,
            kind: FrameKind::Mixin(name.to_string()),
        });
        f()
    }

    /// Append the live frames to `err`'s backtrace, most recent first.
    ///
    /// Call at the point the error is raised, while its frames are still
    /// open.
    #[must_use]
    pub fn attach_backtrace(&self, err: SyntaxError) -> SyntaxError {
        self.borrow()
            .capture()
            .into_iter()
            .fold(err, SyntaxError::with_backtrace_entry)
    }

    pub fn ptr_eq(&self, other: &SharedStack) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// RAII guard that pops its frame on drop, including during unwinding.
pub struct FrameGuard<'a> {
    stack: &'a SharedStack,
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        self.stack.0.borrow_mut().pop();
    }
}
