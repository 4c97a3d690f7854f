//! The frame arena behind an execution scope.
//!
//! # Layout
//!
//! Frames live in a [`SlotMap`] and link to their parent by [`FrameId`].
//! Exactly one chain is active at a time: `root → … → current`.  Popping a
//! frame retires its key, and slotmap generations guarantee a retired key is
//! never handed out again, so stale handles read as `None` instead of
//! aliasing a newer frame.
//!
//! # Lifetimes
//!
//! A child frame is only reachable through a [`FrameGuard`], which pops it on
//! every exit path (normal return, `?`, unwinding).  Bindings declared in the
//! child are therefore unreachable once the guard is gone.
//!
//! # Lookup and assignment
//!
//! | Operation     | Frame touched                                         |
//! |---------------|-------------------------------------------------------|
//! | `get`         | nearest frame declaring the name, walking to the root |
//! | `declare`     | current frame (shadows outer names)                   |
//! | `set`         | nearest frame declaring the name, else current        |
//! | `set_global`  | root frame                                            |

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

use abm_core::{AgentId, Bindings, Value};
use slotmap::{SlotMap, new_key_type};
use tracing::trace;

use crate::error::{ErrorKind, ScopeResult, ScopedError};
use crate::hold::{HoldController, HoldGate, Wake};
use crate::signal::Signal;

new_key_type! {
    /// Generational handle to one frame of an [`ExecutionScope`].
    pub struct FrameId;
}

#[derive(Debug)]
struct Frame {
    parent: Option<FrameId>,
    label:  String,
    /// Set on agent frames; inner frames inherit it through lookup.
    agent:  Option<AgentId>,
    locals: Bindings,
    depth:  usize,
}

/// A tree-shaped execution context for one simulation.
///
/// The root frame holds global bindings and lives as long as the scope.
/// Control signals are chain-wide: raising one in any frame is visible from
/// the root, which is how abort reaches the step coordinator.
#[derive(Debug)]
pub struct ExecutionScope {
    frames:  SlotMap<FrameId, Frame>,
    root:    FrameId,
    current: FrameId,
    signal:  Signal,
    gate:    HoldGate,
    trace:   bool,
}

impl Default for ExecutionScope {
    fn default() -> Self {
        Self::new("simulation")
    }
}

impl ExecutionScope {
    pub fn new(root_label: impl Into<String>) -> Self {
        let mut frames = SlotMap::with_key();
        let root = frames.insert(Frame {
            parent: None,
            label:  root_label.into(),
            agent:  None,
            locals: Bindings::new(),
            depth:  0,
        });
        Self { frames, root, current: root, signal: Signal::None, gate: HoldGate::new(), trace: false }
    }

    // ── Frames ────────────────────────────────────────────────────────────

    /// Enter a child frame.  The frame is popped when the guard drops.
    pub fn push(&mut self, label: impl Into<String>) -> FrameGuard<'_> {
        self.push_frame(label.into(), None)
    }

    /// Enter a child frame executing on behalf of `agent`.
    pub fn push_agent(&mut self, label: impl Into<String>, agent: AgentId) -> FrameGuard<'_> {
        self.push_frame(label.into(), Some(agent))
    }

    /// Run `f` inside a child frame.
    pub fn run_in<R>(&mut self, label: impl Into<String>, f: impl FnOnce(&mut ExecutionScope) -> R) -> R {
        let mut guard = self.push(label);
        f(&mut guard)
    }

    fn push_frame(&mut self, label: String, agent: Option<AgentId>) -> FrameGuard<'_> {
        let depth = self.depth() + 1;
        if self.trace {
            trace!(depth, "{:indent$}enter {label}", "", indent = depth * 2);
        }
        let frame = self.frames.insert(Frame {
            parent: Some(self.current),
            label,
            agent,
            locals: Bindings::new(),
            depth,
        });
        self.current = frame;
        FrameGuard { scope: self, frame }
    }

    /// Pop `frame` and anything still stacked above it.
    fn pop_through(&mut self, frame: FrameId) {
        if frame == self.root || !self.frames.contains_key(frame) {
            return;
        }
        while self.current != self.root {
            let id = self.current;
            let Some(top) = self.frames.remove(id) else { break };
            if self.trace {
                trace!(depth = top.depth, "{:indent$}exit {}", "", top.label, indent = top.depth * 2);
            }
            self.current = top.parent.unwrap_or(self.root);
            if id == frame {
                break;
            }
        }
    }

    #[inline]
    pub fn root(&self) -> FrameId {
        self.root
    }

    #[inline]
    pub fn current(&self) -> FrameId {
        self.current
    }

    /// 0 at the root.
    pub fn depth(&self) -> usize {
        self.frames.get(self.current).map_or(0, |f| f.depth)
    }

    /// `true` while `frame` is on the active chain.
    pub fn is_live(&self, frame: FrameId) -> bool {
        self.frames.contains_key(frame)
    }

    /// Locals of one frame; `None` once it has been popped.
    pub fn frame_locals(&self, frame: FrameId) -> Option<&Bindings> {
        self.frames.get(frame).map(|f| &f.locals)
    }

    fn chain(&self) -> impl Iterator<Item = &Frame> {
        std::iter::successors(self.frames.get(self.current), move |f| f.parent.and_then(|p| self.frames.get(p)))
    }

    /// The agent the current frame executes for, if any.
    pub fn agent(&self) -> Option<AgentId> {
        self.chain().find_map(|f| f.agent)
    }

    /// Frame labels from the root to the current frame, `/`-separated.
    pub fn location(&self) -> String {
        let mut labels: Vec<&str> = self.chain().map(|f| f.label.as_str()).collect();
        labels.reverse();
        labels.join("/")
    }

    /// Log every frame push / pop at `trace` level, indented by depth.
    pub fn set_trace(&mut self, on: bool) {
        self.trace = on;
    }

    pub fn is_tracing(&self) -> bool {
        self.trace
    }

    // ── Bindings ──────────────────────────────────────────────────────────

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.chain().find_map(|f| f.locals.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Declare `name` in the current frame, shadowing outer frames.
    pub fn declare(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        if let Some(f) = self.frames.get_mut(self.current) {
            f.locals.insert(name.into(), value.into());
        }
    }

    /// Assign to the nearest frame that declares `name`; declare it in the
    /// current frame if none does.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        let mut cursor = Some(self.current);
        let mut target = self.current;
        while let Some(id) = cursor {
            let Some(frame) = self.frames.get(id) else { break };
            if frame.locals.contains_key(name) {
                target = id;
                break;
            }
            cursor = frame.parent;
        }
        if let Some(f) = self.frames.get_mut(target) {
            f.locals.insert(name.to_owned(), value.into());
        }
    }

    pub fn get_global(&self, name: &str) -> Option<&Value> {
        self.frames.get(self.root).and_then(|f| f.locals.get(name))
    }

    pub fn set_global(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        if let Some(f) = self.frames.get_mut(self.root) {
            f.locals.insert(name.into(), value.into());
        }
    }

    pub fn globals(&self) -> Option<&Bindings> {
        self.frame_locals(self.root)
    }

    /// The current frame's own bindings.
    pub fn locals(&self) -> Option<&Bindings> {
        self.frame_locals(self.current)
    }

    /// Copy the current frame's bindings into `out`, replacing its contents.
    pub fn save_locals_into(&self, out: &mut Bindings) {
        out.clear();
        if let Some(locals) = self.locals() {
            out.extend(locals.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
    }

    /// Declare every entry of `saved` in the current frame.
    pub fn restore_locals(&mut self, saved: &Bindings) {
        if let Some(f) = self.frames.get_mut(self.current) {
            f.locals.extend(saved.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
    }

    /// Every binding visible from the current frame (nearest wins), in name
    /// order.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        let mut out = BTreeMap::new();
        for frame in self.chain() {
            for (k, v) in &frame.locals {
                out.entry(k.clone()).or_insert_with(|| v.clone());
            }
        }
        out
    }

    // ── Signals ───────────────────────────────────────────────────────────

    #[inline]
    pub fn signal(&self) -> Signal {
        self.signal
    }

    /// Make `signal` the active one.  A pending abort is never downgraded.
    pub fn raise(&mut self, signal: Signal) {
        if self.signal == Signal::Abort && signal != Signal::Abort {
            return;
        }
        self.signal = signal;
    }

    /// Consume the active signal if it is `expected`.
    pub fn take_signal(&mut self, expected: Signal) -> bool {
        if self.signal == expected && expected != Signal::None {
            self.signal = Signal::None;
            true
        } else {
            false
        }
    }

    /// Clear any signal except a pending abort.
    pub fn clear_signal(&mut self) {
        if self.signal != Signal::Abort {
            self.signal = Signal::None;
        }
    }

    /// Clear everything, abort included.  Used by the host after it has
    /// handled an aborted cycle.
    pub fn reset_signal(&mut self) {
        self.signal = Signal::None;
        self.gate.reset();
    }

    #[inline]
    pub fn interrupted(&self) -> bool {
        self.signal.interrupts()
    }

    #[inline]
    pub fn is_aborted(&self) -> bool {
        self.signal == Signal::Abort
    }

    // ── Suspension ────────────────────────────────────────────────────────

    pub fn hold_controller(&self) -> HoldController {
        self.gate.controller()
    }

    /// Raise `Pause` and block until the host releases the hold.  An abort
    /// request while suspended turns into an `Abort` signal.
    pub fn pause(&mut self) -> Signal {
        self.raise(Signal::Pause);
        self.gate.hold();
        self.checkpoint()
    }

    /// Honour a hold or abort request from the host.  Blocks while the gate
    /// is held; returns the signal active afterwards.
    pub fn checkpoint(&mut self) -> Signal {
        match self.gate.wait() {
            Wake::Released => {
                self.take_signal(Signal::Pause);
            }
            Wake::AbortRequested => self.raise(Signal::Abort),
        }
        self.signal
    }

    // ── Errors ────────────────────────────────────────────────────────────

    fn scoped(&self, kind: ErrorKind, message: impl Into<String>) -> ScopedError {
        ScopedError { kind, agent: self.agent(), location: self.location(), message: message.into() }
    }

    /// A recoverable runtime error attributed to the current agent and frame.
    pub fn error(&self, message: impl Into<String>) -> ScopedError {
        self.scoped(ErrorKind::Runtime { abort: false }, message)
    }

    /// An abort-class runtime error.  Also raises `Abort`.
    pub fn fatal(&mut self, message: impl Into<String>) -> ScopedError {
        self.raise(Signal::Abort);
        self.scoped(ErrorKind::Runtime { abort: true }, message)
    }

    /// Model-author check.  A failure is an assertion error; `fatal` selects
    /// the abort path, otherwise it is a warning.
    pub fn check(&mut self, condition: bool, message: impl Into<String>, fatal: bool) -> ScopeResult<()> {
        if condition {
            return Ok(());
        }
        let err = self.scoped(ErrorKind::Assertion { fatal }, message);
        if fatal {
            self.raise(Signal::Abort);
        }
        Err(err)
    }

    /// Attribute a raw fault from outside the runtime to the current frame.
    pub fn attribute<T, E: std::fmt::Display>(&self, result: Result<T, E>) -> ScopeResult<T> {
        result.map_err(|e| self.error(e.to_string()))
    }
}

// ── FrameGuard ────────────────────────────────────────────────────────────────

/// An entered child frame.  Dereferences to the scope; pops the frame on
/// drop.
#[derive(Debug)]
pub struct FrameGuard<'s> {
    scope: &'s mut ExecutionScope,
    frame: FrameId,
}

impl FrameGuard<'_> {
    pub fn id(&self) -> FrameId {
        self.frame
    }
}

impl Deref for FrameGuard<'_> {
    type Target = ExecutionScope;

    fn deref(&self) -> &ExecutionScope {
        self.scope
    }
}

impl DerefMut for FrameGuard<'_> {
    fn deref_mut(&mut self) -> &mut ExecutionScope {
        self.scope
    }
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        self.scope.pop_through(self.frame);
    }
}
