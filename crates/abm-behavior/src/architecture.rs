//! The per-species behavior engine.
//!
//! An [`Architecture`] is one of a fixed set of [`Kind`]s plus the hooks
//! every kind shares:
//!
//! | Hook      | When                                                       |
//! |-----------|------------------------------------------------------------|
//! | `init`    | once, before the agent's first step                        |
//! | `before`  | every step, ahead of the selected behavior                 |
//! | `after`   | every step, after the selected behavior                    |
//!
//! Exactly one top-level behavior runs per step: the first matching rule,
//! the current FSM state, the whole sequence, or whatever a custom kind
//! picks.

use std::fmt;
use std::sync::Arc;

use abm_agent::Phase;
use abm_core::{ValidationError, Violations};
use abm_scope::{ScopeResult, Signal};
use tracing::trace;

use crate::action::Action;
use crate::fsm::{Fsm, State};
use crate::reflex::{Rule, Rules, Sequence, Step};
use crate::Ctx;

/// What one step did.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum StepOutcome {
    /// A behavior ran to completion.
    Ran,
    /// Nothing was selected this step.
    Idle,
    /// A signal cut the step short.
    Interrupted(Signal),
}

/// Extension point for behavior kinds outside the built-in set.
pub trait ArchitectureExt: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn init(&self, _ctx: &mut Ctx<'_>) -> ScopeResult<()> {
        Ok(())
    }

    fn pre_step(&self, _ctx: &mut Ctx<'_>) -> ScopeResult<()> {
        Ok(())
    }

    fn step(&self, ctx: &mut Ctx<'_>) -> ScopeResult<StepOutcome>;

    fn abort(&self, _ctx: &mut Ctx<'_>) -> ScopeResult<()> {
        Ok(())
    }

    /// Push every structural problem found into `v`.
    fn verify(&self, _species: &str, _v: &mut Violations) {}
}

#[derive(Clone, Debug)]
pub enum Kind {
    Rules(Rules),
    Fsm(Fsm),
    Sequence(Sequence),
    Custom(Arc<dyn ArchitectureExt>),
}

impl Kind {
    pub fn name(&self) -> &str {
        match self {
            Kind::Rules(_) => "rules",
            Kind::Fsm(_) => "fsm",
            Kind::Sequence(_) => "sequence",
            Kind::Custom(ext) => ext.name(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Architecture {
    kind:   Kind,
    init:   Vec<Action>,
    before: Vec<Action>,
    after:  Vec<Action>,
}

impl Architecture {
    pub fn new(kind: Kind) -> Self {
        Self { kind, init: Vec::new(), before: Vec::new(), after: Vec::new() }
    }

    pub fn rules(rules: Vec<Rule>) -> Self {
        Self::new(Kind::Rules(Rules::new(rules)))
    }

    pub fn fsm(states: Vec<State>) -> Self {
        Self::new(Kind::Fsm(Fsm::new(states)))
    }

    pub fn sequence(steps: Vec<Step>) -> Self {
        Self::new(Kind::Sequence(Sequence::new(steps)))
    }

    pub fn custom(ext: impl ArchitectureExt + 'static) -> Self {
        Self::new(Kind::Custom(Arc::new(ext)))
    }

    pub fn on_init(mut self, action: Action) -> Self {
        self.init.push(action);
        self
    }

    pub fn before(mut self, action: Action) -> Self {
        self.before.push(action);
        self
    }

    pub fn after(mut self, action: Action) -> Self {
        self.after.push(action);
        self
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Run the init blocks and move the agent to `Initialized`.  Init is
    /// attempted once: the phase moves first, so a failing block is never
    /// re-run and a second call is a no-op.
    pub fn init(&self, ctx: &mut Ctx<'_>) -> ScopeResult<()> {
        if ctx.control.phase != Phase::Uninitialized {
            return Ok(());
        }
        ctx.control.phase = Phase::Initialized;
        for action in &self.init {
            ctx.block("init", |ctx| action.run(ctx))?;
            ctx.scope.take_signal(Signal::Return);
            if ctx.interrupted() {
                break;
            }
        }
        match &self.kind {
            Kind::Fsm(fsm) => fsm.init(ctx)?,
            Kind::Custom(ext) => ext.init(ctx)?,
            Kind::Rules(_) | Kind::Sequence(_) => {}
        }
        Ok(())
    }

    /// Per-cycle bookkeeping ahead of [`step`](Self::step): drops flow
    /// signals left over from the previous agent.
    pub fn pre_step(&self, ctx: &mut Ctx<'_>) -> ScopeResult<()> {
        ctx.scope.clear_signal();
        if ctx.control.phase == Phase::Uninitialized {
            self.init(ctx)?;
        }
        match &self.kind {
            Kind::Fsm(fsm) if ctx.control.state.is_none() => fsm.init(ctx),
            Kind::Custom(ext) => ext.pre_step(ctx),
            _ => Ok(()),
        }
    }

    /// Run this step's hooks and its one selected behavior.
    pub fn step(&self, ctx: &mut Ctx<'_>) -> ScopeResult<StepOutcome> {
        match ctx.control.phase {
            Phase::Initialized => {}
            Phase::Aborted => return Ok(StepOutcome::Idle),
            Phase::Uninitialized => return Err(ctx.error("agent stepped before init")),
        }

        if let Some(signal) = self.hooks(ctx, &self.before, "before")? {
            return Ok(StepOutcome::Interrupted(signal));
        }

        let outcome = match &self.kind {
            Kind::Rules(rules) => rules.step(ctx)?,
            Kind::Fsm(fsm) => fsm.step(ctx)?,
            Kind::Sequence(seq) => seq.step(ctx)?,
            Kind::Custom(ext) => ext.step(ctx)?,
        };
        ctx.scope.take_signal(Signal::Return);
        if ctx.interrupted() {
            return Ok(StepOutcome::Interrupted(ctx.scope.signal()));
        }

        if let Some(signal) = self.hooks(ctx, &self.after, "after")? {
            return Ok(StepOutcome::Interrupted(signal));
        }

        ctx.control.steps += 1;
        trace!(agent = %ctx.agent, kind = self.kind.name(), ?outcome, "agent step");
        Ok(outcome)
    }

    /// Terminal: run the kind's exit logic and mark the agent `Aborted`.
    pub fn abort(&self, ctx: &mut Ctx<'_>) -> ScopeResult<()> {
        if ctx.control.phase == Phase::Aborted {
            return Ok(());
        }
        ctx.control.phase = Phase::Aborted;
        match &self.kind {
            Kind::Fsm(fsm) => fsm.abort(ctx),
            Kind::Custom(ext) => ext.abort(ctx),
            Kind::Rules(_) | Kind::Sequence(_) => Ok(()),
        }
    }

    fn hooks(&self, ctx: &mut Ctx<'_>, hooks: &[Action], label: &str) -> ScopeResult<Option<Signal>> {
        for hook in hooks {
            ctx.block(label, |ctx| hook.run(ctx))?;
            ctx.scope.take_signal(Signal::Return);
            if ctx.interrupted() {
                return Ok(Some(ctx.scope.signal()));
            }
        }
        Ok(None)
    }

    // ── Verification ──────────────────────────────────────────────────────

    /// Check the behavior set once, reporting every problem found.
    pub fn verify(&self, species: &str) -> Result<(), ValidationError> {
        let mut v = Violations::new(format!("behaviors of '{species}'"));
        self.verify_into(species, &mut v);
        v.finish()
    }

    pub fn verify_into(&self, species: &str, v: &mut Violations) {
        match &self.kind {
            Kind::Rules(rules) => rules.verify_into(species, v),
            Kind::Fsm(fsm) => fsm.verify_into(species, v),
            Kind::Sequence(seq) => seq.verify_into(species, v),
            Kind::Custom(ext) => ext.verify(species, v),
        }
    }
}
