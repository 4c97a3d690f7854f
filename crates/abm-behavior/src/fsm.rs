//! Finite-state machine architecture.
//!
//! Each cycle the agent runs its current state:
//!
//! 1. restore the state's remembered locals (unless just entered),
//! 2. run `enter` once after every transition into the state,
//! 3. run the body,
//! 4. unless the state is final, evaluate transitions in declaration order;
//!    the first that holds runs the state's `exit`, then its own action, and
//!    switches state (the target's `enter` runs next cycle),
//! 5. if no transition fired, remember the state's locals.
//!
//! All of it happens in one `state:<name>` frame, so anything declared in
//! `enter` or the body is part of the state memory.

use std::collections::HashMap;

use abm_core::Violations;
use abm_scope::{ScopeResult, Signal};

use crate::action::{Action, Condition};
use crate::architecture::StepOutcome;
use crate::Ctx;

#[derive(Clone, Debug)]
pub struct Transition {
    pub target: String,
    pub when:   Condition,
    pub action: Option<Action>,
}

#[derive(Clone, Debug)]
pub struct State {
    pub name:        String,
    pub initial:     bool,
    pub is_final:    bool,
    pub enter:       Option<Action>,
    pub body:        Option<Action>,
    pub exit:        Option<Action>,
    pub transitions: Vec<Transition>,
}

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name:        name.into(),
            initial:     false,
            is_final:    false,
            enter:       None,
            body:        None,
            exit:        None,
            transitions: Vec::new(),
        }
    }

    pub fn initial(mut self) -> Self {
        self.initial = true;
        self
    }

    pub fn final_state(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn on_enter(mut self, action: Action) -> Self {
        self.enter = Some(action);
        self
    }

    pub fn body(mut self, action: Action) -> Self {
        self.body = Some(action);
        self
    }

    pub fn on_exit(mut self, action: Action) -> Self {
        self.exit = Some(action);
        self
    }

    pub fn transition(mut self, target: impl Into<String>, when: Condition) -> Self {
        self.transitions.push(Transition { target: target.into(), when, action: None });
        self
    }

    pub fn transition_with(mut self, target: impl Into<String>, when: Condition, action: Action) -> Self {
        self.transitions.push(Transition { target: target.into(), when, action: Some(action) });
        self
    }

    fn execute(&self, ctx: &mut Ctx<'_>) -> ScopeResult<StepOutcome> {
        if ctx.control.entering {
            ctx.control.memory.clear();
        } else {
            let memory = ctx.control.memory.clone();
            ctx.scope.restore_locals(&memory);
        }

        if ctx.control.entering {
            if let Some(enter) = &self.enter {
                enter.run(ctx)?;
            }
            if ctx.interrupted() {
                return Ok(StepOutcome::Interrupted(ctx.scope.signal()));
            }
            ctx.control.entering = false;
        }

        if let Some(body) = &self.body {
            body.run(ctx)?;
        }
        ctx.scope.take_signal(Signal::Return);
        if ctx.interrupted() {
            return Ok(StepOutcome::Interrupted(ctx.scope.signal()));
        }
        // The body forced a state change.
        if ctx.control.state.as_deref() != Some(self.name.as_str()) {
            return Ok(StepOutcome::Ran);
        }

        if !self.is_final {
            for t in &self.transitions {
                if t.when.eval(ctx)? {
                    if let Some(exit) = &self.exit {
                        exit.run(ctx)?;
                    }
                    if let Some(action) = &t.action {
                        action.run(ctx)?;
                    }
                    ctx.control.enter_state(t.target.as_str());
                    return Ok(StepOutcome::Ran);
                }
            }
        }

        ctx.scope.save_locals_into(&mut ctx.control.memory);
        Ok(StepOutcome::Ran)
    }
}

#[derive(Clone, Debug)]
pub struct Fsm {
    states: Vec<State>,
    index:  HashMap<String, usize>,
}

impl Fsm {
    pub fn new(states: Vec<State>) -> Self {
        let mut index = HashMap::with_capacity(states.len());
        for (i, s) in states.iter().enumerate() {
            index.entry(s.name.clone()).or_insert(i);
        }
        Self { states, index }
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn state(&self, name: &str) -> Option<&State> {
        self.index.get(name).map(|&i| &self.states[i])
    }

    pub fn initial(&self) -> Option<&State> {
        self.states.iter().find(|s| s.initial)
    }

    pub(crate) fn init(&self, ctx: &mut Ctx<'_>) -> ScopeResult<()> {
        let Some(initial) = self.initial() else {
            return Err(ctx.error("state machine has no initial state"));
        };
        if ctx.control.state.is_none() {
            ctx.control.enter_state(initial.name.as_str());
        }
        Ok(())
    }

    pub(crate) fn step(&self, ctx: &mut Ctx<'_>) -> ScopeResult<StepOutcome> {
        let Some(name) = ctx.control.state.clone() else {
            return Ok(StepOutcome::Idle);
        };
        let Some(state) = self.state(&name) else {
            return Err(ctx.error(format!("unknown state '{name}'")));
        };
        ctx.block(&format!("state:{name}"), |ctx| state.execute(ctx))
    }

    /// Run the current state's exit block.
    pub(crate) fn abort(&self, ctx: &mut Ctx<'_>) -> ScopeResult<()> {
        let Some(state) = ctx.control.state.as_deref().and_then(|n| self.state(n)) else {
            return Ok(());
        };
        match &state.exit {
            Some(exit) => ctx.block(&format!("exit:{}", state.name), |ctx| exit.run(ctx)),
            None => Ok(()),
        }
    }

    pub(crate) fn verify_into(&self, species: &str, v: &mut Violations) {
        if self.states.is_empty() {
            v.push(species, "state machine declares no states");
            return;
        }

        let initials: Vec<&str> = self.states.iter().filter(|s| s.initial).map(|s| s.name.as_str()).collect();
        match initials.len() {
            0 => v.push(species, "no initial state"),
            1 => {}
            _ => v.push(species, format!("multiple initial states: {}", initials.join(", "))),
        }

        let mut seen = HashMap::new();
        for s in &self.states {
            let count = seen.entry(s.name.as_str()).or_insert(0);
            *count += 1;
            if *count == 2 {
                v.push(format!("{species}/{}", s.name), "duplicate state name");
            }
        }

        for s in &self.states {
            let subject = format!("{species}/{}", s.name);
            if s.is_final && !s.transitions.is_empty() {
                v.push(subject.as_str(), "final state declares transitions");
            }
            for t in &s.transitions {
                if !self.index.contains_key(&t.target) {
                    v.push(subject.as_str(), format!("transition to unknown state '{}'", t.target));
                }
            }
        }
    }
}
