//! The mutable view a behavior runs against.

use abm_agent::{ControlState, LifecycleRequests};
use abm_core::{AgentId, Bindings, Cycle, RandomGenerator, Value};
use abm_scope::{ExecutionScope, ScopeResult, ScopedError, Signal};

/// Everything one agent's behavior may touch during its step.
///
/// Built by the step coordinator for a single agent and dropped before the
/// next agent runs, so behaviors for different agents never interleave.
/// Births and deaths go through `requests`; they are applied at the end of
/// the cycle.
pub struct Ctx<'a> {
    pub scope:    &'a mut ExecutionScope,
    pub agent:    AgentId,
    pub species:  &'a str,
    pub attrs:    &'a mut Bindings,
    pub rng:      &'a mut RandomGenerator,
    pub requests: &'a mut LifecycleRequests,
    pub cycle:    Cycle,
    pub(crate) control: &'a mut ControlState,
}

impl<'a> Ctx<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        scope:    &'a mut ExecutionScope,
        agent:    AgentId,
        species:  &'a str,
        attrs:    &'a mut Bindings,
        control:  &'a mut ControlState,
        rng:      &'a mut RandomGenerator,
        requests: &'a mut LifecycleRequests,
        cycle:    Cycle,
    ) -> Self {
        Self { scope, agent, species, attrs, rng, requests, cycle, control }
    }

    /// Run `f` in a child frame labelled `label`.  Locals declared inside are
    /// gone when it returns, whichever way it returns.
    pub fn block<R>(&mut self, label: &str, f: impl FnOnce(&mut Ctx<'_>) -> R) -> R {
        let mut guard = self.scope.push(label);
        let mut inner = Ctx {
            scope:    &mut *guard,
            agent:    self.agent,
            species:  self.species,
            attrs:    &mut *self.attrs,
            rng:      &mut *self.rng,
            requests: &mut *self.requests,
            cycle:    self.cycle,
            control:  &mut *self.control,
        };
        f(&mut inner)
    }

    // ── Variables ─────────────────────────────────────────────────────────

    /// Scope locals shadow agent attributes, which shadow nothing.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.scope.get(name).or_else(|| self.attrs.get(name))
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_float)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    /// Assign to a visible local, else to an existing attribute, else
    /// declare a new local in the current frame.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        if self.scope.contains(name) {
            self.scope.set(name, value);
        } else if let Some(slot) = self.attrs.get_mut(name) {
            *slot = value;
        } else {
            self.scope.declare(name, value);
        }
    }

    pub fn declare(&mut self, name: &str, value: impl Into<Value>) {
        self.scope.declare(name, value);
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<Value>) {
        self.attrs.insert(name.to_owned(), value.into());
    }

    /// Add `delta` to a numeric attribute, creating it at 0 if absent.
    pub fn add_attr(&mut self, name: &str, delta: i64) -> ScopeResult<i64> {
        let current = match self.attrs.get(name) {
            None => 0,
            Some(Value::Int(i)) => *i,
            Some(other) => {
                return Err(self.error(format!("attribute '{name}' is {}, not int", other.type_name())));
            }
        };
        let Some(next) = current.checked_add(delta) else {
            return Err(self.error(format!("attribute '{name}' overflows: {current} + {delta}")));
        };
        self.attrs.insert(name.to_owned(), Value::Int(next));
        Ok(next)
    }

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.scope.get_global(name)
    }

    pub fn set_global(&mut self, name: &str, value: impl Into<Value>) {
        self.scope.set_global(name, value);
    }

    // ── Control ───────────────────────────────────────────────────────────

    /// Current FSM state, if the architecture has one.
    pub fn state(&self) -> Option<&str> {
        self.control.state.as_deref()
    }

    /// Force a state change; the new state's enter block runs next step.
    pub fn go_to(&mut self, state: &str) {
        if self.control.state.as_deref() != Some(state) {
            self.control.enter_state(state);
        }
    }

    /// This agent dies at the end of its step.
    pub fn die(&mut self) {
        self.requests.request_death(self.agent);
        self.scope.raise(Signal::Die);
    }

    /// Queue the death of another agent.  It will not run again this cycle.
    pub fn kill(&mut self, other: AgentId) {
        if other == self.agent {
            self.die();
        } else {
            self.requests.request_death(other);
        }
    }

    /// Queue a new agent.  It is created after this cycle and first runs in
    /// the next one.
    pub fn spawn(&mut self, species: &str, attributes: Bindings) {
        self.requests.request_birth(species, attributes, Some(self.agent));
    }

    pub fn raise(&mut self, signal: Signal) {
        self.scope.raise(signal);
    }

    /// Block until the host releases the hold.
    pub fn pause(&mut self) -> Signal {
        self.scope.pause()
    }

    #[inline]
    pub fn interrupted(&self) -> bool {
        self.scope.interrupted()
    }

    // ── Errors ────────────────────────────────────────────────────────────

    pub fn error(&self, message: impl Into<String>) -> ScopedError {
        self.scope.error(message)
    }

    pub fn fatal(&mut self, message: impl Into<String>) -> ScopedError {
        self.scope.fatal(message)
    }

    pub fn check(&mut self, condition: bool, message: impl Into<String>, fatal: bool) -> ScopeResult<()> {
        self.scope.check(condition, message, fatal)
    }
}
