//! Rule and sequence architectures.

use std::collections::HashSet;

use abm_core::Violations;
use abm_scope::{ScopeResult, Signal};

use crate::action::{Action, Condition};
use crate::architecture::StepOutcome;
use crate::Ctx;

// ── Rules ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Rule {
    pub name:     String,
    pub priority: i32,
    pub when:     Condition,
    pub body:     Action,
}

impl Rule {
    pub fn new(name: impl Into<String>, when: Condition, body: Action) -> Self {
        Self { name: name.into(), priority: 0, when, body }
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Runs the first rule whose condition holds.  Rules are tried by
/// descending priority, declaration order breaking ties.
#[derive(Clone, Debug)]
pub struct Rules {
    rules: Vec<Rule>,
}

impl Rules {
    pub fn new(mut rules: Vec<Rule>) -> Self {
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub(crate) fn step(&self, ctx: &mut Ctx<'_>) -> ScopeResult<StepOutcome> {
        for rule in &self.rules {
            if rule.when.eval(ctx)? {
                ctx.block(&format!("rule:{}", rule.name), |ctx| rule.body.run(ctx))?;
                ctx.scope.take_signal(Signal::Return);
                return Ok(StepOutcome::Ran);
            }
            if ctx.interrupted() {
                return Ok(StepOutcome::Interrupted(ctx.scope.signal()));
            }
        }
        Ok(StepOutcome::Idle)
    }

    pub(crate) fn verify_into(&self, species: &str, v: &mut Violations) {
        if self.rules.is_empty() {
            v.push(species, "rule set is empty");
        }
        duplicates(species, "rule", self.rules.iter().map(|r| r.name.as_str()), v);
    }
}

// ── Sequence ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Step {
    pub name:  String,
    pub guard: Option<Condition>,
    pub body:  Action,
}

impl Step {
    pub fn new(name: impl Into<String>, body: Action) -> Self {
        Self { name: name.into(), guard: None, body }
    }

    pub fn when(mut self, guard: Condition) -> Self {
        self.guard = Some(guard);
        self
    }
}

/// Runs every step in order as one behavior.  A step whose guard fails is
/// skipped.  `Continue` moves on to the next step; `Break` and `Return` end
/// the sequence.
#[derive(Clone, Debug)]
pub struct Sequence {
    steps: Vec<Step>,
}

impl Sequence {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub(crate) fn step(&self, ctx: &mut Ctx<'_>) -> ScopeResult<StepOutcome> {
        let mut ran = false;
        for step in &self.steps {
            if let Some(guard) = &step.guard {
                if !guard.eval(ctx)? {
                    continue;
                }
            }
            ctx.block(&format!("step:{}", step.name), |ctx| step.body.run(ctx))?;
            ran = true;
            if ctx.scope.take_signal(Signal::Continue) {
                continue;
            }
            if ctx.scope.take_signal(Signal::Break) || ctx.scope.take_signal(Signal::Return) {
                break;
            }
            if ctx.interrupted() {
                return Ok(StepOutcome::Interrupted(ctx.scope.signal()));
            }
        }
        Ok(if ran { StepOutcome::Ran } else { StepOutcome::Idle })
    }

    pub(crate) fn verify_into(&self, species: &str, v: &mut Violations) {
        if self.steps.is_empty() {
            v.push(species, "sequence is empty");
        }
        duplicates(species, "step", self.steps.iter().map(|s| s.name.as_str()), v);
    }
}

fn duplicates<'a>(species: &str, what: &str, names: impl Iterator<Item = &'a str>, v: &mut Violations) {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for name in names {
        if !seen.insert(name) && reported.insert(name) {
            v.push(format!("{species}/{name}"), format!("duplicate {what} name"));
        }
    }
}
