//! Compiled behavior bodies and guards.
//!
//! The model compiler hands the runtime plain closures.  They are shared
//! (`Arc`) so one model can drive many replicates at once.

use std::fmt;
use std::sync::Arc;

use abm_scope::ScopeResult;

use crate::Ctx;

type ActionFn = dyn Fn(&mut Ctx<'_>) -> ScopeResult<()> + Send + Sync;
type ConditionFn = dyn Fn(&mut Ctx<'_>) -> ScopeResult<bool> + Send + Sync;

/// A statement block.
#[derive(Clone)]
pub struct Action(Arc<ActionFn>);

/// A guard expression.
#[derive(Clone)]
pub struct Condition(Arc<ConditionFn>);

impl Action {
    pub fn new(f: impl Fn(&mut Ctx<'_>) -> ScopeResult<()> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    #[inline]
    pub fn run(&self, ctx: &mut Ctx<'_>) -> ScopeResult<()> {
        (self.0)(ctx)
    }
}

impl Condition {
    pub fn new(f: impl Fn(&mut Ctx<'_>) -> ScopeResult<bool> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn always() -> Self {
        Self::new(|_| Ok(true))
    }

    #[inline]
    pub fn eval(&self, ctx: &mut Ctx<'_>) -> ScopeResult<bool> {
        (self.0)(ctx)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Action(..)")
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Condition(..)")
    }
}

/// Shorthand for [`Action::new`].
pub fn action(f: impl Fn(&mut Ctx<'_>) -> ScopeResult<()> + Send + Sync + 'static) -> Action {
    Action::new(f)
}

/// Shorthand for [`Condition::new`].
pub fn when(f: impl Fn(&mut Ctx<'_>) -> ScopeResult<bool> + Send + Sync + 'static) -> Condition {
    Condition::new(f)
}
