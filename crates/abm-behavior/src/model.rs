//! `Model`: the compiled, read-only behavior definition a simulation runs.

use std::collections::BTreeMap;

use abm_core::{Bindings, Value, Violations};

use crate::architecture::Architecture;
use crate::error::{BehaviorError, BehaviorResult};

/// Species name → architecture, plus initial global bindings.
///
/// A model holds no per-run state, so one `Arc<Model>` can drive any number
/// of replicates in parallel.
#[derive(Clone, Debug, Default)]
pub struct Model {
    name:    String,
    species: BTreeMap<String, Architecture>,
    globals: Bindings,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    /// Register (or replace) the architecture driving `species`.
    pub fn species(mut self, species: impl Into<String>, architecture: Architecture) -> Self {
        self.species.insert(species.into(), architecture);
        self
    }

    pub fn global(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.globals.insert(name.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn globals(&self) -> &Bindings {
        &self.globals
    }

    pub fn species_names(&self) -> impl Iterator<Item = &str> {
        self.species.keys().map(String::as_str)
    }

    pub fn architecture(&self, species: &str) -> BehaviorResult<&Architecture> {
        self.species
            .get(species)
            .ok_or_else(|| BehaviorError::UnknownSpecies(species.to_owned()))
    }

    /// Verify every species' behavior set in one pass.  The error lists all
    /// violations across all species.
    pub fn verify(&self) -> BehaviorResult<()> {
        let mut v = Violations::new(format!("model '{}'", self.name));
        if self.species.is_empty() {
            v.push(self.name.as_str(), "model declares no species");
        }
        for (species, arch) in &self.species {
            arch.verify_into(species, &mut v);
        }
        v.finish().map_err(BehaviorError::from)
    }
}
