// src/probe/mock.rs

use super::{Relation, StructureProbe};
use anyhow::{anyhow, Result};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

type Pair = (String, String);

#[derive(Debug, Default)]
struct MockState {
    relations: HashMap<Pair, Relation>,
    distances: HashMap<Pair, f64>,
    containers: HashSet<Pair>,
    failing: HashSet<Pair>,
    calls: usize,
}

/// In-memory probe for tests and offline planning.
///
/// All facts are symmetric: registering `contains("a", "b")` also answers
/// `relation("b", "a") == ContainedBy`. Pairs registered with
/// [`MockProbe::fail_pair`] return an error from every query.
#[derive(Debug, Clone, Default)]
pub struct MockProbe {
    state: Arc<Mutex<MockState>>,
}

fn pair(a: &str, b: &str) -> Pair {
    (a.to_string(), b.to_string())
}

impl MockProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// `outer` structurally contains `inner`.
    pub fn contains(&self, outer: &str, inner: &str) -> &Self {
        self.set_relation(outer, inner, Relation::Contains)
    }

    /// Both tasks live in the same tab/accordion component.
    pub fn same_component(&self, a: &str, b: &str) -> &Self {
        self.set_relation(a, b, Relation::SharedComponent)
    }

    pub fn set_relation(&self, a: &str, b: &str, relation: Relation) -> &Self {
        let mut state = self.state.lock().unwrap();
        state.relations.insert(pair(a, b), relation);
        state.relations.insert(pair(b, a), relation.inverse());
        self
    }

    pub fn set_distance(&self, a: &str, b: &str, distance: f64) -> &Self {
        let mut state = self.state.lock().unwrap();
        state.distances.insert(pair(a, b), distance);
        state.distances.insert(pair(b, a), distance);
        self
    }

    pub fn share_container_between(&self, a: &str, b: &str) -> &Self {
        let mut state = self.state.lock().unwrap();
        state.containers.insert(pair(a, b));
        state.containers.insert(pair(b, a));
        self
    }

    /// Make every query about this pair fail.
    pub fn fail_pair(&self, a: &str, b: &str) -> &Self {
        let mut state = self.state.lock().unwrap();
        state.failing.insert(pair(a, b));
        state.failing.insert(pair(b, a));
        self
    }

    /// Number of queries answered (or failed) so far.
    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    fn check(&self, a: &str, b: &str) -> Result<std::sync::MutexGuard<'_, MockState>> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        if state.failing.contains(&pair(a, b)) {
            return Err(anyhow!("probe query failed for ({a}, {b})"));
        }
        Ok(state)
    }
}

impl StructureProbe for MockProbe {
    fn relation(&self, a: &str, b: &str) -> Result<Relation> {
        let state = self.check(a, b)?;
        Ok(state
            .relations
            .get(&pair(a, b))
            .copied()
            .unwrap_or(Relation::Unrelated))
    }

    fn distance(&self, a: &str, b: &str) -> Result<f64> {
        let state = self.check(a, b)?;
        Ok(state
            .distances
            .get(&pair(a, b))
            .copied()
            .unwrap_or(f64::INFINITY))
    }

    fn share_container(&self, a: &str, b: &str) -> Result<bool> {
        let state = self.check(a, b)?;
        Ok(state.containers.contains(&pair(a, b)))
    }
}
