// src/probe/mod.rs

//! Spatial/structural query capability consumed by the classification rules.
//!
//! In the browser domain these questions are answered by evaluating script
//! in a live page, so every call is treated as fallible. Rules turn an
//! `Err` into "no edge asserted"; nothing here can abort a run.

use std::fmt::Debug;

use anyhow::Result;

pub mod mock;

/// Structural relationship between two tasks' targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// The first target contains the second.
    Contains,
    /// The first target is nested inside the second.
    ContainedBy,
    /// Both sit in the same tab/accordion-like component.
    SharedComponent,
    Unrelated,
}

impl Relation {
    /// The same relation seen from the other task.
    pub fn inverse(self) -> Self {
        match self {
            Relation::Contains => Relation::ContainedBy,
            Relation::ContainedBy => Relation::Contains,
            other => other,
        }
    }
}

/// Abstract structure interface.
pub trait StructureProbe: Send + Sync + Debug {
    /// Containment / shared-component relation of `a` relative to `b`.
    fn relation(&self, a: &str, b: &str) -> Result<Relation>;

    /// Distance between the centres of the two targets.
    fn distance(&self, a: &str, b: &str) -> Result<f64>;

    /// Whether both targets live under the same list-item-like container.
    fn share_container(&self, a: &str, b: &str) -> Result<bool>;
}

/// Probe that knows nothing: every pair is unrelated, infinitely far apart
/// and never shares a container. Only the text/kind rules fire.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProbe;

impl StructureProbe for NullProbe {
    fn relation(&self, _a: &str, _b: &str) -> Result<Relation> {
        Ok(Relation::Unrelated)
    }

    fn distance(&self, _a: &str, _b: &str) -> Result<f64> {
        Ok(f64::INFINITY)
    }

    fn share_container(&self, _a: &str, _b: &str) -> Result<bool> {
        Ok(false)
    }
}
