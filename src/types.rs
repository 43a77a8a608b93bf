// src/types.rs

use serde::Deserialize;

/// What the executor does once the conflict guard has flipped its global
/// fallback flag.
///
/// - `Advisory`: log the transition and keep scheduling later groups exactly
///   as planned. Contention is still absorbed per task by the guard
///   (default behaviour).
/// - `Serial`: every group that starts after the flag is set runs serially,
///   even if it was planned as parallel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    #[default]
    Advisory,
    Serial,
}
