//! Sentineled, sorted breakpoint table.
//!
//! Real knots sit at positions `1..=n`; position `0` holds `-1.0` and position
//! `n + 1` holds `2.0`, so every legal phase has a total lower bound.

use crate::error::ConfigError;

/// Phase lookup `[-1, k_1, .., k_n, 2]` with `k_i` strictly increasing in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct KnotTable {
    at: Vec<f64>,
}

impl KnotTable {
    /// Sorts `entries` by phase and builds the table.
    ///
    /// Returns the table and the payloads in knot order. Fails on a phase
    /// outside `[0, 1]` (or non-finite) and on duplicate phases.
    pub fn sorted<T>(mut entries: Vec<(f64, T)>) -> Result<(Self, Vec<T>), ConfigError> {
        for (phase, _) in &entries {
            if !(0.0..=1.0).contains(phase) {
                return Err(ConfigError::PhaseOutOfRange { phase: *phase });
            }
        }
        entries.sort_by(|a, b| a.0.total_cmp(&b.0));
        if let Some(w) = entries.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(ConfigError::DuplicateKnot { phase: w[0].0 });
        }
        let mut at = Vec::with_capacity(entries.len() + 2);
        let mut payloads = Vec::with_capacity(entries.len());
        at.push(-1.0);
        for (phase, payload) in entries {
            at.push(phase);
            payloads.push(payload);
        }
        at.push(2.0);
        Ok((Self { at }, payloads))
    }

    /// Table over bare phases.
    pub fn new(phases: &[f64]) -> Result<Self, ConfigError> {
        Self::sorted(phases.iter().map(|p| (*p, ())).collect()).map(|(t, _)| t)
    }

    /// Number of real knots.
    #[inline]
    pub fn len(&self) -> usize {
        self.at.len() - 2
    }

    /// True if there are no real knots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the end sentinel (`n + 1`).
    #[inline]
    pub fn end(&self) -> usize {
        self.at.len() - 1
    }

    /// Phase stored at table position `pos` (sentinels included).
    #[inline]
    pub fn at(&self, pos: usize) -> f64 {
        self.at[pos]
    }

    /// Real knot phases in order.
    pub fn knots(&self) -> &[f64] {
        &self.at[1..self.at.len() - 1]
    }

    /// First position whose phase is `>= key`.
    ///
    /// Always in `0..=n + 1` for keys in `[-1, 2]`.
    #[inline]
    pub fn lower_bound(&self, key: f64) -> usize {
        self.at.partition_point(|v| *v < key)
    }
}
