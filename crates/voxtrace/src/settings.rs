//! Traversal settings.

use serde::{Deserialize, Serialize};
use voxtrace_math::Tolerance;

use crate::error::{Result, TraceError};

/// Batch traversal parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceSettings {
    /// Fraction of a voxel crossing interval under which boundary crossings
    /// on different axes count as simultaneous.
    pub tie_tolerance: f64,
    /// Traverse rays on the rayon thread pool.
    pub parallel: bool,
    /// Batches with fewer rays than this run on the calling thread.
    pub parallel_threshold: usize,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            tie_tolerance: Tolerance::DEFAULT.tie,
            parallel: true,
            parallel_threshold: 64,
        }
    }
}

impl TraceSettings {
    /// Settings that always run on the calling thread.
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !self.tie_tolerance.is_finite() || self.tie_tolerance < 0.0 || self.tie_tolerance >= 0.5
        {
            return Err(TraceError::InvalidSettings(format!(
                "tie_tolerance must be in [0, 0.5), got {}",
                self.tie_tolerance
            )));
        }
        if self.parallel_threshold == 0 {
            return Err(TraceError::InvalidSettings(
                "parallel_threshold must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Tolerance handed to the voxel walker.
    pub fn tolerance(&self) -> Tolerance {
        Tolerance {
            tie: self.tie_tolerance,
        }
    }

    /// Whether a batch of `rays` rays should be split across threads.
    pub fn runs_parallel(&self, rays: usize) -> bool {
        self.parallel && rays >= self.parallel_threshold
    }
}
