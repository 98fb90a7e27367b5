//! Relaxation Configuration and Builder
//!
//! This module provides the immutable parameter bundle consumed by the
//! relaxation solver, with a validating builder for constructing it.

use serde::{Deserialize, Serialize};

use crate::error::{RelaxError, Result};

/// Configuration for one relaxation run
///
/// The configuration is immutable once built and fully determines the
/// numerical result for a given input mesh (modulo thread count, which only
/// affects scheduling, not per-vertex arithmetic).
///
/// # Example
///
/// ```rust
/// use hexsphere_relax::RelaxationConfigBuilder;
///
/// let config = RelaxationConfigBuilder::new()
///     .iterations(100)
///     .radius(1.0)
///     .unwrap()
///     .build()
///     .unwrap();
/// assert_eq!(config.iterations, 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelaxationConfig {
    /// Number of relaxation iterations to run
    pub iterations: usize,

    /// Target sphere radius; every vertex is projected onto this radius
    /// before iteration 1 and re-projected after every update
    pub radius: f64,

    /// Per-step displacement scale applied to the combined force vector
    pub step: f64,

    /// Weight of the Laplacian smoothing term (pull toward neighbor mean)
    pub laplacian_weight: f64,

    /// Weight of the spring term (push edge lengths toward the mesh-wide mean)
    pub spring_weight: f64,

    /// Weight of the pentagon expansion bias (radial push away from each
    /// pentagon tile's center). Zero disables the bias pass entirely.
    pub pentagon_expand_weight: f64,

    /// Worker thread count for the per-vertex parallel update
    pub threads: usize,

    /// Emit diagnostic metrics every N iterations (0 disables)
    pub log_every: usize,

    /// Emit a progress/ETA line every N iterations (0 disables)
    pub progress_every: usize,
}

impl Default for RelaxationConfig {
    fn default() -> Self {
        RelaxationConfigBuilder::new().build().unwrap()
    }
}

/// Builder for creating a [`RelaxationConfig`] with validation
///
/// Fallible setters validate their argument and return `Result<Self>`;
/// infallible setters return `Self` directly.
///
/// # Example
///
/// ```rust
/// use hexsphere_relax::RelaxationConfigBuilder;
///
/// let config = RelaxationConfigBuilder::new()
///     .iterations(350)
///     .step(0.28)
///     .laplacian_weight(0.42)
///     .spring_weight(0.45)
///     .pentagon_expand_weight(0.35)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct RelaxationConfigBuilder {
    iterations: usize,
    radius: f64,
    step: f64,
    laplacian_weight: f64,
    spring_weight: f64,
    pentagon_expand_weight: f64,
    threads: usize,
    log_every: usize,
    progress_every: usize,
}

impl RelaxationConfigBuilder {
    /// Create a new builder with default values
    ///
    /// Defaults:
    /// - iterations: 350
    /// - radius: 1.0
    /// - step: 0.28
    /// - laplacian_weight: 0.42
    /// - spring_weight: 0.45
    /// - pentagon_expand_weight: 0.35
    /// - threads: logical CPU count
    /// - log_every: 25, progress_every: 10
    pub fn new() -> Self {
        Self {
            iterations: 350,
            radius: 1.0,
            step: 0.28,
            laplacian_weight: 0.42,
            spring_weight: 0.45,
            pentagon_expand_weight: 0.35,
            threads: num_cpus::get().max(1),
            log_every: 25,
            progress_every: 10,
        }
    }

    /// Create a builder preloaded with the defaults used for engine-exported
    /// payloads (larger radius, slightly stiffer springs)
    pub fn engine_payload() -> Self {
        Self {
            radius: 450.0,
            step: 0.24,
            laplacian_weight: 0.38,
            spring_weight: 0.52,
            pentagon_expand_weight: 0.45,
            ..Self::new()
        }
    }

    /// Set the number of relaxation iterations (0 means project-only)
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the target sphere radius
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if radius is not strictly positive
    pub fn radius(mut self, radius: f64) -> Result<Self> {
        if !(radius > 0.0) {
            return Err(RelaxError::InvalidConfig(format!(
                "radius must be positive (got {})",
                radius
            )));
        }
        self.radius = radius;
        Ok(self)
    }

    /// Set the per-step displacement scale
    pub fn step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    /// Set the Laplacian smoothing weight
    pub fn laplacian_weight(mut self, weight: f64) -> Self {
        self.laplacian_weight = weight;
        self
    }

    /// Set the spring weight
    pub fn spring_weight(mut self, weight: f64) -> Self {
        self.spring_weight = weight;
        self
    }

    /// Set the pentagon expansion weight (0.0 disables the bias pass)
    pub fn pentagon_expand_weight(mut self, weight: f64) -> Self {
        self.pentagon_expand_weight = weight;
        self
    }

    /// Set the worker thread count
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if threads is zero
    pub fn threads(mut self, threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(RelaxError::InvalidConfig(
                "threads must be >= 1".to_string(),
            ));
        }
        self.threads = threads;
        Ok(self)
    }

    /// Emit diagnostic metrics every N iterations (0 disables)
    pub fn log_every(mut self, every: usize) -> Self {
        self.log_every = every;
        self
    }

    /// Emit a progress line every N iterations (0 disables)
    pub fn progress_every(mut self, every: usize) -> Self {
        self.progress_every = every;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<RelaxationConfig> {
        Ok(RelaxationConfig {
            iterations: self.iterations,
            radius: self.radius,
            step: self.step,
            laplacian_weight: self.laplacian_weight,
            spring_weight: self.spring_weight,
            pentagon_expand_weight: self.pentagon_expand_weight,
            threads: self.threads,
            log_every: self.log_every,
            progress_every: self.progress_every,
        })
    }
}

impl Default for RelaxationConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = RelaxationConfigBuilder::new().build().unwrap();
        assert_eq!(config.iterations, 350);
        assert_eq!(config.radius, 1.0);
        assert_eq!(config.step, 0.28);
        assert_eq!(config.laplacian_weight, 0.42);
        assert_eq!(config.spring_weight, 0.45);
        assert_eq!(config.pentagon_expand_weight, 0.35);
        assert!(config.threads >= 1);
        assert_eq!(config.log_every, 25);
        assert_eq!(config.progress_every, 10);
    }

    #[test]
    fn test_builder_custom() {
        let config = RelaxationConfigBuilder::new()
            .iterations(10)
            .radius(450.0)
            .unwrap()
            .step(0.1)
            .threads(2)
            .unwrap()
            .log_every(0)
            .progress_every(0)
            .build()
            .unwrap();

        assert_eq!(config.iterations, 10);
        assert_eq!(config.radius, 450.0);
        assert_eq!(config.step, 0.1);
        assert_eq!(config.threads, 2);
        assert_eq!(config.log_every, 0);
    }

    #[test]
    fn test_builder_invalid_radius() {
        assert!(RelaxationConfigBuilder::new().radius(0.0).is_err());
        assert!(RelaxationConfigBuilder::new().radius(-1.0).is_err());
        assert!(RelaxationConfigBuilder::new().radius(f64::NAN).is_err());
    }

    #[test]
    fn test_builder_invalid_threads() {
        assert!(RelaxationConfigBuilder::new().threads(0).is_err());
    }

    #[test]
    fn test_engine_payload_defaults() {
        let config = RelaxationConfigBuilder::engine_payload().build().unwrap();
        assert_eq!(config.radius, 450.0);
        assert_eq!(config.step, 0.24);
        assert_eq!(config.laplacian_weight, 0.38);
        assert_eq!(config.spring_weight, 0.52);
        assert_eq!(config.pentagon_expand_weight, 0.45);
        // shared defaults carry over
        assert_eq!(config.iterations, 350);
    }

    #[test]
    fn test_config_serialization() {
        let config = RelaxationConfigBuilder::new()
            .iterations(42)
            .build()
            .unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let restored: RelaxationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
    }
}
