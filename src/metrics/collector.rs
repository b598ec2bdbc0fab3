//! Implements storage for metrics of a capacity simulation run.

use average::{concatenate, Estimate, Max, Mean, Min, Variance};
use log::info;

concatenate!(
    Estimator,
    [Min, min],
    [Max, max],
    [Mean, mean],
    [Variance, population_variance]
);

#[derive(Default)]
pub struct EstimatorWrapper {
    estimator: Estimator,
}

impl std::fmt::Debug for EstimatorWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Estimator")
            .field("min", &self.min())
            .field("max", &self.max())
            .field("mean", &self.mean())
            .field("population_variance", &self.population_variance())
            .finish()
    }
}

impl EstimatorWrapper {
    pub fn new() -> Self {
        Self {
            estimator: Estimator::new(),
        }
    }

    pub fn add(&mut self, value: f64) {
        self.estimator.add(value);
    }

    pub fn min(&self) -> f64 {
        self.estimator.min()
    }

    pub fn max(&self) -> f64 {
        self.estimator.max()
    }

    pub fn mean(&self) -> f64 {
        self.estimator.mean()
    }

    pub fn population_variance(&self) -> f64 {
        self.estimator.population_variance()
    }
}

#[derive(Debug, Default)]
pub struct MetricsCollector {
    /// The number of candidate pods submitted to the placement algorithm.
    pub placement_attempts: u64,
    /// The number of candidate pods the placement algorithm bound to a node.
    pub pods_placed: u64,
    /// Estimations for the time (secs) the placement algorithm spent on one candidate.
    pub placement_latency_stats: EstimatorWrapper,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            placement_attempts: 0,
            pods_placed: 0,
            placement_latency_stats: EstimatorWrapper::new(),
        }
    }

    pub fn increment_placement_latency(&mut self, value: f64) {
        self.placement_attempts += 1;
        self.placement_latency_stats.add(value);
    }

    pub fn increment_pods_placed(&mut self) {
        self.pods_placed += 1;
    }

    pub fn log_summary(&self) {
        info!(
            "Placement attempts: {}, pods placed: {}",
            self.placement_attempts, self.pods_placed
        );
        if self.placement_attempts > 0 {
            info!(
                "Placement latency (s): min {:.6}, max {:.6}, mean {:.6}, variance {:.9}",
                self.placement_latency_stats.min(),
                self.placement_latency_stats.max(),
                self.placement_latency_stats.mean(),
                self.placement_latency_stats.population_variance()
            );
        }
    }
}
