//! Progress tracking and callbacks for registration workflows.
//!
//! This module provides progress tracking, callbacks, and monitoring
//! capabilities for registration runs.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use crate::optimizer::{IterationRecord, StopReason};

/// Progress information for registration iterations.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressInfo {
    /// Current iteration number (evaluations so far).
    pub iteration: usize,
    /// Iteration budget.
    pub total_iterations: Option<usize>,
    /// Metric value at this iteration.
    pub value: f64,
    /// Magnitude of the scaled gradient.
    pub gradient_magnitude: f64,
    /// Current step length.
    pub step_length: f64,
    /// Time elapsed since start.
    pub elapsed: Duration,
    /// Estimated remaining time, assuming the whole budget is used.
    pub estimated_remaining: Option<Duration>,
}

impl ProgressInfo {
    /// Create progress information from an optimizer record.
    pub fn from_record(record: &IterationRecord, total_iterations: Option<usize>, elapsed: Duration) -> Self {
        Self {
            iteration: record.iteration,
            total_iterations,
            value: record.value,
            gradient_magnitude: record.gradient_magnitude,
            step_length: record.step_length,
            elapsed,
            estimated_remaining: None,
        }
    }

    /// Calculate progress percentage.
    pub fn progress_percent(&self) -> Option<f64> {
        self.total_iterations.map(|total| {
            (self.iteration as f64 / total as f64) * 100.0
        })
    }

    /// Calculate estimated remaining time.
    pub fn calculate_remaining(&mut self) {
        if let Some(total) = self.total_iterations {
            if self.iteration > 0 {
                let avg_time_per_iter = self.elapsed.as_secs_f64() / self.iteration as f64;
                let remaining_iters = total.saturating_sub(self.iteration);
                self.estimated_remaining = Some(Duration::from_secs_f64(
                    avg_time_per_iter * remaining_iters as f64
                ));
            }
        }
    }
}

/// Progress callback trait for monitoring registration progress.
pub trait ProgressCallback: Send + Sync {
    /// Called after every metric evaluation.
    fn on_progress(&self, info: &ProgressInfo);

    /// Called when registration starts.
    fn on_start(&self) {
        // Default: no-op
    }

    /// Called when the optimizer stops.
    fn on_complete(&self, _reason: StopReason, _info: &ProgressInfo) {
        // Default: no-op
    }

    /// Called when registration fails.
    fn on_error(&self, _error: &str) {
        // Default: no-op
    }
}

/// Console progress callback that logs to tracing.
#[derive(Debug, Clone)]
pub struct ConsoleProgressCallback {
    /// Log interval (iterations).
    pub log_interval: usize,
}

impl Default for ConsoleProgressCallback {
    fn default() -> Self {
        Self { log_interval: 10 }
    }
}

impl ConsoleProgressCallback {
    /// Create a new console progress callback.
    pub fn new(log_interval: usize) -> Self {
        Self {
            log_interval: log_interval.max(1),
        }
    }
}

impl ProgressCallback for ConsoleProgressCallback {
    fn on_progress(&self, info: &ProgressInfo) {
        if info.iteration % self.log_interval == 0 || info.total_iterations == Some(info.iteration) {
            let remaining = info.estimated_remaining
                .map(|d| format!("{:.2}s", d.as_secs_f64()))
                .unwrap_or_else(|| "N/A".to_string());

            tracing::info!(
                "Iter {}/{} ({:.1}%) | Metric: {:.6} | Step: {:.2e} | |g|: {:.3e} | Elapsed: {:.2}s | ETA: {}",
                info.iteration,
                info.total_iterations.map(|n| n.to_string()).unwrap_or_else(|| "?".to_string()),
                info.progress_percent().unwrap_or(0.0),
                info.value,
                info.step_length,
                info.gradient_magnitude,
                info.elapsed.as_secs_f64(),
                remaining
            );
        }
    }

    fn on_start(&self) {
        tracing::info!("Registration started");
    }

    fn on_complete(&self, reason: StopReason, info: &ProgressInfo) {
        tracing::info!(
            "Registration stopped ({}) after {} iterations in {:.2}s with metric {:.6}",
            reason,
            info.iteration,
            info.elapsed.as_secs_f64(),
            info.value
        );
    }

    fn on_error(&self, error: &str) {
        tracing::error!("Registration failed: {}", error);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// History callback that records all progress information.
#[derive(Debug, Clone, Default)]
pub struct HistoryCallback {
    /// History of progress information.
    history: Arc<Mutex<Vec<ProgressInfo>>>,
}

impl HistoryCallback {
    /// Create a new history callback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the recorded history.
    pub fn get_history(&self) -> Vec<ProgressInfo> {
        lock(&self.history).clone()
    }

    /// Recorded metric values in iteration order.
    pub fn values(&self) -> Vec<f64> {
        lock(&self.history).iter().map(|info| info.value).collect()
    }

    /// Clear the history.
    pub fn clear(&self) {
        lock(&self.history).clear();
    }
}

impl ProgressCallback for HistoryCallback {
    fn on_progress(&self, info: &ProgressInfo) {
        lock(&self.history).push(info.clone());
    }
}

/// Progress tracker that manages multiple callbacks.
#[derive(Clone, Default)]
pub struct ProgressTracker {
    /// Registered callbacks.
    callbacks: Vec<Arc<dyn ProgressCallback>>,
    /// Start time.
    start_time: Arc<Mutex<Option<Instant>>>,
}

impl ProgressTracker {
    /// Create a new progress tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a callback.
    pub fn add_callback(&mut self, callback: Arc<dyn ProgressCallback>) {
        self.callbacks.push(callback);
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    fn elapsed(&self) -> Duration {
        lock(&self.start_time).map(|t| t.elapsed()).unwrap_or(Duration::ZERO)
    }

    /// Start tracking.
    pub fn start(&self) {
        *lock(&self.start_time) = Some(Instant::now());
        for callback in &self.callbacks {
            callback.on_start();
        }
    }

    /// Report one optimizer iteration.
    pub fn update(&self, record: &IterationRecord, total_iterations: Option<usize>) -> ProgressInfo {
        let mut info = ProgressInfo::from_record(record, total_iterations, self.elapsed());
        info.calculate_remaining();

        for callback in &self.callbacks {
            callback.on_progress(&info);
        }
        info
    }

    /// Complete tracking.
    pub fn complete(&self, reason: StopReason, last: Option<&ProgressInfo>) {
        let info = match last {
            Some(info) => ProgressInfo {
                elapsed: self.elapsed(),
                estimated_remaining: Some(Duration::ZERO),
                ..info.clone()
            },
            None => ProgressInfo {
                iteration: 0,
                total_iterations: None,
                value: f64::NAN,
                gradient_magnitude: f64::NAN,
                step_length: f64::NAN,
                elapsed: self.elapsed(),
                estimated_remaining: Some(Duration::ZERO),
            },
        };

        for callback in &self.callbacks {
            callback.on_complete(reason, &info);
        }
    }

    /// Report error.
    pub fn error(&self, error: &str) {
        for callback in &self.callbacks {
            callback.on_error(error);
        }
    }
}
