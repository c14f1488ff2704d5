//! Ray Tune integration
//!
//! Forwards per-epoch training metrics to an active tuning session. The
//! integration is optional twice over: it must be enabled with the `raytune`
//! setting, and a tuning backend must be detected when the integration is
//! activated. If either is missing the integration registers no hooks at all.
//!
//! Reporting is best effort. Nothing that goes wrong while talking to the
//! backend, including a panic inside it, reaches the training loop; failures
//! are only visible as `debug` events on this module's tracing target.

use super::{Hook, IntegrationCallbacks, Metrics, Trainer, ON_FIT_EPOCH_END};
use crate::settings::{Settings, RAYTUNE_KEY};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Failures raised by a tuning backend.
#[derive(thiserror::Error, Debug)]
pub enum TuneError {
    #[error("tuning backend unavailable: {0}")]
    Unavailable(String),

    #[error("session query failed: {0}")]
    Session(String),

    #[error("report failed: {0}")]
    Report(String),
}

/// A running tuning trial that accepts metric reports.
pub trait TuneSession: Send + Sync {
    fn report(&self, metrics: &Metrics) -> Result<(), TuneError>;
}

/// Entry point of an external tuning library.
pub trait TuneBackend: Send + Sync {
    /// The session active in the backend's own context, if any.
    fn active_session(&self) -> Result<Option<Arc<dyn TuneSession>>, TuneError>;
}

/// Activation outcome of the integration, fixed at construction.
#[derive(Clone)]
pub struct RayTune {
    backend: Option<Arc<dyn TuneBackend>>,
    callbacks: IntegrationCallbacks,
}

impl std::fmt::Debug for RayTune {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RayTune")
            .field("active", &self.is_active())
            .field("events", &self.callbacks.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl RayTune {
    /// Decide whether the integration is active.
    ///
    /// The integration is active only when `settings` holds `raytune = true`
    /// (a JSON boolean) and `detect` returns a backend. `detect` is not called
    /// when the flag is off, absent or not a boolean.
    ///
    /// # Examples
    ///
    /// ```
    /// use kan_tune::callbacks::{RayTune, TuneError};
    /// use kan_tune::settings::Settings;
    ///
    /// let raytune = RayTune::activate(&Settings::default(), || {
    ///     Err(TuneError::Unavailable("not installed".into()))
    /// });
    /// assert!(!raytune.is_active());
    /// assert!(raytune.callbacks().is_empty());
    /// ```
    pub fn activate<F>(settings: &Settings, detect: F) -> Self
    where
        F: FnOnce() -> Result<Arc<dyn TuneBackend>, TuneError>,
    {
        if settings.get_bool(RAYTUNE_KEY) != Some(true) {
            tracing::debug!("ray tune integration disabled in settings");
            return Self::inactive();
        }

        match detect() {
            Ok(backend) => {
                tracing::debug!("ray tune integration active");
                Self::with_backend(backend)
            }
            Err(err) => {
                tracing::debug!(error = %err, "ray tune integration unavailable");
                Self::inactive()
            }
        }
    }

    /// An integration that never reports.
    pub fn inactive() -> Self {
        Self {
            backend: None,
            callbacks: HashMap::new(),
        }
    }

    fn with_backend(backend: Arc<dyn TuneBackend>) -> Self {
        let hook_backend = Arc::clone(&backend);
        let hook: Hook = Arc::new(move |trainer: &dyn Trainer| {
            on_fit_epoch_end(hook_backend.as_ref(), trainer)
        });
        Self {
            backend: Some(backend),
            callbacks: HashMap::from([(ON_FIT_EPOCH_END, hook)]),
        }
    }

    pub fn is_active(&self) -> bool {
        self.backend.is_some()
    }

    /// Hooks to register: `on_fit_epoch_end` when active, nothing otherwise.
    pub fn callbacks(&self) -> &IntegrationCallbacks {
        &self.callbacks
    }
}

/// Report the trainer's metrics, tagged with the epoch, to the active session.
///
/// Does nothing when no session is active. Never fails and never panics.
pub fn on_fit_epoch_end(backend: &dyn TuneBackend, trainer: &dyn Trainer) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| report_epoch(backend, trainer)));
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::debug!(error = %err, "ray tune report skipped"),
        Err(_) => tracing::debug!("ray tune backend panicked while reporting"),
    }
}

fn report_epoch(backend: &dyn TuneBackend, trainer: &dyn Trainer) -> Result<(), TuneError> {
    let Some(session) = backend.active_session()? else {
        return Ok(());
    };
    let mut metrics = trainer.metrics().clone();
    metrics.insert("epoch".to_string(), trainer.epoch() as f64);
    session.report(&metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        reports: Mutex<Vec<Metrics>>,
    }

    impl TuneSession for Recorder {
        fn report(&self, metrics: &Metrics) -> Result<(), TuneError> {
            self.reports.lock().unwrap().push(metrics.clone());
            Ok(())
        }
    }

    struct Backend(Option<Arc<Recorder>>);

    impl TuneBackend for Backend {
        fn active_session(&self) -> Result<Option<Arc<dyn TuneSession>>, TuneError> {
            Ok(self
                .0
                .as_ref()
                .map(|session| Arc::clone(session) as Arc<dyn TuneSession>))
        }
    }

    struct EpochTrainer {
        metrics: Metrics,
        epoch: usize,
    }

    impl Trainer for EpochTrainer {
        fn metrics(&self) -> &Metrics {
            &self.metrics
        }

        fn epoch(&self) -> usize {
            self.epoch
        }
    }

    fn enabled() -> Settings {
        let mut settings = Settings::default();
        settings.update(RAYTUNE_KEY, json!(true)).unwrap();
        settings
    }

    #[test]
    fn test_disabled_skips_detection() {
        let mut detected = false;
        let raytune = RayTune::activate(&Settings::default(), || {
            detected = true;
            Ok(Arc::new(Backend(None)) as Arc<dyn TuneBackend>)
        });
        assert!(!detected);
        assert!(!raytune.is_active());
    }

    #[test]
    fn test_hook_copies_metrics() {
        let session = Arc::new(Recorder::default());
        let backend = Backend(Some(Arc::clone(&session)));
        let trainer = EpochTrainer {
            metrics: Metrics::from([("loss".to_string(), 0.5)]),
            epoch: 3,
        };

        on_fit_epoch_end(&backend, &trainer);

        let reports = session.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].get("epoch"), Some(&3.0));
        assert!(!trainer.metrics.contains_key("epoch"));
    }

    #[test]
    fn test_active_registry_shape() {
        let raytune = RayTune::activate(&enabled(), || {
            Ok(Arc::new(Backend(None)) as Arc<dyn TuneBackend>)
        });
        assert!(raytune.is_active());
        assert_eq!(raytune.callbacks().len(), 1);
        assert!(raytune.callbacks().contains_key(ON_FIT_EPOCH_END));
    }
}
