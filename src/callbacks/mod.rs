//! Training lifecycle callbacks
//!
//! A trainer fires named events (see [`TRAINER_EVENTS`]) and a [`Callbacks`]
//! value maps each event to the hooks that run for it. Optional integrations
//! contribute their own small registries ([`IntegrationCallbacks`]) which are
//! merged in with [`add_integration_callbacks`].

pub mod raytune;

use crate::error::{Error, Result};
use crate::settings::Settings;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

pub use raytune::{RayTune, TuneBackend, TuneError, TuneSession};

/// Per-epoch metrics, keyed by metric name.
pub type Metrics = BTreeMap<String, f64>;

/// Read-only view of a trainer handed to every hook.
pub trait Trainer {
    /// Metrics gathered for the most recent epoch.
    fn metrics(&self) -> &Metrics;

    /// Zero-based index of the current epoch.
    fn epoch(&self) -> usize;
}

/// A callable registered for a lifecycle event.
pub type Hook = Arc<dyn Fn(&dyn Trainer) + Send + Sync>;

/// Event name -> hook registry contributed by a single integration.
///
/// Integrations register at most one hook per event.
pub type IntegrationCallbacks = HashMap<&'static str, Hook>;

pub const ON_FIT_EPOCH_END: &str = "on_fit_epoch_end";

/// Events fired by a trainer, in the order they occur during a fit.
pub const TRAINER_EVENTS: [&str; 14] = [
    "on_pretrain_routine_start",
    "on_pretrain_routine_end",
    "on_train_start",
    "on_train_epoch_start",
    "on_train_batch_start",
    "optimizer_step",
    "on_before_zero_grad",
    "on_train_batch_end",
    "on_train_epoch_end",
    ON_FIT_EPOCH_END,
    "on_model_save",
    "on_train_end",
    "on_params_update",
    "teardown",
];

/// Hooks for every trainer event.
#[derive(Clone)]
pub struct Callbacks {
    hooks: HashMap<&'static str, Vec<Hook>>,
}

impl Default for Callbacks {
    fn default() -> Self {
        Self {
            hooks: TRAINER_EVENTS
                .iter()
                .map(|&event| (event, Vec::new()))
                .collect(),
        }
    }
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut counts: Vec<(&str, usize)> = self
            .hooks
            .iter()
            .map(|(event, hooks)| (*event, hooks.len()))
            .collect();
        counts.sort_unstable();
        f.debug_struct("Callbacks").field("hooks", &counts).finish()
    }
}

impl Callbacks {
    /// Register `hook` for `event`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownEvent`] when `event` is not one of [`TRAINER_EVENTS`].
    pub fn add(&mut self, event: &str, hook: Hook) -> Result<()> {
        let hooks = self
            .hooks
            .get_mut(event)
            .ok_or_else(|| Error::UnknownEvent(event.to_string()))?;
        hooks.push(hook);
        Ok(())
    }

    /// Merge an integration's registry, skipping hooks that are already present.
    pub fn add_integration(&mut self, integration: &IntegrationCallbacks) {
        for (event, hook) in integration {
            let Some(hooks) = self.hooks.get_mut(event) else {
                tracing::debug!(event, "integration hook for unknown event ignored");
                continue;
            };
            if !hooks.iter().any(|existing| Arc::ptr_eq(existing, hook)) {
                hooks.push(Arc::clone(hook));
            }
        }
    }

    /// Run every hook registered for `event`, in registration order.
    pub fn run(&self, event: &str, trainer: &dyn Trainer) {
        if let Some(hooks) = self.hooks.get(event) {
            for hook in hooks {
                hook(trainer);
            }
        }
    }

    /// Hooks registered for `event`, empty for unknown events.
    pub fn hooks(&self, event: &str) -> &[Hook] {
        self.hooks.get(event).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Detect and merge the optional integrations enabled in `settings`.
///
/// `detect_raytune` is only invoked when the `raytune` flag is set; see
/// [`RayTune::activate`].
pub fn add_integration_callbacks<F>(
    callbacks: &mut Callbacks,
    settings: &Settings,
    detect_raytune: F,
) where
    F: FnOnce() -> std::result::Result<Arc<dyn TuneBackend>, TuneError>,
{
    let raytune = RayTune::activate(settings, detect_raytune);
    callbacks.add_integration(raytune.callbacks());
}
