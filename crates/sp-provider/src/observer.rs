//! Provider observer trait for progress reporting and shutdown hooks.

use sp_core::Timestep;

/// Callbacks invoked by [`Provider`][crate::Provider] at simulation milestones.
///
/// Hooks run on whichever request thread caused the event, after every
/// internal lock has been released, so an implementation may call back into
/// the provider.  All methods default to no-ops.
///
/// # Example — shutdown trigger
///
/// ```rust,ignore
/// struct StopOnComplete(std::sync::mpsc::Sender<()>);
///
/// impl ProviderObserver for StopOnComplete {
///     fn on_simulation_complete(&self) {
///         let _ = self.0.send(());
///     }
/// }
/// ```
pub trait ProviderObserver: Send + Sync {
    /// The barrier opened and the shared timestep is now `ts`.
    fn on_timestep_advanced(&self, _ts: Timestep) {}

    /// The last station reported completion.  Called exactly once.
    fn on_simulation_complete(&self) {}
}

/// A [`ProviderObserver`] that does nothing.
pub struct NoopObserver;

impl ProviderObserver for NoopObserver {}
