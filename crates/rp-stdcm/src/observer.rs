//! Search observer trait for progress reporting and cancellation.

use rp_core::RouteId;

/// Callbacks invoked by the pathfinder at each frontier expansion.
///
/// All methods have default implementations so implementors only override
/// what they care about.  There is no built-in wall-clock or node-budget
/// cutoff: layering one is exactly what [`is_cancelled`](Self::is_cancelled)
/// is for — it is polled between frontier expansions, never mid-expansion.
///
/// # Example — expansion budget
///
/// ```rust,ignore
/// struct Budget { left: u64 }
///
/// impl SearchObserver for Budget {
///     fn on_expand(&mut self, _route: RouteId, _entry_time: f64, _cost: f64) {
///         self.left = self.left.saturating_sub(1);
///     }
///     fn is_cancelled(&self) -> bool {
///         self.left == 0
///     }
/// }
/// ```
pub trait SearchObserver {
    /// Called when a search state is taken off the frontier, before its
    /// successors are generated.
    fn on_expand(&mut self, _route: RouteId, _entry_time: f64, _cost: f64) {}

    /// Polled between frontier expansions; returning `true` aborts the
    /// search, which then reports no path.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// A [`SearchObserver`] that does nothing.  Use when you need to call the
/// pathfinder but don't want callbacks.
pub struct NoopObserver;

impl SearchObserver for NoopObserver {}
