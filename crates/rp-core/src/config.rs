//! Planning request configuration.

use crate::{CoreError, CoreResult};

/// Top-level configuration of one planning request.
///
/// Typically loaded from a TOML/JSON file by the application crate and passed
/// to the pathfinding entry point.  All times are in seconds on the caller's
/// reference clock; positions are metres.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlanningConfig {
    /// Earliest departure time of the planned train, in seconds.
    pub start_time: f64,

    /// End of the planning window, in seconds.  No candidate entry into any
    /// route may be scheduled after this instant.
    pub end_time: f64,

    /// Integration time step of the physics pipeline, in seconds.
    pub time_step: f64,

    /// Maximum delay that may be added before entering any single route, in
    /// seconds.  This bounds how long the train can wait for an occupancy
    /// window to open; it is the only built-in bound on the search.
    pub max_departure_delay: f64,
}

impl PlanningConfig {
    /// Construct a config with the default integration step (2 s) and a
    /// 24 h per-route delay allowance.
    pub fn new(start_time: f64, end_time: f64) -> Self {
        Self {
            start_time,
            end_time,
            time_step: 2.0,
            max_departure_delay: 3_600.0 * 24.0,
        }
    }

    /// Check the invariants the planning core relies on.
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.time_step > 0.0) {
            return Err(CoreError::Config(format!(
                "time_step must be > 0, got {}",
                self.time_step
            )));
        }
        if self.end_time <= self.start_time {
            return Err(CoreError::Config(format!(
                "empty planning window [{}, {}]",
                self.start_time, self.end_time
            )));
        }
        if self.max_departure_delay < 0.0 {
            return Err(CoreError::Config(format!(
                "max_departure_delay must be >= 0, got {}",
                self.max_departure_delay
            )));
        }
        Ok(())
    }
}
