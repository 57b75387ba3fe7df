//! On-board energy sources and storage bookkeeping.
//!
//! Sources form a closed set of variants — catenary pickup, a diesel power
//! pack, and a battery — ordered by draining priority on the rolling stock.
//! A deficit (demand exceeding what the sources can deliver) is *normal*:
//! it reduces the delivered traction force, which slows the achievable
//! acceleration; it never raises an error.

/// A finite on-board energy reservoir, in joules.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnergyStorage {
    pub capacity: f64,
    pub charge: f64,
}

impl EnergyStorage {
    /// A storage starting at full charge.
    pub fn full(capacity: f64) -> Self {
        Self { capacity, charge: capacity }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.charge <= 0.0
    }

    /// Draw (`delta > 0`) or store (`delta < 0`) energy, clamped to
    /// `[0, capacity]`.
    #[inline]
    fn consume(&mut self, delta: f64) {
        self.charge = (self.charge - delta).clamp(0.0, self.capacity);
    }
}

/// One on-board energy source.
///
/// Power delivery is modeled as a speed-independent ceiling; the `speed`
/// argument fixes the call contract for models that need it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EnergySource {
    /// Overhead-line pickup.  Only delivers under electrified track; the
    /// supply itself is unbounded.
    Catenary { max_output_power: f64, efficiency: f64 },

    /// Diesel generator set with a finite fuel reserve.
    PowerPack {
        max_output_power: f64,
        efficiency: f64,
        storage: EnergyStorage,
    },

    /// Traction battery: finite, and the only source that can absorb
    /// regenerated energy.
    Battery {
        max_output_power: f64,
        max_input_power: f64,
        efficiency: f64,
        storage: EnergyStorage,
    },
}

impl EnergySource {
    /// Power available for traction at the given speed and electrification
    /// state, in watts.  An exhausted reservoir delivers nothing.
    pub fn max_output_power(&self, _speed: f64, electrified: bool) -> f64 {
        match self {
            EnergySource::Catenary { max_output_power, efficiency } => {
                if electrified {
                    max_output_power * efficiency
                } else {
                    0.0
                }
            }
            EnergySource::PowerPack { max_output_power, efficiency, storage } => {
                if storage.is_empty() {
                    0.0
                } else {
                    max_output_power * efficiency
                }
            }
            EnergySource::Battery { max_output_power, efficiency, storage, .. } => {
                if storage.is_empty() {
                    0.0
                } else {
                    max_output_power * efficiency
                }
            }
        }
    }

    /// The maximum refill power this source can capture, in watts.
    pub fn max_input_power(&self) -> f64 {
        match self {
            EnergySource::Battery { max_input_power, .. } => *max_input_power,
            _ => 0.0,
        }
    }

    /// Consume a signed amount of energy, in joules.
    ///
    /// `delta > 0` draws from the source; `delta < 0` stores into it.
    /// Sources without a reservoir ignore the call.
    pub fn consume_energy(&mut self, delta: f64) {
        match self {
            EnergySource::Catenary { .. } => {}
            EnergySource::PowerPack { storage, .. } => storage.consume(delta),
            EnergySource::Battery { storage, .. } => storage.consume(delta),
        }
    }

    /// Remaining stored energy, in joules.  `None` for unbounded sources.
    pub fn remaining_energy(&self) -> Option<f64> {
        match self {
            EnergySource::Catenary { .. } => None,
            EnergySource::PowerPack { storage, .. } => Some(storage.charge),
            EnergySource::Battery { storage, .. } => Some(storage.charge),
        }
    }
}

/// Account one integration step's traction energy against the sources.
///
/// Sources are drained in list order, each up to its own output-power bound
/// over the step.  Any deficit is simply not delivered.  When the demand is
/// met with room to spare, the leftover from the last drained source is
/// offered to the remaining sources as regenerative input, bounded by each
/// source's maximum input power.
pub fn update_storages(
    sources: &mut [EnergySource],
    traction_force: f64,
    speed: f64,
    time_step: f64,
    electrified: bool,
) {
    // Total energy the traction demand represents over the step.
    let mut remaining = traction_force * speed * time_step;
    let mut surplus = 0.0;
    for source in sources.iter_mut() {
        if remaining > 0.0 {
            let available = source.max_output_power(speed, electrified) * time_step;
            let consumed = available.min(remaining);
            source.consume_energy(consumed);
            remaining -= consumed;
            surplus = available - consumed;
        } else {
            let stored = (source.max_input_power() * time_step).min(surplus);
            source.consume_energy(-stored);
            surplus -= stored;
        }
    }
}
