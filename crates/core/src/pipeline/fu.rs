//! Function-unit availability pools.
//!
//! Three independent classes of execution resources, sized by the
//! configuration. Units within a class are anonymous and symmetric:
//! reserving occupies any free slot, releasing frees any occupied slot.
//! No binding between a unit and the instruction using it is kept; with
//! identical one-cycle latency across a class, none is needed.

use crate::config::SimConfig;
use crate::pipeline::instruction::FuClass;

/// Per-class pools of function-unit availability.
pub struct FuPool {
    /// `true` = unit free. Indexed by `FuClass::index()`.
    units: [Vec<bool>; 3],
}

impl FuPool {
    /// Creates pools sized `k0`/`k1`/`k2` from the configuration, all free.
    pub fn new(config: &SimConfig) -> Self {
        Self {
            units: [
                vec![true; config.k0],
                vec![true; config.k1],
                vec![true; config.k2],
            ],
        }
    }

    /// Reserves one free unit of `class`. Returns `false` if none is free.
    pub fn reserve(&mut self, class: FuClass) -> bool {
        let pool = &mut self.units[class.index()];
        match pool.iter().position(|free| *free) {
            Some(slot) => {
                pool[slot] = false;
                true
            }
            None => false,
        }
    }

    /// Releases one occupied unit of `class`.
    ///
    /// Units are anonymous, so the first occupied slot is freed. No-op if
    /// the whole class is already free.
    pub fn release(&mut self, class: FuClass) {
        let pool = &mut self.units[class.index()];
        if let Some(slot) = pool.iter().position(|free| !*free) {
            pool[slot] = true;
        }
    }

    /// Number of units in `class`.
    pub fn capacity(&self, class: FuClass) -> usize {
        self.units[class.index()].len()
    }

    /// Number of occupied units in `class`.
    pub fn occupied(&self, class: FuClass) -> usize {
        self.units[class.index()]
            .iter()
            .filter(|free| !**free)
            .count()
    }
}
