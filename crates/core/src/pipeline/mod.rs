//! Pipeline building blocks: instruction state, hazard tracking, and
//! execution resources.

/// Function-unit availability pools.
pub mod fu;
/// In-flight instruction record and tags.
pub mod instruction;
/// Bounded reservation station.
pub mod rs;
/// Register scoreboard (latest-writer map).
pub mod scoreboard;

pub use fu::FuPool;
pub use instruction::{FuClass, InFlightInst, Tag};
pub use rs::ReservationStation;
pub use scoreboard::Scoreboard;
