// consensus/src/lib.rs

//! Consensus mechanics: fork choice, producer rotation, hardfork versioning
//!
//! This crate implements:
//! - The fork index: a bounded DAG of blocks not yet irreversible
//! - The weighted virtual-time round robin that schedules block producers
//! - The versioned hardfork tables and their transition driver
//!
//! Everything here is deterministic: two nodes feeding the same blocks
//! through these routines compute identical schedules, identical fork
//! choices and identical hardfork transitions.

pub mod fork;
pub mod hardfork;
pub mod schedule;

pub use fork::ForkDatabase;
pub use hardfork::HardforkSchedule;
pub use schedule::{ScheduleConfig, VIRTUAL_SCHEDULE_LAP_LENGTH};
