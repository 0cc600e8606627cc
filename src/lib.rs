pub mod action;
pub mod agent;
pub mod board;
pub mod config;
pub mod constants;
pub mod context;
pub mod dispatch;
pub mod evasion;
pub mod factory;
pub mod geometry;
pub mod ledger;
pub mod lichen;
pub mod location;
pub mod needs;
pub mod pathing;
pub mod queue;
pub mod snapshot;

#[cfg(test)]
mod test_support;

pub use agent::*;
pub use config::Tuning;
pub use snapshot::Snapshot;
