//! Stochastic playout of Petri nets: simulate an accepting net under a weight model and
//! record the runs as a synthetic event log.
#![warn(non_snake_case)]

pub mod config;
pub mod event_log;
pub mod net;
pub mod options;
pub mod playout;
pub mod stochastic;

pub use config::PlayoutConfig;
pub use event_log::EventLog;
pub use playout::{Playout, PlayoutError, PlayoutResult, playout};
