//! Monitoring and reporting core for PassPilot
//!
//! This crate contains:
//! - The duration calculator (elapsed minutes, fallback chain, export contract)
//! - The expiry monitor (passes entering the expiring-soon window)
//! - Trial evaluation (days remaining, banner gating)
//! - CSV export of pass history
//! - The periodic task scheduler and the polling service built on it

mod duration;
mod events;
mod export;
mod monitor;
mod scheduler;
mod service;
mod sink;
mod trial;

pub use duration::*;
pub use events::*;
pub use export::*;
pub use monitor::*;
pub use scheduler::*;
pub use service::*;
pub use sink::*;
pub use trial::*;
