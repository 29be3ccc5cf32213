//! Core engine: the sell → buy → transfer workflow and the balance probe.

pub mod poller;
pub mod workflow;
pub mod balance;
