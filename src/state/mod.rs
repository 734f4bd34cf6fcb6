// src/state/mod.rs
//
// Control-side state for the arpeggiator.
//
// This module contains what the control/UI thread owns: the
// configuration values, their metadata, and the commands it can send.
// The engine only ever reads configuration through snapshots.

mod command;
mod config;
mod param_info;

pub use command::*;
pub use config::*;
pub use param_info::*;
