//! Command-line interface module.
//!
//! Command definitions and per-command handlers for the vermeer binary.

mod balance;
mod commands;
mod credits;
mod status;
mod submit;
mod wire;
mod worker;

pub use balance::handle_balance_command;
pub use commands::{Cli, Commands, RuntimeArgs};
pub use credits::handle_credits_command;
pub use status::handle_status_command;
pub use submit::handle_submit_command;
pub use worker::handle_worker_command;
