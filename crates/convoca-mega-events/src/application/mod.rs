//! Application layer for the MegaEvent context.

pub mod command_handlers;
