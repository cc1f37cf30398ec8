//! Convoca — Event bounded context.
//!
//! A single-organization activity: the aggregate, its lifecycle state
//! machine, the registration rules and the application command handlers.

pub mod application;
pub mod domain;
