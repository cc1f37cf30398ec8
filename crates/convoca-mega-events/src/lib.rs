//! Convoca — MegaEvent bounded context.
//!
//! A multi-organization umbrella activity: a principal organizing NGO plus
//! co-organizers, sponsor pledges, a seven-state lifecycle and a richer
//! metrics block.

pub mod application;
pub mod domain;
