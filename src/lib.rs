//! Bobo's Adventure: a side-scrolling platformer core.
//!
//! `domain` holds the pure rules, `sim` the session state machine and
//! level data. The terminal front-end lives in the binary.

pub mod config;
pub mod domain;
pub mod sim;
