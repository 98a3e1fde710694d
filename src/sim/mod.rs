//! Game session state and the tick pipeline that drives it.

pub mod error;
pub mod event;
pub mod generate;
pub mod level;
pub mod step;
pub mod world;
