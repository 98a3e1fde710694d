//! Pure game rules: geometry, entities, motion, enemy AI and collisions.
//! No I/O, no clocks; everything is driven by the simulation step.

pub mod ai;
pub mod collision;
pub mod control;
pub mod entity;
pub mod geometry;
pub mod physics;
