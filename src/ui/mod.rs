//! Terminal front-end: keyboard and gamepad input, rendering, sound.

pub mod gamepad;
pub mod input;
pub mod renderer;
pub mod sound;
