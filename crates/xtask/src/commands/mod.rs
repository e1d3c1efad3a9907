//! Command implementations for xtask
//!
//! Each command is a separate module that implements its own CLI args and execution logic.

mod probe;
mod render;

pub use probe::Probe;
pub use render::Render;
