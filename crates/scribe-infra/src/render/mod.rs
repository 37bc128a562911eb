//! Page rendering.

mod engine;

pub use engine::LiquidRenderer;
