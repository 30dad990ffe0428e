//! Data models

pub mod attempt;

pub use attempt::*;
