//! CLI subcommands

pub mod board;
pub mod evaluate;
pub mod model;
pub mod platform;
pub mod train;
