//! Subcommand implementations

pub mod estimate;
pub mod flag;
pub mod mark;
pub mod rehearse;
pub mod segment;
pub mod tune;
