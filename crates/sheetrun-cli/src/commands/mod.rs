//! CLI command definitions.

pub mod capabilities;
pub mod run;
pub mod serve;
