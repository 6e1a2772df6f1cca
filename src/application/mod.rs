//! Application layer - Services that drive the domain through ports.

pub mod orchestrator;
pub mod outputs;
pub mod reporter;
pub mod worker;
