//! Ports - Trait definitions implemented by adapters.

pub mod progress;
pub mod queue;
pub mod repository;
