//! Local adapters for single-server deployment.

pub mod http;
pub mod progress;
pub mod queue;
pub mod repository;

pub use http::{router, AppState};
pub use progress::InMemoryProgress;
pub use queue::ChannelQueue;
pub use repository::JsonFileRepository;
