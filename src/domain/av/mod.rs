//! Media-tool integration: segment extraction and lossless concatenation.

pub mod cmd;
pub mod concat;
pub mod probe;
pub mod segments;
