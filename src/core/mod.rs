//! Core building blocks: pipeline parameters (`params`), tile discovery with a
//! deterministic band order (`discover`), and compatibility checking plus
//! stack assembly (`stack`). Consumed by the high-level `api` module.
pub mod discover;
pub mod params;
pub mod stack;
