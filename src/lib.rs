// * SEO Sentinel - page scoring, generators, monitoring and the HTTP API
// * The scorer is the core; every other module consumes it.

pub mod automation;
pub mod config;
pub mod engine;
pub mod generators;
pub mod keywords;
pub mod network;
pub mod ops;
pub mod persistence;
pub mod refinery;
pub mod server;

pub use engine::scorer::{analyze, PageAnalysis};
