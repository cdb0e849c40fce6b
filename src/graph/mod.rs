//! Feature correlation network: representation and construction

pub mod algorithms;
pub mod builder;
pub mod network;

pub use builder::{NetworkBuilder, DEFAULT_RELEVANCE_THRESHOLD};
pub use network::{CorrelationGraph, GraphEdge};
