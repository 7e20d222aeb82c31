//! Content extraction.
//!
//! Leaf-first: `core` (fetching, text helpers, timing), `detectors`
//! (auth walls), the two extraction tiers, and the per-job `pipeline` that
//! ties them together.

pub mod core;
pub mod detectors;
pub mod pipeline;
pub mod rendered;
pub mod structured;
pub mod user_agents;

pub use pipeline::ExtractionPipeline;
