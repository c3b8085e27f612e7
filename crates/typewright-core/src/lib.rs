//! Analysis and rewriting engine for generated message-type corpora

pub mod consolidate;
pub mod error;
pub mod extract;
pub mod graph;
pub mod policy;
pub mod resolve;
pub mod rewrite;
pub mod types;

pub use error::CoreError;
pub use extract::{Extractor, ScannedFile};
pub use graph::{NestingDepths, TypeGraph};
pub use policy::{BoxConfig, BoxDecision, Strategy};
