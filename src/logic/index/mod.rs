//! Index Module - Composite Climate Impact Index
//!
//! ## Architecture
//! - `normalize.rs` - Min-max reference statistics and scope handling
//! - `composite.rs` - Sub-components, weights and `CompositeIndexBuilder`

pub mod normalize;
pub mod composite;


pub use composite::{CompositeIndexBuilder, IndexRecord, IndexScores, IndexTable, SubComponent};
pub use normalize::{NormalizationReference, ReferenceStats};
