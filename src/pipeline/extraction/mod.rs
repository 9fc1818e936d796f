pub mod confidence;
pub mod patterns;
pub mod types;

pub use patterns::{Anchor, PatternExtractor, MIN_ANCHORS};
pub use types::*;
