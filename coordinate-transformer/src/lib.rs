#[cfg(feature = "proj")]
mod error;
mod transformer;

pub use transformer::{PointTransformer, PointTransformerProvider};
