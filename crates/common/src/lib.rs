//! Error taxonomy and front-end protocol types shared across `textseal` crates.

pub mod error;
pub mod protocol;

pub use error::SealError;
