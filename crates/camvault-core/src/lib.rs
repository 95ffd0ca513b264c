//! camvault-core: configuration schema, shared metadata types, and the error
//! taxonomy every camvault crate reports through.

pub mod config;
pub mod error;
pub mod types;

pub use error::{FramingError, VaultError, VaultResult};
