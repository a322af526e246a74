//! Error types for tally
//!
//! Only configuration mistakes are fatal. Anything wrong with a
//! document's *content* is reported as a document-scoped [`Issue`]
//! instead, and the run continues without that document.
//!
//! [`Issue`]: crate::models::Issue

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A document was routed with a platform/warehouse tag no parser is
    /// registered for. Raised before any parsing begins.
    #[error("Unknown source tag: {0}")]
    UnknownSource(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;
