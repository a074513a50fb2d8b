//! Errors raised by reconciliation primitives

/// Result type alias for declarative operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A diff touches an attribute fixed at creation time
    #[error("cannot change immutable attribute {attribute} of {resource}")]
    ImmutableAttribute { resource: String, attribute: String },
}
