//! Codec error type.

/// Error produced while decoding wire bytes.
///
/// Codec failures are recoverable by design: callers skip the offending
/// record or return an empty result rather than failing the whole store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The input ended before the expected field.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// A field carried a value outside its valid range.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}
