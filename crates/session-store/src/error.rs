use thiserror::Error;

/// Failure turning a stored primitive tree back into domain values.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("malformed stored batch: {0}")]
    Malformed(String),

    #[error("unknown reason code token '{0}'")]
    UnknownReasonCode(String),

    #[error("unparseable stored date '{0}'")]
    UnparseableDate(String),
}
