use eligibility_engine::EngineError;
use roster_pdf::RosterPdfError;
use session_store::SessionStoreError;
use thiserror::Error;

/// Fatal errors surfaced by the facade. Per-record problems never take
/// this path; they become FailureRecords instead.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Document(#[from] RosterPdfError),

    #[error(transparent)]
    Session(#[from] SessionStoreError),

    #[error("empty batch: {0}")]
    EmptyBatch(&'static str),
}
