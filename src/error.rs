// WHY: typed failures for the pure pipeline stages so callers can tell a bad plan
// from a collaborator contract breach from an internal coverage gap

use thiserror::Error;

/// Errors raised by the splitting, planning, reconciliation and mapping stages
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// The chunk planner was given a zero size limit or sentence spans that do not tile the document
    #[error("invalid chunk plan: {0}")]
    InvalidChunkPlan(String),

    /// A tokenizer reported offsets outside the chunk it was given
    #[error(
        "token offsets [{local_start}, {local_end}) fall outside chunk {chunk_index} of length {chunk_len}"
    )]
    TokenOffsetOutOfRange {
        chunk_index: usize,
        local_start: usize,
        local_end: usize,
        chunk_len: usize,
    },

    /// A reconciled token position is not covered by any sentence span
    #[error("position {position} is not inside any sentence (document length {document_len})")]
    PositionOutOfRange { position: usize, document_len: usize },
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
