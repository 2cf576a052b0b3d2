#![forbid(unsafe_code)]

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    #[error("data consistency violation: {0}")]
    DataConsistency(String),
}
