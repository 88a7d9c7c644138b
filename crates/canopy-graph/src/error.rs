use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid graph: node `{node}` references missing node `{missing}`")]
    DanglingReference { node: String, missing: String },
    #[error("root index {index} is out of range for {len} nodes")]
    RootIndexOutOfRange { index: usize, len: usize },
    #[error("graph input contains no nodes")]
    EmptyGraph,
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
