pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Graph(#[from] canopy_graph::Error),

    #[error(transparent)]
    Layout(#[from] canopy_layout::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("{what}: `{value}` is not implemented")]
    Unsupported { what: &'static str, value: String },

    #[error("Node `{id}` is not in the graph")]
    NodeNotFound { id: String },

    #[error("No graph loaded")]
    NotLoaded,
}

impl Error {
    pub(crate) fn unsupported(what: &'static str, value: impl Into<String>) -> Self {
        Error::Unsupported {
            what,
            value: value.into(),
        }
    }
}
