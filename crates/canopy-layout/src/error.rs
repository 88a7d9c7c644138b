#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("layout root `{id}` is not in the graph")]
    MissingRoot { id: String },
    #[error("{what}: `{value}` is not implemented")]
    Unsupported { what: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, Error>;
