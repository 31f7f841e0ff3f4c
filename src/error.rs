use thiserror::Error;

/// Errors from ontology indexing and edit-session setup. Editing itself is
/// infallible once a session exists; stray pixels are skipped, not reported.
#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("{what} volume shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: [usize; 3],
        got: [usize; 3],
    },

    #[error("malformed region ontology: {0}")]
    Ontology(#[from] serde_json::Error),

    #[error("bad color triplet {0:?}")]
    BadColor(String),

    #[error("unknown region: {0}")]
    UnknownRegion(String),

    #[error("no voxels in the paintable categories; cannot frame a view")]
    NoPaintableVoxels,
}
