use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectError {
    /// A track in the pool has no features, so it has no distance.
    #[error("track {uri} has no features; annotate the pool before selecting")]
    Unannotated { uri: String },
}
