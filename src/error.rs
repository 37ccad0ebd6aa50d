use thiserror::Error;

/// Everything here is raised while turning a payload into a trace; queries
/// against a built trace cannot fail.
#[derive(Error, Debug)]
pub enum ReplayError {
    /// The payload is missing routes, legs, or steps.
    #[error("invalid route input: {0}")]
    Input(String),

    /// A step carries values no trace can be built from.
    #[error("malformed route: {0}")]
    MalformedRoute(String),
}

pub type Result<T> = std::result::Result<T, ReplayError>;
