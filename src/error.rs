use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeedbackError {
    #[error("invalid credentials")]
    AuthFailure,
    #[error("{0}")]
    Validation(String),
    #[error("metric field `{0}` is missing")]
    MissingField(&'static str),
}
