use thiserror::Error;

#[derive(Debug, Error)]
pub enum YocoApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not reach the Yoco API: {0}")]
    RequestError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
}

impl YocoApiError {
    /// True when the gateway answered with a well-formed non-2xx response, as opposed to not answering at all.
    pub fn is_rejection(&self) -> bool {
        matches!(self, YocoApiError::QueryError { .. })
    }
}
