use thiserror::Error;

#[derive(Debug, Error)]
pub enum AmortError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },
}
