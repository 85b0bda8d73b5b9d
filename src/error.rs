use thiserror::Error;

/// Why a submitted prediction was turned away.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Missing or wrong token. Checked before the payload is looked at.
    #[error("{0}")]
    Unauthorized(String),

    /// Payload does not fit either wire shape.
    #[error("{0}")]
    Invalid(String),
}

pub type ValidationResult<T> = Result<T, Rejection>;

impl Rejection {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Rejection::Invalid(msg.into())
    }

    /// HTTP status a transport should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Rejection::Unauthorized(_) => 401,
            Rejection::Invalid(_) => 400,
        }
    }

    /// `status: message`, as reported back to the caller.
    pub fn status_line(&self) -> String {
        format!("{}: {}", self.status_code(), self)
    }
}
