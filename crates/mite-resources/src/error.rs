//! Error types for mite-resources.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    pub kind: ErrorKind,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// The underlying client error, if this error came from the client.
    pub fn client_error(&self) -> Option<&mite_client::Error> {
        self.source.as_ref()?.downcast_ref::<mite_client::Error>()
    }

    /// Returns true if the request was abandoned by the timeout alarm.
    pub fn is_timeout(&self) -> bool {
        self.client_error().is_some_and(mite_client::Error::is_timeout)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error("Client error: {0}")]
    Client(String),

    #[error("{0}")]
    Other(String),
}

impl From<mite_client::Error> for Error {
    fn from(err: mite_client::Error) -> Self {
        Error {
            kind: ErrorKind::Client(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}
