use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;

use reqwest::StatusCode;
use reqwest::header::InvalidHeaderValue;
use serde_json::Value;

/// Broad category of an [`Error`].
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum Kind {
    /// Network or TLS failure reported by the HTTP transport.
    Transport,
    /// The response body was not JSON, or lacked the `code` field.
    Malformed,
    /// The API answered with a non-`"0"` code or a non-200 status.
    Failed,
    /// Invalid input supplied by the caller.
    Validation,
    /// Anything else, usually a serialization failure.
    Internal,
}

#[derive(Debug)]
pub struct Error {
    kind: Kind,
    backtrace: Backtrace,
    inner: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl Error {
    pub fn with_source<S: StdError + Send + Sync + 'static>(kind: Kind, source: S) -> Self {
        Self {
            kind,
            backtrace: Backtrace::capture(),
            inner: Some(Box::new(source)),
        }
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[must_use]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    #[must_use]
    pub fn inner(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.inner.as_deref()
    }

    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        let e = self.inner.as_deref()?;
        e.downcast_ref::<E>()
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Validation {
            reason: message.into(),
        }
        .into()
    }

    pub fn malformed<P: Into<String>, S: Into<String>>(
        path: P,
        status: StatusCode,
        reason: S,
    ) -> Self {
        Malformed {
            path: path.into(),
            status,
            reason: reason.into(),
        }
        .into()
    }

    pub fn failed<P: Into<String>>(
        path: P,
        status: StatusCode,
        code: Option<String>,
        body: Value,
    ) -> Self {
        Failed {
            path: path.into(),
            status,
            code,
            body,
        }
        .into()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Some(source) => write!(f, "{}: {}", self.kind, source),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner
            .as_ref()
            .map(|e| &**e as &(dyn StdError + 'static))
    }
}

/// The API returned something that could not be classified.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Malformed {
    pub path: String,
    pub status: StatusCode,
    pub reason: String,
}

impl fmt::Display for Malformed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "malformed response from {} (status {}): {}",
            self.path, self.status, self.reason
        )
    }
}

impl StdError for Malformed {}

/// The API rejected the request. `body` is the full parsed response.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub struct Failed {
    pub path: String,
    pub status: StatusCode,
    pub code: Option<String>,
    pub body: Value,
}

impl fmt::Display for Failed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "request to {} failed (status {}, code {}): {}",
            self.path,
            self.status,
            self.code.as_deref().unwrap_or("<none>"),
            self.body
        )
    }
}

impl StdError for Failed {}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub reason: String,
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid: {}", self.reason)
    }
}

impl StdError for Validation {}

impl From<Malformed> for Error {
    fn from(err: Malformed) -> Self {
        Error::with_source(Kind::Malformed, err)
    }
}

impl From<Failed> for Error {
    fn from(err: Failed) -> Self {
        Error::with_source(Kind::Failed, err)
    }
}

impl From<Validation> for Error {
    fn from(err: Validation) -> Self {
        Error::with_source(Kind::Validation, err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::with_source(Kind::Transport, e)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::with_source(Kind::Validation, e)
    }
}

impl From<InvalidHeaderValue> for Error {
    fn from(e: InvalidHeaderValue) -> Self {
        Error::with_source(Kind::Validation, e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::with_source(Kind::Internal, e)
    }
}
