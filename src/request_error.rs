//! Errors accumulated by handlers over the course of one request.
//!
//! Handlers record errors either by extracting [`RequestErrors`] and pushing
//! into it, or by returning an [`Abort`] response. The middlewares in
//! [`crate::middleware`] read the accumulated list once the handler returns.

use axum::{
    extract::FromRequestParts,
    http::{Request, StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};
use std::{
    convert::Infallible,
    error::Error as StdError,
    fmt,
    ops::BitOr,
    sync::{Arc, Mutex, PoisonError},
};

pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Bit set used to tag and filter request errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorType(u64);

impl ErrorType {
    /// Request binding or validation failed.
    pub const BIND: Self = Self(1 << 63);
    /// Rendering the response failed.
    pub const RENDER: Self = Self(1 << 62);
    /// Internal error, not meant for clients. Default for new errors.
    pub const PRIVATE: Self = Self(1 << 0);
    /// Safe to show to clients.
    pub const PUBLIC: Self = Self(1 << 1);
    /// Matches every error.
    pub const ANY: Self = Self(u64::MAX);

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for ErrorType {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// A single error recorded against the current request.
#[derive(Debug, Clone)]
pub struct RequestError {
    source: Arc<dyn StdError + Send + Sync>,
    kind: ErrorType,
    meta: Option<Value>,
}

impl RequestError {
    pub fn new(source: impl Into<BoxError>) -> Self {
        let boxed: BoxError = source.into();
        Self {
            source: Arc::from(boxed),
            kind: ErrorType::PRIVATE,
            meta: None,
        }
    }

    pub fn with_kind(mut self, kind: ErrorType) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn kind(&self) -> ErrorType {
        self.kind
    }

    pub fn meta(&self) -> Option<&Value> {
        self.meta.as_ref()
    }

    pub fn is_type(&self, filter: ErrorType) -> bool {
        self.kind.intersects(filter)
    }

    /// JSON form used in error bodies.
    ///
    /// Object metadata is merged into the top level, any other metadata is
    /// nested under `"meta"`. An `"error"` key holding the message is added
    /// unless the metadata already supplied one.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        match &self.meta {
            Some(Value::Object(meta)) => {
                object.extend(meta.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            Some(Value::Null) | None => {}
            Some(meta) => {
                object.insert("meta".to_string(), meta.clone());
            }
        }
        object
            .entry("error")
            .or_insert_with(|| Value::String(self.source.to_string()));
        Value::Object(object)
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.source, f)
    }
}

impl StdError for RequestError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        // Display already prints the wrapped error.
        self.source.source()
    }
}

/// Ordered list of request errors.
#[derive(Debug, Clone, Default)]
pub struct ErrorList(Vec<RequestError>);

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: RequestError) {
        self.0.push(error);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&RequestError> {
        self.0.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RequestError> {
        self.0.iter()
    }

    /// Errors whose type intersects `filter`. [`ErrorType::ANY`] keeps all.
    pub fn by_type(&self, filter: ErrorType) -> ErrorList {
        if filter == ErrorType::ANY {
            return self.clone();
        }
        self.0
            .iter()
            .filter(|e| e.is_type(filter))
            .cloned()
            .collect()
    }

    /// `None` for an empty list, the bare object for a single error and an
    /// array otherwise.
    pub fn to_json(&self) -> Option<Value> {
        match self.0.as_slice() {
            [] => None,
            [only] => Some(only.to_json()),
            many => Some(Value::Array(many.iter().map(RequestError::to_json).collect())),
        }
    }
}

impl FromIterator<RequestError> for ErrorList {
    fn from_iter<I: IntoIterator<Item = RequestError>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<RequestError> for ErrorList {
    fn extend<I: IntoIterator<Item = RequestError>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for ErrorList {
    type Item = RequestError;
    type IntoIter = std::vec::IntoIter<RequestError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            writeln!(f, "Error #{:02}: {}", i + 1, error)?;
            if let Some(meta) = &error.meta {
                writeln!(f, "     Meta: {}", meta)?;
            }
        }
        Ok(())
    }
}

/// Shared, request-scoped handle over the errors recorded so far.
///
/// Lives in the request extensions so that every middleware layer and the
/// handler observe the same list. As an extractor it never rejects: a fresh
/// list is installed when no middleware put one there.
#[derive(Debug, Clone, Default)]
pub struct RequestErrors(Arc<Mutex<ErrorList>>);

impl RequestErrors {
    /// Returns the handle already attached to `req`, attaching a new one if needed.
    pub fn install<B>(req: &mut Request<B>) -> Self {
        req.extensions_mut()
            .get_or_insert_with(RequestErrors::default)
            .clone()
    }

    pub fn push(&self, error: impl Into<RequestError>) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error.into());
    }

    pub fn snapshot(&self) -> ErrorList {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Moves errors carried on the response (see [`Abort`]) into this list.
    pub fn absorb(&self, response: &mut Response) {
        if let Some(carried) = response.extensions_mut().remove::<ErrorList>() {
            self.0
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend(carried);
        }
    }
}

impl<S> FromRequestParts<S> for RequestErrors
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get_or_insert_with(RequestErrors::default)
            .clone())
    }
}

/// Handler return value that sets a status, leaves the body unwritten and
/// records errors for the middlewares to pick up.
#[derive(Debug)]
pub struct Abort {
    status: StatusCode,
    errors: ErrorList,
}

impl Abort {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            errors: ErrorList::new(),
        }
    }

    /// Aborts with `status` and a single private error.
    pub fn with_error(status: StatusCode, error: impl Into<BoxError>) -> Self {
        Self::new(status).error(RequestError::new(error))
    }

    pub fn error(mut self, error: RequestError) -> Self {
        self.errors.push(error);
        self
    }
}

impl IntoResponse for Abort {
    fn into_response(self) -> Response {
        let mut response = self.status.into_response();
        response.extensions_mut().insert(self.errors);
        response
    }
}
