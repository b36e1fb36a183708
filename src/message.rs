//! Request and response values flowing through a filter chain.
//!
//! Messages are either HTTP messages, carried as [`http`] types with a [`Bytes`] body, or opaque
//! messages of some other protocol. HTTP filters only accept the former; the `as_http*` accessors
//! are the capability check they use to narrow a message.

use bytes::Bytes;

pub type HttpRequest = http::Request<Bytes>;
pub type HttpResponse = http::Response<Bytes>;

/// A message of a protocol other than HTTP.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenericMessage {
    pub protocol: String,
    pub payload: Bytes,
}

impl GenericMessage {
    pub fn new(protocol: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            protocol: protocol.into(),
            payload: payload.into(),
        }
    }
}

#[derive(Debug)]
pub enum Request {
    Http(HttpRequest),
    Generic(GenericMessage),
}

#[derive(Debug)]
pub enum Response {
    Http(HttpResponse),
    Generic(GenericMessage),
}

impl Request {
    pub fn is_http(&self) -> bool {
        matches!(self, Request::Http(_))
    }

    pub fn as_http(&self) -> Option<&HttpRequest> {
        match self {
            Request::Http(request) => Some(request),
            Request::Generic(_) => None,
        }
    }

    pub fn as_http_mut(&mut self) -> Option<&mut HttpRequest> {
        match self {
            Request::Http(request) => Some(request),
            Request::Generic(_) => None,
        }
    }
}

impl Response {
    pub fn is_http(&self) -> bool {
        matches!(self, Response::Http(_))
    }

    pub fn as_http(&self) -> Option<&HttpResponse> {
        match self {
            Response::Http(response) => Some(response),
            Response::Generic(_) => None,
        }
    }

    pub fn as_http_mut(&mut self) -> Option<&mut HttpResponse> {
        match self {
            Response::Http(response) => Some(response),
            Response::Generic(_) => None,
        }
    }
}

impl From<HttpRequest> for Request {
    fn from(request: HttpRequest) -> Self {
        Request::Http(request)
    }
}

impl From<HttpResponse> for Response {
    fn from(response: HttpResponse) -> Self {
        Response::Http(response)
    }
}

impl From<GenericMessage> for Request {
    fn from(message: GenericMessage) -> Self {
        Request::Generic(message)
    }
}

impl From<GenericMessage> for Response {
    fn from(message: GenericMessage) -> Self {
        Response::Generic(message)
    }
}
