//! HTTP-specific filters.
//!
//! An [`HttpFilterHandler`] only ever sees HTTP messages. Wrapped in [`Http`], it becomes a
//! [`FilterHandler`] that checks both halves of the pair and rejects anything else with
//! [`FilterError::NonHttpMessage`] before the handler runs.

use crate::chain::FilterChain;
use crate::error::{FilterError, FilterResult};
use crate::generic_filter::{FilterHandle, FilterHandler, GenericFilter};
use crate::message::{HttpRequest, HttpResponse, Request, Response};

/// The behavior of an HTTP filter.
pub trait HttpFilterHandler: Send + Sync {
    fn init(&mut self, _filter: &FilterHandle) -> FilterResult<()> {
        Ok(())
    }

    /// Process one HTTP exchange. Call `chain.do_filter` to continue the pipeline.
    fn do_filter_http(
        &self,
        filter: &FilterHandle,
        request: &mut HttpRequest,
        response: &mut HttpResponse,
        chain: &mut HttpFilterChain<'_>,
    ) -> FilterResult<()>;

    fn destroy(&mut self, _filter: &FilterHandle) {}
}

/// Runs an [`HttpFilterHandler`] behind the HTTP capability check.
#[derive(Debug, Default)]
pub struct Http<H>(pub H);

/// A filter that only accepts HTTP messages.
pub type HttpFilter<H> = GenericFilter<Http<H>>;

impl<H: HttpFilterHandler> GenericFilter<Http<H>> {
    pub fn http(handler: H) -> Self {
        GenericFilter::new(Http(handler))
    }
}

impl<H: HttpFilterHandler> FilterHandler for Http<H> {
    fn init(&mut self, filter: &FilterHandle) -> FilterResult<()> {
        self.0.init(filter)
    }

    fn do_filter(
        &self,
        filter: &FilterHandle,
        request: &mut Request,
        response: &mut Response,
        chain: &mut dyn FilterChain,
    ) -> FilterResult<()> {
        let (Some(request), Some(response)) = (request.as_http_mut(), response.as_http_mut())
        else {
            tracing::warn!(
                filter = filter.filter_name().unwrap_or("<uninitialized>"),
                "rejecting non-HTTP request or response"
            );
            return Err(FilterError::NonHttpMessage);
        };
        let mut chain = HttpFilterChain::new(chain);
        self.0.do_filter_http(filter, request, response, &mut chain)
    }

    fn destroy(&mut self, filter: &FilterHandle) {
        self.0.destroy(filter)
    }
}

/// The rest of the pipeline, as seen by an HTTP filter.
pub struct HttpFilterChain<'a> {
    inner: &'a mut dyn FilterChain,
}

impl<'a> HttpFilterChain<'a> {
    pub fn new(inner: &'a mut dyn FilterChain) -> Self {
        Self { inner }
    }

    /// The chain this one continues.
    pub fn inner(&mut self) -> &mut dyn FilterChain {
        &mut *self.inner
    }

    /// Hands the exchange to the next stage.
    ///
    /// The next stage may replace the messages it is given, but must keep them HTTP; if it
    /// doesn't, this fails with [`FilterError::NonHttpMessage`] and the pair is left as empty
    /// HTTP messages.
    pub fn do_filter(
        &mut self,
        request: &mut HttpRequest,
        response: &mut HttpResponse,
    ) -> FilterResult<()> {
        let mut wrapped_request = Request::Http(std::mem::take(request));
        let mut wrapped_response = Response::Http(std::mem::take(response));
        let result = self.inner.do_filter(&mut wrapped_request, &mut wrapped_response);

        let mut narrowed = true;
        match wrapped_request {
            Request::Http(inner) => *request = inner,
            Request::Generic(_) => narrowed = false,
        }
        match wrapped_response {
            Response::Http(inner) => *response = inner,
            Response::Generic(_) => narrowed = false,
        }
        result?;
        if narrowed {
            Ok(())
        } else {
            Err(FilterError::NonHttpMessage)
        }
    }
}
