use http::header::{HeaderName, HeaderValue};

use crate::error::FilterResult;
use crate::generic_filter::FilterHandle;
use crate::http_filter::{HttpFilterChain, HttpFilterHandler};
use crate::message::{HttpRequest, HttpResponse};

/// This implements the [`crate::HttpFilterHandler`] trait.
///
/// This sets the request and response headers to the values given in the filter's init
/// parameters. Both parameters are optional JSON arrays of `[name, value]` pairs:
///
/// ```json
/// {
///   "request_headers": "[[\"X-Foo\", \"bar\"]]",
///   "response_headers": "[[\"X-Bar\", \"foo\"]]"
/// }
/// ```
///
/// Request headers are set before the rest of the chain runs, response headers after it returns.
#[derive(Debug, Default)]
pub struct Filter {
    request_headers: Vec<(HeaderName, HeaderValue)>,
    response_headers: Vec<(HeaderName, HeaderValue)>,
}

impl Filter {
    fn headers_param(
        filter: &FilterHandle,
        param: &str,
    ) -> FilterResult<Vec<(HeaderName, HeaderValue)>> {
        let Some(raw) = filter.init_parameter(param)? else {
            return Ok(Vec::new());
        };
        let pairs: Vec<(String, String)> = serde_json::from_str(&raw)?;
        pairs
            .into_iter()
            .map(|(key, value)| -> FilterResult<(HeaderName, HeaderValue)> {
                Ok((
                    HeaderName::from_bytes(key.as_bytes())?,
                    HeaderValue::from_str(&value)?,
                ))
            })
            .collect()
    }
}

impl HttpFilterHandler for Filter {
    fn init(&mut self, filter: &FilterHandle) -> FilterResult<()> {
        self.request_headers = Self::headers_param(filter, "request_headers")?;
        self.response_headers = Self::headers_param(filter, "response_headers")?;
        Ok(())
    }

    fn do_filter_http(
        &self,
        _filter: &FilterHandle,
        request: &mut HttpRequest,
        response: &mut HttpResponse,
        chain: &mut HttpFilterChain<'_>,
    ) -> FilterResult<()> {
        for (key, value) in &self.request_headers {
            request.headers_mut().insert(key.clone(), value.clone());
        }
        chain.do_filter(request, response)?;
        for (key, value) in &self.response_headers {
            response.headers_mut().insert(key.clone(), value.clone());
        }
        Ok(())
    }
}
