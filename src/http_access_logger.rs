use serde::{Deserialize, Serialize};

use crate::error::{FilterError, FilterResult};
use crate::generic_filter::FilterHandle;
use crate::http_filter::{HttpFilterChain, HttpFilterHandler};
use crate::message::{HttpRequest, HttpResponse};

/// This implements the [`crate::HttpFilterHandler`] trait.
///
/// Once the rest of the chain has returned, this writes one JSON line per exchange to the
/// context log through [`FilterHandle::log`], so every line is prefixed with the filter name.
/// A failing chain is still logged, with whatever status the response carries at that point,
/// and its error is passed on.
///
/// Setting the `include_headers` init parameter to `true` adds the request headers to each line.
#[derive(Debug, Default)]
pub struct Filter {
    include_headers: bool,
}

#[derive(Serialize, Deserialize, Debug)]
struct LogMessage {
    method: String,
    uri: String,
    status: u16,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    request_headers: Vec<String>,
}

impl HttpFilterHandler for Filter {
    fn init(&mut self, filter: &FilterHandle) -> FilterResult<()> {
        self.include_headers = filter
            .init_parameter("include_headers")?
            .is_some_and(|value| value.eq_ignore_ascii_case("true"));
        Ok(())
    }

    fn do_filter_http(
        &self,
        filter: &FilterHandle,
        request: &mut HttpRequest,
        response: &mut HttpResponse,
        chain: &mut HttpFilterChain<'_>,
    ) -> FilterResult<()> {
        // Captured up front, downstream stages may rewrite the request.
        let method = request.method().to_string();
        let uri = request.uri().to_string();
        let mut request_headers = Vec::new();
        if self.include_headers {
            for (key, value) in request.headers() {
                let Ok(value) = value.to_str() else {
                    continue;
                };
                request_headers.push(format!("{}: {}", key, value));
            }
        }

        let result = chain.do_filter(request, response);

        let message = serde_json::to_string(&LogMessage {
            method,
            uri,
            status: response.status().as_u16(),
            request_headers,
        })
        .map_err(|err| FilterError::Processing(format!("error encoding access log: {err}")))?;
        filter.log(&message)?;
        result
    }
}
