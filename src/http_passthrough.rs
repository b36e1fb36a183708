use crate::error::FilterResult;
use crate::generic_filter::FilterHandle;
use crate::http_filter::{HttpFilterChain, HttpFilterHandler};
use crate::message::{HttpRequest, HttpResponse};

/// This implements the [`crate::HttpFilterHandler`] trait.
///
/// This is a passthrough filter that does nothing but continue the chain.
#[derive(Debug, Default)]
pub struct Filter {}

impl HttpFilterHandler for Filter {
    fn do_filter_http(
        &self,
        _filter: &FilterHandle,
        request: &mut HttpRequest,
        response: &mut HttpResponse,
        chain: &mut HttpFilterChain<'_>,
    ) -> FilterResult<()> {
        chain.do_filter(request, response)
    }
}
