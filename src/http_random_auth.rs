use bytes::Bytes;
use rand::prelude::*;

use crate::error::{FilterError, FilterResult};
use crate::generic_filter::FilterHandle;
use crate::http_filter::{HttpFilterChain, HttpFilterHandler};
use crate::message::{HttpRequest, HttpResponse};

const DEFAULT_REJECT_RATIO: f64 = 0.5;

/// This implements the [`crate::HttpFilterHandler`] trait.
///
/// This is a passthrough filter that randomly rejects requests with a 403. The share of rejected
/// requests is the `reject_ratio` init parameter, between 0 and 1, defaulting to one half.
#[derive(Debug)]
pub struct Filter {
    reject_ratio: f64,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            reject_ratio: DEFAULT_REJECT_RATIO,
        }
    }
}

impl HttpFilterHandler for Filter {
    fn init(&mut self, filter: &FilterHandle) -> FilterResult<()> {
        let Some(raw) = filter.init_parameter("reject_ratio")? else {
            return Ok(());
        };
        match raw.parse::<f64>() {
            Ok(ratio) if (0.0..=1.0).contains(&ratio) => {
                self.reject_ratio = ratio;
                Ok(())
            }
            _ => Err(FilterError::Init {
                filter: filter.filter_name()?.to_string(),
                reason: format!("reject_ratio must be a number between 0 and 1, got {raw:?}"),
            }),
        }
    }

    fn do_filter_http(
        &self,
        _filter: &FilterHandle,
        request: &mut HttpRequest,
        response: &mut HttpResponse,
        chain: &mut HttpFilterChain<'_>,
    ) -> FilterResult<()> {
        let reject = rand::rng().random::<f64>() < self.reject_ratio;
        if reject {
            *response.status_mut() = http::StatusCode::FORBIDDEN;
            *response.body_mut() = Bytes::from_static(b"Access forbidden");
            return Ok(());
        }
        chain.do_filter(request, response)
    }
}
