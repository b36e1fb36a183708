//! Filter lifecycle API for HTTP filter pipelines.
//!
//! A [`Filter`] is initialized once with a [`FilterConfig`], asked to process every
//! request/response pair handed to it together with the [`FilterChain`] of the stages after it,
//! and destroyed once. [`GenericFilter`] keeps the configuration for a [`FilterHandler`] and
//! exposes it through [`FilterHandle`]; [`HttpFilter`] adds the check that both messages are HTTP.
//!
//! ```
//! use std::sync::Arc;
//! use filter_api::*;
//!
//! let context = Arc::new(RecordingContext::new());
//! let mut filter = GenericFilter::http(http_passthrough::Filter::default());
//! filter
//!     .init(Arc::new(
//!         StaticFilterConfig::new("Audit", context.clone()).with_parameter("level", "debug"),
//!     ))
//!     .unwrap();
//!
//! filter.handle().log("started").unwrap();
//! assert_eq!(context.lines(), vec!["Audit: started"]);
//! assert_eq!(filter.handle().init_parameter("level").unwrap().as_deref(), Some("debug"));
//! ```

mod chain;
mod config;
mod context;
mod error;
mod generic_filter;
mod http_filter;
mod message;

pub mod http_access_logger;
pub mod http_header_mutation;
pub mod http_passthrough;
pub mod http_random_auth;

pub use chain::{FilterChain, Pipeline};
pub use config::{FilterConfig, FilterDefinition, StaticFilterConfig};
pub use context::{Context, RecordingContext, TracingContext};
pub use error::{FilterError, FilterResult};
pub use generic_filter::{Filter, FilterHandle, FilterHandler, GenericFilter, Lifecycle};
pub use http_filter::{Http, HttpFilter, HttpFilterChain, HttpFilterHandler};
pub use message::{GenericMessage, HttpRequest, HttpResponse, Request, Response};

/// Creates an uninitialized instance of one of the built-in filters.
///
/// This is the entrypoint [`Pipeline::from_json`] uses for the `kind` of every
/// [`FilterDefinition`]. The returned filter still has to be passed to [`Filter::init`].
///
/// Returns [`FilterError::UnknownFilter`] if `kind` names no built-in filter.
pub fn new_filter(kind: &str) -> FilterResult<Box<dyn Filter>> {
    match kind {
        "passthrough" => Ok(Box::new(GenericFilter::http(http_passthrough::Filter::default()))),
        "access_logger" => Ok(Box::new(GenericFilter::http(
            http_access_logger::Filter::default(),
        ))),
        "random_auth" => Ok(Box::new(GenericFilter::http(
            http_random_auth::Filter::default(),
        ))),
        "header_mutation" => Ok(Box::new(GenericFilter::http(
            http_header_mutation::Filter::default(),
        ))),
        _ => Err(FilterError::UnknownFilter {
            kind: kind.to_string(),
        }),
    }
}
