use std::sync::Arc;

use crate::config::{FilterConfig, FilterDefinition};
use crate::context::Context;
use crate::error::{FilterError, FilterResult};
use crate::generic_filter::Filter;
use crate::message::{Request, Response};

/// The rest of the pipeline, as seen by a filter.
#[cfg_attr(test, mockall::automock)]
pub trait FilterChain {
    /// Hand the pair to the next stage.
    fn do_filter(&mut self, request: &mut Request, response: &mut Response) -> FilterResult<()>;
}

impl<F> FilterChain for F
where
    F: FnMut(&mut Request, &mut Response) -> FilterResult<()>,
{
    fn do_filter(&mut self, request: &mut Request, response: &mut Response) -> FilterResult<()> {
        self(request, response)
    }
}

type Endpoint = dyn Fn(&mut Request, &mut Response) -> FilterResult<()> + Send + Sync;

/// An ordered list of initialized filters in front of a terminal endpoint.
///
/// Filters are initialized as they are added and destroyed in reverse order, once, either by
/// [`Pipeline::destroy`] or when the pipeline is dropped.
pub struct Pipeline {
    filters: Vec<Box<dyn Filter>>,
    endpoint: Box<Endpoint>,
    destroyed: bool,
}

impl Pipeline {
    pub fn new<E>(endpoint: E) -> Self
    where
        E: Fn(&mut Request, &mut Response) -> FilterResult<()> + Send + Sync + 'static,
    {
        Self {
            filters: Vec::new(),
            endpoint: Box::new(endpoint),
            destroyed: false,
        }
    }

    /// Builds a pipeline from a JSON array of [`FilterDefinition`]s, instantiating each one
    /// through [`crate::new_filter`]. Every filter gets its own configuration over the shared
    /// `context`.
    pub fn from_json<E>(definitions: &str, context: Arc<dyn Context>, endpoint: E) -> FilterResult<Self>
    where
        E: Fn(&mut Request, &mut Response) -> FilterResult<()> + Send + Sync + 'static,
    {
        let definitions = FilterDefinition::parse_list(definitions)?;
        let mut pipeline = Self::new(endpoint);
        for definition in &definitions {
            let filter = crate::new_filter(&definition.kind)?;
            pipeline.add(filter, Arc::new(definition.to_config(Arc::clone(&context))))?;
        }
        Ok(pipeline)
    }

    /// Initializes `filter` with `config` and appends it. A filter whose `init` fails is dropped.
    pub fn add(
        &mut self,
        mut filter: Box<dyn Filter>,
        config: Arc<dyn FilterConfig>,
    ) -> FilterResult<()> {
        if self.destroyed {
            return Err(FilterError::PipelineDestroyed);
        }
        let name = config.filter_name().to_string();
        if let Err(err) = filter.init(config) {
            tracing::warn!(filter = %name, error = %err, "filter failed to initialize");
            return Err(err);
        }
        self.filters.push(filter);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Runs one request/response pair through the filters and, unless a filter stops it, the
    /// endpoint.
    pub fn handle(&self, request: &mut Request, response: &mut Response) -> FilterResult<()> {
        if self.destroyed {
            return Err(FilterError::PipelineDestroyed);
        }
        Remaining {
            filters: &self.filters,
            endpoint: self.endpoint.as_ref(),
        }
        .do_filter(request, response)
    }

    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        for filter in self.filters.iter_mut().rev() {
            filter.destroy();
        }
        self.destroyed = true;
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// The part of a pipeline that has not seen the message yet.
struct Remaining<'a> {
    filters: &'a [Box<dyn Filter>],
    endpoint: &'a Endpoint,
}

impl FilterChain for Remaining<'_> {
    fn do_filter(&mut self, request: &mut Request, response: &mut Response) -> FilterResult<()> {
        match self.filters.split_first() {
            Some((filter, rest)) => {
                let mut next = Remaining {
                    filters: rest,
                    endpoint: self.endpoint,
                };
                filter.do_filter(request, response, &mut next)
            }
            None => (self.endpoint)(request, response),
        }
    }
}
