//! The protocol-independent filter lifecycle.
//!
//! [`Filter`] is the surface a pipeline drives: `init` once, `do_filter` for every message,
//! `destroy` once. Most filters don't implement it directly. They implement [`FilterHandler`]
//! and get wrapped in a [`GenericFilter`], which keeps the configuration and gives the handler
//! the convenience accessors of [`FilterHandle`].

use std::sync::Arc;

use crate::chain::FilterChain;
use crate::config::FilterConfig;
use crate::context::Context;
use crate::error::{FilterError, FilterResult};
use crate::message::{Request, Response};

/// A stage of a filter pipeline.
///
/// `do_filter` takes `&self` and may run concurrently for different messages, so per-message
/// state belongs on the stack, not on the filter.
pub trait Filter: Send + Sync {
    /// Called once before the filter sees any message.
    fn init(&mut self, config: Arc<dyn FilterConfig>) -> FilterResult<()>;

    /// Process one request/response pair. Call `chain.do_filter` to hand the pair to the rest
    /// of the pipeline, or don't, to short-circuit it.
    fn do_filter(
        &self,
        request: &mut Request,
        response: &mut Response,
        chain: &mut dyn FilterChain,
    ) -> FilterResult<()>;

    /// Called once when the filter is taken out of service.
    fn destroy(&mut self) {}

    /// The configuration stored by `init`, if any.
    fn filter_config(&self) -> Option<&Arc<dyn FilterConfig>> {
        None
    }
}

/// The configuration slot of a filter plus the accessors that read through it.
///
/// Every accessor fails with [`FilterError::ConfigNotInitialized`] while no configuration is
/// stored.
#[derive(Clone, Default)]
pub struct FilterHandle {
    config: Option<Arc<dyn FilterConfig>>,
}

impl FilterHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored configuration, exactly as passed to `init`.
    pub fn filter_config(&self) -> Option<&Arc<dyn FilterConfig>> {
        self.config.as_ref()
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    pub fn init_parameter(&self, name: &str) -> FilterResult<Option<String>> {
        Ok(self.require("init_parameter")?.init_parameter(name))
    }

    pub fn init_parameter_names(&self) -> FilterResult<Vec<String>> {
        Ok(self.require("init_parameter_names")?.init_parameter_names())
    }

    pub fn context(&self) -> FilterResult<Arc<dyn Context>> {
        Ok(self.require("context")?.context())
    }

    pub fn filter_name(&self) -> FilterResult<&str> {
        Ok(self.require("filter_name")?.filter_name())
    }

    /// Logs `"<filter name>: <message>"` to the context.
    pub fn log(&self, message: &str) -> FilterResult<()> {
        let config = self.require("log")?;
        config
            .context()
            .log(&format!("{}: {}", config.filter_name(), message));
        Ok(())
    }

    fn require(&self, accessor: &'static str) -> FilterResult<&Arc<dyn FilterConfig>> {
        self.config
            .as_ref()
            .ok_or(FilterError::ConfigNotInitialized { accessor })
    }

    pub(crate) fn set(&mut self, config: Arc<dyn FilterConfig>) {
        self.config = Some(config);
    }

    pub(crate) fn clear(&mut self) {
        self.config = None;
    }
}

/// The behavior of a filter hosted by [`GenericFilter`].
///
/// Only `do_filter` is required; the lifecycle hooks default to doing nothing.
pub trait FilterHandler: Send + Sync {
    /// Runs after the configuration has been stored, so the accessors of `filter` are usable.
    fn init(&mut self, _filter: &FilterHandle) -> FilterResult<()> {
        Ok(())
    }

    fn do_filter(
        &self,
        filter: &FilterHandle,
        request: &mut Request,
        response: &mut Response,
        chain: &mut dyn FilterChain,
    ) -> FilterResult<()>;

    /// Runs before the configuration is released. Skipped for a filter that was never given a
    /// configuration.
    fn destroy(&mut self, _filter: &FilterHandle) {}
}

/// Where a [`GenericFilter`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Initialized,
    /// Terminal.
    Destroyed,
}

/// Adapts a [`FilterHandler`] into a [`Filter`] that owns its configuration.
pub struct GenericFilter<H> {
    handle: FilterHandle,
    handler: H,
    state: Lifecycle,
}

impl<H: FilterHandler> GenericFilter<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handle: FilterHandle::new(),
            handler,
            state: Lifecycle::Uninitialized,
        }
    }

    /// The configuration accessors of this filter.
    pub fn handle(&self) -> &FilterHandle {
        &self.handle
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn state(&self) -> Lifecycle {
        self.state
    }

    fn display_name(&self) -> String {
        self.handle
            .filter_name()
            .map(str::to_string)
            .unwrap_or_else(|_| std::any::type_name::<H>().to_string())
    }
}

impl<H: FilterHandler> Filter for GenericFilter<H> {
    fn init(&mut self, config: Arc<dyn FilterConfig>) -> FilterResult<()> {
        if self.state == Lifecycle::Destroyed {
            return Err(FilterError::Destroyed {
                filter: self.display_name(),
            });
        }
        self.handle.set(config);
        self.state = Lifecycle::Uninitialized;
        self.handler.init(&self.handle)?;
        self.state = Lifecycle::Initialized;
        tracing::debug!(filter = %self.display_name(), "filter initialized");
        Ok(())
    }

    fn do_filter(
        &self,
        request: &mut Request,
        response: &mut Response,
        chain: &mut dyn FilterChain,
    ) -> FilterResult<()> {
        if self.state == Lifecycle::Destroyed {
            return Err(FilterError::Destroyed {
                filter: self.display_name(),
            });
        }
        self.handler
            .do_filter(&self.handle, request, response, chain)
    }

    fn destroy(&mut self) {
        if self.state == Lifecycle::Destroyed {
            return;
        }
        // A filter that never received a configuration has nothing to release.
        if self.handle.is_configured() {
            self.handler.destroy(&self.handle);
            tracing::debug!(filter = %self.display_name(), "filter destroyed");
        }
        self.handle.clear();
        self.state = Lifecycle::Destroyed;
    }

    fn filter_config(&self) -> Option<&Arc<dyn FilterConfig>> {
        self.handle.filter_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockFilterChain;
    use crate::config::StaticFilterConfig;
    use crate::context::{MockContext, RecordingContext};
    use crate::message::GenericMessage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts its hooks and forwards every message.
    #[derive(Default)]
    struct Counting {
        inits: usize,
        destroys: Arc<AtomicUsize>,
        /// Fail every init from this (1-based) call on.
        fail_from: Option<usize>,
    }

    impl FilterHandler for Counting {
        fn init(&mut self, filter: &FilterHandle) -> FilterResult<()> {
            self.inits += 1;
            if self.fail_from.is_some_and(|from| self.inits >= from) {
                return Err(FilterError::Init {
                    filter: filter.filter_name()?.to_string(),
                    reason: "boom".to_string(),
                });
            }
            Ok(())
        }

        fn do_filter(
            &self,
            _filter: &FilterHandle,
            request: &mut Request,
            response: &mut Response,
            chain: &mut dyn FilterChain,
        ) -> FilterResult<()> {
            chain.do_filter(request, response)
        }

        fn destroy(&mut self, filter: &FilterHandle) {
            self.destroys.fetch_add(1, Ordering::SeqCst);
            filter.log("stopping").unwrap();
        }
    }

    fn audit_config(context: Arc<RecordingContext>) -> Arc<dyn FilterConfig> {
        Arc::new(StaticFilterConfig::new("Audit", context).with_parameter("level", "debug"))
    }

    fn generic_pair() -> (Request, Response) {
        (
            GenericMessage::new("raw", "ping").into(),
            GenericMessage::new("raw", "").into(),
        )
    }

    #[test]
    fn test_accessors_before_init() {
        let filter = GenericFilter::new(Counting::default());
        assert!(filter.filter_config().is_none());
        assert!(matches!(
            filter.handle().init_parameter("level"),
            Err(FilterError::ConfigNotInitialized {
                accessor: "init_parameter"
            })
        ));
        assert!(matches!(
            filter.handle().init_parameter_names(),
            Err(FilterError::ConfigNotInitialized { .. })
        ));
        assert!(matches!(
            filter.handle().context(),
            Err(FilterError::ConfigNotInitialized { .. })
        ));
        assert!(matches!(
            filter.handle().filter_name(),
            Err(FilterError::ConfigNotInitialized {
                accessor: "filter_name"
            })
        ));
        assert!(matches!(
            filter.handle().log("x"),
            Err(FilterError::ConfigNotInitialized { .. })
        ));
    }

    #[test]
    /// The "Audit" scenario: init, log, and read a parameter.
    fn test_audit_scenario() {
        let context = Arc::new(RecordingContext::new());
        let config = audit_config(context.clone());
        let mut filter = GenericFilter::new(Counting::default());

        filter.init(Arc::clone(&config)).unwrap();
        assert_eq!(filter.state(), Lifecycle::Initialized);
        assert_eq!(filter.handler().inits, 1);
        assert!(Arc::ptr_eq(filter.filter_config().unwrap(), &config));

        filter.handle().log("started").unwrap();
        assert_eq!(context.lines(), vec!["Audit: started"]);
        assert_eq!(
            filter.handle().init_parameter("level").unwrap().as_deref(),
            Some("debug")
        );
        assert_eq!(filter.handle().init_parameter("other").unwrap(), None);
        assert_eq!(filter.handle().init_parameter_names().unwrap(), vec!["level"]);
        assert_eq!(filter.handle().filter_name().unwrap(), "Audit");
    }

    #[test]
    fn test_log_goes_to_context() {
        let mut context = MockContext::new();
        context
            .expect_log()
            .withf(|message| message.to_string() == "Audit: started")
            .times(1)
            .return_const(());
        let config = Arc::new(StaticFilterConfig::new("Audit", Arc::new(context)));
        let mut filter = GenericFilter::new(Counting::default());
        filter.init(config).unwrap();
        filter.handle().log("started").unwrap();
    }

    #[test]
    fn test_init_hook_failure() {
        let context = Arc::new(RecordingContext::new());
        let mut filter = GenericFilter::new(Counting {
            fail_from: Some(1),
            ..Default::default()
        });
        let err = filter.init(audit_config(context)).unwrap_err();
        assert!(matches!(err, FilterError::Init { ref filter, .. } if filter == "Audit"));
        assert_eq!(filter.state(), Lifecycle::Uninitialized);
        // The configuration was stored before the hook ran.
        assert!(filter.filter_config().is_some());
    }

    #[test]
    fn test_failed_reinit() {
        let context = Arc::new(RecordingContext::new());
        let mut filter = GenericFilter::new(Counting {
            fail_from: Some(2),
            ..Default::default()
        });
        filter
            .init(Arc::new(StaticFilterConfig::new("a", context.clone())))
            .unwrap();
        assert_eq!(filter.state(), Lifecycle::Initialized);

        let err = filter
            .init(Arc::new(StaticFilterConfig::new("b", context)))
            .unwrap_err();
        assert!(matches!(err, FilterError::Init { ref filter, .. } if filter == "b"));
        assert_eq!(filter.state(), Lifecycle::Uninitialized);
        assert_eq!(filter.handle().filter_name().unwrap(), "b");
    }

    #[test]
    /// One filter instance serves many threads at once.
    fn test_concurrent_do_filter() {
        let context = Arc::new(RecordingContext::new());
        let mut filter = GenericFilter::new(Counting::default());
        filter.init(audit_config(context)).unwrap();
        let filter = Arc::new(filter);
        let forwarded = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let filter = Arc::clone(&filter);
                let forwarded = Arc::clone(&forwarded);
                std::thread::spawn(move || {
                    let mut chain = |_: &mut Request, _: &mut Response| -> FilterResult<()> {
                        forwarded.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    };
                    for _ in 0..50 {
                        let (mut request, mut response) = generic_pair();
                        filter
                            .do_filter(&mut request, &mut response, &mut chain)
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(forwarded.load(Ordering::SeqCst), 400);
        assert_eq!(filter.state(), Lifecycle::Initialized);
    }

    #[test]
    fn test_do_filter_forwards() {
        let context = Arc::new(RecordingContext::new());
        let mut filter = GenericFilter::new(Counting::default());
        filter.init(audit_config(context)).unwrap();

        let mut chain = MockFilterChain::new();
        chain.expect_do_filter().times(1).returning(|_, _| Ok(()));
        let (mut request, mut response) = generic_pair();
        filter
            .do_filter(&mut request, &mut response, &mut chain)
            .unwrap();
    }

    #[test]
    fn test_destroy_fresh_filter() {
        let destroys = Arc::new(AtomicUsize::new(0));
        let mut filter = GenericFilter::new(Counting {
            destroys: destroys.clone(),
            ..Default::default()
        });
        filter.destroy();
        assert_eq!(destroys.load(Ordering::SeqCst), 0);
        assert_eq!(filter.state(), Lifecycle::Destroyed);
        assert!(filter.filter_config().is_none());
    }

    #[test]
    fn test_destroy_is_terminal() {
        let context = Arc::new(RecordingContext::new());
        let destroys = Arc::new(AtomicUsize::new(0));
        let mut filter = GenericFilter::new(Counting {
            destroys: destroys.clone(),
            ..Default::default()
        });
        filter.init(audit_config(context.clone())).unwrap();
        filter.destroy();
        filter.destroy();

        assert_eq!(destroys.load(Ordering::SeqCst), 1);
        // The handler could still log while being destroyed.
        assert_eq!(context.lines(), vec!["Audit: stopping"]);
        assert!(matches!(
            filter.handle().filter_name(),
            Err(FilterError::ConfigNotInitialized { .. })
        ));

        let mut chain = MockFilterChain::new();
        chain.expect_do_filter().times(0);
        let (mut request, mut response) = generic_pair();
        assert!(matches!(
            filter.do_filter(&mut request, &mut response, &mut chain),
            Err(FilterError::Destroyed { .. })
        ));
        assert!(matches!(
            filter.init(audit_config(context)),
            Err(FilterError::Destroyed { .. })
        ));
    }
}
