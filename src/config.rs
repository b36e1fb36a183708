use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::context::Context;

/// The configuration a filter receives at `init` time.
///
/// It is owned by whoever drives the filter's lifecycle; the filter only keeps a shared
/// reference to it between `init` and `destroy`.
pub trait FilterConfig: Send + Sync {
    /// The name this filter instance was declared with.
    fn filter_name(&self) -> &str;

    /// Returns the value of the named init parameter, or `None` if it was never set.
    fn init_parameter(&self, name: &str) -> Option<String>;

    /// The names of all init parameters.
    fn init_parameter_names(&self) -> Vec<String>;

    /// The context shared by every filter of the application.
    fn context(&self) -> Arc<dyn Context>;
}

/// A [`FilterConfig`] holding its name and parameters in memory.
#[derive(Clone)]
pub struct StaticFilterConfig {
    name: String,
    init_params: BTreeMap<String, String>,
    context: Arc<dyn Context>,
}

impl StaticFilterConfig {
    pub fn new(name: impl Into<String>, context: Arc<dyn Context>) -> Self {
        Self {
            name: name.into(),
            init_params: BTreeMap::new(),
            context,
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.init_params.insert(name.into(), value.into());
        self
    }

    pub fn with_parameters<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.init_params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }
}

impl fmt::Debug for StaticFilterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticFilterConfig")
            .field("name", &self.name)
            .field("init_params", &self.init_params)
            .finish_non_exhaustive()
    }
}

impl FilterConfig for StaticFilterConfig {
    fn filter_name(&self) -> &str {
        &self.name
    }

    fn init_parameter(&self, name: &str) -> Option<String> {
        self.init_params.get(name).cloned()
    }

    fn init_parameter_names(&self) -> Vec<String> {
        self.init_params.keys().cloned().collect()
    }

    fn context(&self) -> Arc<dyn Context> {
        Arc::clone(&self.context)
    }
}

/// One filter of a pipeline, as written in a JSON pipeline definition.
///
/// ```json
/// {
///   "name": "audit",
///   "kind": "access_logger",
///   "init_params": { "level": "debug" }
/// }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FilterDefinition {
    /// Instance name, reported by `filter_name` and used as the log prefix.
    pub name: String,
    /// Which built-in filter to instantiate, see [`crate::new_filter`].
    pub kind: String,
    #[serde(default)]
    pub init_params: BTreeMap<String, String>,
}

impl FilterDefinition {
    /// Parse a list of definitions from a JSON array.
    pub fn parse_list(definitions: &str) -> serde_json::Result<Vec<Self>> {
        serde_json::from_str(definitions)
    }

    pub fn to_config(&self, context: Arc<dyn Context>) -> StaticFilterConfig {
        StaticFilterConfig::new(self.name.clone(), context).with_parameters(self.init_params.clone())
    }
}
