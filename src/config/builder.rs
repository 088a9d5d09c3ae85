//! Declarative [`Config`] construction
//!
//! The builder captures partial overrides; anything left unset falls back to
//! the defaults documented on [`Config`].
//!
//! # Environment Variable Support
//!
//! [`ConfigBuilder::from_env`] reads:
//! - `ERRATA_DEBUG` → `is_debug`
//! - `ERRATA_ADD_ERROR_ID` → `should_add_error_id`
//!
//! Accepted values are `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off`.

use super::{join_key_log, Config, DefaultConfig};
use crate::code::message::{ResourceId, TextResolver};
use crate::code::{Code, ErrorCode};
use crate::error::Link;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub const ENV_DEBUG: &str = "ERRATA_DEBUG";
pub const ENV_ADD_ERROR_ID: &str = "ERRATA_ADD_ERROR_ID";

type FlagFn = Arc<dyn Fn() -> bool + Send + Sync>;
type DecorateFn = Arc<dyn Fn(&str, &str) -> String + Send + Sync>;
type MapFn = Arc<dyn Fn(&str) -> String + Send + Sync>;
type KeyLogFn = Arc<dyn Fn(ResourceId, &[Value]) -> String + Send + Sync>;
type UnknownFn = Arc<dyn Fn(&dyn TextResolver, Option<Link<'_>>) -> String + Send + Sync>;
type SerializeFn = Arc<dyn Fn(&dyn ErrorCode) -> Option<Value> + Send + Sync>;
type DeserializeFn = Arc<dyn Fn(&Value) -> Option<Code> + Send + Sync>;

/// Bidirectional mapping between resource keys and stable names
pub trait ResourceNames: Send + Sync {
    fn name(&self, key: ResourceId) -> Option<String>;
    fn key(&self, name: &str) -> Option<ResourceId>;
}

/// In-memory [`ResourceNames`] implementation
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    names: HashMap<ResourceId, String>,
    keys: HashMap<String, ResourceId>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: ResourceId, name: impl Into<String>) -> Self {
        let name = name.into();
        self.keys.insert(name.clone(), key);
        self.names.insert(key, name);
        self
    }
}

impl ResourceNames for NameTable {
    fn name(&self, key: ResourceId) -> Option<String> {
        self.names.get(&key).cloned()
    }

    fn key(&self, name: &str) -> Option<ResourceId> {
        self.keys.get(name).copied()
    }
}

/// Fluent builder for [`BuiltConfig`]
#[derive(Clone, Default)]
pub struct ConfigBuilder {
    debug: Option<bool>,
    add_error_id_flag: Option<FlagFn>,
    add_error_id: Option<DecorateFn>,
    domain_to_id: Option<MapFn>,
    null_log: Option<String>,
    message_to_log: Option<MapFn>,
    key_to_log: Option<KeyLogFn>,
    unknown_error: Option<UnknownFn>,
    resource_names: Option<Arc<dyn ResourceNames>>,
    serialize_code: Option<SerializeFn>,
    deserialize_code: Option<DeserializeFn>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the defaults with environment overrides applied
    pub fn from_env() -> Self {
        Self::new().env_overrides(std::env::vars())
    }

    /// Apply `ERRATA_*` overrides from the given variables
    pub fn env_overrides<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let key = key.as_ref();
            if key != ENV_DEBUG && key != ENV_ADD_ERROR_ID {
                continue;
            }
            let Some(flag) = parse_flag(value.as_ref()) else {
                warn!(variable = key, value = value.as_ref(), "ignoring unparsable flag");
                continue;
            };
            debug!(variable = key, flag, "applying environment override");
            if key == ENV_DEBUG {
                self = self.debug(flag);
            } else {
                self = self.add_error_id(flag);
            }
        }
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Annotate rendered text with the error id
    pub fn add_error_id(self, enabled: bool) -> Self {
        self.add_error_id_when(move || enabled)
    }

    /// Decide per render whether to annotate text, e.g. from a preference store
    pub fn add_error_id_when(mut self, flag: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.add_error_id_flag = Some(Arc::new(flag));
        self
    }

    /// How an id is attached to rendered text
    pub fn error_id_format(
        mut self,
        decorate: impl Fn(&str, &str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.add_error_id = Some(Arc::new(decorate));
        self
    }

    pub fn domain_to_id(mut self, map: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.domain_to_id = Some(Arc::new(map));
        self
    }

    pub fn null_log(mut self, null_log: impl Into<String>) -> Self {
        self.null_log = Some(null_log.into());
        self
    }

    pub fn message_to_log(
        mut self,
        map: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.message_to_log = Some(Arc::new(map));
        self
    }

    pub fn key_to_log(
        mut self,
        map: impl Fn(ResourceId, &[Value]) -> String + Send + Sync + 'static,
    ) -> Self {
        self.key_to_log = Some(Arc::new(map));
        self
    }

    pub fn unknown_error(
        mut self,
        render: impl Fn(&dyn TextResolver, Option<Link<'_>>) -> String + Send + Sync + 'static,
    ) -> Self {
        self.unknown_error = Some(Arc::new(render));
        self
    }

    pub fn resource_names(mut self, names: impl ResourceNames + 'static) -> Self {
        self.resource_names = Some(Arc::new(names));
        self
    }

    /// Serializer for extension codes without a native schema
    pub fn code_serializer(
        mut self,
        serialize: impl Fn(&dyn ErrorCode) -> Option<Value> + Send + Sync + 'static,
    ) -> Self {
        self.serialize_code = Some(Arc::new(serialize));
        self
    }

    /// Decoder for discriminators the core does not know
    pub fn code_deserializer(
        mut self,
        deserialize: impl Fn(&Value) -> Option<Code> + Send + Sync + 'static,
    ) -> Self {
        self.deserialize_code = Some(Arc::new(deserialize));
        self
    }

    pub fn build(self) -> BuiltConfig {
        BuiltConfig { inner: self }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// [`Config`] assembled by [`ConfigBuilder`]
#[derive(Clone, Default)]
pub struct BuiltConfig {
    inner: ConfigBuilder,
}

impl Config for BuiltConfig {
    fn is_debug(&self) -> bool {
        self.inner.debug.unwrap_or_else(|| DefaultConfig.is_debug())
    }

    fn should_add_error_id(&self) -> bool {
        match &self.inner.add_error_id_flag {
            Some(flag) => flag(),
            None => DefaultConfig.should_add_error_id(),
        }
    }

    fn add_error_id(&self, id: &str, text: &str) -> String {
        match &self.inner.add_error_id {
            Some(decorate) => decorate(id, text),
            None => DefaultConfig.add_error_id(id, text),
        }
    }

    fn domain_to_id(&self, domain: &str) -> String {
        match &self.inner.domain_to_id {
            Some(map) => map(domain),
            None => DefaultConfig.domain_to_id(domain),
        }
    }

    fn null_log(&self) -> String {
        self.inner
            .null_log
            .clone()
            .unwrap_or_else(|| DefaultConfig.null_log())
    }

    fn message_to_log(&self, message: &str) -> String {
        match &self.inner.message_to_log {
            Some(map) => map(message),
            None => DefaultConfig.message_to_log(message),
        }
    }

    fn key_to_log(&self, key: ResourceId, args: &[Value]) -> String {
        match &self.inner.key_to_log {
            Some(map) => map(key, args),
            None => join_key_log(self.resource_name(key), args),
        }
    }

    fn unknown_error(&self, ctx: &dyn TextResolver, root_cause: Option<Link<'_>>) -> String {
        match &self.inner.unknown_error {
            Some(render) => render(ctx, root_cause),
            None => DefaultConfig.unknown_error(ctx, root_cause),
        }
    }

    fn resource_name(&self, key: ResourceId) -> String {
        self.inner
            .resource_names
            .as_ref()
            .and_then(|names| names.name(key))
            .unwrap_or_else(|| DefaultConfig.resource_name(key))
    }

    fn resource_id(&self, name: &str) -> Option<ResourceId> {
        self.inner
            .resource_names
            .as_ref()
            .and_then(|names| names.key(name))
    }

    fn serialize_code(&self, code: &dyn ErrorCode) -> Option<Value> {
        self.inner
            .serialize_code
            .as_ref()
            .and_then(|serialize| serialize(code))
    }

    fn deserialize_code(&self, value: &Value) -> Option<Code> {
        self.inner
            .deserialize_code
            .as_ref()
            .and_then(|deserialize| deserialize(value))
    }
}
