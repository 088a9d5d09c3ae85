//! Rendering and serialization policy
//!
//! Every member of [`Config`] has a documented default, so a partially
//! customized policy never produces undefined behavior. [`DefaultConfig`]
//! overrides nothing and is the initial process-wide instance.
//!
//! # Lifecycle
//!
//! Configure once during startup, before errors are built or rendered:
//!
//! ```
//! use errata::config::{self, Config, ConfigBuilder};
//!
//! config::configure(ConfigBuilder::new().debug(true).build());
//! assert!(config::current().is_debug());
//! # config::reset();
//! ```
//!
//! Replacing the instance is a single pointer swap (last writer wins, no
//! merge). Renders already in flight keep the instance they started with.
//! Core APIs also accept an explicit `&dyn Config`, which is what tests and
//! multi-tenant hosts should use instead of the global.

pub mod builder;

pub use builder::{BuiltConfig, ConfigBuilder, NameTable, ResourceNames};

use crate::code::identifier::uppercase_letters;
use crate::code::message::{render_arg, ResourceId, TextResolver};
use crate::code::Code;
use crate::code::ErrorCode;
use crate::error::Link;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

/// Log string used when a code has no message to log
pub const NULL_LOG: &str = "<none>";

/// Fallback user-facing text when nothing better is available
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Policy object controlling how errors are rendered, logged and serialized
pub trait Config: Send + Sync {
    /// Debug builds show the original cause's message when a code has none
    fn is_debug(&self) -> bool {
        false
    }

    /// Whether rendered text is annotated with the error id.
    ///
    /// May be dynamic, e.g. backed by a persisted developer setting.
    fn should_add_error_id(&self) -> bool {
        false
    }

    fn add_error_id(&self, id: &str, text: &str) -> String {
        format!("{}:\n{}", id, text)
    }

    /// Map a domain (type name, dotted name) to a short id
    fn domain_to_id(&self, domain: &str) -> String {
        uppercase_letters(domain)
    }

    fn null_log(&self) -> String {
        NULL_LOG.to_string()
    }

    fn message_to_log(&self, message: &str) -> String {
        message.to_string()
    }

    /// Log string of a resource-backed message; must not need a resolver
    fn key_to_log(&self, key: ResourceId, args: &[Value]) -> String {
        join_key_log(self.resource_name(key), args)
    }

    fn unknown_error(&self, _ctx: &dyn TextResolver, _root_cause: Option<Link<'_>>) -> String {
        UNKNOWN_ERROR.to_string()
    }

    /// Stable name of a resource key
    fn resource_name(&self, key: ResourceId) -> String {
        format!("unknown:res/{}", key.0)
    }

    /// Resource key for a stable name, `None` when the name is unknown
    fn resource_id(&self, _name: &str) -> Option<ResourceId> {
        None
    }

    /// Serializer for codes the core has no native schema for
    fn serialize_code(&self, _code: &dyn ErrorCode) -> Option<Value> {
        None
    }

    /// Decoder for discriminators the core does not know
    fn deserialize_code(&self, _value: &Value) -> Option<Code> {
        None
    }
}

/// The documented defaults, unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConfig;

impl Config for DefaultConfig {}

pub(crate) fn join_key_log(name: String, args: &[Value]) -> String {
    if args.is_empty() {
        name
    } else {
        let rendered: Vec<String> = args.iter().map(render_arg).collect();
        format!("{}({})", name, rendered.join(", "))
    }
}

/// Resolve a serialized resource name back to a key.
///
/// Tries the configured mapping, then the name as a number, then the segment
/// after the last `/` as a number. Never fails: unresolvable names map to
/// [`ResourceId::UNRESOLVED`].
pub fn resolve_resource(config: &dyn Config, name: &str) -> ResourceId {
    if let Some(id) = config.resource_id(name) {
        return id;
    }
    if let Ok(raw) = name.trim().parse::<i32>() {
        return ResourceId(raw);
    }
    if let Some(raw) = name
        .rsplit('/')
        .next()
        .and_then(|tail| tail.trim().parse::<i32>().ok())
    {
        return ResourceId(raw);
    }
    warn!(resource = name, "unable to resolve resource name, using unresolved key");
    ResourceId::UNRESOLVED
}

static CURRENT: Lazy<RwLock<Arc<dyn Config>>> =
    Lazy::new(|| RwLock::new(Arc::new(DefaultConfig) as Arc<dyn Config>));

/// Replace the process-wide configuration
pub fn configure(config: impl Config + 'static) {
    configure_shared(Arc::new(config));
}

/// Replace the process-wide configuration with a shared instance
pub fn configure_shared(config: Arc<dyn Config>) {
    let is_debug = config.is_debug();
    *CURRENT.write().unwrap_or_else(PoisonError::into_inner) = config;
    info!(is_debug, "error configuration replaced");
}

/// The active process-wide configuration
pub fn current() -> Arc<dyn Config> {
    CURRENT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Restore [`DefaultConfig`] as the process-wide configuration
pub fn reset() {
    configure(DefaultConfig);
}
