//! Message strategies and the text-resolution seam
//!
//! A [`MessageProvider`] knows how to produce two strings for an error code:
//! a user-facing message, resolved lazily through a [`TextResolver`], and a
//! stable log string that never needs one.

use crate::config::Config;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Opaque numeric key of a localized message in the host's resource bundle.
///
/// Numeric keys are not stable across builds; they are serialized by name
/// through [`Config::resource_name`] and re-resolved on the way back in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(pub i32);

impl ResourceId {
    /// Key used when a serialized resource name cannot be resolved
    pub const UNRESOLVED: ResourceId = ResourceId(0);

    pub fn is_resolved(self) -> bool {
        self != Self::UNRESOLVED
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resolves message keys to (possibly localized) text.
///
/// Returning `None` is not a failure: callers treat it as "no message" and
/// fall through to their fallback text.
pub trait TextResolver {
    fn text(&self, key: ResourceId) -> Option<String>;

    /// Resolve `key` and substitute positional arguments.
    ///
    /// Placeholders are `{0}`, `{1}`, ... (zero-based) and `%1$s`, `%2$d`, ...
    /// (one-based). Placeholders without a matching argument are kept as is.
    fn formatted_text(&self, key: ResourceId, args: &[Value]) -> Option<String> {
        self.text(key).map(|template| format_positional(&template, args))
    }
}

/// No resolution context: every key resolves to nothing
impl TextResolver for () {
    fn text(&self, _key: ResourceId) -> Option<String> {
        None
    }
}

/// Map-backed resolver for hosts without a resource system
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    entries: HashMap<ResourceId, String>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: ResourceId, text: impl Into<String>) -> Self {
        self.insert(key, text);
        self
    }

    pub fn insert(&mut self, key: ResourceId, text: impl Into<String>) {
        self.entries.insert(key, text.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TextResolver for StringTable {
    fn text(&self, key: ResourceId) -> Option<String> {
        self.entries.get(&key).cloned()
    }
}

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(\d+)\}|%(\d+)\$[sd]").expect("Invalid regex pattern"));

/// Substitute `{N}` and `%N$s` placeholders in `template` with `args`
pub fn format_positional(template: &str, args: &[Value]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let index = if let Some(zero_based) = caps.get(1) {
                zero_based.as_str().parse::<usize>().ok()
            } else {
                caps.get(2)
                    .and_then(|one_based| one_based.as_str().parse::<usize>().ok())
                    .and_then(|n| n.checked_sub(1))
            };
            match index.and_then(|i| args.get(i)) {
                Some(arg) => render_arg(arg),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Render a format argument the way a user would expect to read it
pub fn render_arg(arg: &Value) -> String {
    match arg {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Strategy producing the user-facing message and the log string of a code
#[derive(Debug, Clone, PartialEq)]
pub enum MessageProvider {
    /// No message at all
    Empty,
    /// A literal message
    Direct(String),
    /// A message looked up by resource key
    FromKey(ResourceId),
    /// A message looked up by resource key and formatted with positional args
    FromFormattedKey(ResourceId, Vec<Value>),
    /// Overrides the log string, message unchanged
    WithLog(String, Box<MessageProvider>),
    /// Suppresses the log string (privacy-sensitive messages), message unchanged
    WithoutLog(Box<MessageProvider>),
}

impl MessageProvider {
    /// Stable, context-free diagnostic string
    pub fn log(&self, config: &dyn Config) -> String {
        match self {
            Self::Empty | Self::WithoutLog(_) => config.null_log(),
            Self::Direct(text) if text.trim().is_empty() => config.null_log(),
            Self::Direct(text) => config.message_to_log(text),
            Self::FromKey(key) => config.key_to_log(*key, &[]),
            Self::FromFormattedKey(key, args) => config.key_to_log(*key, args),
            Self::WithLog(log, _) => log.clone(),
        }
    }

    /// User-facing message, `None` when the resolver has nothing for it
    pub fn message(&self, ctx: &dyn TextResolver) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Direct(text) => Some(text.clone()),
            Self::FromKey(key) => ctx.text(*key),
            Self::FromFormattedKey(key, args) => ctx.formatted_text(*key, args),
            Self::WithLog(_, inner) | Self::WithoutLog(inner) => inner.message(ctx),
        }
    }

    /// True when the message can be produced without a resolver
    pub fn is_static(&self) -> bool {
        match self {
            Self::Empty | Self::Direct(_) => true,
            Self::FromKey(_) | Self::FromFormattedKey(..) => false,
            Self::WithLog(_, inner) | Self::WithoutLog(inner) => inner.is_static(),
        }
    }

    pub fn with_log(self, log: impl Into<String>) -> Self {
        Self::WithLog(log.into(), Box::new(self))
    }

    pub fn without_log(self) -> Self {
        Self::WithoutLog(Box::new(self))
    }
}

impl Default for MessageProvider {
    fn default() -> Self {
        Self::Empty
    }
}

impl From<&str> for MessageProvider {
    fn from(text: &str) -> Self {
        Self::Direct(text.to_string())
    }
}

impl From<String> for MessageProvider {
    fn from(text: String) -> Self {
        Self::Direct(text)
    }
}

impl From<Option<String>> for MessageProvider {
    fn from(text: Option<String>) -> Self {
        text.map_or(Self::Empty, Self::Direct)
    }
}

impl From<ResourceId> for MessageProvider {
    fn from(key: ResourceId) -> Self {
        Self::FromKey(key)
    }
}
