//! Concrete [`ErrorCode`] representations

use super::{Code, ErrorCode, Identifier, MessageProvider, TextResolver};
use crate::config::Config;
use crate::serialization::records;
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Produces a domain name on demand, e.g. from the current module state
pub type DomainSupplier = Arc<dyn Fn() -> String + Send + Sync>;

/// Where a code's identifier comes from
#[derive(Clone)]
pub enum IdSource {
    /// A fixed identifier
    Fixed(Identifier),
    /// A domain whose short id is derived through the active config on access
    Domain(String),
    /// A domain computed on every access
    Supplier(DomainSupplier),
}

impl IdSource {
    pub fn resolve(&self, config: &dyn Config) -> Identifier {
        match self {
            Self::Fixed(identifier) => identifier.clone(),
            Self::Domain(domain) => Identifier::derive(domain.as_str(), config),
            Self::Supplier(supplier) => Identifier::derive(supplier(), config),
        }
    }

    /// Identifiers that can be written out and read back unchanged
    pub fn is_serializable(&self) -> bool {
        !matches!(self, Self::Supplier(_))
    }
}

impl fmt::Debug for IdSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(identifier) => f.debug_tuple("Fixed").field(identifier).finish(),
            Self::Domain(domain) => f.debug_tuple("Domain").field(domain).finish(),
            Self::Supplier(_) => f.write_str("Supplier(..)"),
        }
    }
}

/// Code with identifier, log and message all computed at build time
#[derive(Debug, Clone)]
pub struct StaticErrorCode {
    identifier: Identifier,
    log: String,
    message: Option<String>,
    fallback: bool,
    provider: MessageProvider,
}

impl StaticErrorCode {
    /// Precompute everything; `provider` must not need a resolver
    pub fn new(
        identifier: Identifier,
        provider: MessageProvider,
        fallback: bool,
        config: &dyn Config,
    ) -> Self {
        debug_assert!(provider.is_static());
        Self {
            log: provider.log(config),
            message: provider.message(&()),
            identifier,
            fallback,
            provider,
        }
    }

    pub fn provider(&self) -> &MessageProvider {
        &self.provider
    }
}

impl ErrorCode for StaticErrorCode {
    fn id(&self, _config: &dyn Config) -> Identifier {
        self.identifier.clone()
    }

    fn log(&self, _config: &dyn Config) -> String {
        self.log.clone()
    }

    fn is_fallback(&self) -> bool {
        self.fallback
    }

    fn message(&self, _ctx: &dyn TextResolver) -> Option<String> {
        self.message.clone()
    }

    fn serialize(&self, config: &dyn Config) -> Option<Value> {
        Some(records::encode_native(
            &self.identifier,
            &self.provider,
            self.fallback,
            config,
        ))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Code that computes everything from its sources on every call
#[derive(Debug, Clone)]
pub struct ProviderErrorCode {
    id: IdSource,
    provider: MessageProvider,
    fallback: bool,
}

impl ProviderErrorCode {
    pub fn new(id: IdSource, provider: MessageProvider, fallback: bool) -> Self {
        Self {
            id,
            provider,
            fallback,
        }
    }

    pub fn id_source(&self) -> &IdSource {
        &self.id
    }

    pub fn provider(&self) -> &MessageProvider {
        &self.provider
    }
}

impl ErrorCode for ProviderErrorCode {
    fn id(&self, config: &dyn Config) -> Identifier {
        self.id.resolve(config)
    }

    fn log(&self, config: &dyn Config) -> String {
        self.provider.log(config)
    }

    fn is_fallback(&self) -> bool {
        self.fallback
    }

    fn message(&self, ctx: &dyn TextResolver) -> Option<String> {
        self.provider.message(ctx)
    }

    fn serialize(&self, config: &dyn Config) -> Option<Value> {
        if !self.id.is_serializable() {
            return None;
        }
        Some(records::encode_native(
            &self.id.resolve(config),
            &self.provider,
            self.fallback,
            config,
        ))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Memoizes id, log and fallback flag of another code on first access.
///
/// The message is still resolved on every call since it depends on the
/// resolver. The first config seen wins for the memoized values.
#[derive(Debug)]
pub struct CachedErrorCode {
    inner: Code,
    id: OnceCell<Identifier>,
    log: OnceCell<String>,
    fallback: OnceCell<bool>,
}

impl CachedErrorCode {
    pub fn new(inner: Code) -> Self {
        Self {
            inner,
            id: OnceCell::new(),
            log: OnceCell::new(),
            fallback: OnceCell::new(),
        }
    }

    pub fn inner(&self) -> &Code {
        &self.inner
    }
}

impl ErrorCode for CachedErrorCode {
    fn id(&self, config: &dyn Config) -> Identifier {
        self.id.get_or_init(|| self.inner.id(config)).clone()
    }

    fn log(&self, config: &dyn Config) -> String {
        self.log.get_or_init(|| self.inner.log(config)).clone()
    }

    fn is_fallback(&self) -> bool {
        *self.fallback.get_or_init(|| self.inner.is_fallback())
    }

    fn message(&self, ctx: &dyn TextResolver) -> Option<String> {
        self.inner.message(ctx)
    }

    fn serialize(&self, config: &dyn Config) -> Option<Value> {
        self.inner.serialize(config)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Marks another code as fallback
#[derive(Debug, Clone)]
pub struct FallbackErrorCode {
    inner: Code,
}

impl FallbackErrorCode {
    pub fn new(inner: Code) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &Code {
        &self.inner
    }
}

impl ErrorCode for FallbackErrorCode {
    fn id(&self, config: &dyn Config) -> Identifier {
        self.inner.id(config)
    }

    fn log(&self, config: &dyn Config) -> String {
        self.inner.log(config)
    }

    fn is_fallback(&self) -> bool {
        true
    }

    fn message(&self, ctx: &dyn TextResolver) -> Option<String> {
        self.inner.message(ctx)
    }

    fn serialize(&self, config: &dyn Config) -> Option<Value> {
        records::encode_fallback(&self.inner, config)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
