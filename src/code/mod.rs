//! Error codes: the domain-specific classification of a failure
//!
//! An [`ErrorCode`] is an [`Identifier`], a message strategy and a fallback
//! flag. Codes are shared as [`Code`] (`Arc<dyn ErrorCode>`) and are
//! immutable once built.
//!
//! Three representations exist for the same logical code, chosen by
//! [`ErrorCodeBuilder`]:
//!
//! - [`StaticErrorCode`] - everything precomputed at build time
//! - [`CachedErrorCode`] - id and log memoized on first access, message
//!   resolved on every call
//! - [`ProviderErrorCode`] - everything computed on every call
//!
//! They are observably equivalent; the choice only trades memory for speed.
//! Enums become code families through [`EnumErrorCode`].

pub mod builder;
pub mod enums;
pub mod identifier;
pub mod message;
pub mod variants;

pub use builder::{BuildError, ErrorCodeBuilder};
pub use enums::EnumErrorCode;
pub use identifier::Identifier;
pub use message::{MessageProvider, ResourceId, StringTable, TextResolver};
pub use variants::{
    CachedErrorCode, DomainSupplier, FallbackErrorCode, IdSource, ProviderErrorCode,
    StaticErrorCode,
};

use crate::config::Config;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Shared handle to an error code
pub type Code = Arc<dyn ErrorCode>;

/// Classification of a failure
pub trait ErrorCode: fmt::Debug + Send + Sync + 'static {
    fn id(&self, config: &dyn Config) -> Identifier;

    /// Stable diagnostic string; never needs a resolver
    fn log(&self, config: &dyn Config) -> String;

    /// A fallback code's message yields to a more specific one in the chain
    fn is_fallback(&self) -> bool {
        false
    }

    fn message(&self, ctx: &dyn TextResolver) -> Option<String>;

    /// Native JSON encoding, carrying a `"discriminator"` field.
    ///
    /// `None` means the code has no native schema and must go through
    /// [`Config::serialize_code`].
    fn serialize(&self, _config: &dyn Config) -> Option<Value> {
        None
    }

    /// Access to the concrete type, for custom serializers
    fn as_any(&self) -> &dyn Any;
}

/// Two codes are the same when their identifiers are equal
pub fn same_code(a: &dyn ErrorCode, b: &dyn ErrorCode, config: &dyn Config) -> bool {
    a.id(config) == b.id(config)
}

/// Wrappers available on every code
pub trait ErrorCodeExt {
    /// Memoize id, log and fallback flag on first access
    fn cached(self) -> Code;

    /// Force the fallback flag on
    fn as_fallback(self) -> Code;
}

impl ErrorCodeExt for Code {
    fn cached(self) -> Code {
        Arc::new(CachedErrorCode::new(self))
    }

    fn as_fallback(self) -> Code {
        Arc::new(FallbackErrorCode::new(self))
    }
}

impl<C: ErrorCode> ErrorCodeExt for C {
    fn cached(self) -> Code {
        let code: Code = Arc::new(self);
        code.cached()
    }

    fn as_fallback(self) -> Code {
        let code: Code = Arc::new(self);
        code.as_fallback()
    }
}

/// Anything the factory surface accepts in place of a built code
pub trait IntoErrorCode {
    fn into_code(self) -> Code;
}

impl IntoErrorCode for Code {
    fn into_code(self) -> Code {
        self
    }
}

impl<C: ErrorCode> IntoErrorCode for C {
    fn into_code(self) -> Code {
        Arc::new(self)
    }
}

impl IntoErrorCode for Identifier {
    fn into_code(self) -> Code {
        (self, MessageProvider::Empty).into_code()
    }
}

impl IntoErrorCode for (Identifier, MessageProvider) {
    fn into_code(self) -> Code {
        let (identifier, provider) = self;
        let code = ProviderErrorCode::new(IdSource::Fixed(identifier), provider, false);
        if code.provider().is_static() {
            Arc::new(code)
        } else {
            code.cached()
        }
    }
}

impl IntoErrorCode for (Identifier, &str) {
    fn into_code(self) -> Code {
        (self.0, MessageProvider::from(self.1)).into_code()
    }
}

impl IntoErrorCode for (Identifier, String) {
    fn into_code(self) -> Code {
        (self.0, MessageProvider::from(self.1)).into_code()
    }
}

impl IntoErrorCode for (Identifier, ResourceId) {
    fn into_code(self) -> Code {
        (self.0, MessageProvider::FromKey(self.1)).into_code()
    }
}

/// Code carried by the two sentinel errors
#[derive(Debug)]
pub struct SentinelCode {
    identifier: Identifier,
}

impl ErrorCode for SentinelCode {
    fn id(&self, _config: &dyn Config) -> Identifier {
        self.identifier.clone()
    }

    fn log(&self, _config: &dyn Config) -> String {
        self.identifier.full().to_string()
    }

    fn message(&self, _ctx: &dyn TextResolver) -> Option<String> {
        None
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) static NO_ERROR_CODE: Lazy<Code> = Lazy::new(|| {
    Arc::new(SentinelCode {
        identifier: Identifier::new("NE", "NoError"),
    })
});

pub(crate) static UNKNOWN_ERROR_CODE: Lazy<Code> = Lazy::new(|| {
    Arc::new(SentinelCode {
        identifier: Identifier::new("UE", "UnknownError"),
    })
});
