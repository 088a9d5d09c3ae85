//! Enums whose variants are error codes
//!
//! Implementing [`EnumErrorCode`] makes every variant an [`ErrorCode`] named
//! after the enum, the variant's ordinal and its name: `QuotaError::Storage`
//! at ordinal 1 becomes `QE1` / `QuotaError.Storage`. Such codes use the
//! native wire schema.
//!
//! ```
//! use errata::code::{EnumErrorCode, MessageProvider};
//! use errata::{DefaultConfig, Error, ErrorCode};
//!
//! #[derive(Debug, Clone, Copy)]
//! enum QuotaError {
//!     Requests,
//!     Storage,
//! }
//!
//! impl EnumErrorCode for QuotaError {
//!     fn ordinal(&self) -> u32 {
//!         *self as u32
//!     }
//!
//!     fn provider(&self) -> MessageProvider {
//!         match self {
//!             Self::Requests => "Too many requests".into(),
//!             Self::Storage => "Storage is full".into(),
//!         }
//!     }
//! }
//!
//! let err = Error::custom(QuotaError::Storage);
//! assert_eq!(err.id_with(&DefaultConfig), "QE1");
//! assert_eq!(QuotaError::Storage.id(&DefaultConfig).full(), "QuotaError.Storage");
//! ```

use super::identifier::simple_type_name;
use super::{ErrorCode, Identifier, MessageProvider, TextResolver};
use crate::config::Config;
use crate::serialization::records;
use serde_json::Value;
use std::any::Any;
use std::fmt;

/// A code family declared as an enum
pub trait EnumErrorCode: fmt::Debug + Send + Sync + 'static {
    /// Position of the variant; becomes the numeric part of the short id
    fn ordinal(&self) -> u32;

    /// Defaults to the `Debug` form, which is the variant name for unit variants
    fn variant_name(&self) -> String {
        format!("{:?}", self)
    }

    /// Defaults to the enum's type name
    fn domain(&self) -> &'static str {
        simple_type_name(std::any::type_name::<Self>())
    }

    fn provider(&self) -> MessageProvider {
        MessageProvider::Empty
    }

    fn fallback(&self) -> bool {
        false
    }

    /// The identifier this variant stands for
    fn identifier(&self, config: &dyn Config) -> Identifier {
        Identifier::indexed(self.domain(), self.ordinal(), &self.variant_name(), config)
    }
}

impl<T: EnumErrorCode> ErrorCode for T {
    fn id(&self, config: &dyn Config) -> Identifier {
        self.identifier(config)
    }

    fn log(&self, config: &dyn Config) -> String {
        self.provider().log(config)
    }

    fn is_fallback(&self) -> bool {
        self.fallback()
    }

    fn message(&self, ctx: &dyn TextResolver) -> Option<String> {
        self.provider().message(ctx)
    }

    fn serialize(&self, config: &dyn Config) -> Option<Value> {
        Some(records::encode_native(
            &self.identifier(config),
            &self.provider(),
            self.fallback(),
            config,
        ))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
