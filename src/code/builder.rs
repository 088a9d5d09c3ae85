//! Fluent construction of error codes

use super::variants::{DomainSupplier, IdSource};
use super::{
    Code, ErrorCodeExt, Identifier, MessageProvider, ProviderErrorCode, ResourceId,
    StaticErrorCode,
};
use crate::code::identifier::simple_type_name;
use crate::config::{self, Config};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("an error code needs an identifier")]
    MissingIdentifier,
}

#[derive(Clone)]
enum PendingId {
    Fixed(Identifier),
    Derived(String),
    Indexed {
        domain: String,
        index: u32,
        description: String,
    },
    Supplier(DomainSupplier),
}

impl PendingId {
    fn into_source(self, config: &dyn Config) -> IdSource {
        match self {
            Self::Fixed(identifier) => IdSource::Fixed(identifier),
            Self::Derived(full) => IdSource::Fixed(Identifier::derive(full, config)),
            Self::Indexed {
                domain,
                index,
                description,
            } => IdSource::Fixed(Identifier::indexed(&domain, index, &description, config)),
            Self::Supplier(supplier) => IdSource::Supplier(supplier),
        }
    }
}

/// Accumulates identifier, message, log policy and fallback flag.
///
/// `no_log` always wins over an explicit log, regardless of call order.
///
/// ```
/// use errata::code::{ErrorCode, ErrorCodeBuilder};
/// use errata::config::DefaultConfig;
///
/// let code = ErrorCodeBuilder::new()
///     .indexed("NetworkError", 3, "Timeout")
///     .message("The server did not answer in time")
///     .build_with(&DefaultConfig)
///     .unwrap();
/// assert_eq!(code.id(&DefaultConfig).short(), "NE3");
/// ```
#[derive(Clone, Default)]
pub struct ErrorCodeBuilder {
    id: Option<PendingId>,
    fallback: bool,
    log: Option<String>,
    no_log: bool,
    message: MessageProvider,
}

impl ErrorCodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, identifier: Identifier) -> Self {
        self.id = Some(PendingId::Fixed(identifier));
        self
    }

    pub fn id_pair(self, short: impl Into<String>, full: impl Into<String>) -> Self {
        self.id(Identifier::new(short, full))
    }

    /// Full name only; the short form is derived through `domain_to_id`
    pub fn id_full(mut self, full: impl Into<String>) -> Self {
        self.id = Some(PendingId::Derived(full.into()));
        self
    }

    /// Name the code after the type `T`
    pub fn id_of<T: ?Sized>(self) -> Self {
        self.id_full(simple_type_name(std::any::type_name::<T>()))
    }

    pub fn indexed(
        mut self,
        domain: impl Into<String>,
        index: u32,
        description: impl Into<String>,
    ) -> Self {
        self.id = Some(PendingId::Indexed {
            domain: domain.into(),
            index,
            description: description.into(),
        });
        self
    }

    /// Indexed identifier using the type `T` as its domain
    pub fn indexed_of<T: ?Sized>(self, index: u32, description: impl Into<String>) -> Self {
        self.indexed(simple_type_name(std::any::type_name::<T>()), index, description)
    }

    /// Domain computed on every access. Codes built this way are not
    /// natively serializable.
    pub fn id_supplier(mut self, supplier: impl Fn() -> String + Send + Sync + 'static) -> Self {
        self.id = Some(PendingId::Supplier(Arc::new(supplier)));
        self
    }

    pub fn fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    /// Explicit log string; blank values are ignored
    pub fn log(mut self, log: impl Into<String>) -> Self {
        self.log = Some(log.into());
        self
    }

    pub fn no_log(mut self) -> Self {
        self.no_log = true;
        self
    }

    pub fn message(mut self, message: impl Into<MessageProvider>) -> Self {
        self.message = message.into();
        self
    }

    pub fn message_key(self, key: ResourceId) -> Self {
        self.message(MessageProvider::FromKey(key))
    }

    pub fn message_formatted<A>(self, key: ResourceId, args: A) -> Self
    where
        A: IntoIterator,
        A::Item: Into<Value>,
    {
        let args = args.into_iter().map(Into::into).collect();
        self.message(MessageProvider::FromFormattedKey(key, args))
    }

    /// Build against the process-wide configuration
    pub fn build(self) -> Result<Code, BuildError> {
        let config = config::current();
        self.build_with(config.as_ref())
    }

    pub fn build_with(self, config: &dyn Config) -> Result<Code, BuildError> {
        let id = self.id.ok_or(BuildError::MissingIdentifier)?;
        let provider = if self.no_log {
            self.message.without_log()
        } else {
            match self.log {
                Some(log) if !log.trim().is_empty() => self.message.with_log(log),
                _ => self.message,
            }
        };
        Ok(assemble(id.into_source(config), provider, self.fallback, config))
    }
}

/// Pick the cheapest representation that preserves observable behavior
pub(crate) fn assemble(
    id: IdSource,
    provider: MessageProvider,
    fallback: bool,
    config: &dyn Config,
) -> Code {
    match id {
        IdSource::Fixed(identifier) if provider.is_static() => {
            trace!(id = %identifier, "building static error code");
            Arc::new(StaticErrorCode::new(identifier, provider, fallback, config))
        }
        IdSource::Fixed(identifier) => {
            trace!(id = %identifier, "building cached error code");
            ProviderErrorCode::new(IdSource::Fixed(identifier), provider, fallback).cached()
        }
        dynamic => Arc::new(ProviderErrorCode::new(dynamic, provider, fallback)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{CachedErrorCode, ErrorCode, StringTable};
    use crate::config::DefaultConfig;
    use serde_json::json;

    struct PaymentError;

    #[test]
    fn test_missing_identifier_fails() {
        let result = ErrorCodeBuilder::new().message("orphan").build_with(&DefaultConfig);
        assert_eq!(result.unwrap_err(), BuildError::MissingIdentifier);
    }

    #[test]
    fn test_no_log_wins_regardless_of_order() {
        let before = ErrorCodeBuilder::new()
            .id_pair("P", "Payment")
            .message("Card declined")
            .no_log()
            .log("card-declined")
            .build_with(&DefaultConfig)
            .unwrap();
        let after = ErrorCodeBuilder::new()
            .id_pair("P", "Payment")
            .message("Card declined")
            .log("card-declined")
            .no_log()
            .build_with(&DefaultConfig)
            .unwrap();
        assert_eq!(before.log(&DefaultConfig), DefaultConfig.null_log());
        assert_eq!(after.log(&DefaultConfig), DefaultConfig.null_log());
        assert_eq!(before.message(&()), Some("Card declined".to_string()));
    }

    #[test]
    fn test_explicit_log_overrides_message_log() {
        let code = ErrorCodeBuilder::new()
            .id_pair("P", "Payment")
            .message("Card declined")
            .log("payment.declined")
            .build_with(&DefaultConfig)
            .unwrap();
        assert_eq!(code.log(&DefaultConfig), "payment.declined");
    }

    #[test]
    fn test_blank_log_is_ignored() {
        let code = ErrorCodeBuilder::new()
            .id_pair("P", "Payment")
            .message("Card declined")
            .log("   ")
            .build_with(&DefaultConfig)
            .unwrap();
        assert_eq!(code.log(&DefaultConfig), "Card declined");
    }

    #[test]
    fn test_type_named_identifiers() {
        let code = ErrorCodeBuilder::new()
            .indexed_of::<PaymentError>(2, "Declined")
            .build_with(&DefaultConfig)
            .unwrap();
        assert_eq!(code.id(&DefaultConfig), Identifier::new("PE2", "PaymentError.Declined"));

        let code = ErrorCodeBuilder::new()
            .id_of::<PaymentError>()
            .build_with(&DefaultConfig)
            .unwrap();
        assert_eq!(code.id(&DefaultConfig), Identifier::new("PE", "PaymentError"));
    }

    #[test]
    fn test_representation_choice() {
        let fixed_static = ErrorCodeBuilder::new()
            .id_pair("A", "Alpha")
            .message("text")
            .build_with(&DefaultConfig)
            .unwrap();
        assert!(fixed_static.as_any().is::<StaticErrorCode>());

        let fixed_key = ErrorCodeBuilder::new()
            .id_pair("A", "Alpha")
            .message_key(ResourceId(1))
            .build_with(&DefaultConfig)
            .unwrap();
        assert!(fixed_key.as_any().is::<CachedErrorCode>());

        let dynamic = ErrorCodeBuilder::new()
            .id_supplier(|| "Alpha".to_string())
            .message("text")
            .build_with(&DefaultConfig)
            .unwrap();
        assert!(dynamic.as_any().is::<ProviderErrorCode>());
    }

    #[test]
    fn test_representations_are_observably_equivalent() {
        let table = StringTable::new().with(ResourceId(8), "Used {0} of {1}");
        let provider = MessageProvider::FromFormattedKey(ResourceId(8), vec![json!(3), json!(5)]);
        let identifier = Identifier::new("Q8", "Quota.Exceeded");

        let dynamic: Code = Arc::new(ProviderErrorCode::new(
            IdSource::Fixed(identifier.clone()),
            provider.clone(),
            true,
        ));
        let cached = Arc::clone(&dynamic).cached();
        let built = ErrorCodeBuilder::new()
            .id(identifier)
            .message(provider)
            .fallback(true)
            .build_with(&DefaultConfig)
            .unwrap();

        for code in [&dynamic, &cached, &built] {
            assert_eq!(code.id(&DefaultConfig).short(), "Q8");
            assert_eq!(code.log(&DefaultConfig), "unknown:res/8(3, 5)");
            assert_eq!(code.message(&table), Some("Used 3 of 5".to_string()));
            assert!(code.is_fallback());
        }
    }
}
