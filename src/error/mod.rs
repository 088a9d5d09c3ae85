//! The error chain
//!
//! An [`Error`] is a classified failure: a code, optionally linked to the
//! error that caused it. Chains are immutable, shareable across threads and
//! finite (each link strictly contains its cause).
//!
//! Rendering walks the chain to pick the most specific user-facing message:
//! an outer code's message yields to its cause's unless the cause is a
//! fallback. Identifiers concatenate down the chain (`"NE3-IO"`).

pub mod cause;

pub use cause::{Cause, Chain, Foreign, Link, ReplicaError};

use crate::code::message::{MessageProvider, TextResolver};
use crate::code::variants::IdSource;
use crate::code::{
    BuildError, Code, ErrorCode, ErrorCodeBuilder, IntoErrorCode, ProviderErrorCode,
    NO_ERROR_CODE, UNKNOWN_ERROR_CODE,
};
use crate::config::{self, Config};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// A classified failure, possibly caused by another one
#[derive(Debug, Clone)]
pub enum Error {
    /// A leaf error carrying only its own code
    Custom { code: Code },
    /// An error caused by another error or a foreign one
    Child { code: Code, cause: Cause },
    /// A foreign error that reached a boundary without being classified
    Unexpected { code: Code, cause: Foreign },
    /// A foreign error deliberately lifted into the chain
    Materialized { code: Code, cause: Foreign },
    /// Absence of error; renders as empty text
    NoError,
    /// Placeholder for a failure nothing is known about
    UnknownError,
}

impl Error {
    /// Build a leaf error
    pub fn custom(code: impl IntoErrorCode) -> Self {
        Self::Custom {
            code: code.into_code(),
        }
    }

    /// Lift any error into a chain, unchanged when it already is one
    pub fn cast<E: StdError + Send + Sync + 'static>(error: E) -> Self {
        match classify(error) {
            Ok(error) => error,
            Err(foreign) => Self::unexpected(foreign),
        }
    }

    pub fn cast_boxed(error: Box<dyn StdError + Send + Sync>) -> Self {
        match error.downcast::<Error>() {
            Ok(error) => *error,
            Err(other) => Self::unexpected(Foreign::from_boxed(other)),
        }
    }

    /// Like [`Error::cast`], but marks the foreign error as deliberately kept
    pub fn materialize<E: StdError + Send + Sync + 'static>(error: E) -> Self {
        match classify(error) {
            Ok(error) => error,
            Err(foreign) => Self::materialized(foreign),
        }
    }

    pub fn materialize_boxed(error: Box<dyn StdError + Send + Sync>) -> Self {
        match error.downcast::<Error>() {
            Ok(error) => *error,
            Err(other) => Self::materialized(Foreign::from_boxed(other)),
        }
    }

    /// Put `code` in front of `cause`. The result is always a [`Error::Child`].
    pub fn wrap<E: StdError + Send + Sync + 'static>(cause: E, code: impl IntoErrorCode) -> Self {
        let cause = match classify(cause) {
            Ok(error) => Cause::Error(Arc::new(error)),
            Err(foreign) => Cause::Foreign(foreign),
        };
        Self::child(code, cause)
    }

    /// Put a code built from `builder` in front of `cause`.
    ///
    /// The code is built under the process-wide configuration.
    pub fn wrap_with<E: StdError + Send + Sync + 'static>(
        cause: E,
        builder: ErrorCodeBuilder,
    ) -> Result<Self, BuildError> {
        Ok(Self::wrap(cause, builder.build()?))
    }

    /// Put `code` in front of an existing chain
    pub fn wrap_error(cause: Error, code: impl IntoErrorCode) -> Self {
        Self::child(code, cause)
    }

    pub fn wrap_boxed(cause: Box<dyn StdError + Send + Sync>, code: impl IntoErrorCode) -> Self {
        let cause = match cause.downcast::<Error>() {
            Ok(error) => Cause::Error(Arc::from(error)),
            Err(other) => Cause::Foreign(Foreign::from_boxed(other)),
        };
        Self::child(code, cause)
    }

    pub fn child(code: impl IntoErrorCode, cause: impl Into<Cause>) -> Self {
        Self::Child {
            code: code.into_code(),
            cause: cause.into(),
        }
    }

    pub(crate) fn unexpected(foreign: Foreign) -> Self {
        Self::Unexpected {
            code: foreign_code(&foreign),
            cause: foreign,
        }
    }

    pub(crate) fn materialized(foreign: Foreign) -> Self {
        Self::Materialized {
            code: foreign_code(&foreign),
            cause: foreign,
        }
    }

    pub fn code(&self) -> &Code {
        match self {
            Self::Custom { code }
            | Self::Child { code, .. }
            | Self::Unexpected { code, .. }
            | Self::Materialized { code, .. } => code,
            Self::NoError => &*NO_ERROR_CODE,
            Self::UnknownError => &*UNKNOWN_ERROR_CODE,
        }
    }

    /// The next link, if any
    pub fn cause(&self) -> Option<Link<'_>> {
        match self {
            Self::Child { cause, .. } => Some(cause.link()),
            Self::Unexpected { cause, .. } | Self::Materialized { cause, .. } => {
                Some(Link::Foreign(cause))
            }
            _ => None,
        }
    }

    /// Variant name, as shown in stack dumps
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Custom { .. } => "Custom",
            Self::Child { .. } => "Child",
            Self::Unexpected { .. } => "Unexpected",
            Self::Materialized { .. } => "Materialized",
            Self::NoError => "NoError",
            Self::UnknownError => "UnknownError",
        }
    }

    pub fn is_no_error(&self) -> bool {
        matches!(self, Self::NoError)
    }

    /// `None` for [`Error::NoError`], the error otherwise
    pub fn into_option(self) -> Option<Self> {
        match self {
            Self::NoError => None,
            other => Some(other),
        }
    }

    /// Every link, this one first
    pub fn chain(&self) -> Chain<'_> {
        Chain::new(self)
    }

    /// Deepest link of the chain below this one
    pub fn root_cause(&self) -> Option<Link<'_>> {
        self.chain().skip(1).last()
    }

    /// Whether any link, including this one, matches
    pub fn has_cause(&self, predicate: impl Fn(Link<'_>) -> bool) -> bool {
        self.chain().any(predicate)
    }

    /// Whether any error link, including this one, carries a matching code
    pub fn has_code(&self, predicate: impl Fn(&dyn ErrorCode) -> bool) -> bool {
        self.chain().any(|link| match link {
            Link::Error(error) => predicate(error.code().as_ref()),
            Link::Foreign(_) => false,
        })
    }

    /// Message of the deepest foreign error, for diagnostics
    pub fn original(&self) -> Option<String> {
        match self.cause()? {
            Link::Error(error) => error.original(),
            Link::Foreign(foreign) => Some(foreign.message()),
        }
    }

    pub fn id_with(&self, config: &dyn Config) -> String {
        match self {
            Self::Child { code, cause } => {
                format!("{}-{}", code.id(config).short(), cause.id(config))
            }
            other => other.code().id(config).short().to_string(),
        }
    }

    pub fn log_with(&self, config: &dyn Config) -> String {
        self.code().log(config)
    }

    /// Resolved user-facing message, without any fallback text
    pub fn message_with(&self, ctx: &dyn TextResolver) -> Option<String> {
        self.resolve(ctx).map(|(message, _)| message)
    }

    /// Non-blank message chosen for this link and whether it came from a
    /// fallback code
    fn resolve(&self, ctx: &dyn TextResolver) -> Option<(String, bool)> {
        match self {
            Self::NoError => None,
            Self::Child { code, cause } => {
                let own = own_message(code.as_ref(), ctx);
                let inner = cause.as_error().and_then(|error| error.resolve(ctx));
                match (own, inner) {
                    (Some(_), Some(inner)) if !inner.1 => Some(inner),
                    (Some(own), _) => Some(own),
                    (None, inner) => inner,
                }
            }
            other => own_message(other.code().as_ref(), ctx),
        }
    }

    /// User-facing text: the resolved message, else the original diagnostic
    /// in debug mode, else the configured unknown-error text; annotated with
    /// the id when the config asks for it. Always empty for
    /// [`Error::NoError`].
    pub fn text_with(&self, ctx: &dyn TextResolver, config: &dyn Config) -> String {
        if self.is_no_error() {
            return String::new();
        }
        let mut text = self.message_with(ctx);
        if text.is_none() && config.is_debug() {
            text = self.original().filter(|original| !original.trim().is_empty());
        }
        let text = text.unwrap_or_else(|| config.unknown_error(ctx, self.root_cause()));
        if config.should_add_error_id() {
            config.add_error_id(&self.id_with(config), &text)
        } else {
            text
        }
    }

    /// One line per link: kind, identifier and log
    pub fn stack_with(&self, config: &dyn Config) -> String {
        self.chain()
            .enumerate()
            .map(|(depth, link)| {
                let line = match link {
                    Link::Error(error) => format!(
                        "{} {}: {}",
                        error.kind(),
                        error.code().id(config),
                        error.log_with(config)
                    ),
                    Link::Foreign(foreign) => format!(
                        "{} [{}]: {}",
                        foreign.class_name(),
                        foreign.type_name(),
                        foreign.message()
                    ),
                };
                if depth == 0 {
                    line
                } else {
                    format!("caused by: {}", line)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn text(&self, ctx: &dyn TextResolver) -> String {
        self.text_with(ctx, config::current().as_ref())
    }

    pub fn id(&self) -> String {
        self.id_with(config::current().as_ref())
    }

    pub fn log(&self) -> String {
        self.log_with(config::current().as_ref())
    }

    pub fn stack(&self) -> String {
        self.stack_with(config::current().as_ref())
    }
}

fn own_message(code: &dyn ErrorCode, ctx: &dyn TextResolver) -> Option<(String, bool)> {
    code.message(ctx)
        .filter(|message| !message.trim().is_empty())
        .map(|message| (message, code.is_fallback()))
}

/// `Ok` when `error` already is an [`Error`]
fn classify<E: StdError + Send + Sync + 'static>(error: E) -> Result<Error, Foreign> {
    let type_name = std::any::type_name::<E>();
    let boxed: Box<dyn StdError + Send + Sync> = Box::new(error);
    boxed
        .downcast::<Error>()
        .map(|error| *error)
        .map_err(|other| Foreign::named(other, type_name))
}

/// Code synthesized for a foreign error: named after its type, logging its
/// message, with no user-facing message of its own
fn foreign_code(foreign: &Foreign) -> Code {
    let message = foreign.message();
    let provider = if message.trim().is_empty() {
        MessageProvider::Empty
    } else {
        MessageProvider::Empty.with_log(message)
    };
    Arc::new(ProviderErrorCode::new(
        IdSource::Domain(foreign.class_name().to_string()),
        provider,
        false,
    ))
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoError | Self::UnknownError => f.write_str(self.kind()),
            _ => {
                let original = self.original();
                write!(f, "Error({}; {})", self.id(), original.as_deref().unwrap_or("-"))
            }
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause().map(Link::as_std)
    }
}

#[cfg(test)]
mod tests;
