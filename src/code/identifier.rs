//! Compact/verbose naming pair for error codes

use crate::config::Config;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Immutable `{short, full}` name of an error code.
///
/// The short form is what ends up in chained error ids (`"NE3-IO"`), the full
/// form is the dotted, human-readable name (`"NetworkError.Timeout"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    short: String,
    full: String,
}

impl Identifier {
    /// Create an identifier from an explicit pair
    pub fn new(short: impl Into<String>, full: impl Into<String>) -> Self {
        Self {
            short: short.into(),
            full: full.into(),
        }
    }

    /// Create an identifier whose short form is derived from the full name
    pub fn derive(full: impl Into<String>, config: &dyn Config) -> Self {
        let full = full.into();
        Self {
            short: config.domain_to_id(&full),
            full,
        }
    }

    /// Create an identifier from a domain, a numeric index and a description.
    ///
    /// `short = domain_to_id(domain) + index`, `full = "{domain}.{description}"`.
    pub fn indexed(domain: &str, index: u32, description: &str, config: &dyn Config) -> Self {
        Self {
            short: format!("{}{}", config.domain_to_id(domain), index),
            full: format!("{}.{}", domain, description),
        }
    }

    /// Create an identifier named after the type `T`
    pub fn of<T: ?Sized>(config: &dyn Config) -> Self {
        Self::derive(simple_type_name(std::any::type_name::<T>()), config)
    }

    /// Create an indexed identifier using the type `T` as its domain
    pub fn indexed_of<T: ?Sized>(index: u32, description: &str, config: &dyn Config) -> Self {
        Self::indexed(
            simple_type_name(std::any::type_name::<T>()),
            index,
            description,
            config,
        )
    }

    pub fn short(&self) -> &str {
        &self.short
    }

    pub fn full(&self) -> &str {
        &self.full
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.short, self.full)
    }
}

/// Last path segment of a type name, without generic arguments.
///
/// `"std::io::error::Error"` becomes `"Error"`, `"alloc::vec::Vec<u8>"` becomes `"Vec"`.
pub fn simple_type_name(type_name: &str) -> &str {
    let without_generics = type_name.split('<').next().unwrap_or(type_name);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
}

/// Default domain→id mapping: keep only the uppercase letters
pub fn uppercase_letters(domain: &str) -> String {
    domain.chars().filter(|c| c.is_uppercase()).collect()
}
