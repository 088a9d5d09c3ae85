//! Links of an error chain
//!
//! A chain is a sequence of [`Error`] links that may end in a [`Foreign`]
//! error: one produced by code outside this crate (I/O, parsing, ...).

use super::Error;
use crate::code::identifier::simple_type_name;
use crate::config::Config;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Type name recorded for foreign errors only known as a boxed trait object
pub(crate) const BOXED_TYPE_NAME: &str = "dyn std::error::Error";

/// A foreign error together with the type names it was captured under
#[derive(Clone)]
pub struct Foreign {
    class_name: String,
    type_name: String,
    inner: Arc<dyn StdError + Send + Sync>,
}

impl Foreign {
    pub fn new<E: StdError + Send + Sync + 'static>(error: E) -> Self {
        Self::named(Box::new(error), std::any::type_name::<E>())
    }

    /// Capture a boxed error whose concrete type is no longer known
    pub fn from_boxed(error: Box<dyn StdError + Send + Sync>) -> Self {
        Self {
            class_name: "Error".to_string(),
            type_name: BOXED_TYPE_NAME.to_string(),
            inner: Arc::from(error),
        }
    }

    pub(crate) fn named(error: Box<dyn StdError + Send + Sync>, type_name: &str) -> Self {
        Self {
            class_name: simple_type_name(type_name).to_string(),
            type_name: type_name.to_string(),
            inner: Arc::from(error),
        }
    }

    /// Stand-in for a foreign error read back from its serialized form
    pub(crate) fn replica(
        class_name: String,
        type_name: String,
        message: Option<String>,
        cause: Option<Cause>,
    ) -> Self {
        let inner = ReplicaError {
            class_name: class_name.clone(),
            type_name: type_name.clone(),
            message,
            cause,
        };
        Self {
            class_name,
            type_name,
            inner: Arc::new(inner),
        }
    }

    /// Simple type name, e.g. `"Error"` for `std::io::Error`
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Fully qualified type name
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn message(&self) -> String {
        self.inner.to_string()
    }

    /// Chain id of a foreign link: the short id of its class name
    pub fn id(&self, config: &dyn Config) -> String {
        config.domain_to_id(&self.class_name)
    }

    pub fn inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.inner.as_ref()
    }

    pub fn downcast_ref<T: StdError + 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn is_replica(&self) -> bool {
        self.inner.is::<ReplicaError>()
    }
}

impl fmt::Debug for Foreign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Foreign")
            .field("class_name", &self.class_name)
            .field("message", &self.message())
            .finish()
    }
}

impl fmt::Display for Foreign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.class_name, self.inner)
    }
}

/// Foreign error reconstructed from JSON; keeps class name, message and cause
#[derive(Debug, Clone)]
pub struct ReplicaError {
    class_name: String,
    type_name: String,
    message: Option<String>,
    cause: Option<Cause>,
}

impl ReplicaError {
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }
}

impl fmt::Display for ReplicaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => f.write_str(message),
            None => f.write_str(&self.class_name),
        }
    }
}

impl StdError for ReplicaError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_ref().map(|cause| cause.link().as_std())
    }
}

/// Owned cause of a [`Error::Child`]
#[derive(Debug, Clone)]
pub enum Cause {
    Error(Arc<Error>),
    Foreign(Foreign),
}

impl Cause {
    pub fn link(&self) -> Link<'_> {
        match self {
            Self::Error(error) => Link::Error(error),
            Self::Foreign(foreign) => Link::Foreign(foreign),
        }
    }

    pub fn as_error(&self) -> Option<&Error> {
        match self {
            Self::Error(error) => Some(error),
            Self::Foreign(_) => None,
        }
    }

    pub fn as_foreign(&self) -> Option<&Foreign> {
        match self {
            Self::Error(_) => None,
            Self::Foreign(foreign) => Some(foreign),
        }
    }

    pub fn id(&self, config: &dyn Config) -> String {
        self.link().id(config)
    }
}

impl From<Error> for Cause {
    fn from(error: Error) -> Self {
        Self::Error(Arc::new(error))
    }
}

impl From<Foreign> for Cause {
    fn from(foreign: Foreign) -> Self {
        Self::Foreign(foreign)
    }
}

/// Borrowed view of one link in a chain
#[derive(Debug, Clone, Copy)]
pub enum Link<'a> {
    Error(&'a Error),
    Foreign(&'a Foreign),
}

impl<'a> Link<'a> {
    pub fn as_error(self) -> Option<&'a Error> {
        match self {
            Self::Error(error) => Some(error),
            Self::Foreign(_) => None,
        }
    }

    pub fn as_foreign(self) -> Option<&'a Foreign> {
        match self {
            Self::Error(_) => None,
            Self::Foreign(foreign) => Some(foreign),
        }
    }

    pub fn id(self, config: &dyn Config) -> String {
        match self {
            Self::Error(error) => error.id_with(config),
            Self::Foreign(foreign) => foreign.id(config),
        }
    }

    pub fn as_std(self) -> &'a (dyn StdError + 'static) {
        match self {
            Self::Error(error) => error,
            Self::Foreign(foreign) => foreign.inner(),
        }
    }
}

/// Iterator over a chain, outermost link first
#[derive(Debug, Clone)]
pub struct Chain<'a> {
    next: Option<Link<'a>>,
}

impl<'a> Chain<'a> {
    pub(crate) fn new(head: &'a Error) -> Self {
        Self {
            next: Some(Link::Error(head)),
        }
    }
}

impl<'a> Iterator for Chain<'a> {
    type Item = Link<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        self.next = match current {
            Link::Error(error) => error.cause(),
            Link::Foreign(_) => None,
        };
        Some(current)
    }
}
