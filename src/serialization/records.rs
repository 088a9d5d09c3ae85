//! Wire records for codes, messages and foreign errors

use super::error::SerializationError;
use super::{decode_code, encode_code};
use crate::code::builder::assemble;
use crate::code::message::MessageProvider;
use crate::code::variants::IdSource;
use crate::code::{Code, ErrorCodeExt, Identifier};
use crate::config::{resolve_resource, Config};
use crate::error::cause::BOXED_TYPE_NAME;
use crate::error::{Cause, Foreign, ReplicaError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error as StdError;

pub const DISCRIMINATOR: &str = "discriminator";
pub const NATIVE_CODE: &str = "ErrorCode";
pub const FALLBACK_CODE: &str = "FallbackErrorCode";

/// Native code schema
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CodeRecord {
    pub discriminator: String,
    pub identifier: Identifier,
    #[serde(default)]
    pub message: MessageRecord,
    #[serde(default)]
    pub fallback: bool,
}

/// A [`MessageProvider`] on the wire. Resource keys travel by name.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub no_log: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrapped: Option<Box<MessageRecord>>,
}

impl MessageRecord {
    pub fn from_provider(provider: &MessageProvider, config: &dyn Config) -> Self {
        match provider {
            MessageProvider::Empty => Self::default(),
            MessageProvider::Direct(text) => Self {
                message: Some(text.clone()),
                ..Self::default()
            },
            MessageProvider::FromKey(key) => Self {
                message_key: Some(config.resource_name(*key)),
                ..Self::default()
            },
            MessageProvider::FromFormattedKey(key, args) => Self {
                message_key: Some(config.resource_name(*key)),
                args: Some(args.clone()),
                ..Self::default()
            },
            MessageProvider::WithLog(log, inner) => Self {
                log: Some(log.clone()),
                wrapped: Some(Box::new(Self::from_provider(inner, config))),
                ..Self::default()
            },
            MessageProvider::WithoutLog(inner) => Self {
                no_log: true,
                wrapped: Some(Box::new(Self::from_provider(inner, config))),
                ..Self::default()
            },
        }
    }

    pub fn into_provider(
        self,
        config: &dyn Config,
    ) -> Result<MessageProvider, SerializationError> {
        if self.no_log || self.log.is_some() {
            let inner = self
                .wrapped
                .ok_or_else(|| {
                    SerializationError::malformed("log decorator without wrapped message")
                })?
                .into_provider(config)?;
            return Ok(match self.log {
                Some(log) if !self.no_log => inner.with_log(log),
                _ => inner.without_log(),
            });
        }
        if let Some(text) = self.message {
            return Ok(MessageProvider::Direct(text));
        }
        Ok(match (self.message_key, self.args) {
            (Some(name), Some(args)) => {
                MessageProvider::FromFormattedKey(resolve_resource(config, &name), args)
            }
            (Some(name), None) => MessageProvider::FromKey(resolve_resource(config, &name)),
            (None, _) => MessageProvider::Empty,
        })
    }
}

/// How a foreign link was attached to the chain
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrapper {
    Unexpected,
    Materialized,
}

/// A foreign error on the wire
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ForeignRecord {
    /// Simple type name
    pub class: String,
    /// Fully qualified type name; records without one fall back to `class`
    #[serde(default)]
    pub class_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrapper: Option<Wrapper>,
}

impl ForeignRecord {
    pub fn from_foreign(foreign: &Foreign, wrapper: Option<Wrapper>) -> Self {
        let message = match foreign.inner().downcast_ref::<ReplicaError>() {
            Some(replica) => replica.message().map(str::to_string),
            None => Some(foreign.message()),
        };
        Self {
            class: foreign.class_name().to_string(),
            class_name: foreign.type_name().to_string(),
            message,
            wrapper,
        }
    }

    /// Record for an error reached through `source()`, whose type is erased
    pub fn from_source(source: &(dyn StdError + 'static)) -> Self {
        match source.downcast_ref::<ReplicaError>() {
            Some(replica) => Self {
                class: replica.class_name().to_string(),
                class_name: replica.type_name().to_string(),
                message: replica.message().map(str::to_string),
                wrapper: None,
            },
            None => Self {
                class: "Error".to_string(),
                class_name: BOXED_TYPE_NAME.to_string(),
                message: Some(source.to_string()),
                wrapper: None,
            },
        }
    }

    pub fn into_foreign(self, cause: Option<Cause>) -> Foreign {
        let class_name = if self.class_name.is_empty() {
            self.class.clone()
        } else {
            self.class_name
        };
        Foreign::replica(self.class, class_name, self.message, cause)
    }
}

/// Encode a code in the native schema
pub fn encode_native(
    identifier: &Identifier,
    provider: &MessageProvider,
    fallback: bool,
    config: &dyn Config,
) -> Value {
    let record = CodeRecord {
        discriminator: NATIVE_CODE.to_string(),
        identifier: identifier.clone(),
        message: MessageRecord::from_provider(provider, config),
        fallback,
    };
    serde_json::to_value(record).unwrap_or(Value::Null)
}

/// Encode a fallback wrapper; `None` when the wrapped code cannot be encoded
pub fn encode_fallback(inner: &Code, config: &dyn Config) -> Option<Value> {
    let wrapped = encode_code(inner, config).ok()?;
    let mut record = serde_json::Map::new();
    record.insert(DISCRIMINATOR.to_string(), Value::from(FALLBACK_CODE));
    record.insert("wrapped".to_string(), wrapped);
    Some(Value::Object(record))
}

pub(super) fn decode_native(
    value: &Value,
    config: &dyn Config,
) -> Result<Code, SerializationError> {
    let record: CodeRecord = serde_json::from_value(value.clone())?;
    let provider = record.message.into_provider(config)?;
    Ok(assemble(
        IdSource::Fixed(record.identifier),
        provider,
        record.fallback,
        config,
    ))
}

pub(super) fn decode_fallback(
    value: &Value,
    config: &dyn Config,
) -> Result<Code, SerializationError> {
    let wrapped = value
        .get("wrapped")
        .ok_or_else(|| SerializationError::malformed("fallback code without wrapped code"))?;
    Ok(decode_code(wrapped, config)?.as_fallback())
}
