//! JSON form of error chains
//!
//! A chain is a JSON array, outermost link first. Each element is one of:
//!
//! - `"NoError"` / `"UnknownError"` for the sentinels
//! - an object with a `"discriminator"` field for error codes
//! - an object with a `"class"` field for foreign errors
//!
//! Decoding rebuilds the chain from the innermost element outward. An empty
//! array decodes to [`Error::NoError`]. Codes whose discriminator has no
//! decoder, neither built in nor configured, fail with
//! [`SerializationError::UnknownDiscriminator`].

pub mod error;
pub mod records;

pub use error::SerializationError;
pub use records::{CodeRecord, ForeignRecord, MessageRecord, Wrapper};

use crate::code::Code;
use crate::config::{self, Config};
use crate::error::{Cause, Error, Foreign};
use once_cell::sync::Lazy;
use records::{DISCRIMINATOR, FALLBACK_CODE, NATIVE_CODE};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Wire form of [`Error::NoError`]
pub const NO_ERROR_TAG: &str = "NoError";
/// Wire form of [`Error::UnknownError`]
pub const UNKNOWN_ERROR_TAG: &str = "UnknownError";

/// Key under which an error travels in a job output map
pub const OUTPUT_KEY: &str = "error";

type CodeDecoder = fn(&Value, &dyn Config) -> Result<Code, SerializationError>;

static DECODERS: Lazy<HashMap<&'static str, CodeDecoder>> = Lazy::new(|| {
    let mut decoders: HashMap<&'static str, CodeDecoder> = HashMap::new();
    decoders.insert(NATIVE_CODE, records::decode_native);
    decoders.insert(FALLBACK_CODE, records::decode_fallback);
    decoders
});

/// Encode a single code, natively or through [`Config::serialize_code`]
pub fn encode_code(code: &Code, config: &dyn Config) -> Result<Value, SerializationError> {
    if let Some(value) = code.serialize(config) {
        return Ok(value);
    }
    debug!(code = ?code, "no native schema, trying configured serializer");
    config
        .serialize_code(code.as_ref())
        .ok_or_else(|| SerializationError::Unsupported(format!("{:?}", code)))
}

/// Decode a single code by its discriminator
pub fn decode_code(value: &Value, config: &dyn Config) -> Result<Code, SerializationError> {
    let discriminator = value.get(DISCRIMINATOR).and_then(Value::as_str);
    if let Some(decoder) = discriminator.and_then(|name| DECODERS.get(name)) {
        return decoder(value, config);
    }
    debug!(?discriminator, "no built-in decoder, trying configured deserializer");
    config.deserialize_code(value).ok_or_else(|| {
        SerializationError::UnknownDiscriminator(discriminator.unwrap_or("<missing>").to_string())
    })
}

/// Encode a chain as a JSON array
pub fn encode(error: &Error, config: &dyn Config) -> Result<Value, SerializationError> {
    let mut links = Vec::new();
    encode_into(&mut links, error, config)?;
    Ok(Value::Array(links))
}

fn encode_into(
    links: &mut Vec<Value>,
    error: &Error,
    config: &dyn Config,
) -> Result<(), SerializationError> {
    let mut current = error;
    loop {
        match current {
            Error::NoError => {
                links.push(Value::from(NO_ERROR_TAG));
                return Ok(());
            }
            Error::UnknownError => {
                links.push(Value::from(UNKNOWN_ERROR_TAG));
                return Ok(());
            }
            Error::Custom { code } => {
                links.push(encode_code(code, config)?);
                return Ok(());
            }
            Error::Unexpected { cause, .. } => {
                return encode_foreign(links, cause, Some(Wrapper::Unexpected), config);
            }
            Error::Materialized { cause, .. } => {
                return encode_foreign(links, cause, Some(Wrapper::Materialized), config);
            }
            Error::Child { code, cause } => {
                links.push(encode_code(code, config)?);
                match cause {
                    Cause::Error(inner) => current = inner.as_ref(),
                    Cause::Foreign(foreign) => return encode_foreign(links, foreign, None, config),
                }
            }
        }
    }
}

/// Encode a foreign link, then every error reachable through `source()`.
///
/// A source that is itself an [`Error`] continues the chain natively.
fn encode_foreign(
    links: &mut Vec<Value>,
    foreign: &Foreign,
    wrapper: Option<Wrapper>,
    config: &dyn Config,
) -> Result<(), SerializationError> {
    let record = ForeignRecord::from_foreign(foreign, wrapper);
    links.push(serde_json::to_value(record)?);
    let mut source = foreign.inner().source();
    while let Some(current) = source {
        if let Some(error) = current.downcast_ref::<Error>() {
            return encode_into(links, error, config);
        }
        links.push(serde_json::to_value(ForeignRecord::from_source(current))?);
        source = current.source();
    }
    Ok(())
}

/// Rebuild a chain from its JSON array form
pub fn decode(value: &Value, config: &dyn Config) -> Result<Error, SerializationError> {
    let links = value
        .as_array()
        .ok_or_else(|| SerializationError::malformed("expected a JSON array of links"))?;

    let mut tail: Option<Cause> = None;
    for link in links.iter().rev() {
        let decoded = match link {
            Value::String(tag) if tag == NO_ERROR_TAG => Cause::from(Error::NoError),
            Value::String(tag) if tag == UNKNOWN_ERROR_TAG => Cause::from(Error::UnknownError),
            Value::Object(fields)
                if !fields.contains_key(DISCRIMINATOR) && fields.contains_key("class") =>
            {
                let record: ForeignRecord = serde_json::from_value(link.clone())?;
                let wrapper = record.wrapper;
                let foreign = record.into_foreign(tail.take());
                match wrapper {
                    Some(Wrapper::Unexpected) => Cause::from(Error::unexpected(foreign)),
                    Some(Wrapper::Materialized) => Cause::from(Error::materialized(foreign)),
                    None => Cause::Foreign(foreign),
                }
            }
            Value::Object(_) => {
                let code = decode_code(link, config)?;
                let error = match tail.take() {
                    Some(cause) => Error::Child { code, cause },
                    None => Error::Custom { code },
                };
                Cause::from(error)
            }
            other => {
                return Err(SerializationError::malformed(format!(
                    "unexpected chain element: {}",
                    other
                )))
            }
        };
        tail = Some(decoded);
    }

    Ok(match tail {
        None => Error::NoError,
        Some(Cause::Error(error)) => {
            Arc::try_unwrap(error).unwrap_or_else(|shared| (*shared).clone())
        }
        Some(Cause::Foreign(foreign)) => Error::unexpected(foreign),
    })
}

pub fn to_json_string(error: &Error, config: &dyn Config) -> Result<String, SerializationError> {
    Ok(serde_json::to_string(&encode(error, config)?)?)
}

pub fn to_json_string_pretty(
    error: &Error,
    config: &dyn Config,
) -> Result<String, SerializationError> {
    Ok(serde_json::to_string_pretty(&encode(error, config)?)?)
}

pub fn from_json_str(json: &str, config: &dyn Config) -> Result<Error, SerializationError> {
    let value: Value = serde_json::from_str(json)?;
    decode(&value, config)
}

/// Wrap an error into a single-entry output map
pub fn to_output_map(
    error: &Error,
    config: &dyn Config,
) -> Result<Map<String, Value>, SerializationError> {
    let mut output = Map::new();
    output.insert(OUTPUT_KEY.to_string(), encode(error, config)?);
    Ok(output)
}

/// Read an error back from an output map; a missing entry means no error
pub fn from_output_map(
    output: &Map<String, Value>,
    config: &dyn Config,
) -> Result<Error, SerializationError> {
    match output.get(OUTPUT_KEY) {
        Some(value) => decode(value, config),
        None => Ok(Error::NoError),
    }
}

/// Output entry as a key/value pair
pub fn to_output_pair(
    error: &Error,
    config: &dyn Config,
) -> Result<(String, Value), SerializationError> {
    Ok((OUTPUT_KEY.to_string(), encode(error, config)?))
}

/// Read an error back from a single output entry
pub fn from_output_pair(
    key: &str,
    value: &Value,
    config: &dyn Config,
) -> Result<Error, SerializationError> {
    if key == OUTPUT_KEY {
        decode(value, config)
    } else {
        Ok(Error::NoError)
    }
}

impl Error {
    /// Encode with the process-wide configuration
    pub fn to_json(&self) -> Result<Value, SerializationError> {
        encode(self, config::current().as_ref())
    }

    /// Decode with the process-wide configuration
    pub fn from_json(value: &Value) -> Result<Self, SerializationError> {
        decode(value, config::current().as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{ErrorCodeBuilder, ErrorCodeExt, Identifier, ResourceId};
    use crate::config::{ConfigBuilder, DefaultConfig, NameTable};
    use crate::error::cause::BOXED_TYPE_NAME;
    use crate::error::Link;
    use serde_json::json;
    use std::error::Error as StdError;
    use std::{fmt, io};

    /// Foreign error with a foreign source
    #[derive(Debug)]
    struct RequestFailed(io::Error);

    impl fmt::Display for RequestFailed {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("request failed")
        }
    }

    impl StdError for RequestFailed {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    /// Foreign error whose source is a chain
    #[derive(Debug)]
    struct TaskFailed(Error);

    impl fmt::Display for TaskFailed {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("task failed")
        }
    }

    impl StdError for TaskFailed {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    fn code(short: &str, message: &str) -> Code {
        ErrorCodeBuilder::new()
            .id_pair(short, format!("{short}.Test"))
            .message(message)
            .build_with(&DefaultConfig)
            .unwrap()
    }

    #[test]
    fn test_sentinels_encode_as_strings() {
        assert_eq!(encode(&Error::NoError, &DefaultConfig).unwrap(), json!(["NoError"]));
        assert_eq!(
            encode(&Error::UnknownError, &DefaultConfig).unwrap(),
            json!(["UnknownError"])
        );
    }

    #[test]
    fn test_empty_array_is_no_error() {
        let decoded = decode(&json!([]), &DefaultConfig).unwrap();
        assert!(decoded.is_no_error());
    }

    #[test]
    fn test_custom_code_shape() {
        let err = Error::custom(code("NE", "Offline"));
        let value = encode(&err, &DefaultConfig).unwrap();
        assert_eq!(
            value,
            json!([{
                "discriminator": "ErrorCode",
                "identifier": {"short": "NE", "full": "NE.Test"},
                "message": {"message": "Offline"},
                "fallback": false
            }])
        );
    }

    #[test]
    fn test_foreign_cause_round_trip() {
        let err = Error::wrap(
            io::Error::new(io::ErrorKind::Other, "broken pipe"),
            code("NE", "Offline"),
        );
        let value = encode(&err, &DefaultConfig).unwrap();
        assert_eq!(value[1]["class"], "Error");
        assert_eq!(value[1]["message"], "broken pipe");

        let decoded = decode(&value, &DefaultConfig).unwrap();
        assert_eq!(decoded.id_with(&DefaultConfig), "NE-E");
        assert_eq!(decoded.original().as_deref(), Some("broken pipe"));
        assert_eq!(encode(&decoded, &DefaultConfig).unwrap(), value);
    }

    #[test]
    fn test_foreign_sources_are_encoded() {
        let reset = io::Error::new(io::ErrorKind::Other, "connection reset");
        let err = Error::wrap(RequestFailed(reset), code("NE", "Offline"));
        let value = encode(&err, &DefaultConfig).unwrap();

        let links = value.as_array().unwrap();
        assert_eq!(links.len(), 3);
        assert_eq!(links[1]["class"], "RequestFailed");
        assert_eq!(links[1]["message"], "request failed");
        assert_eq!(links[2]["className"], BOXED_TYPE_NAME);
        assert_eq!(links[2]["message"], "connection reset");

        let decoded = decode(&value, &DefaultConfig).unwrap();
        assert_eq!(encode(&decoded, &DefaultConfig).unwrap(), value);
        let Some(Link::Foreign(outer)) = decoded.root_cause() else {
            panic!("expected a foreign root cause");
        };
        let source = outer.inner().source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("connection reset"));
    }

    #[test]
    fn test_nested_foreign_payload_keeps_every_link() {
        let value = json!([
            {"discriminator": "ErrorCode",
             "identifier": {"short": "NE", "full": "Network"},
             "message": {"message": "Offline"}},
            {"class": "Outer", "className": "app::Outer", "message": "outer"},
            {"class": "Inner", "className": "app::Inner", "message": "inner"}
        ]);
        let decoded = decode(&value, &DefaultConfig).unwrap();
        let encoded = encode(&decoded, &DefaultConfig).unwrap();
        assert_eq!(encoded.as_array().map(Vec::len), Some(3));
        assert_eq!(encoded[2]["className"], "app::Inner");
        assert_eq!(encoded[2]["message"], "inner");
    }

    #[test]
    fn test_chain_behind_foreign_error_stays_native() {
        let quota = Error::custom(code("Q", "Quota"));
        let err = Error::wrap(TaskFailed(quota), code("J", "Job failed"));
        let value = encode(&err, &DefaultConfig).unwrap();

        assert_eq!(value.as_array().map(Vec::len), Some(3));
        assert_eq!(value[1]["class"], "TaskFailed");
        assert_eq!(value[2]["discriminator"], "ErrorCode");
        assert_eq!(value[2]["identifier"]["short"], "Q");

        let decoded = decode(&value, &DefaultConfig).unwrap();
        assert_eq!(encode(&decoded, &DefaultConfig).unwrap(), value);
    }

    #[test]
    fn test_unexpected_keeps_its_variant() {
        let err = Error::cast(io::Error::new(io::ErrorKind::Other, "eof"));
        let value = encode(&err, &DefaultConfig).unwrap();
        assert_eq!(value[0]["wrapper"], "Unexpected");

        let decoded = decode(&value, &DefaultConfig).unwrap();
        assert!(matches!(decoded, Error::Unexpected { .. }));
        assert_eq!(decoded.log_with(&DefaultConfig), "eof");
    }

    #[test]
    fn test_bare_foreign_array_decodes_as_unexpected() {
        let value = json!([{"class": "Timeout", "className": "net::Timeout", "message": "slow"}]);
        let decoded = decode(&value, &DefaultConfig).unwrap();
        assert!(matches!(decoded, Error::Unexpected { .. }));
        assert_eq!(decoded.id_with(&DefaultConfig), "T");
    }

    #[test]
    fn test_resource_names_survive_round_trip() {
        let config = ConfigBuilder::new()
            .resource_names(NameTable::new().with(ResourceId(77), "app:string/offline"))
            .build();
        let err = Error::custom((Identifier::new("NE", "Network"), ResourceId(77)));
        let value = encode(&err, &config).unwrap();
        assert_eq!(value[0]["message"]["messageKey"], "app:string/offline");

        let decoded = decode(&value, &config).unwrap();
        assert_eq!(decoded.log_with(&config), "app:string/offline");
    }

    #[test]
    fn test_fallback_wrapper_round_trip() {
        let err = Error::custom(code("G", "Generic").as_fallback());
        let value = encode(&err, &DefaultConfig).unwrap();
        assert_eq!(value[0]["discriminator"], "FallbackErrorCode");
        let decoded = decode(&value, &DefaultConfig).unwrap();
        assert!(decoded.code().is_fallback());
        assert_eq!(decoded.message_with(&()).as_deref(), Some("Generic"));
    }

    #[test]
    fn test_unknown_discriminator_fails() {
        let value = json!([{"discriminator": "Mystery"}]);
        assert!(matches!(
            decode(&value, &DefaultConfig),
            Err(SerializationError::UnknownDiscriminator(name)) if name == "Mystery"
        ));
    }

    #[test]
    fn test_supplier_code_is_unsupported_without_serializer() {
        let dynamic = ErrorCodeBuilder::new()
            .id_supplier(|| "Dynamic".to_string())
            .build_with(&DefaultConfig)
            .unwrap();
        let err = Error::custom(dynamic);
        assert!(matches!(
            encode(&err, &DefaultConfig),
            Err(SerializationError::Unsupported(_))
        ));
    }

    #[test]
    fn test_malformed_payloads() {
        assert!(matches!(
            decode(&json!({"not": "an array"}), &DefaultConfig),
            Err(SerializationError::Malformed(_))
        ));
        assert!(matches!(
            decode(&json!([42]), &DefaultConfig),
            Err(SerializationError::Malformed(_))
        ));
        assert!(matches!(
            from_json_str("[", &DefaultConfig),
            Err(SerializationError::Json(_))
        ));
    }

    #[test]
    fn test_output_map_helpers() {
        let err = Error::custom(code("Q", "Quota"));
        let output = to_output_map(&err, &DefaultConfig).unwrap();
        assert!(output.contains_key(OUTPUT_KEY));
        let decoded = from_output_map(&output, &DefaultConfig).unwrap();
        assert_eq!(decoded.id_with(&DefaultConfig), "Q");

        assert!(from_output_map(&Map::new(), &DefaultConfig).unwrap().is_no_error());

        let (key, value) = to_output_pair(&err, &DefaultConfig).unwrap();
        assert_eq!(key, OUTPUT_KEY);
        assert_eq!(value, output[OUTPUT_KEY]);
        assert_eq!(
            from_output_pair(&key, &value, &DefaultConfig)
                .unwrap()
                .id_with(&DefaultConfig),
            "Q"
        );
        assert!(from_output_pair("result", &value, &DefaultConfig)
            .unwrap()
            .is_no_error());
    }
}
