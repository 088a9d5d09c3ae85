//! # Errata
//!
//! Layered, chainable error representation with pluggable rendering and a
//! JSON wire format.
//!
//! ## Usage
//!
//! ```
//! use errata::{Error, ErrorCodeBuilder, ResultExt};
//! use errata::config::DefaultConfig;
//!
//! let offline = ErrorCodeBuilder::new()
//!     .indexed("NetworkError", 1, "Offline")
//!     .message("You appear to be offline")
//!     .build_with(&DefaultConfig)
//!     .unwrap();
//!
//! let result: Result<(), Error> = std::fs::read("/definitely/missing")
//!     .map(|_| ())
//!     .wrap_err(offline);
//! let err = result.unwrap_err();
//!
//! assert_eq!(err.text_with(&(), &DefaultConfig), "You appear to be offline");
//! assert!(err.id_with(&DefaultConfig).starts_with("NE1-"));
//! ```
//!
//! ## Modules
//!
//! - `code` - Identifiers, message strategies and error code representations
//! - `config` - Rendering/serialization policy and the process-wide instance
//! - `error` - The error chain and its rendering
//! - `serialization` - JSON encoding of chains and output-map helpers
//! - `ext` - `Result` adapters
//! - `job` - Job outcomes carrying a serialized error
pub mod code;
pub mod config;
pub mod error;
pub mod ext;
pub mod job;
pub mod serialization;

pub use code::{
    Code, EnumErrorCode, ErrorCode, ErrorCodeBuilder, ErrorCodeExt, Identifier, IntoErrorCode,
    MessageProvider, ResourceId, StringTable, TextResolver,
};
pub use config::{Config, ConfigBuilder, DefaultConfig};
pub use error::{Cause, Error, Foreign, Link};
pub use ext::ResultExt;
pub use job::{JobOutput, JobResult};
pub use serialization::SerializationError;
