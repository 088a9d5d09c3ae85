//! Background-job outcome carrying a serialized error chain
//!
//! A failed job stores its error under [`OUTPUT_KEY`] in the job output so
//! that whoever observes the job later can rebuild the chain.

use crate::config::Config;
use crate::error::Error;
use crate::serialization::{
    from_output_map, to_output_map, SerializationError, OUTPUT_KEY, UNKNOWN_ERROR_TAG,
};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Key/value output of a job
pub type JobOutput = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum JobResult {
    Success(JobOutput),
    Failure(JobOutput),
}

impl JobResult {
    /// Run `work` and convert its outcome
    pub fn run<E, F>(config: &dyn Config, work: F) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
        F: FnOnce() -> Result<JobOutput, E>,
    {
        Self::from_result(work(), config)
    }

    /// Successful output passes through; a failure is cast into a chain and
    /// serialized into the output
    pub fn from_result<E>(result: Result<JobOutput, E>, config: &dyn Config) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        match result {
            Ok(output) => Self::Success(output),
            Err(e) => Self::failure(&Error::cast(e), config),
        }
    }

    pub fn failure(error: &Error, config: &dyn Config) -> Self {
        debug!(id = %error.id_with(config), log = %error.log_with(config), "job failed");
        match to_output_map(error, config) {
            Ok(output) => Self::Failure(output),
            Err(e) => {
                warn!(error = %e, id = %error.id_with(config), "unable to serialize job failure");
                let mut output = Map::new();
                output.insert(
                    OUTPUT_KEY.to_string(),
                    Value::Array(vec![Value::from(UNKNOWN_ERROR_TAG)]),
                );
                Self::Failure(output)
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn output(&self) -> &JobOutput {
        match self {
            Self::Success(output) | Self::Failure(output) => output,
        }
    }

    /// The stored error; [`Error::NoError`] when there is none
    pub fn error(&self, config: &dyn Config) -> Result<Error, SerializationError> {
        from_output_map(self.output(), config)
    }
}
