use crate::code::{ErrorCodeBuilder, IntoErrorCode};
use crate::error::Error;
use tracing::warn;

/// Extension trait lifting foreign failures into error chains
pub trait ResultExt<T> {
    /// Convert the error with [`Error::cast`]
    fn cast_err(self) -> Result<T, Error>;

    /// Convert the error with [`Error::materialize`]
    fn materialize_err(self) -> Result<T, Error>;

    /// Put `code` in front of the error
    fn wrap_err(self, code: impl IntoErrorCode) -> Result<T, Error>;

    /// Put a code configured by `code` in front of the error.
    ///
    /// `code` only runs on failure. A builder left without an identifier
    /// produces no code, and the error is materialized unchanged.
    fn wrap_err_with<F>(self, code: F) -> Result<T, Error>
    where
        F: FnOnce(ErrorCodeBuilder) -> ErrorCodeBuilder;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn cast_err(self) -> Result<T, Error> {
        self.map_err(Error::cast)
    }

    fn materialize_err(self) -> Result<T, Error> {
        self.map_err(Error::materialize)
    }

    fn wrap_err(self, code: impl IntoErrorCode) -> Result<T, Error> {
        self.map_err(|e| Error::wrap(e, code))
    }

    fn wrap_err_with<F>(self, code: F) -> Result<T, Error>
    where
        F: FnOnce(ErrorCodeBuilder) -> ErrorCodeBuilder,
    {
        self.map_err(|e| match code(ErrorCodeBuilder::new()).build() {
            Ok(code) => Error::wrap(e, code),
            Err(build_error) => {
                warn!(error = %build_error, "no wrapping code, keeping the original error");
                Error::materialize(e)
            }
        })
    }
}
