use super::Error;

/// Error when a backend configuration cannot be used.
///
/// This occurs when:
/// - An engine name is not one of the supported engines
/// - No system database is configured and the engine has no default
/// - A connection URL or scratch database name is malformed
/// - Mutually exclusive scratch options are enabled together
///
/// Configuration errors are raised while the provisioner is being built,
/// before any database is touched.
#[derive(Debug)]
pub(super) struct ConfigError {
    message: Box<str>,
}

impl std::error::Error for ConfigError {}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid configuration: {}", self.message)
    }
}

impl Error {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Config(ConfigError {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::Config(_))
    }
}
