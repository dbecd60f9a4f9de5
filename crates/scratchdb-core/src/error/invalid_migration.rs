use super::Error;

/// Error when a migrations location cannot be turned into an ordered set of
/// migrations.
///
/// This occurs when:
/// - The migrations directory does not exist or cannot be read
/// - A migration file name lacks a numeric `<id>_` prefix
/// - Two migration files share the same id
#[derive(Debug)]
pub(super) struct InvalidMigration {
    message: Box<str>,
}

impl std::error::Error for InvalidMigration {}

impl core::fmt::Display for InvalidMigration {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid migration: {}", self.message)
    }
}

impl Error {
    /// Creates an invalid migration error.
    pub fn invalid_migration(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidMigration(InvalidMigration {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is an invalid migration error.
    pub fn is_invalid_migration(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidMigration(_))
    }
}
