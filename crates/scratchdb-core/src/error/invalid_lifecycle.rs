use super::Error;

/// Error when a provisioner is driven out of order, such as running setup a
/// second time on a session that was already used.
#[derive(Debug)]
pub(super) struct InvalidLifecycle {
    message: Box<str>,
}

impl std::error::Error for InvalidLifecycle {}

impl core::fmt::Display for InvalidLifecycle {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid lifecycle: {}", self.message)
    }
}

impl Error {
    pub fn invalid_lifecycle(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidLifecycle(InvalidLifecycle {
            message: message.into().into(),
        }))
    }

    pub fn is_invalid_lifecycle(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidLifecycle(_))
    }
}
