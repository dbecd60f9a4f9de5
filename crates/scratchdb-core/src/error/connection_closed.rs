use super::Error;

/// Error when a scratch database handle is used after it was closed.
#[derive(Debug)]
pub(super) struct ConnectionClosed {
    database: Box<str>,
}

impl std::error::Error for ConnectionClosed {}

impl core::fmt::Display for ConnectionClosed {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "connection to `{}` is closed", self.database)
    }
}

impl Error {
    pub fn connection_closed(database: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::ConnectionClosed(ConnectionClosed {
            database: database.into().into(),
        }))
    }

    pub fn is_connection_closed(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::ConnectionClosed(_))
    }
}
