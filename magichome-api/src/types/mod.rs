//! Defines fundamental types used throughout the codebase.

use std::fmt;
use tokio::sync::{mpsc, oneshot};

/// Enumerates all the errors that can be reported. Drivers should try
/// to map their errors into one of these values. The associated
/// string, when present, explains the details.

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Error {
    /// Returned whenever a resource cannot be found.
    NotFound,

    /// Reported when the peer of a communication channel has closed
    /// its handle or a network peer can't be reached.
    MissingPeer(String),

    /// Communication was disrupted due to one end not following a
    /// protocol.
    ProtocolError(String),

    /// An operation didn't complete in a timely fashion.
    TimeoutError,

    /// The requested operation couldn't complete. The description
    /// field will have more information for the user.
    OperationError(String),

    /// A bad parameter was given in a configuration or a
    /// configuration was missing a required parameter.
    ConfigError(String),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFound => write!(f, "item not found"),
            Error::MissingPeer(detail) => {
                write!(f, "{} is missing peer", detail)
            }
            Error::ProtocolError(v) => write!(f, "protocol error: {}", &v),
            Error::TimeoutError => write!(f, "timeout"),
            Error::OperationError(v) => {
                write!(f, "couldn't complete operation: {}", &v)
            }
            Error::ConfigError(v) => write!(f, "config error: {}", &v),
        }
    }
}

// Defining these trait implementations allows any code that sends
// requests over an `mpsc` channel and expects the reply in a
// `oneshot` to easily translate the channel errors into our error
// type.

impl<T> From<mpsc::error::SendError<T>> for Error {
    fn from(_error: mpsc::error::SendError<T>) -> Self {
        Error::MissingPeer(String::from("request channel is closed"))
    }
}

impl From<oneshot::error::RecvError> for Error {
    fn from(_error: oneshot::error::RecvError) -> Self {
        Error::MissingPeer(String::from("request dropped"))
    }
}

/// An 8-bit red/green/blue triple, as reported by a device.

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

/// The state a device reports when it's queried.
///
/// `raw` holds the reply as received so it can be logged when
/// debugging new controller variants.

#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct DeviceState {
    pub is_on: bool,
    pub color: Rgb,
    pub warm_white: u8,
    pub cold_white: u8,
    pub model: u8,
    pub version: u8,
    pub raw: Vec<u8>,
}
