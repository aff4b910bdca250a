//! Error taxonomy shared by every bridge operation.
//!
//! Each code pairs with exactly one canonical message. Typed failures from the
//! process layer and request validation are mapped to a code here and nowhere else.

use serde::{Serialize, Serializer};

use super::request::RequestError;
use super::runner::RunError;

/// Numeric status returned in the `error` field of every envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    NoError = 0,
    /// Verb missing, not allowlisted, or a token failed hygiene checks.
    InvalidCommand = 1,
    /// The console program exited non-zero, could not be spawned, timed out or was cancelled.
    ConnectionProblem = 4,
    /// An explicit director was not in the listing.
    InvalidDirector = 5,
    InternalError = 100,
}

impl ErrorCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::NoError => "",
            ErrorCode::InvalidCommand => "Invalid command.",
            ErrorCode::ConnectionProblem => "Problem with connection to bconsole.",
            ErrorCode::InvalidDirector => "Invalid director.",
            ErrorCode::InternalError => "Internal error.",
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(ErrorCode::NoError),
            1 => Some(ErrorCode::InvalidCommand),
            4 => Some(ErrorCode::ConnectionProblem),
            5 => Some(ErrorCode::InvalidDirector),
            100 => Some(ErrorCode::InternalError),
            _ => None,
        }
    }

    pub fn is_ok(self) -> bool {
        self == ErrorCode::NoError
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.code())
    }
}

impl From<&RunError> for ErrorCode {
    fn from(_: &RunError) -> Self {
        ErrorCode::ConnectionProblem
    }
}

impl From<&RequestError> for ErrorCode {
    fn from(_: &RequestError) -> Self {
        ErrorCode::InvalidCommand
    }
}
