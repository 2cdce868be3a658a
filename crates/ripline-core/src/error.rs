use std::{fmt, io};

/// Convenience alias for results carrying an [`ErrorKind`].
pub type Result<T> = std::result::Result<T, ErrorKind>;

/// Errors surfaced by a channel and its collaborators.
///
/// The `Io` variant stores the OS error's classification and reason text
/// rather than the raw `io::Error` so that a single close error can be
/// handed to every pending write completion.
///
/// Programmer errors (invariant violations, out-of-range option values)
/// are not represented here; they panic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A socket or event-loop syscall failed.
    Io {
        /// Classification of the underlying OS error.
        kind: io::ErrorKind,
        /// Human-readable reason reported by the OS.
        reason: String,
    },
    /// The channel is closed; pending and new writes are rejected.
    ChannelClosed,
    /// The submitted payload cannot be transmitted on a byte-stream channel.
    /// Carries a short tag naming the rejected payload kind.
    UnsupportedMessage(&'static str),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Io { kind, reason } => {
                write!(f, "I/O error ({:?}): {}", kind, reason)
            }
            ErrorKind::ChannelClosed => write!(f, "channel closed"),
            ErrorKind::UnsupportedMessage(tag) => {
                write!(f, "unsupported message type: {}", tag)
            }
        }
    }
}

impl std::error::Error for ErrorKind {}

impl From<io::Error> for ErrorKind {
    fn from(error: io::Error) -> Self {
        ErrorKind::Io { kind: error.kind(), reason: error.to_string() }
    }
}
