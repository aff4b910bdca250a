//! Console command bridge: allowlisted commands in, `{ output, error }` envelopes out.
//!
//! Flow per request: allowlist gate, director validation (only when a director is named),
//! invocation composition, process execution, transcript parsing. Every path ends in a
//! [`NormalizedResult`].

mod allowlist;
mod bridge;
mod envelope;
mod error;
mod invocation;
pub mod logging;
mod request;
mod runner;
mod transcript;

pub use allowlist::{console_allowlist, CommandAllowList, CONSOLE_VERBS};
pub use bridge::{Bridge, DirectorList};
pub use envelope::{NormalizedResult, Output};
pub use error::ErrorCode;
pub use invocation::{heredoc_safe, Invocation, InvocationComposer, HEREDOC_TERMINATOR, USER_KEYWORD};
pub use request::{valid_user_name, CommandRequest, RequestError};
pub use runner::{CancelHandle, ExecutionResult, ProcessRunner, RunError, SubprocessRunner};
pub use transcript::{EchoStrip, TranscriptStrategy};
