//! Gateway: HTTP surface over the console bridge.
//!
//! Every API route answers with the `{ output, error }` envelope; bridge calls run on
//! the blocking pool because each one waits on a child process.

mod protocol;
mod server;

pub use protocol::{ConsoleParams, Health, JobTasksQuery};
pub use server::{router, run_gateway, GatewayState};
