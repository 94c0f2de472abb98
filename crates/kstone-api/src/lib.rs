// kstone-api: Blocking invoker and output decoders for the `openstack` CLI

pub mod client;
pub mod error;
pub mod invocation;
pub mod output;
pub mod transport;

pub use client::{CliClient, RetryPolicy};
pub use error::{Error, FailureKind, classify};
pub use invocation::{Action, Format, Invocation, REDACTED, Resource};
pub use output::{Record, parse_csv, parse_shell};
pub use transport::{CommandEnv, OpenstackCli, Runner};
