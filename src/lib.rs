pub mod cli;
pub mod config;
pub mod error;
pub mod logging;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use clap::Parser;
use serde_json::Value;
use tokio::io::AsyncReadExt;

pub use crate::config::{ConfigError, NormalizerConfig};
pub use crate::error::classifier::{Failure, RawFailure, UpstreamResponse, classify};
pub use crate::error::messages::resolve_user_message;
pub use crate::error::notifier::notify;
pub use crate::error::reporter::{ErrorReporter, EventSink, SinkError, TracingSink, report};
pub use crate::error::taxonomy::ErrorKind;
pub use crate::error::wrapper::{Wrapped, guard, wrap};
pub use crate::error::{ClassifiedError, Details, NotifyResult, PublicErrorView};
use crate::cli::Cli;
use crate::error::reporter::init_default_reporter;

/// Normalize one failure given on the command line or stdin and print the result
#[tokio::main]
pub async fn run() -> color_eyre::Result<()> {
    dotenvy::dotenv().ok();
    color_eyre::install()?;
    logging::init_tracing()?;

    let cli = Cli::parse();
    let config = NormalizerConfig::from_env()?;
    init_default_reporter(ErrorReporter::with_config(Arc::new(TracingSink), config))?;

    let input = match cli.input.clone() {
        Some(input) => input,
        None => {
            let mut buffer = String::new();
            tokio::io::stdin().read_to_string(&mut buffer).await?;
            buffer
        }
    };

    let failure = parse_failure(&input);
    let result = notify(&failure, cli.context()).await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

/// Read a failure as JSON, falling back to treating the input as message text
fn parse_failure(input: &str) -> Value {
    let input = input.trim();
    serde_json::from_str(input).unwrap_or_else(|_| Value::String(input.to_string()))
}
