use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "error-normalizer")]
#[command(
    author,
    version,
    about = "Classify a failure, report it and print the user-facing result"
)]
pub struct Cli {
    /// Failure to normalize, as JSON or plain message text. Read from stdin when omitted
    pub input: Option<String>,

    /// Context label recorded with the report
    #[arg(short, long)]
    pub context: Option<String>,
}

impl Cli {
    /// Context to report under; empty falls back to the configured notify context
    pub fn context(&self) -> &str {
        self.context.as_deref().unwrap_or("")
    }
}
