//! Command-line front end.
//!
//! ```text
//! riposte <host> <port> [--ssl] [--commands <path>] [--continue-on-error]
//! ```
//!
//! Exit status: 0 when every response matched, 1 on assertion failures,
//! 2 when a test case was aborted by a connection or decode error, and 3 if
//! the command file or configuration could not be loaded.

use std::{path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::Parser;
use riposte::{
    ConsoleReporter, Executor, FileSource, RunConfig, RunError, SourceFormat,
    config::load_client_settings,
};
use riposte_common::{
    config::{ClientSettings, Target},
    tracing,
};

/// Replay recorded commands against a server and check its responses
#[derive(Parser, Debug)]
#[command(name = "riposte")]
#[command(about = "Protocol conformance tester for line-oriented servers", long_about = None)]
#[command(version)]
struct Cli {
    /// Server host address
    host: String,

    /// Server port
    port: u16,

    /// Use TLS for the connection
    #[arg(long)]
    ssl: bool,

    /// Path to the commands file [default: commands.txt, or commands.json
    /// with --format json]
    #[arg(long)]
    commands: Option<PathBuf>,

    /// Format of the commands file (inferred from the extension if omitted)
    #[arg(long, value_enum)]
    format: Option<SourceFormat>,

    /// Continue on error and report every incorrect response at the end
    #[arg(long)]
    continue_on_error: bool,

    /// RON file with client settings (timeouts, response size limit)
    #[arg(long)]
    config: Option<PathBuf>,

    /// How long the server may stay silent before a response is complete
    #[arg(long)]
    idle_timeout_ms: Option<u64>,

    /// Timeout for connecting and the TLS handshake
    #[arg(long)]
    connect_timeout_secs: Option<u64>,
}

impl Cli {
    fn source(&self) -> FileSource {
        match (&self.commands, self.format) {
            (Some(path), Some(format)) => FileSource::new(path, format),
            (Some(path), None) => FileSource::detect(path),
            (None, format) => {
                let format = format.unwrap_or_default();
                FileSource::new(format.default_path(), format)
            }
        }
    }

    fn client_settings(&self) -> anyhow::Result<ClientSettings> {
        let mut settings = match &self.config {
            Some(path) => load_client_settings(path)?,
            None => ClientSettings::default(),
        };

        if let Some(idle) = self.idle_timeout_ms {
            settings.timeouts.idle_millis = idle;
        }
        if let Some(connect) = self.connect_timeout_secs {
            settings.timeouts.connect_secs = connect;
        }

        Ok(settings)
    }

    fn run_config(&self) -> anyhow::Result<RunConfig> {
        let target = Target::new(&self.host, self.port).secure(self.ssl);

        Ok(RunConfig::new(target)
            .continue_on_error(self.continue_on_error)
            .with_client(self.client_settings()?))
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.run_config().context("Unable to load configuration")?;
    let source = cli.source();

    tracing::debug!(path = %source.path().display(), format = ?source.format(), "Loading commands");

    let mut executor = Executor::new(config, ConsoleReporter::default());
    executor.run_source(&source).await?;

    Ok(())
}

fn exit_code(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<RunError>() {
        Some(RunError::Source(_)) | None => ExitCode::from(3),
        Some(err) if err.is_abort() => ExitCode::from(2),
        Some(_) => ExitCode::from(1),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    riposte_common::logging::init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            exit_code(&err)
        }
    }
}
