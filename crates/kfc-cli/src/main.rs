//! KFC CLI binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use kfc_cli::cli::{Cli, Commands};
use kfc_cli::commands::{FingerprintCommand, RenderCommand, SendCommand};
use kfc_cli::output::OutputFormat;

fn main() -> ExitCode {
    // Logs go to stderr so stdout stays clean for output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), kfc_cli::CliError> {
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();

    match &cli.command {
        Commands::Send(args) => {
            let cmd = SendCommand::from_cli(&cli)?;
            cmd.execute(&mut stdout, &format, args).await?;
        }
        Commands::Render(args) => {
            let cmd = RenderCommand::new(&cli.sender);
            cmd.execute(&mut stdout, &format, args)?;
        }
        Commands::Fingerprint(args) => {
            FingerprintCommand::new().execute(&mut stdout, &format, args)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kfc_cli::cli::Format;

    #[test]
    fn cli_parses_fingerprint() {
        let cli = Cli::parse_from(["kfc", "fingerprint", "-l", "alertname=Test"]);
        assert!(matches!(cli.command, Commands::Fingerprint(_)));
    }

    #[test]
    fn cli_respects_format_flag() {
        let cli = Cli::parse_from(["kfc", "--format", "json", "fingerprint"]);
        assert_eq!(cli.format, Format::Json);
    }

    #[tokio::test]
    async fn run_fingerprint_succeeds() {
        let cli = Cli::parse_from(["kfc", "fingerprint", "-l", "alertname=Test"]);
        assert!(run(cli).await.is_ok());
    }

    #[tokio::test]
    async fn run_send_without_smarthost_fails() {
        let cli = Cli::parse_from(["kfc", "send", "--to", "a@example.org"]);
        let cli = Cli {
            smarthost: None,
            ..cli
        };
        assert!(matches!(
            run(cli).await,
            Err(kfc_cli::CliError::Config(_))
        ));
    }
}
