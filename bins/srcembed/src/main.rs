mod cli;
mod source;

use anyhow::Context;
use cli::Command;
use source::Stdin;
use srcembed_config::SrcembedConfig;
use srcembed_format::{Dialect, FormatError, emit_array, emit_slice};
use srcembed_stream::OutputStream;
use srcembed_sys::{Fd, STDIN, advise_sequential};
use std::io::Write;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

fn diagnostic(message: impl std::fmt::Display) {
    let _ = writeln!(std::io::stderr(), "ERROR: {message}");
}

fn init_logging(config: &SrcembedConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .with_context(|| format!("invalid log filter '{}'", config.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
}

/// Streams stdin into one array declaration on stdout.
fn embed(varname: &str, dialect: Dialect, config: &SrcembedConfig) -> anyhow::Result<u64> {
    advise_sequential(STDIN);
    let stream_config = config.stream_config();

    let mut output = OutputStream::initialize(Fd::stdout(), stream_config)
        .map_err(|e| FormatError::Output(e.into()))
        .context("starting stdout drainer")?;

    let emitted = match Stdin::open(config.input, stream_config) {
        Ok(Stdin::Mapped(reader)) => {
            emit_slice(reader.remaining(), &mut output, varname, dialect)
        }
        Ok(Stdin::Streamed(mut input)) => {
            let emitted = emit_array(&mut input, &mut output, varname, dialect);
            debug!(bytes = input.bytes_read(), handoffs = input.handoffs(), "stdin drained");
            input.dispose();
            emitted
        }
        Err(e) => Err(FormatError::Input(e.into())),
    };

    let flushed = output.dispose();
    let count = emitted?;
    flushed.map_err(|e| FormatError::Output(e.into()))?;
    Ok(count)
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|a| a.to_string_lossy().into_owned())
        .collect();

    let (varname, language) = match cli::parse(&args) {
        Ok(Command::Help) => {
            print!("{}", cli::HELP);
            return ExitCode::SUCCESS;
        }
        Ok(Command::Embed { varname, language }) => (varname, language),
        Err(usage) => {
            diagnostic(usage);
            return ExitCode::SUCCESS;
        }
    };

    let Ok(dialect) = language.parse::<Dialect>() else {
        diagnostic("invalid language");
        return ExitCode::SUCCESS;
    };

    let config = match SrcembedConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            diagnostic(format_args!("{:#}", anyhow::Error::new(e)));
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_logging(&config) {
        diagnostic(format_args!("{e:#}"));
        return ExitCode::FAILURE;
    }

    match embed(&varname, dialect, &config) {
        Ok(count) => {
            debug!(count, %dialect, "done");
            ExitCode::SUCCESS
        }
        Err(err) => match err.downcast_ref::<FormatError>() {
            Some(FormatError::NoData) => {
                diagnostic(FormatError::NoData);
                ExitCode::SUCCESS
            }
            Some(e @ (FormatError::Input(_) | FormatError::Output(_))) => {
                error!(error = ?err, "embedding failed");
                diagnostic(e);
                ExitCode::FAILURE
            }
            _ => {
                diagnostic(format_args!("{err:#}"));
                ExitCode::FAILURE
            }
        },
    }
}
