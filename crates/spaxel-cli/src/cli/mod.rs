mod commands;
mod helpers;

use clap::Parser;
use spaxel_core::domain::SpaxelError;

const PROGRAM_NAME: &str = "spaxel-rs";

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let error = error.as_spaxel_error();
            eprintln!("{}", error.diagnostic_line());
            eprintln!("{}", error.fatal_exit_line());
            error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once(PROGRAM_NAME.to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            helpers::init_logging(cli.verbose);
            dispatch_parsed(cli.command)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "spaxel-rs",
    version,
    about = "Derived emission-line quantities for IFS spaxel tables"
)]
struct Cli {
    /// Log engine-level detail to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Compute ratios, classes, densities and metallicities for a CSV table
    Process(commands::ProcessArgs),
    /// List the supported density, metallicity and ionisation diagnostics
    Diagnostics(commands::DiagnosticsArgs),
    /// Convert density-sensitive line ratios into electron densities
    Density(commands::DensityArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Process(args) => commands::run_process_command(args),
        CliCommand::Diagnostics(args) => commands::run_diagnostics_command(args),
        CliCommand::Density(args) => commands::run_density_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(SpaxelError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_spaxel_error(&self) -> SpaxelError {
        match self {
            Self::Usage(message) => {
                SpaxelError::input_validation("INPUT.CLI_USAGE", message.clone())
            }
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => SpaxelError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
