use super::CliError;
use super::helpers::load_config;
use serde::Serialize;
use spaxel_core::common::SpaxelConfig;
use spaxel_core::domain::Component;
use spaxel_core::modules::density::{DensityDiagnostic, DensityLine, DensityRequest};
use spaxel_core::modules::metallicity::{
    CalibrationFamily, IonisationDiagnostic, MetallicityDiagnostic, MetallicityRequest,
};
use spaxel_core::modules::serialization::{read_table, write_table};
use spaxel_core::modules::TableAssembler;
use std::path::PathBuf;
use tracing::info;

#[derive(clap::Args)]
pub(super) struct ProcessArgs {
    /// Input CSV table with `galaxy` and `bin` identity columns
    #[arg(long)]
    input: PathBuf,

    /// Output CSV path
    #[arg(long)]
    output: PathBuf,

    /// JSON run configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Metallicity diagnostic to add on top of the configured requests
    #[arg(long)]
    metallicity: Option<MetallicityDiagnostic>,

    /// Fixed log(U) for an ionisation-dependent metallicity diagnostic
    #[arg(long, allow_negative_numbers = true, conflicts_with = "ion")]
    log_u: Option<f64>,

    /// Ionisation-parameter diagnostic used to solve for log(U)
    #[arg(long)]
    ion: Option<IonisationDiagnostic>,

    /// Estimate metallicity errors by Monte Carlo resampling
    #[arg(long)]
    errors: bool,

    /// Components the metallicity is computed on (`total`, `1`, ...); all when omitted
    #[arg(long, value_delimiter = ',')]
    components: Vec<Component>,

    /// Number of kinematic components in the table
    #[arg(long)]
    ncomponents: Option<u32>,

    /// Monte Carlo iterations per row
    #[arg(long)]
    niters: Option<usize>,

    /// Worker threads for Monte Carlo resampling
    #[arg(long)]
    threads: Option<usize>,

    /// Base seed for Monte Carlo resampling
    #[arg(long)]
    seed: Option<u64>,
}

impl ProcessArgs {
    /// Layers the command-line overrides on top of a loaded configuration.
    fn apply_to(&self, config: &mut SpaxelConfig) -> Result<(), CliError> {
        if let Some(ncomponents) = self.ncomponents {
            config.ncomponents_max = ncomponents;
        }
        if let Some(niters) = self.niters {
            config.monte_carlo.niters = niters;
        }
        if let Some(threads) = self.threads {
            config.monte_carlo.nthreads = threads;
        }
        if let Some(seed) = self.seed {
            config.monte_carlo.seed = seed;
        }

        match self.metallicity {
            Some(diagnostic) => {
                let mut request = MetallicityRequest::new(diagnostic).with_errors(self.errors);
                request.log_u = self.log_u;
                request.ion_diagnostic = self.ion;
                if !self.components.is_empty() {
                    request.components = Some(self.components.clone());
                }
                config.metallicity.push(request);
            }
            None if self.log_u.is_some()
                || self.ion.is_some()
                || self.errors
                || !self.components.is_empty() =>
            {
                return Err(CliError::Usage(
                    "--log-u, --ion, --errors and --components only apply together with --metallicity".to_string(),
                ));
            }
            None => {}
        }
        Ok(())
    }
}

pub(super) fn run_process_command(args: ProcessArgs) -> Result<i32, CliError> {
    let mut config = load_config(args.config.as_deref())?;
    args.apply_to(&mut config)?;
    let (input, output) = (args.input, args.output);
    let assembler = TableAssembler::new(config).map_err(CliError::Compute)?;

    let table = read_table(&input).map_err(CliError::Compute)?;
    info!(path = %input.display(), rows = table.len(), "loaded table");
    let assembled = assembler.run(&table).map_err(CliError::Compute)?;
    write_table(&output, &assembled).map_err(CliError::Compute)?;

    println!(
        "Wrote {} rows x {} columns to {}",
        assembled.len(),
        assembled.column_count(),
        output.display()
    );
    Ok(0)
}

#[derive(clap::Args)]
pub(super) struct DiagnosticsArgs {
    /// Print the catalogue as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MetallicityEntry {
    diagnostic: MetallicityDiagnostic,
    family: &'static str,
    requires_log_u: bool,
    ion_diagnostics: Vec<IonisationDiagnostic>,
}

#[derive(Debug, Serialize)]
struct DensityEntry {
    diagnostic: DensityDiagnostic,
    lines: Vec<DensityLine>,
}

#[derive(Debug, Serialize)]
struct DiagnosticCatalogue {
    metallicity: Vec<MetallicityEntry>,
    ionisation: Vec<IonisationDiagnostic>,
    density: Vec<DensityEntry>,
}

fn family_name(family: CalibrationFamily) -> &'static str {
    match family {
        CalibrationFamily::Kewley2019 => "Kewley2019",
        CalibrationFamily::Kobulnicky2004 => "Kobulnicky2004",
        CalibrationFamily::Fixed => "fixed",
    }
}

fn catalogue() -> DiagnosticCatalogue {
    let metallicity = MetallicityDiagnostic::ALL
        .into_iter()
        .map(|diagnostic| MetallicityEntry {
            diagnostic,
            family: family_name(diagnostic.family()),
            requires_log_u: diagnostic.requires_log_u(),
            ion_diagnostics: IonisationDiagnostic::ALL
                .into_iter()
                .filter(|ion| diagnostic.requires_log_u() && ion.family() == diagnostic.family())
                .collect(),
        })
        .collect();
    let density = DensityDiagnostic::ALL
        .into_iter()
        .map(|diagnostic| DensityEntry {
            diagnostic,
            lines: DensityLine::ALL
                .into_iter()
                .filter(|line| diagnostic.supports(*line))
                .collect(),
        })
        .collect();
    DiagnosticCatalogue {
        metallicity,
        ionisation: IonisationDiagnostic::ALL.to_vec(),
        density,
    }
}

pub(super) fn run_diagnostics_command(args: DiagnosticsArgs) -> Result<i32, CliError> {
    let catalogue = catalogue();
    if args.json {
        let rendered = serde_json::to_string_pretty(&catalogue)
            .map_err(|error| CliError::Internal(error.into()))?;
        println!("{rendered}");
        return Ok(0);
    }

    println!("Metallicity diagnostics:");
    for entry in &catalogue.metallicity {
        let ions: Vec<&str> = entry.ion_diagnostics.iter().map(|ion| ion.as_str()).collect();
        if ions.is_empty() {
            println!("  {:<12} {}", entry.diagnostic.as_str(), entry.family);
        } else {
            println!(
                "  {:<12} {} (log(U) fixed or solved with {})",
                entry.diagnostic.as_str(),
                entry.family,
                ions.join(", ")
            );
        }
    }
    println!("Density diagnostics:");
    for entry in &catalogue.density {
        let lines: Vec<&str> = entry.lines.iter().map(|line| line.as_str()).collect();
        println!("  {:<12} {}", entry.diagnostic.as_str(), lines.join(", "));
    }
    Ok(0)
}

#[derive(clap::Args)]
pub(super) struct DensityArgs {
    /// Density calibration
    #[arg(long, default_value = "Sanders2016")]
    diagnostic: DensityDiagnostic,

    /// Doublet the ratios were measured on
    #[arg(long, default_value = "[SII]")]
    line: DensityLine,

    /// Doublet ratios ([SII] 6716/6731 or [OII] 3729/3726)
    #[arg(required = true, value_name = "RATIO")]
    ratios: Vec<f64>,
}

fn limit_label(lower_limit: bool, upper_limit: bool) -> &'static str {
    match (lower_limit, upper_limit) {
        (true, _) => "lower limit",
        (_, true) => "upper limit",
        _ => "-",
    }
}

pub(super) fn run_density_command(args: DensityArgs) -> Result<i32, CliError> {
    let request = DensityRequest::new(args.diagnostic, args.line);
    request.validate().map_err(CliError::Compute)?;

    println!("ratio\tn_e\tlimit");
    for ratio in args.ratios {
        let estimate = request.electron_density(ratio);
        println!(
            "{ratio}\t{}\t{}",
            estimate.n_e,
            limit_label(estimate.lower_limit, estimate.upper_limit)
        );
    }
    Ok(0)
}
