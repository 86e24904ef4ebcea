use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::Builder;
use log::{info, LevelFilter};

use mutmotif::analysis::{self, NbrOptions};
use mutmotif::config::{OutputFormat, PlotConfig};
use mutmotif::io::{counts, spectra as spectra_io};
use mutmotif::logo::Selection;
use mutmotif::runlog::RunLog;
use mutmotif::spectra::{self, SpectraOptions};

/// mutmotif: log-linear analysis of sequence context effects on point mutation
#[derive(Parser)]
#[command(name = "mutmotif", version)]
struct Cli {
    /// Display more output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct Inputs {
    /// Tab-delimited counts file
    #[arg(short = '1', long)]
    countsfile: PathBuf,

    /// Directory to write results to
    #[arg(short, long)]
    outpath: PathBuf,

    /// Counts file of a second group
    #[arg(short = '2', long)]
    countsfile2: Option<PathBuf>,

    /// Single counts file, the second group being the strand
    #[arg(short, long)]
    strand_symmetry: bool,

    /// Run the analysis without writing output
    #[arg(short = 'D', long)]
    dry_run: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log-linear analysis of neighbouring base influence on point mutation
    Nbr {
        #[command(flatten)]
        inputs: Inputs,

        /// Consider only first order effects
        #[arg(long)]
        first_order: bool,

        /// Column holding the group of each record
        #[arg(short, long)]
        group_label: Option<String>,

        /// Group value shown in logos
        #[arg(short = 'r', long)]
        group_ref: Option<String>,

        /// TOML file of figure size and font settings
        #[arg(long)]
        plot_cfg: Option<PathBuf>,

        /// Figure format
        #[arg(long, value_enum, default_value_t = OutputFormat::Svg)]
        format: OutputFormat,
    },

    /// Log-linear analysis of mutation spectra between groups
    Spectra {
        #[command(flatten)]
        inputs: Inputs,

        /// Overwrite existing output files
        #[arg(short = 'F', long)]
        force_overwrite: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    Builder::new().filter_level(level).init();

    let inputs = match cli.command {
        Commands::Nbr { ref inputs, .. } | Commands::Spectra { ref inputs, .. } => inputs,
    };
    let mut runlog = RunLog::for_run(&inputs.outpath, inputs.dry_run)
        .with_context(|| format!("failed to start run log in {}", inputs.outpath.display()))?;
    runlog.vars(&cli.command)?;

    match cli.command {
        Commands::Nbr { inputs, first_order, group_label, group_ref, plot_cfg, format } => {
            let plot = PlotConfig::load(plot_cfg.as_deref())
                .context("failed to load plot configuration")?;
            let selection = Selection::new(group_label.as_deref(), group_ref.as_deref());
            run_nbr(&inputs, selection, first_order, format, plot, &mut runlog)
        },
        Commands::Spectra { inputs, force_overwrite } => run_spectra(&inputs, force_overwrite, &mut runlog),
    }
}

fn log_inputs(inputs: &Inputs, runlog: &mut RunLog) -> Result<()> {
    runlog.input_file("countsfile1_path", &inputs.countsfile)?;
    if let Some(ref path) = inputs.countsfile2 {
        runlog.input_file("countsfile2_path", path)?;
    }
    Ok(())
}

fn load_counts(path: &Path) -> Result<counts::CountsTable> {
    let table = counts::load(path)
        .with_context(|| format!("failed to read counts file {}", path.display()))?;
    info!("Read {}", path.display());
    Ok(table)
}

fn run_nbr(inputs: &Inputs, selection: Selection, first_order: bool, format: OutputFormat, plot: PlotConfig,
           runlog: &mut RunLog) -> Result<()> {
    let table = load_counts(&inputs.countsfile)?;
    let second = match inputs.countsfile2 {
        Some(ref path) => Some(load_counts(path)?),
        None => None,
    };
    log_inputs(inputs, runlog)?;
    let two_files = second.is_some();
    let (table, selection) = analysis::prepare_groups(table, second, inputs.strand_symmetry, selection)?;

    if !inputs.dry_run {
        fs::create_dir_all(&inputs.outpath)
            .with_context(|| format!("failed to create {}", inputs.outpath.display()))?;
        if two_files {
            let path = inputs.outpath.join(analysis::COMBINED_COUNTS_FILE);
            table.write_to_file(&path)?;
            runlog.output_file("group_counts", &path)?;
        }
    }

    let opts = NbrOptions {
        outpath: inputs.outpath.clone(),
        first_order: first_order,
        dry_run: inputs.dry_run,
        format: format,
        plot: plot,
    };
    analysis::run(&table, &selection, &opts, runlog)?;
    info!("Done! Check {} for your results", inputs.outpath.display());
    Ok(())
}

fn run_spectra(inputs: &Inputs, force_overwrite: bool, runlog: &mut RunLog) -> Result<()> {
    let table = spectra_io::load(&inputs.countsfile)
        .with_context(|| format!("failed to read spectra file {}", inputs.countsfile.display()))?;
    let second = match inputs.countsfile2 {
        Some(ref path) => Some(spectra_io::load(path)
            .with_context(|| format!("failed to read spectra file {}", path.display()))?),
        None => None,
    };
    log_inputs(inputs, runlog)?;
    let (table, selection) = analysis::prepare_groups(table, second, inputs.strand_symmetry, Selection::default())?;
    let group_label = match selection.group_label {
        Some(label) => label,
        None => bail!("spectra analysis needs a second counts file or --strand-symmetry"),
    };

    let opts = SpectraOptions {
        outpath: inputs.outpath.clone(),
        force_overwrite: force_overwrite,
        dry_run: inputs.dry_run,
    };
    spectra::run(&table, &group_label, &opts, runlog)?;
    Ok(())
}
