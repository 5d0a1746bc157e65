use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use ribdif_rs::error::Result;
use ribdif_rs::primers::parse_primer_file;
use ribdif_rs::{analyse_primers, genome_summary, relabel_primer, RunConfig};

/// Evaluate whether primer amplicons differentiate species within a genus
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build overlap reports from each primer's cluster table
    Analyse(RunArgs),
    /// Rewrite raw amplicon headers to their origin sequences
    Relabel(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Genus to analyse, e.g. 'Staphylococcus' or 'Staphylococcus aureus'
    #[arg(short = 'g', long = "genus", required = true)]
    genus: String,
    /// Run output directory
    #[arg(short = 'o', long = "outdir", default_value = ".")]
    outdir: PathBuf,
    /// Tab separated primer file: name, forward, reverse
    #[arg(short = 'p', long = "primers", required = true)]
    primers: PathBuf,
    /// Number of primers analysed in parallel. Default: all available cores
    #[arg(short = 't', long = "threads")]
    threads: Option<usize>,
    /// Genomes were supplied by the user and carry no species labels
    #[arg(long = "user-genomes")]
    user_genomes: bool,
    /// FASTA corpus for genome counts. Default: <outdir>/full/<genus>.16S
    #[arg(long = "census")]
    census: Option<PathBuf>,
    /// Domain directory of the per-genome downloads under <outdir>/refseq
    #[arg(long = "domain", default_value = "bacteria")]
    domain: String,
}

impl RunArgs {
    fn config(&self) -> RunConfig {
        let mut config = RunConfig::new(&self.outdir, &self.genus);
        config.threads = self.threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        });
        config.user_genomes = self.user_genomes;
        config.census_path = self.census.clone();
        config.domain = self.domain.clone();
        config
    }
}

fn spinner(colour: &str, msg: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let template = format!("{{spinner:.{}}} {{msg}}", colour);
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template(&template)
    {
        spinner.set_style(style);
    }
    spinner.set_message(msg.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Returns the number of primers that failed.
fn analyse(args: &RunArgs) -> Result<usize> {
    let config = args.config();
    let primers = parse_primer_file(&args.primers)?;

    let spin = spinner("blue", "Summarising downloaded genomes...");
    let summary_path = genome_summary(&config)?;
    spin.finish_with_message(format!("Genome summary written to {}", summary_path.display()));

    let spin = spinner("green", &format!("Analysing {} primer(s) for {}...", primers.len(), config.genus));
    let results = analyse_primers(&config, &primers)?;

    let failed = results.iter().filter(|(_, r)| r.is_err()).count();
    for (name, result) in &results {
        match result {
            Ok(analysis) => log::debug!("{} -> {}", name, analysis.report_path.display()),
            Err(e) => eprintln!("Primer {}: {}", name, e),
        }
    }
    spin.finish_with_message(format!(
        "{} of {} primer report(s) written to {}",
        results.len() - failed,
        results.len(),
        config.outdir.display()
    ));
    Ok(failed)
}

fn relabel(args: &RunArgs) -> Result<usize> {
    let config = args.config();
    let primers = parse_primer_file(&args.primers)?;

    let spin = spinner("yellow", "Relabelling amplicon headers...");
    let mut failed = 0;
    for primer in &primers {
        if let Err(e) = relabel_primer(&config, &primer.name) {
            log::error!("Primer {} failed: {}", primer.name, e);
            eprintln!("Primer {}: {}", primer.name, e);
            failed += 1;
        }
    }
    spin.finish_with_message("Amplicon headers relabelled.");
    Ok(failed)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let outcome = match &cli.command {
        Command::Analyse(args) => analyse(args),
        Command::Relabel(args) => relabel(args),
    };

    match outcome {
        Ok(0) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
