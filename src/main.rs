use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use rx_sheets::{CopyCount, Error, LineEstimate, Locale, PrintJob};

#[derive(Parser)]
#[command(version, about = "Paginate a prescription job and export it to PDF")]
struct Cli {
    /// JSON print job
    input: PathBuf,

    /// Output PDF (defaults to prescription_<patient>_<date>.pdf next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of physical copies (1 or 2)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=2))]
    copies: Option<u8>,

    /// Leave the patient instructions out even if the job includes them
    #[arg(long)]
    no_instructions: bool,

    #[arg(long)]
    chars_per_line: Option<usize>,

    #[arg(long)]
    lines_per_page: Option<usize>,

    #[arg(long)]
    items_per_page: Option<usize>,

    /// Estimate instruction lines by word-wrapping with font metrics
    #[arg(long)]
    measured: bool,

    /// en or pt-br
    #[arg(long)]
    locale: Option<Locale>,

    /// Print the composed page list as JSON instead of writing a PDF
    #[arg(long)]
    dump_pages: bool,

    /// -v for info, -vv for debug
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn apply_overrides(cli: &Cli, job: &mut PrintJob) -> Result<(), Error> {
    job.pagination = job.pagination.with_overrides(
        cli.chars_per_line,
        cli.lines_per_page,
        cli.items_per_page,
    )?;
    if cli.measured {
        job.pagination.line_estimate = LineEstimate::Measured;
    }
    if let Some(n) = cli.copies {
        job.options.copies = CopyCount::try_from(n).map_err(Error::InvalidJob)?;
    }
    if cli.no_instructions {
        job.document.include_instructions = false;
    }
    if let Some(locale) = cli.locale {
        job.locale = locale;
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<(), Error> {
    let mut job = rx_sheets::load_job(&cli.input)?;
    apply_overrides(cli, &mut job)?;

    if cli.dump_pages {
        let pages = rx_sheets::compose_job(&job);
        let json = serde_json::to_string_pretty(&pages)?;
        println!("{json}");
        return Ok(());
    }

    let output = cli.output.clone().unwrap_or_else(|| {
        let name = rx_sheets::default_output_name(&job.document, job.locale);
        cli.input.with_file_name(name)
    });
    rx_sheets::render_job_to_pdf(&job, &output)?;
    log::info!("Wrote {}", output.display());
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
