mod args;

use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{error, info, warn};

use proforma_core::logging;
use proforma_core::{ProformaConfig, ProformaError, RosterClient, RosterView, load_roster_file};
use proforma_docs::{ExportOptions, HttpImageSource, SavedFile, export_to_dir, preview};

use crate::args::{CliArgs, Command, RosterSource, USAGE};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> ExitCode {
    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e:#}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.user_message());
            return ExitCode::FAILURE;
        }
    };

    // Keep the guard alive so buffered log lines are flushed on exit.
    let _log_guard = match logging::init_logging(&config.log_level) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Logging disabled: {e:#}");
            None
        }
    };

    info!("Starting proforma v{VERSION}");

    match run(args, config).await {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failed) => {
            eprintln!("{failed} format(s) failed; the other files were saved.");
            ExitCode::FAILURE
        }
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

fn report(e: &ProformaError) {
    error!(category = ?e.category(), "{e}");
    eprintln!("{}", e.user_message());
    if e.is_retryable() {
        eprintln!("Run the same command again to retry.");
    }
}

fn print_saved(file: &SavedFile) {
    match file.page_count {
        Some(pages) => println!(
            "{} ({} students, {} pages)",
            file.path.display(),
            file.row_count,
            pages
        ),
        None => println!("{} ({} students)", file.path.display(), file.row_count),
    }
}

fn load_config(args: &CliArgs) -> Result<ProformaConfig, ProformaError> {
    match &args.config {
        Some(path) => ProformaConfig::load_from_path(path),
        None => ProformaConfig::load(),
    }
}

/// Returns the number of formats that failed. Errors that stop every
/// format (roster, selection) are returned as `Err`.
async fn run(args: CliArgs, config: ProformaConfig) -> Result<usize, ProformaError> {
    let students = match &args.source {
        RosterSource::Session(id) => {
            RosterClient::new(config.api_base_url.clone())
                .fetch_students(id)
                .await?
        }
        RosterSource::File(path) => load_roster_file(path)?,
    };

    let mut view = RosterView::new(students);
    if !args.filters.is_empty() {
        info!(filters = ?args.filters, "applying filters");
    }
    view.set_filters(args.filters.clone());
    info!(
        total = view.len(),
        visible = view.visible().len(),
        "roster loaded"
    );

    match &args.select {
        None => view.set_all_visible(true),
        Some(keys) => {
            for input in keys {
                match view.find_key(input).cloned() {
                    Some(key) => {
                        view.set_selected(&key, true);
                    }
                    None => warn!(key = %input, "no student with this key"),
                }
            }
        }
    }

    if !view.can_export() {
        return Err(ProformaError::EmptySelection);
    }

    let selected = view.selected_students();
    let options = ExportOptions::from(&config);
    let out_dir = args
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output_dir));

    match &args.command {
        Command::Preview => {
            let saved = preview(&selected, &options)?.save_to(&out_dir)?;
            print_saved(&saved);
            Ok(0)
        }
        Command::Export(formats) => {
            let images = HttpImageSource::new();
            let results = export_to_dir(formats, &selected, &images, &options, &out_dir).await;
            let mut failed = 0;
            for (format, result) in results {
                match result {
                    Ok(files) => files.iter().for_each(print_saved),
                    Err(e) => {
                        eprintln!("{format}:");
                        report(&e);
                        failed += 1;
                    }
                }
            }
            Ok(failed)
        }
    }
}
