use std::io::Write;
use std::process::ExitCode;

use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use train_reconcile::calendar::ConversionRun;
use train_reconcile::input::load_input;
use train_reconcile::reconcile::Reconciler;

fn main() -> ExitCode {
    // Logs go to stderr so stdout stays a single JSON document
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("Usage: train-reconcile <input.json>");
        return ExitCode::from(2);
    };

    let input = match load_input(&path) {
        Ok(input) => input,
        Err(e) => {
            error!(error = %e, "Failed to load input");
            return ExitCode::FAILURE;
        }
    };

    // Convert train variants into deduplicated service calendars
    let mut run = ConversionRun::new();
    let mut accepted = 0;
    for variant in &input.variants {
        match run.add_variant(variant) {
            Ok(outcome) if outcome.is_accepted() => accepted += 1,
            Ok(_) => {}
            Err(e) => {
                error!(core_id = %variant.core_id, error = %e, "Aborting conversion");
                return ExitCode::FAILURE;
            }
        }
    }
    info!(
        variants = input.variants.len(),
        accepted,
        calendars = run.registry().len(),
        "Converted train variants"
    );
    let calendars = run.finish();

    // Index the authoritative feed and label the target's rail trips
    let (reconciler, index) = Reconciler::from_feed(&input.authoritative);
    let reconciliation = reconciler.reconcile_feed(&input.target);

    let output = json!({
        "calendars": calendars,
        "index": index,
        "reconciliation": reconciliation,
    });
    let mut stdout = std::io::stdout().lock();
    let written = serde_json::to_writer_pretty(&mut stdout, &output)
        .map_err(std::io::Error::from)
        .and_then(|()| writeln!(stdout));
    if let Err(e) = written {
        error!(error = %e, "Failed to write output");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
