use crate::cli::RunArgs;
use crate::config;
use crate::error::Result;
use indicatif::{ProgressBar, ProgressStyle};
use silica::engine::progress::{Progress, ProgressReporter};
use silica::workflows;
use tracing::info;

const DEFAULT_EVENTS: u64 = 1000;

pub fn run(args: RunArgs) -> Result<()> {
    let description = config::load(&args.config)?;
    let n_events = args
        .events
        .or(description.events)
        .unwrap_or(DEFAULT_EVENTS);

    let subsystems = description
        .subsystems
        .iter()
        .map(config::build_subsystem)
        .collect::<Result<Vec<_>>>()?;
    info!(
        subsystems = subsystems.len(),
        n_events, "run description resolved"
    );

    let bar = if args.no_progress {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(n_events);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} events",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    };

    let reporter = ProgressReporter::with_callback(Box::new(|event| match event {
        Progress::EventLoopStart { total_events } => bar.set_length(total_events),
        Progress::EventFinished => bar.inc(1),
        Progress::EventLoopFinish => bar.finish_and_clear(),
        _ => {}
    }));

    let summary = workflows::run::run(subsystems, n_events, &reporter)?;
    drop(reporter);

    println!("processed {} events", summary.events);
    if summary.totals.is_empty() {
        println!("no active subsystems published hit containers");
    } else {
        for (node, totals) in &summary.totals {
            println!(
                "  {node}: {} hits, {:.6} GeV deposited",
                totals.hits, totals.edep
            );
        }
    }
    Ok(())
}
