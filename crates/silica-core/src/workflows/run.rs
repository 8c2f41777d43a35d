use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::runtime::{HitTotals, RunContext};
use crate::engine::subsystem::Subsystem;
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// Per-run output of one simulation run.
///
/// Totals are keyed by hit-container node name, i.e. the
/// `"G4HIT_" + subsystem_name` convention downstream components resolve.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub events: u64,
    pub totals: BTreeMap<String, HitTotals>,
}

/// Drives a complete run: initializes every subsystem once, processes
/// `n_events` strictly serially, and summarizes the published hit output.
///
/// Any subsystem error aborts the run; there is no partial-success mode and
/// no event retry.
#[instrument(skip_all, name = "run_workflow")]
pub fn run(
    subsystems: Vec<Box<dyn Subsystem>>,
    n_events: u64,
    reporter: &ProgressReporter,
) -> Result<RunSummary, EngineError> {
    let mut ctx = RunContext::new();
    for subsystem in subsystems {
        ctx.register(subsystem);
    }

    reporter.report(Progress::PhaseStart {
        name: "Initialization",
    });
    info!(subsystems = ctx.subsystem_count(), "initializing subsystems");
    ctx.init_run()?;
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::EventLoopStart {
        total_events: n_events,
    });
    for _ in 0..n_events {
        ctx.process_event()?;
        reporter.report(Progress::EventFinished);
    }
    reporter.report(Progress::EventLoopFinish);

    let summary = RunSummary {
        events: ctx.events_processed(),
        totals: ctx.totals().clone(),
    };
    info!(
        events = summary.events,
        containers = summary.totals.len(),
        "run complete"
    );
    Ok(summary)
}
