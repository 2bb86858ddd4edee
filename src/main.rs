//! rscxml - Statechart scenario runner
//!
//! Compiles a chart, feeds it a scripted list of events, and logs the
//! configuration trajectory. The scenario file is JSON:
//!
//! ```json
//! {
//!   "chart": "charts/microwave.json",
//!   "data": {"power": 5},
//!   "events": [{"name": "turn.on"}, {"name": "door.open"}],
//!   "max_steps": 256
//! }
//! ```
//!
//! `chart` is a path relative to the scenario file, or an inline chart
//! document.

use rscxml_chart::ChartDoc;
use rscxml_compiler::Compiler;
use rscxml_sim::{Event, FsResolver, RunOutcome, SimHost, Simulation};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct Scenario {
    chart: ChartSource,

    #[serde(default)]
    data: serde_json::Value,

    #[serde(default)]
    events: Vec<Event>,

    #[serde(default = "default_max_steps")]
    max_steps: usize,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChartSource {
    Path(String),
    Inline(Box<ChartDoc>),
}

fn default_max_steps() -> usize {
    256
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Scenario from the command line, or from RSCXML_SCENARIO.
    let scenario_path = match std::env::args().nth(1) {
        Some(path) => PathBuf::from(path),
        None => match std::env::var("RSCXML_SCENARIO") {
            Ok(path) => PathBuf::from(path),
            Err(_) => {
                eprintln!("usage: rscxml <scenario.json>  (or set RSCXML_SCENARIO)");
                std::process::exit(2);
            }
        },
    };

    let text = std::fs::read_to_string(&scenario_path)?;
    let scenario: Scenario = serde_json::from_str(&text)?;
    let base = scenario_path.parent().unwrap_or(Path::new("."));

    let doc = match &scenario.chart {
        ChartSource::Path(rel) => {
            let chart_path = base.join(rel);
            tracing::info!("Loading chart {}", chart_path.display());
            ChartDoc::from_str(&std::fs::read_to_string(&chart_path)?)?
        }
        ChartSource::Inline(doc) => (**doc).clone(),
    };

    let resolver = FsResolver::new(base);
    let table = Compiler::with_resolver(&resolver).compile(&doc)?;
    tracing::info!(
        "Compiled {} machine(s), top: {} states, {} transitions",
        table.len(),
        table.root().nr_states(),
        table.root().nr_transitions()
    );

    // An omitted datamodel still has to be an object for assignments.
    let data = if scenario.data.is_null() {
        serde_json::json!({})
    } else {
        scenario.data.clone()
    };
    let host = SimHost::new().with_data(data);
    let mut sim = Simulation::with_host(table, host);

    let mut outcome = sim.run_to_quiescence(scenario.max_steps)?;
    tracing::info!("start -> [{}]", sim.active_names().join(", "));

    for event in scenario.events {
        if outcome == RunOutcome::Done {
            tracing::warn!("machine done, dropping event '{}'", event.name);
            continue;
        }
        let name = event.name.clone();
        outcome = sim.apply(event, scenario.max_steps)?;
        tracing::info!("{} -> [{}]", name, sim.active_names().join(", "));
    }

    if sim.is_done() {
        tracing::info!("Reached top-level final");
    } else {
        tracing::info!("Quiescent, waiting for events");
    }

    println!("{}", serde_json::to_string_pretty(sim.trace())?);
    Ok(())
}
