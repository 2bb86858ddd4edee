//! One-shot command execution.

use colored::Colorize;
use rscxml_chart::ChartDoc;
use rscxml_compiler::Compiler;
use rscxml_sim::{Event, FsResolver, RunOutcome, SimHost, Simulation};
use rscxml_tables::{MachineTable, StateKind};
use std::error::Error;
use std::path::Path;

pub type CmdResult = Result<String, Box<dyn Error>>;

/// Loads a chart document from disk.
pub fn load_chart(path: &Path) -> Result<ChartDoc, Box<dyn Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|err| format!("{}: {}", path.display(), err))?;
    Ok(ChartDoc::from_str(&text)?)
}

/// Compiles a chart, resolving invoked charts beside it.
pub fn compile_chart(path: &Path) -> Result<MachineTable, Box<dyn Error>> {
    let doc = load_chart(path)?;
    let resolver = FsResolver::beside(path);
    Ok(Compiler::with_resolver(&resolver).compile(&doc)?)
}

pub fn compile(chart: &Path, out: Option<&Path>, pretty: bool) -> CmdResult {
    let table = compile_chart(chart)?;
    let json = if pretty {
        serde_json::to_string_pretty(&table)?
    } else {
        serde_json::to_string(&table)?
    };

    match out {
        Some(out) => {
            std::fs::write(out, &json)?;
            Ok(format!(
                "{} {} ({} machine(s), {} bytes)",
                "Wrote".green(),
                out.display(),
                table.len(),
                json.len()
            ))
        }
        None => Ok(json),
    }
}

pub fn inspect(chart: &Path) -> CmdResult {
    let table = compile_chart(chart)?;
    Ok(render_table(&table))
}

/// Renders a human-readable summary of every machine in the table.
pub fn render_table(table: &MachineTable) -> String {
    let mut out = String::new();
    for (m, machine) in table.machines.iter().enumerate() {
        out.push_str(&format!(
            "{} {} (checksum {}, {} states, {} transitions{})\n",
            format!("machine {}", m).bold().cyan(),
            machine.name.as_deref().unwrap_or("<anonymous>"),
            machine.checksum,
            machine.nr_states(),
            machine.nr_transitions(),
            match machine.parent {
                Some(p) => format!(", parent {}", p),
                None => String::new(),
            }
        ));

        for state in &machine.states {
            out.push_str(&format!(
                "  [{:>3}] {:<20} {:<16} parent {:>3}{}\n",
                state.idx,
                state.name.as_deref().unwrap_or("-"),
                kind_label(state.kind, state.has_history),
                state.parent,
                if state.data.is_some() { "  +data" } else { "" }
            ));
        }

        for (i, t) in machine.transitions.iter().enumerate() {
            let targets: Vec<String> = t
                .target
                .iter()
                .map(|j| {
                    machine.states[j]
                        .name
                        .clone()
                        .unwrap_or_else(|| format!("#{}", j))
                })
                .collect();
            out.push_str(&format!(
                "  ({:>3}) {} --{}--> [{}]{}\n",
                i,
                machine.states[t.source]
                    .name
                    .as_deref()
                    .unwrap_or("-")
                    .yellow(),
                t.event.as_deref().unwrap_or("<spontaneous>"),
                targets.join(", "),
                match t.condition.as_deref() {
                    Some(cond) => format!(" if {}", cond),
                    None => String::new(),
                }
            ));
        }
    }
    out
}

fn kind_label(kind: StateKind, has_history: bool) -> String {
    let label = match kind {
        StateKind::Atomic => "atomic",
        StateKind::Parallel => "parallel",
        StateKind::Compound => "compound",
        StateKind::Final => "final",
        StateKind::HistoryDeep => "history:deep",
        StateKind::HistoryShallow => "history:shallow",
        StateKind::Initial => "initial",
    };
    if has_history {
        format!("{}+h", label)
    } else {
        label.to_string()
    }
}

pub fn run(
    chart: &Path,
    events: &[String],
    data: Option<&str>,
    max_steps: usize,
    trace: bool,
) -> CmdResult {
    let table = compile_chart(chart)?;

    let mut host = SimHost::new();
    if let Some(data) = data {
        host = host.with_data(serde_json::from_str(data)?);
    }
    let mut sim = Simulation::with_host(table, host);

    let mut out = String::new();
    let mut outcome = sim.run_to_quiescence(max_steps)?;
    out.push_str(&format!(
        "{} {}\n",
        "start".green(),
        sim.active_names().join(", ").yellow()
    ));

    for event in events {
        if outcome == RunOutcome::Done {
            out.push_str(&format!("{} {} (machine done)\n", "drop".dimmed(), event));
            continue;
        }
        outcome = sim.apply(Event::new(event.clone()), max_steps)?;
        out.push_str(&format!(
            "{} {} {}\n",
            event.cyan(),
            "→".dimmed(),
            sim.active_names().join(", ").yellow()
        ));
    }

    out.push_str(&format!(
        "{}\n",
        if sim.is_done() {
            "Reached top-level final.".green().to_string()
        } else {
            "Waiting for events.".dimmed().to_string()
        }
    ));

    if trace {
        out.push_str(&serde_json::to_string_pretty(sim.trace())?);
        out.push('\n');
    }

    Ok(out)
}
