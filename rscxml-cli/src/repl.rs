//! Interactive REPL.

use crate::commands;
use colored::Colorize;
use rscxml_sim::{Event, Simulation};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use std::path::{Path, PathBuf};

const HELP_TEXT: &str = r#"
Available commands:
  help                      Show this help
  load <chart.json>         Compile a chart and start a fresh run
  table                     Show the compiled tables
  start                     Run to quiescence from the initial state
  post <event> [json]       Queue an external event (optional payload)
  run                       Step until quiescent or done
  apply <event> [json]      post + run
  step                      Execute exactly one macro-step
  config                    Show the active states
  data                      Show the datamodel
  trace [n]                 Show the last n trace entries (default 10)
  reset                     Restart the loaded chart from scratch
  quit, exit                Exit the REPL
"#;

struct Repl {
    chart: Option<PathBuf>,
    sim: Option<Simulation>,
}

pub fn run(chart: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "rscxml REPL".bold().cyan());

    let mut repl = Repl { chart: None, sim: None };
    if let Some(path) = chart {
        match repl.load(&path) {
            Ok(message) => println!("{}", message),
            Err(err) => println!("{}: {}", "Error".red(), err),
        }
    }

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(config)?;

    let history_path = std::env::var("HOME")
        .map(|home| PathBuf::from(home).join(".rscxml_history"))
        .unwrap_or_else(|_| ".rscxml_history".into());
    let _ = rl.load_history(&history_path);

    println!("Type 'help' for available commands.\n");

    loop {
        let prompt = format!("{} ", "rscxml>".cyan());
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match repl.execute(line) {
                    Ok(Some(output)) => println!("{}\n", output),
                    Ok(None) => break,
                    Err(err) => println!("{}: {}\n", "Error".red(), err),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                println!("{}: {:?}", "Error".red(), err);
                break;
            }
        }
    }

    let _ = rl.save_history(&history_path);
    Ok(())
}

const MAX_STEPS: usize = 256;

impl Repl {
    fn load(&mut self, path: &Path) -> Result<String, Box<dyn std::error::Error>> {
        let table = commands::compile_chart(path)?;
        let summary = format!(
            "{} {} ({} machine(s), {} states)",
            "Loaded".green(),
            path.display(),
            table.len(),
            table.root().nr_states()
        );
        self.chart = Some(path.to_path_buf());
        self.sim = Some(Simulation::new(table));
        Ok(summary)
    }

    fn sim(&mut self) -> Result<&mut Simulation, Box<dyn std::error::Error>> {
        self.sim
            .as_mut()
            .ok_or_else(|| "no chart loaded; use 'load <chart.json>'".into())
    }

    fn config_line(sim: &Simulation) -> String {
        let names = sim.active_names().join(", ");
        if sim.is_done() {
            format!("{} ({})", names.yellow(), "done".green())
        } else {
            names.yellow().to_string()
        }
    }

    fn execute(&mut self, line: &str) -> Result<Option<String>, Box<dyn std::error::Error>> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();
        let args = &parts[1..];

        match cmd.as_str() {
            "help" | "?" => Ok(Some(HELP_TEXT.to_string())),

            "quit" | "exit" | "q" => Ok(None),

            "load" | "l" => {
                if args.is_empty() {
                    return Ok(Some("Usage: load <chart.json>".to_string()));
                }
                let message = self.load(Path::new(args[0]))?;
                Ok(Some(message))
            }

            "table" | "t" => {
                let sim = self.sim()?;
                Ok(Some(commands::render_table(sim.table())))
            }

            "start" | "run" | "r" => {
                let sim = self.sim()?;
                sim.run_to_quiescence(MAX_STEPS)?;
                Ok(Some(Self::config_line(sim)))
            }

            "post" | "p" | "apply" | "a" => {
                if args.is_empty() {
                    return Ok(Some(format!("Usage: {} <event> [payload_json]", cmd)));
                }
                let data = args
                    .get(1)
                    .map(|text| serde_json::from_str(text))
                    .transpose()?
                    .unwrap_or(serde_json::Value::Null);
                let event = Event::with_data(args[0], data);

                let sim = self.sim()?;
                sim.post(event);
                if cmd.starts_with('p') {
                    return Ok(Some(format!("queued {}", args[0].cyan())));
                }
                sim.run_to_quiescence(MAX_STEPS)?;
                Ok(Some(Self::config_line(sim)))
            }

            "step" | "s" => {
                let sim = self.sim()?;
                match sim.step() {
                    Ok(()) => Ok(Some(Self::config_line(sim))),
                    Err(err) => Ok(Some(format!("{} ({})", Self::config_line(sim), err))),
                }
            }

            "config" | "c" => {
                let sim = self.sim()?;
                Ok(Some(Self::config_line(sim)))
            }

            "data" | "d" => {
                let sim = self.sim()?;
                Ok(Some(serde_json::to_string_pretty(sim.host().data())?))
            }

            "trace" => {
                let count: usize = args.first().and_then(|s| s.parse().ok()).unwrap_or(10);
                let sim = self.sim()?;
                let trace = sim.trace();
                let shown = &trace[trace.len().saturating_sub(count)..];
                if shown.is_empty() {
                    return Ok(Some("No trace entries".dimmed().to_string()));
                }
                Ok(Some(serde_json::to_string_pretty(shown)?))
            }

            "reset" => {
                let path = self
                    .chart
                    .clone()
                    .ok_or("no chart loaded; use 'load <chart.json>'")?;
                let message = self.load(&path)?;
                Ok(Some(format!("{} (fresh context)", message)))
            }

            _ => Ok(Some(format!(
                "Unknown command: {}. Type 'help' for help.",
                cmd
            ))),
        }
    }
}
