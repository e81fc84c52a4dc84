// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{anyhow, bail, Context, Result};
use std::collections::BTreeSet;
use std::env;
use std::path::PathBuf;

use supermarket_dashboard::{
    build_report, load_config, logging, Dataset, Dimension, FilterSelection, Page,
};

const USAGE: &str = "\
Usage:
  supermarket-dashboard [--config <file>] [tui]
  supermarket-dashboard [--config <file>] pages
  supermarket-dashboard [--config <file>] report <page> [--branch <b>]... [--city <c>]...
                        [--customer-type <t>]... [--gender <g>]...

Pages: overview, q1, q2, q3, q4, q5, q6
Omitted filter flags select every value.";

#[derive(Debug, Clone, PartialEq)]
enum Mode {
    Help,
    Tui,
    Pages,
    Report { page: Page, filters: ReportFilters },
}

/// Filter flags given on the command line. `None` means the flag was never given.
#[derive(Debug, Clone, Default, PartialEq)]
struct ReportFilters {
    branches: Option<Vec<String>>,
    cities: Option<Vec<String>>,
    customer_types: Option<Vec<String>>,
    genders: Option<Vec<String>>,
}

impl ReportFilters {
    fn push(&mut self, dimension: Dimension, value: String) {
        let slot = match dimension {
            Dimension::Branch => &mut self.branches,
            Dimension::City => &mut self.cities,
            Dimension::CustomerType => &mut self.customer_types,
            Dimension::Gender => &mut self.genders,
            Dimension::ProductLine | Dimension::Payment => return,
        };
        slot.get_or_insert_with(Vec::new).push(value);
    }

    /// Start from "everything selected" and narrow each dimension that was given
    fn selection(&self, dataset: &Dataset) -> FilterSelection {
        let mut selection = FilterSelection::all(dataset);
        let given = [
            (Dimension::Branch, &self.branches),
            (Dimension::City, &self.cities),
            (Dimension::CustomerType, &self.customer_types),
            (Dimension::Gender, &self.genders),
        ];
        for (dimension, values) in given {
            if let (Some(values), Some(set)) = (values, selection.set_mut(dimension)) {
                *set = values.iter().cloned().collect::<BTreeSet<_>>();
            }
        }
        selection
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Command {
    config: Option<PathBuf>,
    mode: Mode,
}

fn parse_args(args: &[String]) -> Result<Command> {
    let mut config = None;
    let mut positional = Vec::new();
    let mut filters = ReportFilters::default();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let dimension = match arg.as_str() {
            "--config" => {
                let path = iter.next().ok_or_else(|| anyhow!("--config needs a path"))?;
                config = Some(PathBuf::from(path));
                continue;
            }
            "--branch" => Dimension::Branch,
            "--city" => Dimension::City,
            "--customer-type" => Dimension::CustomerType,
            "--gender" => Dimension::Gender,
            "-h" | "--help" => {
                return Ok(Command {
                    config,
                    mode: Mode::Help,
                })
            }
            other if other.starts_with("--") => bail!("unknown flag {}\n\n{}", other, USAGE),
            other => {
                positional.push(other.to_string());
                continue;
            }
        };
        let value = iter
            .next()
            .ok_or_else(|| anyhow!("{} needs a value", arg))?;
        filters.push(dimension, value.clone());
    }

    let mode = match positional.first().map(String::as_str) {
        None | Some("tui") => Mode::Tui,
        Some("pages") => Mode::Pages,
        Some("report") => {
            let id = positional
                .get(1)
                .ok_or_else(|| anyhow!("report needs a page\n\n{}", USAGE))?;
            let page: Page = id.parse()?;
            Mode::Report { page, filters }
        }
        Some(other) => bail!("unknown command {}\n\n{}", other, USAGE),
    };

    Ok(Command { config, mode })
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let command = parse_args(&args)?;
    if command.mode == Mode::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = load_config(command.config.as_deref())?;
    let console = !matches!(command.mode, Mode::Tui);
    logging::initialize(&config.logging.level, config.log_file().as_deref(), console)?;
    tracing::info!(source = %config.source, "configuration loaded");

    if command.mode == Mode::Pages {
        for page in Page::ALL {
            println!("{:<9} {}: {}", page.id(), page.title(), page.question());
        }
        return Ok(());
    }

    let dataset_path = config.dataset_path();
    let dataset = Dataset::load(&dataset_path)
        .with_context(|| format!("Failed to load dataset {}", dataset_path.display()))?;

    match command.mode {
        Mode::Report { page, filters } => run_report(&dataset, page, &filters),
        _ => run_ui_mode(dataset),
    }
}

fn run_report(dataset: &Dataset, page: Page, filters: &ReportFilters) -> Result<()> {
    let selection = filters.selection(dataset);
    let report = build_report(dataset, &selection, page);
    if report.is_empty() {
        tracing::warn!(page = %page, "selection matched no records");
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(dataset: Dataset) -> Result<()> {
    tracing::info!(records = dataset.len(), "starting dashboard UI");

    let mut app = ui::App::new(&dataset);
    ui::run_ui(&mut app)?;

    tracing::info!("dashboard UI closed");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_dataset: Dataset) -> Result<()> {
    eprintln!("TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: supermarket-dashboard report <page>");
    std::process::exit(1);
}
