use log::{debug, info, warn};

use hare_clark::builder::Builder;
use hare_clark::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::hcv::config_reader::*;
use crate::hcv::io_common::{keep_last_by_id, simplify_file_name, split_positions};
use crate::hcv::io_csv::read_csv_rows;

pub mod config_reader;
mod io_common;
mod io_csv;

#[derive(Debug, Snafu)]
pub enum HcvError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading JSON content"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a positive number or a column name, found {found}"))]
    ParsingJsonNumber { found: String },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},

    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of the CSV file"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Line {lineno} of the CSV file is too short"))]
    CsvLineTooShort { lineno: usize },

    #[snafu(display("Invalid configuration"))]
    Configuration { source: CountError },
    #[snafu(display("Count failed for position {position}"))]
    Counting { source: CountError, position: String },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type HcvResult<T> = Result<T, HcvError>;

/// The outcome of the count of one position.
#[derive(PartialEq, Debug, Clone)]
pub struct PositionOutcome {
    pub name: String,
    pub vacancies: u32,
    pub result: CountResult,
}

// Weights are fractional after a surplus transfer. Four decimals are enough to follow a count.
fn format_weight(w: f64) -> String {
    let s = format!("{:.4}", w);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn transfers_to_json(ts: &TransferStats) -> JSValue {
    let mut transfers: JSMap<String, JSValue> = JSMap::new();
    for (name, w) in ts.transfers.iter() {
        transfers.insert(name.clone(), json!(format_weight(*w)));
    }
    if ts.exhausted > 0.0 {
        transfers.insert("exhausted".to_string(), json!(format_weight(ts.exhausted)));
    }
    JSValue::Object(transfers)
}

fn result_stats_to_json(rs: &CountResult) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    for round_stat in rs.round_stats.iter() {
        let mut tally: JSMap<String, JSValue> = JSMap::new();
        for (name, w) in round_stat.tally.iter() {
            tally.insert(name.clone(), json!(format_weight(*w)));
        }

        let mut tally_results: Vec<JSValue> = Vec::new();
        for winner_name in round_stat.elected.iter() {
            // Candidates elected because the seats left match the candidates left have no surplus.
            let surplus = round_stat
                .transfers
                .iter()
                .find(|ts| ts.reason == TransferReason::Surplus && ts.from == *winner_name);
            match surplus {
                Some(ts) => tally_results.push(json!({
                    "elected": winner_name,
                    "transferValue": format_weight(ts.transfer_value),
                    "transfers": transfers_to_json(ts)
                })),
                None => tally_results.push(json!({
                    "elected": winner_name,
                    "transfers": {}
                })),
            }
        }
        for ts in round_stat
            .transfers
            .iter()
            .filter(|ts| ts.reason == TransferReason::Exclusion)
        {
            tally_results.push(json!({
                "excluded": ts.from,
                "transfers": transfers_to_json(ts)
            }));
        }

        let js = json!({"round": round_stat.round, "tally": tally, "tallyResults": tally_results});
        l.push(js);
    }
    l
}

fn position_summary_js(outcome: &PositionOutcome) -> JSValue {
    let pre_exclusion: Vec<JSValue> = outcome
        .result
        .pre_exclusion_transfers
        .iter()
        .map(|ts| json!({"excluded": ts.from, "transfers": transfers_to_json(ts)}))
        .collect();
    json!({
        "position": outcome.name,
        "vacancies": outcome.vacancies,
        "threshold": outcome.result.quota.to_string(),
        "elected": outcome.result.elected,
        "preExcluded": pre_exclusion,
        "results": result_stats_to_json(&outcome.result)
    })
}

fn build_summary_js(config: &HcvConfig, outcomes: &[PositionOutcome]) -> JSValue {
    let c = OutputConfig {
        contest: config.output_settings.contest_name.clone(),
        date: config.output_settings.contest_date.clone(),
    };
    let positions: Vec<JSValue> = outcomes.iter().map(position_summary_js).collect();
    json!({
        "config": c,
        "positions": positions
    })
}

/// Reads the ballots of the source and counts every position, in the order of the configuration.
///
/// With `excludeElected`, the candidates elected to a position are excluded before
/// counting the following ones, on top of the `pre_excluded` candidates.
pub fn run_positions(
    config: &HcvConfig,
    source_path: &Path,
    pre_excluded: &[String],
    verbose: bool,
) -> HcvResult<Vec<PositionOutcome>> {
    let rules = config.rules.count_rules()?;
    let exclude_elected = config.rules.exclude_elected()?;
    let layout = config.source.layout()?;
    if config.positions.is_empty() {
        whatever!("No position to count in the configuration");
    }
    if layout == SourceLayout::Single && config.positions.len() > 1 {
        whatever!(
            "The single layout holds exactly one position, found {}",
            config.positions.len()
        );
    }

    let p = source_path.display().to_string();
    info!("Attempting to read ballot file {:?}", p);
    let mut rows = read_csv_rows(&p, &config.source)?;
    if config.source.id_column_index.is_some() {
        rows = keep_last_by_id(rows);
    }
    let ballots_by_position = split_positions(&rows, &config.positions, layout);

    let mut excluded: Vec<String> = pre_excluded.to_vec();
    let mut outcomes: Vec<PositionOutcome> = Vec::new();
    for (idx, (pc, ballots)) in config
        .positions
        .iter()
        .zip(ballots_by_position)
        .enumerate()
    {
        let name = pc.display_name(idx);
        info!(
            "Counting position {} ({} vacancies, {} candidates)",
            name,
            pc.vacancies,
            pc.candidates.len()
        );
        let mut builder = Builder::new(&rules)
            .and_then(|b| b.vacancies(pc.vacancies))
            .and_then(|b| b.candidates(&pc.candidates))
            .context(CountingSnafu {
                position: name.clone(),
            })?;
        let total = ballots.len();
        for b in ballots.iter() {
            builder.add_ballot_simple(b).context(CountingSnafu {
                position: name.clone(),
            })?;
        }
        let mut position = builder.build().context(CountingSnafu {
            position: name.clone(),
        })?;
        if position.n_ballots() < total {
            warn!(
                "Position {}: {} of {} ballots are invalid and were dropped",
                name,
                total - position.n_ballots(),
                total
            );
        }
        debug!("run_positions: excluded before counting {}: {:?}", name, excluded);
        let elected = position.count(&excluded, verbose).context(CountingSnafu {
            position: name.clone(),
        })?;
        if exclude_elected {
            excluded.extend(elected);
        }
        let result = position
            .result()
            .context(CountingSnafu {
                position: name.clone(),
            })?
            .clone();
        outcomes.push(PositionOutcome {
            name,
            vacancies: pc.vacancies,
            result,
        });
    }
    Ok(outcomes)
}

fn config_from_args(args: &Args) -> HcvResult<HcvConfig> {
    let input = match &args.input {
        Some(i) => i.clone(),
        None => whatever!("Either --config or --input must be provided"),
    };
    let candidates = match &args.candidates {
        Some(c) if !c.is_empty() => c.clone(),
        _ => whatever!("--candidates is required when no configuration file is given"),
    };
    Ok(HcvConfig {
        output_settings: OutputSettings {
            contest_name: simplify_file_name(&input),
            output_directory: None,
            contest_date: None,
        },
        source: FileSource {
            file_path: input,
            layout: Some("single".to_string()),
            _first_vote_row_index: None,
            id_column_index: None,
            ignore_columns: None,
        },
        positions: vec![PositionConfig {
            name: None,
            vacancies: args.vacancies.unwrap_or(1),
            candidates,
        }],
        rules: HcvRules::default(),
    })
}

// Command line flags win over the configuration file.
fn apply_overrides(config: &mut HcvConfig, args: &Args) {
    if args.header {
        config.source._first_vote_row_index = Some(json!(2));
    }
    if args.optional_preferences {
        config.rules.optional_preferences = Some(JSValue::Bool(true));
    }
    if args.raise_invalid {
        config.rules.raise_on_invalid = Some(JSValue::Bool(true));
    }
}

fn check_reference(reference_path: &str, pretty_js_stats: &str) -> HcvResult<()> {
    let summary_ref = read_summary(reference_path)?;
    debug!("summary: {:?}", summary_ref);
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference summary {}", reference_path);
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    Ok(())
}

fn write_summary(path: &Path, pretty_js_stats: &str) -> HcvResult<()> {
    let p = path.display().to_string();
    info!("Writing summary to {}", p);
    fs::write(path, pretty_js_stats).context(WritingSummarySnafu { path: p })
}

pub fn run_election_cli(args: &Args) -> HcvResult<()> {
    let (mut config, root_p): (HcvConfig, PathBuf) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root_p = Path::new(config_path)
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (config, root_p)
        }
        None => (config_from_args(args)?, PathBuf::new()),
    };
    apply_overrides(&mut config, args);
    info!("config: {:?}", config);

    let source_path: PathBuf = match &args.input {
        Some(input) => PathBuf::from(input),
        None => root_p.join(&config.source.file_path),
    };
    let pre_excluded: Vec<String> = args.exclude.clone().unwrap_or_default();

    let outcomes = run_positions(&config, &source_path, &pre_excluded, args.verbose)?;
    for o in outcomes.iter() {
        println!("{}: {}", o.name, o.result.elected.join(", "));
    }

    let result_js = build_summary_js(&config, &outcomes);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    match args.out.as_deref() {
        Some("stdout") => println!("{}", pretty_js_stats),
        Some(out) => write_summary(Path::new(out), &pretty_js_stats)?,
        None => {
            if let Some(dir) = &config.output_settings.output_directory {
                let p = root_p
                    .join(dir)
                    .join(format!("{}_summary.json", config.output_settings.contest_name));
                write_summary(&p, &pretty_js_stats)?;
            }
        }
    }

    // The reference summary, if provided for comparison
    if let Some(reference_path) = &args.reference {
        check_reference(reference_path, &pretty_js_stats)?;
    }
    Ok(())
}
