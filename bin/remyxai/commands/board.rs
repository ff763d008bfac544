//! Board commands - manage MyxBoards

use crate::commands::evaluate::follow;
use crate::style::*;
use anyhow::Result;
use clap::Subcommand;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Table};
use remyxai::api::JobState;
use remyxai::{
    CollectionClient, EvaluationTask, MyxBoard, Orchestrator, OrchestratorConfig, RemoteService,
    RemyxClient, Settings, TaskOutcome,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Subcommand)]
pub enum BoardCommand {
    /// Create a board from a list of models (opens it if it already exists)
    Create {
        name: String,
        #[arg(required = true, num_args = 1..)]
        models: Vec<String>,
    },
    /// Create a board from the models of a Hugging Face collection
    FromCollection {
        /// Collection slug, e.g. remyxai/llms-6657a9f5b6e3d5c2a1f2b3c4
        collection: String,
    },
    /// List stored boards
    List,
    /// Show a board's models and job table
    Show { name: String },
    /// Print results, or job status for tasks still running.
    /// Jobs still in flight are polled once first.
    Results {
        name: String,
        #[arg(long)]
        task: Option<EvaluationTask>,
        /// Print raw JSON instead of tables
        #[arg(long)]
        json: bool,
        /// Only read the stored board, do not poll running jobs
        #[arg(long)]
        cached: bool,
    },
    /// Resume polling a board's running jobs until they finish
    Watch {
        name: String,
        /// Seconds between status polls
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Delete a board
    Delete { name: String },
    /// List the models a board may contain
    Models,
}

pub async fn run(cmd: BoardCommand, client: Arc<RemyxClient>, settings: &Settings) -> Result<()> {
    let service: Arc<dyn RemoteService> = client;
    match cmd {
        BoardCommand::Create { name, models } => {
            let board =
                MyxBoard::create(service, &name, models, &settings.supported_models()).await?;
            print_success(&format!("Board {} ready", paint(Tone::Bold, board.name())));
            print_board(&board);
        }
        BoardCommand::FromCollection { collection } => {
            let collections = CollectionClient::default();
            let board = MyxBoard::from_collection(
                service,
                &collections,
                &collection,
                &settings.supported_models(),
            )
            .await?;
            print_success(&format!("Board {} ready", paint(Tone::Bold, board.name())));
            print_board(&board);
        }
        BoardCommand::List => {
            let boards = service.list_boards().await?;
            if boards.is_empty() {
                print_info("No boards stored yet");
                return Ok(());
            }
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Board", "Models"]);
            for board in boards {
                table.add_row(vec![board.name, board.models.join(", ")]);
            }
            println!("{table}");
        }
        BoardCommand::Show { name } => {
            let board = MyxBoard::load(service, &name).await?;
            print_board(&board);
        }
        BoardCommand::Results {
            name,
            task,
            json,
            cached,
        } => {
            let mut board = MyxBoard::load(service, &name).await?;
            if !cached && !board.tracked_jobs().is_empty() {
                if let Err(e) = board.poll_once().await {
                    print_warning(&format!("Could not refresh job status: {:#}", e));
                }
            }
            let outcomes = board.get_results(task);
            if json {
                println!("{}", serde_json::to_string_pretty(&outcomes)?);
            } else {
                print_outcomes(&outcomes);
            }
        }
        BoardCommand::Watch { name, interval } => {
            let board = MyxBoard::load(service.clone(), &name).await?;
            if board.tracked_jobs().is_empty() {
                print_info(&format!("No jobs in flight on {}", board.name()));
                print_outcomes(&board.get_results(None));
                return Ok(());
            }
            let mut config = OrchestratorConfig::from(settings);
            if let Some(secs) = interval {
                config.poll_interval_secs = secs.max(1);
            }
            let handle = Orchestrator::new(service, config).watch(board);
            follow(handle).await?;
        }
        BoardCommand::Delete { name } => {
            let board = MyxBoard::load(service, &name).await?;
            board.delete().await?;
            print_success(&format!("Deleted board {}", name));
        }
        BoardCommand::Models => {
            for model in settings.supported_models().list() {
                println!("{}", model);
            }
        }
    }
    Ok(())
}

fn print_board(board: &MyxBoard) {
    print_header(&format!("MyxBoard {}", board.name()));
    print_key_value("Storage key", &board.sanitized_name());
    if let Some(collection) = board.source_collection() {
        print_key_value("Collection", collection);
    }

    print_section("Models");
    print_models(board.models());

    if !board.job_status().is_empty() {
        print_section("Jobs");
        for (task, entry) in board.job_status() {
            print_key_value(
                task.as_str(),
                format!("{} ({})", status_label(entry.status), entry.job_name),
            );
        }
    }
    println!();
}

/// Render results per task; tasks without results show their job status
pub fn print_outcomes(outcomes: &BTreeMap<EvaluationTask, TaskOutcome>) {
    if outcomes.is_empty() {
        print_info("No evaluations on this board yet");
        return;
    }

    for (task, outcome) in outcomes {
        print_section(task.as_str());
        match outcome {
            TaskOutcome::Status { status, job_name } => {
                print_key_value("Status", status_label(*status));
                print_key_value("Job", job_name);
                if *status == JobState::Failed {
                    print_warning("Job failed, no results were produced");
                }
            }
            TaskOutcome::Results(results) => {
                let mut table = Table::new();
                table.load_preset(UTF8_FULL);
                if task.is_ranked() {
                    table.set_header(vec!["Rank", "Model"]);
                    let mut rows: Vec<_> = results
                        .iter()
                        .map(|r| (r.rank().unwrap_or(i64::MAX), r.model_name()))
                        .collect();
                    rows.sort_by_key(|(rank, _)| *rank);
                    for (rank, model) in rows {
                        let rank = if rank == i64::MAX {
                            "-".to_string()
                        } else {
                            rank.to_string()
                        };
                        table.add_row(vec![Cell::new(rank), Cell::new(model)]);
                    }
                } else {
                    let metrics: BTreeSet<&String> =
                        results.iter().flat_map(|r| r.results.keys()).collect();
                    let mut header = vec!["Model".to_string()];
                    header.extend(metrics.iter().map(|m| m.to_string()));
                    table.set_header(header);
                    for result in results {
                        let mut row = vec![Cell::new(result.model_name())];
                        for metric in &metrics {
                            let value = result
                                .results
                                .get(*metric)
                                .map(|v| v.to_string())
                                .unwrap_or_else(|| "-".to_string());
                            row.push(Cell::new(value));
                        }
                        table.add_row(row);
                    }
                }
                println!("{table}");
            }
        }
    }
    println!();
}
