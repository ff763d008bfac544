//! Evaluate command - submit tasks for a board and watch them finish

use crate::commands::board::print_outcomes;
use crate::style::*;
use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use remyxai::{
    EvaluationHandle, EvaluationRequest, EvaluationTask, MyxBoard, Orchestrator,
    OrchestratorConfig, RemoteService, RemyxClient, Settings,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Args)]
pub struct EvaluateArgs {
    /// Board to evaluate
    #[arg(long)]
    board: String,

    /// Models for a new board (comma separated); omit to use an existing board
    #[arg(long, value_delimiter = ',')]
    models: Vec<String>,

    /// Tasks to run (myxmatch, benchmark)
    #[arg(long, value_delimiter = ',', required = true)]
    tasks: Vec<EvaluationTask>,

    /// Prompt for myxmatch
    #[arg(long)]
    prompt: Option<String>,

    /// Benchmark suites (comma separated)
    #[arg(long = "eval-tasks", value_delimiter = ',')]
    eval_tasks: Vec<String>,

    /// Return after submission instead of waiting for results
    #[arg(long)]
    no_wait: bool,

    /// Seconds between status polls
    #[arg(long)]
    interval: Option<u64>,
}

pub async fn run(args: EvaluateArgs, client: Arc<RemyxClient>, settings: &Settings) -> Result<()> {
    let request = EvaluationRequest {
        tasks: args.tasks,
        prompt: args.prompt,
        eval_tasks: args.eval_tasks,
    };
    request.validate()?;

    let service: Arc<dyn RemoteService> = client;
    let board = if args.models.is_empty() {
        MyxBoard::load(service.clone(), &args.board)
            .await
            .context("Board does not exist; pass --models to create it")?
    } else {
        MyxBoard::create(
            service.clone(),
            &args.board,
            args.models,
            &settings.supported_models(),
        )
        .await?
    };

    let mut config = OrchestratorConfig::from(settings);
    if let Some(secs) = args.interval {
        config.poll_interval_secs = secs.max(1);
    }
    let orchestrator = Orchestrator::new(service, config);
    let handle = orchestrator.evaluate(board, request).await?;

    {
        let board = handle.board();
        let board = board.lock().await;
        print_header(&format!("Evaluating {}", board.name()));
        for (task, entry) in board.job_status() {
            print_key_value(task.as_str(), &entry.job_name);
        }
        println!();
    }
    for e in handle.errors() {
        print_warning(&format!("{:#}", e));
    }

    if args.no_wait {
        handle.abort();
        print_info(&format!(
            "Jobs submitted. Resume polling with: remyxai board watch {}",
            args.board
        ));
        return Ok(());
    }

    follow(handle).await
}

/// Show a spinner until the poll loop ends, then print the board.
/// Ctrl-C stops waiting without touching the remote jobs.
pub async fn follow(handle: EvaluationHandle) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} [{elapsed_precise}] {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message("waiting for jobs");

    let board = handle.board();
    while !handle.is_finished() {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(1)) => {
                let summary: Vec<String> = board
                    .lock()
                    .await
                    .job_status()
                    .iter()
                    .map(|(task, entry)| format!("{} {}", task, entry.status))
                    .collect();
                spinner.set_message(summary.join(", "));
            }
            _ = tokio::signal::ctrl_c() => {
                spinner.finish_and_clear();
                handle.abort();
                print_warning("Stopped waiting; jobs keep running remotely. Resume with: remyxai board watch");
                return Ok(());
            }
        }
    }
    spinner.finish_and_clear();

    let board = handle.wait().await?;
    let board = board.lock().await;
    print_success(&format!("Evaluation on {} finished", paint(Tone::Bold, board.name())));
    print_section("Models");
    print_models(board.models());
    print_outcomes(&board.get_results(None));
    Ok(())
}
