//! Train commands

use crate::style::*;
use anyhow::Result;
use clap::{Args, Subcommand};
use remyxai::RemyxClient;

#[derive(Args)]
pub struct LabelledTraining {
    /// Name for the trained model
    model_name: String,
    /// Class labels (comma separated)
    #[arg(long, value_delimiter = ',', required = true)]
    labels: Vec<String>,
    /// Model size selector
    #[arg(long, default_value = "small")]
    model_selector: String,
    /// Hugging Face dataset to train on instead of generated data
    #[arg(long)]
    hf_dataset: Option<String>,
}

#[derive(Subcommand)]
pub enum TrainCommand {
    /// Train an image classifier
    Classify(LabelledTraining),
    /// Train an object detector
    Detect(LabelledTraining),
    /// Fine-tune a text generator on a Hugging Face dataset
    Generate {
        model_name: String,
        #[arg(long)]
        hf_dataset: String,
    },
}

pub async fn run(cmd: TrainCommand, client: &RemyxClient) -> Result<()> {
    let response = match cmd {
        TrainCommand::Classify(args) => {
            client
                .train_classifier(
                    &args.model_name,
                    &args.labels,
                    &args.model_selector,
                    args.hf_dataset.as_deref(),
                )
                .await?
        }
        TrainCommand::Detect(args) => {
            client
                .train_detector(
                    &args.model_name,
                    &args.labels,
                    &args.model_selector,
                    args.hf_dataset.as_deref(),
                )
                .await?
        }
        TrainCommand::Generate {
            model_name,
            hf_dataset,
        } => client.train_generator(&model_name, &hf_dataset).await?,
    };

    print_success("Training job submitted");
    print_json(&response);
    Ok(())
}
