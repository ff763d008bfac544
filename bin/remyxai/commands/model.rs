//! Model commands

use crate::style::*;
use anyhow::Result;
use clap::Subcommand;
use remyxai::RemyxClient;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum ModelCommand {
    /// List trained models
    List,
    /// Show a model's summary
    Summary { model_name: String },
    /// Delete a model
    Delete { model_name: String },
    /// Download a converted model archive
    Download {
        model_name: String,
        /// Export format, e.g. onnx, tflite
        #[arg(long, default_value = "onnx")]
        format: String,
        /// Directory to write the archive to
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },
}

pub async fn run(cmd: ModelCommand, client: &RemyxClient) -> Result<()> {
    match cmd {
        ModelCommand::List => print_json(&client.list_models().await?),
        ModelCommand::Summary { model_name } => {
            print_header(&format!("Model {}", model_name));
            print_json(&client.model_summary(&model_name).await?);
        }
        ModelCommand::Delete { model_name } => {
            client.delete_model(&model_name).await?;
            print_success(&format!("Deleted model {}", model_name));
        }
        ModelCommand::Download {
            model_name,
            format,
            output,
        } => {
            let path = client.download_model(&model_name, &format, &output).await?;
            print_success(&format!("Saved {}", path.display()));
        }
    }
    Ok(())
}
