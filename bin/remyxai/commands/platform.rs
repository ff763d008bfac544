//! Account and storage commands

use crate::style::*;
use anyhow::Result;
use clap::Subcommand;
use remyxai::RemyxClient;

#[derive(Subcommand)]
pub enum UserCommand {
    /// Show the account profile
    Profile,
    /// Show remaining credits
    Credits,
}

#[derive(Subcommand)]
pub enum EvaluationCommand {
    /// List stored evaluations
    List,
    /// Delete a stored evaluation
    Delete {
        /// Evaluation type, e.g. myxmatch
        eval_type: String,
        eval_name: String,
    },
}

#[derive(Subcommand)]
pub enum DatasetCommand {
    /// List datasets
    List,
    /// Print a download URL for a dataset
    Download {
        dataset_type: String,
        dataset_name: String,
    },
    /// Delete a dataset
    Delete {
        dataset_type: String,
        dataset_name: String,
    },
}

pub async fn run_user(cmd: UserCommand, client: &RemyxClient) -> Result<()> {
    match cmd {
        UserCommand::Profile => print_json(&client.user_profile().await?),
        UserCommand::Credits => print_json(&client.user_credits().await?),
    }
    Ok(())
}

pub async fn run_evaluation(cmd: EvaluationCommand, client: &RemyxClient) -> Result<()> {
    match cmd {
        EvaluationCommand::List => print_json(&client.list_evaluations().await?),
        EvaluationCommand::Delete {
            eval_type,
            eval_name,
        } => {
            client.delete_evaluation(&eval_type, &eval_name).await?;
            print_success(&format!("Deleted evaluation {}", eval_name));
        }
    }
    Ok(())
}

pub async fn run_dataset(cmd: DatasetCommand, client: &RemyxClient) -> Result<()> {
    match cmd {
        DatasetCommand::List => print_json(&client.list_datasets().await?),
        DatasetCommand::Download {
            dataset_type,
            dataset_name,
        } => {
            let url = client
                .dataset_download_url(&dataset_type, &dataset_name)
                .await?;
            print_key_value("Download URL", &url);
        }
        DatasetCommand::Delete {
            dataset_type,
            dataset_name,
        } => {
            client.delete_dataset(&dataset_type, &dataset_name).await?;
            print_success(&format!("Deleted dataset {}", dataset_name));
        }
    }
    Ok(())
}
