//! HTTP client for the Remyx engine API
//!
//! Every call is one-shot: non-success statuses become [`Error::Status`],
//! transport failures [`Error::Http`], and a success status with a body that
//! does not decode becomes [`Error::InvalidResponse`]. Nothing here retries.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info};

use super::service::RemoteService;
use super::types::{BoardSummary, JobHandle, JobStatusResponse, TaskParams};
use crate::config::{ClientConfig, SupportedModels};
use crate::error::{Error, Result};
use crate::myxboard::{BoardRecord, EvaluationTask};

/// Bare non-finite literals that some producers write into JSON bodies.
/// String literals match the first branch so text inside them is left alone.
static NON_FINITE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(?:[^"\\]|\\.)*"|(?P<lead>[:\[,]\s*)-?(?:Infinity|NaN)\b"#)
        .expect("valid non-finite token regex")
});

/// Client for the Remyx engine REST API
pub struct RemyxClient {
    client: Client,
    config: ClientConfig,
}

impl RemyxClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Url::parse(&config.base_url)
            .map_err(|e| Error::Config(format!("invalid base URL {}: {}", config.base_url, e)))?;
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client, config })
    }

    /// Build an endpoint URL; each segment is percent-encoded on its own.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| Error::Config(format!("invalid base URL {}: {}", self.config.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("base URL {} cannot be a base", self.config.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send with credentials and return the body of a success response
    async fn send(&self, request: RequestBuilder, endpoint: &str) -> Result<String> {
        let response = request
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| {
                error!(endpoint, error = %e, "Request failed");
                Error::Http(e)
            })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(endpoint, status = status.as_u16(), body = %body, "API call failed");
            return Err(Error::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        debug!(endpoint, status = status.as_u16(), "API call successful");
        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let endpoint = segments.join("/");
        let url = self.url(segments)?;
        debug!(url = %url, "GET");
        let body = self.send(self.client.get(url), &endpoint).await?;
        decode(&endpoint, &body)
    }

    /// GET returning the `message` field of the envelope (or the whole body)
    async fn get_message(&self, segments: &[&str]) -> Result<Value> {
        let value: Value = self.get_json(segments).await?;
        Ok(unwrap_message(value))
    }

    async fn post_json(&self, segments: &[&str]) -> Result<Value> {
        let endpoint = segments.join("/");
        let url = self.url(segments)?;
        debug!(url = %url, "POST");
        let body = self.send(self.client.post(url), &endpoint).await?;
        decode(&endpoint, &body)
    }

    async fn delete_json(&self, segments: &[&str]) -> Result<Value> {
        let endpoint = segments.join("/");
        let url = self.url(segments)?;
        debug!(url = %url, "DELETE");
        let body = self.send(self.client.delete(url), &endpoint).await?;
        decode(&endpoint, &body)
    }

    // ---------------------------------------------------------------------
    // Models
    // ---------------------------------------------------------------------

    pub async fn list_models(&self) -> Result<Value> {
        self.get_json(&["model", "list"]).await
    }

    pub async fn model_summary(&self, model_name: &str) -> Result<Value> {
        self.get_json(&["model", "summary", model_name]).await
    }

    pub async fn delete_model(&self, model_name: &str) -> Result<Value> {
        self.post_json(&["model", "delete", model_name]).await
    }

    /// Download a converted model archive into `dest_dir`, returning the file path
    pub async fn download_model(
        &self,
        model_name: &str,
        model_format: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf> {
        let segments = ["model", "download", model_name, model_format];
        let endpoint = segments.join("/");
        let url = self.url(&segments)?;
        debug!(url = %url, "POST");

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(endpoint = %endpoint, status = status.as_u16(), "Model download failed");
            return Err(Error::Status {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(attachment_filename)
            .or_else(|| plain_file_name(&format!("{}.zip", model_name)))
            .unwrap_or_else(|| "model.zip".to_string());
        let bytes = response.bytes().await?;

        let dest = dest_dir.join(filename);
        tokio::fs::write(&dest, &bytes).await?;
        info!(path = %dest.display(), bytes = bytes.len(), "Model downloaded");
        Ok(dest)
    }

    // ---------------------------------------------------------------------
    // Training
    // ---------------------------------------------------------------------

    pub async fn train_classifier(
        &self,
        model_name: &str,
        labels: &[String],
        model_selector: &str,
        hf_dataset: Option<&str>,
    ) -> Result<Value> {
        self.train("classify", model_name, labels, model_selector, hf_dataset)
            .await
    }

    pub async fn train_detector(
        &self,
        model_name: &str,
        labels: &[String],
        model_selector: &str,
        hf_dataset: Option<&str>,
    ) -> Result<Value> {
        self.train("detect", model_name, labels, model_selector, hf_dataset)
            .await
    }

    async fn train(
        &self,
        kind: &str,
        model_name: &str,
        labels: &[String],
        model_selector: &str,
        hf_dataset: Option<&str>,
    ) -> Result<Value> {
        let labels = labels.join(",");
        let segments = ["task", kind, model_name, labels.as_str(), model_selector];
        let endpoint = segments.join("/");
        let mut request = self.client.post(self.url(&segments)?);
        if let Some(dataset) = hf_dataset {
            request = request.query(&[("hf_dataset", dataset)]);
        }
        let body = self.send(request, &endpoint).await?;
        decode(&endpoint, &body)
    }

    pub async fn train_generator(&self, model_name: &str, hf_dataset: &str) -> Result<Value> {
        let segments = ["task", "generate", model_name];
        let endpoint = segments.join("/");
        let request = self
            .client
            .post(self.url(&segments)?)
            .query(&[("hf_dataset", hf_dataset)]);
        let body = self.send(request, &endpoint).await?;
        decode(&endpoint, &body)
    }

    // ---------------------------------------------------------------------
    // User
    // ---------------------------------------------------------------------

    pub async fn user_profile(&self) -> Result<Value> {
        self.get_json(&["user"]).await
    }

    pub async fn user_credits(&self) -> Result<Value> {
        self.get_json(&["user", "credits"]).await
    }

    // ---------------------------------------------------------------------
    // Evaluations and datasets
    // ---------------------------------------------------------------------

    pub async fn list_evaluations(&self) -> Result<Value> {
        self.get_message(&["evaluation", "list"]).await
    }

    pub async fn delete_evaluation(&self, eval_type: &str, eval_name: &str) -> Result<Value> {
        self.post_json(&["evaluation", "delete", eval_type, eval_name])
            .await
    }

    pub async fn list_datasets(&self) -> Result<Value> {
        self.get_message(&["datasets", "list"]).await
    }

    /// Presigned URL for downloading a dataset
    pub async fn dataset_download_url(&self, dataset_type: &str, dataset_name: &str) -> Result<String> {
        let segments = ["datasets", "download", dataset_type, dataset_name];
        let value: Value = self.get_json(&segments).await?;
        value
            .get("presigned_url")
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| Error::InvalidResponse {
                endpoint: segments.join("/"),
                reason: "missing presigned_url".to_string(),
            })
    }

    pub async fn delete_dataset(&self, dataset_type: &str, dataset_name: &str) -> Result<Value> {
        let value = self
            .delete_json(&["datasets", "delete", dataset_type, dataset_name])
            .await?;
        Ok(unwrap_message(value))
    }
}

#[async_trait]
impl RemoteService for RemyxClient {
    async fn submit_job(
        &self,
        task: EvaluationTask,
        board: &str,
        models: &[String],
        params: &TaskParams,
    ) -> Result<JobHandle> {
        let models_csv = models
            .iter()
            .map(|m| SupportedModels::engine_name(m))
            .collect::<Vec<_>>()
            .join(",");

        let (endpoint, request) = match task {
            EvaluationTask::MyxMatch => {
                let prompt = params
                    .prompt
                    .as_deref()
                    .filter(|p| !p.trim().is_empty())
                    .ok_or_else(|| Error::Validation("myxmatch requires a prompt".to_string()))?;
                let segments = ["task", "myxmatch", board, prompt, models_csv.as_str()];
                (
                    format!("task/myxmatch/{}", board),
                    self.client.post(self.url(&segments)?),
                )
            }
            EvaluationTask::Benchmark => {
                let segments = ["task", "benchmark", board, models_csv.as_str()];
                let mut request = self.client.post(self.url(&segments)?);
                if !params.eval_tasks.is_empty() {
                    request = request.query(&[("eval_tasks", params.eval_tasks.join(","))]);
                }
                (format!("task/benchmark/{}", board), request)
            }
        };

        info!(task = %task, board, models = %models_csv, "Submitting evaluation job");
        let body = self.send(request, &endpoint).await?;
        decode(&endpoint, &body)
    }

    async fn job_status(&self, job_name: &str) -> Result<JobStatusResponse> {
        let status: JobStatusResponse = self.get_json(&["task", "job-status", job_name]).await?;
        debug!(job_name, status = %status.status, "Job status");
        Ok(status)
    }

    async fn fetch_result(&self, task: EvaluationTask, board: &str) -> Result<Value> {
        let segments = ["evaluation", "download", task.as_str(), board];
        let endpoint = segments.join("/");
        let url = self.url(&segments)?;
        debug!(url = %url, "GET");
        let body = self.send(self.client.get(url), &endpoint).await?;
        parse_lenient(&body).map_err(|e| {
            error!(endpoint = %endpoint, error = %e, "Error decoding JSON response");
            Error::InvalidResponse {
                endpoint,
                reason: e.to_string(),
            }
        })
    }

    async fn list_boards(&self) -> Result<Vec<BoardSummary>> {
        let value = self.get_message(&["myxboard", "list"]).await?;
        serde_json::from_value(value).map_err(|e| Error::InvalidResponse {
            endpoint: "myxboard/list".to_string(),
            reason: e.to_string(),
        })
    }

    async fn get_board(&self, board: &str) -> Result<Option<BoardRecord>> {
        let value = match self.get_message(&["myxboard", "download", board]).await {
            Ok(value) => value,
            Err(Error::Status { status: 404, .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| Error::InvalidResponse {
                endpoint: format!("myxboard/download/{}", board),
                reason: e.to_string(),
            })
    }

    async fn create_board(&self, record: &BoardRecord) -> Result<()> {
        let endpoint = "myxboard/store";
        let request = self.client.post(self.url(&["myxboard", "store"])?).json(record);
        self.send(request, endpoint).await?;
        info!(board = %record.name, "MyxBoard created");
        Ok(())
    }

    async fn update_board(&self, record: &BoardRecord) -> Result<()> {
        let board = record.sanitized_name();
        let endpoint = format!("myxboard/update/{}", board);
        let request = self
            .client
            .put(self.url(&["myxboard", "update", &board])?)
            .json(record);
        self.send(request, &endpoint).await?;
        debug!(board = %record.name, "MyxBoard updated");
        Ok(())
    }

    async fn delete_board(&self, board: &str) -> Result<()> {
        self.delete_json(&["myxboard", "delete", board]).await?;
        info!(board, "MyxBoard deleted");
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| {
        error!(endpoint, error = %e, "Error decoding JSON response");
        Error::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        }
    })
}

/// Unwrap the `{"message": ...}` envelope the engine uses for listings
fn unwrap_message(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("message") => {
            map.remove("message").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Strict JSON first; on failure, retry with bare NaN/Infinity read as null
fn parse_lenient(body: &str) -> serde_json::Result<Value> {
    match serde_json::from_str(body) {
        Ok(value) => Ok(value),
        Err(strict) => {
            let patched = NON_FINITE_TOKEN.replace_all(body, |caps: &Captures| match caps.name("lead") {
                Some(lead) => format!("{}null", lead.as_str()),
                None => caps[0].to_string(),
            });
            serde_json::from_str(&patched).map_err(|_| strict)
        }
    }
}

/// File name announced by a Content-Disposition header, without any directory part
fn attachment_filename(header: &str) -> Option<String> {
    let (_, raw) = header.split_once("filename=")?;
    let raw = raw.split(';').next().unwrap_or(raw);
    plain_file_name(raw.trim().trim_matches(|c| c == '"' || c == '\''))
}

/// Last component of `name`; `None` for empty, `.` and `..`
fn plain_file_name(name: &str) -> Option<String> {
    let name = name.replace('\\', "/");
    Path::new(&name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty() && *n != "." && *n != "..")
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> RemyxClient {
        let config = ClientConfig::new("test-key", format!("{}/api/v1.0", server.base_url()));
        RemyxClient::new(config).unwrap()
    }

    fn models(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_url_encodes_segments() {
        let client =
            RemyxClient::new(ClientConfig::new("k", "https://engine.remyx.ai/api/v1.0/")).unwrap();
        let url = client
            .url(&["task", "myxmatch", "board", "what is 2/3?", "a,b"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://engine.remyx.ai/api/v1.0/task/myxmatch/board/what%20is%202%2F3%3F/a,b"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = RemyxClient::new(ClientConfig::new("k", "not a url"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_parse_lenient_non_finite() {
        let body = r#"{"results": [{"model": "m", "metrics": {"a": NaN, "b": -Infinity, "c": 0.5}}]}"#;
        let value = parse_lenient(body).unwrap();
        let metrics = &value["results"][0]["metrics"];
        assert!(metrics["a"].is_null());
        assert!(metrics["b"].is_null());
        assert_eq!(metrics["c"], json!(0.5));

        assert!(parse_lenient("{not json").is_err());
    }

    #[test]
    fn test_parse_lenient_keeps_string_contents() {
        let body = r#"{"prompt": "rate [NaN, Infinity]: x, -Infinity", "models": [{"model": "m", "rank": NaN}]}"#;
        let value = parse_lenient(body).unwrap();
        assert_eq!(value["prompt"], json!("rate [NaN, Infinity]: x, -Infinity"));
        assert!(value["models"][0]["rank"].is_null());

        let escaped = r#"{"prompt": "say \"hi\", NaN", "v": Infinity}"#;
        let value = parse_lenient(escaped).unwrap();
        assert_eq!(value["prompt"], json!("say \"hi\", NaN"));
        assert!(value["v"].is_null());
    }

    #[test]
    fn test_attachment_filename() {
        assert_eq!(
            attachment_filename(r#"attachment; filename="model.zip""#).as_deref(),
            Some("model.zip")
        );
        assert_eq!(attachment_filename("inline"), None);
        assert_eq!(
            attachment_filename(r#"attachment; filename="m.zip"; size=3"#).as_deref(),
            Some("m.zip")
        );
    }

    #[test]
    fn test_attachment_filename_drops_directories() {
        assert_eq!(
            attachment_filename(r#"attachment; filename="../escaped.zip""#).as_deref(),
            Some("escaped.zip")
        );
        assert_eq!(
            attachment_filename("attachment; filename=/etc/cron.d/job").as_deref(),
            Some("job")
        );
        assert_eq!(
            attachment_filename(r#"attachment; filename="..\\..\\win.zip""#).as_deref(),
            Some("win.zip")
        );
        assert_eq!(attachment_filename(r#"attachment; filename="..""#), None);
        assert_eq!(attachment_filename(r#"attachment; filename="""#), None);
    }

    #[tokio::test]
    async fn test_submit_match_job() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/v1.0/task/myxmatch/team--board/p/Qwen2-1.5B,gemma-2b")
                    .header("authorization", "Bearer test-key");
                then.status(202).json_body(json!({"job_name": "job-1"}));
            })
            .await;

        let client = client_for(&server);
        let handle = client
            .submit_job(
                EvaluationTask::MyxMatch,
                "team--board",
                &models(&["Qwen/Qwen2-1.5B", "gemma-2b"]),
                &TaskParams {
                    prompt: Some("p".to_string()),
                    ..TaskParams::default()
                },
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(handle.job_name, "job-1");
    }

    #[tokio::test]
    async fn test_submit_match_without_prompt_skips_network() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(202).json_body(json!({"job_name": "never"}));
            })
            .await;

        let client = client_for(&server);
        let result = client
            .submit_job(
                EvaluationTask::MyxMatch,
                "board",
                &models(&["gemma-2b"]),
                &TaskParams::default(),
            )
            .await;

        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(mock.hits_async().await, 0);
    }

    #[tokio::test]
    async fn test_submit_benchmark_job_with_eval_tasks() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/v1.0/task/benchmark/board/gemma-2b")
                    .query_param("eval_tasks", "arc_easy,hellaswag");
                then.status(202).json_body(json!({"job_name": "bench-1"}));
            })
            .await;

        let client = client_for(&server);
        let handle = client
            .submit_job(
                EvaluationTask::Benchmark,
                "board",
                &models(&["gemma-2b"]),
                &TaskParams {
                    prompt: None,
                    eval_tasks: vec!["arc_easy".to_string(), "hellaswag".to_string()],
                },
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(handle.job_name, "bench-1");
    }

    #[tokio::test]
    async fn test_job_status_http_failure_is_typed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1.0/task/job-status/job-1");
                then.status(500).body("boom");
            })
            .await;

        let client = client_for(&server);
        let err = client.job_status("job-1").await.unwrap_err();
        match err {
            Error::Status { status, body, .. } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_job_status_invalid_json_is_distinct() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1.0/task/job-status/job-1");
                then.status(200).body("<html>gateway</html>");
            })
            .await;

        let client = client_for(&server);
        let err = client.job_status("job-1").await.unwrap_err();
        assert!(err.is_invalid_response());
    }

    #[tokio::test]
    async fn test_fetch_result_tolerates_nan_tokens() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/v1.0/evaluation/download/benchmark/board");
                then.status(200)
                    .body(r#"{"results": [{"model": "gemma-2b", "metrics": {"acc": NaN}}]}"#);
            })
            .await;

        let client = client_for(&server);
        let payload = client
            .fetch_result(EvaluationTask::Benchmark, "board")
            .await
            .unwrap();
        assert!(payload["results"][0]["metrics"]["acc"].is_null());
    }

    #[tokio::test]
    async fn test_board_crud() {
        let server = MockServer::start_async().await;
        let record = BoardRecord::new("team/board", models(&["gemma-2b"]));

        let store = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/v1.0/myxboard/store")
                    .json_body_partial(r#"{"name": "team/board", "models": ["gemma-2b"]}"#);
                then.status(201).json_body(json!({"message": "stored"}));
            })
            .await;
        let update = server
            .mock_async(|when, then| {
                when.method(PUT).path("/api/v1.0/myxboard/update/team--board");
                then.status(200).json_body(json!({"message": "updated"}));
            })
            .await;
        let list = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1.0/myxboard/list");
                then.status(200).json_body(json!({
                    "message": [{"name": "team/board", "models": ["gemma-2b"]}]
                }));
            })
            .await;
        let download = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1.0/myxboard/download/team--board");
                then.status(200).json_body(json!({
                    "message": {"name": "team/board", "models": ["gemma-2b"], "results": {}, "job_status": {}}
                }));
            })
            .await;
        let delete = server
            .mock_async(|when, then| {
                when.method(DELETE).path("/api/v1.0/myxboard/delete/team--board");
                then.status(200).json_body(json!({"message": "deleted"}));
            })
            .await;

        let client = client_for(&server);
        client.create_board(&record).await.unwrap();
        client.update_board(&record).await.unwrap();

        let boards = client.list_boards().await.unwrap();
        assert_eq!(boards.len(), 1);
        assert_eq!(boards[0].name, "team/board");

        let fetched = client.get_board("team--board").await.unwrap().unwrap();
        assert_eq!(fetched, record);

        client.delete_board("team--board").await.unwrap();

        store.assert_async().await;
        update.assert_async().await;
        list.assert_async().await;
        download.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_board_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1.0/myxboard/download/missing");
                then.status(404).body("not found");
            })
            .await;

        let client = client_for(&server);
        assert!(client.get_board("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dataset_download_url() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1.0/datasets/download/image/cats");
                then.status(200)
                    .json_body(json!({"presigned_url": "https://bucket/cats.zip"}));
            })
            .await;

        let client = client_for(&server);
        let url = client.dataset_download_url("image", "cats").await.unwrap();
        assert_eq!(url, "https://bucket/cats.zip");
    }

    #[tokio::test]
    async fn test_download_model_writes_archive() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/v1.0/model/download/cats/onnx");
                then.status(200)
                    .header("content-disposition", r#"attachment; filename="cats-onnx.zip""#)
                    .body("zipbytes");
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = client_for(&server);
        let path = client.download_model("cats", "onnx", dir.path()).await.unwrap();

        assert_eq!(path.file_name().unwrap(), "cats-onnx.zip");
        assert_eq!(std::fs::read(&path).unwrap(), b"zipbytes");
    }

    #[tokio::test]
    async fn test_download_model_stays_in_destination() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/v1.0/model/download/cats/onnx");
                then.status(200)
                    .header("content-disposition", r#"attachment; filename="../escaped.zip""#)
                    .body("zipbytes");
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out");
        std::fs::create_dir(&dest).unwrap();
        let client = client_for(&server);
        let path = client.download_model("cats", "onnx", &dest).await.unwrap();

        assert_eq!(path, dest.join("escaped.zip"));
        assert!(path.exists());
        assert!(!dir.path().join("escaped.zip").exists());
    }

    #[tokio::test]
    async fn test_train_classifier_passes_dataset() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/v1.0/task/classify/pets/cat,dog/3")
                    .query_param("hf_dataset", "org/pets");
                then.status(200).json_body(json!({"message": "training"}));
            })
            .await;

        let client = client_for(&server);
        let result = client
            .train_classifier("pets", &models(&["cat", "dog"]), "3", Some("org/pets"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result["message"], json!("training"));
    }
}
