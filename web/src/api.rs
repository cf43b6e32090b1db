//! JSON API handlers

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use progour_tools::{CategoryStatus, ExecutionResult, ExecutionStatus};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};
use url::form_urlencoded;

use crate::error::ApiError;
use crate::server::AppState;

// --- API Types ---

/// Urlencoded request body, decoded whatever the Content-Type says.
///
/// The first non-empty value of a repeated key wins; a missing key reads as "".
#[derive(Debug, Default)]
pub struct FormFields(HashMap<String, String>);

impl FormFields {
    pub fn parse(body: &[u8]) -> Self {
        let mut fields = HashMap::new();
        for (key, value) in form_urlencoded::parse(body) {
            if value.is_empty() {
                continue;
            }
            fields
                .entry(key.into_owned())
                .or_insert_with(|| value.into_owned());
        }
        Self(fields)
    }

    pub fn get(&self, key: &str) -> &str {
        self.0.get(key).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Default)]
pub struct ExecuteForm {
    pub tool_id: String,
    pub command: String,
}

impl ExecuteForm {
    pub fn from_body(body: &[u8]) -> Self {
        let fields = FormFields::parse(body);
        Self {
            tool_id: fields.get("tool_id").to_string(),
            command: fields.get("command").to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct InstallForm {
    pub tool_name: String,
}

impl InstallForm {
    pub fn from_body(body: &[u8]) -> Self {
        Self {
            tool_name: FormFields::parse(body).get("tool_name").to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ToolsResponse {
    pub categories: Vec<CategoryStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionKind {
    Custom,
    Tool,
}

#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    pub status: &'static str,
    pub output: String,
    #[serde(rename = "type")]
    pub kind: ExecutionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct InstallResponse {
    pub status: &'static str,
    pub message: String,
    pub output: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SystemReport {
    Info {
        hostname: String,
        system: String,
        kernel: String,
        user: String,
        uptime: String,
        installed_tools: usize,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub port: u16,
    pub host: String,
    pub start_time: String,
    pub connections: u64,
    pub version: &'static str,
}

// --- Handlers ---

pub async fn list_tools(State(state): State<AppState>) -> Json<ToolsResponse> {
    let categories = state.registry.list_with_status(state.probe.clone()).await;
    Json(ToolsResponse { categories })
}

pub async fn execute(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    let form = ExecuteForm::from_body(&body?);

    // A literal command always wins over a tool id
    let (kind, command_line) = if !form.command.is_empty() {
        (ExecutionKind::Custom, form.command)
    } else if !form.tool_id.is_empty() {
        (
            ExecutionKind::Tool,
            state.registry.command_for(&form.tool_id).to_string(),
        )
    } else {
        return Err(ApiError::NothingToRun);
    };

    let result = run_isolated(&state, command_line, state.limits.command_timeout).await?;

    Ok(Json(ExecuteResponse {
        status: "success",
        output: result.output,
        kind,
        exit_code: result.exit_code,
    }))
}

pub async fn install(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<InstallResponse>, ApiError> {
    let form = InstallForm::from_body(&body?);
    if form.tool_name.is_empty() {
        return Err(ApiError::NothingToRun);
    }

    let command_line = state.installer.plan(&form.tool_name);
    info!("Installing {}: {command_line}", form.tool_name);

    let result = run_isolated(&state, command_line, state.limits.install_timeout).await?;
    if !result.is_success() {
        warn!(
            "Install of {} ended with {}",
            form.tool_name,
            result.status.as_str()
        );
    }

    Ok(Json(InstallResponse {
        status: "success",
        message: format!("Installation attempt completed for {}", form.tool_name),
        output: result.output,
    }))
}

pub async fn system_info(State(state): State<AppState>) -> Json<SystemReport> {
    let timeout = state.limits.command_timeout;
    let query = |command_line: &str| {
        let state = &state;
        let command_line = command_line.to_string();
        async move {
            run_isolated(state, command_line, timeout)
                .await
                .unwrap_or_else(ExecutionResult::exception)
        }
    };

    let (hostname, system, kernel, user, uptime, installed_tools) = tokio::join!(
        query("hostname"),
        query("uname -s"),
        query("uname -r"),
        query("whoami"),
        query("uptime -p"),
        state.registry.installed_count(state.probe.clone()),
    );

    let probes = [&hostname, &system, &kernel, &user, &uptime];
    if let Some(failed) = probes
        .iter()
        .find(|result| result.status == ExecutionStatus::Exception)
    {
        return Json(SystemReport::Failed {
            error: failed.output.clone(),
        });
    }

    Json(SystemReport::Info {
        hostname: hostname.output.trim().to_string(),
        system: system.output.trim().to_string(),
        kernel: kernel.output.trim().to_string(),
        user: user.output.trim().to_string(),
        uptime: uptime.output.trim().to_string(),
        installed_tools,
    })
}

pub async fn server_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "running",
        port: state.port,
        host: state.host.clone(),
        start_time: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        connections: state.requests.get(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Run on its own task so a panicking runner becomes an error payload
/// instead of a dropped connection
async fn run_isolated(
    state: &AppState,
    command_line: String,
    timeout: Duration,
) -> Result<ExecutionResult, ApiError> {
    let runner = state.runner.clone();
    tokio::spawn(async move { runner.run(&command_line, timeout).await })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))
}
