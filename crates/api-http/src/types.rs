//! HTTP Request/Response Types

use serde::Serialize;

use stemflow_core::application::ActiveJob;

/// One published stem in the upload response.
#[derive(Debug, Clone, Serialize)]
pub struct StemLink {
    pub name: String,
    pub url: String,
}

/// POST /upload - returned once processing has fully completed
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub stems: Vec<StemLink>,
}

/// GET /jobs - jobs that currently have observable progress state
#[derive(Debug, Clone, Serialize)]
pub struct JobsResponse {
    pub jobs: Vec<ActiveJob>,
}

/// GET /health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
