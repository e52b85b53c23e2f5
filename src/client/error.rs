// This file is part of the terraform-provider-account project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("application not found with ID [{0}]")]
    ApplicationNotFound(String),
    #[error("invalid application ID: must not be empty")]
    InvalidId,
    #[error("request was not authorized ({0}): check the configured api_key")]
    Unauthorized(StatusCode),
    #[error("unexpected response status {status}: {message}")]
    Api { status: StatusCode, message: String },
    #[error("invalid api_uri [{0}]: must be an absolute http(s) URL")]
    InvalidUri(String),
    #[error("invalid api_key: {0}")]
    InvalidApiKey(#[from] reqwest::header::InvalidHeaderValue),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApplicationNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorEntry>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEntry {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// Extract a human readable message from an API error body.
///
/// The API reports `{"errors": [{"title": .., "detail": ..}]}`; anything else
/// is returned verbatim.
pub(crate) fn error_message(body: &str) -> String {
    let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) else {
        return body.trim().to_owned();
    };

    let details: Vec<String> = parsed
        .errors
        .into_iter()
        .filter_map(|entry| entry.detail.or(entry.title))
        .collect();

    if !details.is_empty() {
        details.join("; ")
    } else if let Some(message) = parsed.message {
        message
    } else {
        body.trim().to_owned()
    }
}
