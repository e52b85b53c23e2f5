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

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::config::ClientConfig;

use super::error::{error_message, ApiError, Result};
use super::{
    AccountService, Application, ApplicationCreated, ApplicationRestriction, ApplicationServices,
    CreateApplicationRequest, SetRestrictionRequest, SetServiceRequest, UpdateApplicationRequest,
};

const APPLICATIONS_PATH: [&str; 3] = ["account", "v1", "applications"];

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

/// HTTP implementation of [`AccountService`].
#[derive(Clone)]
pub struct AccountClient {
    client: reqwest::Client,
    base_url: Url,
    debug: bool,
}

impl std::fmt::Debug for AccountClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountClient")
            .field("base_url", &self.base_url.as_str())
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

impl AccountClient {
    pub fn new(user_agent: &str, config: &ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.api_uri)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ApiError::InvalidUri(config.api_uri.clone()))?;

        let mut headers = HeaderMap::new();
        let mut api_key = HeaderValue::from_str(&config.api_key)?;
        api_key.set_sensitive(true);
        headers.insert(AUTHORIZATION, api_key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            debug: config.debug,
        })
    }

    /// Every part is pushed as a single path segment, so an ID can never
    /// reach another endpoint.
    fn url(&self, id: Option<&str>, sub: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(APPLICATIONS_PATH);
            segments.extend(id);
            segments.extend(sub);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        if self.debug {
            tracing::debug!(target: "account::client", %method, %url, "sending request");
        } else {
            tracing::trace!(target: "account::client", %method, %url, "sending request");
        }
        self.client.request(method, url)
    }

    async fn send(&self, request: RequestBuilder, id: &str) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();

        if self.debug {
            tracing::debug!(target: "account::client", url = %response.url(), %status, "received response");
        } else {
            tracing::trace!(target: "account::client", url = %response.url(), %status, "received response");
        }

        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::NOT_FOUND => Err(ApiError::ApplicationNotFound(id.to_owned())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ApiError::Unauthorized(status)),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(ApiError::Api {
                    status,
                    message: error_message(&body),
                })
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, id: &str, sub: Option<&str>) -> Result<T> {
        let id = checked_id(id)?;
        let request = self.request(Method::GET, self.url(Some(id), sub));
        let response = self.send(request, id).await?;
        decode(response).await
    }

    async fn write<B: Serialize + ?Sized>(
        &self,
        method: Method,
        id: &str,
        sub: Option<&str>,
        body: &B,
    ) -> Result<()> {
        let id = checked_id(id)?;
        let request = self.request(method, self.url(Some(id), sub)).json(body);
        self.send(request, id).await?;
        Ok(())
    }

    async fn delete(&self, id: &str, sub: Option<&str>) -> Result<()> {
        let id = checked_id(id)?;
        let request = self.request(Method::DELETE, self.url(Some(id), sub));
        self.send(request, id).await?;
        Ok(())
    }
}

fn checked_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() {
        Err(ApiError::InvalidId)
    } else {
        Ok(id)
    }
}

/// Bodies are decoded from bytes so that malformed payloads surface as
/// [`ApiError::Decode`] rather than transport errors.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.bytes().await?;
    let envelope: Envelope<T> = serde_json::from_slice(&body)?;
    Ok(envelope.data)
}

#[async_trait]
impl AccountService for AccountClient {
    async fn create_application(
        &self,
        request: &CreateApplicationRequest,
    ) -> Result<ApplicationCreated> {
        let builder = self.request(Method::POST, self.url(None, None)).json(request);
        let response = self.send(builder, "").await?;
        decode(response).await
    }

    async fn get_application(&self, id: &str) -> Result<Application> {
        self.get(id, None).await
    }

    async fn update_application(
        &self,
        id: &str,
        request: &UpdateApplicationRequest,
    ) -> Result<()> {
        self.write(Method::PATCH, id, None, request).await
    }

    async fn delete_application(&self, id: &str) -> Result<()> {
        self.delete(id, None).await
    }

    async fn get_application_services(&self, id: &str) -> Result<ApplicationServices> {
        self.get(id, Some("services")).await
    }

    async fn set_application_services(
        &self,
        id: &str,
        request: &SetServiceRequest,
    ) -> Result<()> {
        self.write(Method::PUT, id, Some("services"), request).await
    }

    async fn delete_application_services(&self, id: &str) -> Result<()> {
        self.delete(id, Some("services")).await
    }

    async fn get_application_restrictions(&self, id: &str) -> Result<ApplicationRestriction> {
        self.get(id, Some("ip-restrictions")).await
    }

    async fn set_application_restrictions(
        &self,
        id: &str,
        request: &SetRestrictionRequest,
    ) -> Result<()> {
        self.write(Method::PUT, id, Some("ip-restrictions"), request)
            .await
    }

    async fn delete_application_restrictions(&self, id: &str) -> Result<()> {
        self.delete(id, Some("ip-restrictions")).await
    }
}
