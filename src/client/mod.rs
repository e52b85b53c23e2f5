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

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tf_provider::Diagnostics;
use tokio::sync::RwLock;

mod error;
mod http;
#[cfg(test)]
pub(crate) mod memory;

pub use error::Result;
pub use http::AccountClient;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Returned on creation only: the key is never readable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationCreated {
    pub id: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CreateApplicationRequest {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdateApplicationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApplicationServiceScope {
    pub service: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApplicationServices {
    #[serde(default)]
    pub scopes: Vec<ApplicationServiceScope>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SetServiceRequest {
    pub scopes: Vec<ApplicationServiceScope>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApplicationRestriction {
    #[serde(default)]
    pub ip_restriction_type: String,
    #[serde(default)]
    pub ip_ranges: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SetRestrictionRequest {
    pub ip_restriction_type: String,
    pub ip_ranges: Vec<String>,
}

/// Calls exposed by the account API for applications and their access rules.
///
/// Every method performs a single request. Nothing is retried.
#[async_trait]
pub trait AccountService: Send + Sync + std::fmt::Debug + 'static {
    async fn create_application(
        &self,
        request: &CreateApplicationRequest,
    ) -> Result<ApplicationCreated>;
    async fn get_application(&self, id: &str) -> Result<Application>;
    async fn update_application(&self, id: &str, request: &UpdateApplicationRequest)
        -> Result<()>;
    async fn delete_application(&self, id: &str) -> Result<()>;

    async fn get_application_services(&self, id: &str) -> Result<ApplicationServices>;
    async fn set_application_services(&self, id: &str, request: &SetServiceRequest)
        -> Result<()>;
    async fn delete_application_services(&self, id: &str) -> Result<()>;

    async fn get_application_restrictions(&self, id: &str) -> Result<ApplicationRestriction>;
    async fn set_application_restrictions(
        &self,
        id: &str,
        request: &SetRestrictionRequest,
    ) -> Result<()>;
    async fn delete_application_restrictions(&self, id: &str) -> Result<()>;
}

/// Client shared between the provider and its resources.
///
/// Resources are instantiated before the provider is configured, so they hold
/// this handle and pick the client up on first use.
#[derive(Debug, Clone, Default)]
pub struct ClientHandle(Arc<RwLock<Option<Arc<dyn AccountService>>>>);

impl ClientHandle {
    pub async fn set(&self, client: Arc<dyn AccountService>) {
        *self.0.write().await = Some(client);
    }

    pub async fn get(&self, diags: &mut Diagnostics) -> Option<Arc<dyn AccountService>> {
        let client = self.0.read().await.clone();
        if client.is_none() {
            diags.root_error(
                "Provider not configured",
                "The account API client is not available: the provider must be configured before resources are used.",
            );
        }
        client
    }
}
