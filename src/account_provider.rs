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

use tf_provider::schema::{Attribute, AttributeConstraint, AttributeType};
use tf_provider::value::ValueString;
use tf_provider::{
    map, AttributePath, Block, Description, Diagnostics, Provider, Schema, ValueEmpty,
};

use crate::application::ApplicationResource;
use crate::client::{AccountClient, ClientHandle};
use crate::config::{Config, ConfigError};
use crate::restriction::ApplicationRestrictionResource;
use crate::services::ApplicationServicesResource;

/// The same provider is published under two names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFlavor {
    /// `account`: applications, their services and their IP restrictions.
    Account,
    /// `accounts`: applications only, with scopes and restriction inline.
    Accounts,
}

impl ProviderFlavor {
    pub fn name(self) -> &'static str {
        match self {
            ProviderFlavor::Account => "account",
            ProviderFlavor::Accounts => "accounts",
        }
    }

    pub fn user_agent(self) -> String {
        format!(
            "terraform-provider-{}/{}",
            self.name(),
            env!("CARGO_PKG_VERSION")
        )
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig<'a> {
    #[serde(borrow = "'a")]
    pub context: ValueString<'a>,
    pub api_key: ValueString<'a>,
}

#[derive(Debug, Clone)]
pub struct AccountProvider {
    flavor: ProviderFlavor,
    client: ClientHandle,
}

impl AccountProvider {
    pub fn new(flavor: ProviderFlavor) -> Self {
        Self {
            flavor,
            client: ClientHandle::default(),
        }
    }

    pub fn flavor(&self) -> ProviderFlavor {
        self.flavor
    }

    async fn configure_from(
        &self,
        diags: &mut Diagnostics,
        file: &Config,
        config: &ProviderConfig<'_>,
    ) -> Option<()> {
        let settings = match file.resolve(
            config.context.as_deref_option(),
            config.api_key.as_deref_option(),
        ) {
            Ok(settings) => settings,
            Err(err @ ConfigError::UnknownContext(_)) => {
                diags.error("Invalid context", err.to_string(), AttributePath::new("context"));
                return None;
            }
            Err(err @ ConfigError::MissingApiKey) => {
                diags.error("Missing API key", err.to_string(), AttributePath::new("api_key"));
                return None;
            }
            Err(err) => {
                diags.root_error("Invalid configuration", err.to_string());
                return None;
            }
        };

        tracing::debug!(settings = ?settings, "resolved client settings");

        let client = match AccountClient::new(&self.flavor.user_agent(), &settings) {
            Ok(client) => client,
            Err(err) => {
                diags.root_error("Failed to build API client", err.to_string());
                return None;
            }
        };
        self.client.set(Arc::new(client)).await;

        Some(())
    }
}

#[async_trait]
impl Provider for AccountProvider {
    type Config<'a> = ProviderConfig<'a>;
    type MetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(Schema {
            version: 1,
            block: Block {
                description: Description::plain("Account API applications"),
                attributes: map! {
                    "context" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Config file context to use"),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "api_key" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("API key, overrides the environment and the config file"),
                        constraint: AttributeConstraint::Optional,
                        sensitive: true,
                        ..Default::default()
                    },
                },
                ..Default::default()
            },
        })
    }

    async fn validate<'a>(&self, _diags: &mut Diagnostics, _config: Self::Config<'a>) -> Option<()> {
        Some(())
    }

    async fn configure<'a>(
        &self,
        diags: &mut Diagnostics,
        terraform_version: String,
        config: Self::Config<'a>,
    ) -> Option<()> {
        tracing::info!(
            provider = self.flavor.name(),
            terraform_version = terraform_version.as_str(),
            "Configuring provider"
        );

        let file = match Config::load() {
            Ok(file) => file,
            Err(err) => {
                diags.root_error("Invalid config file", err.to_string());
                return None;
            }
        };

        self.configure_from(diags, &file, &config).await
    }

    fn get_resources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<std::collections::HashMap<String, Box<dyn tf_provider::resource::DynamicResource>>>
    {
        let client = &self.client;
        Some(match self.flavor {
            ProviderFlavor::Account => map! {
                "application"             => ApplicationResource::new(client.clone()),
                "application_services"    => ApplicationServicesResource::new(client.clone()),
                "application_restriction" => ApplicationRestrictionResource::new(client.clone()),
            },
            ProviderFlavor::Accounts => map! {
                "application" => ApplicationResource::new(client.clone()),
            },
        })
    }

    fn get_data_sources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<
        std::collections::HashMap<String, Box<dyn tf_provider::data_source::DynamicDataSource>>,
    > {
        Some(map! {})
    }
}
