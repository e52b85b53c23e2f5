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

use tf_provider::value::{Value, ValueEmpty};
use tf_provider::{schema::Schema, AttributePath, Diagnostics, Resource};

use crate::client::{ClientHandle, SetServiceRequest};
use crate::scope::{expand_scopes, flatten_scopes, scopes_drifted};
use crate::utils::{owned, WithNormalize, WithSchema, WithValidate};

use super::state::ServicesResourceState;

/// `<provider>_application_services`: the services an existing application
/// may access, and the roles it holds on each of them.
#[derive(Debug, Clone)]
pub struct ApplicationServicesResource {
    client: ClientHandle,
}

impl ApplicationServicesResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }

    async fn set_services(
        &self,
        diags: &mut Diagnostics,
        state: &ServicesResourceState<'_>,
    ) -> Option<()> {
        let client = self.client.get(diags).await?;
        let request = SetServiceRequest {
            scopes: expand_scopes(&state.service),
        };

        tracing::info!(
            id = state.application_id.as_str(),
            request = ?request,
            "Setting API Application Services"
        );

        match client
            .set_application_services(state.application_id.as_str(), &request)
            .await
        {
            Ok(()) => Some(()),
            Err(err) => {
                diags.root_error("Error Setting Application Services", err.to_string());
                None
            }
        }
    }
}

#[async_trait]
impl Resource for ApplicationServicesResource {
    type State<'a> = ServicesResourceState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(ServicesResourceState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        config.validate(diags, AttributePath::default());

        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = self.client.get(diags).await?;
        let mut state = state;
        state.normalize(diags);

        let application_id = state.application_id.as_str();
        tracing::info!(id = application_id, "Retrieving API Application Services");

        let services = match client.get_application_services(application_id).await {
            Ok(services) => services,
            Err(err) => {
                diags.error(
                    "Error Retrieving Application Services",
                    err.to_string(),
                    AttributePath::new("application_id"),
                );
                return None;
            }
        };

        // Recorded order is kept unless the scopes really changed remotely
        if scopes_drifted(&state.service, &services.scopes) {
            tracing::info!(id = state.application_id.as_str(), "Application Services drifted");
            state.service = flatten_scopes(services.scopes);
        }

        Some((state, private_state))
    }

    async fn plan_create<'a>(
        &self,
        diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = proposed_state;
        state.id = Value::Null;
        state.normalize(diags);

        Some((state, Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(
        Self::State<'a>,
        Self::PrivateState<'a>,
        Vec<tf_provider::AttributePath>,
    )> {
        let mut state = proposed_state;
        let mut trigger_replace = Vec::new();

        if state.application_id != prior_state.application_id {
            trigger_replace.push(AttributePath::new("application_id"));
            state.id = Value::Null;
        } else {
            state.id = prior_state.id;
        }
        state.normalize(diags);

        Some((state, prior_private_state, trigger_replace))
    }

    async fn plan_destroy<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::PrivateState<'a>> {
        Some(prior_private_state)
    }

    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = planned_state;
        self.set_services(diags, &state).await?;
        state.id = owned(state.application_id.as_str());

        Some((state, private_state))
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = planned_state;
        self.set_services(diags, &state).await?;
        state.normalize(diags);

        Some((state, private_state))
    }

    async fn destroy<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        _planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        let client = self.client.get(diags).await?;
        let application_id = state.application_id.as_str();

        tracing::info!(id = application_id, "Removing API Application Services");

        match client.get_application(application_id).await {
            Ok(_) => {}
            Err(err) if err.is_not_found() => {
                tracing::info!(id = application_id, "Application already removed");
                return Some(());
            }
            Err(err) => {
                diags.root_error("Error Retrieving Application", err.to_string());
                return None;
            }
        }

        tracing::info!(id = application_id, "Application found, removing services");

        if let Err(err) = client.delete_application_services(application_id).await {
            diags.root_error("Error Removing Application Services", err.to_string());
            return None;
        }

        Some(())
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        if id.trim().is_empty() {
            diags.root_error_short("Import ID must be the ID of the application");
            return None;
        }

        let state = ServicesResourceState {
            id: owned(id.clone()),
            application_id: owned(id),
            ..Default::default()
        };

        Some((state, Default::default()))
    }
}
