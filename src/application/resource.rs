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

use crate::client::{
    AccountService, ClientHandle, CreateApplicationRequest, SetServiceRequest,
    UpdateApplicationRequest,
};
use crate::restriction::same_ranges;
use crate::scope::{expand_scopes, flatten_scopes, scopes_changed, scopes_drifted};
use crate::utils::{owned, owned_list, owned_or_null, WithNormalize, WithSchema, WithValidate};

use super::state::{ApplicationState, RestrictionBlock};

/// `<provider>_application`: an API application together with its service
/// scopes and its IP restriction.
#[derive(Debug, Clone)]
pub struct ApplicationResource {
    client: ClientHandle,
}

impl ApplicationResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

/// Push the scopes and restriction of a freshly created application.
async fn apply_access(
    client: &dyn AccountService,
    diags: &mut Diagnostics,
    state: &ApplicationState<'_>,
) -> Option<()> {
    let id = state.id.as_str();

    let scopes = expand_scopes(&state.scope);
    if !scopes.is_empty() {
        tracing::info!(id, "Setting API Application Services");
        if let Err(err) = client
            .set_application_services(id, &SetServiceRequest { scopes })
            .await
        {
            diags.error(
                "Error Setting Application Services",
                err.to_string(),
                AttributePath::new("scope"),
            );
            return None;
        }
    }

    if let Value::Value(restriction) = &state.ip_restriction {
        tracing::info!(id, "Setting API Application Restriction");
        if let Err(err) = client
            .set_application_restrictions(id, &restriction.request())
            .await
        {
            diags.error(
                "Error Setting Application Restrictions",
                err.to_string(),
                AttributePath::new("ip_restriction"),
            );
            return None;
        }
    }

    Some(())
}

#[async_trait]
impl Resource for ApplicationResource {
    type State<'a> = ApplicationState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(ApplicationState::schema())
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
        let id = state.id.as_str().to_owned();

        tracing::info!(id = id.as_str(), "Retrieving API Application");

        let application = match client.get_application(&id).await {
            Ok(application) => application,
            Err(err) => {
                diags.error(
                    "Error Retrieving Application",
                    err.to_string(),
                    AttributePath::new("id"),
                );
                return None;
            }
        };

        state.name = owned(application.name);
        state.description = if state.description.is_null() {
            owned_or_null(application.description)
        } else {
            owned(application.description)
        };

        tracing::info!(id = id.as_str(), "Retrieving API Application Services");

        let services = match client.get_application_services(&id).await {
            Ok(services) => services,
            Err(err) => {
                diags.error(
                    "Error Retrieving Application Services",
                    err.to_string(),
                    AttributePath::new("scope"),
                );
                return None;
            }
        };
        if scopes_drifted(&state.scope, &services.scopes) {
            tracing::info!(id = id.as_str(), "Application Services drifted");
            state.scope = flatten_scopes(services.scopes);
        }

        tracing::info!(id = id.as_str(), "Retrieving API Application Restrictions");

        let restriction = match client.get_application_restrictions(&id).await {
            Ok(restriction) => restriction,
            Err(err) => {
                diags.error(
                    "Error Retrieving Application Restrictions",
                    err.to_string(),
                    AttributePath::new("ip_restriction"),
                );
                return None;
            }
        };
        let managed = !state.ip_restriction.is_null();
        if managed || !restriction.ip_ranges.is_empty() {
            let ranges = match state.ip_restriction.as_ref_option() {
                Some(recorded) if same_ranges(&recorded.ranges, &restriction.ip_ranges) => {
                    recorded.ranges.clone()
                }
                _ => owned_list(restriction.ip_ranges),
            };
            state.ip_restriction = Value::Value(RestrictionBlock {
                restriction_type: owned(restriction.ip_restriction_type),
                ranges,
            });
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
        state.key = Value::Null;
        state.normalize(diags);

        Some((state, Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        _diags: &mut Diagnostics,
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
        state.id = prior_state.id;
        state.key = prior_state.key;

        Some((state, prior_private_state, vec![]))
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
        let client = self.client.get(diags).await?;
        let mut state = planned_state;

        let request = CreateApplicationRequest {
            name: state.name.as_str().to_owned(),
            description: state
                .description
                .as_deref_option()
                .unwrap_or_default()
                .to_owned(),
        };

        tracing::info!(request = ?request, "Creating API Application");

        let created = match client.create_application(&request).await {
            Ok(created) => created,
            Err(err) => {
                diags.root_error("Error Creating Application", err.to_string());
                return None;
            }
        };

        tracing::info!(id = created.id.as_str(), "Created API Application");

        state.id = owned(created.id);
        state.key = owned(created.key);

        // The application exists from here on: the state is returned even on
        // error so that it gets tainted instead of leaked.
        apply_access(client.as_ref(), diags, &state).await;

        Some((state, private_state))
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = self.client.get(diags).await?;
        let state = planned_state;
        let id = state.id.as_str();

        let request = UpdateApplicationRequest {
            name: (state.name != prior_state.name).then(|| state.name.as_str().to_owned()),
            description: (state.description != prior_state.description).then(|| {
                state
                    .description
                    .as_deref_option()
                    .unwrap_or_default()
                    .to_owned()
            }),
        };
        if request.name.is_some() || request.description.is_some() {
            tracing::info!(id, request = ?request, "Updating API Application");
            if let Err(err) = client.update_application(id, &request).await {
                diags.root_error("Error Updating Application", err.to_string());
                return None;
            }
        }

        if scopes_changed(&prior_state.scope, &state.scope) {
            let scopes = expand_scopes(&state.scope);
            let result = if scopes.is_empty() {
                tracing::info!(id, "Removing API Application Services");
                client.delete_application_services(id).await
            } else {
                tracing::info!(id, "Setting API Application Services");
                client
                    .set_application_services(id, &SetServiceRequest { scopes })
                    .await
            };
            if let Err(err) = result {
                diags.error(
                    "Error Updating Application Services",
                    err.to_string(),
                    AttributePath::new("scope"),
                );
                return None;
            }
        }

        let prior_request = prior_state
            .ip_restriction
            .as_ref_option()
            .map(RestrictionBlock::request);
        let result = match &state.ip_restriction {
            Value::Value(restriction) => {
                let request = restriction.request();
                if prior_request.as_ref() == Some(&request) {
                    Ok(())
                } else {
                    tracing::info!(id, "Setting API Application Restriction");
                    client.set_application_restrictions(id, &request).await
                }
            }
            Value::Null if prior_request.is_some() => {
                tracing::info!(id, "Removing API Application Restriction");
                client.delete_application_restrictions(id).await
            }
            _ => Ok(()),
        };
        if let Err(err) = result {
            diags.error(
                "Error Updating Application Restrictions",
                err.to_string(),
                AttributePath::new("ip_restriction"),
            );
            return None;
        }

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
        let id = state.id.as_str();

        tracing::info!(id, "Removing API Application");

        match client.delete_application(id).await {
            Ok(()) => Some(()),
            Err(err) if err.is_not_found() => {
                tracing::info!(id, "Application already removed");
                Some(())
            }
            Err(err) => {
                diags.root_error("Error Removing Application", err.to_string());
                None
            }
        }
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

        let state = ApplicationState {
            id: owned(id),
            ..Default::default()
        };

        Some((state, Default::default()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tf_provider::value::ValueList;

    use super::*;
    use crate::application::state::ScopeBlock;
    use crate::client::memory::InMemoryAccountService;
    use crate::client::{ApplicationRestriction, ApplicationServiceScope, ApplicationServices};

    async fn setup() -> (ApplicationResource, InMemoryAccountService) {
        let api = InMemoryAccountService::default();
        let handle = ClientHandle::default();
        handle.set(Arc::new(api.clone())).await;
        (ApplicationResource::new(handle), api)
    }

    fn scopes<'a>(blocks: &[(&str, &[&str])]) -> ValueList<Value<ScopeBlock<'a>>> {
        Value::Value(
            blocks
                .iter()
                .map(|(service, roles)| {
                    Value::Value(ScopeBlock {
                        service: owned(*service),
                        roles: owned_list(roles.iter().map(|r| r.to_string())),
                    })
                })
                .collect(),
        )
    }

    fn restriction<'a>(restriction_type: &str, ranges: &[&str]) -> Value<RestrictionBlock<'a>> {
        Value::Value(RestrictionBlock {
            restriction_type: owned(restriction_type),
            ranges: owned_list(ranges.iter().map(|r| r.to_string())),
        })
    }

    fn api_scope(service: &str, roles: &[&str]) -> ApplicationServiceScope {
        ApplicationServiceScope {
            service: service.into(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn planned<'a>(name: &str) -> ApplicationState<'a> {
        ApplicationState {
            id: Value::Unknown,
            name: owned(name),
            key: Value::Unknown,
            scope: Value::Value(vec![]),
            ..Default::default()
        }
    }

    async fn create<'a>(
        resource: &ApplicationResource,
        diags: &mut Diagnostics,
        plan: ApplicationState<'a>,
    ) -> ApplicationState<'a> {
        let (state, _) = resource
            .create(diags, plan.clone(), plan, Default::default(), Default::default())
            .await
            .unwrap();
        state
    }

    #[tokio::test]
    async fn create_pushes_scopes_then_restriction() {
        let (resource, api) = setup().await;
        let mut diags = Diagnostics::default();

        let plan = ApplicationState {
            description: owned("terraform"),
            scope: scopes(&[("safedns", &["write", "read"]), ("ecloud", &["read"])]),
            ip_restriction: restriction("allowlist", &["10.0.0.0/8"]),
            ..planned("app")
        };
        let state = create(&resource, &mut diags, plan).await;

        assert!(diags.errors.is_empty());
        let id = state.id.as_str();
        assert_eq!(state.key.as_str(), format!("key-{id}"));
        assert_eq!(
            api.calls(),
            vec![
                format!("create_application {id}"),
                format!("set_application_services {id}"),
                format!("set_application_restrictions {id}"),
            ]
        );
        assert_eq!(
            api.services(id).unwrap().scopes,
            vec![
                api_scope("ecloud", &["read"]),
                api_scope("safedns", &["read", "write"])
            ]
        );
        assert_eq!(api.application(id).unwrap().description, "terraform");
    }

    #[tokio::test]
    async fn create_without_access_makes_one_call() {
        let (resource, api) = setup().await;
        let mut diags = Diagnostics::default();

        let state = create(&resource, &mut diags, planned("app")).await;

        assert!(diags.errors.is_empty());
        assert_eq!(api.calls(), vec![format!("create_application {}", state.id.as_str())]);
    }

    #[tokio::test]
    async fn read_ignores_reordering() {
        let (resource, api) = setup().await;
        let mut diags = Diagnostics::default();

        let plan = ApplicationState {
            scope: scopes(&[("safedns", &["write", "read"]), ("ecloud", &["read"])]),
            ip_restriction: restriction("allowlist", &["10.0.0.0/8", "1.1.1.1"]),
            ..planned("app")
        };
        let state = create(&resource, &mut diags, plan).await;
        let id = state.id.as_str().to_owned();

        api.put_services(
            &id,
            ApplicationServices {
                scopes: vec![
                    api_scope("safedns", &["read", "write"]),
                    api_scope("ecloud", &["read"]),
                ],
            },
        );
        api.put_restriction(
            &id,
            ApplicationRestriction {
                ip_restriction_type: "allowlist".into(),
                ip_ranges: vec!["1.1.1.1".into(), "10.0.0.0/8".into()],
            },
        );

        let (read, _) = resource
            .read(&mut diags, state.clone(), Default::default(), Default::default())
            .await
            .unwrap();

        assert!(diags.errors.is_empty());
        assert_eq!(read, state);
    }

    #[tokio::test]
    async fn read_picks_up_remote_changes() {
        let (resource, api) = setup().await;
        let mut diags = Diagnostics::default();

        let state = create(&resource, &mut diags, planned("app")).await;
        let id = state.id.as_str().to_owned();

        api.put_services(
            &id,
            ApplicationServices {
                scopes: vec![api_scope("pss", &["write", "read"])],
            },
        );
        api.put_restriction(
            &id,
            ApplicationRestriction {
                ip_restriction_type: "denylist".into(),
                ip_ranges: vec!["2.2.2.2".into()],
            },
        );

        let (read, _) = resource
            .read(&mut diags, state, Default::default(), Default::default())
            .await
            .unwrap();

        assert_eq!(read.scope, scopes(&[("pss", &["read", "write"])]));
        assert_eq!(read.ip_restriction, restriction("denylist", &["2.2.2.2"]));
    }

    #[tokio::test]
    async fn read_leaves_unmanaged_empty_restriction_alone() {
        let (resource, api) = setup().await;
        let mut diags = Diagnostics::default();

        let state = create(&resource, &mut diags, planned("app")).await;
        api.put_restriction(
            state.id.as_str(),
            ApplicationRestriction {
                ip_restriction_type: "allowlist".into(),
                ip_ranges: vec![],
            },
        );

        let (read, _) = resource
            .read(&mut diags, state, Default::default(), Default::default())
            .await
            .unwrap();

        assert!(read.ip_restriction.is_null());
        assert!(read.description.is_null());
    }

    #[tokio::test]
    async fn imported_application_is_filled_by_read() {
        let (resource, api) = setup().await;
        let id = api.insert_application("imported", "from console");
        api.put_services(
            &id,
            ApplicationServices {
                scopes: vec![api_scope("ecloud", &["read"])],
            },
        );
        let mut diags = Diagnostics::default();

        let (imported, private_state) = resource.import(&mut diags, id.clone()).await.unwrap();
        let (state, _) = resource
            .read(&mut diags, imported, private_state, Default::default())
            .await
            .unwrap();

        assert!(diags.errors.is_empty());
        assert_eq!(state.id.as_str(), id);
        assert_eq!(state.name.as_str(), "imported");
        assert_eq!(state.description.as_str(), "from console");
        assert_eq!(state.scope, scopes(&[("ecloud", &["read"])]));
        assert!(state.key.is_null());
    }

    #[tokio::test]
    async fn update_only_calls_what_changed() {
        let (resource, api) = setup().await;
        let mut diags = Diagnostics::default();

        let prior = create(
            &resource,
            &mut diags,
            ApplicationState {
                scope: scopes(&[("ecloud", &["read"])]),
                ..planned("app")
            },
        )
        .await;
        let id = prior.id.as_str().to_owned();
        api.clear_calls();

        let plan = ApplicationState {
            name: owned("renamed"),
            scope: scopes(&[("ecloud", &["read"])]),
            ..prior.clone()
        };
        let (state, _) = resource
            .update(
                &mut diags,
                prior,
                plan.clone(),
                plan,
                Default::default(),
                Default::default(),
            )
            .await
            .unwrap();

        assert!(diags.errors.is_empty());
        assert_eq!(api.calls(), vec![format!("update_application {id}")]);
        assert_eq!(api.application(&id).unwrap().name, "renamed");
        assert_eq!(state.name.as_str(), "renamed");
    }

    #[tokio::test]
    async fn update_removes_dropped_access() {
        let (resource, api) = setup().await;
        let mut diags = Diagnostics::default();

        let prior = create(
            &resource,
            &mut diags,
            ApplicationState {
                scope: scopes(&[("ecloud", &["read"])]),
                ip_restriction: restriction("allowlist", &["1.1.1.1"]),
                ..planned("app")
            },
        )
        .await;
        let id = prior.id.as_str().to_owned();
        api.clear_calls();

        let plan = ApplicationState {
            scope: Value::Value(vec![]),
            ip_restriction: Value::Null,
            ..prior.clone()
        };
        resource
            .update(
                &mut diags,
                prior,
                plan.clone(),
                plan,
                Default::default(),
                Default::default(),
            )
            .await
            .unwrap();

        assert!(diags.errors.is_empty());
        assert_eq!(
            api.calls(),
            vec![
                format!("delete_application_services {id}"),
                format!("delete_application_restrictions {id}"),
            ]
        );
        assert!(api.services(&id).is_none());
        assert!(api.restriction(&id).is_none());
    }

    #[tokio::test]
    async fn update_sets_changed_restriction() {
        let (resource, api) = setup().await;
        let mut diags = Diagnostics::default();

        let prior = create(
            &resource,
            &mut diags,
            ApplicationState {
                ip_restriction: restriction("allowlist", &["1.1.1.1"]),
                ..planned("app")
            },
        )
        .await;
        let id = prior.id.as_str().to_owned();
        api.clear_calls();

        let plan = ApplicationState {
            ip_restriction: restriction("denylist", &["1.1.1.1", "2.2.2.2"]),
            ..prior.clone()
        };
        resource
            .update(
                &mut diags,
                prior,
                plan.clone(),
                plan,
                Default::default(),
                Default::default(),
            )
            .await
            .unwrap();

        assert_eq!(api.calls(), vec![format!("set_application_restrictions {id}")]);
        let remote = api.restriction(&id).unwrap();
        assert_eq!(remote.ip_restriction_type, "denylist");
        assert_eq!(remote.ip_ranges, vec!["1.1.1.1", "2.2.2.2"]);
    }

    #[tokio::test]
    async fn plan_keeps_id_and_key() {
        let (resource, _) = setup().await;
        let mut diags = Diagnostics::default();

        let (planned_create, _) = resource
            .plan_create(
                &mut diags,
                planned("app"),
                planned("app"),
                Default::default(),
            )
            .await
            .unwrap();
        assert!(planned_create.id.is_unknown());
        assert!(planned_create.key.is_unknown());

        let prior = ApplicationState {
            id: owned("app-1"),
            key: owned("key-app-1"),
            ..planned("app")
        };
        let proposed = ApplicationState {
            id: Value::Unknown,
            key: Value::Unknown,
            ..planned("renamed")
        };
        let (state, _, replace) = resource
            .plan_update(
                &mut diags,
                prior,
                proposed.clone(),
                proposed,
                Default::default(),
                Default::default(),
            )
            .await
            .unwrap();
        assert!(replace.is_empty());
        assert_eq!(state.id.as_str(), "app-1");
        assert_eq!(state.key.as_str(), "key-app-1");
    }

    #[tokio::test]
    async fn destroy_removes_application() {
        let (resource, api) = setup().await;
        let id = api.insert_application("app", "");
        let mut diags = Diagnostics::default();

        let state = ApplicationState {
            id: owned(id.as_str()),
            ..Default::default()
        };
        resource
            .destroy(&mut diags, state.clone(), Default::default(), Default::default())
            .await
            .unwrap();
        assert!(api.application(&id).is_none());

        // A second removal finds nothing and succeeds
        let result = resource
            .destroy(&mut diags, state, Default::default(), Default::default())
            .await;
        assert!(result.is_some());
        assert!(diags.errors.is_empty());
    }

    #[tokio::test]
    async fn failed_access_keeps_created_application() {
        let (resource, api) = setup().await;
        api.fail("set_application_services");
        let mut diags = Diagnostics::default();

        let plan = ApplicationState {
            scope: scopes(&[("ecloud", &["read"])]),
            ip_restriction: restriction("allowlist", &["1.1.1.1"]),
            ..planned("app")
        };
        let state = create(&resource, &mut diags, plan).await;

        assert_eq!(diags.errors.len(), 1);
        let id = state.id.as_str();
        assert!(api.application(id).is_some());
        assert_eq!(
            api.calls(),
            vec![
                format!("create_application {id}"),
                format!("set_application_services {id}"),
            ]
        );
    }
}
