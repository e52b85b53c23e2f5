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

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;

use super::error::ApiError;
use super::{
    AccountService, Application, ApplicationCreated, ApplicationRestriction,
    ApplicationServices, CreateApplicationRequest, Result, SetRestrictionRequest,
    SetServiceRequest, UpdateApplicationRequest,
};

#[derive(Debug, Default)]
struct Store {
    next_id: u64,
    applications: BTreeMap<String, Application>,
    services: BTreeMap<String, ApplicationServices>,
    restrictions: BTreeMap<String, ApplicationRestriction>,
    calls: Vec<String>,
    failing: BTreeSet<String>,
}

/// Account API double keeping everything in memory and recording each call
/// as `"<method> <id>"`.
#[derive(Debug, Default, Clone)]
pub(crate) struct InMemoryAccountService {
    store: Arc<Mutex<Store>>,
}

impl InMemoryAccountService {
    pub fn insert_application(&self, name: &str, description: &str) -> String {
        let mut store = self.store.lock().unwrap();
        store.next_id += 1;
        let id = format!("app-{}", store.next_id);
        store.applications.insert(
            id.clone(),
            Application {
                id: id.clone(),
                name: name.to_owned(),
                description: description.to_owned(),
                created_at: None,
            },
        );
        id
    }

    pub fn application(&self, id: &str) -> Option<Application> {
        self.store.lock().unwrap().applications.get(id).cloned()
    }

    pub fn services(&self, id: &str) -> Option<ApplicationServices> {
        self.store.lock().unwrap().services.get(id).cloned()
    }

    pub fn put_services(&self, id: &str, services: ApplicationServices) {
        self.store
            .lock()
            .unwrap()
            .services
            .insert(id.to_owned(), services);
    }

    pub fn restriction(&self, id: &str) -> Option<ApplicationRestriction> {
        self.store.lock().unwrap().restrictions.get(id).cloned()
    }

    pub fn put_restriction(&self, id: &str, restriction: ApplicationRestriction) {
        self.store
            .lock()
            .unwrap()
            .restrictions
            .insert(id.to_owned(), restriction);
    }

    pub fn calls(&self) -> Vec<String> {
        self.store.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.store.lock().unwrap().calls.clear();
    }

    /// Make every later call to `method` fail with a server error.
    pub fn fail(&self, method: &str) {
        self.store.lock().unwrap().failing.insert(method.to_owned());
    }

    fn record(&self, method: &str, id: &str) -> Result<std::sync::MutexGuard<'_, Store>> {
        let mut store = self.store.lock().unwrap();
        store.calls.push(format!("{method} {id}"));
        if store.failing.contains(method) {
            return Err(ApiError::Api {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: format!("{method} failed"),
            });
        }
        Ok(store)
    }
}

fn exists(store: &Store, id: &str) -> Result<()> {
    if id.is_empty() {
        Err(ApiError::InvalidId)
    } else if store.applications.contains_key(id) {
        Ok(())
    } else {
        Err(ApiError::ApplicationNotFound(id.to_owned()))
    }
}

#[async_trait]
impl AccountService for InMemoryAccountService {
    async fn create_application(
        &self,
        request: &CreateApplicationRequest,
    ) -> Result<ApplicationCreated> {
        let id = self.insert_application(&request.name, &request.description);
        self.record("create_application", &id)?;
        Ok(ApplicationCreated {
            key: format!("key-{id}"),
            id,
        })
    }

    async fn get_application(&self, id: &str) -> Result<Application> {
        let store = self.record("get_application", id)?;
        exists(&store, id)?;
        Ok(store.applications[id].clone())
    }

    async fn update_application(
        &self,
        id: &str,
        request: &UpdateApplicationRequest,
    ) -> Result<()> {
        let mut store = self.record("update_application", id)?;
        exists(&store, id)?;
        if let Some(application) = store.applications.get_mut(id) {
            if let Some(name) = &request.name {
                application.name.clone_from(name);
            }
            if let Some(description) = &request.description {
                application.description.clone_from(description);
            }
        }
        Ok(())
    }

    async fn delete_application(&self, id: &str) -> Result<()> {
        let mut store = self.record("delete_application", id)?;
        exists(&store, id)?;
        store.applications.remove(id);
        store.services.remove(id);
        store.restrictions.remove(id);
        Ok(())
    }

    async fn get_application_services(&self, id: &str) -> Result<ApplicationServices> {
        let store = self.record("get_application_services", id)?;
        exists(&store, id)?;
        Ok(store.services.get(id).cloned().unwrap_or_default())
    }

    async fn set_application_services(
        &self,
        id: &str,
        request: &SetServiceRequest,
    ) -> Result<()> {
        let mut store = self.record("set_application_services", id)?;
        exists(&store, id)?;
        store.services.insert(
            id.to_owned(),
            ApplicationServices {
                scopes: request.scopes.clone(),
            },
        );
        Ok(())
    }

    async fn delete_application_services(&self, id: &str) -> Result<()> {
        let mut store = self.record("delete_application_services", id)?;
        exists(&store, id)?;
        store.services.remove(id);
        Ok(())
    }

    async fn get_application_restrictions(&self, id: &str) -> Result<ApplicationRestriction> {
        let store = self.record("get_application_restrictions", id)?;
        exists(&store, id)?;
        Ok(store.restrictions.get(id).cloned().unwrap_or_default())
    }

    async fn set_application_restrictions(
        &self,
        id: &str,
        request: &SetRestrictionRequest,
    ) -> Result<()> {
        let mut store = self.record("set_application_restrictions", id)?;
        exists(&store, id)?;
        store.restrictions.insert(
            id.to_owned(),
            ApplicationRestriction {
                ip_restriction_type: request.ip_restriction_type.clone(),
                ip_ranges: request.ip_ranges.clone(),
            },
        );
        Ok(())
    }

    async fn delete_application_restrictions(&self, id: &str) -> Result<()> {
        let mut store = self.record("delete_application_restrictions", id)?;
        exists(&store, id)?;
        store.restrictions.remove(id);
        Ok(())
    }
}
