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

//! Service scopes: conversion between Terraform values and API scopes, and
//! drift detection.
//!
//! The API does not preserve the order of scopes nor of roles, so every
//! comparison happens on normalized scopes: entries sorted by service name,
//! roles sorted lexicographically.

use std::collections::BTreeSet;

use tf_provider::value::{Value, ValueList, ValueString};
use tf_provider::{AttributePath, Diagnostics};

use crate::client::ApplicationServiceScope;
use crate::utils::expand_strings;

/// A block of the Terraform schema describing access to one service.
pub(crate) trait WithScope<'a>: Sized {
    /// Name of the attribute holding the service name within the block.
    const SERVICE_ATTRIBUTE: &'static str;

    fn service(&self) -> &ValueString<'a>;
    fn roles(&self) -> &ValueList<ValueString<'a>>;
    fn from_scope(scope: ApplicationServiceScope) -> Self;
}

pub(crate) fn normalize_scopes(scopes: &mut [ApplicationServiceScope]) {
    for scope in scopes.iter_mut() {
        scope.roles.sort();
    }
    scopes.sort_by(|a, b| a.service.cmp(&b.service));
}

/// Terraform blocks to normalized API scopes.
///
/// Null or unknown lists count as empty.
pub(crate) fn expand_scopes<'a, S: WithScope<'a>>(
    scopes: &ValueList<Value<S>>,
) -> Vec<ApplicationServiceScope> {
    let Value::Value(scopes) = scopes else {
        return Vec::new();
    };

    let mut expanded: Vec<_> = scopes
        .iter()
        .filter_map(Value::as_ref_option)
        .map(|scope| ApplicationServiceScope {
            service: scope.service().as_str().to_owned(),
            roles: expand_strings(scope.roles()),
        })
        .collect();

    tracing::debug!(scopes = ?expanded, "expanded application service scopes");

    normalize_scopes(&mut expanded);
    expanded
}

/// API scopes to normalized Terraform blocks.
pub(crate) fn flatten_scopes<'a, S: WithScope<'a>>(
    mut scopes: Vec<ApplicationServiceScope>,
) -> ValueList<Value<S>> {
    normalize_scopes(&mut scopes);

    tracing::debug!(scopes = ?scopes, "read application service scopes");

    Value::Value(
        scopes
            .into_iter()
            .map(|scope| Value::Value(S::from_scope(scope)))
            .collect(),
    )
}

/// Whether the remote scopes differ from the recorded ones once both are
/// normalized.
pub(crate) fn scopes_drifted<'a, S: WithScope<'a>>(
    recorded: &ValueList<Value<S>>,
    remote: &[ApplicationServiceScope],
) -> bool {
    let mut remote = remote.to_vec();
    normalize_scopes(&mut remote);
    expand_scopes(recorded) != remote
}

/// Whether two sets of Terraform blocks describe different scopes.
pub(crate) fn scopes_changed<'a, S: WithScope<'a>>(
    prior: &ValueList<Value<S>>,
    planned: &ValueList<Value<S>>,
) -> bool {
    expand_scopes(prior) != expand_scopes(planned)
}

/// Report services that appear in more than one block.
pub(crate) fn validate_scopes<'a, S: WithScope<'a>>(
    diags: &mut Diagnostics,
    attr_path: AttributePath,
    scopes: &ValueList<Value<S>>,
) {
    let Value::Value(scopes) = scopes else {
        return;
    };

    let mut seen = BTreeSet::new();
    for (i, scope) in scopes.iter().enumerate() {
        let Value::Value(scope) = scope else {
            continue;
        };
        let Value::Value(service) = scope.service() else {
            continue;
        };
        let service_path = attr_path
            .clone()
            .index(i as i64)
            .attribute(S::SERVICE_ATTRIBUTE);
        if service.is_empty() {
            diags.error_short("Service name must not be empty", service_path);
        } else if !seen.insert(&**service) {
            diags.error(
                "Duplicate service",
                format!("The service `{service}` is defined more than once."),
                service_path,
            );
        }
    }
}
