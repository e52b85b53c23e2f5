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

use serde::{Deserialize, Serialize};

use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, NestedBlock, Schema,
};
use tf_provider::value::{Value, ValueList, ValueString};
use tf_provider::{map, AttributePath, Diagnostics};

use crate::client::ApplicationServiceScope;
use crate::scope::{validate_scopes, WithScope};
use crate::utils::{owned, owned_list, WithNormalize, WithSchema, WithValidate};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicesResourceState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub application_id: ValueString<'a>,
    pub service: ValueList<Value<ServiceBlock<'a>>>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceBlock<'a> {
    #[serde(borrow = "'a")]
    pub name: ValueString<'a>,
    pub roles: ValueList<ValueString<'a>>,
}

impl<'a> WithScope<'a> for ServiceBlock<'a> {
    const SERVICE_ATTRIBUTE: &'static str = "name";

    fn service(&self) -> &ValueString<'a> {
        &self.name
    }
    fn roles(&self) -> &ValueList<ValueString<'a>> {
        &self.roles
    }
    fn from_scope(scope: ApplicationServiceScope) -> Self {
        Self {
            name: owned(scope.service),
            roles: owned_list(scope.roles),
        }
    }
}

impl<'a> WithSchema for ServicesResourceState<'a> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                description: Description::plain(
                    "Defines the services which the API key has access to and the access roles it has for each.",
                ),
                attributes: map! {
                    "id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("ID of the application the services apply to"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "application_id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("ID of application to apply services access to"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                },
                blocks: map! {
                    "service" => NestedBlock::List(Block {
                        description: Description::plain("Defines service access"),
                        attributes: map! {
                            "name" => Attribute {
                                attr_type: AttributeType::String,
                                description: Description::plain("Name of service"),
                                constraint: AttributeConstraint::Required,
                                ..Default::default()
                            },
                            "roles" => Attribute {
                                attr_type: AttributeType::List(AttributeType::String.into()),
                                description: Description::plain("List of service roles"),
                                constraint: AttributeConstraint::Required,
                                ..Default::default()
                            },
                        },
                        ..Default::default()
                    }),
                },
                ..Default::default()
            },
        }
    }
}

impl<'a> WithValidate for ServicesResourceState<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        if let Value::Value(application_id) = &self.application_id {
            if application_id.trim().is_empty() {
                diags.error_short(
                    "`application_id` must not be empty",
                    attr_path.clone().attribute("application_id"),
                );
            }
        }
        validate_scopes(diags, attr_path.attribute("service"), &self.service);
    }
}

impl<'a> WithNormalize for ServicesResourceState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if self.id.is_null() {
            self.id = match &self.application_id {
                Value::Value(application_id) => Value::Value(application_id.clone()),
                _ => Value::Unknown,
            };
        }
    }
}
