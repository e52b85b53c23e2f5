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

use crate::client::{ApplicationServiceScope, SetRestrictionRequest};
use crate::restriction::validate_restriction;
use crate::scope::{validate_scopes, WithScope};
use crate::utils::{expand_strings, owned, owned_list, WithNormalize, WithSchema, WithValidate};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub key: ValueString<'a>,
    pub scope: ValueList<Value<ScopeBlock<'a>>>,
    pub ip_restriction: Value<RestrictionBlock<'a>>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeBlock<'a> {
    #[serde(borrow = "'a")]
    pub service: ValueString<'a>,
    pub roles: ValueList<ValueString<'a>>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestrictionBlock<'a> {
    #[serde(borrow = "'a", rename = "type")]
    pub restriction_type: ValueString<'a>,
    pub ranges: ValueList<ValueString<'a>>,
}

impl<'a> WithScope<'a> for ScopeBlock<'a> {
    const SERVICE_ATTRIBUTE: &'static str = "service";

    fn service(&self) -> &ValueString<'a> {
        &self.service
    }
    fn roles(&self) -> &ValueList<ValueString<'a>> {
        &self.roles
    }
    fn from_scope(scope: ApplicationServiceScope) -> Self {
        Self {
            service: owned(scope.service),
            roles: owned_list(scope.roles),
        }
    }
}

impl<'a> RestrictionBlock<'a> {
    pub fn request(&self) -> SetRestrictionRequest {
        SetRestrictionRequest {
            ip_restriction_type: self.restriction_type.as_str().to_owned(),
            ip_ranges: expand_strings(&self.ranges),
        }
    }
}

impl<'a> WithSchema for ApplicationState<'a> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                description: Description::plain(
                    "API application: its key, the services it can reach and where it can be used from",
                ),
                attributes: map! {
                    "id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("ID of the application"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "name" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Name of the application"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "description" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Description of the application"),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "key" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("API key of the application, only known after creation"),
                        constraint: AttributeConstraint::Computed,
                        sensitive: true,
                        ..Default::default()
                    },
                },
                blocks: map! {
                    "scope" => NestedBlock::List(Block {
                        description: Description::plain("Access granted to a service"),
                        attributes: map! {
                            "service" => Attribute {
                                attr_type: AttributeType::String,
                                description: Description::plain("Name of the service"),
                                constraint: AttributeConstraint::Required,
                                ..Default::default()
                            },
                            "roles" => Attribute {
                                attr_type: AttributeType::List(AttributeType::String.into()),
                                description: Description::plain("Roles held on the service"),
                                constraint: AttributeConstraint::Required,
                                ..Default::default()
                            },
                        },
                        ..Default::default()
                    }),
                    "ip_restriction" => NestedBlock::Optional(Block {
                        description: Description::plain("IP restriction of the API key"),
                        attributes: map! {
                            "type" => Attribute {
                                attr_type: AttributeType::String,
                                description: Description::plain("Restriction type: `allowlist` or `denylist`"),
                                constraint: AttributeConstraint::Required,
                                ..Default::default()
                            },
                            "ranges" => Attribute {
                                attr_type: AttributeType::List(AttributeType::String.into()),
                                description: Description::plain("IP addresses or CIDR blocks"),
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

impl<'a> WithValidate for RestrictionBlock<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_restriction(
            diags,
            attr_path.clone().attribute("type"),
            attr_path.attribute("ranges"),
            &self.restriction_type,
            &self.ranges,
        );
    }
}

impl<'a> WithValidate for ApplicationState<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        if let Value::Value(name) = &self.name {
            if name.trim().is_empty() {
                diags.error_short(
                    "`name` must not be empty",
                    attr_path.clone().attribute("name"),
                );
            }
        }
        validate_scopes(diags, attr_path.clone().attribute("scope"), &self.scope);
        self.ip_restriction
            .validate(diags, attr_path.attribute("ip_restriction"));
    }
}

impl<'a> WithNormalize for ApplicationState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if self.id.is_null() {
            self.id = Value::Unknown;
        }
        if self.key.is_null() {
            self.key = Value::Unknown;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restriction<'a>(restriction_type: &str, ranges: &[&str]) -> Value<RestrictionBlock<'a>> {
        Value::Value(RestrictionBlock {
            restriction_type: owned(restriction_type),
            ranges: owned_list(ranges.iter().map(|r| r.to_string())),
        })
    }

    #[test]
    fn empty_name_is_rejected() {
        let state = ApplicationState {
            name: owned("  "),
            ..Default::default()
        };

        let mut diags = Diagnostics::default();
        state.validate(&mut diags, AttributePath::default());
        assert_eq!(diags.errors.len(), 1);
    }

    #[test]
    fn nested_blocks_are_validated() {
        let state = ApplicationState {
            name: owned("app"),
            scope: Value::Value(vec![
                Value::Value(ScopeBlock::from_scope(ApplicationServiceScope {
                    service: "ecloud".into(),
                    roles: vec!["read".into()],
                })),
                Value::Value(ScopeBlock::from_scope(ApplicationServiceScope {
                    service: "ecloud".into(),
                    roles: vec![],
                })),
            ]),
            ip_restriction: restriction("greylist", &["10.0.0.0/8"]),
            ..Default::default()
        };

        let mut diags = Diagnostics::default();
        state.validate(&mut diags, AttributePath::default());
        assert_eq!(diags.errors.len(), 2);
    }

    #[test]
    fn unknown_name_passes() {
        let state = ApplicationState {
            name: Value::Unknown,
            ip_restriction: restriction("allowlist", &["10.0.0.0/8", "::1"]),
            ..Default::default()
        };

        let mut diags = Diagnostics::default();
        state.validate(&mut diags, AttributePath::default());
        assert!(diags.errors.is_empty());
    }

    #[test]
    fn restriction_request_keeps_ranges() {
        let Value::Value(block) = restriction("denylist", &["1.1.1.1", "2.2.2.2"]) else {
            unreachable!()
        };
        assert_eq!(
            block.request(),
            SetRestrictionRequest {
                ip_restriction_type: "denylist".into(),
                ip_ranges: vec!["1.1.1.1".into(), "2.2.2.2".into()],
            }
        );
    }
}
