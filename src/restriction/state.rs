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
    Attribute, AttributeConstraint, AttributeType, Block, Description, Schema,
};
use tf_provider::value::{Value, ValueList, ValueString};
use tf_provider::{map, AttributePath, Diagnostics};

use crate::utils::{WithNormalize, WithSchema, WithValidate};

use super::validate_restriction;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestrictionResourceState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub application_id: ValueString<'a>,
    #[serde(rename = "type")]
    pub restriction_type: ValueString<'a>,
    pub ranges: ValueList<ValueString<'a>>,
}

impl<'a> WithSchema for RestrictionResourceState<'a> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                description: Description::plain(
                    "IP restriction applied to the API key of an application",
                ),
                attributes: map! {
                    "id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("ID of the application the restriction applies to"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "application_id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("ID of application to restrict"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
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
            },
        }
    }
}

impl<'a> WithValidate for RestrictionResourceState<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        if let Value::Value(application_id) = &self.application_id {
            if application_id.trim().is_empty() {
                diags.error_short(
                    "`application_id` must not be empty",
                    attr_path.clone().attribute("application_id"),
                );
            }
        }
        validate_restriction(
            diags,
            attr_path.clone().attribute("type"),
            attr_path.attribute("ranges"),
            &self.restriction_type,
            &self.ranges,
        );
    }
}

impl<'a> WithNormalize for RestrictionResourceState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if self.id.is_null() {
            self.id = match &self.application_id {
                Value::Value(application_id) => Value::Value(application_id.clone()),
                _ => Value::Unknown,
            };
        }
    }
}
