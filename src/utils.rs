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

use std::borrow::Cow;
use std::cell::RefCell;

use tf_provider::value::{Value, ValueList, ValueString};
use tf_provider::{AttributePath, Diagnostics, Schema};

pub(crate) trait WithSchema {
    fn schema() -> Schema;
}

pub(crate) trait WithValidate {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath);
}

impl<T: WithValidate> WithValidate for Value<T> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        if let Value::Value(value) = self {
            value.validate(diags, attr_path);
        }
    }
}

pub(crate) trait WithNormalize {
    fn normalize(&mut self, diags: &mut Diagnostics);
}

/// Owned Terraform string.
pub(crate) fn owned<'a>(value: impl Into<String>) -> ValueString<'a> {
    Value::Value(Cow::Owned(value.into()))
}

/// Owned Terraform string, or null when empty.
pub(crate) fn owned_or_null<'a>(value: impl Into<String>) -> ValueString<'a> {
    let value = value.into();
    if value.is_empty() {
        Value::Null
    } else {
        owned(value)
    }
}

pub(crate) fn owned_list<'a>(values: impl IntoIterator<Item = String>) -> ValueList<ValueString<'a>> {
    Value::Value(values.into_iter().map(owned).collect())
}

/// Known strings of a Terraform list. Null and unknown elements are skipped.
pub(crate) fn expand_strings(values: &ValueList<ValueString<'_>>) -> Vec<String> {
    match values {
        Value::Value(values) => values
            .iter()
            .filter_map(|value| value.as_deref_option())
            .map(str::to_owned)
            .collect(),
        _ => Vec::new(),
    }
}

pub struct DisplayJoiner<'a, T, I>
where
    T: Iterator<Item = I>,
    I: std::fmt::Display,
{
    iter: RefCell<T>,
    sep: &'a str,
}

pub trait DisplayJoinable {
    type Joiner<'a>;
    fn join_with(self, sep: &str) -> Self::Joiner<'_>;
}

impl<T, I> DisplayJoinable for T
where
    T: Iterator<Item = I>,
    I: std::fmt::Display,
{
    type Joiner<'a> = DisplayJoiner<'a, T, I>;

    fn join_with(self, sep: &str) -> Self::Joiner<'_> {
        DisplayJoiner {
            iter: RefCell::new(self),
            sep,
        }
    }
}

impl<'a, T, I> std::fmt::Display for DisplayJoiner<'a, T, I>
where
    T: Iterator<Item = I>,
    I: std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut sep = "";
        let mut iter = self.iter.try_borrow_mut().or(Err(std::fmt::Error))?;
        for elt in iter.by_ref() {
            f.write_str(sep)?;
            f.write_fmt(format_args!("{elt}"))?;
            sep = self.sep;
        }
        Ok(())
    }
}
