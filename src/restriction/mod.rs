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

use std::net::IpAddr;

use tf_provider::value::{Value, ValueList, ValueString};
use tf_provider::{AttributePath, Diagnostics};

use crate::utils::{expand_strings, DisplayJoinable};

mod resource;
mod state;

pub use resource::ApplicationRestrictionResource;

pub(crate) const RESTRICTION_TYPES: [&str; 2] = ["allowlist", "denylist"];

/// Check a restriction type and its IP ranges.
///
/// Unknown values are skipped: they are checked again once known.
pub(crate) fn validate_restriction(
    diags: &mut Diagnostics,
    type_path: AttributePath,
    ranges_path: AttributePath,
    restriction_type: &ValueString<'_>,
    ranges: &ValueList<ValueString<'_>>,
) {
    if let Value::Value(restriction_type) = restriction_type {
        if !RESTRICTION_TYPES.contains(&&**restriction_type) {
            diags.error(
                "Invalid restriction type",
                format!(
                    "`{restriction_type}` is not a valid restriction type, expected one of: {}",
                    RESTRICTION_TYPES.iter().join_with(", ")
                ),
                type_path,
            );
        }
    }

    if let Value::Value(ranges) = ranges {
        for (i, range) in ranges.iter().enumerate() {
            if let Value::Value(range) = range {
                if let Err(reason) = check_range(range) {
                    diags.error(
                        "Invalid IP range",
                        format!("`{range}` is not an IP address or CIDR block: {reason}"),
                        ranges_path.clone().index(i as i64),
                    );
                }
            }
        }
    }
}

fn check_range(range: &str) -> Result<(), String> {
    let (address, prefix) = match range.split_once('/') {
        Some((address, prefix)) => (address, Some(prefix)),
        None => (range, None),
    };

    let address: IpAddr = address
        .parse()
        .map_err(|_| format!("`{address}` is not an IP address"))?;

    if let Some(prefix) = prefix {
        let max = if address.is_ipv4() { 32 } else { 128 };
        match prefix.parse::<u8>() {
            Ok(prefix) if prefix <= max => {}
            _ => return Err(format!("prefix length must be between 0 and {max}")),
        }
    }

    Ok(())
}

/// Compare ranges regardless of their order.
pub(crate) fn same_ranges(recorded: &ValueList<ValueString<'_>>, remote: &[String]) -> bool {
    let mut recorded = expand_strings(recorded);
    let mut remote = remote.to_vec();
    recorded.sort();
    remote.sort();
    recorded == remote
}
