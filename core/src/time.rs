// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Time related utils.

use crate::Error;
use crate::Result;
use chrono::NaiveDateTime;
use chrono::Utc;

/// DateTime is the alias for chrono::DateTime<Utc>.
pub type DateTime = chrono::DateTime<Utc>;

/// Create datetime of now.
pub fn now() -> DateTime {
    Utc::now()
}

/// Format time into date: `20220301`
pub fn format_date(t: DateTime) -> String {
    t.format("%Y%m%d").to_string()
}

/// Format time into ISO8601 basic format: `20220313T072004Z`
pub fn format_iso8601(t: DateTime) -> String {
    t.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Format time into RFC3339 with milliseconds: `2022-03-13T07:20:04.000Z`
///
/// This is the form S3 expects for the `expiration` of a POST policy.
pub fn format_rfc3339_millis(t: DateTime) -> String {
    t.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Parse ISO8601 basic format: `20220313T072004Z`
///
/// Only the exact 16-character form is accepted.
pub fn parse_iso8601(s: &str) -> Result<DateTime> {
    if s.len() != 16 {
        return Err(Error::config_invalid(format!(
            "time {s} is not in ISO8601 basic format"
        )));
    }

    let t = NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%SZ").map_err(|e| {
        Error::config_invalid(format!("time {s} is not in ISO8601 basic format")).with_source(e)
    })?;
    Ok(t.and_utc())
}

/// Parse time from RFC3339.
///
/// Only UTC (`Z` or `+00:00`) times are accepted, since SigV4 dates are always UTC.
pub fn parse_rfc3339(s: &str) -> Result<DateTime> {
    let t = chrono::DateTime::parse_from_rfc3339(s).map_err(|e| {
        Error::config_invalid(format!("time {s} is not in RFC3339 format")).with_source(e)
    })?;
    if t.offset().local_minus_utc() != 0 {
        return Err(Error::config_invalid(format!("time {s} is not in UTC")));
    }
    Ok(t.with_timezone(&Utc))
}

/// Parse a configured signing time.
///
/// Accepts the AWS compact form (`20240101T000000Z`) or RFC3339 in UTC
/// (`2024-01-01T00:00:00.000Z`).
pub fn parse_signing_time(s: &str) -> Result<DateTime> {
    if s.contains('-') || s.contains(':') {
        parse_rfc3339(s)
    } else {
        parse_iso8601(s)
    }
}
