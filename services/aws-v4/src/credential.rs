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

use crate::constants::SERVICE_S3;
use postsign_core::time::{format_date, DateTime};
use postsign_core::utils::Redact;
use std::fmt::{Debug, Formatter};

/// Credential that holds the access_key and secret_key.
#[derive(Default, Clone)]
pub struct Credential {
    /// Access key id for aws services.
    pub access_key_id: String,
    /// Secret access key for aws services.
    pub secret_access_key: String,
    /// Session token for temporary credentials.
    pub session_token: Option<String>,
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_key_id", &Redact::from(&self.access_key_id))
            .field("secret_access_key", &Redact::from(&self.secret_access_key))
            .field("session_token", &Redact::from(&self.session_token))
            .finish()
    }
}

impl Credential {
    /// Build the value of `x-amz-credential` for this credential.
    ///
    /// `<access_key_id>/20220313/<region>/s3/aws4_request`
    pub fn credential_scope(&self, date: DateTime, region: &str) -> String {
        credential_scope(&self.access_key_id, date, region)
    }
}

/// Scope: `<access_key_id>/20220313/<region>/s3/aws4_request`
///
/// The date part comes from [`format_date`], the same formatter the signing key
/// derivation uses.
pub fn credential_scope(access_key_id: &str, date: DateTime, region: &str) -> String {
    format!(
        "{}/{}/{}/{}/aws4_request",
        access_key_id,
        format_date(date),
        region,
        SERVICE_S3
    )
}
