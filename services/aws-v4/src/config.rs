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

use std::fmt::{Debug, Formatter};
use std::str::FromStr;

use crate::constants::*;
use log::warn;
use postsign_core::{utils::Redact, Context};

/// Config carries all the configuration for signing S3 POST policies.
///
/// Build it once at startup, then hand it to [`crate::PostPolicySigner::new`],
/// which validates it.
#[derive(Clone, Default)]
pub struct Config {
    /// `access_key_id` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`S3_ACCESS_KEY`]
    pub access_key_id: Option<String>,
    /// `secret_access_key` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`S3_SECRET_KEY`]
    pub secret_access_key: Option<String>,
    /// `session_token` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`S3_SESSION_TOKEN`]
    pub session_token: Option<String>,
    /// `bucket` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`S3_BUCKET`]
    pub bucket: Option<String>,
    /// `region` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`S3_REGION`]
    pub region: Option<String>,
    /// Domain appended to the bucket name to build the endpoint.
    ///
    /// Falls back to [`S3_STORAGE_DOMAIN`], then `s3.amazonaws.com`.
    pub storage_domain: Option<String>,
    /// Signing algorithm, `AWS4-HMAC-SHA256` if unset.
    pub algorithm: Option<String>,
    /// Smallest accepted upload in bytes, env value: [`S3_EXPECTED_MIN_SIZE`].
    pub min_size: Option<u64>,
    /// Largest accepted upload in bytes, env value: [`S3_EXPECTED_MAX_SIZE`].
    pub max_size: Option<u64>,
    /// Where S3 redirects the browser after a successful upload.
    ///
    /// env value: [`S3_SUCCESS_URL`]
    pub redirect_url: Option<String>,
    /// Restrict uploads to content types starting with this prefix, e.g. `image/`.
    ///
    /// env value: [`S3_CONTENT_TYPE_PREFIX`]
    pub content_type_prefix: Option<String>,
    /// Signing timestamp, `20240101T000000Z` or RFC3339 in UTC.
    ///
    /// Every signing call uses the current time when unset.
    /// env value: [`S3_SIGNING_DATE`]
    pub date: Option<String>,
    /// Key browsers must present to the upload handler.
    ///
    /// env value: [`CLIENT_ACCESS_KEY`]
    pub client_access_key: Option<String>,
}

impl Config {
    /// Create a new Config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set access_key_id
    pub fn with_access_key_id(mut self, access_key_id: impl Into<String>) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self
    }

    /// Set secret_access_key
    pub fn with_secret_access_key(mut self, secret_access_key: impl Into<String>) -> Self {
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    /// Set session_token
    pub fn with_session_token(mut self, session_token: impl Into<String>) -> Self {
        self.session_token = Some(session_token.into());
        self
    }

    /// Set bucket
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    /// Set region
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set storage_domain
    pub fn with_storage_domain(mut self, storage_domain: impl Into<String>) -> Self {
        self.storage_domain = Some(storage_domain.into());
        self
    }

    /// Set algorithm
    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = Some(algorithm.into());
        self
    }

    /// Set the accepted upload size range in bytes, both ends inclusive.
    pub fn with_size_range(mut self, min_size: u64, max_size: u64) -> Self {
        self.min_size = Some(min_size);
        self.max_size = Some(max_size);
        self
    }

    /// Set redirect_url
    pub fn with_redirect_url(mut self, redirect_url: impl Into<String>) -> Self {
        self.redirect_url = Some(redirect_url.into());
        self
    }

    /// Set content_type_prefix
    pub fn with_content_type_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.content_type_prefix = Some(prefix.into());
        self
    }

    /// Set date
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Set client_access_key
    pub fn with_client_access_key(mut self, client_access_key: impl Into<String>) -> Self {
        self.client_access_key = Some(client_access_key.into());
        self
    }

    /// Load config from env.
    ///
    /// Fields that are already set are kept.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        let envs = ctx.env_vars();

        if let Some(v) = envs.get(S3_ACCESS_KEY) {
            self.access_key_id.get_or_insert(v.clone());
        }
        if let Some(v) = envs.get(S3_SECRET_KEY) {
            self.secret_access_key.get_or_insert(v.clone());
        }
        if let Some(v) = envs.get(S3_SESSION_TOKEN) {
            self.session_token.get_or_insert(v.clone());
        }
        if let Some(v) = envs.get(S3_BUCKET) {
            self.bucket.get_or_insert(v.clone());
        }
        if let Some(v) = envs.get(S3_REGION) {
            self.region.get_or_insert(v.clone());
        }
        if let Some(v) = envs.get(S3_STORAGE_DOMAIN) {
            self.storage_domain.get_or_insert(v.clone());
        }
        if let Some(v) = envs
            .get(S3_EXPECTED_MIN_SIZE)
            .and_then(|v| parse_size(S3_EXPECTED_MIN_SIZE, v))
        {
            self.min_size.get_or_insert(v);
        }
        if let Some(v) = envs
            .get(S3_EXPECTED_MAX_SIZE)
            .and_then(|v| parse_size(S3_EXPECTED_MAX_SIZE, v))
        {
            self.max_size.get_or_insert(v);
        }
        if let Some(v) = envs.get(S3_SUCCESS_URL) {
            self.redirect_url.get_or_insert(v.clone());
        }
        if let Some(v) = envs.get(S3_CONTENT_TYPE_PREFIX) {
            self.content_type_prefix.get_or_insert(v.clone());
        }
        if let Some(v) = envs.get(S3_SIGNING_DATE) {
            self.date.get_or_insert(v.clone());
        }
        if let Some(v) = envs.get(CLIENT_ACCESS_KEY) {
            self.client_access_key.get_or_insert(v.clone());
        }

        self
    }
}

fn parse_size(key: &str, value: &str) -> Option<u64> {
    match u64::from_str(value.trim()) {
        Ok(v) => Some(v),
        Err(err) => {
            warn!("env {key} has invalid size {value:?}, ignored: {err}");
            None
        }
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("access_key_id", &Redact::from(&self.access_key_id))
            .field("secret_access_key", &Redact::from(&self.secret_access_key))
            .field("session_token", &Redact::from(&self.session_token))
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("storage_domain", &self.storage_domain)
            .field("algorithm", &self.algorithm)
            .field("min_size", &self.min_size)
            .field("max_size", &self.max_size)
            .field("redirect_url", &self.redirect_url)
            .field("content_type_prefix", &self.content_type_prefix)
            .field("date", &self.date)
            .field("client_access_key", &Redact::from(&self.client_access_key))
            .finish()
    }
}
