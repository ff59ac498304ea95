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

use crate::constants::*;
use crate::form::{PostForm, SignedFields};
use crate::policy::{Condition, PolicyDocument, PolicyField};
use crate::{Config, Credential};
use chrono::TimeDelta;
use log::debug;
use postsign_core::hash::{hex_hmac_sha256, hmac_sha256};
use postsign_core::time::{format_date, format_iso8601, now, parse_signing_time, DateTime};
use postsign_core::{Error, Result};

/// UploadRequest describes the single object a signed form will allow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Object key the file will be stored under.
    pub key: String,
    /// Declared content type of the file.
    pub content_type: String,
    /// Value of `x-amz-meta-tag`, empty if unset.
    pub tag: Option<String>,
}

impl UploadRequest {
    /// Create a new upload request.
    pub fn new(key: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            content_type: content_type.into(),
            tag: None,
        }
    }

    /// Set the metadata tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

/// PostPolicySigner signs S3 POST policies with AWS SigV4.
///
/// - [Browser-based uploads using POST](https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-UsingHTTPPOST.html)
///
/// The signer is immutable once built and can be shared across threads.
#[derive(Debug, Clone)]
pub struct PostPolicySigner {
    credential: Credential,
    bucket: String,
    region: String,
    endpoint_url: String,
    algorithm: String,
    min_size: u64,
    max_size: u64,
    redirect_url: Option<String>,
    content_type_prefix: Option<String>,
    date: Option<DateTime>,

    time: Option<DateTime>,
}

impl PostPolicySigner {
    /// Build a signer from config, failing fast on anything that would yield
    /// a signature S3 rejects.
    pub fn new(config: &Config) -> Result<Self> {
        let credential = Credential {
            access_key_id: required(&config.access_key_id, "access key")?,
            secret_access_key: required(&config.secret_access_key, "secret key")?,
            session_token: non_empty(&config.session_token),
        };
        let bucket = required(&config.bucket, "bucket")?;
        let region = required(&config.region, "region")?;

        let algorithm = non_empty(&config.algorithm).unwrap_or_else(|| AWS4_HMAC_SHA256.into());
        if algorithm != AWS4_HMAC_SHA256 {
            return Err(Error::config_invalid(format!(
                "signing algorithm {algorithm} is not supported"
            )));
        }

        let min_size = config.min_size.unwrap_or(DEFAULT_MIN_SIZE);
        let max_size = config.max_size.unwrap_or(DEFAULT_MAX_SIZE);
        if min_size > max_size {
            return Err(Error::config_invalid(format!(
                "min size {min_size} is larger than max size {max_size}"
            )));
        }

        let date = config
            .date
            .as_deref()
            .map(parse_signing_time)
            .transpose()?;

        let storage_domain = non_empty(&config.storage_domain)
            .unwrap_or_else(|| DEFAULT_STORAGE_DOMAIN.into());
        let endpoint_url = format!(
            "https://{}.{}/",
            bucket,
            storage_domain.trim_end_matches('/')
        );

        Ok(Self {
            credential,
            bucket,
            region,
            endpoint_url,
            algorithm,
            min_size,
            max_size,
            redirect_url: non_empty(&config.redirect_url),
            content_type_prefix: non_empty(&config.content_type_prefix),
            date,

            time: None,
        })
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign policies.
    /// Only use this function for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// The URL browsers post the form to: `https://<bucket>.<storage-domain>/`
    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    /// Sign a POST policy for the given upload.
    ///
    /// The policy expires five minutes after this call.
    pub fn sign(&self, req: &UploadRequest) -> Result<PostForm> {
        self.check_request(req)?;

        let now = self.time.unwrap_or_else(now);
        let date = self.date.unwrap_or(now);
        let expires_in = TimeDelta::from_std(POLICY_EXPIRES_IN)
            .map_err(|e| Error::unexpected("policy expiration out of range").with_source(e))?;

        let scope = self.credential.credential_scope(date, &self.region);
        debug!("calculated scope: {scope}");

        let mut form = FormBuilder::new(now + expires_in);
        form.condition(Condition::Exact(PolicyField::Bucket, self.bucket.clone()));
        form.exact(PolicyField::Key, &req.key);
        form.exact(PolicyField::Acl, ACL_PUBLIC_READ);
        match &self.content_type_prefix {
            Some(prefix) => form.starts_with(PolicyField::ContentType, prefix, &req.content_type),
            None => form.exact(PolicyField::ContentType, &req.content_type),
        }
        form.condition(Condition::ContentLengthRange(self.min_size, self.max_size));
        form.exact(PolicyField::ServerSideEncryption, SSE_AES256);
        form.starts_with(
            PolicyField::AmzMeta(META_TAG.into()),
            "",
            req.tag.as_deref().unwrap_or_default(),
        );
        form.exact(PolicyField::AmzCredential, &scope);
        form.exact(PolicyField::AmzAlgorithm, &self.algorithm);
        form.exact(PolicyField::AmzDate, &format_iso8601(date));
        if let Some(token) = &self.credential.session_token {
            form.exact(PolicyField::AmzSecurityToken, token);
        }
        if let Some(url) = &self.redirect_url {
            form.exact(PolicyField::SuccessActionRedirect, url);
        }

        let FormBuilder { policy, mut fields } = form;

        let string_to_sign = policy.to_base64()?;
        debug!("calculated string to sign: {string_to_sign}");

        let signature = self.signature(&string_to_sign, date);
        fields.insert(POLICY, string_to_sign);
        fields.insert(X_AMZ_SIGNATURE, signature);

        Ok(PostForm {
            endpoint_url: self.endpoint_url.clone(),
            params: fields,
        })
    }

    /// Sign a string with the key derived for `date`, in lowercase hex.
    pub fn signature(&self, string_to_sign: &str, date: DateTime) -> String {
        let signing_key = generate_signing_key(
            &self.credential.secret_access_key,
            date,
            &self.region,
            SERVICE_S3,
        );
        hex_hmac_sha256(&signing_key, string_to_sign.as_bytes())
    }

    fn check_request(&self, req: &UploadRequest) -> Result<()> {
        if req.key.is_empty() {
            return Err(Error::request_invalid("object key must not be empty"));
        }
        if req.content_type.is_empty() {
            return Err(Error::request_invalid("content type must not be empty"));
        }
        if let Some(prefix) = &self.content_type_prefix {
            if !req.content_type.starts_with(prefix.as_str()) {
                return Err(Error::request_invalid(format!(
                    "content type {} is not allowed, expected {prefix}*",
                    req.content_type
                )));
            }
        }

        Ok(())
    }
}

/// Builds the policy and its form fields together, so every condition bound to a
/// form field always has a value satisfying it.
struct FormBuilder {
    policy: PolicyDocument,
    fields: SignedFields,
}

impl FormBuilder {
    fn new(expiration: DateTime) -> Self {
        Self {
            policy: PolicyDocument::new(expiration),
            fields: SignedFields::default(),
        }
    }

    fn exact(&mut self, field: PolicyField, value: &str) {
        self.bind(Condition::Exact(field, value.to_string()), value);
    }

    fn starts_with(&mut self, field: PolicyField, prefix: &str, value: &str) {
        self.bind(Condition::StartsWith(field, prefix.to_string()), value);
    }

    fn bind(&mut self, condition: Condition, value: &str) {
        debug_assert!(condition.matches(value));

        if let Condition::Exact(field, _) | Condition::StartsWith(field, _) = &condition {
            self.fields.insert(field.name(), value);
        }
        self.policy.push(condition);
    }

    /// Conditions with no form field of their own.
    fn condition(&mut self, condition: Condition) {
        self.policy.push(condition);
    }
}

/// Derive the SigV4 signing key.
///
/// Every step feeds the raw HMAC output of the previous one as key.
pub fn generate_signing_key(secret: &str, date: DateTime, region: &str, service: &str) -> Vec<u8> {
    // Sign secret
    let secret = format!("AWS4{secret}");
    // Sign date
    let sign_date = hmac_sha256(secret.as_bytes(), format_date(date).as_bytes());
    // Sign region
    let sign_region = hmac_sha256(sign_date.as_slice(), region.as_bytes());
    // Sign service
    let sign_service = hmac_sha256(sign_region.as_slice(), service.as_bytes());
    // Sign request
    hmac_sha256(sign_service.as_slice(), "aws4_request".as_bytes())
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

fn required(value: &Option<String>, name: &str) -> Result<String> {
    non_empty(value).ok_or_else(|| Error::config_invalid(format!("{name} is required")))
}
