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

use std::time::Duration;

// Form fields used in aws POST policies.
pub const KEY: &str = "key";
pub const ACL: &str = "acl";
pub const POLICY: &str = "policy";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const SUCCESS_ACTION_REDIRECT: &str = "success_action_redirect";
pub const X_AMZ_ALGORITHM: &str = "x-amz-algorithm";
pub const X_AMZ_CREDENTIAL: &str = "x-amz-credential";
pub const X_AMZ_DATE: &str = "x-amz-date";
pub const X_AMZ_SECURITY_TOKEN: &str = "x-amz-security-token";
pub const X_AMZ_SERVER_SIDE_ENCRYPTION: &str = "x-amz-server-side-encryption";
pub const X_AMZ_SIGNATURE: &str = "x-amz-signature";
pub const X_AMZ_META_PREFIX: &str = "x-amz-meta-";

// Env values used to configure the signer.
pub const S3_ACCESS_KEY: &str = "S3_ACCESS_KEY";
pub const S3_SECRET_KEY: &str = "S3_SECRET_KEY";
pub const S3_SESSION_TOKEN: &str = "S3_SESSION_TOKEN";
pub const S3_BUCKET: &str = "S3_BUCKET";
pub const S3_REGION: &str = "S3_REGION";
pub const S3_STORAGE_DOMAIN: &str = "S3_STORAGE_DOMAIN";
pub const S3_EXPECTED_MIN_SIZE: &str = "S3_EXPECTED_MIN_SIZE";
pub const S3_EXPECTED_MAX_SIZE: &str = "S3_EXPECTED_MAX_SIZE";
pub const S3_SUCCESS_URL: &str = "S3_SUCCESS_URL";
pub const S3_CONTENT_TYPE_PREFIX: &str = "S3_CONTENT_TYPE_PREFIX";
pub const S3_SIGNING_DATE: &str = "S3_SIGNING_DATE";
pub const CLIENT_ACCESS_KEY: &str = "CLIENT_ACCESS_KEY";

/// The only signing algorithm S3 accepts for SigV4 POST policies.
pub const AWS4_HMAC_SHA256: &str = "AWS4-HMAC-SHA256";
pub const SERVICE_S3: &str = "s3";
pub const DEFAULT_STORAGE_DOMAIN: &str = "s3.amazonaws.com";
pub const ACL_PUBLIC_READ: &str = "public-read";
pub const SSE_AES256: &str = "AES256";
/// Metadata field every form may carry, unconstrained.
pub const META_TAG: &str = "tag";

pub const DEFAULT_MIN_SIZE: u64 = 0;
pub const DEFAULT_MAX_SIZE: u64 = 15_000_000;
/// How long a signed form stays valid.
pub const POLICY_EXPIRES_IN: Duration = Duration::from_secs(5 * 60);
