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

//! POST policy document.
//!
//! - [Creating a POST policy](https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-HTTPPOSTConstructPolicy.html)

use std::borrow::Cow;

use crate::constants::*;
use postsign_core::hash::base64_encode;
use postsign_core::time::{format_rfc3339_millis, DateTime};
use postsign_core::{Error, Result};
use serde::ser::{SerializeMap, SerializeStruct, SerializeTuple};
use serde::{Serialize, Serializer};

/// Form fields a POST policy condition can refer to.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum PolicyField {
    /// The bucket. Carried by the endpoint, never sent as a form field.
    Bucket,
    /// The object key.
    Key,
    /// The canned ACL.
    Acl,
    /// The content type of the uploaded object.
    ContentType,
    /// The server-side encryption algorithm.
    ServerSideEncryption,
    /// User-defined metadata, `AmzMeta("tag")` is `x-amz-meta-tag`.
    AmzMeta(String),
    /// The credential scope.
    AmzCredential,
    /// The signing algorithm.
    AmzAlgorithm,
    /// The signing date.
    AmzDate,
    /// The session token of temporary credentials.
    AmzSecurityToken,
    /// Where to redirect the browser after a successful upload.
    SuccessActionRedirect,
}

impl PolicyField {
    /// The form field name as S3 expects it.
    pub fn name(&self) -> Cow<'static, str> {
        match self {
            PolicyField::Bucket => Cow::Borrowed("bucket"),
            PolicyField::Key => Cow::Borrowed(KEY),
            PolicyField::Acl => Cow::Borrowed(ACL),
            PolicyField::ContentType => Cow::Borrowed(CONTENT_TYPE),
            PolicyField::ServerSideEncryption => Cow::Borrowed(X_AMZ_SERVER_SIDE_ENCRYPTION),
            PolicyField::AmzMeta(name) => Cow::Owned(format!("{X_AMZ_META_PREFIX}{name}")),
            PolicyField::AmzCredential => Cow::Borrowed(X_AMZ_CREDENTIAL),
            PolicyField::AmzAlgorithm => Cow::Borrowed(X_AMZ_ALGORITHM),
            PolicyField::AmzDate => Cow::Borrowed(X_AMZ_DATE),
            PolicyField::AmzSecurityToken => Cow::Borrowed(X_AMZ_SECURITY_TOKEN),
            PolicyField::SuccessActionRedirect => Cow::Borrowed(SUCCESS_ACTION_REDIRECT),
        }
    }
}

/// One entry of the `conditions` list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Condition {
    /// `{"<field>": "<value>"}`
    Exact(PolicyField, String),
    /// `["starts-with", "$<field>", "<prefix>"]`, an empty prefix allows anything.
    StartsWith(PolicyField, String),
    /// `["content-length-range", <min>, <max>]`, both ends inclusive.
    ContentLengthRange(u64, u64),
}

impl Condition {
    /// Check whether a form field value satisfies this condition.
    ///
    /// Returns `false` for conditions that are not bound to a form field.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Condition::Exact(_, expected) => value == expected,
            Condition::StartsWith(_, prefix) => value.starts_with(prefix.as_str()),
            Condition::ContentLengthRange(..) => false,
        }
    }
}

impl Serialize for Condition {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Condition::Exact(field, value) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(&field.name(), value)?;
                map.end()
            }
            Condition::StartsWith(field, prefix) => {
                let mut seq = serializer.serialize_tuple(3)?;
                seq.serialize_element("starts-with")?;
                seq.serialize_element(&format!("${}", field.name()))?;
                seq.serialize_element(prefix)?;
                seq.end()
            }
            Condition::ContentLengthRange(min, max) => {
                let mut seq = serializer.serialize_tuple(3)?;
                seq.serialize_element("content-length-range")?;
                seq.serialize_element(min)?;
                seq.serialize_element(max)?;
                seq.end()
            }
        }
    }
}

/// PolicyDocument is the JSON document a POST form is signed over.
#[derive(Clone, Debug)]
pub struct PolicyDocument {
    expiration: DateTime,
    conditions: Vec<Condition>,
}

impl PolicyDocument {
    /// Create an empty policy that expires at `expiration`.
    pub fn new(expiration: DateTime) -> Self {
        Self {
            expiration,
            conditions: Vec::new(),
        }
    }

    /// Append a condition.
    pub fn push(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    /// Serialize into JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| Error::unexpected("failed to serialize policy document").with_source(e))
    }

    /// Serialize into JSON and base64 encode it.
    ///
    /// This is both the `policy` form field and the string to sign.
    pub fn to_base64(&self) -> Result<String> {
        Ok(base64_encode(self.to_json()?.as_bytes()))
    }
}

impl Serialize for PolicyDocument {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut s = serializer.serialize_struct("PolicyDocument", 2)?;
        s.serialize_field("expiration", &format_rfc3339_millis(self.expiration))?;
        s.serialize_field("conditions", &self.conditions)?;
        s.end()
    }
}
