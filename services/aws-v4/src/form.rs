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

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// SignedFields are the form fields a browser posts alongside the file.
///
/// Fields keep their insertion order, which is also their JSON order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignedFields(Vec<(String, String)>);

impl SignedFields {
    /// Insert a field, replacing the value of an existing field with the same name.
    pub(crate) fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        match self.0.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value,
            None => self.0.push((name, value)),
        }
    }

    /// Get the value of a field.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over `(name, value)` pairs in form order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for SignedFields {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// PostForm is everything a browser needs to upload a file directly to the bucket.
///
/// ```json
/// {
///   "endpoint_url": "https://<bucket>.s3.amazonaws.com/",
///   "params": { "key": "...", "acl": "public-read", "policy": "...", ... }
/// }
/// ```
#[derive(Clone, Debug, Serialize)]
pub struct PostForm {
    /// The URL the `multipart/form-data` POST goes to.
    pub endpoint_url: String,
    /// Form fields, sent before the `file` field.
    pub params: SignedFields,
}
