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

//! Request handling glue for serving signed upload forms.
//!
//! Takes the query parameters of an HTTP request, checks them, picks a unique
//! object key and answers with a JSON envelope:
//!
//! ```json
//! {"message": "Request succeed", "params": {"endpoint_url": "...", "params": {...}}}
//! ```

use std::collections::HashMap;

use crate::form::PostForm;
use crate::sign_policy::{PostPolicySigner, UploadRequest};
use crate::Config;
use http::header;
use http::HeaderValue;
use http::Response;
use http::StatusCode;
use log::{debug, warn};
use postsign_core::{Error, ErrorKind, Result};
use serde::Serialize;
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// Query parameter carrying the declared content type.
pub const PARAM_CONTENT_TYPE: &str = "Content-Type";
/// Query parameter carrying the client access key.
pub const PARAM_CLIENT_ACCESS_KEY: &str = "clientAccessKey";
/// Query parameter carrying the file extension, with or without the leading dot.
pub const PARAM_FILE_EXTENSION: &str = "fileExtension";

const REQUIRED_PARAMS: [&str; 3] = [
    PARAM_CONTENT_TYPE,
    PARAM_CLIENT_ACCESS_KEY,
    PARAM_FILE_EXTENSION,
];

const MAX_EXTENSION_LEN: usize = 16;

/// UploadHandler turns upload requests into signed POST forms.
#[derive(Debug, Clone)]
pub struct UploadHandler {
    signer: PostPolicySigner,
    client_access_key: String,
}

#[derive(Serialize)]
struct ResponseBody<'a> {
    message: &'a str,
    params: Option<&'a PostForm>,
}

impl UploadHandler {
    /// Build a handler from config, the client access key is required.
    pub fn new(config: &Config) -> Result<Self> {
        let signer = PostPolicySigner::new(config)?;
        let client_access_key = config
            .client_access_key
            .clone()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::config_invalid("client access key is required"))?;

        Ok(Self::from_signer(signer, client_access_key))
    }

    /// Build a handler around an existing signer.
    pub fn from_signer(signer: PostPolicySigner, client_access_key: impl Into<String>) -> Self {
        Self {
            signer,
            client_access_key: client_access_key.into(),
        }
    }

    /// Handle the query parameters of one request.
    ///
    /// `None` means the request carried no query string at all.
    pub fn handle(&self, params: Option<&HashMap<String, String>>) -> Response<String> {
        match self.process(params) {
            Ok(form) => {
                debug!("signed upload form for key {:?}", form.params.get("key"));
                respond(StatusCode::OK, "Request succeed", Some(&form))
            }
            Err(err) if err.is_client_error() => {
                debug!("rejected upload request: {err}");
                respond(status_for(err.kind()), &err.to_string(), None)
            }
            Err(err) => {
                warn!("failed to sign upload form: {err:?}");
                respond(status_for(err.kind()), "Internal error", None)
            }
        }
    }

    fn process(&self, params: Option<&HashMap<String, String>>) -> Result<PostForm> {
        let params = params
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::request_invalid("Parameters are required"))?;

        for name in REQUIRED_PARAMS {
            if params.get(name).map_or(true, String::is_empty) {
                return Err(Error::request_invalid(format!("{name} is required")));
            }
        }

        if !self.is_client_access_key(param(params, PARAM_CLIENT_ACCESS_KEY)) {
            return Err(Error::credential_denied(
                "Client access is denied due to wrong access key",
            ));
        }

        let extension = normalize_extension(param(params, PARAM_FILE_EXTENSION))?;
        let key = format!("{}.{}", Uuid::new_v4().simple(), extension);

        self.signer
            .sign(&UploadRequest::new(key, param(params, PARAM_CONTENT_TYPE)))
    }

    /// Compare in constant time, the key is a shared secret.
    fn is_client_access_key(&self, key: &str) -> bool {
        key.as_bytes().ct_eq(self.client_access_key.as_bytes()).into()
    }
}

fn param<'a>(params: &'a HashMap<String, String>, name: &str) -> &'a str {
    params.get(name).map(String::as_str).unwrap_or_default()
}

fn normalize_extension(extension: &str) -> Result<&str> {
    let extension = extension.strip_prefix('.').unwrap_or(extension);
    if extension.is_empty()
        || extension.len() > MAX_EXTENSION_LEN
        || !extension.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(Error::request_invalid(format!(
            "{PARAM_FILE_EXTENSION} {extension:?} is invalid"
        )));
    }

    Ok(extension)
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::RequestInvalid => StatusCode::BAD_REQUEST,
        ErrorKind::CredentialDenied => StatusCode::FORBIDDEN,
        ErrorKind::ConfigInvalid | ErrorKind::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn respond(status: StatusCode, message: &str, params: Option<&PostForm>) -> Response<String> {
    let (status, body) = match serde_json::to_string(&ResponseBody { message, params }) {
        Ok(body) => (status, body),
        Err(err) => {
            warn!("failed to serialize response body: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                r#"{"message":"Internal error","params":null}"#.to_string(),
            )
        }
    };

    let mut resp = Response::new(body);
    *resp.status_mut() = status;
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    resp
}
