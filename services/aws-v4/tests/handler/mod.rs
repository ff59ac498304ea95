use std::collections::HashMap;

use crate::*;
use http::StatusCode;
use postsign_aws_v4::{
    UploadHandler, PARAM_CLIENT_ACCESS_KEY, PARAM_CONTENT_TYPE, PARAM_FILE_EXTENSION,
};
use pretty_assertions::assert_eq;
use serde_json::Value;
use test_case::test_case;

const CLIENT_KEY: &str = "client-key";

fn test_handler() -> UploadHandler {
    UploadHandler::from_signer(test_signer(&test_config()), CLIENT_KEY)
}

fn params(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn valid_params() -> HashMap<String, String> {
    params(&[
        (PARAM_CONTENT_TYPE, "image/png"),
        (PARAM_CLIENT_ACCESS_KEY, CLIENT_KEY),
        (PARAM_FILE_EXTENSION, ".png"),
    ])
}

fn body(resp: &http::Response<String>) -> Value {
    serde_json::from_str(resp.body()).expect("body must be json")
}

#[test]
fn test_handle_success() {
    let resp = test_handler().handle(Some(&valid_params()));

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[http::header::CONTENT_TYPE], "application/json");

    let body = body(&resp);
    assert_eq!(body["message"], "Request succeed");
    assert_eq!(
        body["params"]["endpoint_url"],
        "https://uploads.s3.amazonaws.com/"
    );

    let fields = &body["params"]["params"];
    assert_eq!(fields["acl"], "public-read");
    assert_eq!(fields["Content-Type"], "image/png");

    let key = fields["key"].as_str().unwrap();
    let (name, extension) = key.split_once('.').unwrap();
    assert_eq!(extension, "png");
    assert_eq!(name.len(), 32);
    assert!(name.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_handle_generates_unique_keys() {
    let handler = test_handler();

    let a = body(&handler.handle(Some(&valid_params())));
    let b = body(&handler.handle(Some(&valid_params())));
    assert_ne!(a["params"]["params"]["key"], b["params"]["params"]["key"]);
}

#[test]
fn test_handle_without_params() {
    let handler = test_handler();

    for resp in [handler.handle(None), handler.handle(Some(&HashMap::new()))] {
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body(&resp),
            serde_json::json!({"message": "Parameters are required", "params": null})
        );
    }
}

#[test_case(PARAM_CONTENT_TYPE)]
#[test_case(PARAM_CLIENT_ACCESS_KEY)]
#[test_case(PARAM_FILE_EXTENSION)]
fn test_handle_missing_param(name: &str) {
    let mut missing = valid_params();
    missing.remove(name);
    let mut empty = valid_params();
    empty.insert(name.to_string(), String::new());

    for params in [missing, empty] {
        let resp = test_handler().handle(Some(&params));

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body(&resp)["message"], format!("{name} is required"));
        assert_eq!(body(&resp)["params"], Value::Null);
    }
}

#[test]
fn test_handle_reports_first_missing_param() {
    let resp = test_handler().handle(Some(&params(&[(PARAM_FILE_EXTENSION, "png")])));

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(&resp)["message"], "Content-Type is required");
}

#[test]
fn test_handle_wrong_client_key() {
    let mut params = valid_params();
    params.insert(PARAM_CLIENT_ACCESS_KEY.to_string(), "guess".to_string());

    let resp = test_handler().handle(Some(&params));
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body(&resp)["message"],
        "Client access is denied due to wrong access key"
    );
    assert_eq!(body(&resp)["params"], Value::Null);
}

#[test]
fn test_handle_invalid_extension() {
    let mut params = valid_params();
    params.insert(PARAM_FILE_EXTENSION.to_string(), "../png".to_string());

    let resp = test_handler().handle(Some(&params));
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_handle_content_type_outside_prefix() {
    let config = test_config().with_content_type_prefix("image/");
    let handler = UploadHandler::from_signer(test_signer(&config), CLIENT_KEY);

    let mut params = valid_params();
    params.insert(PARAM_CONTENT_TYPE.to_string(), "text/html".to_string());

    let resp = handler.handle(Some(&params));
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(&resp)["params"], Value::Null);
}

#[test]
fn test_handler_from_config() {
    let handler = UploadHandler::new(&test_config().with_client_access_key(CLIENT_KEY))
        .expect("config must be valid");

    let resp = handler.handle(Some(&valid_params()));
    assert_eq!(resp.status(), StatusCode::OK);
}
