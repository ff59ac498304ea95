use crate::*;
use hmac::{Hmac, Mac};
use postsign_aws_v4::{Config, PostForm, UploadRequest};
use postsign_core::hash::base64_decode;
use pretty_assertions::assert_eq;
use serde_json::Value;
use sha2::Sha256;
use test_case::test_case;

fn reference_hmac(key: &[u8], msg: &str) -> Vec<u8> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("hmac accepts any key");
    mac.update(msg.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

/// The SigV4 chain written out step by step, independent of the crate.
fn reference_signature(secret: &str, date: &str, region: &str, string_to_sign: &str) -> String {
    let date_key = reference_hmac(format!("AWS4{secret}").as_bytes(), date);
    let date_region_key = reference_hmac(&date_key, region);
    let date_region_service_key = reference_hmac(&date_region_key, "s3");
    let signing_key = reference_hmac(&date_region_service_key, "aws4_request");
    hex::encode(reference_hmac(&signing_key, string_to_sign))
}

fn decode_policy(form: &PostForm) -> Value {
    let policy = form.params.get("policy").expect("policy must be set");
    let policy = base64_decode(policy).expect("policy must be base64");
    serde_json::from_slice(&policy).expect("policy must be json")
}

fn sign(config: &Config, req: &UploadRequest) -> PostForm {
    test_signer(config).sign(req).expect("signing must succeed")
}

#[test]
fn test_end_to_end() {
    let form = sign(&test_config(), &UploadRequest::new("abc.png", "image/png"));

    assert_eq!(form.endpoint_url, "https://uploads.s3.amazonaws.com/");
    assert_eq!(form.params.get("key"), Some("abc.png"));
    assert_eq!(form.params.get("acl"), Some("public-read"));
    assert_eq!(form.params.get("Content-Type"), Some("image/png"));
    assert_eq!(form.params.get("x-amz-algorithm"), Some("AWS4-HMAC-SHA256"));
    assert_eq!(form.params.get("x-amz-date"), Some(TEST_DATE));
    assert_eq!(
        form.params.get("x-amz-server-side-encryption"),
        Some("AES256")
    );

    let value = serde_json::to_value(&form).expect("form must serialize");
    assert_eq!(value["endpoint_url"], "https://uploads.s3.amazonaws.com/");
    assert_eq!(value["params"]["key"], "abc.png");
    assert_eq!(value["params"]["acl"], "public-read");
}

#[test]
fn test_signature_matches_reference_chain() {
    let form = sign(&test_config(), &UploadRequest::new("abc.png", "image/png"));
    let policy = form.params.get("policy").unwrap();

    assert_eq!(
        form.params.get("x-amz-signature").unwrap(),
        reference_signature(TEST_SECRET_KEY, "20240101", TEST_REGION, policy)
    );
}

#[test]
fn test_signature_format() {
    let form = sign(&test_config(), &UploadRequest::new("abc.png", "image/png"));
    let signature = form.params.get("x-amz-signature").unwrap();

    assert_eq!(signature.len(), 64);
    assert!(signature
        .chars()
        .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
}

#[test]
fn test_signing_is_deterministic() {
    let req = UploadRequest::new("abc.png", "image/png");

    let a = sign(&test_config(), &req);
    let b = sign(&test_config(), &req);
    assert_eq!(a.params, b.params);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test_case(test_config(), UploadRequest::new("abd.png", "image/png"); "key")]
#[test_case(test_config(), UploadRequest::new("abc.png", "image/jpeg"); "content type")]
#[test_case(test_config().with_bucket("other"), UploadRequest::new("abc.png", "image/png"); "bucket")]
#[test_case(test_config().with_region("eu-west-1"), UploadRequest::new("abc.png", "image/png"); "region")]
#[test_case(test_config().with_date("20240102T000000Z"), UploadRequest::new("abc.png", "image/png"); "date")]
#[test_case(test_config().with_size_range(0, 1), UploadRequest::new("abc.png", "image/png"); "size range")]
#[test_case(test_config().with_access_key_id("AKIAOTHER"), UploadRequest::new("abc.png", "image/png"); "access key")]
#[test_case(test_config().with_secret_access_key("other"), UploadRequest::new("abc.png", "image/png"); "secret key")]
#[test_case(test_config().with_redirect_url("https://example.com"), UploadRequest::new("abc.png", "image/png"); "redirect")]
#[test_case(test_config().with_content_type_prefix("image/"), UploadRequest::new("abc.png", "image/png"); "content type prefix")]
fn test_any_change_changes_signature(config: Config, req: UploadRequest) {
    let base = sign(&test_config(), &UploadRequest::new("abc.png", "image/png"));
    let changed = sign(&config, &req);

    assert_ne!(
        base.params.get("x-amz-signature"),
        changed.params.get("x-amz-signature")
    );
}

#[test]
fn test_tag_is_not_signed() {
    let plain = sign(&test_config(), &UploadRequest::new("abc.png", "image/png"));
    let tagged = sign(
        &test_config(),
        &UploadRequest::new("abc.png", "image/png").with_tag("avatar"),
    );

    assert_eq!(plain.params.get("x-amz-meta-tag"), Some(""));
    assert_eq!(tagged.params.get("x-amz-meta-tag"), Some("avatar"));
    assert_eq!(plain.params.get("policy"), tagged.params.get("policy"));
    assert_eq!(
        plain.params.get("x-amz-signature"),
        tagged.params.get("x-amz-signature")
    );
}

#[test_case(test_config(); "default")]
#[test_case(test_config()
    .with_content_type_prefix("image/")
    .with_redirect_url("https://example.com/done")
    .with_session_token("session-token"); "all optional conditions")]
fn test_policy_conditions_match_fields(config: Config) {
    let form = sign(
        &config,
        &UploadRequest::new("abc.png", "image/png").with_tag("avatar"),
    );
    let policy = decode_policy(&form);

    let mut bound = Vec::new();
    for condition in policy["conditions"].as_array().unwrap() {
        match condition {
            Value::Object(map) => {
                assert_eq!(map.len(), 1, "exact condition must have one entry");
                let (name, value) = map.iter().next().unwrap();
                if name == "bucket" {
                    assert_eq!(value, TEST_BUCKET);
                    continue;
                }
                assert_eq!(
                    form.params.get(name),
                    value.as_str(),
                    "field {name} must match its condition"
                );
                bound.push(name.clone());
            }
            Value::Array(items) if items[0] == "starts-with" => {
                let name = items[1].as_str().unwrap().trim_start_matches('$');
                let prefix = items[2].as_str().unwrap();
                let value = form.params.get(name).expect("starts-with field must be set");
                assert!(value.starts_with(prefix), "field {name} must start with {prefix}");
                bound.push(name.to_string());
            }
            Value::Array(items) => {
                assert_eq!(items[0], "content-length-range");
                assert!(items[1].as_u64().unwrap() <= items[2].as_u64().unwrap());
            }
            other => panic!("unexpected condition {other}"),
        }
    }

    // Every field except the policy itself and its signature is covered.
    let mut fields = form
        .params
        .iter()
        .map(|(k, _)| k.to_string())
        .filter(|k| k != "policy" && k != "x-amz-signature")
        .collect::<Vec<_>>();
    fields.sort();
    bound.sort();
    assert_eq!(fields, bound);
}

#[test]
fn test_policy_expires_in_five_minutes() {
    let form = sign(&test_config(), &UploadRequest::new("abc.png", "image/png"));

    assert_eq!(decode_policy(&form)["expiration"], "2024-01-01T00:05:00.000Z");
}

#[test_case("20240101T000000Z"; "compact")]
#[test_case("2024-01-01T00:00:00Z"; "rfc3339")]
#[test_case("2024-01-01T00:00:00.000Z"; "rfc3339 with millis")]
fn test_credential_scope_date(date: &str) {
    let form = sign(
        &test_config().with_date(date),
        &UploadRequest::new("abc.png", "image/png"),
    );
    let expected = date.replace('-', "")[..8].to_string();

    let credential = form.params.get("x-amz-credential").unwrap();
    assert_eq!(credential.split('/').nth(1), Some(expected.as_str()));
    assert_eq!(
        credential,
        format!("{TEST_ACCESS_KEY}/{expected}/{TEST_REGION}/s3/aws4_request")
    );
}

#[test]
fn test_signer_is_shareable() {
    let signer = test_signer(&test_config());
    let expected = signer
        .sign(&UploadRequest::new("abc.png", "image/png"))
        .unwrap();

    std::thread::scope(|s| {
        let handles = (0..4)
            .map(|_| s.spawn(|| signer.sign(&UploadRequest::new("abc.png", "image/png"))))
            .collect::<Vec<_>>();
        for handle in handles {
            let form = handle.join().unwrap().unwrap();
            assert_eq!(form.params, expected.params);
        }
    });
}
