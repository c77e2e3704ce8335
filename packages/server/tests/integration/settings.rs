use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn defaults_are_served_before_anything_is_saved() {
    let app = TestApp::spawn().await;

    let res = app.get(routes::SETTINGS).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["storage_limit_mb"].as_u64().unwrap(), 100);
    assert_eq!(res.body["max_file_size_mb"].as_u64().unwrap(), 100);
    assert_eq!(res.body["default_expire_days"].as_u64().unwrap(), 7);
    assert_eq!(res.body["storage_kind"].as_str().unwrap(), "local_disk");
    assert_eq!(res.body["allow_public_uploads"].as_bool().unwrap(), true);
    assert!(res.body["installed_at"].is_null());
}

#[tokio::test]
async fn partial_update_keeps_unspecified_fields() {
    let app = TestApp::spawn().await;

    let res = app
        .post_json(routes::SETTINGS, &json!({ "max_file_size_mb": 25 }))
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["max_file_size_mb"].as_u64().unwrap(), 25);
    assert_eq!(res.body["storage_limit_mb"].as_u64().unwrap(), 100);
    assert_eq!(res.body["default_expire_days"].as_u64().unwrap(), 7);
    // First save stamps the install time.
    assert!(res.body["installed_at"].is_string());

    // The merge survived persistence, not just the response.
    let res = app.get(routes::SETTINGS).await;
    assert_eq!(res.body["max_file_size_mb"].as_u64().unwrap(), 25);
    assert_eq!(res.body["storage_limit_mb"].as_u64().unwrap(), 100);
}

#[tokio::test]
async fn install_time_is_stamped_only_once() {
    let app = TestApp::spawn().await;

    let first = app
        .post_json(routes::SETTINGS, &json!({ "storage_limit_mb": 200 }))
        .await;
    let stamped = first.body["installed_at"].as_str().unwrap().to_string();

    let second = app
        .post_json(routes::SETTINGS, &json!({ "storage_limit_mb": 300 }))
        .await;

    assert_eq!(second.body["installed_at"].as_str().unwrap(), stamped);
}

#[tokio::test]
async fn oss_config_updates_as_a_unit() {
    let app = TestApp::spawn().await;

    let res = app
        .post_json(
            routes::SETTINGS,
            &json!({
                "oss": {
                    "endpoint": "http://minio:9000",
                    "bucket": "filedrop",
                    "region": "us-east-1",
                    "access_key_id": "ak",
                    "access_key_secret": "sk"
                }
            }),
        )
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(
        res.body["oss"]["endpoint"].as_str().unwrap(),
        "http://minio:9000"
    );
    // Unrelated fields untouched.
    assert_eq!(res.body["storage_kind"].as_str().unwrap(), "local_disk");
}

#[tokio::test]
async fn selecting_object_store_without_credentials_fails_uploads() {
    let app = TestApp::spawn().await;

    let res = app
        .post_json(routes::SETTINGS, &json!({ "storage_kind": "object_store" }))
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let res = app.upload("cloud.txt", b"bytes".to_vec(), "text/plain").await;

    assert_eq!(res.status, 500, "{}", res.text);
    assert_eq!(res.error_code(), "CONFIGURATION_ERROR");
    assert!(res.body["message"].as_str().unwrap().contains("credentials"));
}

#[tokio::test]
async fn malformed_patch_is_rejected() {
    let app = TestApp::spawn().await;

    let res = app
        .post_json(routes::SETTINGS, &json!({ "storage_kind": "floppy" }))
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.error_code(), "VALIDATION_ERROR");
}
