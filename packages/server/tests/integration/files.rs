use crate::common::{TestApp, routes};

mod upload {
    use super::*;

    #[tokio::test]
    async fn upload_returns_record_with_retrieval_code() {
        let app = TestApp::spawn().await;

        let res = app
            .upload("hello.txt", b"hello world".to_vec(), "text/plain")
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["name"].as_str().unwrap(), "hello.txt");
        assert_eq!(res.body["size"].as_i64().unwrap(), 11);
        assert_eq!(res.body["mime_type"].as_str().unwrap(), "text/plain");
        assert_eq!(res.body["download_count"].as_i64().unwrap(), 0);
        assert_eq!(res.body["storage_kind"].as_str().unwrap(), "local_disk");
        // Default settings expire uploads after 7 days.
        assert!(res.body["expire_at"].is_string());

        let expected_hash = common::ContentHash::compute(b"hello world").to_hex();
        assert_eq!(res.body["hash"].as_str().unwrap(), expected_hash);

        let code = res.body["code"].as_str().unwrap();
        assert_eq!(code.len(), 6);
        assert!(
            code.bytes()
                .all(|b| common::code::CODE_ALPHABET.contains(&b))
        );
    }

    #[tokio::test]
    async fn upload_stores_bytes_under_code_named_path() {
        let app = TestApp::spawn().await;

        let res = app
            .upload("quarterly report.pdf", b"PDFDATA".to_vec(), "application/pdf")
            .await;
        assert_eq!(res.status, 201, "{}", res.text);

        let url = res.body["url"].as_str().unwrap();
        let code = res.body["code"].as_str().unwrap();
        let storage_path = url.strip_prefix("/uploadfiles/").unwrap();

        // The on-disk name is `{code}_{timestamp}.{ext}`; the original
        // filename lives only in the record.
        assert!(storage_path.starts_with(&format!("{code}_")));
        assert!(storage_path.ends_with(".pdf"));
        assert!(!storage_path.contains("quarterly"));
        assert!(app.upload_dir().join(storage_path).exists());
    }

    #[tokio::test]
    async fn identical_content_is_deduplicated() {
        let app = TestApp::spawn().await;
        let data = b"shared bytes".to_vec();

        let first = app.upload("one.txt", data.clone(), "text/plain").await;
        let second = app.upload("two.txt", data, "text/plain").await;

        assert_eq!(first.status, 201);
        assert_eq!(second.status, 201);
        // Same record both times: same id, same code, and the second
        // upload did not grow storage.
        assert_eq!(first.id(), second.id());
        assert_eq!(
            first.body["code"].as_str().unwrap(),
            second.body["code"].as_str().unwrap()
        );
        assert_eq!(app.stored_file_count(), 1);

        let list = app.get(routes::FILES).await;
        assert_eq!(list.body["total"].as_u64().unwrap(), 1);
    }

    #[tokio::test]
    async fn expired_record_does_not_shadow_fresh_upload_of_same_content() {
        let app = TestApp::spawn().await;
        let data = b"recycled content".to_vec();

        let first = app.upload("old.txt", data.clone(), "text/plain").await;
        app.set_expire_at(&first.id(), Some(chrono::Utc::now() - chrono::Duration::seconds(1)))
            .await;

        let second = app.upload("new.txt", data, "text/plain").await;

        assert_eq!(second.status, 201, "{}", second.text);
        assert_ne!(second.id(), first.id());
        assert_ne!(
            second.body["code"].as_str().unwrap(),
            first.body["code"].as_str().unwrap()
        );
    }

    #[tokio::test]
    async fn upload_without_file_field_is_rejected() {
        let app = TestApp::spawn().await;

        let form = reqwest::multipart::Form::new().text("note", "no file here");
        let res = app
            .client
            .post(format!("http://{}{}", app.addr, routes::FILES))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send request");
        let res = crate::common::TestResponse::from_response(res).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.error_code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn oversize_upload_is_rejected_with_nothing_persisted() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(routes::SETTINGS, &serde_json::json!({ "max_file_size_mb": 1 }))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let oversize = vec![0u8; 1024 * 1024 + 1];
        let res = app
            .upload("big.bin", oversize, "application/octet-stream")
            .await;

        assert_eq!(res.status, 413, "{}", res.text);
        assert_eq!(res.error_code(), "FILE_TOO_LARGE");
        assert!(res.body["message"].as_str().unwrap().contains("1MB"));

        assert_eq!(app.stored_file_count(), 0);
        let list = app.get(routes::FILES).await;
        assert_eq!(list.body["total"].as_u64().unwrap(), 0);
    }

    #[tokio::test]
    async fn second_distinct_upload_exceeding_quota_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(routes::SETTINGS, &serde_json::json!({ "storage_limit_mb": 2 }))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let first = app
            .upload("a.bin", vec![0xAA; 1_200_000], "application/octet-stream")
            .await;
        assert_eq!(first.status, 201, "{}", first.text);

        let second = app
            .upload("b.bin", vec![0xBB; 1_200_000], "application/octet-stream")
            .await;
        assert_eq!(second.status, 413, "{}", second.text);
        assert_eq!(second.error_code(), "QUOTA_EXCEEDED");

        // The quota check runs before the dedup lookup, so even known
        // content is refused while the quota is exhausted.
        let again = app
            .upload("a.bin", vec![0xAA; 1_200_000], "application/octet-stream")
            .await;
        assert_eq!(again.status, 413, "{}", again.text);
        assert_eq!(app.stored_file_count(), 1);
    }

    #[tokio::test]
    async fn zero_expire_days_means_never_expires() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(
                routes::SETTINGS,
                &serde_json::json!({ "max_file_size_mb": 10, "default_expire_days": 0 }),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app
            .upload("forever.bin", vec![0x42; 5 * 1024 * 1024], "application/octet-stream")
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(res.body["expire_at"].is_null());
    }

    #[tokio::test]
    async fn uploads_can_be_disabled() {
        let app = TestApp::spawn().await;

        app.post_json(
            routes::SETTINGS,
            &serde_json::json!({ "allow_public_uploads": false }),
        )
        .await;

        let res = app.upload("nope.txt", b"data".to_vec(), "text/plain").await;

        assert_eq!(res.status, 403);
        assert_eq!(res.error_code(), "UPLOADS_DISABLED");
    }
}

mod lookup {
    use super::*;

    #[tokio::test]
    async fn code_lookup_is_case_insensitive() {
        let app = TestApp::spawn().await;

        let uploaded = app
            .upload("case.txt", b"case test".to_vec(), "text/plain")
            .await;
        let code = uploaded.body["code"].as_str().unwrap().to_lowercase();

        let res = app.get(&routes::file_by_code(&code)).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.id(), uploaded.id());
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::file_by_code("222222")).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.error_code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn malformed_code_is_rejected() {
        let app = TestApp::spawn().await;

        // Too short, and containing an excluded character.
        for bad in ["AB2", "AB10XY"] {
            let res = app.get(&routes::file_by_code(bad)).await;
            assert_eq!(res.status, 400, "{bad}: {}", res.text);
            assert_eq!(res.error_code(), "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn expired_record_is_gone_before_the_reaper_runs() {
        let app = TestApp::spawn().await;

        let uploaded = app
            .upload("fleeting.txt", b"short-lived".to_vec(), "text/plain")
            .await;
        let code = uploaded.body["code"].as_str().unwrap().to_string();

        app.set_expire_at(&uploaded.id(), Some(chrono::Utc::now() - chrono::Duration::seconds(1)))
            .await;

        let res = app.get(&routes::file_by_code(&code)).await;
        assert_eq!(res.status, 410, "{}", res.text);
        assert_eq!(res.error_code(), "EXPIRED");

        // Metadata lookup by id still sees the row until the sweep removes
        // it.
        let by_id = app.get(&routes::file(&uploaded.id())).await;
        assert_eq!(by_id.status, 200);
    }

    #[tokio::test]
    async fn hash_lookup_round_trip() {
        let app = TestApp::spawn().await;

        let uploaded = app
            .upload("hashed.txt", b"hash lookup".to_vec(), "text/plain")
            .await;
        let hash = uploaded.body["hash"].as_str().unwrap().to_string();

        let res = app.get(&routes::file_by_hash(&hash)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.id(), uploaded.id());

        let missing = common::ContentHash::compute(b"never uploaded").to_hex();
        let res = app.get(&routes::file_by_hash(&missing)).await;
        assert_eq!(res.status, 404);

        let res = app.get(&routes::file_by_hash("not-hex")).await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn id_lookup_misses_cleanly() {
        let app = TestApp::spawn().await;

        let res = app
            .get(&routes::file(&uuid::Uuid::now_v7().to_string()))
            .await;
        assert_eq!(res.status, 404);

        let res = app.get(&routes::file("not-a-uuid")).await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn list_returns_all_records() {
        let app = TestApp::spawn().await;

        let first = app.upload("a.txt", b"content a".to_vec(), "text/plain").await;
        let second = app.upload("b.txt", b"content b".to_vec(), "text/plain").await;

        let res = app.get(routes::FILES).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["total"].as_u64().unwrap(), 2);

        let ids: Vec<&str> = res.body["files"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["id"].as_str().unwrap())
            .collect();
        assert!(ids.contains(&first.id().as_str()));
        assert!(ids.contains(&second.id().as_str()));
    }
}

mod download {
    use super::*;

    #[tokio::test]
    async fn download_counter_increments() {
        let app = TestApp::spawn().await;

        let uploaded = app
            .upload("counted.txt", b"count me".to_vec(), "text/plain")
            .await;
        let id = uploaded.id();

        let res = app.patch(&routes::file_download(&id)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["download_count"].as_i64().unwrap(), 1);

        let res = app.patch(&routes::file_download(&id)).await;
        assert_eq!(res.body["download_count"].as_i64().unwrap(), 2);
    }

    #[tokio::test]
    async fn concurrent_increments_lose_no_updates() {
        let app = TestApp::spawn().await;

        let uploaded = app
            .upload("contended.txt", b"racy".to_vec(), "text/plain")
            .await;
        let url = format!(
            "http://{}{}",
            app.addr,
            routes::file_download(&uploaded.id())
        );

        let mut handles = Vec::new();
        for _ in 0..10 {
            let client = app.client.clone();
            let url = url.clone();
            handles.push(tokio::spawn(async move {
                client.patch(url).send().await.unwrap().status().as_u16()
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), 200);
        }

        let res = app.get(&routes::file(&uploaded.id())).await;
        assert_eq!(res.body["download_count"].as_i64().unwrap(), 10);
    }

    #[tokio::test]
    async fn increment_on_unknown_record_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .patch(&routes::file_download(&uuid::Uuid::now_v7().to_string()))
            .await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn stored_file_streams_with_original_name() {
        let app = TestApp::spawn().await;

        let uploaded = app
            .upload("my notes.txt", b"the actual bytes".to_vec(), "text/plain")
            .await;
        let url = uploaded.body["url"].as_str().unwrap().to_string();

        let res = app
            .client
            .get(format!("http://{}{}", app.addr, url))
            .send()
            .await
            .expect("Failed to fetch stored file");

        assert_eq!(res.status().as_u16(), 200);
        let disposition = res
            .headers()
            .get("content-disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("attachment"));
        assert!(disposition.contains("notes.txt"));
        let etag = res.headers().get("etag").unwrap().to_str().unwrap().to_string();
        assert_eq!(
            etag,
            format!("\"{}\"", uploaded.body["hash"].as_str().unwrap())
        );
        assert_eq!(res.bytes().await.unwrap().as_ref(), b"the actual bytes");

        // A matching ETag short-circuits the transfer.
        let res = app
            .client
            .get(format!("http://{}{}", app.addr, url))
            .header("If-None-Match", etag)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 304);
    }

    #[tokio::test]
    async fn stored_file_for_expired_record_is_gone() {
        let app = TestApp::spawn().await;

        let uploaded = app
            .upload("gone.txt", b"expiring bytes".to_vec(), "text/plain")
            .await;
        let url = uploaded.body["url"].as_str().unwrap().to_string();
        app.set_expire_at(&uploaded.id(), Some(chrono::Utc::now() - chrono::Duration::seconds(1)))
            .await;

        let storage_path = url.strip_prefix("/uploadfiles/").unwrap();
        let res = app.get(&routes::stored_file(storage_path)).await;
        assert_eq!(res.status, 410);
    }

    #[tokio::test]
    async fn unknown_stored_file_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::stored_file("NOPE22_1.bin")).await;
        assert_eq!(res.status, 404);
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn delete_removes_record_and_bytes() {
        let app = TestApp::spawn().await;

        let uploaded = app
            .upload("doomed.txt", b"delete me".to_vec(), "text/plain")
            .await;
        assert_eq!(app.stored_file_count(), 1);

        let res = app.delete(&routes::file(&uploaded.id())).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["success"].as_bool().unwrap(), true);

        assert_eq!(app.stored_file_count(), 0);
        let res = app.get(&routes::file(&uploaded.id())).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn delete_succeeds_when_bytes_are_already_gone() {
        let app = TestApp::spawn().await;

        let uploaded = app
            .upload("halfgone.txt", b"bytes first".to_vec(), "text/plain")
            .await;
        let url = uploaded.body["url"].as_str().unwrap();
        let storage_path = url.strip_prefix("/uploadfiles/").unwrap();

        // Simulate the physical file vanishing out from under the record.
        std::fs::remove_file(app.upload_dir().join(storage_path)).unwrap();

        let res = app.delete(&routes::file(&uploaded.id())).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["success"].as_bool().unwrap(), true);
    }

    #[tokio::test]
    async fn delete_unknown_record_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .delete(&routes::file(&uuid::Uuid::now_v7().to_string()))
            .await;
        assert_eq!(res.status, 404);
    }
}
