use ::common::storage::BlobStore;
use crate::common::{FRONTEND_ORIGIN, TestApp, routes};

mod upload {
    use super::*;

    #[tokio::test]
    async fn upload_returns_success_envelope() {
        let app = TestApp::spawn().await;

        let res = app
            .upload("notes.txt", b"hello".to_vec(), Some("meeting notes"))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "success");
        assert_eq!(res.body["description"], "File uploaded!");
        let filename = res.filename();
        assert!(filename.ends_with("-notes.txt"), "got {filename}");
        assert!(
            res.body["filepath"]
                .as_str()
                .unwrap()
                .ends_with(&filename)
        );
    }

    #[tokio::test]
    async fn upload_writes_blob_and_record() {
        let app = TestApp::spawn().await;

        let name = app.upload_ok("a.bin", b"\x00\x01\x02", "").await;

        assert!(app.blobs.exists(&name).await.unwrap());
        assert_eq!(app.listed_names().await, vec![name]);
    }

    #[tokio::test]
    async fn missing_description_defaults_to_empty() {
        let app = TestApp::spawn().await;

        let res = app.upload("plain.txt", b"x".to_vec(), None).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let list = app.get(routes::FILES).await;
        assert_eq!(list.body[0]["description"], "");
    }

    #[tokio::test]
    async fn same_original_name_twice_gets_distinct_names() {
        let app = TestApp::spawn().await;

        let first = app.upload_ok("dup.txt", b"one", "").await;
        let second = app.upload_ok("dup.txt", b"two", "").await;

        assert_ne!(first, second);
        assert_eq!(app.listed_names().await.len(), 2);
    }

    #[tokio::test]
    async fn upload_without_file_field_is_rejected() {
        let app = TestApp::spawn().await;

        let form = reqwest::multipart::Form::new().text("description", "no file");
        let res = app
            .client
            .post(format!("http://{}{}", app.addr, routes::UPLOAD))
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 400);
    }

    #[tokio::test]
    async fn empty_file_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.upload("empty.txt", Vec::new(), None).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "error");
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(app.listed_names().await.is_empty());
    }

    #[tokio::test]
    async fn hidden_filename_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.upload(".env", b"SECRET=1".to_vec(), None).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn name_too_long_once_prefixed_is_rejected() {
        let app = TestApp::spawn().await;
        let name = format!("{}.txt", "n".repeat(240));

        let res = app.upload(&name, b"x".to_vec(), None).await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(app.listed_names().await.is_empty());
    }

    #[tokio::test]
    async fn oversized_file_is_413() {
        let storage = server::config::StorageConfig {
            max_upload_size: 16,
            ..Default::default()
        };
        let app = TestApp::spawn_with(Default::default(), storage).await;

        let res = app.upload("big.bin", vec![7u8; 64], None).await;

        assert_eq!(res.status, 413, "{}", res.text);
        assert_eq!(res.body["code"], "PAYLOAD_TOO_LARGE");
        assert!(app.listed_names().await.is_empty());
    }
}

mod list {
    use super::*;

    #[tokio::test]
    async fn empty_table_lists_nothing() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::FILES).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn records_are_sorted_by_filename() {
        let app = TestApp::spawn().await;

        let b = app.upload_ok("b.txt", b"b", "second").await;
        let a = app.upload_ok("a.txt", b"a", "first").await;

        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(app.listed_names().await, expected);
    }

    #[tokio::test]
    async fn listing_exposes_path_and_description() {
        let app = TestApp::spawn().await;
        let name = app.upload_ok("doc.md", b"# hi", "readme").await;

        let res = app.get(routes::FILES).await;

        let row = &res.body[0];
        assert_eq!(row["filename"], name.as_str());
        assert_eq!(row["description"], "readme");
        assert!(row["filepath"].as_str().unwrap().ends_with(&name));
    }
}

mod download {
    use super::*;

    #[tokio::test]
    async fn returns_stored_bytes_as_attachment() {
        let app = TestApp::spawn().await;
        let name = app.upload_ok("report.pdf", b"%PDF-1.4 body", "").await;

        let res = app.download(&name).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.bytes, b"%PDF-1.4 body");
        assert_eq!(res.headers["content-type"], "application/pdf");
        assert_eq!(res.headers["content-length"], "13");
        let disposition = res.headers["content-disposition"].to_str().unwrap();
        assert!(disposition.starts_with("attachment;"), "{disposition}");
        assert!(disposition.contains(&name));
    }

    #[tokio::test]
    async fn unknown_file_is_404() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::download("nope.txt")).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::download("..%2F..%2Fetc%2Fpasswd")).await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn removes_blob_and_record() {
        let app = TestApp::spawn().await;
        let name = app.upload_ok("gone.txt", b"bye", "").await;

        let res = app.delete(&routes::delete(&name)).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "success");
        assert_eq!(res.body["description"], "file deleted successfully");
        assert_eq!(res.body["blob_removed"], true);
        assert!(!app.blobs.exists(&name).await.unwrap());
        assert!(app.listed_names().await.is_empty());
    }

    #[tokio::test]
    async fn second_delete_is_404() {
        let app = TestApp::spawn().await;
        let name = app.upload_ok("twice.txt", b"x", "").await;

        assert_eq!(app.delete(&routes::delete(&name)).await.status, 200);
        let res = app.delete(&routes::delete(&name)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod rename {
    use super::*;

    #[tokio::test]
    async fn moves_blob_and_rewrites_record() {
        let app = TestApp::spawn().await;
        let name = app.upload_ok("draft.txt", b"v1", "draft").await;

        let res = app.put(&routes::rename(&name, "final.txt", "final")).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "success");
        assert_eq!(res.body["description"], "file renamed successfully");

        assert!(!app.blobs.exists(&name).await.unwrap());
        assert_eq!(app.download("final.txt").await.bytes, b"v1");

        let list = app.get(routes::FILES).await;
        assert_eq!(list.body[0]["filename"], "final.txt");
        assert_eq!(list.body[0]["description"], "final");
        assert!(
            list.body[0]["filepath"]
                .as_str()
                .unwrap()
                .ends_with("final.txt")
        );
    }

    #[tokio::test]
    async fn description_may_contain_spaces() {
        let app = TestApp::spawn().await;
        let name = app.upload_ok("q1.csv", b"1,2", "").await;

        let res = app.put(&routes::rename(&name, "q1.csv", "Q1 final numbers")).await;

        assert_eq!(res.status, 200, "{}", res.text);
        let list = app.get(routes::FILES).await;
        assert_eq!(list.body[0]["description"], "Q1 final numbers");
    }

    #[tokio::test]
    async fn unknown_file_is_404() {
        let app = TestApp::spawn().await;

        let res = app.put(&routes::rename("ghost.txt", "other.txt", "x")).await;

        assert_eq!(res.status, 404);
        assert!(app.listed_names().await.is_empty());
    }

    #[tokio::test]
    async fn target_name_taken_is_409() {
        let app = TestApp::spawn().await;
        let a = app.upload_ok("a.txt", b"a", "").await;
        let b = app.upload_ok("b.txt", b"b", "").await;

        let res = app.put(&routes::rename(&a, &b, "clash")).await;

        assert_eq!(res.status, 409, "{}", res.text);
        assert_eq!(res.body["code"], "CONFLICT");
        assert_eq!(app.download(&a).await.bytes, b"a");
        assert_eq!(app.download(&b).await.bytes, b"b");
    }
}

mod service {
    use super::*;

    #[tokio::test]
    async fn health_is_ok() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::HEALTH).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "ok");
    }

    #[tokio::test]
    async fn openapi_document_lists_file_routes() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::OPENAPI).await;

        assert_eq!(res.status, 200);
        let paths = res.body["paths"].as_object().unwrap();
        for path in [
            "/upload",
            "/files",
            "/download/{filename}",
            "/delete/{filename}",
            "/rename/{filename}/{newname}/{description}",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }
    }

    #[tokio::test]
    async fn cors_allows_configured_frontend_with_credentials() {
        let app = TestApp::spawn().await;

        let res = app
            .client
            .request(
                reqwest::Method::OPTIONS,
                format!("http://{}{}", app.addr, routes::FILES),
            )
            .header("Origin", FRONTEND_ORIGIN)
            .header("Access-Control-Request-Method", "DELETE")
            .send()
            .await
            .unwrap();

        let headers = res.headers();
        assert_eq!(headers["access-control-allow-origin"], FRONTEND_ORIGIN);
        assert_eq!(headers["access-control-allow-credentials"], "true");
        let methods = headers["access-control-allow-methods"].to_str().unwrap();
        assert!(methods.contains("DELETE"), "{methods}");
    }

    #[tokio::test]
    async fn cors_ignores_other_origins() {
        let app = TestApp::spawn().await;

        let res = app
            .client
            .get(format!("http://{}{}", app.addr, routes::FILES))
            .header("Origin", "http://evil.example")
            .send()
            .await
            .unwrap();

        assert!(res.headers().get("access-control-allow-origin").is_none());
    }
}
