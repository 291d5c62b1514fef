//! Chunked upload integration tests.
//!
//! Run with: `cargo test -p tessera-api --test upload_test`

mod helpers;

use helpers::{payload, send_chunk, setup_test_app, setup_test_app_with, ChunkSpec};
use serde_json::Value;
use tessera_core::chunk_digest;
use tessera_core::protocol::UPLOAD_ROUTE;

const CHUNK: usize = 1_000_000;

#[tokio::test]
async fn test_three_chunk_upload_assembles_file() {
    let app = setup_test_app().await;
    let client = app.client();
    let data = payload(2_500_000);

    let chunks: Vec<&[u8]> = data.chunks(CHUNK).collect();
    assert_eq!(
        chunks.iter().map(|c| c.len()).collect::<Vec<_>>(),
        vec![1_000_000, 1_000_000, 500_000]
    );

    let mut last: Option<Value> = None;
    for (i, chunk) in chunks.iter().enumerate() {
        let spec = ChunkSpec::new("three-chunks", i as u32, 3, data.len() as u64)
            .hash(chunk_digest(chunk));
        let response = send_chunk(client, &spec, chunk).await;
        assert_eq!(response.status_code(), 200, "chunk {}: {}", i, response.text());
        let body: Value = response.json();

        if i < 2 {
            assert_eq!(body["responseType"], "chunkSuccess");
            assert_eq!(body["success"], true);
            assert_eq!(body["chunkIndex"], i);
            assert_eq!(body["totalChunks"], 3);
            assert_eq!(
                body["message"],
                format!("Chunk {}/3 uploaded successfully", i + 1)
            );
        } else {
            last = Some(body);
        }
    }

    let body = last.unwrap();
    assert_eq!(body["responseType"], "fileSuccess");
    assert_eq!(body["message"], "File uploaded and assembled successfully");
    assert_eq!(body["customId"], "three-chunks");
    assert_eq!(body["serverData"]["uploadedBy"], "api-route");
    assert_eq!(body["fileHash"], chunk_digest(&data));

    let filename = body["filename"].as_str().unwrap();
    assert!(filename.starts_with("report-"));
    assert!(filename.ends_with(".pdf"));
    assert_eq!(body["fileName"], filename);
    let expected_url = format!("/uploads/{}", filename);
    assert_eq!(body["fileUrl"], expected_url);
    assert_eq!(body["path"], expected_url);
    assert_eq!(body["url"], expected_url);
    assert!(body["ufsUrl"]
        .as_str()
        .unwrap()
        .ends_with(expected_url.as_str()));

    let on_disk = tokio::fs::read(app.final_dir().join(filename)).await.unwrap();
    assert_eq!(on_disk.len(), 2_500_000);
    assert_eq!(on_disk, data);

    // Temporary chunks and the upload directory are gone
    assert!(!app.upload_dir("three-chunks").exists());
}

#[tokio::test]
async fn test_disallowed_type_is_rejected_without_side_effects() {
    let app = setup_test_app().await;
    let spec = ChunkSpec::new("bad-type", 0, 2, 1000).file_type("application/x-executable");

    let response = send_chunk(app.client(), &spec, &payload(500)).await;

    assert_eq!(response.status_code(), 415);
    let body: Value = response.json();
    assert_eq!(body["responseType"], "error");
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Unsupported file type");
    assert_eq!(body["file"], "report.pdf");
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("application/x-executable"));
    assert!(!app.upload_dir("bad-type").exists());
}

#[tokio::test]
async fn test_oversized_file_is_rejected_on_first_chunk() {
    let app = setup_test_app_with(|c| c.max_file_size_bytes = 1024).await;
    let spec = ChunkSpec::new("too-large", 0, 2, 4096);

    let response = send_chunk(app.client(), &spec, &payload(512)).await;

    assert_eq!(response.status_code(), 413);
    let body: Value = response.json();
    assert_eq!(body["error"], "File too large");
    assert_eq!(body["file"], "report.pdf");
    assert!(body["details"].as_str().unwrap().contains("(4096 bytes)"));
    assert!(!app.chunk_path("too-large", 0).exists());
    assert!(!app.upload_dir("too-large").exists());
}

#[tokio::test]
async fn test_hash_mismatch_rejects_and_removes_chunk() {
    let app = setup_test_app().await;
    let client = app.client();
    let first = payload(100);
    let second = payload(50);

    let spec = ChunkSpec::new("corrupt", 0, 2, 150);
    assert_eq!(send_chunk(client, &spec, &first).await.status_code(), 200);

    // A previously stored copy of chunk 1 must not survive a corrupt resend
    let good = ChunkSpec::new("corrupt", 1, 3, 150);
    assert_eq!(send_chunk(client, &good, &second).await.status_code(), 200);
    assert!(app.chunk_path("corrupt", 1).exists());

    let bad = ChunkSpec::new("corrupt", 1, 3, 150).hash(chunk_digest(b"something else"));
    let response = send_chunk(client, &bad, &second).await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"], "Chunk integrity check failed");
    assert_eq!(body["recoverable"], true);
    assert_eq!(body["suggestedAction"], "Resend the chunk");
    assert!(!app.chunk_path("corrupt", 1).exists());
    assert!(app.chunk_path("corrupt", 0).exists());
}

#[tokio::test]
async fn test_hash_comparison_ignores_case() {
    let app = setup_test_app().await;
    let data = payload(64);
    let spec = ChunkSpec::new("upper-hash", 0, 2, 128).hash(chunk_digest(&data).to_uppercase());

    let response = send_chunk(app.client(), &spec, &data).await;
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn test_single_chunk_upload_without_hash() {
    let app = setup_test_app().await;
    let data = b"%PDF-1.4 tiny".to_vec();
    let spec = ChunkSpec::new("single", 0, 1, data.len() as u64).filename("My Notes.PDF");

    let response = send_chunk(app.client(), &spec, &data).await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["responseType"], "fileSuccess");
    let filename = body["filename"].as_str().unwrap();
    assert!(filename.starts_with("my_notes-"));
    assert!(filename.ends_with(".pdf"));
    assert_eq!(
        tokio::fs::read(app.final_dir().join(filename)).await.unwrap(),
        data
    );
}

#[tokio::test]
async fn test_filename_with_dot_run_assembles() {
    let app = setup_test_app().await;
    let data = payload(32);
    let spec = ChunkSpec::new("dotted", 0, 1, data.len() as u64).filename("v1..final.pdf");

    let response = send_chunk(app.client(), &spec, &data).await;

    assert_eq!(response.status_code(), 200, "{}", response.text());
    let body: Value = response.json();
    let filename = body["filename"].as_str().unwrap();
    assert!(filename.starts_with("v1.final-"));
    assert!(filename.ends_with(".pdf"));
    assert!(!app.chunk_path("dotted", 0).exists());
    assert_eq!(
        tokio::fs::read(app.final_dir().join(filename)).await.unwrap(),
        data
    );
}

#[tokio::test]
async fn test_overlong_extension_still_assembles() {
    let app = setup_test_app().await;
    let data = payload(32);
    let name = format!("a.{}", "x".repeat(300));
    let spec = ChunkSpec::new("long-ext", 0, 1, data.len() as u64).filename(&name);

    let response = send_chunk(app.client(), &spec, &data).await;

    assert_eq!(response.status_code(), 200, "{}", response.text());
    let body: Value = response.json();
    let filename = body["filename"].as_str().unwrap();
    assert!(filename.len() < 255);
    assert!(app.final_dir().join(filename).is_file());
}

#[tokio::test]
async fn test_concurrent_uploads_of_same_name_do_not_collide() {
    let app = setup_test_app().await;
    let client = app.client();
    let a = payload(300);
    let b: Vec<u8> = payload(300).into_iter().rev().collect();

    for index in 0..2u32 {
        let range = (index as usize * 150)..((index as usize + 1) * 150);
        let spec_a = ChunkSpec::new("parallel-a", index, 2, 300)
            .filename("same.png")
            .file_type("image/png");
        let spec_b = ChunkSpec::new("parallel-b", index, 2, 300)
            .filename("same.png")
            .file_type("image/png");
        let (ra, rb) = tokio::join!(
            send_chunk(client, &spec_a, &a[range.clone()]),
            send_chunk(client, &spec_b, &b[range])
        );
        assert_eq!(ra.status_code(), 200);
        assert_eq!(rb.status_code(), 200);

        if index == 1 {
            let body_a: Value = ra.json();
            let body_b: Value = rb.json();
            let name_a = body_a["filename"].as_str().unwrap();
            let name_b = body_b["filename"].as_str().unwrap();
            assert_ne!(name_a, name_b);
            assert_eq!(tokio::fs::read(app.final_dir().join(name_a)).await.unwrap(), a);
            assert_eq!(tokio::fs::read(app.final_dir().join(name_b)).await.unwrap(), b);
        }
    }
}

#[tokio::test]
async fn test_resent_chunk_overwrites_previous_bytes() {
    let app = setup_test_app().await;
    let client = app.client();

    let spec0 = ChunkSpec::new("resend", 0, 2, 6);
    assert_eq!(send_chunk(client, &spec0, b"xxx").await.status_code(), 200);
    assert_eq!(send_chunk(client, &spec0, b"abc").await.status_code(), 200);

    let spec1 = ChunkSpec::new("resend", 1, 2, 6);
    let response = send_chunk(client, &spec1, b"def").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    let filename = body["filename"].as_str().unwrap();
    assert_eq!(
        tokio::fs::read(app.final_dir().join(filename)).await.unwrap(),
        b"abcdef"
    );
}

#[tokio::test]
async fn test_last_chunk_with_missing_predecessor_fails_assembly() {
    let app = setup_test_app().await;
    let spec = ChunkSpec::new("gap", 2, 3, 30);

    let response = send_chunk(app.client(), &spec, &payload(10)).await;

    assert_eq!(response.status_code(), 500);
    let body: Value = response.json();
    assert_eq!(body["error"], "Failed to assemble file chunks");
    assert_eq!(body["details"], "One or more chunks could not be processed");
    let leftovers: Vec<_> = std::fs::read_dir(app.final_dir())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_missing_headers_returns_not_implemented() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post(UPLOAD_ROUTE)
        .multipart(helpers::chunk_form(b"whole file"))
        .await;

    assert_eq!(response.status_code(), 501);
    let body: Value = response.json();
    assert_eq!(body["error"], "Single file upload not implemented in this version");
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_structural_errors_return_bad_request() {
    let app = setup_test_app().await;
    let client = app.client();

    for (index, total) in [(3u32, 3u32), (0, 0)] {
        let spec = ChunkSpec::new("structural", index, total, 10);
        let response = send_chunk(client, &spec, b"x").await;
        assert_eq!(response.status_code(), 400, "index={} total={}", index, total);
        let body: Value = response.json();
        assert_eq!(body["error"], "Invalid upload request");
    }

    let spec = ChunkSpec::new("../../etc", 0, 1, 1);
    assert_eq!(send_chunk(client, &spec, b"x").await.status_code(), 400);
    assert!(!app.tmp_dir().join("structural").exists());
}

#[tokio::test]
async fn test_missing_chunk_field_returns_bad_request() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post(UPLOAD_ROUTE)
        .add_header("x-upload-id", "no-body")
        .add_header("x-chunk-index", "0")
        .add_header("x-total-chunks", "1")
        .add_header("x-original-filename", "a.pdf")
        .add_header("x-file-type", "application/pdf")
        .add_header("x-file-size", "1")
        .multipart(axum_test::multipart::MultipartForm::new().add_text("other", "value"))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"], "No chunk data uploaded");
}

#[tokio::test]
async fn test_chunk_above_max_chunk_size_is_rejected() {
    let app = setup_test_app_with(|c| {
        c.min_chunk_size = 1024;
        c.default_chunk_size = 1024;
        c.max_chunk_size = 1024;
    })
    .await;
    let spec = ChunkSpec::new("too-big", 0, 2, 4096);

    let response = send_chunk(app.client(), &spec, &payload(2048)).await;

    assert_eq!(response.status_code(), 413);
    let body: Value = response.json();
    assert_eq!(body["error"], "Chunk too large");
    assert!(!app.chunk_path("too-big", 0).exists());
}

#[tokio::test]
async fn test_body_over_server_limit_gets_protocol_error() {
    let app = setup_test_app_with(|c| {
        c.min_chunk_size = 1024;
        c.default_chunk_size = 1024;
        c.max_chunk_size = 1024;
    })
    .await;
    let body = vec![0u8; 200_000];

    let response = app
        .client()
        .post(UPLOAD_ROUTE)
        .add_header("content-length", body.len().to_string())
        .bytes(body.into())
        .await;

    assert_eq!(response.status_code(), 413);
    let body: Value = response.json();
    assert_eq!(body["responseType"], "error");
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "REQUEST_TOO_LARGE");
    assert_eq!(body["error"], "Request too large");
    assert_eq!(body["suggestedAction"], "Use a smaller chunk size");
}

#[tokio::test]
async fn test_public_base_url_drives_ufs_url() {
    let app = setup_test_app_with(|c| {
        c.public_base_url = Some("https://files.example.com".to_string());
    })
    .await;
    let spec = ChunkSpec::new("base-url", 0, 1, 3);

    let response = send_chunk(app.client(), &spec, b"abc").await;
    let body: Value = response.json();

    assert_eq!(body["appUrl"], "https://files.example.com");
    assert_eq!(
        body["ufsUrl"],
        format!("https://files.example.com/uploads/{}", body["filename"].as_str().unwrap())
    );
}

#[tokio::test]
async fn test_zero_byte_file_produces_empty_artifact() {
    let app = setup_test_app().await;
    let spec = ChunkSpec::new("empty", 0, 1, 0).hash(chunk_digest(b""));

    let response = send_chunk(app.client(), &spec, b"").await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    let filename = body["filename"].as_str().unwrap();
    let meta = tokio::fs::metadata(app.final_dir().join(filename)).await.unwrap();
    assert_eq!(meta.len(), 0);
}
