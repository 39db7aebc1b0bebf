mod common;

use common::{biology_pdf, pdf_with_pages, spawn_app, upload_pdf};

#[tokio::test]
async fn health_check_works() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/health"))
        .send()
        .await
        .expect("health request");
    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn upload_indexes_document() {
    let app = spawn_app().await;

    let body = upload_pdf(&app, "biology.pdf", biology_pdf()).await;

    assert!(!body["document_id"].as_str().unwrap().is_empty());
    assert_eq!(body["filename"], "biology.pdf");
    assert_eq!(body["page_count"], 2);
    assert!(body["chunks_created"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn uploaded_document_appears_in_listing() {
    let app = spawn_app().await;

    let body = upload_pdf(&app, "notes.pdf", biology_pdf()).await;
    let document_id = body["document_id"].as_str().unwrap();
    let chunks = body["chunks_created"].as_u64().unwrap();

    let response = app
        .client
        .get(app.url("/documents/list"))
        .send()
        .await
        .expect("list request");
    assert!(response.status().is_success());

    let listing: serde_json::Value = response.json().await.unwrap();
    let documents = listing["documents"].as_array().unwrap();
    assert_eq!(listing["total"], 1);

    let entry = documents
        .iter()
        .find(|d| d["document_id"] == document_id)
        .expect("uploaded document listed");
    assert_eq!(entry["filename"], "notes.pdf");
    assert_eq!(entry["vector_count"].as_u64().unwrap(), chunks);
}

#[tokio::test]
async fn upload_rejects_non_pdf_filename() {
    let app = spawn_app().await;

    let part = reqwest::multipart::Part::bytes(vec![1, 2, 3])
        .file_name("notes.txt")
        .mime_str("text/plain")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("files", part);

    let response = app
        .client
        .post(app.url("/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().contains("PDF"));
}

#[tokio::test]
async fn upload_rejects_garbage_bytes() {
    let app = spawn_app().await;

    let part = reqwest::multipart::Part::bytes(b"not a pdf at all".to_vec())
        .file_name("broken.pdf")
        .mime_str("application/pdf")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("files", part);

    let response = app
        .client
        .post(app.url("/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn upload_rejects_document_with_too_little_text() {
    let app = spawn_app().await;

    let part = reqwest::multipart::Part::bytes(pdf_with_pages(&["tiny"]))
        .file_name("tiny.pdf")
        .mime_str("application/pdf")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("files", part);

    let response = app
        .client
        .post(app.url("/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn upload_without_files_is_rejected() {
    let app = spawn_app().await;

    let form = reqwest::multipart::Form::new().text("note", "no file here");
    let response = app
        .client
        .post(app.url("/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn multi_file_upload_combines_pages() {
    let app = spawn_app().await;

    let first = reqwest::multipart::Part::bytes(biology_pdf())
        .file_name("first.pdf")
        .mime_str("application/pdf")
        .unwrap();
    let second = reqwest::multipart::Part::bytes(pdf_with_pages(&[
        "Photosynthesis and respiration form a cycle: one stores energy in glucose while the \
         other releases it, keeping carbon and oxygen moving through the biosphere.",
    ]))
    .file_name("second.pdf")
    .mime_str("application/pdf")
    .unwrap();

    let form = reqwest::multipart::Form::new()
        .part("files", first)
        .part("files", second);

    let response = app
        .client
        .post(app.url("/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["page_count"], 3);
    assert_eq!(body["filename"], "first.pdf, second.pdf");
}
