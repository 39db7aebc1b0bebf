//! Shared harness for the end-to-end tests: an application on a random
//! port with mock providers and an in-memory vector index, plus PDF
//! fixtures generated on the fly.

#![allow(dead_code)]

use std::sync::Arc;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use study_assistant::config::AppConfig;
use study_assistant::providers::{MockCompleter, MockEmbeddings};
use study_assistant::startup::Application;
use study_assistant::vector::InMemoryVectorIndex;

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.address)
    }
}

/// Build and spawn the app with mock providers. The similarity threshold is
/// lowered because the hash-based mock embedder produces small cosines even
/// for clearly related texts; out-of-document detection then rides on the
/// answer's post-signal, which the mock completer produces faithfully.
pub async fn spawn_app() -> TestApp {
    let mut config = AppConfig::default();
    config.server.port = 0;
    config.retrieval.similarity_fallback_threshold = 0.01;

    let app = Application::build(
        config,
        Arc::new(MockEmbeddings::new(256)),
        Arc::new(MockCompleter::new()),
        Arc::new(InMemoryVectorIndex::new()),
    )
    .await
    .expect("Failed to build application");

    let address = format!("http://127.0.0.1:{}", app.port());
    tokio::spawn(app.run_until_stopped());

    TestApp {
        address,
        client: reqwest::Client::new(),
    }
}

/// Serialize a PDF with one text page per entry.
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![50.into(), 780.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode page content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("serialize test PDF");
    buffer
}

/// A two-page study document used across the suites.
pub fn biology_pdf() -> Vec<u8> {
    pdf_with_pages(&[
        "Photosynthesis converts light energy into chemical energy stored in glucose. The \
         process takes place inside the chloroplasts of plant cells, where chlorophyll \
         pigments capture sunlight and power the synthesis of sugars from carbon dioxide \
         and water.",
        "Cellular respiration releases the chemical energy held in glucose. Mitochondria \
         break sugars down through glycolysis and the citric acid cycle, producing ATP \
         that powers the rest of the cell's activities throughout the day.",
    ])
}

/// Upload a PDF and return the parsed response body.
pub async fn upload_pdf(app: &TestApp, filename: &str, bytes: Vec<u8>) -> serde_json::Value {
    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(filename.to_string())
        .mime_str("application/pdf")
        .expect("valid mime");
    let form = reqwest::multipart::Form::new().part("files", part);

    let response = app
        .client
        .post(app.url("/upload"))
        .multipart(form)
        .send()
        .await
        .expect("upload request");
    assert_eq!(response.status().as_u16(), 201, "upload should succeed");
    response.json().await.expect("upload response body")
}
