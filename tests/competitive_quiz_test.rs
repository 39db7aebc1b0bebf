mod common;

use common::{biology_pdf, spawn_app, upload_pdf, TestApp};
use serde_json::json;

async fn generate_bank(app: &TestApp, num_questions: usize) -> serde_json::Value {
    let response = app
        .client
        .post(app.url("/competitive-quiz/generate-bank"))
        .json(&json!({ "num_questions": num_questions, "topic": "cell biology" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    response.json().await.unwrap()
}

async fn start_session(
    app: &TestApp,
    quiz_id: &str,
    num_questions: usize,
) -> serde_json::Value {
    let response = app
        .client
        .post(app.url("/competitive-quiz/start"))
        .json(&json!({ "quiz_id": quiz_id, "num_questions": num_questions }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    response.json().await.unwrap()
}

async fn submit_answer(
    app: &TestApp,
    session_id: &str,
    question_id: &str,
    answer: &str,
) -> reqwest::Response {
    app.client
        .post(app.url("/competitive-quiz/answer"))
        .json(&json!({
            "session_id": session_id,
            "question_id": question_id,
            "answer": answer,
        }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn bank_generation_is_stratified() {
    let app = spawn_app().await;
    let bank = generate_bank(&app, 9).await;

    assert!(!bank["quiz_id"].as_str().unwrap().is_empty());
    let questions = bank["question_bank"].as_array().unwrap();
    assert_eq!(questions.len(), 9);

    for difficulty in ["low", "medium", "hard"] {
        assert!(
            questions.iter().any(|q| q["difficulty"] == difficulty),
            "missing {difficulty} questions"
        );
    }
    for question in questions {
        assert_eq!(question["options"].as_array().unwrap().len(), 4);
        let answer = question["correct_answer"].as_str().unwrap();
        assert!(matches!(answer, "A" | "B" | "C" | "D"));
        assert!(!question["hint"].as_str().unwrap().is_empty());
    }
}

#[tokio::test]
async fn bank_generation_from_document_works() {
    let app = spawn_app().await;
    let uploaded = upload_pdf(&app, "biology.pdf", biology_pdf()).await;
    let document_id = uploaded["document_id"].as_str().unwrap();

    let response = app
        .client
        .post(app.url("/competitive-quiz/generate-bank"))
        .json(&json!({ "num_questions": 6, "document_id": document_id }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let bank: serde_json::Value = response.json().await.unwrap();
    assert_eq!(bank["question_bank"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn bank_generation_validates_inputs() {
    let app = spawn_app().await;

    // Too small a bank.
    let response = app
        .client
        .post(app.url("/competitive-quiz/generate-bank"))
        .json(&json!({ "num_questions": 2, "topic": "anything" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // Both sources at once.
    let response = app
        .client
        .post(app.url("/competitive-quiz/generate-bank"))
        .json(&json!({ "num_questions": 9, "topic": "x", "document_id": "y" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // Neither source.
    let response = app
        .client
        .post(app.url("/competitive-quiz/generate-bank"))
        .json(&json!({ "num_questions": 9 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn session_starts_at_medium() {
    let app = spawn_app().await;
    let bank = generate_bank(&app, 9).await;
    let quiz_id = bank["quiz_id"].as_str().unwrap();

    let started = start_session(&app, quiz_id, 5).await;
    assert!(!started["session_id"].as_str().unwrap().is_empty());
    assert_eq!(started["current_difficulty"], "medium");
    assert_eq!(started["question"]["difficulty"], "medium");
}

#[tokio::test]
async fn session_start_validates_inputs() {
    let app = spawn_app().await;
    let bank = generate_bank(&app, 9).await;
    let quiz_id = bank["quiz_id"].as_str().unwrap();

    let response = app
        .client
        .post(app.url("/competitive-quiz/start"))
        .json(&json!({ "quiz_id": quiz_id, "num_questions": 4 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = app
        .client
        .post(app.url("/competitive-quiz/start"))
        .json(&json!({ "quiz_id": "unknown-quiz", "num_questions": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn correct_answer_never_eases_difficulty() {
    let app = spawn_app().await;
    let bank = generate_bank(&app, 9).await;
    let quiz_id = bank["quiz_id"].as_str().unwrap();

    for _ in 0..20 {
        let started = start_session(&app, quiz_id, 5).await;
        let session_id = started["session_id"].as_str().unwrap();
        let question_id = started["question"]["question_id"].as_str().unwrap();

        // Mock banks key every question to A.
        let response = submit_answer(&app, session_id, question_id, "A").await;
        assert!(response.status().is_success());

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["is_correct"], true);
        assert_ne!(body["next_difficulty"], "low");
    }
}

#[tokio::test]
async fn incorrect_answer_never_escalates_difficulty() {
    let app = spawn_app().await;
    let bank = generate_bank(&app, 9).await;
    let quiz_id = bank["quiz_id"].as_str().unwrap();

    for _ in 0..20 {
        let started = start_session(&app, quiz_id, 5).await;
        let session_id = started["session_id"].as_str().unwrap();
        let question_id = started["question"]["question_id"].as_str().unwrap();

        let response = submit_answer(&app, session_id, question_id, "C").await;
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["is_correct"], false);
        assert_ne!(body["next_difficulty"], "hard");
    }
}

#[tokio::test]
async fn answer_validation_errors() {
    let app = spawn_app().await;
    let bank = generate_bank(&app, 9).await;
    let quiz_id = bank["quiz_id"].as_str().unwrap();
    let started = start_session(&app, quiz_id, 5).await;
    let session_id = started["session_id"].as_str().unwrap();
    let question_id = started["question"]["question_id"].as_str().unwrap();

    // Not a letter.
    let response = submit_answer(&app, session_id, question_id, "yes").await;
    assert_eq!(response.status().as_u16(), 400);

    // Stale question id.
    let response = submit_answer(&app, session_id, "q999", "A").await;
    assert_eq!(response.status().as_u16(), 400);

    // Unknown session.
    let response = submit_answer(&app, "missing-session", question_id, "A").await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn session_completes_after_target_count() {
    let app = spawn_app().await;
    let bank = generate_bank(&app, 9).await;
    let quiz_id = bank["quiz_id"].as_str().unwrap();

    let started = start_session(&app, quiz_id, 5).await;
    let session_id = started["session_id"].as_str().unwrap().to_string();
    let mut question_id = started["question"]["question_id"]
        .as_str()
        .unwrap()
        .to_string();

    for turn in 1..=5 {
        let response = submit_answer(&app, &session_id, &question_id, "A").await;
        assert!(response.status().is_success());
        let body: serde_json::Value = response.json().await.unwrap();

        assert_eq!(body["stats"]["questions_answered"], turn);
        assert_eq!(body["stats"]["correct_answers"], turn);
        assert_eq!(body["stats"]["accuracy"], 100.0);

        if turn == 5 {
            assert_eq!(body["is_complete"], true);
            assert!(body.get("next_question").is_none());
        } else {
            assert_eq!(body["is_complete"], false);
            question_id = body["next_question"]["question_id"]
                .as_str()
                .unwrap()
                .to_string();
        }
    }

    // The finished session refuses further answers.
    let response = submit_answer(&app, &session_id, &question_id, "A").await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn small_bank_ends_session_early() {
    let app = spawn_app().await;
    let bank = generate_bank(&app, 9).await;
    let quiz_id = bank["quiz_id"].as_str().unwrap();

    // Target 10 questions against a 9-item bank: the ninth answer must
    // complete the session with no next question.
    let started = start_session(&app, quiz_id, 10).await;
    let session_id = started["session_id"].as_str().unwrap().to_string();
    let mut question_id = started["question"]["question_id"]
        .as_str()
        .unwrap()
        .to_string();

    let mut answered = 0;
    loop {
        let response = submit_answer(&app, &session_id, &question_id, "A").await;
        assert!(response.status().is_success());
        let body: serde_json::Value = response.json().await.unwrap();
        answered += 1;

        if body["is_complete"] == true {
            assert!(body.get("next_question").is_none());
            break;
        }
        question_id = body["next_question"]["question_id"]
            .as_str()
            .unwrap()
            .to_string();
    }
    assert_eq!(answered, 9);
}

#[tokio::test]
async fn concurrent_answers_serialize_per_session() {
    let app = spawn_app().await;
    let bank = generate_bank(&app, 9).await;
    let quiz_id = bank["quiz_id"].as_str().unwrap();

    let started = start_session(&app, quiz_id, 5).await;
    let session_id = started["session_id"].as_str().unwrap().to_string();
    let question_id = started["question"]["question_id"]
        .as_str()
        .unwrap()
        .to_string();

    // Fire a burst of identical answers. Exactly one may win; the rest
    // must fail with a conflict (lock held) or a stale-question rejection,
    // and the session must have advanced by exactly one turn.
    let mut handles = Vec::new();
    for _ in 0..8 {
        let client = app.client.clone();
        let url = app.url("/competitive-quiz/answer");
        let payload = json!({
            "session_id": session_id,
            "question_id": question_id,
            "answer": "A",
        });
        handles.push(tokio::spawn(async move {
            client.post(url).json(&payload).send().await.unwrap()
        }));
    }

    let mut successes = 0;
    let mut rejections = 0;
    let mut last_success: Option<serde_json::Value> = None;
    for handle in handles {
        let response = handle.await.unwrap();
        match response.status().as_u16() {
            200 => {
                successes += 1;
                last_success = Some(response.json().await.unwrap());
            }
            409 | 400 => rejections += 1,
            other => panic!("unexpected status {other}"),
        }
    }

    assert_eq!(successes, 1, "exactly one concurrent answer may win");
    assert_eq!(rejections, 7);
    let body = last_success.unwrap();
    assert_eq!(body["stats"]["questions_answered"], 1);
}
