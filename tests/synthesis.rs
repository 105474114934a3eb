// tests/synthesis.rs
use std::sync::Arc;

use app_review_insights::analyze::ai_adapter::GeminiProvider;
use app_review_insights::analyze::synthesis::MAX_PROMPT_REVIEWS;
use app_review_insights::ingest::providers::google_csv::parse_google_csv;
use app_review_insights::analyze::{build_prompt, MockGenerator, ResponseFormat, Synthesizer, TextGenerator};
use app_review_insights::{Insight, Review, Source, Verdict};
use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
use chrono::{TimeZone, Utc};
use serde_json::Value;

const GOOD_REPLY: &str = r#"{
  "sentiment": "Mostly happy users.",
  "top_positive": ["Fast", "Clean UI", "Dark mode"],
  "top_negative": ["Login bug"],
  "advice": ["Fix login", "Keep shipping"],
  "verdict": "POSITIVE"
}"#;

fn review(i: usize) -> Review {
    Review::new(
        if i % 2 == 0 { Source::Apple } else { Source::Google },
        "x",
        (i % 5) as f64 + 0.5,
        format!("review number {i}"),
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    )
}

fn with(mock: MockGenerator) -> (Arc<MockGenerator>, Synthesizer) {
    let mock = Arc::new(mock);
    let s = Synthesizer::new(Some(mock.clone()), "German");
    (mock, s)
}

#[tokio::test]
async fn empty_input_is_no_data_sentinel_without_calling_model() {
    let (mock, s) = with(MockGenerator::replying(GOOD_REPLY));
    let got = s.synthesize(&[]).await;
    assert_eq!(got, Insight::no_data());
    assert_eq!(got.verdict, Verdict::Neutral);
    assert!(got.top_positive.is_empty() && got.top_negative.is_empty() && got.advice.is_empty());
    assert!(mock.prompts().is_empty());
}

#[tokio::test]
async fn missing_credential_is_named_in_sentinel() {
    let s = Synthesizer::new(None, "German");
    assert!(!s.is_configured());
    let got = s.synthesize(&[review(0)]).await;
    assert_eq!(got, Insight::credential_missing());
    assert!(got.sentiment.contains("API key missing"));
}

#[tokio::test]
async fn fenced_reply_is_parsed() {
    let fenced = format!("```json\n{GOOD_REPLY}\n```");
    let (_mock, s) = with(MockGenerator::replying(fenced));
    let got = s.synthesize(&[review(0)]).await;
    assert_eq!(got.verdict, Verdict::Positive);
    assert_eq!(got.top_positive, vec!["Fast", "Clean UI", "Dark mode"]);
    assert_eq!(got.advice.len(), 2);
}

#[tokio::test]
async fn call_failure_becomes_neutral_sentinel_with_message() {
    let (_mock, s) = with(MockGenerator::failing("429 RESOURCE_EXHAUSTED: quota exceeded"));
    let got = s.synthesize(&[review(0)]).await;
    assert_eq!(got.verdict, Verdict::Neutral);
    assert!(got.sentiment.contains("quota exceeded"), "{}", got.sentiment);
    assert!(got.advice.is_empty());
}

#[tokio::test]
async fn unparseable_reply_becomes_sentinel() {
    let (_mock, s) = with(MockGenerator::replying("Sure! The users love it."));
    let got = s.synthesize(&[review(0)]).await;
    assert_eq!(got.verdict, Verdict::Neutral);
    assert!(got.sentiment.starts_with("Analysis failed:"));

    // valid JSON, wrong verdict vocabulary
    let (_mock, s) = with(MockGenerator::replying(
        r#"{"sentiment":"meh","verdict":"MIXED"}"#,
    ));
    assert_eq!(s.synthesize(&[review(0)]).await.verdict, Verdict::Neutral);
}

#[tokio::test]
async fn prompt_keeps_first_fifty_in_input_order() {
    let reviews: Vec<Review> = (0..MAX_PROMPT_REVIEWS + 10).map(review).collect();
    let (mock, s) = with(MockGenerator::replying(GOOD_REPLY));
    s.synthesize(&reviews).await;

    let prompts = mock.prompts();
    assert_eq!(prompts.len(), 1);
    let p = &prompts[0];
    assert!(p.contains("- [apple] rating: 0.5, content: review number 0\n"));
    assert!(p.contains("- [google] rating: 4.5, content: review number 49"));
    assert!(!p.contains("review number 50"));
    assert_eq!(p.matches("\n- [").count(), MAX_PROMPT_REVIEWS);
    assert!(p.contains("German"));
}

#[test]
fn normalized_reviews_serialize_to_the_same_prompt() {
    let bytes = include_bytes!("fixtures/google_reviews.csv");
    let first = parse_google_csv(bytes);
    let second = parse_google_csv(bytes);
    assert_eq!(first.len(), 3);

    let lines: Vec<String> = first.iter().map(Review::prompt_line).collect();
    let again: Vec<String> = second.iter().map(Review::prompt_line).collect();
    assert_eq!(lines, again);
    assert!(lines[1].starts_with("- [google] rating: 2, content: Abstürze\n"));
    assert_eq!(build_prompt(&first, "German"), build_prompt(&second, "German"));
}

// ---- Gemini wire format against a loopback stand-in ----

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn fake_gemini(headers: HeaderMap, Json(req): Json<Value>) -> (StatusCode, Json<Value>) {
    if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some("good-key") {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}})),
        );
    }
    assert_eq!(req["generationConfig"]["responseMimeType"], "application/json");
    let prompt = req["contents"][0]["parts"][0]["text"].as_str().unwrap_or_default();
    assert!(prompt.contains("Reviews:"));
    let reply = format!("```json\n{GOOD_REPLY}\n```");
    (
        StatusCode::OK,
        Json(serde_json::json!({"candidates":[{"content":{"role":"model","parts":[{"text": reply}]}}]})),
    )
}

#[tokio::test]
async fn gemini_provider_round_trip_and_error() {
    let base = serve(Router::new().route(
        "/v1beta/models/gemini-2.5-flash:generateContent",
        post(fake_gemini),
    ))
    .await;

    let good = GeminiProvider::new("good-key", "gemini-2.5-flash", &base).unwrap();
    let s = Synthesizer::new(Some(Arc::new(good)), "English");
    let got = s.synthesize(&[review(1)]).await;
    assert_eq!(got.verdict, Verdict::Positive);
    assert_eq!(got.top_negative, vec!["Login bug"]);

    let bad = GeminiProvider::new("bad-key", "gemini-2.5-flash", &base).unwrap();
    let err = bad.generate("hi", ResponseFormat::Json).await.unwrap_err();
    assert!(err.to_string().contains("API key not valid"));

    let s = Synthesizer::new(Some(Arc::new(bad)), "English");
    let got = s.synthesize(&[review(1)]).await;
    assert_eq!(got.verdict, Verdict::Neutral);
    assert!(got.sentiment.contains("API key not valid"));
}
