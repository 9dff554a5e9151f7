use std::sync::Arc;

use serde_json::Value;
use stylescope::dom_adapter::{el, MemoryDocument};
use stylescope::perceiver_design::{ManualScheduler, ProbePolicy};
use stylescope::{keyframes_from_css, Stylescope};

fn scope(doc: MemoryDocument) -> Stylescope<MemoryDocument, ManualScheduler> {
    Stylescope::new(
        Arc::new(doc),
        Arc::new(ManualScheduler::new()),
        ProbePolicy::default(),
    )
}

fn page() -> MemoryDocument {
    MemoryDocument::builder()
        .stylesheet("#hero { color: rgb(10, 20, 30) }")
        .root(el("html").child(el("body").child(el("div").id("hero"))))
        .build()
}

#[tokio::test]
async fn success_envelope_carries_data_and_session() {
    let scope = scope(page());
    let envelope = scope.capture("#hero").await;

    assert_eq!(envelope["ok"], Value::Bool(true));
    assert_eq!(envelope["reason"], Value::Null);
    assert_eq!(envelope["capability"], "style");
    assert_eq!(envelope["operation"], "capture");
    assert_eq!(envelope["data"]["address"], "#hero");
    assert_eq!(
        envelope["session"].as_str(),
        Some(scope.perceiver().session().0.as_str())
    );
    assert!(envelope["capturedAt"].is_string());
}

#[tokio::test]
async fn failure_envelope_has_tagged_reason_and_no_data() {
    let scope = scope(page());
    let envelope = scope.inspect("#missing").await;

    assert_eq!(envelope["ok"], Value::Bool(false));
    assert_eq!(envelope["capability"], "layout");
    assert_eq!(envelope["data"], Value::Null);
    let reason = envelope["reason"].as_str().unwrap();
    assert!(reason.starts_with("not_found: "), "{reason}");
}

#[tokio::test]
async fn variables_capability_reports_tokens() {
    let scope = scope(
        MemoryDocument::builder()
            .stylesheet(":root { --space-8: 8px }")
            .root(el("html").child(el("body")))
            .build(),
    );
    let envelope = scope.extract_variables().await;
    assert_eq!(envelope["ok"], Value::Bool(true));
    assert_eq!(envelope["capability"], "variables");
}

#[test]
fn offline_keyframes_need_no_session() {
    let sources = vec![(
        "site.css".to_string(),
        "@keyframes spin { to { transform: rotate(1turn) } }".to_string(),
    )];
    let envelope = keyframes_from_css(&sources, 10);

    assert_eq!(envelope["ok"], Value::Bool(true));
    assert_eq!(envelope["session"], Value::Null);
    assert_eq!(envelope["data"]["total"], 1);
    assert_eq!(envelope["data"]["keyframes"][0]["name"], "spin");
    assert_eq!(envelope["data"]["keyframes"][0]["file"], "site.css");
}

#[test]
fn keyframes_total_counts_unique_names_before_the_limit() {
    let sources = vec![
        (
            "a.css".to_string(),
            "@keyframes fade { to { opacity: 0 } } @keyframes spin { to { opacity: 1 } }"
                .to_string(),
        ),
        (
            "b.css".to_string(),
            "@keyframes fade { from { opacity: 1 } } @keyframes zoom { to { opacity: 1 } }"
                .to_string(),
        ),
    ];
    let envelope = keyframes_from_css(&sources, 2);

    assert_eq!(envelope["data"]["total"], 3);
    let names: Vec<&str> = envelope["data"]["keyframes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|block| block["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["fade", "spin"]);
}
