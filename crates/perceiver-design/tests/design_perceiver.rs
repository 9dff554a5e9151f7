//! End-to-end checks of the design perceiver against an in-memory document.

use std::sync::Arc;

use dom_adapter::{el, MemoryDocument};
use perceiver_design::{
    DefinitionOrigin, DesignPerceiver, DesignPerceiverImpl, ManualScheduler, NodeTarget,
    PerceiverError, ProbePolicy, StateKind, VariableScope,
};

type Perceiver = DesignPerceiverImpl<MemoryDocument, ManualScheduler>;

fn attach(doc: MemoryDocument) -> (Arc<MemoryDocument>, Perceiver) {
    let doc = Arc::new(doc);
    let perceiver = DesignPerceiverImpl::new(
        Arc::clone(&doc),
        Arc::new(ManualScheduler::new()),
        ProbePolicy::default(),
    );
    (doc, perceiver)
}

#[tokio::test]
async fn unique_id_round_trips_through_lookup() {
    let (doc, perceiver) = attach(
        MemoryDocument::builder()
            .root(
                el("html").child(
                    el("body")
                        .child(el("div").id("hero"))
                        .child(el("ul").children([el("li"), el("li").class("active")])),
                ),
            )
            .build(),
    );
    let hero = doc.query("#hero").unwrap().unwrap();
    let address = perceiver.resolve(hero).await.unwrap();
    assert_eq!(address.as_str(), "#hero");
    assert_eq!(perceiver.lookup(address.as_str()).await.unwrap(), hero);

    let item = doc.query("li.active").unwrap().unwrap();
    let address = perceiver.resolve(item).await.unwrap();
    assert_eq!(perceiver.lookup(address.as_str()).await.unwrap(), item);
}

#[tokio::test]
async fn missing_address_is_not_found() {
    let (_doc, perceiver) = attach(
        MemoryDocument::builder()
            .root(el("html").child(el("body")))
            .build(),
    );
    let err = perceiver
        .capture(NodeTarget::from("#nowhere"))
        .await
        .unwrap_err();
    assert!(matches!(err, PerceiverError::NotFound(_)));
    assert_eq!(err.kind(), "not_found");
}

#[tokio::test]
async fn unstyled_node_captures_nothing() {
    let (_doc, perceiver) = attach(
        MemoryDocument::builder()
            .root(el("html").child(el("body").child(el("p").id("copy"))))
            .build(),
    );
    let snapshot = perceiver.capture(NodeTarget::from("#copy")).await.unwrap();
    assert_eq!(snapshot.address.as_str(), "#copy");
    assert!(snapshot.styles.is_empty());
    assert!(snapshot.pseudo.is_empty());
}

#[tokio::test]
async fn hover_rule_shows_up_only_when_present() {
    let (doc, perceiver) = attach(
        MemoryDocument::builder()
            .stylesheet(
                ".cta { color: black } .cta:hover { color: red }
                 .ghost { color: black }",
            )
            .root(
                el("html").child(
                    el("body")
                        .child(el("a").class("cta").attr("href", "/go"))
                        .child(el("a").class("ghost").attr("href", "/stay")),
                ),
            )
            .build(),
    );

    let report = perceiver.diff_states(NodeTarget::from("a.cta")).await.unwrap();
    let hover = report.state(StateKind::Hover).unwrap();
    assert_eq!(
        hover.diff["color"],
        ("rgb(0, 0, 0)".to_string(), "rgb(255, 0, 0)".to_string())
    );

    let ghost = doc.query(".ghost").unwrap().unwrap();
    let report = perceiver.diff_states(NodeTarget::Node(ghost)).await.unwrap();
    assert!(report.state(StateKind::Hover).is_none());

    assert_eq!(doc.injected_rule_count(), 0);
    assert_eq!(doc.interaction(), Default::default());
}

#[tokio::test]
async fn capture_after_diff_matches_base_capture() {
    let (_doc, perceiver) = attach(
        MemoryDocument::builder()
            .stylesheet("button { background-color: #222 } button:hover { background-color: #444 }")
            .root(el("html").child(el("body").child(el("button").id("buy"))))
            .build(),
    );
    let before = perceiver.capture(NodeTarget::from("#buy")).await.unwrap();
    perceiver.diff_states(NodeTarget::from("#buy")).await.unwrap();
    let after = perceiver.capture(NodeTarget::from("#buy")).await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn root_spacing_token_is_global() {
    let (_doc, perceiver) = attach(
        MemoryDocument::builder()
            .stylesheet(":root { --space-8: 8px }")
            .root(el("html").child(el("body")))
            .build(),
    );
    let set = perceiver.extract_variables().await.unwrap();
    assert_eq!(set.definitions.len(), 1);
    let token = &set.definitions[0];
    assert_eq!(token.name, "--space-8");
    assert_eq!(token.category, "spacing");
    assert_eq!(token.scope, VariableScope::Global);
    assert_eq!(token.value, "8px");
}

#[tokio::test]
async fn unreadable_sources_are_skipped_and_counted() {
    let (_doc, perceiver) = attach(
        MemoryDocument::builder()
            .stylesheet(":root { --brand-color: #0af }")
            .cross_origin_stylesheet("https://cdn.example/theme.css", ":root { --hidden: 1px }")
            .root(el("html").child(el("body")))
            .build(),
    );
    let set = perceiver.extract_variables().await.unwrap();
    assert_eq!(set.skipped_sources, 1);
    let names: Vec<_> = set.definitions.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["--brand-color", "--hidden"]);
    // still applied by the cascade, so only the resolved root style reveals it
    let hidden = &set.definitions[1];
    assert_eq!(hidden.origin, DefinitionOrigin::Computed);
    assert_eq!(hidden.selector, ":root");

    let motion = perceiver.quick_audit().await.unwrap();
    assert_eq!(motion.skipped_sources, 1);
}

#[tokio::test]
async fn vendor_prefix_wins_over_keyword_bucket() {
    let (_doc, perceiver) = attach(
        MemoryDocument::builder()
            .stylesheet(":root { --tw-ring-color: #3b82f6; --brand-color: #111 }")
            .root(el("html").child(el("body")))
            .build(),
    );
    let set = perceiver.extract_variables().await.unwrap();
    let ring = set
        .definitions
        .iter()
        .find(|d| d.name == "--tw-ring-color")
        .unwrap();
    assert_eq!(ring.category, "vendor");
    assert!(ring.vendor.is_some());
    let brand = set
        .definitions
        .iter()
        .find(|d| d.name == "--brand-color")
        .unwrap();
    assert_eq!(brand.category, "colors");
}

#[tokio::test]
async fn fade_keyframes_reduce_to_endpoints() {
    let (_doc, perceiver) = attach(
        MemoryDocument::builder()
            .stylesheet("@keyframes fade { 0% { opacity: 0 } 100% { opacity: 1 } }")
            .root(el("html").child(el("body")))
            .build(),
    );
    let audit = perceiver.quick_audit().await.unwrap();
    assert_eq!(audit.keyframes.len(), 1);
    let fade = &audit.keyframes[0];
    assert_eq!(fade.name, "fade");
    let opacity = &fade.properties["opacity"];
    assert_eq!(opacity.from.value, "0");
    assert_eq!(opacity.from.offset, 0.0);
    assert_eq!(opacity.to.value, "1");
    assert_eq!(opacity.to.offset, 1.0);
    assert!(audit.libraries.is_empty());
    assert!(audit.warnings.is_empty());
}

#[tokio::test]
async fn three_landmarks_for_header_main_footer() {
    let (_doc, perceiver) = attach(
        MemoryDocument::builder()
            .root(
                el("html").child(
                    el("body")
                        .child(el("header").rect(0.0, 0.0, 1280.0, 64.0))
                        .child(el("main").rect(0.0, 64.0, 1280.0, 900.0))
                        .child(el("footer").rect(0.0, 964.0, 1280.0, 120.0)),
                ),
            )
            .build(),
    );
    let skeleton = perceiver.skeleton().await.unwrap();
    let roles: Vec<_> = skeleton.landmarks.iter().map(|l| l.role.as_str()).collect();
    assert_eq!(roles, vec!["header", "main", "footer"]);
}

#[tokio::test]
async fn interactive_audit_respects_limit() {
    let buttons = (0..5).map(|i| el("button").class(&format!("b{i}")));
    let (doc, perceiver) = attach(
        MemoryDocument::builder()
            .stylesheet("button:hover { color: red }")
            .root(el("html").child(el("body").children(buttons)))
            .build(),
    );
    let audit = perceiver.audit_interactive(Some(2)).await.unwrap();
    assert_eq!(audit.limit, 2);
    assert_eq!(audit.buttons.len(), 2);
    assert!(audit.links.is_empty());
    assert_eq!(audit.summary.sampled, 2);
    assert_eq!(audit.summary.with_hover, 2);
    assert_eq!(doc.injected_rule_count(), 0);
}

#[tokio::test]
async fn sampling_uses_the_injected_clock() {
    let doc = Arc::new(
        MemoryDocument::builder()
            .root(el("html").child(el("body").child(el("div").id("spinner"))))
            .build(),
    );
    let scheduler = Arc::new(ManualScheduler::new());
    let perceiver = DesignPerceiverImpl::new(
        Arc::clone(&doc),
        Arc::clone(&scheduler),
        ProbePolicy::default(),
    );
    let sample = perceiver
        .sample(NodeTarget::from("#spinner"), 0.0, vec!["opacity".into()])
        .await
        .unwrap();
    assert_eq!(sample.duration_ms, 100.0);
    assert_eq!(sample.properties, vec!["opacity".to_string()]);
    let last = sample.frames.last().unwrap();
    assert!(last.t_ms >= 100.0);
    assert!(sample.frames[..sample.frames.len() - 1]
        .iter()
        .all(|frame| frame.t_ms < 100.0));
    assert_eq!(scheduler.frames_elapsed() as usize, sample.frames.len() - 1);
}

#[tokio::test]
async fn offline_keyframes_are_deduplicated_and_sorted() {
    let (_doc, perceiver) = attach(MemoryDocument::builder().build());
    let sources = vec![
        (
            "site.css".to_string(),
            "@keyframes zoom{from{transform:scale(0)}to{transform:scale(1)}}".to_string(),
        ),
        (
            "vendor.css".to_string(),
            "@-webkit-keyframes bounce { 50% { top: -4px } }\n@keyframes zoom { to { opacity: 0 } }"
                .to_string(),
        ),
    ];
    let blocks = perceiver.extract_keyframes_from_css(&sources, 10);
    let names: Vec<_> = blocks.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["bounce", "zoom"]);
    assert_eq!(blocks[1].file, "site.css");
}

#[tokio::test]
async fn whole_page_operations_need_a_root() {
    let (doc, perceiver) = attach(MemoryDocument::builder().build());
    let root = doc.document_element().unwrap();
    doc.detach(root).unwrap();
    assert!(matches!(
        perceiver.skeleton().await,
        Err(PerceiverError::RootMissing)
    ));
    assert!(matches!(
        perceiver.extract_variables().await,
        Err(PerceiverError::RootMissing)
    ));
}
