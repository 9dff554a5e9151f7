//! Keyframes, transitions, live animations and per-frame sampling.

use std::collections::{BTreeMap, HashMap, HashSet};

use dom_adapter::css::{matching_brace, split_top_level};
use dom_adapter::values::{format_number, parse_time_ms};
use once_cell::sync::Lazy;
use regex::Regex;
use stylescope_core_types::{AnimationInstance, CssRule, NodeId};
use tracing::debug;

use crate::address::AddressResolver;
use crate::capture::is_sentinel;
use crate::errors::PerceiverError;
use crate::model::{
    KeyframeEndpoints, KeyframeValue, KeyframesBlock, KeyframesDefinition, KeyframesExtract,
    LiveAnimationSample, MotionAudit, MotionFrame, MotionSample, MotionSummary, TransitionItem,
    TransitionSignature,
};
use crate::policy::ProbePolicy;
use crate::ports::{DocumentPort, FrameScheduler};

static KEYFRAMES_HEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@(?:-webkit-|-moz-)?keyframes\s+([^\s{]+)\s*\{").expect("valid keyframes regex")
});

pub const DEFAULT_SAMPLE_PROPERTIES: [&str; 2] = ["transform", "opacity"];

pub fn quick_audit<D>(
    doc: &D,
    resolver: &AddressResolver,
    policy: &ProbePolicy,
) -> Result<MotionAudit, PerceiverError>
where
    D: DocumentPort + ?Sized,
{
    if doc.document_element().is_none() {
        return Err(PerceiverError::RootMissing);
    }
    let mut audit = MotionAudit::default();

    let mut seen = HashSet::new();
    for sheet in doc.style_sheets() {
        let source = sheet.label();
        match sheet.rules {
            Ok(rules) => collect_keyframes(&rules, &source, policy, &mut seen, &mut audit.keyframes),
            Err(err) => {
                debug!(%source, %err, "skipping unreadable style source");
                audit.skipped_sources += 1;
            }
        }
    }

    audit.transitions = transition_signatures(doc, resolver, policy)?;

    audit.animations = doc
        .animations()
        .iter()
        .take(policy.caps.animations)
        .map(|animation| live_sample(doc, resolver, animation))
        .collect();

    audit.libraries = detect_libraries(doc, policy);
    if !audit.libraries.is_empty() {
        audit.warnings.push(format!(
            "script animation libraries detected ({}); stylesheet motion may be incomplete",
            audit.libraries.join(", ")
        ));
    }

    audit.summary = summarize(&audit);
    Ok(audit)
}

fn collect_keyframes(
    rules: &[CssRule],
    source: &str,
    policy: &ProbePolicy,
    seen: &mut HashSet<String>,
    out: &mut Vec<KeyframesDefinition>,
) {
    for rule in rules {
        if out.len() >= policy.caps.keyframes {
            return;
        }
        match rule {
            CssRule::Keyframes { name, frames } => {
                if !seen.insert(name.clone()) {
                    continue;
                }
                let steps = frames.iter().flat_map(|frame| {
                    frame.offsets().into_iter().map(move |offset| {
                        (
                            offset,
                            frame
                                .declarations
                                .iter()
                                .map(|d| (d.name.clone(), d.value.clone()))
                                .collect::<Vec<_>>(),
                        )
                    })
                });
                out.push(KeyframesDefinition {
                    name: name.clone(),
                    source: source.to_string(),
                    properties: endpoints(steps),
                    frame_count: frames.len(),
                });
            }
            CssRule::Group { rules, .. } => collect_keyframes(rules, source, policy, seen, out),
            _ => {}
        }
    }
}

/// First and last offset value per property.
fn endpoints(
    steps: impl IntoIterator<Item = (f64, Vec<(String, String)>)>,
) -> BTreeMap<String, KeyframeEndpoints> {
    let mut out: BTreeMap<String, KeyframeEndpoints> = BTreeMap::new();
    for (offset, values) in steps {
        for (property, value) in values {
            let sample = KeyframeValue {
                value: value.trim().to_string(),
                offset,
            };
            match out.get_mut(&property) {
                Some(entry) => {
                    if offset < entry.from.offset {
                        entry.from = sample.clone();
                    }
                    if offset >= entry.to.offset {
                        entry.to = sample;
                    }
                }
                None => {
                    out.insert(
                        property,
                        KeyframeEndpoints {
                            from: sample.clone(),
                            to: sample,
                        },
                    );
                }
            }
        }
    }
    out
}

fn transition_signatures<D>(
    doc: &D,
    resolver: &AddressResolver,
    policy: &ProbePolicy,
) -> Result<Vec<TransitionSignature>, PerceiverError>
where
    D: DocumentPort + ?Sized,
{
    let mut signatures: Vec<TransitionSignature> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for node in doc.query_all("*")? {
        let Ok(style) = doc.computed_style(node, None) else {
            continue;
        };
        if style.get("display") == "none" {
            continue;
        }
        let shorthand = style.get("transition").trim().to_string();
        if is_sentinel("transition", &shorthand) {
            continue;
        }
        let durations = list(style.get("transition-duration"));
        if durations
            .iter()
            .all(|d| parse_time_ms(d).map(|ms| ms == 0.0).unwrap_or(true))
        {
            continue;
        }
        let slot = match index.get(&shorthand) {
            Some(&slot) => slot,
            None => {
                if signatures.len() >= policy.caps.transitions {
                    continue;
                }
                let properties = list(style.get("transition-property"));
                let timings = list(style.get("transition-timing-function"));
                let delays = list(style.get("transition-delay"));
                let items = properties
                    .iter()
                    .enumerate()
                    .map(|(idx, property)| TransitionItem {
                        property: property.clone(),
                        duration_ms: cycle(&durations, idx)
                            .and_then(|d| parse_time_ms(&d))
                            .unwrap_or(0.0),
                        timing_function: cycle(&timings, idx).unwrap_or_else(|| "ease".into()),
                        delay_ms: cycle(&delays, idx)
                            .and_then(|d| parse_time_ms(&d))
                            .unwrap_or(0.0),
                    })
                    .collect();
                signatures.push(TransitionSignature {
                    shorthand: shorthand.clone(),
                    items,
                    samples: Vec::new(),
                    occurrences: 0,
                });
                index.insert(shorthand, signatures.len() - 1);
                signatures.len() - 1
            }
        };
        let signature = &mut signatures[slot];
        signature.occurrences += 1;
        if signature.samples.len() < policy.caps.transition_samples {
            if let Ok(address) = resolver.resolve(doc, node) {
                signature.samples.push(address);
            }
        }
    }
    Ok(signatures)
}

fn live_sample<D>(
    doc: &D,
    resolver: &AddressResolver,
    animation: &AnimationInstance,
) -> LiveAnimationSample
where
    D: DocumentPort + ?Sized,
{
    let steps = animation.keyframes.iter().map(|frame| {
        (
            frame.offset,
            frame
                .values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Vec<_>>(),
        )
    });
    LiveAnimationSample {
        target: animation
            .target
            .and_then(|node| resolver.resolve(doc, node).ok()),
        name: animation.name.clone(),
        kind: animation.kind,
        duration_ms: animation.duration_ms,
        delay_ms: animation.delay_ms,
        iterations: animation.iterations,
        easing: animation.easing.clone(),
        direction: animation.direction.clone(),
        fill: animation.fill.clone(),
        play_state: animation.play_state.clone(),
        properties: endpoints(steps),
    }
}

fn detect_libraries<D>(doc: &D, policy: &ProbePolicy) -> Vec<String>
where
    D: DocumentPort + ?Sized,
{
    let globals = doc.global_names();
    let scripts: Vec<String> = doc
        .script_sources()
        .iter()
        .map(|src| src.to_ascii_lowercase())
        .collect();
    policy
        .libraries
        .iter()
        .filter(|library| {
            library.globals.iter().any(|g| globals.contains(g))
                || library.script_patterns.iter().any(|pattern| {
                    let pattern = pattern.to_ascii_lowercase();
                    scripts.iter().any(|src| src.contains(&pattern))
                })
                || library.attributes.iter().any(|attr| {
                    doc.query_all(&format!("[{attr}]"))
                        .map(|hits| !hits.is_empty())
                        .unwrap_or(false)
                })
        })
        .map(|library| library.name.clone())
        .collect()
}

fn summarize(audit: &MotionAudit) -> MotionSummary {
    let mut summary = MotionSummary {
        keyframes: audit.keyframes.len(),
        transitions: audit.transitions.len(),
        animations: audit.animations.len(),
        ..MotionSummary::default()
    };
    let timings = audit
        .transitions
        .iter()
        .flat_map(|signature| signature.items.iter())
        .map(|item| (item.duration_ms, item.timing_function.as_str()))
        .chain(
            audit
                .animations
                .iter()
                .map(|animation| (animation.duration_ms, animation.easing.as_str())),
        );
    for (duration_ms, timing) in timings {
        *summary
            .durations
            .entry(format!("{}ms", format_number(duration_ms)))
            .or_insert(0) += 1;
        *summary.timing_functions.entry(timing.to_string()).or_insert(0) += 1;
    }
    summary
}

/// Polls the requested properties once per frame until the clamped window has elapsed.
pub async fn sample<D, S>(
    doc: &D,
    scheduler: &S,
    resolver: &AddressResolver,
    policy: &ProbePolicy,
    node: NodeId,
    duration_ms: f64,
    properties: &[String],
) -> Result<MotionSample, PerceiverError>
where
    D: DocumentPort + ?Sized,
    S: FrameScheduler + ?Sized,
{
    let address = resolver.resolve(doc, node)?;
    let window = policy.timing.sample_window_ms(duration_ms);
    let properties: Vec<String> = if properties.is_empty() {
        DEFAULT_SAMPLE_PROPERTIES.iter().map(|p| p.to_string()).collect()
    } else {
        properties.to_vec()
    };

    let start = scheduler.now_ms();
    let mut frames = Vec::new();
    loop {
        let t_ms = scheduler.now_ms() - start;
        let style = doc.computed_style(node, None)?;
        frames.push(MotionFrame {
            t_ms,
            values: properties
                .iter()
                .map(|p| (p.clone(), style.get(p).to_string()))
                .collect(),
        });
        if t_ms >= window {
            break;
        }
        scheduler.next_frame().await;
    }

    Ok(MotionSample {
        address,
        duration_ms: window,
        properties,
        frames,
    })
}

/// Lifts complete `@keyframes` blocks out of raw stylesheet texts.
///
/// Duplicate names keep their first appearance; the result is sorted by name and truncated.
pub fn extract_keyframes_from_css(sources: &[(String, String)], limit: usize) -> Vec<KeyframesBlock> {
    extract_keyframes(sources, limit).keyframes
}

/// Same as [`extract_keyframes_from_css`], also reporting how many unique names were found
/// before truncation.
pub fn extract_keyframes(sources: &[(String, String)], limit: usize) -> KeyframesExtract {
    let mut blocks: BTreeMap<String, KeyframesBlock> = BTreeMap::new();
    for (file, text) in sources {
        for captures in KEYFRAMES_HEAD.captures_iter(text) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let Some(close) = matching_brace(text, whole.end() - 1) else {
                continue;
            };
            let name = name.as_str().trim_matches(|c| c == '"' || c == '\'').to_string();
            blocks.entry(name.clone()).or_insert_with(|| KeyframesBlock {
                name,
                file: file.clone(),
                css: text[whole.start()..=close].to_string(),
            });
        }
    }
    KeyframesExtract {
        total: blocks.len(),
        keyframes: blocks.into_values().take(limit).collect(),
    }
}

fn list(value: &str) -> Vec<String> {
    split_top_level(value, ',')
}

fn cycle(items: &[String], idx: usize) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    items.get(idx % items.len()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ManualScheduler;
    use dom_adapter::{el, MemoryDocument};
    use stylescope_core_types::AnimationInstance;

    fn ctx() -> (AddressResolver, ProbePolicy) {
        let policy = ProbePolicy::default();
        (AddressResolver::new(&policy), policy)
    }

    #[test]
    fn keyframes_reduce_to_endpoints() {
        let doc = MemoryDocument::builder()
            .stylesheet(
                r#"
                @keyframes fade { 0% { opacity: 0 } 100% { opacity: 1 } }
                @media (min-width: 1px) {
                    @keyframes slide { from { transform: translateX(-10px) } 50% { opacity: .5 } to { transform: none } }
                }
                @keyframes fade { from { opacity: 1 } }
                "#,
            )
            .build();
        let (resolver, policy) = ctx();
        let audit = quick_audit(&doc, &resolver, &policy).unwrap();
        assert_eq!(audit.keyframes.len(), 2);

        let fade = &audit.keyframes[0];
        assert_eq!(fade.name, "fade");
        let opacity = &fade.properties["opacity"];
        assert_eq!((opacity.from.value.as_str(), opacity.from.offset), ("0", 0.0));
        assert_eq!((opacity.to.value.as_str(), opacity.to.offset), ("1", 1.0));

        let slide = &audit.keyframes[1];
        assert_eq!(slide.frame_count, 3);
        assert_eq!(slide.properties["transform"].to.value, "none");
        assert_eq!(slide.properties["opacity"].from.offset, 0.5);
    }

    #[test]
    fn transitions_group_by_shorthand() {
        let doc = MemoryDocument::builder()
            .stylesheet(
                ".fade { transition: opacity .2s ease-in-out }
                 .still { transition: opacity 0s }",
            )
            .root(
                el("html").child(
                    el("body")
                        .child(el("div").class("fade").id("one"))
                        .child(el("div").class("fade").id("two"))
                        .child(el("div").class("still")),
                ),
            )
            .build();
        let (resolver, policy) = ctx();
        let audit = quick_audit(&doc, &resolver, &policy).unwrap();
        assert_eq!(audit.transitions.len(), 1);
        let signature = &audit.transitions[0];
        assert_eq!(signature.occurrences, 2);
        assert_eq!(signature.items[0].property, "opacity");
        assert_eq!(signature.items[0].duration_ms, 200.0);
        assert_eq!(signature.items[0].timing_function, "ease-in-out");
        assert_eq!(signature.samples.len(), 2);
        assert_eq!(audit.summary.durations.get("200ms"), Some(&1));
    }

    #[test]
    fn live_animations_and_libraries() {
        let doc = MemoryDocument::builder()
            .global("gsap")
            .script("https://cdn.example/aos.js")
            .root(el("html").child(el("body").child(el("div").id("hero"))))
            .build();
        let hero = doc.query("#hero").unwrap().unwrap();
        doc.push_animation(
            AnimationInstance::css("pop", hero, 400.0)
                .with_keyframe(0.0, &[("transform", "scale(0.9)")])
                .with_keyframe(1.0, &[("transform", "scale(1)")]),
        );
        let (resolver, policy) = ctx();
        let audit = quick_audit(&doc, &resolver, &policy).unwrap();
        assert_eq!(audit.animations.len(), 1);
        let pop = &audit.animations[0];
        assert_eq!(pop.target.as_ref().map(|a| a.as_str()), Some("#hero"));
        assert_eq!(pop.properties["transform"].from.value, "scale(0.9)");
        assert_eq!(audit.libraries, vec!["gsap".to_string(), "aos".to_string()]);
        assert_eq!(audit.warnings.len(), 1);
    }

    #[tokio::test]
    async fn sampling_runs_until_window_elapses() {
        let doc = MemoryDocument::builder()
            .root(el("html").child(el("body").child(el("div").id("box").style("opacity: 0.5"))))
            .build();
        let node = doc.query("#box").unwrap().unwrap();
        let (resolver, policy) = ctx();
        let scheduler = ManualScheduler::with_frame_ms(25.0);
        let sample = sample(&doc, &scheduler, &resolver, &policy, node, 10.0, &[])
            .await
            .unwrap();
        assert_eq!(sample.duration_ms, 100.0);
        assert_eq!(sample.properties, vec!["transform", "opacity"]);
        let times: Vec<f64> = sample.frames.iter().map(|f| f.t_ms).collect();
        assert_eq!(times, vec![0.0, 25.0, 50.0, 75.0, 100.0]);
        assert_eq!(sample.frames[0].values["opacity"], "0.5");
    }

    #[test]
    fn offline_extraction_dedups_and_sorts() {
        let sources = vec![
            (
                "b.css".to_string(),
                "@keyframes spin { to { transform: rotate(360deg) } } .x { color: red }".to_string(),
            ),
            (
                "a.css".to_string(),
                "@keyframes pulse { 50% { opacity: .5 } }\n@keyframes spin { from { opacity: 0 } }"
                    .to_string(),
            ),
        ];
        let blocks = extract_keyframes_from_css(&sources, 200);
        let names: Vec<_> = blocks.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["pulse", "spin"]);
        assert_eq!(blocks[1].file, "b.css");
        assert_eq!(blocks[1].css, "@keyframes spin { to { transform: rotate(360deg) } }");
        assert_eq!(extract_keyframes_from_css(&sources, 1).len(), 1);
        let extract = extract_keyframes(&sources, 1);
        assert_eq!(extract.keyframes.len(), 1);
        assert_eq!(extract.total, blocks.len());
    }
}
