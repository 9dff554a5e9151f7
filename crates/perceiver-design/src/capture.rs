//! Resolved-style capture for an element and its pseudo-element contexts.

use std::collections::BTreeMap;

use stylescope_core_types::{ComputedStyle, NodeId, PseudoElement};

use crate::errors::PerceiverError;
use crate::model::{PseudoRecord, StyleRecord};
use crate::ports::DocumentPort;

/// Visual, typographic and motion properties worth reporting.
pub const STYLE_PROPERTIES: [&str; 40] = [
    "color",
    "background-color",
    "background-image",
    "border-width",
    "border-style",
    "border-color",
    "border-radius",
    "box-shadow",
    "outline",
    "outline-offset",
    "opacity",
    "font-family",
    "font-size",
    "font-weight",
    "font-style",
    "line-height",
    "letter-spacing",
    "text-transform",
    "text-align",
    "text-decoration",
    "text-shadow",
    "white-space",
    "padding",
    "margin",
    "gap",
    "width",
    "height",
    "max-width",
    "min-height",
    "position",
    "top",
    "left",
    "z-index",
    "overflow",
    "cursor",
    "transform",
    "filter",
    "backdrop-filter",
    "transition",
    "animation",
];

const GENERIC_SENTINELS: [&str; 8] = [
    "",
    "none",
    "auto",
    "normal",
    "0px",
    "rgba(0, 0, 0, 0)",
    "transparent",
    "initial",
];

/// True when `value` is the no-op value for `property` and carries no design information.
pub fn is_sentinel(property: &str, value: &str) -> bool {
    let value = value.trim();
    if GENERIC_SENTINELS.contains(&value) {
        return true;
    }
    match property {
        "color" => value == "rgb(0, 0, 0)",
        "opacity" => value == "1",
        "font-family" => value == "serif",
        "font-size" => value == "16px",
        "font-weight" => value == "400",
        "text-align" => matches!(value, "start" | "left"),
        "position" => value == "static",
        "visibility" | "overflow" => value == "visible",
        "transition" => value == "all 0s ease 0s",
        "animation" => value.starts_with("none "),
        "outline" => value.split_whitespace().any(|token| token == "none"),
        "text-decoration" => value.starts_with("none"),
        "content" => matches!(value, "normal" | "none"),
        _ => false,
    }
}

/// Full allow-list values, sentinels included. State diffs compare these.
pub fn raw_from(style: &ComputedStyle) -> StyleRecord {
    STYLE_PROPERTIES
        .iter()
        .map(|&name| (name.to_string(), style.get(name).to_string()))
        .collect()
}

/// Sparse record: allow-listed properties whose value is not a sentinel.
pub fn record_from(style: &ComputedStyle) -> StyleRecord {
    record_from_raw(&raw_from(style))
}

pub fn record_from_raw(raw: &StyleRecord) -> StyleRecord {
    let border_style = raw.get("border-style").map(String::as_str).unwrap_or("");
    let border_drawn = !matches!(border_style, "none" | "hidden" | "");
    raw.iter()
        .filter(|(name, _)| border_drawn || !matches!(name.as_str(), "border-width" | "border-color"))
        .filter(|(name, value)| !is_sentinel(name, value))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

pub fn styles<D>(doc: &D, node: NodeId) -> Result<StyleRecord, PerceiverError>
where
    D: DocumentPort + ?Sized,
{
    Ok(record_from(&resolved(doc, node, None)?))
}

pub fn raw_styles<D>(doc: &D, node: NodeId) -> Result<StyleRecord, PerceiverError>
where
    D: DocumentPort + ?Sized,
{
    Ok(raw_from(&resolved(doc, node, None)?))
}

/// Re-resolves each pseudo-element context and keeps the meaningful ones.
pub fn pseudo_all<D>(doc: &D, node: NodeId) -> Result<BTreeMap<String, PseudoRecord>, PerceiverError>
where
    D: DocumentPort + ?Sized,
{
    let host = resolved(doc, node, None)?;
    let host_record = record_from(&host);
    let tag = doc.tag_name(node).unwrap_or_default();

    let mut out = BTreeMap::new();
    for pseudo in PseudoElement::ALL {
        if pseudo == PseudoElement::Placeholder && !matches!(tag.as_str(), "input" | "textarea") {
            continue;
        }
        let style = resolved(doc, node, Some(pseudo))?;
        let record = record_from(&style);
        let keep = if pseudo.generates_content() {
            has_generated_box(&style, &record)
        } else {
            record
                .iter()
                .any(|(name, value)| host_record.get(name) != Some(value))
        };
        if !keep {
            continue;
        }
        let content = pseudo
            .generates_content()
            .then(|| style.get("content").to_string());
        out.insert(
            pseudo.name().to_string(),
            PseudoRecord {
                styles: record,
                content,
            },
        );
    }
    Ok(out)
}

fn has_generated_box(style: &ComputedStyle, record: &StyleRecord) -> bool {
    let content = style.get("content").trim();
    if is_sentinel("content", content) || content.is_empty() {
        return false;
    }
    if style.get("display") == "none" {
        return false;
    }
    let empty_string = content == "\"\"" || content == "''";
    if !empty_string {
        return true;
    }
    let sized = ["width", "height"]
        .iter()
        .any(|name| px_value(style.get(name)).map(|v| v > 0.0).unwrap_or(false));
    sized || !record.is_empty()
}

/// Parses `12px` / `12.5px` / `0`. Anything else is `None`.
pub fn px_value(value: &str) -> Option<f64> {
    let value = value.trim();
    if value == "0" {
        return Some(0.0);
    }
    value.strip_suffix("px")?.trim().parse::<f64>().ok()
}

fn resolved<D>(doc: &D, node: NodeId, pseudo: Option<PseudoElement>) -> Result<ComputedStyle, PerceiverError>
where
    D: DocumentPort + ?Sized,
{
    if !doc.contains(node) {
        return Err(PerceiverError::not_found(node.to_string()));
    }
    Ok(doc.computed_style(node, pseudo)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom_adapter::{el, MemoryDocument};

    #[test]
    fn unstyled_element_has_empty_record() {
        let doc = MemoryDocument::builder()
            .root(el("html").child(el("body").child(el("div").class("plain"))))
            .build();
        let node = doc.query(".plain").unwrap().unwrap();
        assert!(styles(&doc, node).unwrap().is_empty());
        assert!(pseudo_all(&doc, node).unwrap().is_empty());
    }

    #[test]
    fn records_overrides_and_drops_sentinels() {
        let doc = MemoryDocument::builder()
            .stylesheet(".btn { color: #ff0000; padding: 8px 16px; border: 0 none; opacity: 0.8 }")
            .root(el("html").child(el("body").child(el("button").class("btn"))))
            .build();
        let node = doc.query(".btn").unwrap().unwrap();
        let record = styles(&doc, node).unwrap();
        assert_eq!(record.get("color").map(String::as_str), Some("rgb(255, 0, 0)"));
        assert_eq!(record.get("padding").map(String::as_str), Some("8px 16px"));
        assert_eq!(record.get("opacity").map(String::as_str), Some("0.8"));
        assert!(!record.contains_key("border-color"));
        assert!(!record.contains_key("border-width"));
    }

    #[test]
    fn keeps_decorative_pseudo_boxes_only() {
        let doc = MemoryDocument::builder()
            .stylesheet(
                r#"
                .badge::before { content: ""; background-color: red; }
                .badge::after { content: none; color: blue; }
                .label::after { content: "→"; }
                input::placeholder { color: gray; }
                "#,
            )
            .root(
                el("html").child(
                    el("body")
                        .child(el("span").class("badge"))
                        .child(el("span").class("label"))
                        .child(el("input").attr("type", "text")),
                ),
            )
            .build();
        let badge = doc.query(".badge").unwrap().unwrap();
        let pseudo = pseudo_all(&doc, badge).unwrap();
        assert!(pseudo.contains_key("before"));
        assert!(!pseudo.contains_key("after"));

        let label = doc.query(".label").unwrap().unwrap();
        let pseudo = pseudo_all(&doc, label).unwrap();
        assert_eq!(pseudo["after"].content.as_deref(), Some("\"→\""));

        let input = doc.query("input").unwrap().unwrap();
        let pseudo = pseudo_all(&doc, input).unwrap();
        assert!(pseudo.contains_key("placeholder"));
        assert!(!pseudo.contains_key("selection"));
    }

    #[test]
    fn sentinels_are_property_specific() {
        assert!(is_sentinel("opacity", "1"));
        assert!(!is_sentinel("z-index", "1"));
        assert!(is_sentinel("outline", "rgb(0, 0, 0) none 0px"));
        assert!(is_sentinel("animation", "none 0s ease 0s 1 normal none running"));
        assert!(!is_sentinel("transition", "opacity 0.2s ease 0s"));
    }
}
