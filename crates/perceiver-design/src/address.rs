//! Deterministic node locators.
//!
//! Addresses are CSS selectors built from ids, tags, a couple of classes and
//! `:nth-of-type` indices. They re-resolve to the same node while the tree is unchanged but are
//! not globally unique: two id-less sibling subtrees that only differ above the depth cap share an
//! address, and `lookup` returns the first in document order.

use once_cell::sync::Lazy;
use regex::Regex;
use stylescope_core_types::NodeId;

use crate::errors::PerceiverError;
use crate::model::NodeAddress;
use crate::policy::ProbePolicy;
use crate::ports::DocumentPort;

static PLAIN_IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?[_a-zA-Z][_a-zA-Z0-9-]*$").expect("valid identifier regex"));

/// Classes carrying this prefix are engine markers and never part of an address.
pub const MARKER_PREFIX: &str = "ss-";

pub fn is_plain_ident(value: &str) -> bool {
    PLAIN_IDENT.is_match(value)
}

#[derive(Clone, Debug)]
pub struct AddressResolver {
    max_depth: usize,
    excluded_classes: Vec<String>,
}

impl AddressResolver {
    pub fn new(policy: &ProbePolicy) -> Self {
        Self {
            max_depth: policy.caps.address_depth.max(1),
            excluded_classes: policy.hover_aliases.clone(),
        }
    }

    pub fn resolve<D>(&self, doc: &D, node: NodeId) -> Result<NodeAddress, PerceiverError>
    where
        D: DocumentPort + ?Sized,
    {
        if !doc.contains(node) {
            return Err(PerceiverError::not_found(node.to_string()));
        }
        if let Some(id) = unique_id(doc, node) {
            return Ok(NodeAddress(format!("#{id}")));
        }

        let mut segments = Vec::new();
        let mut cursor = node;
        while segments.len() < self.max_depth {
            let Some(tag) = doc.tag_name(cursor) else {
                break;
            };
            if tag == "html" {
                break;
            }
            segments.push(self.segment(doc, cursor, &tag));
            let Some(parent) = doc.parent(cursor) else {
                break;
            };
            if let Some(id) = unique_id(doc, parent) {
                segments.push(format!("#{id}"));
                break;
            }
            cursor = parent;
        }
        if segments.is_empty() {
            // Only the document element itself ends up here.
            return Ok(NodeAddress("html".into()));
        }
        segments.reverse();
        Ok(NodeAddress(segments.join(" > ")))
    }

    fn segment<D>(&self, doc: &D, node: NodeId, tag: &str) -> String
    where
        D: DocumentPort + ?Sized,
    {
        let mut segment = tag.to_string();
        for class in doc
            .class_list(node)
            .iter()
            .filter(|class| !class.starts_with(MARKER_PREFIX))
            .filter(|class| !self.excluded_classes.iter().any(|alias| alias == *class))
            .filter(|class| is_plain_ident(class))
            .take(2)
        {
            segment.push('.');
            segment.push_str(class);
        }
        if let Some(parent) = doc.parent(node) {
            let same_tag: Vec<NodeId> = doc
                .children(parent)
                .into_iter()
                .filter(|&sibling| doc.tag_name(sibling).as_deref() == Some(tag))
                .collect();
            if same_tag.len() > 1 {
                if let Some(index) = same_tag.iter().position(|&sibling| sibling == node) {
                    segment.push_str(&format!(":nth-of-type({})", index + 1));
                }
            }
        }
        segment
    }
}

/// First document-order match of `address`.
pub fn lookup<D>(doc: &D, address: &str) -> Result<NodeId, PerceiverError>
where
    D: DocumentPort + ?Sized,
{
    doc.query_all(address)
        .map_err(|err| PerceiverError::not_found(format!("{address}: {err}")))?
        .into_iter()
        .next()
        .ok_or_else(|| PerceiverError::not_found(address.to_string()))
}

fn unique_id<D>(doc: &D, node: NodeId) -> Option<String>
where
    D: DocumentPort + ?Sized,
{
    let id = doc.attribute(node, "id")?;
    let id = id.trim();
    if !is_plain_ident(id) {
        return None;
    }
    match doc.query_all(&format!("#{id}")) {
        Ok(hits) if hits.len() == 1 => Some(id.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom_adapter::{el, MemoryDocument};

    fn resolver() -> AddressResolver {
        AddressResolver::new(&ProbePolicy::default())
    }

    #[test]
    fn unique_id_wins() {
        let doc = MemoryDocument::builder()
            .root(el("html").child(el("body").child(el("button").id("cta"))))
            .build();
        let node = doc.query("#cta").unwrap().unwrap();
        let address = resolver().resolve(&doc, node).unwrap();
        assert_eq!(address.as_str(), "#cta");
        assert_eq!(lookup(&doc, address.as_str()).unwrap(), node);
    }

    #[test]
    fn duplicate_ids_fall_back_to_paths() {
        let doc = MemoryDocument::builder()
            .root(
                el("html").child(
                    el("body")
                        .child(el("p").id("dup").class("lead"))
                        .child(el("p").id("dup")),
                ),
            )
            .build();
        let nodes = doc.query_all("p").unwrap();
        let second = resolver().resolve(&doc, nodes[1]).unwrap();
        assert_eq!(second.as_str(), "body > p:nth-of-type(2)");
        assert_eq!(lookup(&doc, second.as_str()).unwrap(), nodes[1]);
    }

    #[test]
    fn anchors_on_ancestor_id_and_skips_markers() {
        let doc = MemoryDocument::builder()
            .root(
                el("html").child(
                    el("body").child(
                        el("section").id("pricing").child(
                            el("div")
                                .class("ss-hover-abc-1")
                                .class("card")
                                .class("card--pro")
                                .class("hover"),
                        ),
                    ),
                ),
            )
            .build();
        let card = doc.query(".card").unwrap().unwrap();
        let address = resolver().resolve(&doc, card).unwrap();
        assert_eq!(address.as_str(), "#pricing > div.card.card--pro");
    }

    #[test]
    fn walk_is_capped() {
        let mut leaf = el("span");
        for _ in 0..8 {
            leaf = el("div").child(leaf);
        }
        let doc = MemoryDocument::builder()
            .root(el("html").child(el("body").child(leaf)))
            .build();
        let span = doc.query("span").unwrap().unwrap();
        let address = resolver().resolve(&doc, span).unwrap();
        assert_eq!(address.as_str().split(" > ").count(), 6);
        assert_eq!(lookup(&doc, address.as_str()).unwrap(), span);
    }

    #[test]
    fn lookup_miss_is_not_found() {
        let doc = MemoryDocument::builder().build();
        let err = lookup(&doc, "#missing").unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }
}
