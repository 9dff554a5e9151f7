//! Container classification, geometry and the page skeleton.

use std::collections::{BTreeMap, HashSet};

use stylescope_core_types::{ComputedStyle, Edges, NodeId};

use crate::address::AddressResolver;
use crate::capture::px_value;
use crate::errors::PerceiverError;
use crate::model::{
    BlockRegion, ChildDescriptor, ContainerAudit, ContainerDescriptor, Geometry,
    LandmarkRegion, LayoutKind, Skeleton, StyleRecord,
};
use crate::policy::ProbePolicy;
use crate::ports::DocumentPort;

/// (property, default values) reported on flex containers when not default.
const FLEX_PROPERTIES: &[(&str, &[&str])] = &[
    ("flex-direction", &["row"]),
    ("flex-wrap", &["nowrap"]),
    ("justify-content", &["normal", "flex-start", "start"]),
    ("align-items", &["normal", "stretch"]),
    ("align-content", &["normal"]),
    ("gap", &["normal", "0px"]),
];

const GRID_PROPERTIES: &[(&str, &[&str])] = &[
    ("grid-template-columns", &["none"]),
    ("grid-template-rows", &["none"]),
    ("grid-template-areas", &["none"]),
    ("grid-auto-flow", &["row"]),
    ("grid-auto-columns", &["auto"]),
    ("grid-auto-rows", &["auto"]),
    ("gap", &["normal", "0px"]),
    ("justify-items", &["normal", "stretch"]),
    ("align-items", &["normal", "stretch"]),
    ("justify-content", &["normal", "start"]),
    ("align-content", &["normal"]),
];

const FLEX_CHILD_PROPERTIES: &[(&str, &[&str])] = &[
    ("flex-grow", &["0"]),
    ("flex-shrink", &["1"]),
    ("flex-basis", &["auto"]),
    ("order", &["0"]),
    ("align-self", &["auto"]),
];

const GRID_CHILD_PROPERTIES: &[(&str, &[&str])] = &[
    ("grid-column", &["auto", "auto / auto"]),
    ("grid-row", &["auto", "auto / auto"]),
    ("grid-area", &["auto", "auto / auto / auto / auto"]),
    ("justify-self", &["auto"]),
    ("align-self", &["auto"]),
    ("order", &["0"]),
];

const BLOCK_CANDIDATES: &str = "section, article, div, form";

pub fn classify_display(display: &str) -> LayoutKind {
    match display.trim() {
        "flex" | "inline-flex" => LayoutKind::Flex,
        "grid" | "inline-grid" => LayoutKind::Grid,
        "block" | "flow-root" | "list-item" => LayoutKind::Flow,
        "inline" | "inline-block" => LayoutKind::Inline,
        "none" => LayoutKind::None,
        _ => LayoutKind::Other,
    }
}

pub fn classify<D>(doc: &D, node: NodeId) -> Result<LayoutKind, PerceiverError>
where
    D: DocumentPort + ?Sized,
{
    Ok(classify_display(style_of(doc, node)?.get("display")))
}

pub fn inspect<D>(
    doc: &D,
    resolver: &AddressResolver,
    policy: &ProbePolicy,
    node: NodeId,
) -> Result<ContainerDescriptor, PerceiverError>
where
    D: DocumentPort + ?Sized,
{
    let style = style_of(doc, node)?;
    let display = style.get("display").to_string();
    let kind = classify_display(&display);
    let properties = match kind {
        LayoutKind::Flex => non_default(&style, FLEX_PROPERTIES),
        LayoutKind::Grid => non_default(&style, GRID_PROPERTIES),
        _ => StyleRecord::new(),
    };
    let geometry = Geometry {
        computed_width: style.get("width").to_string(),
        computed_height: style.get("height").to_string(),
        rect: doc.bounding_rect(node)?,
        padding: edges(&style, "padding"),
        margin: edges(&style, "margin"),
    };

    let rendered_children: Vec<NodeId> = doc
        .children(node)
        .into_iter()
        .filter(|&child| {
            doc.computed_style(child, None)
                .map(|s| s.get("display") != "none")
                .unwrap_or(false)
        })
        .collect();
    let child_table = match kind {
        LayoutKind::Flex => Some(FLEX_CHILD_PROPERTIES),
        LayoutKind::Grid => Some(GRID_CHILD_PROPERTIES),
        _ => None,
    };
    let mut children = Vec::new();
    if let Some(table) = child_table {
        for &child in rendered_children.iter().take(policy.caps.child_descriptors) {
            let child_style = doc.computed_style(child, None)?;
            children.push(ChildDescriptor {
                address: resolver.resolve(doc, child)?,
                overrides: non_default(&child_style, table),
            });
        }
    }

    Ok(ContainerDescriptor {
        address: resolver.resolve(doc, node)?,
        kind,
        display,
        properties,
        geometry,
        child_count: rendered_children.len(),
        children,
    })
}

/// Landmark regions (one per role, first match wins) and large content blocks.
pub fn skeleton<D>(
    doc: &D,
    resolver: &AddressResolver,
    policy: &ProbePolicy,
) -> Result<Skeleton, PerceiverError>
where
    D: DocumentPort + ?Sized,
{
    if doc.document_element().is_none() {
        return Err(PerceiverError::RootMissing);
    }
    let mut landmarks = Vec::new();
    let mut landmark_nodes = Vec::new();
    for group in &policy.landmarks {
        let found = group.selectors.iter().find_map(|selector| {
            doc.query_all(selector)
                .ok()?
                .into_iter()
                .find(|&node| {
                    !landmark_nodes.contains(&node)
                        && doc
                            .bounding_rect(node)
                            .map(|rect| !rect.is_empty())
                            .unwrap_or(false)
                })
                .map(|node| (selector.clone(), node))
        });
        let Some((selector, node)) = found else {
            continue;
        };
        let style = doc.computed_style(node, None)?;
        landmarks.push(LandmarkRegion {
            role: group.role.clone(),
            address: resolver.resolve(doc, node)?,
            selector,
            rect: doc.bounding_rect(node)?,
            position: style.get("position").to_string(),
            z_index: style.get("z-index").to_string(),
        });
        landmark_nodes.push(node);
    }

    let viewport = doc.viewport();
    let body = doc.body();
    let mut blocks = Vec::new();
    let mut recorded: Vec<NodeId> = Vec::new();
    let candidates = doc.query_all(BLOCK_CANDIDATES)?;
    for node in candidates {
        if blocks.len() >= policy.caps.block_regions {
            break;
        }
        if landmark_nodes.contains(&node) {
            continue;
        }
        if let Some(body) = body {
            if !is_ancestor(doc, body, node) {
                continue;
            }
        }
        if landmark_nodes.iter().any(|&l| is_ancestor(doc, node, l)) {
            continue;
        }
        if recorded.iter().any(|&block| is_ancestor(doc, block, node)) {
            continue;
        }
        let rect = doc.bounding_rect(node)?;
        if rect.width <= viewport.width * 0.5 || rect.height <= 100.0 {
            continue;
        }
        let style = doc.computed_style(node, None)?;
        blocks.push(BlockRegion {
            address: resolver.resolve(doc, node)?,
            tag: doc.tag_name(node).unwrap_or_default(),
            rect,
            display: style.get("display").to_string(),
        });
        recorded.push(node);
    }
    Ok(Skeleton { landmarks, blocks })
}

/// Every sizable flex and grid container, with totals computed before capping.
pub fn audit_containers<D>(
    doc: &D,
    resolver: &AddressResolver,
    policy: &ProbePolicy,
) -> Result<ContainerAudit, PerceiverError>
where
    D: DocumentPort + ?Sized,
{
    if doc.document_element().is_none() {
        return Err(PerceiverError::RootMissing);
    }
    let mut audit = ContainerAudit::default();
    let mut seen = HashSet::new();
    for node in doc.query_all("*")? {
        let Ok(style) = doc.computed_style(node, None) else {
            continue;
        };
        let kind = classify_display(style.get("display"));
        if !kind.is_container() || !seen.insert(node) {
            continue;
        }
        let Ok(rect) = doc.bounding_rect(node) else {
            continue;
        };
        if rect.width < 50.0 || rect.height < 20.0 {
            continue;
        }
        let summary = &mut audit.summary;
        bump(&mut summary.gaps, style.get("gap"));
        bump(&mut summary.justify_content, style.get("justify-content"));
        bump(&mut summary.align_items, style.get("align-items"));
        let bucket = match kind {
            LayoutKind::Flex => {
                summary.total_flex += 1;
                bump(&mut summary.flex_directions, style.get("flex-direction"));
                &mut audit.flex
            }
            _ => {
                summary.total_grid += 1;
                let columns = count_tracks(style.get("grid-template-columns"));
                *summary.grid_columns.entry(columns).or_insert(0) += 1;
                &mut audit.grid
            }
        };
        if bucket.len() < policy.caps.containers {
            match inspect(doc, resolver, policy, node) {
                Ok(descriptor) => bucket.push(descriptor),
                Err(err) => tracing::debug!(%node, %err, "skipping container"),
            }
        }
    }
    Ok(audit)
}

/// Number of explicit tracks in a `grid-template-*` value. `repeat(n, ..)` expands.
pub fn count_tracks(template: &str) -> usize {
    let template = template.trim();
    if template.is_empty() || template == "none" {
        return 0;
    }
    let mut count = 0;
    for token in top_level_tokens(template) {
        if token.starts_with('[') {
            continue;
        }
        if let Some(inner) = token
            .strip_prefix("repeat(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let (times, tracks) = inner.split_once(',').unwrap_or((inner, ""));
            let inner_count = count_tracks(tracks).max(1);
            count += times.trim().parse::<usize>().unwrap_or(1) * inner_count;
        } else {
            count += 1;
        }
    }
    count
}

fn top_level_tokens(value: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    for c in value.chars() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            _ => {}
        }
        if c.is_whitespace() && depth <= 0 {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.push(c);
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn non_default(style: &ComputedStyle, table: &[(&str, &[&str])]) -> StyleRecord {
    table
        .iter()
        .filter_map(|(name, defaults)| {
            let value = style.get(name);
            (!value.is_empty() && !defaults.contains(&value))
                .then(|| (name.to_string(), value.to_string()))
        })
        .collect()
}

fn edges(style: &ComputedStyle, prefix: &str) -> Edges {
    let side = |side: &str| px_value(style.get(&format!("{prefix}-{side}"))).unwrap_or(0.0);
    Edges {
        top: side("top"),
        right: side("right"),
        bottom: side("bottom"),
        left: side("left"),
    }
}

fn bump(histogram: &mut BTreeMap<String, usize>, key: &str) {
    *histogram.entry(key.to_string()).or_insert(0) += 1;
}

/// True when `ancestor` is `node` or one of its ancestors.
fn is_ancestor<D>(doc: &D, ancestor: NodeId, node: NodeId) -> bool
where
    D: DocumentPort + ?Sized,
{
    let mut cursor = Some(node);
    while let Some(current) = cursor {
        if current == ancestor {
            return true;
        }
        cursor = doc.parent(current);
    }
    false
}

fn style_of<D>(doc: &D, node: NodeId) -> Result<ComputedStyle, PerceiverError>
where
    D: DocumentPort + ?Sized,
{
    if !doc.contains(node) {
        return Err(PerceiverError::not_found(node.to_string()));
    }
    Ok(doc.computed_style(node, None)?)
}
