//! Cascade and computed-value resolution.

use std::collections::{BTreeMap, HashSet};

use stylescope_core_types::{ComputedStyle, CssRule, Declaration, GroupKind, NodeId, PseudoElement, Viewport};
use tracing::debug;

use crate::css;
use crate::selector::{ElementTree, SelectorList, Specificity};
use crate::values;

/// A style rule ready for matching. `order` is its position in the global cascade.
#[derive(Clone, Debug)]
pub struct CompiledRule {
    pub selectors: SelectorList,
    pub declarations: Vec<Declaration>,
    pub order: usize,
}

/// Property table: (name, initial value, inherited).
const PROPERTIES: &[(&str, &str, bool)] = &[
    ("color", "rgb(0, 0, 0)", true),
    ("background-color", "transparent", false),
    ("background-image", "none", false),
    ("border-width", "medium", false),
    ("border-style", "none", false),
    ("border-color", "currentcolor", false),
    ("border-radius", "0px", false),
    ("box-shadow", "none", false),
    ("outline-width", "medium", false),
    ("outline-style", "none", false),
    ("outline-color", "currentcolor", false),
    ("outline-offset", "0px", false),
    ("opacity", "1", false),
    ("font-family", "serif", true),
    ("font-size", "16px", true),
    ("font-weight", "400", true),
    ("font-style", "normal", true),
    ("line-height", "normal", true),
    ("letter-spacing", "normal", true),
    ("text-transform", "none", true),
    ("text-align", "start", true),
    ("text-shadow", "none", true),
    ("white-space", "normal", true),
    ("text-decoration-line", "none", false),
    ("text-decoration-style", "solid", false),
    ("text-decoration-color", "currentcolor", false),
    ("padding-top", "0px", false),
    ("padding-right", "0px", false),
    ("padding-bottom", "0px", false),
    ("padding-left", "0px", false),
    ("margin-top", "0px", false),
    ("margin-right", "0px", false),
    ("margin-bottom", "0px", false),
    ("margin-left", "0px", false),
    ("width", "auto", false),
    ("height", "auto", false),
    ("min-width", "auto", false),
    ("min-height", "auto", false),
    ("max-width", "none", false),
    ("max-height", "none", false),
    ("position", "static", false),
    ("top", "auto", false),
    ("right", "auto", false),
    ("bottom", "auto", false),
    ("left", "auto", false),
    ("z-index", "auto", false),
    ("cursor", "auto", true),
    ("visibility", "visible", true),
    ("pointer-events", "auto", true),
    ("overflow", "visible", false),
    ("transform", "none", false),
    ("filter", "none", false),
    ("backdrop-filter", "none", false),
    ("mix-blend-mode", "normal", false),
    ("box-sizing", "content-box", false),
    ("transition-property", "all", false),
    ("transition-duration", "0s", false),
    ("transition-timing-function", "ease", false),
    ("transition-delay", "0s", false),
    ("animation-name", "none", false),
    ("animation-duration", "0s", false),
    ("animation-timing-function", "ease", false),
    ("animation-delay", "0s", false),
    ("animation-iteration-count", "1", false),
    ("animation-direction", "normal", false),
    ("animation-fill-mode", "none", false),
    ("animation-play-state", "running", false),
    ("flex-direction", "row", false),
    ("flex-wrap", "nowrap", false),
    ("justify-content", "normal", false),
    ("align-items", "normal", false),
    ("align-content", "normal", false),
    ("justify-items", "normal", false),
    ("row-gap", "normal", false),
    ("column-gap", "normal", false),
    ("flex-grow", "0", false),
    ("flex-shrink", "1", false),
    ("flex-basis", "auto", false),
    ("order", "0", false),
    ("align-self", "auto", false),
    ("justify-self", "auto", false),
    ("grid-template-columns", "none", false),
    ("grid-template-rows", "none", false),
    ("grid-template-areas", "none", false),
    ("grid-auto-flow", "row", false),
    ("grid-auto-columns", "auto", false),
    ("grid-auto-rows", "auto", false),
    ("grid-column", "auto", false),
    ("grid-row", "auto", false),
    ("grid-area", "auto", false),
];

const COLOR_PROPERTIES: [&str; 5] = [
    "color",
    "background-color",
    "border-color",
    "outline-color",
    "text-decoration-color",
];

const LENGTH_PROPERTIES: [&str; 16] = [
    "padding-top",
    "padding-right",
    "padding-bottom",
    "padding-left",
    "margin-top",
    "margin-right",
    "margin-bottom",
    "margin-left",
    "row-gap",
    "column-gap",
    "border-width",
    "border-radius",
    "outline-width",
    "outline-offset",
    "letter-spacing",
    "font-size",
];

const BLOCK_TAGS: [&str; 34] = [
    "html", "body", "div", "section", "article", "header", "footer", "nav", "main", "aside", "form",
    "fieldset", "p", "ul", "ol", "li", "h1", "h2", "h3", "h4", "h5", "h6", "figure", "figcaption",
    "blockquote", "pre", "address", "dl", "dt", "dd", "hr", "table", "details", "summary",
];

const HIDDEN_TAGS: [&str; 7] = ["head", "script", "style", "meta", "link", "title", "template"];

const INLINE_BLOCK_TAGS: [&str; 5] = ["button", "input", "select", "textarea", "img"];

/// Flattens every style rule that currently applies, walking conditional groups.
pub fn compile_rules<'a>(
    sheets: impl IntoIterator<Item = &'a [CssRule]>,
    viewport: Viewport,
) -> Vec<CompiledRule> {
    let mut out = Vec::new();
    for rules in sheets {
        compile_into(rules, viewport, &mut out);
    }
    out
}

fn compile_into(rules: &[CssRule], viewport: Viewport, out: &mut Vec<CompiledRule>) {
    for rule in rules {
        match rule {
            CssRule::Style {
                selector,
                declarations,
            } => match SelectorList::parse(selector) {
                Ok(selectors) => {
                    let order = out.len();
                    out.push(CompiledRule {
                        selectors,
                        declarations: declarations.clone(),
                        order,
                    });
                }
                Err(err) => debug!(%selector, ?err, "dropping rule with unsupported selector"),
            },
            CssRule::Group {
                kind,
                condition,
                rules,
            } => {
                let applies = match kind {
                    GroupKind::Media => media_matches(condition, viewport),
                    GroupKind::Supports | GroupKind::Layer | GroupKind::Container => true,
                };
                if applies {
                    compile_into(rules, viewport, out);
                }
            }
            CssRule::Keyframes { .. } | CssRule::FontFace { .. } | CssRule::Other { .. } => {}
        }
    }
}

/// Evaluates a media query list against the document viewport. Unknown features match.
pub fn media_matches(condition: &str, viewport: Viewport) -> bool {
    let lower = condition.to_ascii_lowercase();
    lower
        .split(',')
        .any(|query| single_media_matches(query.trim(), viewport))
}

fn single_media_matches(query: &str, viewport: Viewport) -> bool {
    let (negated, query) = match query.strip_prefix("not ") {
        Some(rest) => (true, rest.trim()),
        None => (false, query.strip_prefix("only ").unwrap_or(query).trim()),
    };
    let result = query
        .split(" and ")
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .all(|part| media_feature_matches(part, viewport));
    result != negated
}

fn media_feature_matches(part: &str, viewport: Viewport) -> bool {
    let Some(feature) = part.strip_prefix('(').and_then(|p| p.strip_suffix(')')) else {
        return !matches!(part, "print" | "speech");
    };
    if let Some((name, value)) = feature.split_once(':') {
        let value = value.trim();
        return match name.trim() {
            "min-width" => px(value).is_some_and(|v| viewport.width >= v),
            "max-width" => px(value).is_some_and(|v| viewport.width <= v),
            "min-height" => px(value).is_some_and(|v| viewport.height >= v),
            "max-height" => px(value).is_some_and(|v| viewport.height <= v),
            "orientation" => (value == "landscape") == (viewport.width >= viewport.height),
            "prefers-reduced-motion" => value != "reduce",
            "prefers-color-scheme" => value != "dark",
            "hover" => value != "none",
            "pointer" => value != "coarse" && value != "none",
            _ => true,
        };
    }
    for op in [">=", "<=", ">", "<"] {
        if let Some((name, value)) = feature.split_once(op) {
            let actual = match name.trim() {
                "width" => viewport.width,
                "height" => viewport.height,
                _ => return true,
            };
            return px(value.trim()).is_some_and(|limit| match op {
                ">=" => actual >= limit,
                "<=" => actual <= limit,
                ">" => actual > limit,
                _ => actual < limit,
            });
        }
    }
    true
}

fn px(value: &str) -> Option<f64> {
    if let Some(raw) = value.strip_suffix("px") {
        return raw.trim().parse().ok();
    }
    if let Some(raw) = value.strip_suffix("rem").or_else(|| value.strip_suffix("em")) {
        return raw.trim().parse::<f64>().ok().map(|v| v * 16.0);
    }
    value.parse().ok()
}

struct Matched<'a> {
    important: bool,
    inline: bool,
    specificity: Specificity,
    order: usize,
    index: usize,
    declaration: &'a Declaration,
}

/// Resolves the computed style of `node` (or one of its pseudo-elements).
pub fn compute_style<T: ElementTree + ?Sized>(
    tree: &T,
    rules: &[&CompiledRule],
    node: NodeId,
    pseudo: Option<PseudoElement>,
) -> ComputedStyle {
    let parent = match pseudo {
        Some(_) => Some(compute_style(tree, rules, node, None)),
        None => tree
            .parent_of(node)
            .map(|parent| compute_style(tree, rules, parent, None)),
    };

    let inline_declarations = match pseudo {
        None => tree
            .attribute_of(node, "style")
            .map(css::parse_declarations)
            .unwrap_or_default(),
        Some(_) => Vec::new(),
    };

    let mut matched: Vec<Matched<'_>> = Vec::new();
    for rule in rules {
        let Some(specificity) = rule.selectors.match_specificity(tree, node, pseudo) else {
            continue;
        };
        for (index, declaration) in rule.declarations.iter().enumerate() {
            matched.push(Matched {
                important: declaration.important,
                inline: false,
                specificity,
                order: rule.order,
                index,
                declaration,
            });
        }
    }
    for (index, declaration) in inline_declarations.iter().enumerate() {
        matched.push(Matched {
            important: declaration.important,
            inline: true,
            specificity: Specificity::default(),
            order: usize::MAX,
            index,
            declaration,
        });
    }
    matched.sort_by(|a, b| {
        (a.important, a.inline, a.specificity, a.order, a.index).cmp(&(
            b.important,
            b.inline,
            b.specificity,
            b.order,
            b.index,
        ))
    });

    let parent_values = parent.as_ref();
    let custom = resolve_custom_properties(&matched, parent_values);

    let mut declared: BTreeMap<String, String> = BTreeMap::new();
    for entry in matched.iter().filter(|m| !m.declaration.is_custom_property()) {
        let raw = entry.declaration.value.as_str();
        let substituted = if raw.contains("var(") {
            substitute_vars(raw, &custom, 0)
        } else {
            Some(raw.to_string())
        };
        let value = substituted.unwrap_or_else(|| "unset".to_string());
        for (longhand, longhand_value) in values::expand_shorthand(&entry.declaration.name, &value) {
            declared.insert(longhand, longhand_value);
        }
    }

    let mut out = ComputedStyle::default();
    for (name, value) in &custom {
        out.set(name.clone(), value.clone());
    }

    for &(name, initial, inherited) in PROPERTIES {
        let parent_value = parent_values.map(|p| p.get(name)).filter(|v| !v.is_empty());
        let value = match declared.get(name).map(|v| v.trim().to_ascii_lowercase()) {
            Some(keyword) if keyword == "inherit" => parent_value.unwrap_or(initial).to_string(),
            Some(keyword) if keyword == "initial" => initial.to_string(),
            Some(keyword) if keyword == "unset" => {
                if inherited {
                    parent_value.unwrap_or(initial).to_string()
                } else {
                    initial.to_string()
                }
            }
            Some(_) => declared
                .get(name)
                .map(|v| collapse(v))
                .unwrap_or_else(|| initial.to_string()),
            None if inherited => parent_value.unwrap_or(initial).to_string(),
            None => initial.to_string(),
        };
        out.set(name, value);
    }

    let display = declared
        .get("display")
        .map(|v| collapse(v))
        .filter(|v| !matches!(v.as_str(), "initial" | "unset" | "inherit"))
        .unwrap_or_else(|| default_display(tree, node, pseudo).to_string());
    out.set("display", display);

    let content = declared
        .get("content")
        .map(|v| collapse(v))
        .unwrap_or_else(|| (if pseudo.is_some() { "none" } else { "normal" }).to_string());
    out.set("content", content);

    for (name, value) in &declared {
        if out.get(name).is_empty() && !name.starts_with("--") {
            out.set(name.clone(), collapse(value));
        }
    }

    finalize(&mut out);
    out
}

fn collapse(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn default_display<T: ElementTree + ?Sized>(
    tree: &T,
    node: NodeId,
    pseudo: Option<PseudoElement>,
) -> &'static str {
    if pseudo.is_some() {
        return "inline";
    }
    let tag = tree.tag_of(node).to_ascii_lowercase();
    if tag == "input" && tree.attribute_of(node, "type") == Some("hidden") {
        return "none";
    }
    if HIDDEN_TAGS.contains(&tag.as_str()) {
        "none"
    } else if BLOCK_TAGS.contains(&tag.as_str()) {
        "block"
    } else if INLINE_BLOCK_TAGS.contains(&tag.as_str()) {
        "inline-block"
    } else if tag == "li" {
        "list-item"
    } else {
        "inline"
    }
}

/// Inherited custom properties overlaid with this element's declarations, var()-resolved.
/// Cyclic or unresolvable definitions are dropped.
fn resolve_custom_properties(
    matched: &[Matched<'_>],
    parent: Option<&ComputedStyle>,
) -> BTreeMap<String, String> {
    let mut raw: BTreeMap<String, String> = BTreeMap::new();
    for entry in matched.iter().filter(|m| m.declaration.is_custom_property()) {
        raw.insert(
            entry.declaration.name.clone(),
            entry.declaration.value.trim().to_string(),
        );
    }

    let mut resolved: BTreeMap<String, String> = parent
        .map(|p| {
            p.custom_properties()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        })
        .unwrap_or_default();
    for (name, value) in &raw {
        match value.to_ascii_lowercase().as_str() {
            "inherit" | "unset" => continue,
            "initial" => {
                resolved.remove(name);
                continue;
            }
            _ => {}
        }
        resolved.remove(name);
        let mut visiting = HashSet::new();
        if let Some(value) = resolve_custom(name, &raw, &resolved, &mut visiting) {
            resolved.insert(name.clone(), value);
        }
    }
    resolved
}

fn resolve_custom(
    name: &str,
    raw: &BTreeMap<String, String>,
    inherited: &BTreeMap<String, String>,
    visiting: &mut HashSet<String>,
) -> Option<String> {
    let Some(value) = raw.get(name) else {
        return inherited.get(name).cloned();
    };
    if !visiting.insert(name.to_string()) {
        return None;
    }
    let result = substitute_with(value, 0, &mut |reference| {
        resolve_custom(reference, raw, inherited, visiting)
    });
    visiting.remove(name);
    result
}

/// Replaces every `var(--x[, fallback])` in `value`. `None` when a reference cannot resolve.
pub fn substitute_vars(value: &str, custom: &BTreeMap<String, String>, depth: usize) -> Option<String> {
    substitute_with(value, depth, &mut |name| custom.get(name).cloned())
}

fn substitute_with(
    value: &str,
    depth: usize,
    lookup: &mut dyn FnMut(&str) -> Option<String>,
) -> Option<String> {
    if depth > 32 {
        return None;
    }
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("var(") {
        out.push_str(&rest[..start]);
        let open = start + 3;
        let close = matching_paren(rest, open)?;
        let inner = &rest[open + 1..close];
        let (name, fallback) = match inner.split_once(',') {
            Some((name, fallback)) => (name.trim(), Some(fallback.trim())),
            None => (inner.trim(), None),
        };
        let replacement = match lookup(name).filter(|v| !v.trim().is_empty()) {
            Some(found) => Some(found),
            None => match fallback {
                Some(fallback) => substitute_with(fallback, depth + 1, lookup),
                None => None,
            },
        }?;
        out.push_str(&replacement);
        rest = &rest[close + 1..];
    }
    out.push_str(rest);
    Some(out)
}

fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, c) in text[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Serializes values the way a resolved-style query reports them and recomposes shorthands.
fn finalize(style: &mut ComputedStyle) {
    let color = values::normalize_color(style.get("color")).unwrap_or_else(|| "rgb(0, 0, 0)".into());
    style.set("color", color.clone());
    for name in COLOR_PROPERTIES.iter().skip(1) {
        let raw = style.get(name).to_string();
        let value = if raw.eq_ignore_ascii_case("currentcolor") {
            color.clone()
        } else {
            values::normalize_color(&raw).unwrap_or(raw)
        };
        style.set(*name, value);
    }
    for name in LENGTH_PROPERTIES {
        let value = values::normalize_lengths(style.get(name));
        style.set(name, value);
    }
    for (style_name, width_name) in [("border-style", "border-width"), ("outline-style", "outline-width")] {
        let width = match style.get(width_name) {
            "thin" => "1px".to_string(),
            "medium" => "3px".to_string(),
            "thick" => "5px".to_string(),
            other => other.to_string(),
        };
        let width = if matches!(style.get(style_name), "none" | "hidden") {
            "0px".to_string()
        } else {
            width
        };
        style.set(width_name, width);
    }
    for name in ["box-shadow", "text-shadow"] {
        let value = style.get(name);
        if value != "none" {
            let normalized = values::normalize_colors_in(value);
            style.set(name, normalized);
        }
    }
    let weight = values::normalize_font_weight(style.get("font-weight"));
    style.set("font-weight", weight);
    for name in [
        "transition-duration",
        "transition-delay",
        "animation-duration",
        "animation-delay",
    ] {
        let value = values::normalize_time_list(style.get(name));
        style.set(name, value);
    }

    let sides = |style: &ComputedStyle, prefix: &str| {
        values::compose_sides(
            style.get(&format!("{prefix}-top")),
            style.get(&format!("{prefix}-right")),
            style.get(&format!("{prefix}-bottom")),
            style.get(&format!("{prefix}-left")),
        )
    };
    let padding = sides(style, "padding");
    style.set("padding", padding);
    let margin = sides(style, "margin");
    style.set("margin", margin);

    let gap = if style.get("row-gap") == style.get("column-gap") {
        style.get("row-gap").to_string()
    } else {
        format!("{} {}", style.get("row-gap"), style.get("column-gap"))
    };
    style.set("gap", gap);

    let flex = format!(
        "{} {} {}",
        style.get("flex-grow"),
        style.get("flex-shrink"),
        style.get("flex-basis")
    );
    style.set("flex", flex);

    let outline = format!(
        "{} {} {}",
        style.get("outline-color"),
        style.get("outline-style"),
        style.get("outline-width")
    );
    style.set("outline", outline);

    let decoration = format!(
        "{} {} {}",
        style.get("text-decoration-line"),
        style.get("text-decoration-style"),
        style.get("text-decoration-color")
    );
    style.set("text-decoration", decoration);

    let longhands: BTreeMap<String, String> = style
        .iter()
        .filter(|(name, _)| name.starts_with("transition-") || name.starts_with("animation-"))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    style.set("transition", values::compose_transition(&longhands));
    style.set("animation", values::compose_animation(&longhands));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_queries_follow_viewport() {
        let viewport = Viewport {
            width: 1024.0,
            height: 768.0,
        };
        assert!(media_matches("(min-width: 768px)", viewport));
        assert!(!media_matches("(max-width: 600px)", viewport));
        assert!(media_matches("screen and (min-width: 40em)", viewport));
        assert!(!media_matches("print", viewport));
        assert!(media_matches("print, (orientation: landscape)", viewport));
        assert!(!media_matches("(prefers-reduced-motion: reduce)", viewport));
        assert!(media_matches("(width >= 1000px)", viewport));
        assert!(media_matches("not print", viewport));
    }

    #[test]
    fn var_substitution_uses_fallbacks() {
        let mut custom = BTreeMap::new();
        custom.insert("--brand".to_string(), "#0af".to_string());
        assert_eq!(
            substitute_vars("1px solid var(--brand)", &custom, 0).as_deref(),
            Some("1px solid #0af")
        );
        assert_eq!(
            substitute_vars("var(--missing, var(--brand))", &custom, 0).as_deref(),
            Some("#0af")
        );
        assert_eq!(substitute_vars("var(--missing)", &custom, 0), None);
    }
}
