//! Custom-property (design token) extraction, usage graph and vendor detection.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use dom_adapter::css::split_top_level;
use once_cell::sync::Lazy;
use regex::Regex;
use stylescope_core_types::CssRule;
use tracing::debug;

use crate::address::AddressResolver;
use crate::errors::PerceiverError;
use crate::model::{
    DefinitionOrigin, UsageReport, VariableDefinition, VariableScope, VariableSet, VariableUsage,
    VendorBucket, VendorReport, VendorSample,
};
use crate::policy::{Categorizer, ProbePolicy};
use crate::ports::DocumentPort;

static VAR_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"var\(\s*(--[A-Za-z0-9_-]+)").expect("valid var() regex"));

/// Every custom property declared in readable style sources, plus root-level ones only visible
/// through the resolved style of the document element.
pub fn extract_all<D>(
    doc: &D,
    categorizer: &Categorizer,
) -> Result<VariableSet, PerceiverError>
where
    D: DocumentPort + ?Sized,
{
    let root = doc.document_element().ok_or(PerceiverError::RootMissing)?;
    let root_style = doc.computed_style(root, None)?;

    let mut set = VariableSet::default();
    for sheet in doc.style_sheets() {
        set.sources_scanned += 1;
        let source = sheet.label();
        let rules = match sheet.rules {
            Ok(rules) => rules,
            Err(err) => {
                debug!(%source, %err, "skipping unreadable style source");
                set.skipped_sources += 1;
                continue;
            }
        };
        collect_definitions(&rules, &source, None, categorizer, &mut set.definitions);
    }

    for definition in &mut set.definitions {
        definition.resolved_value = match definition.scope {
            VariableScope::Global => non_empty(root_style.get(&definition.name)),
            VariableScope::Local => doc
                .query_all(&definition.selector)
                .ok()
                .and_then(|nodes| nodes.into_iter().next())
                .and_then(|node| doc.computed_style(node, None).ok())
                .and_then(|style| non_empty(style.get(&definition.name))),
        };
    }

    let declared: HashSet<String> = set.definitions.iter().map(|d| d.name.clone()).collect();
    for (name, value) in root_style.custom_properties() {
        if declared.contains(name) {
            continue;
        }
        let (category, vendor) = categorizer.categorize(name);
        set.definitions.push(VariableDefinition {
            name: name.to_string(),
            value: value.to_string(),
            selector: ":root".into(),
            scope: VariableScope::Global,
            category,
            vendor,
            origin: DefinitionOrigin::Computed,
            source: "<computed>".into(),
            condition: None,
            resolved_value: Some(value.to_string()),
        });
    }

    for definition in &set.definitions {
        *set.by_category.entry(definition.category.clone()).or_insert(0) += 1;
    }
    Ok(set)
}

fn collect_definitions(
    rules: &[CssRule],
    source: &str,
    condition: Option<&str>,
    categorizer: &Categorizer,
    out: &mut Vec<VariableDefinition>,
) {
    for rule in rules {
        match rule {
            CssRule::Style {
                selector,
                declarations,
            } => {
                let scope = if is_root_level(selector) {
                    VariableScope::Global
                } else {
                    VariableScope::Local
                };
                for declaration in declarations.iter().filter(|d| d.is_custom_property()) {
                    let (category, vendor) = categorizer.categorize(&declaration.name);
                    out.push(VariableDefinition {
                        name: declaration.name.clone(),
                        value: declaration.value.clone(),
                        selector: selector.clone(),
                        scope,
                        category,
                        vendor,
                        origin: DefinitionOrigin::Stylesheet,
                        source: source.to_string(),
                        condition: condition.map(str::to_string),
                        resolved_value: None,
                    });
                }
            }
            CssRule::Group {
                kind,
                condition: inner,
                rules,
            } => {
                let label = format!("{} {}", kind.at_keyword(), inner).trim().to_string();
                let nested = match condition {
                    Some(outer) => format!("{outer} and {label}"),
                    None => label,
                };
                collect_definitions(rules, source, Some(&nested), categorizer, out);
            }
            _ => {}
        }
    }
}

/// Every selector in the list is a single compound on `:root`, `html` or `:host`.
pub fn is_root_level(selector: &str) -> bool {
    let parts = split_top_level(selector, ',');
    !parts.is_empty() && parts.iter().all(|part| is_root_compound(part.trim()))
}

fn is_root_compound(part: &str) -> bool {
    let mut depth = 0i32;
    for c in part.chars() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            c if depth <= 0 && (c.is_whitespace() || matches!(c, '>' | '+' | '~')) => {
                return false
            }
            _ => {}
        }
    }
    let lower = part.to_ascii_lowercase();
    ["html", ":root", ":host"].iter().any(|subject| {
        lower.starts_with(subject)
            && lower[subject.len()..]
                .chars()
                .next()
                .map(|next| !(next.is_ascii_alphanumeric() || next == '-' || next == '_'))
                .unwrap_or(true)
    }) || lower.starts_with(":where(:root)")
}

/// Which selectors and properties consume each custom property.
pub fn analyze_usage<D>(
    doc: &D,
    resolver: &AddressResolver,
    categorizer: &Categorizer,
    policy: &ProbePolicy,
) -> Result<UsageReport, PerceiverError>
where
    D: DocumentPort + ?Sized,
{
    let set = extract_all(doc, categorizer)?;
    let mut usage: BTreeMap<String, (Vec<String>, BTreeSet<String>)> = BTreeMap::new();
    let cap = policy.caps.usage_selectors;

    let mut record = |selector: &str, property: &str, value: &str| {
        for capture in VAR_REFERENCE.captures_iter(value) {
            let entry = usage.entry(capture[1].to_string()).or_default();
            if entry.0.len() < cap && !entry.0.iter().any(|s| s == selector) {
                entry.0.push(selector.to_string());
            }
            entry.1.insert(property.to_string());
        }
    };

    for sheet in doc.style_sheets() {
        let Ok(rules) = sheet.rules else {
            continue;
        };
        walk_declarations(&rules, &mut |selector, property, value| {
            record(selector, property, value)
        });
    }
    for node in doc.query_all("[style]")? {
        let Some(inline) = doc.attribute(node, "style") else {
            continue;
        };
        let selector = resolver.resolve(doc, node)?;
        for declaration in dom_adapter::css::parse_declarations(&inline) {
            record(selector.as_str(), &declaration.name, &declaration.value);
        }
    }

    let usage: BTreeMap<String, VariableUsage> = usage
        .into_iter()
        .map(|(name, (selectors, properties))| {
            (
                name,
                VariableUsage {
                    selectors,
                    properties: properties.into_iter().collect(),
                },
            )
        })
        .collect();

    let defined: BTreeSet<&str> = set.definitions.iter().map(|d| d.name.as_str()).collect();
    let summary_cap = policy.caps.usage_summary;
    let mut report = UsageReport::default();
    report.summary.defined = defined.len();
    report.summary.used = usage.len();
    report.summary.unused = defined
        .iter()
        .filter(|name| !usage.contains_key(**name))
        .take(summary_cap)
        .map(|name| name.to_string())
        .collect();
    report.summary.undefined = usage
        .keys()
        .filter(|name| !defined.contains(name.as_str()))
        .take(summary_cap)
        .cloned()
        .collect();
    report.usage = usage;
    Ok(report)
}

fn walk_declarations(rules: &[CssRule], visit: &mut dyn FnMut(&str, &str, &str)) {
    for rule in rules {
        match rule {
            CssRule::Style {
                selector,
                declarations,
            } => {
                for declaration in declarations {
                    visit(selector, &declaration.name, &declaration.value);
                }
            }
            CssRule::Group { rules, .. } => walk_declarations(rules, visit),
            CssRule::Keyframes { name, frames } => {
                for frame in frames {
                    let selector = format!("@keyframes {name} {}", frame.selector);
                    for declaration in &frame.declarations {
                        visit(&selector, &declaration.name, &declaration.value);
                    }
                }
            }
            CssRule::FontFace { declarations } => {
                for declaration in declarations {
                    visit("@font-face", &declaration.name, &declaration.value);
                }
            }
            CssRule::Other { .. } => {}
        }
    }
}

/// Groups vendor-prefixed definitions by framework.
pub fn detect_vendor_vars<D>(
    doc: &D,
    categorizer: &Categorizer,
    policy: &ProbePolicy,
) -> Result<VendorReport, PerceiverError>
where
    D: DocumentPort + ?Sized,
{
    let set = extract_all(doc, categorizer)?;
    let mut report = VendorReport::default();
    for definition in &set.definitions {
        let Some(vendor) = &definition.vendor else {
            report.first_party += 1;
            continue;
        };
        report.third_party += 1;
        let bucket: &mut VendorBucket = report.vendors.entry(vendor.clone()).or_default();
        bucket.count += 1;
        if bucket.samples.len() < policy.caps.vendor_samples
            && !bucket
                .samples
                .iter()
                .any(|sample| sample.name == definition.name)
        {
            bucket.samples.push(VendorSample {
                name: definition.name.clone(),
                value: definition.value.clone(),
            });
        }
    }
    Ok(report)
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom_adapter::{el, MemoryDocument};

    #[test]
    fn root_level_selectors() {
        assert!(is_root_level(":root"));
        assert!(is_root_level("html[data-theme=\"dark\"]"));
        assert!(is_root_level(":root, :host"));
        assert!(is_root_level("html.dark"));
        assert!(!is_root_level("html body"));
        assert!(!is_root_level(":root, .card"));
        assert!(!is_root_level("htmlx"));
    }

    #[test]
    fn extracts_with_scope_conditions_and_skips() {
        let doc = MemoryDocument::builder()
            .stylesheet(
                r#"
                :root { --space-8: 8px; --brand: #0af; }
                .card { --card-radius: 12px; }
                @media (min-width: 600px) { :root { --gutter: 24px; } }
                "#,
            )
            .cross_origin_stylesheet("https://cdn.example/x.css", ":root { --hidden: 1px }")
            .root(el("html").child(el("body").child(el("div").class("card"))))
            .build();
        let set = extract_all(&doc, &Categorizer::default()).unwrap();
        assert_eq!(set.skipped_sources, 1);

        let space = set.definitions.iter().find(|d| d.name == "--space-8").unwrap();
        assert_eq!(space.category, "spacing");
        assert_eq!(space.scope, VariableScope::Global);
        assert_eq!(space.resolved_value.as_deref(), Some("8px"));

        let radius = set.definitions.iter().find(|d| d.name == "--card-radius").unwrap();
        assert_eq!(radius.scope, VariableScope::Local);
        assert_eq!(radius.category, "radius");
        assert_eq!(radius.resolved_value.as_deref(), Some("12px"));

        let gutter = set.definitions.iter().find(|d| d.name == "--gutter").unwrap();
        assert_eq!(gutter.condition.as_deref(), Some("@media (min-width: 600px)"));

        let hidden = set.definitions.iter().find(|d| d.name == "--hidden").unwrap();
        assert_eq!(hidden.origin, DefinitionOrigin::Computed);
        assert_eq!(hidden.selector, ":root");
    }

    #[test]
    fn usage_tracks_consumers_and_gaps() {
        let doc = MemoryDocument::builder()
            .stylesheet(
                r#"
                :root { --brand: #0af; --unused: 1px; }
                .btn { color: var(--brand); border-color: var( --brand ); }
                .link { color: var(--missing, red); }
                "#,
            )
            .root(
                el("html").child(
                    el("body").child(el("p").id("note").style("background: var(--brand)")),
                ),
            )
            .build();
        let policy = ProbePolicy::default();
        let report = analyze_usage(
            &doc,
            &AddressResolver::new(&policy),
            &Categorizer::new(&policy),
            &policy,
        )
        .unwrap();
        let brand = &report.usage["--brand"];
        assert_eq!(brand.selectors, vec![".btn".to_string(), "#note".to_string()]);
        assert_eq!(
            brand.properties,
            vec!["background".to_string(), "border-color".into(), "color".into()]
        );
        assert_eq!(report.summary.unused, vec!["--unused".to_string()]);
        assert_eq!(report.summary.undefined, vec!["--missing".to_string()]);
    }

    #[test]
    fn vendor_report_counts_samples() {
        let doc = MemoryDocument::builder()
            .stylesheet(":root { --tw-ring: 0; --tw-shadow: 0; --bs-blue: #00f; --brand: red; }")
            .build();
        let policy = ProbePolicy::default();
        let report = detect_vendor_vars(&doc, &Categorizer::new(&policy), &policy).unwrap();
        assert_eq!(report.first_party, 1);
        assert_eq!(report.third_party, 3);
        assert_eq!(report.vendors["tailwind"].count, 2);
        assert_eq!(
            report.vendors["bootstrap"].samples,
            vec![VendorSample {
                name: "--bs-blue".into(),
                value: "#00f".into(),
            }]
        );
        let tailwind: Vec<(&str, &str)> = report.vendors["tailwind"]
            .samples
            .iter()
            .map(|sample| (sample.name.as_str(), sample.value.as_str()))
            .collect();
        assert_eq!(tailwind, vec![("--tw-ring", "0"), ("--tw-shadow", "0")]);
    }
}
