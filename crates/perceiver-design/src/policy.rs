use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingPolicy {
    pub settle_ms: u64,
    pub between_states_ms: u64,
    pub sample_floor_ms: u64,
    pub sample_cap_ms: u64,
}

impl Default for TimingPolicy {
    fn default() -> Self {
        Self {
            settle_ms: 50,
            between_states_ms: 30,
            sample_floor_ms: 100,
            sample_cap_ms: 10_000,
        }
    }
}

impl TimingPolicy {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn between_states(&self) -> Duration {
        Duration::from_millis(self.between_states_ms)
    }

    /// Clamps a requested sampling window into `[floor, cap]`.
    pub fn sample_window_ms(&self, requested: f64) -> f64 {
        let floor = self.sample_floor_ms as f64;
        let cap = (self.sample_cap_ms as f64).max(floor);
        if requested.is_nan() {
            return floor;
        }
        requested.clamp(floor, cap)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapsPolicy {
    pub address_depth: usize,
    pub child_descriptors: usize,
    pub block_regions: usize,
    pub containers: usize,
    pub usage_selectors: usize,
    pub usage_summary: usize,
    pub vendor_samples: usize,
    pub transition_samples: usize,
    pub keyframes: usize,
    pub transitions: usize,
    pub animations: usize,
    pub interactive_limit: usize,
}

impl Default for CapsPolicy {
    fn default() -> Self {
        Self {
            address_depth: 6,
            child_descriptors: 20,
            block_regions: 10,
            containers: 50,
            usage_selectors: 20,
            usage_summary: 50,
            vendor_samples: 20,
            transition_samples: 5,
            keyframes: 200,
            transitions: 50,
            animations: 50,
            interactive_limit: 10,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub pattern: String,
    pub category: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VendorPrefix {
    pub prefix: String,
    pub vendor: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSelectors {
    pub role: String,
    pub selectors: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrarySignature {
    pub name: String,
    pub globals: Vec<String>,
    pub script_patterns: Vec<String>,
    pub attributes: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbePolicy {
    pub timing: TimingPolicy,
    pub caps: CapsPolicy,
    pub hover_aliases: Vec<String>,
    pub categories: Vec<CategoryRule>,
    pub vendors: Vec<VendorPrefix>,
    pub landmarks: Vec<LandmarkSelectors>,
    pub libraries: Vec<LibrarySignature>,
}

impl Default for ProbePolicy {
    fn default() -> Self {
        Self {
            timing: TimingPolicy::default(),
            caps: CapsPolicy::default(),
            hover_aliases: vec!["hover".into(), "is-hovered".into()],
            categories: default_categories(),
            vendors: default_vendors(),
            landmarks: default_landmarks(),
            libraries: default_libraries(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_categories() -> Vec<CategoryRule> {
    [
        (
            r"(?i)colou?r|bg|background|foreground|fg|border-color|text-color|fill|stroke|primary|secondary|accent|brand|neutral|gray|grey|success|warning|danger|error|info|surface|palette|hue|shade|tint",
            "colors",
        ),
        (
            r"(?i)space|spacing|gap|gutter|margin|padding|inset|offset|stack",
            "spacing",
        ),
        (
            r"(?i)font|text|line-height|leading|letter|tracking|weight|family|heading|size",
            "typography",
        ),
        (
            r"(?i)duration|delay|ease|easing|transition|animation|motion|timing|speed",
            "motion",
        ),
        (
            r"(?i)width|height|breakpoint|container|screen|grid|column|layout|max-|min-|aspect",
            "layout",
        ),
        (r"(?i)radius|rounded|corner", "radius"),
        (r"(?i)z-?index|(^--|-)z(-|$)|layer|elevation", "zindex"),
    ]
    .into_iter()
    .map(|(pattern, category)| CategoryRule {
        pattern: pattern.into(),
        category: category.into(),
    })
    .collect()
}

fn default_vendors() -> Vec<VendorPrefix> {
    [
        ("--tw-", "tailwind"),
        ("--bs-", "bootstrap"),
        ("--chakra-", "chakra"),
        ("--mantine-", "mantine"),
        ("--mui-", "mui"),
        ("--wp--", "wordpress"),
        ("--ant-", "antd"),
        ("--radix-", "radix"),
        ("--swiper-", "swiper"),
        ("--fa-", "fontawesome"),
    ]
    .into_iter()
    .map(|(prefix, vendor)| VendorPrefix {
        prefix: prefix.into(),
        vendor: vendor.into(),
    })
    .collect()
}

fn default_landmarks() -> Vec<LandmarkSelectors> {
    [
        (
            "header",
            &["[role=\"banner\"]", "header", "#header", ".header", ".site-header"][..],
        ),
        (
            "nav",
            &["[role=\"navigation\"]", "nav", "#nav", ".nav", ".navbar"][..],
        ),
        (
            "main",
            &["[role=\"main\"]", "main", "#main", "#content", ".main"][..],
        ),
        (
            "aside",
            &["[role=\"complementary\"]", "aside", "#sidebar", ".sidebar"][..],
        ),
        (
            "footer",
            &["[role=\"contentinfo\"]", "footer", "#footer", ".footer", ".site-footer"][..],
        ),
    ]
    .into_iter()
    .map(|(role, selectors)| LandmarkSelectors {
        role: role.into(),
        selectors: strings(selectors),
    })
    .collect()
}

fn default_libraries() -> Vec<LibrarySignature> {
    vec![
        LibrarySignature {
            name: "gsap".into(),
            globals: strings(&["gsap", "TweenMax", "TweenLite", "ScrollTrigger"]),
            script_patterns: strings(&["gsap", "tweenmax"]),
            attributes: Vec::new(),
        },
        LibrarySignature {
            name: "anime.js".into(),
            globals: strings(&["anime"]),
            script_patterns: strings(&["anime.min.js", "animejs"]),
            attributes: Vec::new(),
        },
        LibrarySignature {
            name: "framer-motion".into(),
            globals: Vec::new(),
            script_patterns: strings(&["framer-motion"]),
            attributes: strings(&["data-framer-name", "data-projection-id"]),
        },
        LibrarySignature {
            name: "lottie".into(),
            globals: strings(&["lottie", "bodymovin"]),
            script_patterns: strings(&["lottie"]),
            attributes: Vec::new(),
        },
        LibrarySignature {
            name: "velocity".into(),
            globals: strings(&["Velocity"]),
            script_patterns: strings(&["velocity"]),
            attributes: Vec::new(),
        },
        LibrarySignature {
            name: "aos".into(),
            globals: strings(&["AOS"]),
            script_patterns: strings(&["aos.js", "/aos"]),
            attributes: strings(&["data-aos"]),
        },
    ]
}

/// Compiled category and vendor tables. First match wins; vendor prefixes are checked first.
#[derive(Clone, Debug)]
pub struct Categorizer {
    vendors: Vec<VendorPrefix>,
    rules: Vec<(Regex, String)>,
}

impl Categorizer {
    pub fn new(policy: &ProbePolicy) -> Self {
        let rules = policy
            .categories
            .iter()
            .filter_map(|rule| match Regex::new(&rule.pattern) {
                Ok(regex) => Some((regex, rule.category.clone())),
                Err(err) => {
                    warn!(pattern = %rule.pattern, %err, "skipping invalid category pattern");
                    None
                }
            })
            .collect();
        Self {
            vendors: policy.vendors.clone(),
            rules,
        }
    }

    pub fn vendor_of(&self, name: &str) -> Option<&str> {
        self.vendors
            .iter()
            .find(|entry| name.starts_with(&entry.prefix))
            .map(|entry| entry.vendor.as_str())
    }

    /// Returns `(category, vendor)`.
    pub fn categorize(&self, name: &str) -> (String, Option<String>) {
        if let Some(vendor) = self.vendor_of(name) {
            return ("vendor".to_string(), Some(vendor.to_string()));
        }
        let category = self
            .rules
            .iter()
            .find(|(regex, _)| regex.is_match(name))
            .map(|(_, category)| category.clone())
            .unwrap_or_else(|| "misc".to_string());
        (category, None)
    }
}

impl Default for Categorizer {
    fn default() -> Self {
        Self::new(&ProbePolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categorizes_by_first_matching_bucket() {
        let categorizer = Categorizer::default();
        assert_eq!(categorizer.categorize("--space-8").0, "spacing");
        assert_eq!(categorizer.categorize("--brand-primary").0, "colors");
        assert_eq!(categorizer.categorize("--font-size-lg").0, "typography");
        assert_eq!(categorizer.categorize("--duration-fast").0, "motion");
        assert_eq!(categorizer.categorize("--max-width").0, "layout");
        assert_eq!(categorizer.categorize("--radius-md").0, "radius");
        assert_eq!(categorizer.categorize("--z-modal").0, "zindex");
        assert_eq!(categorizer.categorize("--something").0, "misc");
    }

    #[test]
    fn vendor_prefix_beats_keyword_buckets() {
        let categorizer = Categorizer::default();
        let (category, vendor) = categorizer.categorize("--tw-ring-color");
        assert_eq!(category, "vendor");
        assert_eq!(vendor.as_deref(), Some("tailwind"));
    }

    #[test]
    fn invalid_patterns_are_skipped() {
        let mut policy = ProbePolicy::default();
        policy.categories.insert(
            0,
            CategoryRule {
                pattern: "(".into(),
                category: "broken".into(),
            },
        );
        let categorizer = Categorizer::new(&policy);
        assert_eq!(categorizer.categorize("--space-4").0, "spacing");
    }

    #[test]
    fn sample_window_is_clamped() {
        let timing = TimingPolicy::default();
        assert_eq!(timing.sample_window_ms(20.0), 100.0);
        assert_eq!(timing.sample_window_ms(50_000.0), 10_000.0);
        assert_eq!(timing.sample_window_ms(400.0), 400.0);
    }
}
