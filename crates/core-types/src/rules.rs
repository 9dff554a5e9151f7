//! Style-rule model handed out by document adapters.

use crate::ProbeError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub value: String,
    pub important: bool,
}

impl Declaration {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            important: false,
        }
    }

    pub fn is_custom_property(&self) -> bool {
        self.name.starts_with("--")
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GroupKind {
    Media,
    Supports,
    Layer,
    Container,
}

impl GroupKind {
    pub fn at_keyword(&self) -> &'static str {
        match self {
            GroupKind::Media => "@media",
            GroupKind::Supports => "@supports",
            GroupKind::Layer => "@layer",
            GroupKind::Container => "@container",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct KeyframeBlock {
    /// Key text as written, e.g. `from`, `50%`, `0%, 100%`.
    pub selector: String,
    pub declarations: Vec<Declaration>,
}

impl KeyframeBlock {
    /// Offsets in the 0..=1 range; unparseable keys are skipped.
    pub fn offsets(&self) -> Vec<f64> {
        self.selector
            .split(',')
            .filter_map(|key| match key.trim().to_ascii_lowercase().as_str() {
                "from" => Some(0.0),
                "to" => Some(1.0),
                other => other
                    .strip_suffix('%')
                    .and_then(|pct| pct.trim().parse::<f64>().ok())
                    .map(|pct| (pct / 100.0).clamp(0.0, 1.0)),
            })
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CssRule {
    Style {
        selector: String,
        declarations: Vec<Declaration>,
    },
    Keyframes {
        name: String,
        frames: Vec<KeyframeBlock>,
    },
    Group {
        kind: GroupKind,
        condition: String,
        rules: Vec<CssRule>,
    },
    FontFace {
        declarations: Vec<Declaration>,
    },
    Other {
        at_rule: String,
        prelude: String,
    },
}

/// One style source. `rules` is an error when the source cannot be enumerated (cross-origin).
#[derive(Clone, Debug)]
pub struct SheetSource {
    pub href: Option<String>,
    pub rules: Result<Vec<CssRule>, ProbeError>,
}

impl SheetSource {
    pub fn label(&self) -> String {
        self.href.clone().unwrap_or_else(|| "<inline>".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyframe_offsets_cover_keywords_and_lists() {
        let block = KeyframeBlock {
            selector: "from, 50%,to".into(),
            declarations: Vec::new(),
        };
        assert_eq!(block.offsets(), vec![0.0, 0.5, 1.0]);
    }
}
