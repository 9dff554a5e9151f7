//! Value-level helpers: color and time normalization, shorthand expansion and recomposition.
//!
//! Resolved values follow browser serialization closely enough that captured records compare
//! equal across documents: colors become `rgb(r, g, b)` / `rgba(r, g, b, a)`, times become
//! seconds, bare zero lengths become `0px`.

use std::collections::BTreeMap;

const NAMED_COLORS: &[(&str, (u8, u8, u8))] = &[
    ("black", (0, 0, 0)),
    ("white", (255, 255, 255)),
    ("red", (255, 0, 0)),
    ("green", (0, 128, 0)),
    ("blue", (0, 0, 255)),
    ("yellow", (255, 255, 0)),
    ("orange", (255, 165, 0)),
    ("purple", (128, 0, 128)),
    ("gray", (128, 128, 128)),
    ("grey", (128, 128, 128)),
    ("silver", (192, 192, 192)),
    ("maroon", (128, 0, 0)),
    ("navy", (0, 0, 128)),
    ("teal", (0, 128, 128)),
    ("olive", (128, 128, 0)),
    ("lime", (0, 255, 0)),
    ("aqua", (0, 255, 255)),
    ("cyan", (0, 255, 255)),
    ("fuchsia", (255, 0, 255)),
    ("magenta", (255, 0, 255)),
    ("pink", (255, 192, 203)),
    ("brown", (165, 42, 42)),
    ("gold", (255, 215, 0)),
    ("indigo", (75, 0, 130)),
    ("violet", (238, 130, 238)),
    ("crimson", (220, 20, 60)),
    ("tomato", (255, 99, 71)),
    ("coral", (255, 127, 80)),
    ("salmon", (250, 128, 114)),
    ("rebeccapurple", (102, 51, 153)),
    ("darkgray", (169, 169, 169)),
    ("darkgrey", (169, 169, 169)),
    ("lightgray", (211, 211, 211)),
    ("lightgrey", (211, 211, 211)),
    ("dimgray", (105, 105, 105)),
    ("whitesmoke", (245, 245, 245)),
    ("gainsboro", (220, 220, 220)),
    ("slategray", (112, 128, 144)),
    ("steelblue", (70, 130, 180)),
    ("royalblue", (65, 105, 225)),
    ("dodgerblue", (30, 144, 255)),
    ("skyblue", (135, 206, 235)),
    ("darkblue", (0, 0, 139)),
    ("darkgreen", (0, 100, 0)),
    ("darkred", (139, 0, 0)),
    ("orangered", (255, 69, 0)),
    ("seagreen", (46, 139, 87)),
    ("limegreen", (50, 205, 50)),
    ("beige", (245, 245, 220)),
    ("ivory", (255, 255, 240)),
];

pub const BORDER_STYLES: [&str; 10] = [
    "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset", "outset",
];

const TIMING_KEYWORDS: [&str; 7] = [
    "ease",
    "linear",
    "ease-in",
    "ease-out",
    "ease-in-out",
    "step-start",
    "step-end",
];

/// Serializes a color token to `rgb()`/`rgba()`; `None` if the token is not a color.
pub fn normalize_color(token: &str) -> Option<String> {
    let lower = token.trim().to_ascii_lowercase();
    if lower == "transparent" {
        return Some(rgba_string(0, 0, 0, 0.0));
    }
    if let Some(&(_, (r, g, b))) = NAMED_COLORS.iter().find(|(name, _)| *name == lower) {
        return Some(rgba_string(r, g, b, 1.0));
    }
    if let Some(hex) = lower.strip_prefix('#') {
        return parse_hex(hex).map(|(r, g, b, a)| rgba_string(r, g, b, a));
    }
    let (func, args) = lower.split_once('(')?;
    let args = args.strip_suffix(')')?;
    let parts: Vec<&str> = args
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() < 3 || parts.len() > 4 {
        return None;
    }
    let alpha = match parts.get(3) {
        Some(raw) => parse_alpha(raw)?,
        None => 1.0,
    };
    match func.trim() {
        "rgb" | "rgba" => {
            let channel = |raw: &str| -> Option<u8> {
                let value = match raw.strip_suffix('%') {
                    Some(pct) => pct.parse::<f64>().ok()? * 2.55,
                    None => raw.parse::<f64>().ok()?,
                };
                Some(value.round().clamp(0.0, 255.0) as u8)
            };
            Some(rgba_string(
                channel(parts[0])?,
                channel(parts[1])?,
                channel(parts[2])?,
                alpha,
            ))
        }
        "hsl" | "hsla" => {
            let hue = parts[0].trim_end_matches("deg").parse::<f64>().ok()?;
            let sat = parts[1].trim_end_matches('%').parse::<f64>().ok()? / 100.0;
            let light = parts[2].trim_end_matches('%').parse::<f64>().ok()? / 100.0;
            let (r, g, b) = hsl_to_rgb(hue, sat.clamp(0.0, 1.0), light.clamp(0.0, 1.0));
            Some(rgba_string(r, g, b, alpha))
        }
        _ => None,
    }
}

/// Normalizes every color token inside a compound value (shadows, outlines, decorations).
pub fn normalize_colors_in(value: &str) -> String {
    let mut items = Vec::new();
    for item in crate::css::split_top_level(value, ',') {
        let tokens: Vec<String> = tokens(&item)
            .into_iter()
            .map(|token| {
                normalize_color(&token)
                    .or_else(|| normalize_zero_length(&token))
                    .unwrap_or(token)
            })
            .collect();
        items.push(tokens.join(" "));
    }
    items.join(", ")
}

pub fn rgba_string(r: u8, g: u8, b: u8, alpha: f64) -> String {
    if alpha >= 1.0 {
        format!("rgb({r}, {g}, {b})")
    } else {
        format!("rgba({r}, {g}, {b}, {})", format_number(alpha.max(0.0)))
    }
}

pub fn format_number(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded}")
    }
}

/// Milliseconds for a `s`/`ms` time token. A bare `0` is accepted.
pub fn parse_time_ms(token: &str) -> Option<f64> {
    let token = token.trim().to_ascii_lowercase();
    if token == "0" {
        return Some(0.0);
    }
    if let Some(ms) = token.strip_suffix("ms") {
        return ms.parse::<f64>().ok();
    }
    token
        .strip_suffix('s')
        .and_then(|s| s.parse::<f64>().ok())
        .map(|s| s * 1000.0)
}

pub fn format_time(ms: f64) -> String {
    format!("{}s", format_number(ms / 1000.0))
}

fn is_time_token(token: &str) -> bool {
    let lower = token.to_ascii_lowercase();
    (lower.ends_with('s')) && parse_time_ms(&lower).is_some()
}

pub fn is_timing_function(token: &str) -> bool {
    let lower = token.to_ascii_lowercase();
    TIMING_KEYWORDS.contains(&lower.as_str())
        || lower.starts_with("cubic-bezier(")
        || lower.starts_with("steps(")
        || lower.starts_with("linear(")
}

pub fn normalize_zero_length(token: &str) -> Option<String> {
    (token == "0" || token == "-0" || token == "+0").then(|| "0px".to_string())
}

pub fn normalize_lengths(value: &str) -> String {
    tokens(value)
        .into_iter()
        .map(|token| normalize_zero_length(&token).unwrap_or(token))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn normalize_font_weight(value: &str) -> String {
    match value.trim().to_ascii_lowercase().as_str() {
        "normal" => "400".to_string(),
        "bold" | "bolder" => "700".to_string(),
        "lighter" => "100".to_string(),
        other => other.to_string(),
    }
}

fn border_width_keyword(token: &str) -> Option<String> {
    match token {
        "thin" => Some("1px".into()),
        "medium" => Some("3px".into()),
        "thick" => Some("5px".into()),
        _ => None,
    }
}

fn is_length_token(token: &str) -> bool {
    let lower = token.to_ascii_lowercase();
    if lower == "0" || border_width_keyword(&lower).is_some() {
        return true;
    }
    let digits_end = lower
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(lower.len());
    digits_end > 0
        && lower[..digits_end].parse::<f64>().is_ok()
        && lower[digits_end..].chars().all(|c| c.is_ascii_alphabetic() || c == '%')
}

/// Whitespace-separated tokens, keeping function calls intact.
pub fn tokens(value: &str) -> Vec<String> {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    crate::css::split_top_level(&collapsed, ' ')
}

/// Expands a declared shorthand into longhands. Non-shorthands pass through unchanged.
pub fn expand_shorthand(name: &str, value: &str) -> Vec<(String, String)> {
    let keyword = value.trim().to_ascii_lowercase();
    if matches!(keyword.as_str(), "inherit" | "initial" | "unset") {
        return longhands_of(name)
            .map(|list| list.iter().map(|l| (l.to_string(), keyword.clone())).collect())
            .unwrap_or_else(|| vec![(name.to_string(), keyword.clone())]);
    }
    match name {
        "padding" | "margin" => four_sides(name, value),
        "gap" | "grid-gap" => {
            let parts = tokens(value);
            let row = parts.first().cloned().unwrap_or_default();
            let column = parts.get(1).cloned().unwrap_or_else(|| row.clone());
            vec![("row-gap".into(), row), ("column-gap".into(), column)]
        }
        "grid-row-gap" => vec![("row-gap".into(), value.to_string())],
        "grid-column-gap" => vec![("column-gap".into(), value.to_string())],
        "flex" => expand_flex(value),
        "border" => expand_border(value),
        "outline" => expand_outline(value),
        "background" => expand_background(value),
        "text-decoration" => expand_text_decoration(value),
        "transition" => expand_transition(value),
        "animation" => expand_animation(value),
        "font" => expand_font(value),
        _ => vec![(name.to_string(), value.to_string())],
    }
}

fn longhands_of(name: &str) -> Option<&'static [&'static str]> {
    let list: &'static [&'static str] = match name {
        "padding" => &["padding-top", "padding-right", "padding-bottom", "padding-left"],
        "margin" => &["margin-top", "margin-right", "margin-bottom", "margin-left"],
        "gap" | "grid-gap" => &["row-gap", "column-gap"],
        "flex" => &["flex-grow", "flex-shrink", "flex-basis"],
        "border" => &["border-width", "border-style", "border-color"],
        "outline" => &["outline-width", "outline-style", "outline-color"],
        "background" => &["background-color", "background-image"],
        "text-decoration" => &[
            "text-decoration-line",
            "text-decoration-style",
            "text-decoration-color",
        ],
        "transition" => &TRANSITION_LONGHANDS,
        "animation" => &ANIMATION_LONGHANDS,
        "font" => &["font-style", "font-weight", "font-size", "line-height", "font-family"],
        _ => return None,
    };
    Some(list)
}

const TRANSITION_LONGHANDS: [&str; 4] = [
    "transition-property",
    "transition-duration",
    "transition-timing-function",
    "transition-delay",
];

const ANIMATION_LONGHANDS: [&str; 8] = [
    "animation-name",
    "animation-duration",
    "animation-timing-function",
    "animation-delay",
    "animation-iteration-count",
    "animation-direction",
    "animation-fill-mode",
    "animation-play-state",
];

fn four_sides(name: &str, value: &str) -> Vec<(String, String)> {
    let parts = tokens(value);
    let (top, right, bottom, left) = match parts.as_slice() {
        [a] => (a, a, a, a),
        [a, b] => (a, b, a, b),
        [a, b, c] => (a, b, c, b),
        [a, b, c, d, ..] => (a, b, c, d),
        [] => return Vec::new(),
    };
    vec![
        (format!("{name}-top"), top.clone()),
        (format!("{name}-right"), right.clone()),
        (format!("{name}-bottom"), bottom.clone()),
        (format!("{name}-left"), left.clone()),
    ]
}

/// Shortest serialization of four side values.
pub fn compose_sides(top: &str, right: &str, bottom: &str, left: &str) -> String {
    if left != right {
        format!("{top} {right} {bottom} {left}")
    } else if top != bottom {
        format!("{top} {right} {bottom}")
    } else if top != right {
        format!("{top} {right}")
    } else {
        top.to_string()
    }
}

fn expand_flex(value: &str) -> Vec<(String, String)> {
    let lower = value.trim().to_ascii_lowercase();
    let (grow, shrink, basis) = match lower.as_str() {
        "none" => ("0".to_string(), "0".to_string(), "auto".to_string()),
        "auto" => ("1".to_string(), "1".to_string(), "auto".to_string()),
        _ => {
            let mut numbers = Vec::new();
            let mut basis = None;
            for token in tokens(&lower) {
                if basis.is_none() && numbers.len() < 2 && token.parse::<f64>().is_ok() {
                    numbers.push(token);
                } else {
                    basis = Some(token);
                }
            }
            let grow = numbers.first().cloned().unwrap_or_else(|| "1".into());
            let shrink = numbers.get(1).cloned().unwrap_or_else(|| "1".into());
            (grow, shrink, basis.unwrap_or_else(|| "0%".into()))
        }
    };
    vec![
        ("flex-grow".into(), grow),
        ("flex-shrink".into(), shrink),
        ("flex-basis".into(), basis),
    ]
}

fn expand_border(value: &str) -> Vec<(String, String)> {
    let mut width = "medium".to_string();
    let mut style = "none".to_string();
    let mut color = "currentcolor".to_string();
    for token in tokens(value) {
        let lower = token.to_ascii_lowercase();
        if BORDER_STYLES.contains(&lower.as_str()) {
            style = lower;
        } else if is_length_token(&lower) {
            width = lower;
        } else {
            color = token;
        }
    }
    vec![
        ("border-width".into(), width),
        ("border-style".into(), style),
        ("border-color".into(), color),
    ]
}

fn expand_outline(value: &str) -> Vec<(String, String)> {
    let mut width = "medium".to_string();
    let mut style = "none".to_string();
    let mut color = "currentcolor".to_string();
    for token in tokens(value) {
        let lower = token.to_ascii_lowercase();
        if BORDER_STYLES.contains(&lower.as_str()) || lower == "auto" {
            style = lower;
        } else if is_length_token(&lower) {
            width = lower;
        } else {
            color = token;
        }
    }
    vec![
        ("outline-width".into(), width),
        ("outline-style".into(), style),
        ("outline-color".into(), color),
    ]
}

fn expand_background(value: &str) -> Vec<(String, String)> {
    let mut color = "transparent".to_string();
    let mut images = Vec::new();
    for token in tokens(value) {
        let lower = token.to_ascii_lowercase();
        if lower.contains("url(") || lower.contains("gradient(") {
            images.push(token);
        } else if normalize_color(&token).is_some() || lower.starts_with("var(") {
            color = token;
        }
    }
    let image = if images.is_empty() {
        "none".to_string()
    } else {
        images.join(", ")
    };
    vec![
        ("background-color".into(), color),
        ("background-image".into(), image),
    ]
}

fn expand_text_decoration(value: &str) -> Vec<(String, String)> {
    let mut lines = Vec::new();
    let mut style = "solid".to_string();
    let mut color = "currentcolor".to_string();
    for token in tokens(value) {
        let lower = token.to_ascii_lowercase();
        match lower.as_str() {
            "none" | "underline" | "overline" | "line-through" => lines.push(lower),
            "solid" | "double" | "dotted" | "dashed" | "wavy" => style = lower,
            _ => color = token,
        }
    }
    let line = if lines.is_empty() {
        "none".to_string()
    } else {
        lines.join(" ")
    };
    vec![
        ("text-decoration-line".into(), line),
        ("text-decoration-style".into(), style),
        ("text-decoration-color".into(), color),
    ]
}

fn expand_transition(value: &str) -> Vec<(String, String)> {
    let mut properties = Vec::new();
    let mut durations = Vec::new();
    let mut timings = Vec::new();
    let mut delays = Vec::new();
    for item in crate::css::split_top_level(value, ',') {
        let mut property = None;
        let mut duration = None;
        let mut delay = None;
        let mut timing = None;
        for token in tokens(&item) {
            if is_time_token(&token) {
                if duration.is_none() {
                    duration = Some(token);
                } else {
                    delay = Some(token);
                }
            } else if is_timing_function(&token) {
                timing = Some(token);
            } else {
                property = Some(token.to_ascii_lowercase());
            }
        }
        properties.push(property.unwrap_or_else(|| "all".into()));
        durations.push(duration.unwrap_or_else(|| "0s".into()));
        timings.push(timing.unwrap_or_else(|| "ease".into()));
        delays.push(delay.unwrap_or_else(|| "0s".into()));
    }
    vec![
        (TRANSITION_LONGHANDS[0].into(), properties.join(", ")),
        (TRANSITION_LONGHANDS[1].into(), durations.join(", ")),
        (TRANSITION_LONGHANDS[2].into(), timings.join(", ")),
        (TRANSITION_LONGHANDS[3].into(), delays.join(", ")),
    ]
}

fn expand_animation(value: &str) -> Vec<(String, String)> {
    let mut columns: [Vec<String>; 8] = Default::default();
    for item in crate::css::split_top_level(value, ',') {
        let mut slots: [Option<String>; 8] = Default::default();
        for token in tokens(&item) {
            let lower = token.to_ascii_lowercase();
            if is_time_token(&lower) {
                if slots[1].is_none() {
                    slots[1] = Some(lower);
                } else {
                    slots[3] = Some(lower);
                }
            } else if is_timing_function(&lower) {
                slots[2] = Some(token);
            } else if lower == "infinite" || lower.parse::<f64>().is_ok() {
                slots[4] = Some(lower);
            } else if matches!(
                lower.as_str(),
                "normal" | "reverse" | "alternate" | "alternate-reverse"
            ) {
                slots[5] = Some(lower);
            } else if matches!(lower.as_str(), "forwards" | "backwards" | "both")
                || (lower == "none" && slots[0].is_some())
            {
                slots[6] = Some(lower);
            } else if matches!(lower.as_str(), "running" | "paused") {
                slots[7] = Some(lower);
            } else {
                slots[0] = Some(token);
            }
        }
        const DEFAULTS: [&str; 8] = ["none", "0s", "ease", "0s", "1", "normal", "none", "running"];
        for (idx, slot) in slots.into_iter().enumerate() {
            columns[idx].push(slot.unwrap_or_else(|| DEFAULTS[idx].to_string()));
        }
    }
    ANIMATION_LONGHANDS
        .iter()
        .zip(columns)
        .map(|(name, values)| (name.to_string(), values.join(", ")))
        .collect()
}

fn expand_font(value: &str) -> Vec<(String, String)> {
    let parts = tokens(value);
    let mut style = "normal".to_string();
    let mut weight = "normal".to_string();
    let mut size = None;
    let mut line_height = "normal".to_string();
    let mut family_start = parts.len();
    for (idx, token) in parts.iter().enumerate() {
        let lower = token.to_ascii_lowercase();
        match lower.as_str() {
            "italic" | "oblique" => style = lower,
            "normal" | "small-caps" => {}
            "bold" | "bolder" | "lighter" => weight = lower,
            _ if lower.parse::<u32>().is_ok() => weight = lower,
            _ => {
                let (font_size, height) = match lower.split_once('/') {
                    Some((s, h)) => (s.to_string(), Some(h.to_string())),
                    None => (lower.clone(), None),
                };
                size = Some(font_size);
                if let Some(height) = height {
                    line_height = height;
                }
                family_start = idx + 1;
                break;
            }
        }
    }
    let Some(size) = size else {
        return vec![("font".into(), value.to_string())];
    };
    let family = parts[family_start.min(parts.len())..].join(" ");
    let mut out = vec![
        ("font-style".into(), style),
        ("font-weight".into(), weight),
        ("font-size".into(), size),
        ("line-height".into(), line_height),
    ];
    if !family.is_empty() {
        out.push(("font-family".into(), family));
    }
    out
}

/// Comma list item `idx`, repeating the list the way CSS repeats shorter lists.
fn list_item(list: &str, idx: usize) -> String {
    let items = crate::css::split_top_level(list, ',');
    if items.is_empty() {
        return String::new();
    }
    items[idx % items.len()].clone()
}

pub fn compose_transition(values: &BTreeMap<String, String>) -> String {
    let get = |name: &str| values.get(name).cloned().unwrap_or_default();
    let properties = crate::css::split_top_level(&get(TRANSITION_LONGHANDS[0]), ',');
    let count = properties.len().max(1);
    (0..count)
        .map(|idx| {
            format!(
                "{} {} {} {}",
                list_item(&get(TRANSITION_LONGHANDS[0]), idx),
                list_item(&get(TRANSITION_LONGHANDS[1]), idx),
                list_item(&get(TRANSITION_LONGHANDS[2]), idx),
                list_item(&get(TRANSITION_LONGHANDS[3]), idx),
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn compose_animation(values: &BTreeMap<String, String>) -> String {
    let get = |name: &str| values.get(name).cloned().unwrap_or_default();
    let names = crate::css::split_top_level(&get(ANIMATION_LONGHANDS[0]), ',');
    let count = names.len().max(1);
    (0..count)
        .map(|idx| {
            ANIMATION_LONGHANDS
                .iter()
                .map(|longhand| list_item(&get(longhand), idx))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Normalizes every time in a comma list (`.2s` → `0.2s`, `150ms` → `0.15s`).
pub fn normalize_time_list(value: &str) -> String {
    crate::css::split_top_level(value, ',')
        .into_iter()
        .map(|item| parse_time_ms(&item).map(format_time).unwrap_or(item))
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8, f64)> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let expand = |c: &str| u8::from_str_radix(&c.repeat(2), 16).ok();
    let pair = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 | 4 => {
            let r = expand(&hex[0..1])?;
            let g = expand(&hex[1..2])?;
            let b = expand(&hex[2..3])?;
            let a = if hex.len() == 4 {
                f64::from(expand(&hex[3..4])?) / 255.0
            } else {
                1.0
            };
            Some((r, g, b, a))
        }
        6 | 8 => {
            let r = pair(&hex[0..2])?;
            let g = pair(&hex[2..4])?;
            let b = pair(&hex[4..6])?;
            let a = if hex.len() == 8 {
                f64::from(pair(&hex[6..8])?) / 255.0
            } else {
                1.0
            };
            Some((r, g, b, a))
        }
        _ => None,
    }
}

fn parse_alpha(raw: &str) -> Option<f64> {
    let value = match raw.strip_suffix('%') {
        Some(pct) => pct.parse::<f64>().ok()? / 100.0,
        None => raw.parse::<f64>().ok()?,
    };
    Some(value.clamp(0.0, 1.0))
}

fn hsl_to_rgb(hue: f64, sat: f64, light: f64) -> (u8, u8, u8) {
    let hue = hue.rem_euclid(360.0) / 360.0;
    if sat == 0.0 {
        let v = (light * 255.0).round() as u8;
        return (v, v, v);
    }
    let q = if light < 0.5 {
        light * (1.0 + sat)
    } else {
        light + sat - light * sat
    };
    let p = 2.0 * light - q;
    let channel = |mut t: f64| {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        let v = if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        };
        (v * 255.0).round().clamp(0.0, 255.0) as u8
    };
    (
        channel(hue + 1.0 / 3.0),
        channel(hue),
        channel(hue - 1.0 / 3.0),
    )
}
