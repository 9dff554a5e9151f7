//! Tolerant stylesheet text parser.
//!
//! Produces the rule tree documents hand out through `style_sheets()`. Malformed input never
//! fails the whole sheet: an unterminated block swallows the rest of the text, a declaration
//! without a colon is dropped.

use stylescope_core_types::{CssRule, Declaration, GroupKind, KeyframeBlock};

pub fn parse_stylesheet(text: &str) -> Vec<CssRule> {
    let cleaned = strip_comments(text);
    parse_rules(&cleaned)
}

/// Parses the body of a declaration block (or an inline `style` attribute).
pub fn parse_declarations(body: &str) -> Vec<Declaration> {
    let mut out = Vec::new();
    for raw in split_top_level(&skip_nested_blocks(body), ';') {
        let Some((name, value)) = raw.split_once(':') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let name = if name.starts_with("--") {
            name.to_string()
        } else {
            name.to_ascii_lowercase()
        };
        let mut value = value.trim().to_string();
        let mut important = false;
        if let Some(idx) = value.to_ascii_lowercase().rfind("!important") {
            if value[idx + "!important".len()..].trim().is_empty() {
                value.truncate(idx);
                value = value.trim().to_string();
                important = true;
            }
        }
        if value.is_empty() && !name.starts_with("--") {
            continue;
        }
        out.push(Declaration {
            name,
            value,
            important,
        });
    }
    out
}

/// Index of the `}` matching the `{` at `open`, skipping quoted strings.
pub fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return None;
    }
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = open;
    while i < bytes.len() {
        let c = bytes[i];
        if let Some(q) = quote {
            if c == b'\\' {
                i += 2;
                continue;
            }
            if c == q {
                quote = None;
            }
        } else {
            match c {
                b'"' | b'\'' => quote = Some(c),
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }
    None
}

/// Splits on `sep` outside parentheses, brackets and quotes. Empty pieces are dropped.
pub fn split_top_level(text: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in text.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        if c == '\\' {
            current.push(c);
            escaped = true;
            continue;
        }
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            current.push(c);
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            _ => {}
        }
        if c == sep && depth <= 0 {
            let piece = current.trim();
            if !piece.is_empty() {
                parts.push(piece.to_string());
            }
            current.clear();
            continue;
        }
        current.push(c);
    }
    let piece = current.trim();
    if !piece.is_empty() {
        parts.push(piece.to_string());
    }
    parts
}

pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut quote: Option<char> = None;
    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else if c == q {
                quote = None;
            }
            continue;
        }
        if c == '"' || c == '\'' {
            quote = Some(c);
            out.push(c);
            continue;
        }
        if c == '/' && chars.peek() == Some(&'*') {
            chars.next();
            let mut prev = '\0';
            for inner in chars.by_ref() {
                if prev == '*' && inner == '/' {
                    break;
                }
                prev = inner;
            }
            continue;
        }
        out.push(c);
    }
    out
}

fn parse_rules(text: &str) -> Vec<CssRule> {
    let mut rules = Vec::new();
    let mut pos = 0usize;
    while pos < text.len() {
        let rest = &text[pos..];
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            break;
        }
        pos += rest.len() - trimmed.len();

        let Some(stop) = prelude_end(&text[pos..]) else {
            break;
        };
        let stop_at = pos + stop;
        let prelude = text[pos..stop_at].trim();

        if text.as_bytes()[stop_at] == b';' {
            if let Some(rule) = statement_rule(prelude) {
                rules.push(rule);
            }
            pos = stop_at + 1;
            continue;
        }

        let close = matching_brace(text, stop_at).unwrap_or(text.len());
        let body = &text[stop_at + 1..close.min(text.len())];
        if let Some(rule) = block_rule(prelude, body) {
            rules.push(rule);
        }
        pos = (close + 1).min(text.len());
    }
    rules
}

/// Offset of the first `{` or `;` outside strings and parentheses.
fn prelude_end(text: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    for (idx, c) in text.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' => depth += 1,
            ')' => depth -= 1,
            '{' | ';' if depth <= 0 => return Some(idx),
            _ => {}
        }
    }
    None
}

fn statement_rule(prelude: &str) -> Option<CssRule> {
    let (at_rule, rest) = split_at_keyword(prelude)?;
    Some(CssRule::Other {
        at_rule,
        prelude: rest.to_string(),
    })
}

fn block_rule(prelude: &str, body: &str) -> Option<CssRule> {
    if prelude.is_empty() {
        return None;
    }
    let Some((keyword, rest)) = split_at_keyword(prelude) else {
        return Some(CssRule::Style {
            selector: collapse_whitespace(prelude),
            declarations: parse_declarations(body),
        });
    };
    let rule = match keyword.as_str() {
        "keyframes" | "-webkit-keyframes" | "-moz-keyframes" => CssRule::Keyframes {
            name: rest.trim().trim_matches(|c| c == '"' || c == '\'').to_string(),
            frames: parse_keyframe_blocks(body),
        },
        "media" => group(GroupKind::Media, rest, body),
        "supports" => group(GroupKind::Supports, rest, body),
        "layer" => group(GroupKind::Layer, rest, body),
        "container" => group(GroupKind::Container, rest, body),
        "font-face" => CssRule::FontFace {
            declarations: parse_declarations(body),
        },
        _ => CssRule::Other {
            at_rule: keyword,
            prelude: rest.to_string(),
        },
    };
    Some(rule)
}

fn group(kind: GroupKind, condition: &str, body: &str) -> CssRule {
    CssRule::Group {
        kind,
        condition: collapse_whitespace(condition),
        rules: parse_rules(body),
    }
}

fn parse_keyframe_blocks(body: &str) -> Vec<KeyframeBlock> {
    parse_rules(body)
        .into_iter()
        .filter_map(|rule| match rule {
            CssRule::Style {
                selector,
                declarations,
            } => Some(KeyframeBlock {
                selector,
                declarations,
            }),
            _ => None,
        })
        .collect()
}

fn split_at_keyword(prelude: &str) -> Option<(String, &str)> {
    let rest = prelude.strip_prefix('@')?;
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '(' || c == '"' || c == '\'')
        .unwrap_or(rest.len());
    Some((rest[..end].to_ascii_lowercase(), rest[end..].trim()))
}

/// Nested rule blocks inside a declaration body are not declarations; drop them.
fn skip_nested_blocks(body: &str) -> String {
    if !body.contains('{') {
        return body.to_string();
    }
    let mut out = String::with_capacity(body.len());
    let mut pos = 0usize;
    while let Some(rel) = body[pos..].find('{') {
        let open = pos + rel;
        let segment_start = body[pos..open].rfind(';').map(|i| pos + i + 1).unwrap_or(pos);
        out.push_str(&body[pos..segment_start]);
        let close = matching_brace(body, open).unwrap_or(body.len() - 1);
        out.push(';');
        pos = close + 1;
        if pos >= body.len() {
            break;
        }
    }
    if pos < body.len() {
        out.push_str(&body[pos..]);
    }
    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
