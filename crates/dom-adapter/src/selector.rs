//! Selector parsing, specificity and matching.
//!
//! Covers the selector subset real-world design systems lean on: compounds of type, id, class,
//! attribute and pseudo-class selectors joined by the four combinators, plus a trailing
//! pseudo-element. Anything outside that subset parses as `Unsupported` and never matches.

use stylescope_core_types::{NodeId, PseudoElement};

use crate::error::DocumentError;

/// Dynamic interaction flags a tree reports for pseudo-class matching.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ElementState {
    Hover,
    Active,
    Focus,
    FocusVisible,
    FocusWithin,
}

/// Read access a matcher needs. Children are element children in document order.
pub trait ElementTree {
    fn parent_of(&self, node: NodeId) -> Option<NodeId>;
    fn children_of(&self, node: NodeId) -> Vec<NodeId>;
    fn tag_of(&self, node: NodeId) -> &str;
    fn attribute_of(&self, node: NodeId, name: &str) -> Option<&str>;
    fn has_state(&self, node: NodeId, state: ElementState) -> bool;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Default)]
pub struct Specificity(pub u32, pub u32, pub u32);

impl std::ops::Add for Specificity {
    type Output = Specificity;

    fn add(self, rhs: Self) -> Self::Output {
        Specificity(self.0 + rhs.0, self.1 + rhs.1, self.2 + rhs.2)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Combinator {
    Descendant,
    Child,
    NextSibling,
    SubsequentSibling,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AttrOp {
    Exists,
    Equals(String),
    Includes(String),
    Prefix(String),
    Suffix(String),
    Substring(String),
    DashMatch(String),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AttrSelector {
    pub name: String,
    pub op: AttrOp,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PseudoClass {
    Root,
    Hover,
    Active,
    Focus,
    FocusVisible,
    FocusWithin,
    Disabled,
    Enabled,
    Checked,
    Link,
    FirstChild,
    LastChild,
    OnlyChild,
    FirstOfType,
    LastOfType,
    NthChild(i32, i32),
    NthLastChild(i32, i32),
    NthOfType(i32, i32),
    Not(SelectorList),
    Is(SelectorList),
    Where(SelectorList),
    Unsupported(String),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Compound {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<AttrSelector>,
    pub pseudos: Vec<PseudoClass>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && self.pseudos.is_empty()
    }

    fn specificity(&self) -> Specificity {
        let mut spec = Specificity(
            u32::from(self.id.is_some()),
            (self.classes.len() + self.attrs.len()) as u32,
            u32::from(self.tag.is_some()),
        );
        for pseudo in &self.pseudos {
            spec = spec
                + match pseudo {
                    PseudoClass::Where(_) => Specificity::default(),
                    PseudoClass::Not(list) | PseudoClass::Is(list) => list.max_specificity(),
                    _ => Specificity(0, 1, 0),
                };
        }
        spec
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ComplexSelector {
    /// Rightmost compound.
    pub subject: Compound,
    /// Remaining compounds walking leftwards, each with the combinator joining it to the
    /// compound on its right.
    pub chain: Vec<(Combinator, Compound)>,
    pub pseudo_element: Option<PseudoElement>,
    /// A pseudo-element outside the supported set; the selector never matches.
    pub unknown_pseudo_element: bool,
}

impl ComplexSelector {
    pub fn specificity(&self) -> Specificity {
        let mut spec = self.subject.specificity();
        for (_, compound) in &self.chain {
            spec = spec + compound.specificity();
        }
        if self.pseudo_element.is_some() || self.unknown_pseudo_element {
            spec = spec + Specificity(0, 0, 1);
        }
        spec
    }

    pub fn matches<T: ElementTree + ?Sized>(
        &self,
        tree: &T,
        node: NodeId,
        pseudo: Option<PseudoElement>,
    ) -> bool {
        if self.unknown_pseudo_element || self.pseudo_element != pseudo {
            return false;
        }
        matches_compound(tree, &self.subject, node) && matches_chain(tree, &self.chain, node)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectorList(pub Vec<ComplexSelector>);

impl SelectorList {
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        let mut selectors = Vec::new();
        for part in crate::css::split_top_level(text, ',') {
            selectors.push(Parser::new(&part).complex()?);
        }
        if selectors.is_empty() {
            return Err(DocumentError::InvalidSelector(text.to_string()));
        }
        Ok(Self(selectors))
    }

    /// Highest specificity among the members that match, if any does.
    pub fn match_specificity<T: ElementTree + ?Sized>(
        &self,
        tree: &T,
        node: NodeId,
        pseudo: Option<PseudoElement>,
    ) -> Option<Specificity> {
        self.0
            .iter()
            .filter(|sel| sel.matches(tree, node, pseudo))
            .map(ComplexSelector::specificity)
            .max()
    }

    pub fn matches<T: ElementTree + ?Sized>(&self, tree: &T, node: NodeId) -> bool {
        self.0.iter().any(|sel| sel.matches(tree, node, None))
    }

    fn max_specificity(&self) -> Specificity {
        self.0
            .iter()
            .map(ComplexSelector::specificity)
            .max()
            .unwrap_or_default()
    }
}

fn matches_chain<T: ElementTree + ?Sized>(
    tree: &T,
    chain: &[(Combinator, Compound)],
    node: NodeId,
) -> bool {
    let Some(((combinator, compound), rest)) = chain.split_first() else {
        return true;
    };
    match combinator {
        Combinator::Child => tree.parent_of(node).is_some_and(|parent| {
            matches_compound(tree, compound, parent) && matches_chain(tree, rest, parent)
        }),
        Combinator::Descendant => {
            let mut cursor = tree.parent_of(node);
            while let Some(ancestor) = cursor {
                if matches_compound(tree, compound, ancestor) && matches_chain(tree, rest, ancestor)
                {
                    return true;
                }
                cursor = tree.parent_of(ancestor);
            }
            false
        }
        Combinator::NextSibling => preceding_siblings(tree, node)
            .last()
            .is_some_and(|&prev| {
                matches_compound(tree, compound, prev) && matches_chain(tree, rest, prev)
            }),
        Combinator::SubsequentSibling => preceding_siblings(tree, node)
            .into_iter()
            .any(|prev| matches_compound(tree, compound, prev) && matches_chain(tree, rest, prev)),
    }
}

fn preceding_siblings<T: ElementTree + ?Sized>(tree: &T, node: NodeId) -> Vec<NodeId> {
    let Some(parent) = tree.parent_of(node) else {
        return Vec::new();
    };
    tree.children_of(parent)
        .into_iter()
        .take_while(|&sibling| sibling != node)
        .collect()
}

fn matches_compound<T: ElementTree + ?Sized>(tree: &T, compound: &Compound, node: NodeId) -> bool {
    if let Some(tag) = &compound.tag {
        if !tree.tag_of(node).eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if let Some(id) = &compound.id {
        if tree.attribute_of(node, "id") != Some(id.as_str()) {
            return false;
        }
    }
    if !compound.classes.is_empty() {
        let class_attr = tree.attribute_of(node, "class").unwrap_or("");
        let has_all = compound
            .classes
            .iter()
            .all(|class| class_attr.split_whitespace().any(|c| c == class));
        if !has_all {
            return false;
        }
    }
    if !compound
        .attrs
        .iter()
        .all(|attr| matches_attr(tree.attribute_of(node, &attr.name), &attr.op))
    {
        return false;
    }
    compound
        .pseudos
        .iter()
        .all(|pseudo| matches_pseudo(tree, pseudo, node))
}

fn matches_attr(value: Option<&str>, op: &AttrOp) -> bool {
    let Some(value) = value else {
        return false;
    };
    match op {
        AttrOp::Exists => true,
        AttrOp::Equals(expected) => value == expected,
        AttrOp::Includes(expected) => value.split_whitespace().any(|v| v == expected),
        AttrOp::Prefix(expected) => !expected.is_empty() && value.starts_with(expected.as_str()),
        AttrOp::Suffix(expected) => !expected.is_empty() && value.ends_with(expected.as_str()),
        AttrOp::Substring(expected) => !expected.is_empty() && value.contains(expected.as_str()),
        AttrOp::DashMatch(expected) => {
            value == expected || value.starts_with(&format!("{expected}-"))
        }
    }
}

const FORM_CONTROLS: [&str; 5] = ["button", "input", "select", "textarea", "fieldset"];

fn matches_pseudo<T: ElementTree + ?Sized>(tree: &T, pseudo: &PseudoClass, node: NodeId) -> bool {
    match pseudo {
        PseudoClass::Root => tree.parent_of(node).is_none(),
        PseudoClass::Hover => tree.has_state(node, ElementState::Hover),
        PseudoClass::Active => tree.has_state(node, ElementState::Active),
        PseudoClass::Focus => tree.has_state(node, ElementState::Focus),
        PseudoClass::FocusVisible => tree.has_state(node, ElementState::FocusVisible),
        PseudoClass::FocusWithin => tree.has_state(node, ElementState::FocusWithin),
        PseudoClass::Disabled => {
            is_form_control(tree, node) && tree.attribute_of(node, "disabled").is_some()
        }
        PseudoClass::Enabled => {
            is_form_control(tree, node) && tree.attribute_of(node, "disabled").is_none()
        }
        PseudoClass::Checked => tree.attribute_of(node, "checked").is_some(),
        PseudoClass::Link => {
            tree.tag_of(node).eq_ignore_ascii_case("a") && tree.attribute_of(node, "href").is_some()
        }
        PseudoClass::FirstChild => sibling_position(tree, node, false).0 == 1,
        PseudoClass::LastChild => {
            let (index, count) = sibling_position(tree, node, false);
            index == count
        }
        PseudoClass::OnlyChild => sibling_position(tree, node, false).1 == 1,
        PseudoClass::FirstOfType => sibling_position(tree, node, true).0 == 1,
        PseudoClass::LastOfType => {
            let (index, count) = sibling_position(tree, node, true);
            index == count
        }
        PseudoClass::NthChild(a, b) => nth_matches(*a, *b, sibling_position(tree, node, false).0),
        PseudoClass::NthLastChild(a, b) => {
            let (index, count) = sibling_position(tree, node, false);
            nth_matches(*a, *b, count - index + 1)
        }
        PseudoClass::NthOfType(a, b) => nth_matches(*a, *b, sibling_position(tree, node, true).0),
        PseudoClass::Not(list) => !list.matches(tree, node),
        PseudoClass::Is(list) | PseudoClass::Where(list) => list.matches(tree, node),
        PseudoClass::Unsupported(_) => false,
    }
}

fn is_form_control<T: ElementTree + ?Sized>(tree: &T, node: NodeId) -> bool {
    let tag = tree.tag_of(node);
    FORM_CONTROLS.iter().any(|t| tag.eq_ignore_ascii_case(t))
}

/// 1-based index among siblings and sibling count, optionally restricted to the same tag.
/// A parentless node counts as the single child.
fn sibling_position<T: ElementTree + ?Sized>(tree: &T, node: NodeId, same_tag: bool) -> (i32, i32) {
    let Some(parent) = tree.parent_of(node) else {
        return (1, 1);
    };
    let tag = tree.tag_of(node).to_string();
    let siblings: Vec<NodeId> = tree
        .children_of(parent)
        .into_iter()
        .filter(|&sibling| !same_tag || tree.tag_of(sibling).eq_ignore_ascii_case(&tag))
        .collect();
    let index = siblings
        .iter()
        .position(|&sibling| sibling == node)
        .map(|i| i as i32 + 1)
        .unwrap_or(0);
    (index, siblings.len() as i32)
}

fn nth_matches(a: i32, b: i32, index: i32) -> bool {
    if index <= 0 {
        return false;
    }
    if a == 0 {
        return index == b;
    }
    let diff = index - b;
    diff % a == 0 && diff / a >= 0
}

fn parse_nth(expr: &str) -> Option<(i32, i32)> {
    let expr: String = expr.chars().filter(|c| !c.is_whitespace()).collect();
    let expr = expr.to_ascii_lowercase();
    match expr.as_str() {
        "odd" => return Some((2, 1)),
        "even" => return Some((2, 0)),
        _ => {}
    }
    let Some(n_pos) = expr.find('n') else {
        return expr.parse().ok().map(|b| (0, b));
    };
    let a = match &expr[..n_pos] {
        "" | "+" => 1,
        "-" => -1,
        other => other.parse().ok()?,
    };
    let rest = &expr[n_pos + 1..];
    let b = if rest.is_empty() {
        0
    } else {
        rest.trim_start_matches('+').parse().ok()?
    };
    Some((a, b))
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.trim().chars().collect(),
            pos: 0,
        }
    }

    fn error(&self) -> DocumentError {
        DocumentError::InvalidSelector(self.source.trim().to_string())
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn complex(mut self) -> Result<ComplexSelector, DocumentError> {
        let mut compounds: Vec<Compound> = Vec::new();
        let mut combinators: Vec<Combinator> = Vec::new();
        let mut pseudo_element = None;
        let mut unknown_pseudo_element = false;

        loop {
            let had_space = self.skip_whitespace();
            let Some(c) = self.peek() else {
                break;
            };
            if !compounds.is_empty() {
                let combinator = match c {
                    '>' => Some(Combinator::Child),
                    '+' => Some(Combinator::NextSibling),
                    '~' => Some(Combinator::SubsequentSibling),
                    _ if had_space => Some(Combinator::Descendant),
                    _ => None,
                };
                match combinator {
                    Some(Combinator::Descendant) => combinators.push(Combinator::Descendant),
                    Some(explicit) => {
                        self.pos += 1;
                        self.skip_whitespace();
                        combinators.push(explicit);
                    }
                    None => return Err(self.error()),
                }
            }
            if pseudo_element.is_some() || unknown_pseudo_element {
                // Nothing may follow a pseudo-element.
                return Err(self.error());
            }
            let (compound, element) = self.compound()?;
            match element {
                Some(Ok(pe)) => pseudo_element = Some(pe),
                Some(Err(())) => unknown_pseudo_element = true,
                None => {}
            }
            compounds.push(compound);
        }

        if compounds.is_empty() || combinators.len() + 1 != compounds.len() {
            return Err(self.error());
        }
        let subject = compounds.pop().ok_or_else(|| self.error())?;
        let mut chain = Vec::with_capacity(compounds.len());
        while let Some(compound) = compounds.pop() {
            let combinator = combinators.pop().ok_or_else(|| self.error())?;
            chain.push((combinator, compound));
        }
        Ok(ComplexSelector {
            subject,
            chain,
            pseudo_element,
            unknown_pseudo_element,
        })
    }

    #[allow(clippy::type_complexity)]
    fn compound(&mut self) -> Result<(Compound, Option<Result<PseudoElement, ()>>), DocumentError> {
        let mut compound = Compound::default();
        let mut element = None;
        let mut universal = false;

        if self.peek() == Some('*') {
            self.pos += 1;
            universal = true;
        } else if self.peek().is_some_and(is_ident_start) {
            compound.tag = Some(self.ident().to_ascii_lowercase());
        }

        while let Some(c) = self.peek() {
            match c {
                '#' => {
                    self.pos += 1;
                    let id = self.ident();
                    if id.is_empty() {
                        return Err(self.error());
                    }
                    compound.id = Some(id);
                }
                '.' => {
                    self.pos += 1;
                    let class = self.ident();
                    if class.is_empty() {
                        return Err(self.error());
                    }
                    compound.classes.push(class);
                }
                '[' => {
                    self.pos += 1;
                    compound.attrs.push(self.attribute()?);
                }
                ':' => {
                    self.pos += 1;
                    let double = self.peek() == Some(':');
                    if double {
                        self.pos += 1;
                    }
                    let name = self.ident().to_ascii_lowercase();
                    if name.is_empty() {
                        return Err(self.error());
                    }
                    let legacy_element = matches!(name.as_str(), "before" | "after");
                    if double || legacy_element {
                        if self.peek() == Some('(') {
                            self.parenthesized()?;
                        }
                        element = Some(PseudoElement::parse(&name).ok_or(()));
                        break;
                    }
                    compound.pseudos.push(self.pseudo_class(&name)?);
                }
                _ => break,
            }
        }

        if compound.is_empty() && !universal && element.is_none() {
            return Err(self.error());
        }
        Ok((compound, element))
    }

    fn pseudo_class(&mut self, name: &str) -> Result<PseudoClass, DocumentError> {
        let argument = if self.peek() == Some('(') {
            Some(self.parenthesized()?)
        } else {
            None
        };
        let nth = |arg: &Option<String>| arg.as_deref().and_then(parse_nth);
        let pseudo = match (name, &argument) {
            ("root", None) => PseudoClass::Root,
            ("hover", None) => PseudoClass::Hover,
            ("active", None) => PseudoClass::Active,
            ("focus", None) => PseudoClass::Focus,
            ("focus-visible", None) => PseudoClass::FocusVisible,
            ("focus-within", None) => PseudoClass::FocusWithin,
            ("disabled", None) => PseudoClass::Disabled,
            ("enabled", None) => PseudoClass::Enabled,
            ("checked", None) => PseudoClass::Checked,
            ("link", None) | ("any-link", None) => PseudoClass::Link,
            ("first-child", None) => PseudoClass::FirstChild,
            ("last-child", None) => PseudoClass::LastChild,
            ("only-child", None) => PseudoClass::OnlyChild,
            ("first-of-type", None) => PseudoClass::FirstOfType,
            ("last-of-type", None) => PseudoClass::LastOfType,
            ("nth-child", Some(_)) => match nth(&argument) {
                Some((a, b)) => PseudoClass::NthChild(a, b),
                None => PseudoClass::Unsupported(name.to_string()),
            },
            ("nth-last-child", Some(_)) => match nth(&argument) {
                Some((a, b)) => PseudoClass::NthLastChild(a, b),
                None => PseudoClass::Unsupported(name.to_string()),
            },
            ("nth-of-type", Some(_)) => match nth(&argument) {
                Some((a, b)) => PseudoClass::NthOfType(a, b),
                None => PseudoClass::Unsupported(name.to_string()),
            },
            ("not", Some(arg)) => PseudoClass::Not(SelectorList::parse(arg)?),
            ("is", Some(arg)) | ("matches", Some(arg)) | ("-webkit-any", Some(arg)) => {
                PseudoClass::Is(SelectorList::parse(arg)?)
            }
            ("where", Some(arg)) => PseudoClass::Where(SelectorList::parse(arg)?),
            _ => PseudoClass::Unsupported(name.to_string()),
        };
        Ok(pseudo)
    }

    fn attribute(&mut self) -> Result<AttrSelector, DocumentError> {
        self.skip_whitespace();
        let name = self.ident().to_ascii_lowercase();
        if name.is_empty() {
            return Err(self.error());
        }
        self.skip_whitespace();
        let op_char = self.peek().ok_or_else(|| self.error())?;
        if op_char == ']' {
            self.pos += 1;
            return Ok(AttrSelector {
                name,
                op: AttrOp::Exists,
            });
        }
        let prefix = if op_char == '=' {
            None
        } else {
            self.pos += 1;
            Some(op_char)
        };
        if self.peek() != Some('=') {
            return Err(self.error());
        }
        self.pos += 1;
        self.skip_whitespace();
        let value = match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.pos += 1;
                let mut value = String::new();
                while let Some(c) = self.peek() {
                    self.pos += 1;
                    if c == q {
                        break;
                    }
                    value.push(c);
                }
                value
            }
            _ => self.ident(),
        };
        self.skip_whitespace();
        // Case-sensitivity flags (`i`, `s`) are accepted and ignored.
        if matches!(self.peek(), Some('i' | 'I' | 's' | 'S')) {
            self.pos += 1;
            self.skip_whitespace();
        }
        if self.peek() != Some(']') {
            return Err(self.error());
        }
        self.pos += 1;
        let op = match prefix {
            None => AttrOp::Equals(value),
            Some('~') => AttrOp::Includes(value),
            Some('^') => AttrOp::Prefix(value),
            Some('$') => AttrOp::Suffix(value),
            Some('*') => AttrOp::Substring(value),
            Some('|') => AttrOp::DashMatch(value),
            Some(_) => return Err(self.error()),
        };
        Ok(AttrSelector { name, op })
    }

    /// Consumes `( ... )` and returns the inner text.
    fn parenthesized(&mut self) -> Result<String, DocumentError> {
        let mut depth = 0usize;
        let start = self.pos + 1;
        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(self.chars[start..self.pos - 1].iter().collect());
                    }
                }
                _ => {}
            }
        }
        Err(self.error())
    }

    fn ident(&mut self) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.pos += 1;
                if let Some(escaped) = self.unescape() {
                    out.push(escaped);
                }
                continue;
            }
            if is_ident_char(c) {
                out.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        out
    }

    fn unescape(&mut self) -> Option<char> {
        let mut hex = String::new();
        while let Some(c) = self.peek() {
            if hex.len() < 6 && c.is_ascii_hexdigit() {
                hex.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        if hex.is_empty() {
            let c = self.peek()?;
            self.pos += 1;
            return Some(c);
        }
        if self.peek() == Some(' ') {
            self.pos += 1;
        }
        u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32)
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || c == '\\' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tree {
        tags: Vec<&'static str>,
        parents: Vec<Option<u32>>,
        attrs: Vec<Vec<(&'static str, &'static str)>>,
        hovered: Option<u32>,
    }

    impl ElementTree for Tree {
        fn parent_of(&self, node: NodeId) -> Option<NodeId> {
            self.parents[node.0 as usize].map(NodeId)
        }

        fn children_of(&self, node: NodeId) -> Vec<NodeId> {
            (0..self.tags.len() as u32)
                .filter(|&i| self.parents[i as usize] == Some(node.0))
                .map(NodeId)
                .collect()
        }

        fn tag_of(&self, node: NodeId) -> &str {
            self.tags[node.0 as usize]
        }

        fn attribute_of(&self, node: NodeId, name: &str) -> Option<&str> {
            self.attrs[node.0 as usize]
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| *v)
        }

        fn has_state(&self, node: NodeId, state: ElementState) -> bool {
            state == ElementState::Hover && self.hovered == Some(node.0)
        }
    }

    fn sample_tree() -> Tree {
        // html > body > (ul > li.a, li.b#x, li) + a[href]
        Tree {
            tags: vec!["html", "body", "ul", "li", "li", "li", "a"],
            parents: vec![None, Some(0), Some(1), Some(2), Some(2), Some(2), Some(1)],
            attrs: vec![
                vec![],
                vec![],
                vec![("class", "menu primary")],
                vec![("class", "a")],
                vec![("class", "b"), ("id", "x")],
                vec![("data-role", "item-last")],
                vec![("href", "/home")],
            ],
            hovered: Some(4),
        }
    }

    fn matches(selector: &str, node: u32) -> bool {
        SelectorList::parse(selector)
            .map(|list| list.matches(&sample_tree(), NodeId(node)))
            .unwrap_or(false)
    }

    #[test]
    fn combinators_and_compounds() {
        assert!(matches("ul.menu > li.a", 3));
        assert!(matches("body li", 5));
        assert!(matches("li.a + li", 4));
        assert!(matches("li.a ~ li", 5));
        assert!(!matches("li.b + li.a", 3));
        assert!(matches(":root > body", 1));
        assert!(matches("html body > ul.primary.menu li#x", 4));
    }

    #[test]
    fn structural_and_state_pseudos() {
        assert!(matches("li:first-child", 3));
        assert!(matches("li:last-child", 5));
        assert!(matches("li:nth-child(2n)", 4));
        assert!(matches("li:nth-of-type(odd)", 5));
        assert!(matches("li:hover", 4));
        assert!(!matches("li:hover", 3));
        assert!(matches("li:not(.a, .b)", 5));
        assert!(matches("a:link", 6));
        assert!(matches("[data-role^=item]", 5));
        assert!(matches("[data-role|=\"item\"]", 5));
        assert!(!matches("li:placeholder-shown", 3));
    }

    #[test]
    fn specificity_follows_id_class_type() {
        let list = SelectorList::parse("#x.b:hover li::before").unwrap();
        assert_eq!(list.0[0].specificity(), Specificity(1, 2, 2));
        let list = SelectorList::parse(":where(#x) li").unwrap();
        assert_eq!(list.0[0].specificity(), Specificity(0, 0, 1));
    }

    #[test]
    fn pseudo_elements_only_match_their_context() {
        let tree = sample_tree();
        let list = SelectorList::parse("li.a:before").unwrap();
        assert!(list.0[0].matches(&tree, NodeId(3), Some(PseudoElement::Before)));
        assert!(!list.0[0].matches(&tree, NodeId(3), None));
        let marker = SelectorList::parse("li::marker").unwrap();
        assert!(!marker.0[0].matches(&tree, NodeId(3), None));
    }

    #[test]
    fn rejects_garbage() {
        assert!(SelectorList::parse("li >").is_err());
        assert!(SelectorList::parse("..x").is_err());
        assert!(SelectorList::parse("").is_err());
    }

    #[test]
    fn escaped_identifiers() {
        let list = SelectorList::parse(r".md\:flex").unwrap();
        assert_eq!(list.0[0].subject.classes, vec!["md:flex".to_string()]);
    }
}
