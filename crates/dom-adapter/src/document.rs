//! Arena-backed live document.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use stylescope_core_types::{
    AnimationInstance, AnimationKind, ComputedKeyframe, ComputedStyle, CssRule, NodeId,
    ProbeError, PseudoElement, Rect, RuleHandle, SheetSource, SyntheticEvent, Viewport,
};
use tracing::{debug, trace};

use crate::cascade::{self, CompiledRule};
use crate::css;
use crate::error::DocumentError;
use crate::registry::InjectedRules;
use crate::selector::{ElementState, ElementTree, SelectorList};
use crate::values;

#[derive(Clone, Debug)]
struct NodeData {
    tag: String,
    attrs: BTreeMap<String, String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    rect: Rect,
    detached: bool,
}

#[derive(Clone, Debug)]
struct SheetEntry {
    href: Option<String>,
    cross_origin: bool,
    rules: Vec<CssRule>,
}

/// Element focus/hover/press state as the document currently reports it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InteractionSnapshot {
    pub hovered: Option<NodeId>,
    pub active: Option<NodeId>,
    pub focused: Option<NodeId>,
}

struct DocState {
    nodes: Vec<NodeData>,
    root: Option<NodeId>,
    sheets: Vec<SheetEntry>,
    compiled: Vec<CompiledRule>,
    viewport: Viewport,
    interaction: InteractionSnapshot,
    pointer_modality: bool,
    animations: Vec<AnimationInstance>,
    globals: Vec<String>,
    scripts: Vec<String>,
}

impl DocState {
    fn node(&self, node: NodeId) -> Result<&NodeData, DocumentError> {
        let data = self
            .nodes
            .get(node.0 as usize)
            .ok_or(DocumentError::UnknownNode(node))?;
        if data.detached {
            return Err(DocumentError::Detached(node));
        }
        Ok(data)
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut NodeData, DocumentError> {
        let data = self
            .nodes
            .get_mut(node.0 as usize)
            .ok_or(DocumentError::UnknownNode(node))?;
        if data.detached {
            return Err(DocumentError::Detached(node));
        }
        Ok(data)
    }

    fn attached(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, data)| !data.detached)
            .map(|(idx, _)| NodeId(idx as u32))
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.nodes.get(current.0 as usize).and_then(|n| n.parent);
        }
        false
    }

    fn is_focusable(&self, node: NodeId) -> bool {
        let Some(data) = self.nodes.get(node.0 as usize) else {
            return false;
        };
        if data.attrs.contains_key("tabindex") || data.attrs.contains_key("contenteditable") {
            return true;
        }
        let disabled = data.attrs.contains_key("disabled");
        match data.tag.as_str() {
            "a" => data.attrs.contains_key("href"),
            "button" | "select" | "textarea" => !disabled,
            "input" => !disabled && data.attrs.get("type").map(String::as_str) != Some("hidden"),
            _ => false,
        }
    }

    fn cascade_rules<'a>(&'a self, injected: &'a [CompiledRule]) -> Vec<&'a CompiledRule> {
        self.compiled.iter().chain(injected.iter()).collect()
    }
}

impl ElementTree for DocState {
    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0 as usize).and_then(|n| n.parent)
    }

    fn children_of(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node.0 as usize)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn tag_of(&self, node: NodeId) -> &str {
        self.nodes
            .get(node.0 as usize)
            .map(|n| n.tag.as_str())
            .unwrap_or("")
    }

    fn attribute_of(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes
            .get(node.0 as usize)
            .and_then(|n| n.attrs.get(name))
            .map(String::as_str)
    }

    fn has_state(&self, node: NodeId, state: ElementState) -> bool {
        let interaction = self.interaction;
        match state {
            ElementState::Hover => interaction
                .hovered
                .is_some_and(|hovered| self.is_inclusive_ancestor(node, hovered)),
            ElementState::Active => interaction
                .active
                .is_some_and(|active| self.is_inclusive_ancestor(node, active)),
            ElementState::Focus => interaction.focused == Some(node),
            ElementState::FocusVisible => {
                interaction.focused == Some(node) && !self.pointer_modality
            }
            ElementState::FocusWithin => interaction
                .focused
                .is_some_and(|focused| self.is_inclusive_ancestor(node, focused)),
        }
    }
}

/// In-memory stand-in for a rendered page.
///
/// Node ids follow document order. Dispatched pointer events are treated as trusted input, so
/// they drive `:hover`/`:active` matching; focus modality only changes through
/// [`MemoryDocument::set_pointer_modality`].
pub struct MemoryDocument {
    state: RwLock<DocState>,
    injected: InjectedRules,
}

impl MemoryDocument {
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::default()
    }

    pub fn document_element(&self) -> Option<NodeId> {
        self.state.read().root
    }

    pub fn body(&self) -> Option<NodeId> {
        let state = self.state.read();
        let body = state.attached().find(|&node| state.tag_of(node) == "body");
        body
    }

    pub fn query_all(&self, selector: &str) -> Result<Vec<NodeId>, DocumentError> {
        let list = SelectorList::parse(selector)?;
        let state = self.state.read();
        Ok(state
            .attached()
            .filter(|&node| list.matches(&*state, node))
            .collect())
    }

    pub fn query(&self, selector: &str) -> Result<Option<NodeId>, DocumentError> {
        Ok(self.query_all(selector)?.into_iter().next())
    }

    pub fn matches(&self, node: NodeId, selector: &str) -> Result<bool, DocumentError> {
        let list = SelectorList::parse(selector)?;
        let state = self.state.read();
        state.node(node)?;
        Ok(list.matches(&*state, node))
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        let state = self.state.read();
        state.node(node).ok().and_then(|data| data.parent)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        let state = self.state.read();
        state
            .node(node)
            .map(|data| data.children.clone())
            .unwrap_or_default()
    }

    pub fn tag_name(&self, node: NodeId) -> Option<String> {
        let state = self.state.read();
        state.node(node).ok().map(|data| data.tag.clone())
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        let state = self.state.read();
        state
            .node(node)
            .ok()
            .and_then(|data| data.attrs.get(name).cloned())
    }

    pub fn class_list(&self, node: NodeId) -> Vec<String> {
        self.attribute(node, "class")
            .map(|classes| classes.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn computed_style(
        &self,
        node: NodeId,
        pseudo: Option<PseudoElement>,
    ) -> Result<ComputedStyle, DocumentError> {
        let state = self.state.read();
        state.node(node)?;
        let injected = self.injected.ordered(state.compiled.len());
        let rules = state.cascade_rules(&injected);
        Ok(cascade::compute_style(&*state, &rules, node, pseudo))
    }

    pub fn bounding_rect(&self, node: NodeId) -> Result<Rect, DocumentError> {
        let state = self.state.read();
        Ok(state.node(node)?.rect)
    }

    pub fn viewport(&self) -> Viewport {
        self.state.read().viewport
    }

    /// Every style source. Cross-origin sources refuse enumeration but still style the page.
    pub fn style_sheets(&self) -> Vec<SheetSource> {
        let state = self.state.read();
        let mut sources: Vec<SheetSource> = state
            .sheets
            .iter()
            .map(|sheet| SheetSource {
                href: sheet.href.clone(),
                rules: if sheet.cross_origin {
                    Err(ProbeError::UnreadableSource(
                        sheet.href.clone().unwrap_or_default(),
                    ))
                } else {
                    Ok(sheet.rules.clone())
                },
            })
            .collect();
        if !self.injected.is_empty() {
            let rules = self
                .injected
                .sources()
                .iter()
                .flat_map(|source| css::parse_stylesheet(source))
                .collect();
            sources.push(SheetSource {
                href: None,
                rules: Ok(rules),
            });
        }
        sources
    }

    /// Explicitly registered animations followed by running CSS animations.
    pub fn animations(&self) -> Vec<AnimationInstance> {
        let state = self.state.read();
        let mut out = state.animations.clone();
        let keyframes = keyframes_index(&state.sheets);
        if keyframes.is_empty() {
            return out;
        }
        let injected = self.injected.ordered(state.compiled.len());
        let rules = state.cascade_rules(&injected);
        for node in state.attached() {
            let style = cascade::compute_style(&*state, &rules, node, None);
            if style.get("display") == "none" {
                continue;
            }
            out.extend(css_animations(node, &style, &keyframes));
        }
        out
    }

    pub fn global_names(&self) -> Vec<String> {
        self.state.read().globals.clone()
    }

    pub fn script_sources(&self) -> Vec<String> {
        self.state.read().scripts.clone()
    }

    pub fn active_element(&self) -> Option<NodeId> {
        self.state.read().interaction.focused
    }

    pub fn interaction(&self) -> InteractionSnapshot {
        self.state.read().interaction
    }

    pub fn dispatch(&self, node: NodeId, event: SyntheticEvent) -> Result<(), DocumentError> {
        let mut state = self.state.write();
        state.node(node)?;
        match event {
            SyntheticEvent::PointerOver
            | SyntheticEvent::PointerEnter
            | SyntheticEvent::MouseOver
            | SyntheticEvent::MouseEnter
            | SyntheticEvent::MouseMove => state.interaction.hovered = Some(node),
            SyntheticEvent::PointerOut
            | SyntheticEvent::PointerLeave
            | SyntheticEvent::MouseOut
            | SyntheticEvent::MouseLeave => {
                if let Some(hovered) = state.interaction.hovered {
                    if state.is_inclusive_ancestor(node, hovered) {
                        state.interaction.hovered = None;
                    }
                }
            }
            SyntheticEvent::PointerDown | SyntheticEvent::MouseDown => {
                state.interaction.active = Some(node)
            }
            SyntheticEvent::PointerUp | SyntheticEvent::MouseUp => state.interaction.active = None,
        }
        trace!(%node, event = event.name(), "dispatched synthetic event");
        Ok(())
    }

    /// Focuses `node` if it is focusable; returns whether focus moved to it.
    pub fn focus(&self, node: NodeId) -> Result<bool, DocumentError> {
        let mut state = self.state.write();
        state.node(node)?;
        if !state.is_focusable(node) {
            return Ok(false);
        }
        state.interaction.focused = Some(node);
        Ok(true)
    }

    pub fn blur(&self) {
        self.state.write().interaction.focused = None;
    }

    /// Adds a class; returns false if the node already carried it.
    pub fn add_class(&self, node: NodeId, class: &str) -> Result<bool, DocumentError> {
        let mut state = self.state.write();
        let data = state.node_mut(node)?;
        let current = data.attrs.get("class").cloned().unwrap_or_default();
        if current.split_whitespace().any(|c| c == class) {
            return Ok(false);
        }
        let updated = if current.trim().is_empty() {
            class.to_string()
        } else {
            format!("{} {class}", current.trim())
        };
        data.attrs.insert("class".into(), updated);
        Ok(true)
    }

    /// Removes a class; returns false if the node did not carry it.
    pub fn remove_class(&self, node: NodeId, class: &str) -> Result<bool, DocumentError> {
        let mut state = self.state.write();
        let data = state.node_mut(node)?;
        let Some(current) = data.attrs.get("class").cloned() else {
            return Ok(false);
        };
        let remaining: Vec<&str> = current.split_whitespace().filter(|c| *c != class).collect();
        if remaining.len() == current.split_whitespace().count() {
            return Ok(false);
        }
        if remaining.is_empty() {
            data.attrs.remove("class");
        } else {
            data.attrs.insert("class".into(), remaining.join(" "));
        }
        Ok(true)
    }

    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), DocumentError> {
        let mut state = self.state.write();
        state
            .node_mut(node)?
            .attrs
            .insert(name.to_ascii_lowercase(), value.to_string());
        Ok(())
    }

    pub fn remove_attribute(&self, node: NodeId, name: &str) -> Result<(), DocumentError> {
        let mut state = self.state.write();
        state.node_mut(node)?.attrs.remove(&name.to_ascii_lowercase());
        Ok(())
    }

    /// Inserts a single style rule (`selector { ... }`) after every existing rule.
    pub fn insert_rule(&self, text: &str) -> Result<RuleHandle, DocumentError> {
        let mut parsed = css::parse_stylesheet(text);
        let (selector, declarations) = match (parsed.pop(), parsed.is_empty()) {
            (
                Some(CssRule::Style {
                    selector,
                    declarations,
                }),
                true,
            ) => (selector, declarations),
            _ => return Err(DocumentError::InvalidRule(text.to_string())),
        };
        let selectors = SelectorList::parse(&selector)
            .map_err(|_| DocumentError::InvalidRule(text.to_string()))?;
        let handle = self.injected.insert(
            text.to_string(),
            CompiledRule {
                selectors,
                declarations,
                order: 0,
            },
        );
        debug!(handle = handle.0, %selector, "inserted rule");
        Ok(handle)
    }

    pub fn delete_rule(&self, handle: RuleHandle) -> Result<(), DocumentError> {
        self.injected
            .remove(handle)
            .map(|_| ())
            .ok_or(DocumentError::UnknownRule(handle.0))
    }

    pub fn injected_rule_count(&self) -> usize {
        self.injected.len()
    }

    /// `true` once the user has interacted with a pointer; `:focus-visible` stops matching.
    pub fn set_pointer_modality(&self, pointer: bool) {
        self.state.write().pointer_modality = pointer;
    }

    pub fn push_animation(&self, animation: AnimationInstance) {
        self.state.write().animations.push(animation);
    }

    /// Removes `node` and its subtree from the tree. Later queries against them fail.
    pub fn detach(&self, node: NodeId) -> Result<(), DocumentError> {
        let mut state = self.state.write();
        let parent = state.node(node)?.parent;
        if let Some(parent) = parent {
            if let Some(data) = state.nodes.get_mut(parent.0 as usize) {
                data.children.retain(|&child| child != node);
            }
        }
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(data) = state.nodes.get_mut(current.0 as usize) {
                data.detached = true;
                stack.extend(data.children.iter().copied());
            }
        }
        if state.root == Some(node) {
            state.root = None;
        }
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.state.read().attached().count()
    }
}

fn keyframes_index(sheets: &[SheetEntry]) -> BTreeMap<String, Vec<ComputedKeyframe>> {
    fn walk(rules: &[CssRule], out: &mut BTreeMap<String, Vec<ComputedKeyframe>>) {
        for rule in rules {
            match rule {
                CssRule::Keyframes { name, frames } => {
                    let mut keyframes = Vec::new();
                    for frame in frames {
                        let values: BTreeMap<String, String> = frame
                            .declarations
                            .iter()
                            .map(|d| (d.name.clone(), d.value.clone()))
                            .collect();
                        for offset in frame.offsets() {
                            keyframes.push(ComputedKeyframe {
                                offset,
                                values: values.clone(),
                            });
                        }
                    }
                    keyframes.sort_by(|a, b| a.offset.total_cmp(&b.offset));
                    out.entry(name.clone()).or_insert(keyframes);
                }
                CssRule::Group { rules, .. } => walk(rules, out),
                _ => {}
            }
        }
    }
    let mut out = BTreeMap::new();
    for sheet in sheets {
        walk(&sheet.rules, &mut out);
    }
    out
}

fn pick(items: &[String], idx: usize, fallback: &str) -> String {
    if items.is_empty() {
        fallback.to_string()
    } else {
        items[idx % items.len()].clone()
    }
}

fn css_animations(
    node: NodeId,
    style: &ComputedStyle,
    keyframes: &BTreeMap<String, Vec<ComputedKeyframe>>,
) -> Vec<AnimationInstance> {
    let list = |name: &str| css::split_top_level(style.get(name), ',');
    let names = list("animation-name");
    let durations = list("animation-duration");
    let delays = list("animation-delay");
    let easings = list("animation-timing-function");
    let counts = list("animation-iteration-count");
    let directions = list("animation-direction");
    let fills = list("animation-fill-mode");
    let states = list("animation-play-state");
    let mut out = Vec::new();
    for (idx, name) in names.iter().enumerate() {
        let Some(frames) = keyframes.get(name) else {
            continue;
        };
        let count = pick(&counts, idx, "1");
        out.push(AnimationInstance {
            target: Some(node),
            name: Some(name.clone()),
            kind: AnimationKind::CssAnimation,
            duration_ms: values::parse_time_ms(&pick(&durations, idx, "0s")).unwrap_or(0.0),
            delay_ms: values::parse_time_ms(&pick(&delays, idx, "0s")).unwrap_or(0.0),
            iterations: if count == "infinite" {
                None
            } else {
                Some(count.parse().unwrap_or(1.0))
            },
            easing: pick(&easings, idx, "ease"),
            direction: pick(&directions, idx, "normal"),
            fill: pick(&fills, idx, "none"),
            play_state: pick(&states, idx, "running"),
            keyframes: frames.clone(),
        });
    }
    out
}

/// Declarative element description consumed by [`DocumentBuilder::root`].
#[derive(Clone, Debug, Default)]
pub struct ElementSpec {
    tag: String,
    attrs: Vec<(String, String)>,
    rect: Rect,
    children: Vec<ElementSpec>,
}

pub fn el(tag: &str) -> ElementSpec {
    ElementSpec {
        tag: tag.to_ascii_lowercase(),
        ..ElementSpec::default()
    }
}

impl ElementSpec {
    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn class(mut self, class: &str) -> Self {
        match self.attrs.iter_mut().find(|(name, _)| name == "class") {
            Some((_, value)) => {
                value.push(' ');
                value.push_str(class);
            }
            None => self.attrs.push(("class".into(), class.to_string())),
        }
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        let name = name.to_ascii_lowercase();
        self.attrs.retain(|(existing, _)| *existing != name);
        self.attrs.push((name, value.to_string()));
        self
    }

    pub fn style(self, declarations: &str) -> Self {
        self.attr("style", declarations)
    }

    pub fn rect(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.rect = Rect::new(x, y, width, height);
        self
    }

    pub fn child(mut self, child: ElementSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = ElementSpec>) -> Self {
        self.children.extend(children);
        self
    }
}

#[derive(Default)]
pub struct DocumentBuilder {
    viewport: Option<Viewport>,
    sheets: Vec<(Option<String>, bool, String)>,
    globals: Vec<String>,
    scripts: Vec<String>,
    root: Option<ElementSpec>,
}

impl DocumentBuilder {
    pub fn viewport(mut self, width: f64, height: f64) -> Self {
        self.viewport = Some(Viewport { width, height });
        self
    }

    /// Inline `<style>` contents.
    pub fn stylesheet(mut self, css: &str) -> Self {
        self.sheets.push((None, false, css.to_string()));
        self
    }

    pub fn linked_stylesheet(mut self, href: &str, css: &str) -> Self {
        self.sheets.push((Some(href.to_string()), false, css.to_string()));
        self
    }

    /// A sheet from another origin: it styles the page but refuses rule enumeration.
    pub fn cross_origin_stylesheet(mut self, href: &str, css: &str) -> Self {
        self.sheets.push((Some(href.to_string()), true, css.to_string()));
        self
    }

    pub fn global(mut self, name: &str) -> Self {
        self.globals.push(name.to_string());
        self
    }

    pub fn script(mut self, src: &str) -> Self {
        self.scripts.push(src.to_string());
        self
    }

    pub fn root(mut self, root: ElementSpec) -> Self {
        self.root = Some(root);
        self
    }

    pub fn build(self) -> MemoryDocument {
        let viewport = self.viewport.unwrap_or_default();
        let root = self
            .root
            .unwrap_or_else(|| el("html").child(el("head")).child(el("body")));
        let mut nodes = Vec::new();
        flatten(root, None, &mut nodes);

        let sheets: Vec<SheetEntry> = self
            .sheets
            .into_iter()
            .map(|(href, cross_origin, text)| SheetEntry {
                href,
                cross_origin,
                rules: css::parse_stylesheet(&text),
            })
            .collect();
        let compiled = cascade::compile_rules(sheets.iter().map(|s| s.rules.as_slice()), viewport);
        debug!(
            nodes = nodes.len(),
            sheets = sheets.len(),
            rules = compiled.len(),
            "memory document built"
        );

        MemoryDocument {
            state: RwLock::new(DocState {
                root: if nodes.is_empty() { None } else { Some(NodeId(0)) },
                nodes,
                sheets,
                compiled,
                viewport,
                interaction: InteractionSnapshot::default(),
                pointer_modality: false,
                animations: Vec::new(),
                globals: self.globals,
                scripts: self.scripts,
            }),
            injected: InjectedRules::new(),
        }
    }
}

fn flatten(spec: ElementSpec, parent: Option<NodeId>, nodes: &mut Vec<NodeData>) -> NodeId {
    let id = NodeId(nodes.len() as u32);
    nodes.push(NodeData {
        tag: spec.tag,
        attrs: spec.attrs.into_iter().collect(),
        parent,
        children: Vec::new(),
        rect: spec.rect,
        detached: false,
    });
    for child in spec.children {
        let child_id = flatten(child, Some(id), nodes);
        nodes[id.0 as usize].children.push(child_id);
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> MemoryDocument {
        MemoryDocument::builder()
            .stylesheet(
                r#"
                :root { --brand: #0af; --space: 8px; }
                .card { padding: var(--space) calc(var(--space) * 2); color: var(--brand); }
                .card:hover { color: red; }
                .card .title { font-weight: bold; }
                #cta { border: 1px solid var(--brand); transition: opacity .2s ease; }
                "#,
            )
            .root(
                el("html").child(
                    el("body").child(
                        el("div")
                            .class("card")
                            .rect(0.0, 0.0, 300.0, 120.0)
                            .child(el("h2").class("title"))
                            .child(el("button").id("cta")),
                    ),
                ),
            )
            .build()
    }

    #[test]
    fn body_is_located_and_lost_on_detach() {
        let doc = doc();
        let body = doc.body().unwrap();
        assert_eq!(doc.tag_name(body).as_deref(), Some("body"));
        let root = doc.document_element().unwrap();
        doc.detach(root).unwrap();
        assert_eq!(doc.body(), None);
    }

    #[test]
    fn cascade_resolves_vars_and_inheritance() {
        let doc = doc();
        let card = doc.query(".card").unwrap().unwrap();
        let style = doc.computed_style(card, None).unwrap();
        assert_eq!(style.get("color"), "rgb(0, 170, 255)");
        assert_eq!(style.get("padding"), "8px calc(8px * 2)");
        assert_eq!(style.get("display"), "block");
        let title = doc.query(".title").unwrap().unwrap();
        let title_style = doc.computed_style(title, None).unwrap();
        assert_eq!(title_style.get("font-weight"), "700");
        assert_eq!(title_style.get("color"), "rgb(0, 170, 255)");
        assert_eq!(title_style.get("--space"), "8px");
    }

    #[test]
    fn shorthands_recompose() {
        let doc = doc();
        let cta = doc.query("#cta").unwrap().unwrap();
        let style = doc.computed_style(cta, None).unwrap();
        assert_eq!(style.get("border-width"), "1px");
        assert_eq!(style.get("border-color"), "rgb(0, 170, 255)");
        assert_eq!(style.get("transition"), "opacity 0.2s ease 0s");
        assert_eq!(style.get("outline"), "rgb(0, 170, 255) none 0px");
    }

    #[test]
    fn hover_follows_pointer_events() {
        let doc = doc();
        let card = doc.query(".card").unwrap().unwrap();
        let title = doc.query(".title").unwrap().unwrap();
        doc.dispatch(title, SyntheticEvent::PointerOver).unwrap();
        assert!(doc.matches(card, ".card:hover").unwrap());
        assert_eq!(doc.computed_style(card, None).unwrap().get("color"), "rgb(255, 0, 0)");
        doc.dispatch(card, SyntheticEvent::PointerLeave).unwrap();
        assert_eq!(doc.interaction().hovered, None);
    }

    #[test]
    fn focus_respects_focusability_and_modality() {
        let doc = doc();
        let card = doc.query(".card").unwrap().unwrap();
        let cta = doc.query("#cta").unwrap().unwrap();
        assert!(!doc.focus(card).unwrap());
        assert!(doc.focus(cta).unwrap());
        assert!(doc.matches(cta, ":focus-visible").unwrap());
        doc.set_pointer_modality(true);
        assert!(!doc.matches(cta, ":focus-visible").unwrap());
        assert!(doc.matches(card, ":focus-within").unwrap());
        doc.blur();
        assert_eq!(doc.active_element(), None);
    }

    #[test]
    fn injected_rules_cascade_and_delete() {
        let doc = doc();
        let card = doc.query(".card").unwrap().unwrap();
        let handle = doc.insert_rule(".card { opacity: .5 }").unwrap();
        assert_eq!(doc.computed_style(card, None).unwrap().get("opacity"), ".5");
        assert_eq!(doc.injected_rule_count(), 1);
        doc.delete_rule(handle).unwrap();
        assert_eq!(doc.computed_style(card, None).unwrap().get("opacity"), "1");
        assert!(doc.delete_rule(handle).is_err());
        assert!(doc.insert_rule("not a rule").is_err());
    }

    #[test]
    fn class_edits_are_reversible() {
        let doc = doc();
        let cta = doc.query("#cta").unwrap().unwrap();
        assert!(doc.add_class(cta, "is-hovered").unwrap());
        assert!(!doc.add_class(cta, "is-hovered").unwrap());
        assert!(doc.remove_class(cta, "is-hovered").unwrap());
        assert_eq!(doc.attribute(cta, "class"), None);
    }

    #[test]
    fn detached_nodes_error() {
        let doc = doc();
        let title = doc.query(".title").unwrap().unwrap();
        doc.detach(title).unwrap();
        assert_eq!(
            doc.computed_style(title, None),
            Err(DocumentError::Detached(title))
        );
        assert!(doc.query(".title").unwrap().is_none());
    }

    #[test]
    fn css_animations_surface_on_the_timeline() {
        let doc = MemoryDocument::builder()
            .stylesheet(
                "@keyframes spin { from { transform: rotate(0deg) } to { transform: rotate(360deg) } }
                 .spinner { animation: spin 1.5s linear infinite; }",
            )
            .root(el("html").child(el("body").child(el("div").class("spinner"))))
            .build();
        let animations = doc.animations();
        assert_eq!(animations.len(), 1);
        assert_eq!(animations[0].name.as_deref(), Some("spin"));
        assert_eq!(animations[0].duration_ms, 1500.0);
        assert_eq!(animations[0].iterations, None);
        assert_eq!(animations[0].keyframes.len(), 2);
    }
}
