use std::collections::HashMap;

use crate::selector::{SelectorPart, matches_chain, parse_selector_groups};
use crate::{Error, Result};

const WALK_STACK_RED_ZONE: usize = 64 * 1024;
const WALK_STACK_SIZE: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone)]
pub(crate) enum NodeType {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    node_type: NodeType,
}

#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) tag_name: String,
    pub(crate) attrs: Vec<(String, String)>,
}

impl Element {
    pub(crate) fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub(crate) fn has_class(&self, class_name: &str) -> bool {
        self.attr("class")
            .map(|classes| classes.split_ascii_whitespace().any(|c| c == class_name))
            .unwrap_or(false)
    }

    fn set_attr(&mut self, name: &str, value: String) {
        if let Some(slot) = self.attrs.iter_mut().find(|(key, _)| key == name) {
            slot.1 = value;
        } else {
            self.attrs.push((name.to_string(), value));
        }
    }

    fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(key, _)| key != name);
    }
}

/// Arena-backed document tree.
///
/// Node ids are indexes into the arena and stay valid for the lifetime of the
/// document; the widgets only ever rewrite text and inline style.
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
    root: NodeId,
    id_index: HashMap<String, NodeId>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    pub fn new() -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            node_type: NodeType::Document,
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            id_index: HashMap::new(),
        }
    }

    /// Parses an HTML fixture; script and style bodies are kept as text.
    pub fn from_html(html: &str) -> Result<Self> {
        crate::html::parse_html(html)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn create_node(&mut self, parent: NodeId, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            node_type,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub(crate) fn create_element(
        &mut self,
        parent: NodeId,
        tag_name: String,
        attrs: Vec<(String, String)>,
    ) -> NodeId {
        let id_attr = attrs
            .iter()
            .find(|(key, _)| key == "id")
            .map(|(_, value)| value.clone());
        let id = self.create_node(parent, NodeType::Element(Element { tag_name, attrs }));
        if let Some(id_attr) = id_attr.filter(|value| !value.is_empty()) {
            // First element wins, as getElementById does.
            self.id_index.entry(id_attr).or_insert(id);
        }
        id
    }

    pub(crate) fn create_text(&mut self, parent: NodeId, text: String) -> NodeId {
        self.create_node(parent, NodeType::Text(text))
    }

    pub(crate) fn element(&self, node_id: NodeId) -> Option<&Element> {
        match &self.nodes.get(node_id.0)?.node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, node_id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(node_id.0)?.node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_element(&self, node_id: NodeId) -> bool {
        self.element(node_id).is_some()
    }

    pub fn tag_name(&self, node_id: NodeId) -> Option<&str> {
        self.element(node_id).map(|e| e.tag_name.as_str())
    }

    pub fn parent(&self, node_id: NodeId) -> Option<NodeId> {
        self.nodes.get(node_id.0)?.parent
    }

    pub fn attr(&self, node_id: NodeId, name: &str) -> Option<String> {
        self.element(node_id)
            .and_then(|e| e.attr(name))
            .map(ToOwned::to_owned)
    }

    pub fn by_id(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).copied()
    }

    /// Whether `node_id` is `ancestor` itself or lies inside it (`Node.contains`).
    pub fn contains(&self, ancestor: NodeId, node_id: NodeId) -> bool {
        let mut cursor = Some(node_id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    pub fn text_content(&self, node_id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node_id, &mut out);
        out
    }

    fn collect_text(&self, node_id: NodeId, out: &mut String) {
        stacker::maybe_grow(WALK_STACK_RED_ZONE, WALK_STACK_SIZE, || {
            match &self.nodes[node_id.0].node_type {
                NodeType::Document | NodeType::Element(_) => {
                    for child in &self.nodes[node_id.0].children {
                        self.collect_text(*child, out);
                    }
                }
                NodeType::Text(text) => out.push_str(text),
            }
        })
    }

    pub fn set_text_content(&mut self, node_id: NodeId, value: &str) -> Result<()> {
        if self.element(node_id).is_none() {
            return Err(Error::InvalidArgument(
                "textContent target is not an element".into(),
            ));
        }
        let old_children = std::mem::take(&mut self.nodes[node_id.0].children);
        for child in old_children {
            self.nodes[child.0].parent = None;
        }
        if !value.is_empty() {
            self.create_text(node_id, value.to_string());
        }
        self.rebuild_id_index();
        Ok(())
    }

    /// Reads one inline style property; `key` may be camelCase (`backgroundColor`).
    pub fn style_get(&self, node_id: NodeId, key: &str) -> Result<String> {
        let element = self
            .element(node_id)
            .ok_or_else(|| Error::InvalidArgument("style target is not an element".into()))?;
        let name = js_prop_to_css_name(key);
        let decls = parse_style_declarations(element.attr("style"));
        Ok(decls
            .into_iter()
            .find(|(prop, _)| prop == &name)
            .map(|(_, value)| value)
            .unwrap_or_default())
    }

    pub fn style_set(&mut self, node_id: NodeId, key: &str, value: &str) -> Result<()> {
        let name = js_prop_to_css_name(key);
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::InvalidArgument("style target is not an element".into()))?;

        let mut decls = parse_style_declarations(element.attr("style"));
        if let Some(pos) = decls.iter().position(|(prop, _)| prop == &name) {
            if value.is_empty() {
                decls.remove(pos);
            } else {
                decls[pos].1 = value.to_string();
            }
        } else if !value.is_empty() {
            decls.push((name, value.to_string()));
        }

        if decls.is_empty() {
            element.remove_attr("style");
        } else {
            element.set_attr("style", serialize_style_declarations(&decls));
        }
        Ok(())
    }

    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        let all = self.query_selector_all(selector)?;
        Ok(all.into_iter().next())
    }

    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let groups = parse_selector_groups(selector)?;

        if let [chain] = groups.as_slice() {
            if let [part] = chain.as_slice() {
                if let Some(id) = part.step.id_only() {
                    return Ok(self.by_id(id).into_iter().collect());
                }
            }
        }

        let mut ids = Vec::new();
        self.collect_elements_dfs(self.root, &mut ids);
        Ok(ids
            .into_iter()
            .filter(|candidate| self.matches_any(*candidate, &groups))
            .collect())
    }

    pub fn matches_selector(&self, node_id: NodeId, selector: &str) -> Result<bool> {
        if self.element(node_id).is_none() {
            return Ok(false);
        }
        let groups = parse_selector_groups(selector)?;
        Ok(self.matches_any(node_id, &groups))
    }

    /// Nearest inclusive ancestor matching `selector` (`Element.closest`).
    pub fn closest(&self, node_id: NodeId, selector: &str) -> Result<Option<NodeId>> {
        let groups = parse_selector_groups(selector)?;
        let mut cursor = Some(node_id);
        while let Some(current) = cursor {
            if self.element(current).is_some() && self.matches_any(current, &groups) {
                return Ok(Some(current));
            }
            cursor = self.parent(current);
        }
        Ok(None)
    }

    fn matches_any(&self, node_id: NodeId, groups: &[Vec<SelectorPart>]) -> bool {
        groups
            .iter()
            .any(|steps| matches_chain(self, node_id, steps))
    }

    fn rebuild_id_index(&mut self) {
        let mut ids = Vec::new();
        self.collect_elements_dfs(self.root, &mut ids);
        let mut next = HashMap::new();
        for node in ids {
            if let Some(id) = self.element(node).and_then(|element| element.attr("id")) {
                if !id.is_empty() && !next.contains_key(id) {
                    next.insert(id.to_string(), node);
                }
            }
        }
        self.id_index = next;
    }

    fn collect_elements_dfs(&self, node_id: NodeId, out: &mut Vec<NodeId>) {
        stacker::maybe_grow(WALK_STACK_RED_ZONE, WALK_STACK_SIZE, || {
            if matches!(self.nodes[node_id.0].node_type, NodeType::Element(_)) {
                out.push(node_id);
            }
            for child in &self.nodes[node_id.0].children {
                self.collect_elements_dfs(*child, out);
            }
        })
    }

    pub(crate) fn previous_element_sibling(&self, node_id: NodeId) -> Option<NodeId> {
        let parent = self.parent(node_id)?;
        let children = &self.nodes[parent.0].children;
        let pos = children.iter().position(|id| *id == node_id)?;
        children[..pos]
            .iter()
            .rev()
            .copied()
            .find(|sibling| self.element(*sibling).is_some())
    }

    /// Serializes a subtree for assertion messages and debugging.
    pub fn dump_node(&self, node_id: NodeId) -> String {
        let mut out = String::new();
        self.dump_into(node_id, &mut out);
        out
    }

    fn dump_into(&self, node_id: NodeId, out: &mut String) {
        stacker::maybe_grow(WALK_STACK_RED_ZONE, WALK_STACK_SIZE, || {
            match &self.nodes[node_id.0].node_type {
                NodeType::Document => {
                    for child in &self.nodes[node_id.0].children {
                        self.dump_into(*child, out);
                    }
                }
                NodeType::Text(text) => out.push_str(text),
                NodeType::Element(element) => {
                    out.push('<');
                    out.push_str(&element.tag_name);
                    for (k, v) in &element.attrs {
                        out.push(' ');
                        out.push_str(k);
                        out.push_str("=\"");
                        out.push_str(v);
                        out.push('"');
                    }
                    out.push('>');
                    if crate::html::is_void_tag(&element.tag_name) {
                        return;
                    }
                    for child in &self.nodes[node_id.0].children {
                        self.dump_into(*child, out);
                    }
                    out.push_str("</");
                    out.push_str(&element.tag_name);
                    out.push('>');
                }
            }
        })
    }
}

fn js_prop_to_css_name(prop: &str) -> String {
    let mut out = String::new();
    for ch in prop.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

fn parse_style_declarations(style_attr: Option<&str>) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = Vec::new();
    let Some(style_attr) = style_attr else {
        return out;
    };

    for decl in style_attr.split(';') {
        let Some((name, value)) = decl.split_once(':') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        if name.is_empty() {
            continue;
        }
        let value = value.trim().to_string();
        if let Some(pos) = out.iter().position(|(existing, _)| existing == &name) {
            out[pos].1 = value;
        } else {
            out.push((name, value));
        }
    }

    out
}

fn serialize_style_declarations(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(name, value)| format!("{name}: {value};"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_html;

    #[test]
    fn text_content_concatenates_descendant_text() -> Result<()> {
        let dom = parse_html("<p id='p'>Total <b>€1</b>.</p>")?;
        let p = dom.by_id("p").ok_or_else(|| Error::SelectorNotFound("#p".into()))?;
        assert_eq!(dom.text_content(p), "Total €1.");
        Ok(())
    }

    #[test]
    fn set_text_content_replaces_children_and_drops_nested_ids() -> Result<()> {
        let mut dom = parse_html("<div id='box'><span id='inner'>x</span></div>")?;
        let boxed = dom.by_id("box").ok_or_else(|| Error::SelectorNotFound("#box".into()))?;
        dom.set_text_content(boxed, "plain")?;
        assert_eq!(dom.text_content(boxed), "plain");
        assert_eq!(dom.by_id("inner"), None);
        Ok(())
    }

    #[test]
    fn style_set_keeps_other_declarations() -> Result<()> {
        let mut dom = parse_html("<ul id='m' style='color: red; display:none'></ul>")?;
        let menu = dom.by_id("m").ok_or_else(|| Error::SelectorNotFound("#m".into()))?;
        assert_eq!(dom.style_get(menu, "display")?, "none");
        dom.style_set(menu, "display", "block")?;
        assert_eq!(dom.attr(menu, "style").as_deref(), Some("color: red; display: block;"));
        dom.style_set(menu, "backgroundColor", "blue")?;
        assert_eq!(dom.style_get(menu, "background-color")?, "blue");
        Ok(())
    }

    #[test]
    fn style_set_empty_value_removes_attribute() -> Result<()> {
        let mut dom = parse_html("<ul id='m' style='display: block'></ul>")?;
        let menu = dom.by_id("m").ok_or_else(|| Error::SelectorNotFound("#m".into()))?;
        dom.style_set(menu, "display", "")?;
        assert_eq!(dom.attr(menu, "style"), None);
        assert_eq!(dom.style_get(menu, "display")?, "");
        Ok(())
    }

    #[test]
    fn closest_includes_the_node_itself() -> Result<()> {
        let dom = parse_html("<div class='dropdown' id='root'><div id='t'><i id='icon'></i></div></div>")?;
        let icon = dom.by_id("icon").ok_or_else(|| Error::SelectorNotFound("#icon".into()))?;
        let root = dom.by_id("root").ok_or_else(|| Error::SelectorNotFound("#root".into()))?;
        assert_eq!(dom.closest(icon, ".dropdown")?, Some(root));
        assert_eq!(dom.closest(root, ".dropdown")?, Some(root));
        assert_eq!(dom.closest(icon, ".missing")?, None);
        assert!(dom.matches_selector(icon, ".dropdown i")?);
        assert!(!dom.matches_selector(dom.root(), "*")?);
        assert!(dom.contains(root, icon));
        assert!(!dom.contains(icon, root));
        Ok(())
    }

    #[test]
    fn by_id_returns_first_duplicate() -> Result<()> {
        let dom = parse_html("<p id='x'>first</p><p id='x'>second</p>")?;
        let x = dom.by_id("x").ok_or_else(|| Error::SelectorNotFound("#x".into()))?;
        assert_eq!(dom.text_content(x), "first");
        Ok(())
    }

    #[test]
    fn deep_documents_do_not_overflow_the_stack() -> Result<()> {
        let depth = 20_000;
        let html = format!(
            "{}<span class='generic-price'>€1</span>{}",
            "<div>".repeat(depth),
            "</div>".repeat(depth)
        );
        let dom = parse_html(&html)?;
        assert_eq!(dom.query_selector_all(".generic-price")?.len(), 1);
        assert_eq!(dom.text_content(dom.root()), "€1");
        Ok(())
    }
}
