use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HierarchyError {
    #[error("malformed hierarchy dump: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("hierarchy dump has no <{expected}> root (found <{found}>)")]
    UnexpectedRoot { expected: &'static str, found: String },
}

/// A single visible node of an Android UI hierarchy.
///
/// Serializes with the attribute names used by the uiautomator dump
/// (`class`, `resource-id`, `content-desc`) and omits absent values, so the
/// JSON rendering doubles as the compact form handed to the oracle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<String>,

    #[serde(rename = "class", default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(rename = "resource-id", default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,

    #[serde(rename = "content-desc", default, skip_serializing_if = "Option::is_none")]
    pub content_desc: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ViewNode>,
}

/// Node attributes that can be stripped from a tree before it is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeField {
    Bounds,
    Class,
    Text,
    ResourceId,
    ContentDesc,
}

impl ViewNode {
    /// Total number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(ViewNode::subtree_len).sum::<usize>()
    }

    fn without(&self, fields: &[NodeField]) -> ViewNode {
        let keep = |field: NodeField, value: &Option<String>| {
            if fields.contains(&field) {
                None
            } else {
                value.clone()
            }
        };

        ViewNode {
            index: self.index,
            package: self.package.clone(),
            bounds: keep(NodeField::Bounds, &self.bounds),
            class_name: keep(NodeField::Class, &self.class_name),
            text: keep(NodeField::Text, &self.text),
            resource_id: keep(NodeField::ResourceId, &self.resource_id),
            content_desc: keep(NodeField::ContentDesc, &self.content_desc),
            children: without_fields(&self.children, fields),
        }
    }
}

/// Parse a uiautomator XML dump into a forest of visible nodes.
///
/// Top-level `<node>` elements are always kept; below them only nodes with
/// `visible-to-user="true"` survive, together with their visible descendants.
pub fn parse_hierarchy(xml: &str) -> Result<Vec<ViewNode>, HierarchyError> {
    let document = roxmltree::Document::parse(xml)?;
    let root = document.root_element();

    if root.tag_name().name() != "hierarchy" {
        return Err(HierarchyError::UnexpectedRoot {
            expected: "hierarchy",
            found: root.tag_name().name().to_string(),
        });
    }

    Ok(root
        .children()
        .filter(|child| child.has_tag_name("node"))
        .map(parse_node)
        .collect())
}

fn parse_node(node: roxmltree::Node<'_, '_>) -> ViewNode {
    let children = node
        .children()
        .filter(|child| child.has_tag_name("node"))
        .filter(|child| child.attribute("visible-to-user") == Some("true"))
        .map(parse_node)
        .collect();

    ViewNode {
        index: node.attribute("index").and_then(|v| v.parse().ok()),
        package: attribute(node, "package"),
        bounds: attribute(node, "bounds"),
        class_name: attribute(node, "class"),
        text: attribute(node, "text"),
        resource_id: attribute(node, "resource-id"),
        content_desc: attribute(node, "content-desc"),
        children,
    }
}

// Empty strings are what uiautomator writes for "unset"; keep them out of prompts.
fn attribute(node: roxmltree::Node<'_, '_>, name: &str) -> Option<String> {
    node.attribute(name)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Return a copy of `nodes` with the selected attributes removed at every depth.
pub fn without_fields(nodes: &[ViewNode], fields: &[NodeField]) -> Vec<ViewNode> {
    nodes.iter().map(|node| node.without(fields)).collect()
}

/// Compact JSON rendering of a forest, used when embedding a tree in a prompt.
pub fn render_hierarchy(nodes: &[ViewNode]) -> String {
    // Serializing plain strings and integers cannot fail.
    serde_json::to_string(nodes).unwrap_or_default()
}
