use sha1::{Digest, Sha1};

use crate::hierarchy::view_node::{
    HierarchyError, NodeField, ViewNode, parse_hierarchy, render_hierarchy, without_fields,
};

/// Point-in-time capture of the device UI: the raw dump plus its visible tree.
///
/// A snapshot is never shared between resolution calls; every call captures
/// its own.
#[derive(Debug, Clone)]
pub struct HierarchySnapshot {
    raw: String,
    nodes: Vec<ViewNode>,
}

impl HierarchySnapshot {
    pub fn parse(raw: String) -> Result<Self, HierarchyError> {
        let nodes = parse_hierarchy(&raw)?;
        Ok(Self { raw, nodes })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn nodes(&self) -> &[ViewNode] {
        &self.nodes
    }

    pub fn into_raw(self) -> String {
        self.raw
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().map(ViewNode::subtree_len).sum()
    }

    /// Full tree rendering, coordinates included.
    pub fn render(&self) -> String {
        render_hierarchy(&self.nodes)
    }

    /// Tree rendering without coordinates. Locators derived from it cannot
    /// depend on element position.
    pub fn render_without_bounds(&self) -> String {
        render_hierarchy(&without_fields(&self.nodes, &[NodeField::Bounds]))
    }

    pub fn fingerprint(&self) -> String {
        hierarchy_fingerprint(&self.raw)
    }
}

/// SHA-1 of a raw dump, used to correlate journal entries with screens.
pub fn hierarchy_fingerprint(raw: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())
}
