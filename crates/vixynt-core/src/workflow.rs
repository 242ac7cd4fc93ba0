//! Node graph for chained image workflows: load, generate, adjust, save.
//!
//! Nodes carry typed parameters per kind. Connections run from an output
//! port of one node to an input port of another, and each input port holds
//! at most one connection.

use std::collections::{HashMap, VecDeque};

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::layer::merge_field;

pub type NodeId = String;
pub type ConnectionId = String;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Source,
    Generate,
    Upscale,
    Adjust,
    Filter,
    Mask,
    Fill,
    Output,
}

impl NodeKind {
    pub const ALL: [NodeKind; 8] = [
        Self::Source,
        Self::Generate,
        Self::Upscale,
        Self::Adjust,
        Self::Filter,
        Self::Mask,
        Self::Fill,
        Self::Output,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Source => "Load Image",
            Self::Generate => "Generate",
            Self::Upscale => "Upscale",
            Self::Adjust => "Adjust",
            Self::Filter => "Filter",
            Self::Mask => "Mask",
            Self::Fill => "Gen Fill",
            Self::Output => "Save",
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Generate => "generate",
            Self::Upscale => "upscale",
            Self::Adjust => "adjust",
            Self::Filter => "filter",
            Self::Mask => "mask",
            Self::Fill => "fill",
            Self::Output => "output",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }

    pub fn inputs(self) -> &'static [&'static str] {
        match self {
            Self::Source => &[],
            Self::Generate => &["ref"],
            Self::Upscale | Self::Adjust | Self::Mask | Self::Output => &["image"],
            Self::Filter => &["image", "style"],
            Self::Fill => &["image", "mask"],
        }
    }

    pub fn outputs(self) -> &'static [&'static str] {
        match self {
            Self::Output => &[],
            Self::Mask => &["image", "mask"],
            _ => &["image"],
        }
    }

    /// Nodes that produce an image without needing an input.
    pub fn is_root(self) -> bool {
        matches!(self, Self::Source | Self::Generate)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceParams {
    pub image_path: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateParams {
    pub prompt: String,
    pub model: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpscaleParams {
    pub scale: u32,
}

impl Default for UpscaleParams {
    fn default() -> Self {
        Self { scale: 2 }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AdjustParams {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutputParams {
    pub filename: String,
}

impl Default for OutputParams {
    fn default() -> Self {
        Self {
            filename: "output.png".into(),
        }
    }
}

/// Per-kind node parameters; the variant is the node kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "params", rename_all = "lowercase")]
pub enum NodeParams {
    Source(SourceParams),
    Generate(GenerateParams),
    Upscale(UpscaleParams),
    Adjust(AdjustParams),
    Filter,
    Mask,
    Fill,
    Output(OutputParams),
}

impl NodeParams {
    /// Defaults for `kind`. Generate nodes start on `model`.
    pub fn defaults(kind: NodeKind, model: &str) -> Self {
        match kind {
            NodeKind::Source => Self::Source(SourceParams::default()),
            NodeKind::Generate => Self::Generate(GenerateParams {
                prompt: String::new(),
                model: model.to_string(),
            }),
            NodeKind::Upscale => Self::Upscale(UpscaleParams::default()),
            NodeKind::Adjust => Self::Adjust(AdjustParams::default()),
            NodeKind::Filter => Self::Filter,
            NodeKind::Mask => Self::Mask,
            NodeKind::Fill => Self::Fill,
            NodeKind::Output => Self::Output(OutputParams::default()),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Source(_) => NodeKind::Source,
            Self::Generate(_) => NodeKind::Generate,
            Self::Upscale(_) => NodeKind::Upscale,
            Self::Adjust(_) => NodeKind::Adjust,
            Self::Filter => NodeKind::Filter,
            Self::Mask => NodeKind::Mask,
            Self::Fill => NodeKind::Fill,
            Self::Output(_) => NodeKind::Output,
        }
    }

    /// Shallow merge; false when the patch is for another kind.
    pub fn merge(&mut self, patch: &NodeParamsPatch) -> bool {
        match (self, patch) {
            (Self::Source(p), NodeParamsPatch::Source { image_path }) => {
                merge_field(&mut p.image_path, image_path);
            }
            (Self::Generate(p), NodeParamsPatch::Generate { prompt, model }) => {
                merge_field(&mut p.prompt, prompt);
                merge_field(&mut p.model, model);
            }
            (Self::Upscale(p), NodeParamsPatch::Upscale { scale }) => {
                merge_field(&mut p.scale, scale);
            }
            (
                Self::Adjust(p),
                NodeParamsPatch::Adjust {
                    brightness,
                    contrast,
                    saturation,
                },
            ) => {
                merge_field(&mut p.brightness, brightness);
                merge_field(&mut p.contrast, contrast);
                merge_field(&mut p.saturation, saturation);
            }
            (Self::Output(p), NodeParamsPatch::Output { filename }) => {
                merge_field(&mut p.filename, filename);
            }
            _ => return false,
        }
        true
    }
}

/// Partial update for [`NodeParams`]. Kinds without parameters have no
/// patch.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeParamsPatch {
    Source {
        image_path: Option<String>,
    },
    Generate {
        prompt: Option<String>,
        model: Option<String>,
    },
    Upscale {
        scale: Option<u32>,
    },
    Adjust {
        brightness: Option<f32>,
        contrast: Option<f32>,
        saturation: Option<f32>,
    },
    Output {
        filename: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
    #[serde(flatten)]
    pub params: NodeParams,
}

impl WorkflowNode {
    pub fn kind(&self) -> NodeKind {
        self.params.kind()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: ConnectionId,
    pub from: NodeId,
    pub from_port: String,
    pub to: NodeId,
    pub to_port: String,
}

#[derive(Clone, Debug, Default)]
pub struct Workflow {
    nodes: Vec<WorkflowNode>,
    connections: Vec<Connection>,
    selected_node_id: Option<NodeId>,
    next_node: u64,
    next_connection: u64,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[WorkflowNode] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn selected_node_id(&self) -> Option<&str> {
        self.selected_node_id.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a node of `kind` at `(x, y)` with default params and select it.
    pub fn add_node(&mut self, kind: NodeKind, x: f32, y: f32, model: &str) -> NodeId {
        self.next_node += 1;
        let id = format!("node_{}", self.next_node);
        self.nodes.push(WorkflowNode {
            id: id.clone(),
            x,
            y,
            params: NodeParams::defaults(kind, model),
        });
        debug!(%id, kind = kind.tag(), "workflow node added");
        self.selected_node_id = Some(id.clone());
        id
    }

    /// Remove a node along with every connection touching it.
    pub fn delete_node(&mut self, id: &str) -> bool {
        let Some(idx) = self.nodes.iter().position(|n| n.id == id) else {
            return false;
        };
        self.nodes.remove(idx);
        self.connections.retain(|c| c.from != id && c.to != id);
        if self.selected_node_id.as_deref() == Some(id) {
            self.selected_node_id = None;
        }
        debug!(%id, "workflow node deleted");
        true
    }

    pub fn update_node(&mut self, id: &str, patch: &NodeParamsPatch) -> bool {
        self.nodes
            .iter_mut()
            .find(|n| n.id == id)
            .is_some_and(|n| n.params.merge(patch))
    }

    pub fn move_node(&mut self, id: &str, x: f32, y: f32) -> bool {
        let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) else {
            return false;
        };
        node.x = x;
        node.y = y;
        true
    }

    pub fn select_node(&mut self, id: Option<&str>) -> bool {
        match id {
            Some(id) if self.node(id).is_none() => false,
            _ => {
                self.selected_node_id = id.map(str::to_string);
                true
            }
        }
    }

    /// Connect `from.from_port` to `to.to_port`, replacing whatever fed that
    /// input before. Unknown nodes, unknown ports and self-connections are
    /// rejected.
    pub fn connect(
        &mut self,
        from: &str,
        from_port: &str,
        to: &str,
        to_port: &str,
    ) -> Option<ConnectionId> {
        let from_kind = self.node(from)?.kind();
        let to_kind = self.node(to)?.kind();
        if from == to
            || !from_kind.outputs().contains(&from_port)
            || !to_kind.inputs().contains(&to_port)
        {
            debug!(from, from_port, to, to_port, "rejected workflow connection");
            return None;
        }

        self.connections
            .retain(|c| !(c.to == to && c.to_port == to_port));
        self.next_connection += 1;
        let id = format!("conn_{}", self.next_connection);
        self.connections.push(Connection {
            id: id.clone(),
            from: from.to_string(),
            from_port: from_port.to_string(),
            to: to.to_string(),
            to_port: to_port.to_string(),
        });
        Some(id)
    }

    pub fn disconnect(&mut self, id: &str) -> bool {
        let before = self.connections.len();
        self.connections.retain(|c| c.id != id);
        self.connections.len() != before
    }

    /// The connection feeding `node.port`, if any.
    pub fn input(&self, node: &str, port: &str) -> Option<&Connection> {
        self.connections
            .iter()
            .find(|c| c.to == node && c.to_port == port)
    }

    /// Nodes a run starts from.
    pub fn roots(&self) -> impl Iterator<Item = &WorkflowNode> {
        self.nodes.iter().filter(|n| n.kind().is_root())
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.connections.clear();
        self.selected_node_id = None;
    }

    /// Nodes in an order where every node follows the nodes feeding it.
    /// Ties keep insertion order.
    pub fn execution_order(&self) -> Result<Vec<&WorkflowNode>> {
        let mut incoming: HashMap<&str, usize> =
            self.nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
        for c in &self.connections {
            if let Some(count) = incoming.get_mut(c.to.as_str()) {
                *count += 1;
            }
        }

        let mut ready: VecDeque<&WorkflowNode> = self
            .nodes
            .iter()
            .filter(|n| incoming[n.id.as_str()] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(node) = ready.pop_front() {
            order.push(node);
            for c in self.connections.iter().filter(|c| c.from == node.id) {
                if let Some(count) = incoming.get_mut(c.to.as_str()) {
                    *count -= 1;
                    if *count == 0
                        && let Some(next) = self.node(&c.to)
                    {
                        ready.push_back(next);
                    }
                }
            }
        }

        if order.len() != self.nodes.len() {
            bail!("workflow contains a cycle");
        }
        Ok(order)
    }
}
