//! Renderer-agnostic topology snapshot.
//!
//! The only external interface of the engine: a flat node/link structure the
//! browser renderer consumes for layout and painting. Node ids are keyed by
//! identity (layer position + role + neuron index), not by array position, so
//! the renderer can diff consecutive snapshots without flicker. Optional
//! fields serialize by omission, never as `null`.

use serde::{Deserialize, Serialize};

/// Role of a node within its layer column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Input,
    Output,
}

/// One neuron in the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    /// Stable identity: `layer-{i}:{in|out}:{j}`.
    pub id: String,

    /// Id of the layer this node belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,

    /// Neuron index within the layer column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neuron: Option<usize>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub role: Option<NodeRole>,

    /// Most recent activation value, when a forward pass has produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activation: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// One weighted edge between two nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,

    /// Current weight value for visual encoding (stroke width, color ramp).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Complete snapshot of the network topology and current weights.
///
/// Purely derived, read-only output — never fed back into the model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

/// Per-unit export fragment: the nodes and links this unit contributes, plus
/// the ids of its output column for the next unit to link against.
#[derive(Debug, Clone, Default)]
pub struct UnitGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
    pub output_ids: Vec<String>,
}
