//! Texture node types: one element of a material's shading graph.

use serde::{Deserialize, Serialize};

use crate::color::Rgb;

/// Index of a node inside its owning [`crate::NodePool`].
///
/// Ids are only meaningful within the pool that produced them; nodes are
/// never shared by reference across materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Whether a node produces a grayscale value or a color.
///
/// The same bitmap may need a linear-gamma numeric reading when feeding a
/// bump or alpha slot and a color reading when feeding diffuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueDomain {
    Numeric,
    Color,
}

/// Operation performed by the `Math` and `ColorMath` combinators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MathOp {
    Add,
    Subtract,
    Multiply,
    /// Pass the first input through unchanged.
    None,
}

/// Noise lattice used by procedural nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseBasis {
    OriginalPerlin,
    ImprovedPerlin,
}

/// Flavor of procedural noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseKind {
    Clouds,
    Fbm,
    DistortedNoise,
}

/// One input of a node: either a literal, or a reference to another node in
/// the same pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeInput {
    Node(NodeId),
    Value(f64),
    Color(Rgb),
}

impl NodeInput {
    pub fn node(&self) -> Option<NodeId> {
        match self {
            NodeInput::Node(id) => Some(*id),
            _ => None,
        }
    }
}

/// The closed set of node kinds understood by every backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// A bitmap on disk with its tiling parameters.
    ImageMap {
        file: String,
        gain: f64,
        gamma: f64,
        u_tile: f64,
        v_tile: f64,
        u_offset: f64,
        v_offset: f64,
        normal_map: bool,
    },
    /// A flat color.
    Constant { color: Rgb },
    /// Blend of two inputs driven by a scalar amount or a grayscale map.
    Mix {
        tex1: NodeInput,
        tex2: NodeInput,
        amount: NodeInput,
    },
    /// Numeric combinator: `op(tex1 * amount1, tex2 * amount2)`. A missing
    /// texture input means the bare amount is used.
    Math {
        tex1: Option<NodeId>,
        tex2: Option<NodeId>,
        amount1: f64,
        amount2: f64,
        op: MathOp,
    },
    /// Color combinator: `op(color1 * tex1, color2 * tex2)`.
    ColorMath {
        tex1: Option<NodeId>,
        tex2: Option<NodeId>,
        color1: Rgb,
        color2: Rgb,
        op: MathOp,
    },
    /// Single-channel extraction of a color input (grayscale conversion).
    Component {
        tex: Option<NodeId>,
        channel: u8,
        color: Rgb,
    },
    /// Procedural noise.
    Noise {
        kind: NoiseKind,
        basis: NoiseBasis,
        size: f64,
        detail: f64,
        brightness: f64,
        contrast: f64,
        hard: bool,
        distortion: f64,
    },
    /// Four-stop gradient driven by an amount input.
    Band {
        stops: [Rgb; 4],
        offsets: [f64; 4],
        amount: NodeInput,
    },
    /// View-angle dependent color.
    FresnelColor { color: Rgb, tex: Option<NodeId> },
}

/// An immutable-once-built node in a material's shading graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureNode {
    /// Unique within the owning pool's name index.
    pub name: String,
    pub domain: ValueDomain,
    pub kind: NodeKind,
}

impl TextureNode {
    pub fn new(name: impl Into<String>, domain: ValueDomain, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            domain,
            kind,
        }
    }

    /// Ids of every node this node references, in input order.
    pub fn references(&self) -> Vec<NodeId> {
        let mut refs = Vec::new();
        let mut push_input = |input: &NodeInput, refs: &mut Vec<NodeId>| {
            if let NodeInput::Node(id) = input {
                refs.push(*id);
            }
        };
        match &self.kind {
            NodeKind::ImageMap { .. } | NodeKind::Constant { .. } | NodeKind::Noise { .. } => {}
            NodeKind::Mix { tex1, tex2, amount } => {
                push_input(tex1, &mut refs);
                push_input(tex2, &mut refs);
                push_input(amount, &mut refs);
            }
            NodeKind::Math { tex1, tex2, .. } | NodeKind::ColorMath { tex1, tex2, .. } => {
                refs.extend(tex1.iter().copied());
                refs.extend(tex2.iter().copied());
            }
            NodeKind::Component { tex, .. } | NodeKind::FresnelColor { tex, .. } => {
                refs.extend(tex.iter().copied());
            }
            NodeKind::Band { amount, .. } => push_input(amount, &mut refs),
        }
        refs
    }

    /// True for image maps flagged as tangent-space normal maps.
    pub fn is_normal_map(&self) -> bool {
        matches!(self.kind, NodeKind::ImageMap { normal_map: true, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_references_collects_node_inputs_only() {
        let node = TextureNode::new(
            "mixer",
            ValueDomain::Color,
            NodeKind::Mix {
                tex1: NodeInput::Node(NodeId(0)),
                tex2: NodeInput::Color(Rgb::gray(0.5)),
                amount: NodeInput::Node(NodeId(3)),
            },
        );
        assert_eq!(node.references(), vec![NodeId(0), NodeId(3)]);
    }

    #[test]
    fn test_leaf_nodes_have_no_references() {
        let node = TextureNode::new(
            "c",
            ValueDomain::Color,
            NodeKind::Constant {
                color: Rgb::gray(1.0),
            },
        );
        assert!(node.references().is_empty());
    }
}
