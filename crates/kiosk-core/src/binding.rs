//! Mesh Binding - logical avatar roles resolved against a loaded scene
//!
//! When the 3D asset finishes loading, its scene graph is walked once and
//! the face and teeth sub-objects are located by name. The teeth rest pose
//! is captured here; every teeth target is later expressed relative to it.

use crate::config::RoleNames;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Local transform captured at bind time
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RestPose {
    /// Local position
    pub position: Vec3,
    /// Local rotation, Euler XYZ radians
    pub rotation: Vec3,
}

impl RestPose {
    /// Create a rest pose
    pub fn new(position: Vec3, rotation: Vec3) -> Self {
        Self { position, rotation }
    }
}

/// One named node of a loaded scene, as seen by the binder
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode<H> {
    /// Renderer-side reference to the node
    pub handle: H,
    /// Node name from the asset
    pub name: String,
    /// Blend-shape names exposed by the node's mesh, in weight order
    pub morph_targets: Vec<String>,
    /// Current local pose
    pub pose: RestPose,
}

/// Bound face mesh
#[derive(Debug, Clone, PartialEq)]
pub struct FaceBinding<H> {
    /// Renderer-side reference
    pub handle: H,
    /// Blend-shape names in weight order
    pub morph_targets: Vec<String>,
}

impl<H> FaceBinding<H> {
    /// Index of a blend shape in the weight array
    pub fn morph_index(&self, name: &str) -> Option<usize> {
        self.morph_targets.iter().position(|n| n == name)
    }
}

/// Bound teeth mesh
#[derive(Debug, Clone, PartialEq)]
pub struct TeethBinding<H> {
    /// Renderer-side reference
    pub handle: H,
    /// Pose at bind time
    pub rest: RestPose,
}

/// Role -> sub-object lookup for one loaded avatar
#[derive(Debug, Clone, PartialEq)]
pub struct MeshBinding<H> {
    /// Face mesh, if found
    pub face: Option<FaceBinding<H>>,
    /// Teeth mesh, if found
    pub teeth: Option<TeethBinding<H>>,
}

impl<H> Default for MeshBinding<H> {
    fn default() -> Self {
        Self {
            face: None,
            teeth: None,
        }
    }
}

impl<H> MeshBinding<H> {
    /// Binding with neither role resolved
    pub fn empty() -> Self {
        Self::default()
    }

    /// Walk the scene once and resolve each role to its first matching node.
    ///
    /// The face role additionally requires the node to expose blend shapes.
    /// A role that cannot be resolved is logged and left empty; the other
    /// role still binds.
    pub fn from_scene(nodes: impl IntoIterator<Item = SceneNode<H>>, roles: &RoleNames) -> Self {
        let mut binding = Self::empty();
        let mut face_without_morphs = false;

        for node in nodes {
            if roles.is_face(&node.name) {
                if binding.face.is_some() {
                    debug!("Ignoring additional face node '{}'", node.name);
                } else if node.morph_targets.is_empty() {
                    face_without_morphs = true;
                } else {
                    debug!(
                        "Face mesh '{}' found with {} blend shapes",
                        node.name,
                        node.morph_targets.len()
                    );
                    binding.face = Some(FaceBinding {
                        handle: node.handle,
                        morph_targets: node.morph_targets,
                    });
                }
            } else if roles.is_teeth(&node.name) {
                if binding.teeth.is_some() {
                    debug!("Ignoring additional teeth node '{}'", node.name);
                } else {
                    debug!("Teeth mesh '{}' found, rest pose {:?}", node.name, node.pose);
                    binding.teeth = Some(TeethBinding {
                        handle: node.handle,
                        rest: node.pose,
                    });
                }
            }
        }

        if binding.face.is_none() {
            if face_without_morphs {
                warn!("Face mesh found but exposes no blend shapes; face animation disabled");
            } else {
                warn!("No face mesh matching {:?}; face animation disabled", roles.face);
            }
        }
        if binding.teeth.is_none() {
            warn!("No teeth mesh matching {:?}; jaw animation disabled", roles.teeth);
        }

        binding
    }

    /// Whether neither role is bound
    pub fn is_empty(&self) -> bool {
        self.face.is_none() && self.teeth.is_none()
    }
}

/// Renderable sink the session writes channel values into
pub trait AvatarRig {
    /// Renderer-side node reference
    type Handle;

    /// Mutable blend-shape weights of a face node, in morph target order
    fn morph_weights(&mut self, face: &Self::Handle) -> Option<&mut [f32]>;

    /// Set local position and Euler XYZ rotation of a node
    fn set_local_pose(&mut self, node: &Self::Handle, position: Vec3, rotation: Vec3);
}

/// Node of an [`InMemoryRig`]
#[derive(Debug, Clone, PartialEq)]
pub struct RigNode {
    /// Node name
    pub name: String,
    /// Blend-shape names
    pub morph_targets: Vec<String>,
    /// Blend-shape weights
    pub weights: Vec<f32>,
    /// Local pose
    pub pose: RestPose,
}

/// Headless avatar rig, addressed by node index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InMemoryRig {
    nodes: Vec<RigNode>,
}

impl InMemoryRig {
    /// Create an empty rig
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with blend shapes
    pub fn with_morph_node(mut self, name: &str, morph_targets: &[&str]) -> Self {
        self.nodes.push(RigNode {
            name: name.to_string(),
            morph_targets: morph_targets.iter().map(|s| s.to_string()).collect(),
            weights: vec![0.0; morph_targets.len()],
            pose: RestPose::default(),
        });
        self
    }

    /// Add a plain node at `pose`
    pub fn with_node(mut self, name: &str, pose: RestPose) -> Self {
        self.nodes.push(RigNode {
            name: name.to_string(),
            morph_targets: Vec::new(),
            weights: Vec::new(),
            pose,
        });
        self
    }

    /// Snapshot the rig as scene nodes for binding
    pub fn scene_nodes(&self) -> Vec<SceneNode<usize>> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| SceneNode {
                handle: index,
                name: node.name.clone(),
                morph_targets: node.morph_targets.clone(),
                pose: node.pose,
            })
            .collect()
    }

    /// Find a node by name
    pub fn node(&self, name: &str) -> Option<&RigNode> {
        self.nodes.iter().find(|node| node.name == name)
    }

    /// Weight of a blend shape on a named node
    pub fn weight(&self, node: &str, morph: &str) -> Option<f32> {
        let node = self.node(node)?;
        let index = node.morph_targets.iter().position(|m| m == morph)?;
        node.weights.get(index).copied()
    }
}

impl AvatarRig for InMemoryRig {
    type Handle = usize;

    fn morph_weights(&mut self, face: &usize) -> Option<&mut [f32]> {
        self.nodes
            .get_mut(*face)
            .map(|node| node.weights.as_mut_slice())
    }

    fn set_local_pose(&mut self, node: &usize, position: Vec3, rotation: Vec3) {
        if let Some(node) = self.nodes.get_mut(*node) {
            node.pose = RestPose::new(position, rotation);
        }
    }
}
