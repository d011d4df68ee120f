use crate::appearance::SurfaceHandle;
use crate::loader::AssetFormat;

/// Normalized scene produced by the asset loader.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    pub source: String,
    pub format: AssetFormat,
    /// SHA-256 of the asset bytes, lower-case hex.
    pub digest: String,
    pub roots: Vec<SceneNode>,
}

#[derive(Debug, Clone, Default)]
pub struct SceneNode {
    pub name: String,
    pub mesh: Option<Mesh>,
    pub children: Vec<SceneNode>,
}

/// One drawable with one appearance slot per sub-part.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: String,
    pub appearances: Vec<SurfaceHandle>,
}

impl SceneGraph {
    /// Meshes in depth-first pre-order: a node's mesh, then its children in order.
    pub fn meshes(&self) -> Vec<&Mesh> {
        let mut out = Vec::new();
        let mut stack: Vec<&SceneNode> = self.roots.iter().rev().collect();
        while let Some(node) = stack.pop() {
            if let Some(mesh) = &node.mesh {
                out.push(mesh);
            }
            stack.extend(node.children.iter().rev());
        }
        out
    }
}
