use indexmap::IndexMap;
use tint_contracts::color::Rgb;

use crate::appearance::{lock, Capabilities, SurfaceHandle, Transparency};
use crate::scene::SceneGraph;

/// Read-only view of one registry entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub name: String,
    pub kind: &'static str,
    pub capabilities: Capabilities,
    pub color: Option<Rgb>,
    pub transparency: Option<Transparency>,
    pub emissive: Option<Rgb>,
    pub dirty: bool,
}

impl Surface {
    pub fn color_hex(&self) -> Option<String> {
        self.color.map(Rgb::to_hex)
    }
}

/// Name-addressed snapshot of every paintable surface of one loaded asset.
/// Entries keep first-seen order; a later duplicate name replaces the handle.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    surfaces: IndexMap<String, SurfaceHandle>,
}

impl Registry {
    pub fn build(scene: &SceneGraph) -> Self {
        let mut registry = Self::default();
        for mesh in scene.meshes() {
            let count = mesh.appearances.len();
            for (index, appearance) in mesh.appearances.iter().enumerate() {
                let label = lock(appearance).label().map(str::to_string);
                let name = surface_name(&mesh.name, index, count, label.as_deref());
                registry.insert(name, appearance.clone());
            }
        }
        registry
    }

    pub fn insert(&mut self, name: impl Into<String>, handle: SurfaceHandle) {
        self.surfaces.insert(name.into(), handle);
    }

    pub fn names(&self) -> Vec<String> {
        self.surfaces.keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<&SurfaceHandle> {
        self.surfaces.get(name)
    }

    pub fn surface(&self, name: &str) -> Option<Surface> {
        self.surfaces
            .get_key_value(name)
            .map(|(name, handle)| describe(name, handle))
    }

    pub fn surfaces(&self) -> Vec<Surface> {
        self.surfaces
            .iter()
            .map(|(name, handle)| describe(name, handle))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Names whose appearance needs a renderer refresh; clears the flags.
    pub fn drain_dirty(&self) -> Vec<String> {
        let dirty: Vec<String> = self
            .surfaces
            .iter()
            .filter(|(_, handle)| lock(handle).needs_update())
            .map(|(name, _)| name.clone())
            .collect();
        for name in &dirty {
            if let Some(handle) = self.surfaces.get(name) {
                lock(handle).set_needs_update(false);
            }
        }
        dirty
    }
}

/// Stable name for the `index`-th of `count` appearances of a mesh. Authored
/// labels win; anonymous ones derive from the mesh name.
pub fn surface_name(mesh: &str, index: usize, count: usize, label: Option<&str>) -> String {
    if let Some(label) = label.map(str::trim).filter(|label| !label.is_empty()) {
        return label.to_string();
    }
    let mesh = mesh.trim();
    match (mesh.is_empty(), count > 1) {
        (false, true) => format!("Material_{mesh}_{index}"),
        (false, false) => format!("Material_{mesh}"),
        (true, true) => format!("Unnamed_Material_{index}"),
        (true, false) => "Unnamed_Material".to_string(),
    }
}

fn describe(name: &str, handle: &SurfaceHandle) -> Surface {
    let appearance = lock(handle);
    let capabilities = appearance.capabilities();
    Surface {
        name: name.to_string(),
        kind: appearance.kind(),
        capabilities,
        color: appearance.color().filter(|_| capabilities.color),
        transparency: appearance
            .transparency()
            .filter(|_| capabilities.transparency),
        emissive: appearance.emissive().filter(|_| capabilities.emissive),
        dirty: appearance.needs_update(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use tint_contracts::color::Rgb;

    use super::{surface_name, Registry};
    use crate::appearance::{lock, DEFAULT_MATERIAL_NAME};
    use crate::loader::fixtures::{glb_from_json, shoe_gltf_json, TWO_OBJECT_OBJ};
    use crate::loader::{decode, AssetFormat};
    use crate::scene::SceneGraph;

    #[test]
    fn synthesized_names_follow_mesh_and_index() {
        assert_eq!(surface_name("Upper", 1, 2, None), "Material_Upper_1");
        assert_eq!(surface_name("Upper", 0, 1, None), "Material_Upper");
        assert_eq!(surface_name("", 0, 1, Some("  ")), "Unnamed_Material");
        assert_eq!(surface_name("", 2, 3, None), "Unnamed_Material_2");
        assert_eq!(surface_name("Upper", 0, 2, Some("upper_mat")), "upper_mat");
    }

    #[test]
    fn gltf_registry_names_authored_and_anonymous_materials() -> anyhow::Result<()> {
        let scene = decode(&glb_from_json(&shoe_gltf_json()), AssetFormat::Gltf, "shoe.glb")?;
        let registry = Registry::build(&scene);
        assert_eq!(
            registry.names(),
            vec!["outsole_mat", "Material_Upper_0", "Material_Upper_1", "logo_mat"]
        );

        let logo = registry.surface("logo_mat").unwrap();
        assert_eq!(logo.kind, "unlit");
        assert!(logo.capabilities.color && !logo.capabilities.emissive);
        assert_eq!(logo.emissive, None);
        assert_eq!(logo.color_hex(), Some("#000000".to_string()));
        assert!(logo.transparency.unwrap().is_translucent());
        Ok(())
    }

    #[test]
    fn obj_default_materials_collapse_last_write_wins() -> anyhow::Result<()> {
        let scene = decode(TWO_OBJECT_OBJ.as_bytes(), AssetFormat::Obj, "shoe.obj")?;
        let registry = Registry::build(&scene);
        assert_eq!(registry.names(), vec![DEFAULT_MATERIAL_NAME]);

        let meshes = scene.meshes();
        let upper = &meshes[1].appearances[0];
        let entry = registry.get(DEFAULT_MATERIAL_NAME).unwrap();
        assert!(Arc::ptr_eq(entry, upper));
        assert_eq!(
            registry.surface(DEFAULT_MATERIAL_NAME).and_then(|s| s.color_hex()),
            Some("#808080".to_string())
        );
        Ok(())
    }

    #[test]
    fn rebuilding_the_same_asset_gives_the_same_unique_names() -> anyhow::Result<()> {
        let bytes = glb_from_json(&shoe_gltf_json());
        let first = Registry::build(&decode(&bytes, AssetFormat::Gltf, "a")?).names();
        let second = Registry::build(&decode(&bytes, AssetFormat::Gltf, "b")?).names();
        assert_eq!(first, second);
        let unique: HashSet<&String> = first.iter().collect();
        assert_eq!(unique.len(), first.len());
        Ok(())
    }

    #[test]
    fn empty_scene_gives_empty_registry() {
        let scene = SceneGraph {
            source: "empty".to_string(),
            format: AssetFormat::Gltf,
            digest: String::new(),
            roots: Vec::new(),
        };
        assert!(Registry::build(&scene).is_empty());
    }

    #[test]
    fn drain_dirty_reports_once() -> anyhow::Result<()> {
        let scene = decode(&glb_from_json(&shoe_gltf_json()), AssetFormat::Gltf, "shoe.glb")?;
        let registry = Registry::build(&scene);
        if let Some(handle) = registry.get("outsole_mat") {
            let mut appearance = lock(handle);
            appearance.set_color(Rgb::new(1, 2, 3));
            appearance.set_needs_update(true);
        }
        assert_eq!(registry.drain_dirty(), vec!["outsole_mat"]);
        assert!(registry.drain_dirty().is_empty());
        Ok(())
    }
}
