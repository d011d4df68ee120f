use std::collections::HashMap;

use gltf::material::AlphaMode;
use tint_contracts::color::Rgb;

use crate::appearance::{handle, StandardMaterial, SurfaceHandle, UnlitMaterial};
use crate::scene::{Mesh, SceneNode};

/// Decodes a `.glb` container or a `.gltf` JSON document. Only the document is
/// read; vertex buffers are never resolved because surfaces carry no geometry.
pub(super) fn decode(bytes: &[u8]) -> Result<Vec<SceneNode>, String> {
    let gltf = gltf::Gltf::from_slice(bytes).map_err(|err| err.to_string())?;
    let document = gltf.document;
    let Some(scene) = document
        .default_scene()
        .or_else(|| document.scenes().next())
    else {
        return Ok(Vec::new());
    };

    let mut decoder = Decoder::default();
    Ok(scene.nodes().map(|node| decoder.node(&node)).collect())
}

/// Materials are shared by index so every primitive referencing the same
/// glTF material gets the same live handle.
#[derive(Default)]
struct Decoder {
    materials: HashMap<usize, SurfaceHandle>,
    default_material: Option<SurfaceHandle>,
}

impl Decoder {
    fn node(&mut self, node: &gltf::Node<'_>) -> SceneNode {
        let name = node.name().unwrap_or_default().trim().to_string();
        let mesh = node.mesh().map(|mesh| {
            let mesh_name = if name.is_empty() {
                mesh.name().unwrap_or_default().trim().to_string()
            } else {
                name.clone()
            };
            Mesh {
                name: mesh_name,
                appearances: mesh
                    .primitives()
                    .map(|primitive| self.material(&primitive.material()))
                    .collect(),
            }
        });
        let children = node.children().map(|child| self.node(&child)).collect();
        SceneNode {
            name,
            mesh,
            children,
        }
    }

    fn material(&mut self, material: &gltf::Material<'_>) -> SurfaceHandle {
        let Some(index) = material.index() else {
            return self
                .default_material
                .get_or_insert_with(|| handle(StandardMaterial::new(None, Rgb::new(255, 255, 255))))
                .clone();
        };
        self.materials
            .entry(index)
            .or_insert_with(|| appearance_from(material))
            .clone()
    }
}

fn appearance_from(material: &gltf::Material<'_>) -> SurfaceHandle {
    let label = material.name().map(str::to_string);
    let [r, g, b, alpha] = material.pbr_metallic_roughness().base_color_factor();
    let color = Rgb::from_unit([r, g, b]);
    let transparent = matches!(material.alpha_mode(), AlphaMode::Blend) || alpha < 1.0;

    if material.unlit() {
        return handle(UnlitMaterial::new(label, color).with_alpha(alpha, transparent));
    }
    handle(
        StandardMaterial::new(label, color)
            .with_alpha(alpha, transparent)
            .with_emissive(Rgb::from_unit(material.emissive_factor())),
    )
}
