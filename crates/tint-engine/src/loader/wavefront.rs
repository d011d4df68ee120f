use std::path::Path;

use crate::appearance::{handle, StandardMaterial};
use crate::scene::{Mesh, SceneNode};

/// Decodes OBJ geometry. Material libraries are not followed: every object
/// gets its own opaque gray `Default_Material`.
pub(super) fn decode(bytes: &[u8]) -> Result<Vec<SceneNode>, String> {
    let mut reader = bytes;
    let (models, _materials) = tobj::load_obj_buf(
        &mut reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |_: &Path| Err(tobj::LoadError::OpenFileFailed),
    )
    .map_err(|err| err.to_string())?;

    let children = models
        .into_iter()
        .map(|model| SceneNode {
            name: model.name.clone(),
            mesh: Some(Mesh {
                name: model.name,
                appearances: vec![handle(StandardMaterial::default_gray())],
            }),
            children: Vec::new(),
        })
        .collect();
    Ok(vec![SceneNode {
        name: String::new(),
        mesh: None,
        children,
    }])
}
