mod indexed;
mod wavefront;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use reqwest::blocking::Client as HttpClient;
use sha2::{Digest, Sha256};

use crate::scene::SceneGraph;

/// Where asset bytes come from. Transient handles (generated in memory,
/// `blob:` style) carry their bytes and no reliable extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetRef {
    Path(PathBuf),
    Url(String),
    Transient { label: String, bytes: Vec<u8> },
}

impl AssetRef {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lowered = trimmed.to_ascii_lowercase();
        if lowered.starts_with("http://")
            || lowered.starts_with("https://")
            || lowered.starts_with("blob:")
        {
            return Self::Url(trimmed.to_string());
        }
        Self::Path(PathBuf::from(trimmed))
    }

    pub fn transient(label: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::Transient {
            label: label.into(),
            bytes,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Url(url) => url.clone(),
            Self::Transient { label, .. } => label.clone(),
        }
    }

    fn extension(&self) -> Option<String> {
        let file_name = match self {
            Self::Path(path) => path.file_name()?.to_str()?.to_string(),
            Self::Url(url) => {
                let without_query = url.split(['?', '#']).next().unwrap_or_default();
                without_query.rsplit('/').next()?.to_string()
            }
            Self::Transient { .. } => return None,
        };
        Path::new(&file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }

    fn is_blob(&self) -> bool {
        matches!(self, Self::Url(url) if url.to_ascii_lowercase().starts_with("blob:"))
    }
}

/// Format A is glTF 2.0 (binary `.glb` or JSON `.gltf`), format B is
/// Wavefront OBJ geometry without materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetFormat {
    Gltf,
    Obj,
}

impl AssetFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "glb" | "gltf" => Some(Self::Gltf),
            "obj" => Some(Self::Obj),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gltf => "gltf",
            Self::Obj => "obj",
        }
    }
}

impl fmt::Display for AssetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetFormat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::from_extension(raw).ok_or_else(|| format!("unsupported asset format '{raw}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorReason {
    Network,
    Decode,
    UnsupportedFormat,
}

impl LoadErrorReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Decode => "decode",
            Self::UnsupportedFormat => "unsupported_format",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("could not fetch asset {asset}: {details}")]
    Network { asset: String, details: String },
    #[error("could not decode {format} asset {asset}: {details}")]
    Decode {
        asset: String,
        format: AssetFormat,
        details: String,
    },
    #[error("unsupported asset format '{extension}' for {asset}")]
    UnsupportedFormat { asset: String, extension: String },
}

impl LoadError {
    pub fn reason(&self) -> LoadErrorReason {
        match self {
            Self::Network { .. } => LoadErrorReason::Network,
            Self::Decode { .. } => LoadErrorReason::Decode,
            Self::UnsupportedFormat { .. } => LoadErrorReason::UnsupportedFormat,
        }
    }
}

/// An explicit hint wins; references without a usable extension are assumed
/// to be glTF binaries, which is what the generation pipeline emits.
pub fn resolve_format(
    asset: &AssetRef,
    hint: Option<AssetFormat>,
) -> Result<AssetFormat, LoadError> {
    if let Some(format) = hint {
        return Ok(format);
    }
    if asset.is_blob() {
        return Ok(AssetFormat::Gltf);
    }
    let Some(ext) = asset.extension() else {
        return Ok(AssetFormat::Gltf);
    };
    AssetFormat::from_extension(&ext).ok_or_else(|| LoadError::UnsupportedFormat {
        asset: asset.label(),
        extension: ext,
    })
}

pub fn fetch_bytes(asset: &AssetRef) -> Result<Vec<u8>, LoadError> {
    let network = |details: String| LoadError::Network {
        asset: asset.label(),
        details,
    };
    match asset {
        AssetRef::Path(path) => std::fs::read(path).map_err(|err| network(err.to_string())),
        AssetRef::Transient { bytes, .. } => Ok(bytes.clone()),
        AssetRef::Url(_) if asset.is_blob() => Err(network(
            "blob handles must be passed as transient bytes".to_string(),
        )),
        AssetRef::Url(url) => {
            let response = HttpClient::new()
                .get(url)
                .send()
                .map_err(|err| network(err.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(network(format!("HTTP {}", status.as_u16())));
            }
            response
                .bytes()
                .map(|body| body.to_vec())
                .map_err(|err| network(err.to_string()))
        }
    }
}

pub fn decode(
    bytes: &[u8],
    format: AssetFormat,
    source: impl Into<String>,
) -> Result<SceneGraph, LoadError> {
    let source = source.into();
    let roots = match format {
        AssetFormat::Gltf => indexed::decode(bytes),
        AssetFormat::Obj => wavefront::decode(bytes),
    }
    .map_err(|details| LoadError::Decode {
        asset: source.clone(),
        format,
        details,
    })?;
    Ok(SceneGraph {
        source,
        format,
        digest: hex::encode(Sha256::digest(bytes)),
        roots,
    })
}

pub fn load(asset: &AssetRef, hint: Option<AssetFormat>) -> Result<SceneGraph, LoadError> {
    let format = resolve_format(asset, hint)?;
    let bytes = fetch_bytes(asset)?;
    decode(&bytes, format, asset.label())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{json, Value};

    /// Two-node shoe: a named sole material, an anonymous two-primitive upper
    /// and a translucent unlit logo.
    pub fn shoe_gltf_json() -> Value {
        json!({
            "asset": {"version": "2.0"},
            "extensionsUsed": ["KHR_materials_unlit"],
            "scene": 0,
            "scenes": [{"nodes": [0, 1]}],
            "nodes": [
                {"name": "Sole", "mesh": 0},
                {"name": "Upper", "mesh": 1, "children": [2]},
                {"name": "Logo", "mesh": 2}
            ],
            "meshes": [
                {"name": "sole_mesh", "primitives": [{"attributes": {"POSITION": 0}, "material": 0}]},
                {"name": "upper_mesh", "primitives": [
                    {"attributes": {"POSITION": 0}, "material": 1},
                    {"attributes": {"POSITION": 0}}
                ]},
                {"primitives": [{"attributes": {"POSITION": 0}, "material": 2}]}
            ],
            "materials": [
                {"name": "outsole_mat", "pbrMetallicRoughness": {"baseColorFactor": [1.0, 1.0, 1.0, 1.0]}},
                {"pbrMetallicRoughness": {"baseColorFactor": [0.0, 0.0, 1.0, 1.0]}, "emissiveFactor": [1.0, 0.0, 0.0]},
                {
                    "name": "logo_mat",
                    "alphaMode": "BLEND",
                    "pbrMetallicRoughness": {"baseColorFactor": [0.0, 0.0, 0.0, 0.5]},
                    "extensions": {"KHR_materials_unlit": {}}
                }
            ],
            "buffers": [{"byteLength": 36, "uri": "shoe.bin"}],
            "bufferViews": [{"buffer": 0, "byteLength": 36}],
            "accessors": [
                {
                    "bufferView": 0,
                    "componentType": 5126,
                    "count": 3,
                    "type": "VEC3",
                    "min": [0.0, 0.0, 0.0],
                    "max": [1.0, 1.0, 1.0]
                }
            ]
        })
    }

    /// Minimal GLB container: header plus a JSON chunk, no binary chunk.
    pub fn glb_from_json(document: &Value) -> Vec<u8> {
        let mut chunk = serde_json::to_vec(document).unwrap_or_default();
        while chunk.len() % 4 != 0 {
            chunk.push(b' ');
        }
        let total = 12 + 8 + chunk.len();
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(b"glTF");
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
        out.extend_from_slice(b"JSON");
        out.extend_from_slice(&chunk);
        out
    }

    pub const TWO_OBJECT_OBJ: &str = "\
o Sole
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
o Upper
v 0 0 1
v 1 0 1
v 0 1 1
f 4 5 6
";
}
