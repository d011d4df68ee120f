pub mod appearance;
pub mod apply;
pub mod config;
pub mod loader;
pub mod provider;
pub mod registry;
pub mod remote;
pub mod scene;
pub mod session;

pub use appearance::{
    Appearance, Capabilities, StandardMaterial, SurfaceHandle, Transparency, UnlitMaterial,
};
pub use apply::{apply_plan, ApplyReport};
pub use config::{match_policy_from_env, RemoteConfig};
pub use loader::{load, AssetFormat, AssetRef, LoadError, LoadErrorReason};
pub use provider::{AnthropicMessages, LanguageModel, ModelRequest};
pub use registry::{Registry, Surface};
pub use remote::{Interpretation, RemoteInterpreter, ServedBy};
pub use scene::{Mesh, SceneGraph, SceneNode};
pub use session::{AssetSummary, InstructionOutcome, PendingPlan, Session};
