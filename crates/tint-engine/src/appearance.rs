use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tint_contracts::color::Rgb;

pub const DEFAULT_MATERIAL_NAME: &str = "Default_Material";

/// Live, shared appearance. Several meshes (and several registry names) may
/// point at the same handle.
pub type SurfaceHandle = Arc<Mutex<dyn Appearance>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transparency {
    pub transparent: bool,
    pub opacity: f32,
}

impl Transparency {
    pub fn opaque() -> Self {
        Self {
            transparent: false,
            opacity: 1.0,
        }
    }

    pub fn is_translucent(&self) -> bool {
        self.opacity < 1.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub color: bool,
    pub transparency: bool,
    pub emissive: bool,
}

/// Paintable surface appearance. Optional capabilities default to absent;
/// `capabilities()` reports which ones an implementation provides.
pub trait Appearance: fmt::Debug + Send {
    fn kind(&self) -> &'static str;

    /// Authored name, if the asset provided a non-empty one.
    fn label(&self) -> Option<&str>;

    fn color(&self) -> Option<Rgb> {
        None
    }

    /// Returns false when the appearance has no color.
    fn set_color(&mut self, _color: Rgb) -> bool {
        false
    }

    fn transparency(&self) -> Option<Transparency> {
        None
    }

    fn set_transparent(&mut self, _transparent: bool) -> bool {
        false
    }

    fn emissive(&self) -> Option<Rgb> {
        None
    }

    fn needs_update(&self) -> bool;

    fn set_needs_update(&mut self, value: bool);

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            color: self.color().is_some(),
            transparency: self.transparency().is_some(),
            emissive: self.emissive().is_some(),
        }
    }
}

pub fn handle<A: Appearance + 'static>(appearance: A) -> SurfaceHandle {
    Arc::new(Mutex::new(appearance))
}

/// Every write through a guard leaves the appearance consistent, so a
/// poisoned lock is still safe to read.
pub(crate) fn lock(handle: &SurfaceHandle) -> MutexGuard<'_, dyn Appearance + 'static> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

fn non_empty_label(label: Option<String>) -> Option<String> {
    label
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Lit PBR material: color, transparency and emissive.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardMaterial {
    label: Option<String>,
    base_color: Rgb,
    transparency: Transparency,
    emissive: Rgb,
    needs_update: bool,
}

impl StandardMaterial {
    pub fn new(label: Option<String>, base_color: Rgb) -> Self {
        Self {
            label: non_empty_label(label),
            base_color,
            transparency: Transparency::opaque(),
            emissive: Rgb::new(0, 0, 0),
            needs_update: false,
        }
    }

    /// Opaque mid-gray stand-in for meshes that carry no material.
    pub fn default_gray() -> Self {
        Self::new(
            Some(DEFAULT_MATERIAL_NAME.to_string()),
            Rgb::new(0x80, 0x80, 0x80),
        )
    }

    pub fn with_alpha(mut self, opacity: f32, transparent: bool) -> Self {
        self.transparency = Transparency {
            transparent,
            opacity: opacity.clamp(0.0, 1.0),
        };
        self
    }

    pub fn with_emissive(mut self, emissive: Rgb) -> Self {
        self.emissive = emissive;
        self
    }
}

impl Appearance for StandardMaterial {
    fn kind(&self) -> &'static str {
        "standard"
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn color(&self) -> Option<Rgb> {
        Some(self.base_color)
    }

    fn set_color(&mut self, color: Rgb) -> bool {
        self.base_color = color;
        true
    }

    fn transparency(&self) -> Option<Transparency> {
        Some(self.transparency)
    }

    fn set_transparent(&mut self, transparent: bool) -> bool {
        self.transparency.transparent = transparent;
        true
    }

    fn emissive(&self) -> Option<Rgb> {
        Some(self.emissive)
    }

    fn needs_update(&self) -> bool {
        self.needs_update
    }

    fn set_needs_update(&mut self, value: bool) {
        self.needs_update = value;
    }
}

/// Shadeless material (`KHR_materials_unlit`): no emissive term.
#[derive(Debug, Clone, PartialEq)]
pub struct UnlitMaterial {
    label: Option<String>,
    base_color: Rgb,
    transparency: Transparency,
    needs_update: bool,
}

impl UnlitMaterial {
    pub fn new(label: Option<String>, base_color: Rgb) -> Self {
        Self {
            label: non_empty_label(label),
            base_color,
            transparency: Transparency::opaque(),
            needs_update: false,
        }
    }

    pub fn with_alpha(mut self, opacity: f32, transparent: bool) -> Self {
        self.transparency = Transparency {
            transparent,
            opacity: opacity.clamp(0.0, 1.0),
        };
        self
    }
}

impl Appearance for UnlitMaterial {
    fn kind(&self) -> &'static str {
        "unlit"
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn color(&self) -> Option<Rgb> {
        Some(self.base_color)
    }

    fn set_color(&mut self, color: Rgb) -> bool {
        self.base_color = color;
        true
    }

    fn transparency(&self) -> Option<Transparency> {
        Some(self.transparency)
    }

    fn set_transparent(&mut self, transparent: bool) -> bool {
        self.transparency.transparent = transparent;
        true
    }

    fn needs_update(&self) -> bool {
        self.needs_update
    }

    fn set_needs_update(&mut self, value: bool) {
        self.needs_update = value;
    }
}
