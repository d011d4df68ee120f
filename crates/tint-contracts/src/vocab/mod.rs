mod categories;
mod colors;

pub use categories::{SurfaceCategory, EVERYTHING, SURFACE_CATEGORIES};
pub use colors::{color_or_default, resolve_color, ColorSpec, COLOR_TABLE, DEFAULT_COLOR};
