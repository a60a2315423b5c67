pub mod config;
pub mod geometry;
pub mod id;
pub mod model;
pub mod registry;
pub mod resolve;
pub mod units;

pub use config::{ControlConfig, EngineConfig, Ownership};
pub use geometry::{PageGeometry, PageLayout};
pub use id::{IdGenerator, InstanceId};
pub use model::*;
pub use registry::FieldRegistry;
pub use resolve::{FieldResolver, PaletteEntry, display_text};
pub use units::{Zoom, fit_scale, pixels_to_points, points_to_pixels};

// Re-export kurbo types so downstream crates share one geometry vocabulary
pub use kurbo::{Point, Rect, Size, Vec2};
