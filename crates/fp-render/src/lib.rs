pub mod hit;
pub mod layout;

pub use hit::hit_test;
pub use layout::{OverlayItem, layout_overlay};
