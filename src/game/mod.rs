//! Client-side game model: entity mirror, wake decay, camera and input

pub mod camera;
pub mod decay;
pub mod input;
pub mod registry;

pub use camera::{Camera, SampleGrid, ViewTransform, Viewport};
pub use input::{InputEvent, InputMapper, Key};
pub use registry::{Boat, Course, Entity, EntityKey, EntityRegistry, WakeCurve, WakeSegment};

use crate::util::vector::Vec2;

/// Latest ambient wind and current reported by the server. Uniform over
/// the whole map.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Environment {
    pub wind: Vec2,
    pub current: Vec2,
}
