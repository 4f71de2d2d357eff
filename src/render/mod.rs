//! Frame building and the renderer capability
//!
//! The client never touches pixels. Each frame it hands a renderer the camera
//! transform plus world-space geometry for every entity, in registry order.

use tracing::trace;

use crate::app::ClientState;
use crate::game::decay::wake_fade;
use crate::game::{Entity, EntityKey, ViewTransform, Viewport};
use crate::util::vector::{normalize, rotate, Vec2};
use crate::ws::protocol::{EntityId, Gate};

/// Overlay arrows never grow past this fraction of a grid cell
pub const ARROW_CELL_FRACTION: f64 = 0.8;

/// A line segment with a pointed end at `to`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrow {
    pub from: Vec2,
    pub to: Vec2,
}

impl Arrow {
    /// Arrow from `origin` along `vector`, length capped at `max_len`
    pub fn capped(origin: Vec2, vector: Vec2, max_len: f64) -> Self {
        let len = vector.length().min(max_len);
        Self {
            from: origin,
            to: origin + normalize(vector) * len,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoatShape {
    pub id: EntityId,
    pub pos: Vec2,
    pub theta: f64,
    /// Hull endpoints along the heading
    pub bow: Vec2,
    pub stern: Vec2,
    /// Velocity indicator, one second ahead
    pub velocity: Arrow,
    pub controlled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WakePoint {
    pub pos: Vec2,
    /// Opacity in [0, 1]
    pub fade: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WakeShape {
    pub id: EntityId,
    /// Oldest first
    pub points: Vec<WakePoint>,
    /// Position of the boat the trail connects to; `None` when that boat is
    /// not in the registry
    pub head: Option<Vec2>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawItem {
    Boat(BoatShape),
    Wake(WakeShape),
    Course(Vec<Gate>),
}

/// Everything a renderer needs for one pass
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub viewport: Viewport,
    pub transform: ViewTransform,
    pub items: Vec<DrawItem>,
    pub wind_arrows: Vec<Arrow>,
    pub current_arrows: Vec<Arrow>,
    /// Position readout for the controlled boat
    pub hud: String,
}

/// Drawing backend
pub trait Renderer {
    fn draw(&mut self, frame: &Frame);

    /// Called instead of `draw` while there is no controlled boat to anchor
    /// the camera on
    fn clear(&mut self) {}
}

/// Build the frame for the current state. Returns `None` until the
/// controlled boat is known.
pub fn build_frame(state: &ClientState, viewport: Viewport, grid_cell: f64) -> Option<Frame> {
    let (boat_id, anchor) = state.controlled_boat()?;
    let camera = state.camera();
    let registry = state.registry();

    let mut items = Vec::with_capacity(registry.len());
    registry.for_each(|key, entity| match (key, entity) {
        (EntityKey::Id(id), Entity::Boat(boat)) => {
            let half_hull = rotate(Vec2::new(boat.length / 2.0, 0.0), boat.theta);
            items.push(DrawItem::Boat(BoatShape {
                id,
                pos: boat.pos,
                theta: boat.theta,
                bow: boat.pos + half_hull,
                stern: boat.pos - half_hull,
                velocity: Arrow {
                    from: boat.pos,
                    to: boat.pos + boat.v,
                },
                controlled: id == boat_id,
            }));
        }
        (EntityKey::Id(id), Entity::WakeCurve(curve)) => {
            let head = registry.boat(curve.head_id).map(|b| b.pos);
            if head.is_none() {
                trace!(curve_id = id, head_id = curve.head_id, "Wake head not in registry");
            }
            items.push(DrawItem::Wake(WakeShape {
                id,
                points: curve
                    .segments
                    .iter()
                    .map(|s| WakePoint {
                        pos: s.pos,
                        fade: wake_fade(s.ttl),
                    })
                    .collect(),
                head,
            }));
        }
        (_, Entity::Course(course)) => items.push(DrawItem::Course(course.gates.clone())),
        (EntityKey::Course, other) => {
            trace!(entity = ?other, "Unexpected entity under course key");
        }
    });

    let grid = camera.sample_grid(anchor.pos, viewport, grid_cell);
    let max_len = grid.cell * ARROW_CELL_FRACTION;
    let env = state.environment();
    let wind_arrows = grid.points().map(|p| Arrow::capped(p, env.wind, max_len)).collect();
    let current_arrows = grid
        .points()
        .map(|p| Arrow::capped(p, env.current, max_len))
        .collect();

    Some(Frame {
        viewport,
        transform: camera.transform(anchor.pos, viewport),
        items,
        wind_arrows,
        current_arrows,
        hud: position_readout(anchor.pos),
    })
}

/// `x: 12.34 y: -5.67`, each coordinate cut to five characters
pub fn position_readout(pos: Vec2) -> String {
    fn short(v: f64) -> String {
        v.to_string().chars().take(5).collect()
    }
    format!("x: {} y: {}", short(pos.x), short(pos.y))
}

/// Renderer that only logs frame summaries
#[derive(Debug, Default)]
pub struct LogRenderer {
    frames: u64,
}

impl LogRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for LogRenderer {
    fn draw(&mut self, frame: &Frame) {
        self.frames += 1;
        trace!(
            frame = self.frames,
            items = frame.items.len(),
            arrows = frame.wind_arrows.len(),
            scale = frame.transform.scale,
            hud = %frame.hud,
            "Frame"
        );
    }
}
