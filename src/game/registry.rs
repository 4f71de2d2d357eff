//! Entity registry - local mirror of server entities

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::util::vector::Vec2;
use crate::ws::protocol::{BoatUpdate, EntityId, Gate};

/// Registry key. The course lives under its own key so it can never
/// collide with a server-assigned id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKey {
    Id(EntityId),
    Course,
}

/// Boat state, replaced wholesale on every update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boat {
    pub pos: Vec2,
    pub v: Vec2,
    pub theta: f64,
    pub throttle: f64,
    pub length: f64,
}

impl From<&BoatUpdate> for Boat {
    fn from(update: &BoatUpdate) -> Self {
        Self {
            pos: update.pos,
            v: update.v,
            theta: update.theta,
            throttle: update.throttle,
            length: update.length,
        }
    }
}

/// One decaying wake sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WakeSegment {
    pub pos: Vec2,
    pub v: Vec2,
    /// Ticks left before removal
    pub ttl: u32,
}

/// Wake trail behind a boat, oldest sample first
#[derive(Debug, Clone, PartialEq)]
pub struct WakeCurve {
    /// Boat this curve trails; fixed when the curve is created
    pub head_id: EntityId,
    pub segments: Vec<WakeSegment>,
}

/// Race course gates in traversal order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Course {
    pub gates: Vec<Gate>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Boat(Boat),
    WakeCurve(WakeCurve),
    Course(Course),
}

/// Insertion-ordered entity store
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: IndexMap<EntityKey, Entity>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, key: EntityKey) -> Option<&Entity> {
        self.entities.get(&key)
    }

    /// Boat at `id`, if that id currently holds a boat
    pub fn boat(&self, id: EntityId) -> Option<&Boat> {
        match self.get(EntityKey::Id(id)) {
            Some(Entity::Boat(boat)) => Some(boat),
            _ => None,
        }
    }

    pub fn wake_curve(&self, id: EntityId) -> Option<&WakeCurve> {
        match self.get(EntityKey::Id(id)) {
            Some(Entity::WakeCurve(curve)) => Some(curve),
            _ => None,
        }
    }

    pub fn course(&self) -> Option<&Course> {
        match self.get(EntityKey::Course) {
            Some(Entity::Course(course)) => Some(course),
            _ => None,
        }
    }

    /// Replace the boat at `id` entirely
    pub fn upsert_boat(&mut self, id: EntityId, boat: Boat) {
        if let Some(Entity::WakeCurve(_)) = self.get(EntityKey::Id(id)) {
            warn!(entity_id = id, "Boat update replaces a wake curve with the same id");
        }
        // overwrites keep the original insertion position
        self.entities.insert(EntityKey::Id(id), Entity::Boat(boat));
    }

    /// Append a sample to curve `curve_id`, creating the curve bound to
    /// `head_id` on first sight
    pub fn append_wake_segment(&mut self, curve_id: EntityId, head_id: EntityId, segment: WakeSegment) {
        let key = EntityKey::Id(curve_id);
        if let Some(Entity::WakeCurve(curve)) = self.entities.get_mut(&key) {
            if curve.head_id != head_id {
                debug!(
                    curve_id,
                    head_id = curve.head_id,
                    ignored_head_id = head_id,
                    "Wake segment names a different head, keeping original"
                );
            }
            curve.segments.push(segment);
            return;
        }

        if self.entities.contains_key(&key) {
            warn!(entity_id = curve_id, "Wake segment replaces a non-wake entity with the same id");
        }
        self.entities.insert(
            key,
            Entity::WakeCurve(WakeCurve {
                head_id,
                segments: vec![segment],
            }),
        );
    }

    /// Replace the singleton course
    pub fn set_course(&mut self, gates: Vec<Gate>) {
        self.entities
            .insert(EntityKey::Course, Entity::Course(Course { gates }));
    }

    /// Delete an entity. Removing a missing id is a no-op.
    pub fn remove(&mut self, key: EntityKey) -> Option<Entity> {
        // shift, not swap: survivors keep their relative order
        self.entities.shift_remove(&key)
    }

    /// Entities in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (EntityKey, &Entity)> + '_ {
        self.entities.iter().map(|(key, entity)| (*key, entity))
    }

    pub fn for_each<F: FnMut(EntityKey, &Entity)>(&self, mut visitor: F) {
        for (key, entity) in self.iter() {
            visitor(key, entity);
        }
    }

    /// Mutable access to every wake curve, in insertion order
    pub fn wake_curves_mut(&mut self) -> impl Iterator<Item = (EntityKey, &mut WakeCurve)> + '_ {
        self.entities.iter_mut().filter_map(|(key, entity)| match entity {
            Entity::WakeCurve(curve) => Some((*key, curve)),
            _ => None,
        })
    }
}
