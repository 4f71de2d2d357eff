//! Client state owned by the session loop

use tracing::{debug, info, warn};

use crate::game::{
    decay, Boat, Camera, EntityKey, EntityRegistry, Environment, InputEvent, InputMapper,
    WakeSegment,
};
use crate::ws::protocol::{self, ClientCommand, EntityId, ProtocolError, ServerEvent};
use crate::ws::transport::OutboundTransport;

/// What became of one input event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputOutcome {
    /// No command: a local zoom change, or nothing to act on
    Local,
    /// Command handed to the transport
    Sent(ClientCommand),
    /// Command produced but not delivered (queue full, transport closed)
    Dropped(ClientCommand),
}

/// Everything the client knows about the current session. Created fresh for
/// each connection and mutated only from the session loop.
#[derive(Debug)]
pub struct ClientState {
    session_id: Option<EntityId>,
    boat_id: Option<EntityId>,
    registry: EntityRegistry,
    environment: Environment,
    camera: Camera,
    input: InputMapper,
    last_tick: Option<u64>,
}

impl ClientState {
    pub fn new(pixels_per_meter: f64) -> Self {
        Self {
            session_id: None,
            boat_id: None,
            registry: EntityRegistry::new(),
            environment: Environment::default(),
            camera: Camera::new(pixels_per_meter),
            input: InputMapper::new(),
            last_tick: None,
        }
    }

    pub fn session_id(&self) -> Option<EntityId> {
        self.session_id
    }

    pub fn boat_id(&self) -> Option<EntityId> {
        self.boat_id
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn last_tick(&self) -> Option<u64> {
        self.last_tick
    }

    pub fn rudder_theta(&self) -> f64 {
        self.input.rudder_theta()
    }

    /// The controlled boat, if one is assigned and currently mirrored
    pub fn controlled_boat(&self) -> Option<(EntityId, &Boat)> {
        let id = self.boat_id?;
        self.registry.boat(id).map(|boat| (id, boat))
    }

    /// Decode and apply one inbound frame. Bad frames are logged and dropped.
    pub fn handle_frame(&mut self, bytes: &[u8]) -> Result<(), ProtocolError> {
        match protocol::decode(bytes) {
            Ok(event) => {
                self.apply(event);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Dropping server message");
                Err(e)
            }
        }
    }

    /// Apply one server event
    pub fn apply(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::AssignId(id) => {
                info!(session_id = id, "Session id assigned");
                self.session_id = Some(id);
            }
            ServerEvent::SetBoatId(id) => {
                info!(boat_id = id, "Controlled boat assigned");
                self.boat_id = Some(id);
            }
            ServerEvent::BoatUpdate(update) => {
                self.registry.upsert_boat(update.id, Boat::from(&update));
            }
            ServerEvent::EnvUpdate(env) => {
                if let Some(wind) = env.wind {
                    self.environment.wind = wind;
                }
                if let Some(current) = env.current {
                    self.environment.current = current;
                }
            }
            ServerEvent::WakeSegment(seg) => {
                self.registry.append_wake_segment(
                    seg.id,
                    seg.head_id,
                    WakeSegment {
                        pos: seg.pos,
                        v: seg.v,
                        ttl: seg.ttl,
                    },
                );
            }
            ServerEvent::Tick(t) => {
                if let Some(last) = self.last_tick {
                    if t != last.wrapping_add(1) {
                        debug!(last_tick = last, tick = t, "Non-consecutive tick");
                    }
                }
                self.last_tick = Some(t);
                decay::step(&mut self.registry);
            }
            ServerEvent::Course(gates) => {
                debug!(gates = gates.len(), "Course replaced");
                self.registry.set_course(gates);
            }
            ServerEvent::RemoveEntity(id) => {
                if self.registry.remove(EntityKey::Id(id)).is_none() {
                    debug!(entity_id = id, "Remove for unknown entity");
                }
            }
        }
    }

    /// Map an input event and send the resulting command, if any. Send
    /// failures are logged; commands are never retried.
    pub fn handle_input<T: OutboundTransport + ?Sized>(
        &mut self,
        event: InputEvent,
        transport: &T,
    ) -> InputOutcome {
        let controlled = self.boat_id.and_then(|id| self.registry.boat(id));
        let Some(command) = self.input.handle(event, controlled, &mut self.camera) else {
            return InputOutcome::Local;
        };

        let bytes = match command.encode() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(command = command.tag(), error = %e, "Failed to encode command");
                return InputOutcome::Dropped(command);
            }
        };

        match transport.send(bytes) {
            Ok(()) => InputOutcome::Sent(command),
            Err(e) => {
                warn!(command = command.tag(), error = %e, "Command not sent");
                InputOutcome::Dropped(command)
            }
        }
    }
}
