//! WebSocket protocol message definitions
//! Every frame is a JSON pair `[tag, body]`; the body shape depends on the tag.

use bytes::Bytes;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::util::vector::Vec2;

/// Server-assigned entity identifier
pub type EntityId = u64;

pub const TAG_ID: &str = "id";
pub const TAG_SET_BOAT_ID: &str = "set-boat-id";
pub const TAG_BOAT_UPDATE: &str = "boat-update";
pub const TAG_ENV_UPDATE: &str = "env-update";
pub const TAG_WAKE_SEGMENT: &str = "wake-segment";
pub const TAG_COURSE: &str = "course";
pub const TAG_TICK: &str = "tick";
pub const TAG_REMOVE_ENTITY: &str = "remove-entity";

pub const TAG_SET_RUDDER_THETA: &str = "set-rudder-theta";
pub const TAG_SET_THROTTLE: &str = "set-throttle";

/// Full boat state as sent by the server
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BoatUpdate {
    #[serde(deserialize_with = "deserialize_whole")]
    pub id: EntityId,
    /// Position in meters
    pub pos: Vec2,
    /// Velocity in m/s
    #[serde(default)]
    pub v: Vec2,
    /// Heading in radians
    #[serde(default)]
    pub theta: f64,
    /// Server-side throttle setting, echoed back for relative input
    #[serde(default)]
    pub throttle: f64,
    /// Hull length in meters
    #[serde(default)]
    pub length: f64,
}

/// Ambient wind and current. Absent fields leave the previous value in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct EnvUpdate {
    pub wind: Option<Vec2>,
    pub current: Option<Vec2>,
}

/// One wake sample emitted behind a boat
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct WakeSegmentUpdate {
    /// Wake curve identifier
    #[serde(deserialize_with = "deserialize_whole")]
    pub id: EntityId,
    /// Boat the curve trails
    #[serde(rename = "head-id", deserialize_with = "deserialize_whole")]
    pub head_id: EntityId,
    pub pos: Vec2,
    #[serde(default)]
    pub v: Vec2,
    /// Remaining lifetime in ticks
    #[serde(deserialize_with = "deserialize_whole")]
    pub ttl: u32,
}

/// A course gate: the pair of marks a boat passes between
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Gate {
    pub left: Vec2,
    pub right: Vec2,
}

/// Messages received from the server
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// Session identifier assigned
    AssignId(EntityId),
    /// Controlled boat assigned or reassigned
    SetBoatId(EntityId),
    BoatUpdate(BoatUpdate),
    EnvUpdate(EnvUpdate),
    WakeSegment(WakeSegmentUpdate),
    /// Server tick counter; each one advances local decay by one step
    Tick(u64),
    Course(Vec<Gate>),
    RemoveEntity(EntityId),
}

/// Commands sent from client to server
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClientCommand {
    /// Target rudder angle in radians
    SetRudderTheta(f64),
    /// Absolute throttle target
    SetThrottle(f64),
}

impl ClientCommand {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::SetRudderTheta(_) => TAG_SET_RUDDER_THETA,
            Self::SetThrottle(_) => TAG_SET_THROTTLE,
        }
    }

    /// Serialize to the `[tag, value]` wire form
    pub fn encode(&self) -> Result<Bytes, ProtocolError> {
        let value = match *self {
            Self::SetRudderTheta(theta) => theta,
            Self::SetThrottle(throttle) => throttle,
        };
        let json = serde_json::to_vec(&(self.tag(), value))?;
        Ok(Bytes::from(json))
    }
}

/// Protocol errors. None of these end the session.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Malformed '{tag}' body: {reason}")]
    BadBody { tag: &'static str, reason: String },

    #[error("Unrecognized tag '{0}'")]
    UnrecognizedTag(String),
}

/// Decode one inbound frame
pub fn decode(bytes: &[u8]) -> Result<ServerEvent, ProtocolError> {
    let (tag, body): (String, Value) = serde_json::from_slice(bytes)?;

    let event = match tag.as_str() {
        TAG_ID => ServerEvent::AssignId(parse_whole(TAG_ID, &body)?),
        TAG_SET_BOAT_ID => ServerEvent::SetBoatId(parse_whole(TAG_SET_BOAT_ID, &body)?),
        TAG_BOAT_UPDATE => ServerEvent::BoatUpdate(parse_body(TAG_BOAT_UPDATE, body)?),
        TAG_ENV_UPDATE => ServerEvent::EnvUpdate(parse_body(TAG_ENV_UPDATE, body)?),
        TAG_WAKE_SEGMENT => ServerEvent::WakeSegment(parse_body(TAG_WAKE_SEGMENT, body)?),
        TAG_COURSE => ServerEvent::Course(parse_body(TAG_COURSE, body)?),
        TAG_TICK => ServerEvent::Tick(parse_whole(TAG_TICK, &body)?),
        TAG_REMOVE_ENTITY => ServerEvent::RemoveEntity(parse_whole(TAG_REMOVE_ENTITY, &body)?),
        _ => return Err(ProtocolError::UnrecognizedTag(tag)),
    };

    Ok(event)
}

fn parse_body<T: DeserializeOwned>(tag: &'static str, body: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(body).map_err(|e| ProtocolError::BadBody {
        tag,
        reason: e.to_string(),
    })
}

/// Counters and ids arrive as plain JSON numbers, sometimes written as
/// floats (`7.0`). Fractions and negatives are rejected.
fn whole_number(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|n| n.is_finite() && *n >= 0.0 && n.fract() == 0.0 && *n < u64::MAX as f64)
            .map(|n| n as u64)
    })
}

/// Scalar bodies: `id`, `set-boat-id`, `tick`, `remove-entity`
fn parse_whole(tag: &'static str, body: &Value) -> Result<u64, ProtocolError> {
    whole_number(body).ok_or_else(|| ProtocolError::BadBody {
        tag,
        reason: format!("expected a non-negative whole number, got {body}"),
    })
}

/// Field form of `whole_number` for `#[serde(deserialize_with)]`
fn deserialize_whole<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64>,
{
    let value = Value::deserialize(deserializer)?;
    let n = whole_number(&value).ok_or_else(|| {
        de::Error::custom(format!("expected a non-negative whole number, got {value}"))
    })?;
    T::try_from(n).map_err(|_| de::Error::custom(format!("{n} is out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_boat_update() {
        let raw = br#"["boat-update", {"id": 7, "pos": [1.5, -2], "v": [0.5, 0], "theta": 0.25, "throttle": 0.4, "length": 4.2}]"#;
        let event = decode(raw).unwrap();
        assert_eq!(
            event,
            ServerEvent::BoatUpdate(BoatUpdate {
                id: 7,
                pos: Vec2::new(1.5, -2.0),
                v: Vec2::new(0.5, 0.0),
                theta: 0.25,
                throttle: 0.4,
                length: 4.2,
            })
        );
    }

    #[test]
    fn decodes_wake_segment_with_hyphenated_head_id() {
        let raw = br#"["wake-segment", {"id": 100, "head-id": 7, "pos": [0, 0], "v": [1, 1], "ttl": 150}]"#;
        match decode(raw).unwrap() {
            ServerEvent::WakeSegment(seg) => {
                assert_eq!(seg.id, 100);
                assert_eq!(seg.head_id, 7);
                assert_eq!(seg.ttl, 150);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn env_update_fields_are_optional() {
        let raw = br#"["env-update", {"wind": [3, 4]}]"#;
        assert_eq!(
            decode(raw).unwrap(),
            ServerEvent::EnvUpdate(EnvUpdate {
                wind: Some(Vec2::new(3.0, 4.0)),
                current: None,
            })
        );
    }

    #[test]
    fn decodes_scalar_bodies() {
        assert_eq!(decode(br#"["id", 3]"#).unwrap(), ServerEvent::AssignId(3));
        assert_eq!(decode(br#"["set-boat-id", 9]"#).unwrap(), ServerEvent::SetBoatId(9));
        assert_eq!(decode(br#"["remove-entity", 12]"#).unwrap(), ServerEvent::RemoveEntity(12));
        assert_eq!(decode(br#"["tick", 42]"#).unwrap(), ServerEvent::Tick(42));
        assert_eq!(decode(br#"["tick", 42.0]"#).unwrap(), ServerEvent::Tick(42));
    }

    #[test]
    fn decodes_course_in_order() {
        let raw = br#"["course", [{"left": [0, 0], "right": [10, 0]}, {"left": [0, 50], "right": [10, 50]}]]"#;
        match decode(raw).unwrap() {
            ServerEvent::Course(gates) => {
                assert_eq!(gates.len(), 2);
                assert_eq!(gates[1].left, Vec2::new(0.0, 50.0));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn unknown_tag_is_reported_not_fatal() {
        match decode(br#"["state", {}]"#) {
            Err(ProtocolError::UnrecognizedTag(tag)) => assert_eq!(tag, "state"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn malformed_frames_are_errors() {
        assert!(matches!(decode(b"not json"), Err(ProtocolError::Malformed(_))));
        assert!(matches!(decode(br#"{"tag": "tick"}"#), Err(ProtocolError::Malformed(_))));
        assert!(matches!(
            decode(br#"["boat-update", {"pos": [0, 0]}]"#),
            Err(ProtocolError::BadBody { tag: TAG_BOAT_UPDATE, .. })
        ));
        assert!(matches!(
            decode(br#"["tick", -1]"#),
            Err(ProtocolError::BadBody { tag: TAG_TICK, .. })
        ));
    }

    #[test]
    fn whole_number_floats_are_accepted_for_ids_and_ttl() {
        let raw = br#"["wake-segment", {"id": 100.0, "head-id": 7.0, "pos": [0, 0], "ttl": 150.0}]"#;
        match decode(raw).unwrap() {
            ServerEvent::WakeSegment(seg) => {
                assert_eq!(seg.id, 100);
                assert_eq!(seg.head_id, 7);
                assert_eq!(seg.ttl, 150);
            }
            other => panic!("unexpected event {other:?}"),
        }

        let raw = br#"["boat-update", {"id": 7.0, "pos": [0, 0]}]"#;
        match decode(raw).unwrap() {
            ServerEvent::BoatUpdate(update) => assert_eq!(update.id, 7),
            other => panic!("unexpected event {other:?}"),
        }

        assert_eq!(decode(br#"["id", 3.0]"#).unwrap(), ServerEvent::AssignId(3));
        assert_eq!(decode(br#"["set-boat-id", 9.0]"#).unwrap(), ServerEvent::SetBoatId(9));
        assert_eq!(decode(br#"["remove-entity", 12.0]"#).unwrap(), ServerEvent::RemoveEntity(12));
    }

    #[test]
    fn fractional_or_out_of_range_counts_are_malformed() {
        assert!(matches!(
            decode(br#"["set-boat-id", 2.5]"#),
            Err(ProtocolError::BadBody { tag: TAG_SET_BOAT_ID, .. })
        ));
        assert!(matches!(
            decode(br#"["wake-segment", {"id": 1, "head-id": 2, "pos": [0, 0], "ttl": 1.5}]"#),
            Err(ProtocolError::BadBody { tag: TAG_WAKE_SEGMENT, .. })
        ));
        assert!(matches!(
            decode(br#"["wake-segment", {"id": 1, "head-id": 2, "pos": [0, 0], "ttl": 4294967296}]"#),
            Err(ProtocolError::BadBody { tag: TAG_WAKE_SEGMENT, .. })
        ));
    }

    #[test]
    fn encodes_commands_as_tagged_pairs() {
        let rudder = ClientCommand::SetRudderTheta(0.5).encode().unwrap();
        assert_eq!(&rudder[..], br#"["set-rudder-theta",0.5]"#);

        let throttle = ClientCommand::SetThrottle(0.25).encode().unwrap();
        assert_eq!(&throttle[..], br#"["set-throttle",0.25]"#);
    }
}
