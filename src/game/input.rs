//! Input mapping - keys and wheel to control commands and zoom

use std::f64::consts::FRAC_PI_8;
use std::str::FromStr;

use crate::ws::protocol::ClientCommand;

use super::camera::Camera;
use super::registry::Boat;

/// Rudder deflection while a turn key is held
pub const RUDDER_ANGLE: f64 = FRAC_PI_8;
/// Throttle change per keypress
pub const THROTTLE_STEP: f64 = 0.1;

/// Control keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    TurnLeft,
    TurnRight,
    ThrottleUp,
    ThrottleDown,
}

impl FromStr for Key {
    type Err = InputParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" | "a" => Ok(Self::TurnLeft),
            "right" | "d" => Ok(Self::TurnRight),
            "up" | "w" | "increase" => Ok(Self::ThrottleUp),
            "down" | "s" | "decrease" => Ok(Self::ThrottleDown),
            _ => Err(InputParseError::UnknownKey(s.to_string())),
        }
    }
}

/// Raw input events
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    /// Mouse wheel delta; positive scrolls away (zooms out)
    Wheel(f64),
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum InputParseError {
    #[error("Unknown key '{0}'")]
    UnknownKey(String),

    #[error("Invalid wheel delta '{0}'")]
    InvalidDelta(String),

    #[error("Unrecognized input line '{0}'")]
    Unrecognized(String),
}

impl FromStr for InputEvent {
    type Err = InputParseError;

    /// Parse a terminal input line: `press <key>`, `release <key>` or
    /// `wheel <delta>`
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        match (words.next(), words.next(), words.next()) {
            (Some("press"), Some(key), None) => Ok(Self::KeyDown(key.parse()?)),
            (Some("release"), Some(key), None) => Ok(Self::KeyUp(key.parse()?)),
            (Some("wheel"), Some(delta), None) => delta
                .parse::<f64>()
                .map(Self::Wheel)
                .map_err(|_| InputParseError::InvalidDelta(delta.to_string())),
            _ => Err(InputParseError::Unrecognized(line.to_string())),
        }
    }
}

/// Per-axis control state
#[derive(Debug, Clone, Default)]
pub struct InputMapper {
    rudder_theta: f64,
}

impl InputMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last rudder target sent
    pub fn rudder_theta(&self) -> f64 {
        self.rudder_theta
    }

    /// Map one input event. Returns the command to send, if any.
    ///
    /// The two turn keys share one rudder: releasing either key centers it.
    /// Throttle steps are relative to the last throttle the server reported
    /// for `controlled`, so quick repeated presses before an echo resend the
    /// same value instead of accumulating.
    pub fn handle(
        &mut self,
        event: InputEvent,
        controlled: Option<&Boat>,
        camera: &mut Camera,
    ) -> Option<ClientCommand> {
        match event {
            InputEvent::KeyDown(Key::TurnLeft) => self.steer(RUDDER_ANGLE),
            InputEvent::KeyDown(Key::TurnRight) => self.steer(-RUDDER_ANGLE),
            InputEvent::KeyUp(Key::TurnLeft | Key::TurnRight) => self.steer(0.0),
            InputEvent::KeyDown(Key::ThrottleUp) => {
                controlled.map(|boat| ClientCommand::SetThrottle(boat.throttle + THROTTLE_STEP))
            }
            InputEvent::KeyDown(Key::ThrottleDown) => {
                controlled.map(|boat| ClientCommand::SetThrottle(boat.throttle - THROTTLE_STEP))
            }
            InputEvent::KeyUp(Key::ThrottleUp | Key::ThrottleDown) => None,
            InputEvent::Wheel(delta) => {
                camera.zoom(delta);
                None
            }
        }
    }

    fn steer(&mut self, theta: f64) -> Option<ClientCommand> {
        self.rudder_theta = theta;
        Some(ClientCommand::SetRudderTheta(theta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::vector::Vec2;

    fn boat(throttle: f64) -> Boat {
        Boat {
            pos: Vec2::ZERO,
            v: Vec2::ZERO,
            theta: 0.0,
            throttle,
            length: 4.0,
        }
    }

    #[test]
    fn releasing_either_turn_key_centers_rudder() {
        let mut mapper = InputMapper::new();
        let mut camera = Camera::default();
        let sent: Vec<_> = [
            InputEvent::KeyDown(Key::TurnLeft),
            InputEvent::KeyDown(Key::TurnRight),
            InputEvent::KeyUp(Key::TurnLeft),
        ]
        .into_iter()
        .filter_map(|e| mapper.handle(e, None, &mut camera))
        .collect();

        assert_eq!(
            sent,
            vec![
                ClientCommand::SetRudderTheta(RUDDER_ANGLE),
                ClientCommand::SetRudderTheta(-RUDDER_ANGLE),
                ClientCommand::SetRudderTheta(0.0),
            ]
        );
        assert_eq!(mapper.rudder_theta(), 0.0);
    }

    #[test]
    fn throttle_steps_from_server_value() {
        let mut mapper = InputMapper::new();
        let mut camera = Camera::default();
        let controlled = boat(0.4);

        for _ in 0..2 {
            match mapper.handle(InputEvent::KeyDown(Key::ThrottleUp), Some(&controlled), &mut camera) {
                Some(ClientCommand::SetThrottle(t)) => assert!((t - 0.5).abs() < 1e-12),
                other => panic!("unexpected command {other:?}"),
            }
        }

        match mapper.handle(InputEvent::KeyDown(Key::ThrottleDown), Some(&controlled), &mut camera) {
            Some(ClientCommand::SetThrottle(t)) => assert!((t - 0.3).abs() < 1e-12),
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(
            mapper.handle(InputEvent::KeyUp(Key::ThrottleUp), Some(&controlled), &mut camera),
            None
        );
    }

    #[test]
    fn throttle_needs_a_controlled_boat() {
        let mut mapper = InputMapper::new();
        let mut camera = Camera::default();
        assert_eq!(mapper.handle(InputEvent::KeyDown(Key::ThrottleUp), None, &mut camera), None);
    }

    #[test]
    fn wheel_zooms_without_sending() {
        let mut mapper = InputMapper::new();
        let mut camera = Camera::new(10.0);
        assert_eq!(mapper.handle(InputEvent::Wheel(100.0), None, &mut camera), None);
        assert_eq!(camera.pixels_per_meter(), 9.0);
    }

    #[test]
    fn parses_terminal_lines() {
        assert_eq!("press a".parse::<InputEvent>(), Ok(InputEvent::KeyDown(Key::TurnLeft)));
        assert_eq!("release right".parse::<InputEvent>(), Ok(InputEvent::KeyUp(Key::TurnRight)));
        assert_eq!("press increase".parse::<InputEvent>(), Ok(InputEvent::KeyDown(Key::ThrottleUp)));
        assert_eq!("wheel -120".parse::<InputEvent>(), Ok(InputEvent::Wheel(-120.0)));
        assert_eq!(
            "press q".parse::<InputEvent>(),
            Err(InputParseError::UnknownKey("q".to_string()))
        );
        assert!(matches!(
            "wheel lots".parse::<InputEvent>(),
            Err(InputParseError::InvalidDelta(_))
        ));
        assert!(matches!(
            "jump".parse::<InputEvent>(),
            Err(InputParseError::Unrecognized(_))
        ));
    }
}
