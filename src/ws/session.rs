//! WebSocket session - connects, mirrors server state, sends commands

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::app::{ClientState, InputOutcome};
use crate::config::Config;
use crate::game::InputEvent;
use crate::render::{build_frame, Renderer};
use crate::util::time::{frame_interval, Timer};
use crate::ws::transport::{ChannelTransport, TransportError};

/// Counters for one connection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub messages_received: u64,
    pub messages_dropped: u64,
    /// Commands accepted by the outbound queue
    pub commands_sent: u64,
    /// Commands lost to a full or closed queue
    pub commands_dropped: u64,
    /// Input buffered while disconnected, discarded on connect
    pub stale_inputs: u64,
    pub duration_ms: u64,
}

/// Run one connection until the server goes away.
///
/// State, render passes and input handling all run on this task, one event
/// at a time; only the socket writer lives on its own task. A fresh
/// `ClientState` is built for every call. A closed connection ends the
/// session with its stats; only a failed connect is an error.
pub async fn run_session<R: Renderer>(
    config: &Config,
    renderer: &mut R,
    input_rx: &mut mpsc::Receiver<InputEvent>,
) -> Result<SessionStats, TransportError> {
    let (socket, _response) =
        connect_async(config.server_url.as_str())
            .await
            .map_err(|e| TransportError::Connect {
                url: config.server_url.clone(),
                reason: e.to_string(),
            })?;

    info!(url = %config.server_url, "Connected to server");

    let timer = Timer::new();
    let (mut ws_sink, mut ws_stream) = socket.split();
    let (transport, mut outbound_rx) = ChannelTransport::new(config.command_queue);

    // Spawn writer task: queued commands -> WebSocket
    let writer_handle = tokio::spawn(async move {
        while let Some(bytes) = outbound_rx.recv().await {
            let text = match String::from_utf8(bytes.to_vec()) {
                Ok(text) => text,
                Err(e) => {
                    error!(error = %e, "Encoded command is not UTF-8");
                    continue;
                }
            };
            if let Err(e) = ws_sink.send(Message::Text(text.into())).await {
                debug!(error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    let mut state = ClientState::new(config.pixels_per_meter);
    let mut stats = SessionStats::default();

    // Keys pressed while disconnected belong to the old session
    while input_rx.try_recv().is_ok() {
        stats.stale_inputs += 1;
    }
    if stats.stale_inputs > 0 {
        debug!(discarded = stats.stale_inputs, "Discarded input buffered while disconnected");
    }
    let mut frames = interval(frame_interval(config.fps));
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut input_open = true;

    loop {
        tokio::select! {
            msg = ws_stream.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    stats.messages_received += 1;
                    if state.handle_frame(text.as_str().as_bytes()).is_err() {
                        stats.messages_dropped += 1;
                    }
                }
                Some(Ok(Message::Binary(data))) => {
                    stats.messages_received += 1;
                    if state.handle_frame(&data).is_err() {
                        stats.messages_dropped += 1;
                    }
                }
                Some(Ok(Message::Ping(_))) => {
                    debug!("Received ping");
                }
                Some(Ok(Message::Pong(_))) => {
                    debug!("Received pong");
                }
                Some(Ok(Message::Close(frame))) => {
                    info!(?frame, "Server closed connection");
                    break;
                }
                Some(Ok(Message::Frame(_))) => {}
                Some(Err(e)) => {
                    error!(error = %e, "WebSocket error");
                    break;
                }
                None => {
                    debug!("WebSocket stream ended");
                    break;
                }
            },

            event = input_rx.recv(), if input_open => match event {
                Some(event) => match state.handle_input(event, &transport) {
                    InputOutcome::Sent(_) => stats.commands_sent += 1,
                    InputOutcome::Dropped(_) => stats.commands_dropped += 1,
                    InputOutcome::Local => {}
                },
                None => {
                    warn!("Input source closed, continuing without input");
                    input_open = false;
                }
            },

            _ = frames.tick() => {
                match build_frame(&state, config.viewport, config.grid_cell) {
                    Some(frame) => renderer.draw(&frame),
                    None => renderer.clear(),
                }
            }
        }
    }

    // Transport closed: stop the writer, nothing else outlives the session
    writer_handle.abort();

    stats.duration_ms = timer.elapsed_ms();
    info!(
        received = stats.messages_received,
        dropped = stats.messages_dropped,
        commands = stats.commands_sent,
        commands_dropped = stats.commands_dropped,
        duration_ms = stats.duration_ms,
        last_tick = ?state.last_tick(),
        "Connection to server has closed"
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Key;
    use crate::render::Frame;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    /// Counts frames. Can inject one input event on the first drawn frame,
    /// which is guaranteed to happen inside the connected loop.
    #[derive(Default)]
    struct CountingRenderer {
        drawn: usize,
        last_hud: Option<String>,
        inject: Option<(mpsc::Sender<InputEvent>, InputEvent)>,
    }

    impl Renderer for CountingRenderer {
        fn draw(&mut self, frame: &Frame) {
            self.drawn += 1;
            self.last_hud = Some(frame.hud.clone());
            if let Some((tx, event)) = self.inject.take() {
                tx.try_send(event).unwrap();
            }
        }
    }

    fn test_config(port: u16) -> Config {
        Config::from_lookup(|key| match key {
            "SAILSIM_SERVER_URL" => Some(format!("ws://127.0.0.1:{port}")),
            "SAILSIM_FPS" => Some("200".to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn session_mirrors_state_and_sends_commands() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            for frame in [
                r#"["id", 1]"#,
                r#"["set-boat-id", 7]"#,
                r#"["boat-update", {"id": 7, "pos": [5, 5], "v": [0, 0], "theta": 0, "throttle": 0.4, "length": 4}]"#,
                r#"["mystery", null]"#,
            ] {
                ws.send(Message::Text(frame.to_string().into())).await.unwrap();
            }

            let command = loop {
                match ws.next().await {
                    Some(Ok(Message::Text(text))) => break text.as_str().to_string(),
                    Some(Ok(_)) => continue,
                    other => panic!("client went away: {other:?}"),
                }
            };

            // let a few frames render before closing
            tokio::time::sleep(Duration::from_millis(50)).await;
            ws.close(None).await.unwrap();
            command
        });

        let config = test_config(port);
        let (input_tx, mut input_rx) = mpsc::channel(8);
        // pressed before the connection exists: must not reach the server
        input_tx.send(InputEvent::KeyDown(Key::TurnRight)).await.unwrap();
        let mut renderer = CountingRenderer {
            inject: Some((input_tx, InputEvent::KeyDown(Key::TurnLeft))),
            ..Default::default()
        };

        let stats = tokio::time::timeout(
            Duration::from_secs(5),
            run_session(&config, &mut renderer, &mut input_rx),
        )
        .await
        .unwrap()
        .unwrap();

        let command: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert_eq!(command[0], "set-rudder-theta");
        assert!((command[1].as_f64().unwrap() - std::f64::consts::FRAC_PI_8).abs() < 1e-12);

        assert_eq!(stats.messages_received, 4);
        assert_eq!(stats.messages_dropped, 1);
        assert_eq!(stats.commands_sent, 1);
        assert_eq!(stats.commands_dropped, 0);
        assert_eq!(stats.stale_inputs, 1);
        assert!(renderer.drawn > 0);
        assert_eq!(renderer.last_hud.as_deref(), Some("x: 5 y: 5"));
    }

    #[tokio::test]
    async fn connect_failure_is_reported() {
        // bind then drop to get a port nobody listens on
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let config = test_config(port);
        let mut renderer = CountingRenderer::default();
        let (_input_tx, mut input_rx) = mpsc::channel(1);

        let result = run_session(&config, &mut renderer, &mut input_rx).await;
        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }
}
