//! Unix domain socket server for IPC
//!
//! Trackers submit frames, the action injector and UIs subscribe to
//! pipeline events. Each connection gets a reader task feeding requests to
//! a writer loop that also forwards notifications, so a partial read is
//! never interrupted by an outgoing event.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tracing::{debug, error, info, warn};

use crate::events::PipelineEvent;
use crate::gesture::ClassificationPolicy;
use crate::pipeline::PipelineInput;

use super::protocol::{DaemonStatus, Request, Response, MAX_MESSAGE_LEN};

/// Connection-level failures
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    #[error("message of {0} bytes exceeds the {MAX_MESSAGE_LEN} byte limit")]
    MessageTooLarge(usize),

    #[error("gesture pipeline is not running")]
    PipelineClosed,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A decoded request, or why it could not be decoded
type Incoming = std::result::Result<Request, serde_json::Error>;

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: Option<UnixListener>,
    shared: Arc<Shared>,
    shutdown_tx: broadcast::Sender<()>,
}

/// State every connection handler can reach
struct Shared {
    state: RwLock<ServerState>,
    pipeline_tx: mpsc::Sender<PipelineInput>,
    events: broadcast::Sender<PipelineEvent>,
}

struct ServerState {
    status: DaemonStatus,
    start_time: std::time::Instant,
}

impl Server {
    /// Create a new IPC server feeding `pipeline_tx` and relaying `events`
    pub fn new(
        socket_path: &Path,
        pipeline_tx: mpsc::Sender<PipelineInput>,
        events: broadcast::Sender<PipelineEvent>,
        policy: ClassificationPolicy,
    ) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Set socket permissions to owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        let status = DaemonStatus {
            policy,
            ..DaemonStatus::default()
        };
        let shared = Arc::new(Shared {
            state: RwLock::new(ServerState {
                status,
                start_time: std::time::Instant::now(),
            }),
            pipeline_tx,
            events,
        });

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener: Some(listener),
            shared,
            shutdown_tx,
        })
    }

    /// Fold a pipeline event into the status snapshot
    pub async fn record_event(&self, event: &PipelineEvent) {
        let mut state = self.shared.state.write().await;
        match event {
            PipelineEvent::ModeChanged { mode, previous, .. } => {
                state.status.mode = *mode;
                info!(from = %previous, to = %mode, "IPC server: mode updated");
            }
            PipelineEvent::GestureConfirmed { gesture } => {
                state.status.last_gesture = Some(*gesture);
            }
            _ => {}
        }
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        let listener = self.listener.as_ref().context("server not initialized")?;

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let shared = Arc::clone(&self.shared);
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(stream, shared) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Handle a single client connection
    async fn handle_client(stream: UnixStream, shared: Arc<Shared>) -> Result<()> {
        let (reader, mut writer) = stream.into_split();
        let (request_tx, mut request_rx) = mpsc::channel::<Incoming>(16);

        let reader_task = tokio::spawn(async move {
            match Self::read_requests(reader, request_tx).await {
                Ok(()) => debug!("client disconnected"),
                Err(e) => warn!(%e, "dropping client"),
            }
        });

        let mut events: Option<broadcast::Receiver<PipelineEvent>> = None;

        let result = loop {
            tokio::select! {
                incoming = request_rx.recv() => {
                    let Some(incoming) = incoming else { break Ok(()) };
                    let response = match incoming {
                        Ok(request) => {
                            debug!(?request, "received request");
                            Self::process_request(request, &shared, &mut events).await
                        }
                        Err(e) => Response::error("bad_request", e.to_string()),
                    };
                    if let Err(e) = Self::send_message(&mut writer, &response).await {
                        break Err(e);
                    }
                }
                event = next_event(&mut events) => {
                    match event {
                        Ok(event) => {
                            let note = Response::Notification { event };
                            if let Err(e) = Self::send_message(&mut writer, &note).await {
                                break Err(e);
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!(skipped = n, "subscriber lagged, events dropped");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            events = None;
                        }
                    }
                }
            }
        };

        reader_task.abort();
        result
    }

    /// Decode length-prefixed requests until EOF
    async fn read_requests(
        mut reader: OwnedReadHalf,
        request_tx: mpsc::Sender<Incoming>,
    ) -> std::result::Result<(), IpcError> {
        let mut len_buf = [0u8; 4];

        loop {
            // Read message length (4-byte little-endian)
            match reader.read_exact(&mut len_buf).await {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
                Err(e) => return Err(e.into()),
            }

            let len = u32::from_le_bytes(len_buf) as usize;
            if len > MAX_MESSAGE_LEN {
                return Err(IpcError::MessageTooLarge(len));
            }

            // Read message body
            let mut msg_buf = vec![0u8; len];
            reader.read_exact(&mut msg_buf).await?;

            let incoming = serde_json::from_slice::<Request>(&msg_buf);
            if request_tx.send(incoming).await.is_err() {
                return Ok(());
            }
        }
    }

    /// Send a length-prefixed JSON message
    async fn send_message<T: serde::Serialize>(writer: &mut OwnedWriteHalf, msg: &T) -> Result<()> {
        let msg_bytes = serde_json::to_vec(msg)?;
        let msg_len = (msg_bytes.len() as u32).to_le_bytes();

        writer.write_all(&msg_len).await?;
        writer.write_all(&msg_bytes).await?;

        Ok(())
    }

    /// Process a request and return a response
    async fn process_request(
        request: Request,
        shared: &Shared,
        events: &mut Option<broadcast::Receiver<PipelineEvent>>,
    ) -> Response {
        match request {
            Request::Ping => Response::Pong,

            Request::GetStatus => {
                let mut state = shared.state.write().await;
                state.status.uptime_secs = state.start_time.elapsed().as_secs();
                Response::Status(state.status.clone())
            }

            Request::Subscribe => {
                if events.is_none() {
                    *events = Some(shared.events.subscribe());
                    debug!("client subscribed to notifications");
                }
                Response::Subscribed
            }

            Request::SubmitFrame { hands } => {
                shared.state.write().await.status.frames_received += 1;
                Self::forward(shared, PipelineInput::Frame(hands)).await
            }

            Request::UndoStroke => Self::forward(shared, PipelineInput::UndoStroke).await,

            Request::ClearStrokes => Self::forward(shared, PipelineInput::ClearStrokes).await,

            Request::GetAnnotations => {
                let (reply_tx, reply_rx) = oneshot::channel();
                if let Response::Error { code, message } =
                    Self::forward(shared, PipelineInput::Snapshot(reply_tx)).await
                {
                    return Response::Error { code, message };
                }
                match reply_rx.await {
                    Ok(snapshot) => Response::Annotations(snapshot),
                    Err(_) => pipeline_closed(),
                }
            }
        }
    }

    /// Queue `input` for the pipeline task, waiting if it is busy
    async fn forward(shared: &Shared, input: PipelineInput) -> Response {
        match shared.pipeline_tx.send(input).await {
            Ok(()) => Response::Accepted,
            Err(_) => pipeline_closed(),
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}

fn pipeline_closed() -> Response {
    Response::error("pipeline_closed", IpcError::PipelineClosed.to_string())
}

/// Next event for a subscribed client; pends forever when not subscribed
async fn next_event(
    events: &mut Option<broadcast::Receiver<PipelineEvent>>,
) -> std::result::Result<PipelineEvent, broadcast::error::RecvError> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::gesture::synthetic_hand as hand;
    use crate::landmarks::Finger;
    use crate::pipeline::{Pipeline, Session};

    async fn write_request(stream: &mut UnixStream, request: &Request) {
        let bytes = serde_json::to_vec(request).unwrap();
        stream
            .write_all(&(bytes.len() as u32).to_le_bytes())
            .await
            .unwrap();
        stream.write_all(&bytes).await.unwrap();
    }

    async fn read_response(stream: &mut UnixStream) -> Response {
        let mut len_buf = [0u8; 4];
        stream.read_exact(&mut len_buf).await.unwrap();
        let mut body = vec![0u8; u32::from_le_bytes(len_buf) as usize];
        stream.read_exact(&mut body).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn socket_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("hushhands-test-{}-{}.sock", name, std::process::id()))
    }

    #[tokio::test]
    async fn test_ping_and_status() {
        let path = socket_path("status");
        let (pipeline_tx, _pipeline_rx) = mpsc::channel(8);
        let (event_tx, _) = broadcast::channel(8);
        let server = Arc::new(
            Server::new(&path, pipeline_tx, event_tx, ClassificationPolicy::MultiLabel).unwrap(),
        );

        let runner = Arc::clone(&server);
        let handle = tokio::spawn(async move { runner.run().await });

        let mut client = UnixStream::connect(&path).await.unwrap();
        write_request(&mut client, &Request::Ping).await;
        assert!(matches!(read_response(&mut client).await, Response::Pong));

        write_request(&mut client, &Request::GetStatus).await;
        match read_response(&mut client).await {
            Response::Status(status) => {
                assert_eq!(status.policy, ClassificationPolicy::MultiLabel);
                assert_eq!(status.frames_received, 0);
            }
            other => panic!("unexpected response: {:?}", other),
        }

        handle.abort();
        server.shutdown().await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_subscriber_receives_frame_events() {
        let path = socket_path("frames");
        let mut config = PipelineConfig::default();
        config.gestures.policy = ClassificationPolicy::MultiLabel;

        let (pipeline_tx, pipeline_rx) = mpsc::channel(8);
        let (event_tx, _) = broadcast::channel(64);
        let mut pipeline = Pipeline::new(Session::new(&config), event_tx.clone());
        tokio::spawn(async move { pipeline.run(pipeline_rx).await });

        let server = Arc::new(
            Server::new(&path, pipeline_tx, event_tx, ClassificationPolicy::MultiLabel).unwrap(),
        );
        let runner = Arc::clone(&server);
        let handle = tokio::spawn(async move { runner.run().await });

        let mut client = UnixStream::connect(&path).await.unwrap();
        write_request(&mut client, &Request::Subscribe).await;
        assert!(matches!(read_response(&mut client).await, Response::Subscribed));

        write_request(
            &mut client,
            &Request::SubmitFrame {
                hands: vec![hand(&[Finger::Index], 1.0)],
            },
        )
        .await;

        // the ack and the notifications may arrive in any order
        let mut got_ack = false;
        let mut got_stroke = false;
        let mut got_summary = false;
        for _ in 0..3 {
            match read_response(&mut client).await {
                Response::Accepted => got_ack = true,
                Response::Notification {
                    event: PipelineEvent::StrokeStarted,
                } => got_stroke = true,
                Response::Notification {
                    event: PipelineEvent::FrameProcessed { frame: 1, .. },
                } => got_summary = true,
                other => panic!("unexpected response: {:?}", other),
            }
        }
        assert!(got_ack && got_stroke && got_summary);

        handle.abort();
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_badly_shaped_frame_is_forwarded() {
        let path = socket_path("shape");
        let (pipeline_tx, mut pipeline_rx) = mpsc::channel(8);
        let (event_tx, _) = broadcast::channel(8);
        let server = Arc::new(
            Server::new(&path, pipeline_tx, event_tx, ClassificationPolicy::Exclusive).unwrap(),
        );
        let runner = Arc::clone(&server);
        let handle = tokio::spawn(async move { runner.run().await });

        let mut client = UnixStream::connect(&path).await.unwrap();
        let body = br#"{"type":"submit_frame","hands":[{"landmarks":[[0.1,0.2]],"handedness":"Right"}]}"#;
        client
            .write_all(&(body.len() as u32).to_le_bytes())
            .await
            .unwrap();
        client.write_all(body).await.unwrap();
        assert!(matches!(read_response(&mut client).await, Response::Accepted));

        match pipeline_rx.recv().await {
            Some(PipelineInput::Frame(hands)) => assert_eq!(hands[0].landmarks.len(), 1),
            other => panic!("unexpected pipeline input: {:?}", other),
        }

        handle.abort();
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_malformed_request_keeps_connection() {
        let path = socket_path("malformed");
        let (pipeline_tx, _pipeline_rx) = mpsc::channel(8);
        let (event_tx, _) = broadcast::channel(8);
        let server = Arc::new(
            Server::new(&path, pipeline_tx, event_tx, ClassificationPolicy::Exclusive).unwrap(),
        );
        let runner = Arc::clone(&server);
        let handle = tokio::spawn(async move { runner.run().await });

        let mut client = UnixStream::connect(&path).await.unwrap();
        let garbage = b"{\"type\":\"nope\"}";
        client
            .write_all(&(garbage.len() as u32).to_le_bytes())
            .await
            .unwrap();
        client.write_all(garbage).await.unwrap();
        assert!(matches!(
            read_response(&mut client).await,
            Response::Error { ref code, .. } if code == "bad_request"
        ));

        write_request(&mut client, &Request::Ping).await;
        assert!(matches!(read_response(&mut client).await, Response::Pong));

        handle.abort();
        server.shutdown().await;
    }
}
