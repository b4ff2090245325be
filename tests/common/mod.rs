// Shared fakes for driving the session state machine without a network.

#![allow(dead_code)]

use drowsiness_stream::inference::{InferenceClient, InferenceError, InferenceHandle};
use drowsiness_stream::session::{
    BusyPolicy, Inbound, ServerMessage, SessionConfig, SessionController, SessionStats,
};
use futures::channel::mpsc::{unbounded, UnboundedSender};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const AWAKE_JSON: &str = r#"{"drowsiness_level": "awake", "confidence": 0.92, "observations": ["eyes open", "head upright"], "recommended_action": "continue driving"}"#;

/// What the fake returns for one call
pub enum Reply {
    Text(String),
    Fail(InferenceError),
    /// Never completes; sets the flag when the call is dropped
    Hang(Arc<AtomicBool>),
    /// Completes with the text once the gate is notified
    Gate(Arc<Notify>, String),
    Panic,
}

/// Inference client that plays back a script, then answers `AWAKE_JSON`
pub struct ScriptedInference {
    script: Mutex<VecDeque<Reply>>,
    calls: AtomicUsize,
}

impl ScriptedInference {
    pub fn new(script: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl InferenceClient for ScriptedInference {
    async fn infer(&self, _frame: &[u8]) -> Result<String, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::Text(AWAKE_JSON.to_string()));

        match reply {
            Reply::Text(text) => Ok(text),
            Reply::Fail(err) => Err(err),
            Reply::Hang(dropped) => {
                let _guard = DropFlag(dropped);
                std::future::pending::<Result<String, InferenceError>>().await
            }
            Reply::Gate(gate, text) => {
                gate.notified().await;
                Ok(text)
            }
            Reply::Panic => panic!("scripted inference panic"),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub fn test_config(interval: u32) -> SessionConfig {
    SessionConfig {
        session_id: "test-session".to_string(),
        sampling_interval: interval,
        inference_timeout: Duration::from_secs(5),
        busy_policy: BusyPolicy::Queue,
        throttle_backoff_base: Duration::from_secs(3600),
        throttle_backoff_max: Duration::from_secs(3600),
    }
}

/// A running session wired to in-memory channels
pub struct Harness {
    pub inbound: UnboundedSender<Inbound>,
    pub outbound: mpsc::Receiver<ServerMessage>,
    pub stats: watch::Receiver<SessionStats>,
    pub cancel: CancellationToken,
    pub task: JoinHandle<SessionStats>,
}

impl Harness {
    pub fn start(config: SessionConfig, inference: InferenceHandle) -> Self {
        Self::with_outbound_buffer(config, inference, 64)
    }

    /// Start with a specific outbound capacity, to model a slow reader
    pub fn with_outbound_buffer(
        config: SessionConfig,
        inference: InferenceHandle,
        buffer: usize,
    ) -> Self {
        let (in_tx, in_rx) = unbounded();
        let (out_tx, out_rx) = mpsc::channel(buffer);
        let controller = SessionController::new(config, out_tx);
        let stats = controller.subscribe();
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move { controller.run(&inference, in_rx, token).await });

        Self {
            inbound: in_tx,
            outbound: out_rx,
            stats,
            cancel,
            task,
        }
    }

    pub fn with_client(config: SessionConfig, client: Arc<ScriptedInference>) -> Self {
        Self::start(config, InferenceHandle::ready(client))
    }

    pub fn send_text(&self, text: &str) {
        self.inbound
            .unbounded_send(Inbound::Text(text.to_string()))
            .unwrap();
    }

    pub fn send_frame(&self) {
        self.inbound
            .unbounded_send(Inbound::Binary(vec![0xFF, 0xD8, 0xFF, 0xE0]))
            .unwrap();
    }

    /// Next message from the session, failing the test after 5 seconds
    pub async fn next(&mut self) -> ServerMessage {
        tokio::time::timeout(Duration::from_secs(5), self.outbound.recv())
            .await
            .expect("timed out waiting for server message")
            .expect("session closed the outbound channel")
    }

    /// Skip the greeting
    pub async fn ready(&mut self) {
        let msg = self.next().await;
        assert!(
            matches!(msg, ServerMessage::ConnectionEstablished { .. }),
            "expected connection_established, got {:?}",
            msg
        );
    }
}
