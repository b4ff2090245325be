use super::config::{BusyPolicy, SessionConfig};
use super::error::SessionError;
use super::frame::{Frame, Inbound};
use super::messages::{parse_control, ControlMessage, ServerMessage, SkipReason};
use super::stats::{SessionState, SessionStats};
use crate::analysis::{normalize, AnalysisResult};
use crate::inference::{InferenceClient, InferenceError, InferenceHandle};
use futures::future::FutureExt;
use futures::stream::{Stream, StreamExt};
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

type InFlight = Pin<Box<dyn Future<Output = Completion> + Send>>;

/// Outcome of one inference call, tagged with the frame that triggered it
struct Completion {
    frame_number: u64,
    outcome: Result<AnalysisResult, InferenceError>,
}

/// Per-connection state machine
///
/// Owns the session's counters and policy state. Frames are admitted by
/// sampling interval; at most one inference runs at a time and it lives
/// inside the session loop, so ending the session aborts it.
pub struct SessionController {
    config: SessionConfig,

    /// Messages to the client, in processing order
    outbound: mpsc::Sender<ServerMessage>,

    /// Published statistics (state, counters, last result)
    stats: watch::Sender<SessionStats>,

    /// Monotonic count of binary frames received
    frame_counter: u64,

    /// Sampled frame waiting for the in-flight call to finish (`BusyPolicy::Queue`)
    pending: Option<Frame>,

    throttle: ThrottleBackoff,

    /// Session lifetime; every send to the client races against it
    cancel: CancellationToken,
}

impl SessionController {
    pub fn new(config: SessionConfig, outbound: mpsc::Sender<ServerMessage>) -> Self {
        let (stats, _) = watch::channel(SessionStats::new(
            config.session_id.clone(),
            config.sampling_interval,
        ));

        Self {
            config,
            outbound,
            stats,
            frame_counter: 0,
            pending: None,
            throttle: ThrottleBackoff::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.config.session_id
    }

    /// Receiver for statistics updates, for the session registry
    pub fn subscribe(&self) -> watch::Receiver<SessionStats> {
        self.stats.subscribe()
    }

    /// Drive the session until the inbound stream ends, the client stops
    /// reading, or `cancel` fires. Returns the final statistics.
    pub async fn run<S>(
        self,
        inference: &InferenceHandle,
        inbound: S,
        cancel: CancellationToken,
    ) -> SessionStats
    where
        S: Stream<Item = Inbound>,
    {
        let span = info_span!("session", id = %self.config.session_id);
        self.run_inner(inference, inbound, cancel)
            .instrument(span)
            .await
    }

    async fn run_inner<S>(
        mut self,
        inference: &InferenceHandle,
        inbound: S,
        cancel: CancellationToken,
    ) -> SessionStats
    where
        S: Stream<Item = Inbound>,
    {
        futures::pin_mut!(inbound);
        self.cancel = cancel.clone();

        let client = match inference.acquire() {
            Ok(client) => client,
            Err(e) => {
                let err = SessionError::Unavailable(e.to_string());
                error!("{}", err);
                if let Err(e) = self.emit(ServerMessage::connection_error(&err)).await {
                    debug!("Could not report connection error: {}", e);
                }
                self.set_state(SessionState::Closed);
                return self.snapshot();
            }
        };

        self.set_state(SessionState::Ready);
        if self.emit(ServerMessage::connection_established()).await.is_err() {
            self.set_state(SessionState::Closed);
            return self.snapshot();
        }

        info!(
            "Session ready (client={}, interval={})",
            client.name(),
            self.config.sampling_interval
        );

        let mut in_flight: Option<InFlight> = None;

        let ended: Result<(), SessionError> = loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    info!("Session cancelled");
                    break Ok(());
                }

                completion = wait_in_flight(&mut in_flight), if in_flight.is_some() => {
                    in_flight = None;
                    if let Err(e) = self.complete(completion).await {
                        break Err(e);
                    }
                    if let Err(e) = self.resume_pending(&client, &mut in_flight).await {
                        break Err(e);
                    }
                }

                msg = inbound.next() => {
                    let Some(msg) = msg else {
                        break Ok(());
                    };
                    if let Err(e) = self.handle_inbound(msg, &client, &mut in_flight).await {
                        break Err(e);
                    }
                }
            }
        };

        if let Err(e) = ended {
            info!("Session ending: {}", e);
        }

        // Dropping the future aborts the outstanding remote call
        if in_flight.take().is_some() {
            info!("Aborted in-flight inference on disconnect");
        }
        self.pending = None;
        self.set_state(SessionState::Closed);

        let stats = self.snapshot();
        info!(
            "Session closed: {} frames received, {} analyzed, {} skipped, {} errors",
            stats.frames_received, stats.frames_analyzed, stats.frames_skipped, stats.analysis_errors
        );
        stats
    }

    async fn handle_inbound(
        &mut self,
        msg: Inbound,
        client: &Arc<dyn InferenceClient>,
        in_flight: &mut Option<InFlight>,
    ) -> Result<(), SessionError> {
        match msg {
            Inbound::Text(text) => self.handle_text(&text).await,
            Inbound::Binary(data) => self.handle_frame(data, client, in_flight).await,
        }
    }

    async fn handle_text(&mut self, text: &str) -> Result<(), SessionError> {
        match parse_control(text) {
            Ok(ControlMessage::Configure { interval }) => {
                info!(
                    "Sampling interval changed {} -> {}",
                    self.config.sampling_interval, interval
                );
                self.config.sampling_interval = interval;
                self.stats.send_modify(|s| s.sampling_interval = interval);
                self.emit(ServerMessage::ConfigurationAcknowledged { interval })
                    .await
            }
            Err(e) => {
                warn!("Rejected client message: {}", e);
                self.emit(ServerMessage::error(e)).await
            }
        }
    }

    async fn handle_frame(
        &mut self,
        data: Vec<u8>,
        client: &Arc<dyn InferenceClient>,
        in_flight: &mut Option<InFlight>,
    ) -> Result<(), SessionError> {
        self.frame_counter += 1;
        let frame = Frame {
            sequence: self.frame_counter,
            data,
        };
        self.stats.send_modify(|s| s.frames_received += 1);

        if frame.sequence % u64::from(self.config.sampling_interval) != 0 {
            debug!("Frame {} skipped by sampling", frame.sequence);
            return self.skip(frame.sequence, None).await;
        }

        if self.throttle.active() {
            debug!("Frame {} skipped during throttle backoff", frame.sequence);
            return self.skip(frame.sequence, Some(SkipReason::Throttled)).await;
        }

        if in_flight.is_some() {
            return match self.config.busy_policy {
                BusyPolicy::Drop => {
                    debug!("Frame {} dropped, inference in flight", frame.sequence);
                    self.skip(frame.sequence, Some(SkipReason::Busy)).await
                }
                BusyPolicy::Queue => {
                    debug!("Frame {} parked until inference completes", frame.sequence);
                    match self.pending.replace(frame) {
                        Some(old) => self.skip(old.sequence, Some(SkipReason::Superseded)).await,
                        None => Ok(()),
                    }
                }
            };
        }

        *in_flight = Some(self.dispatch(frame, client).await?);
        Ok(())
    }

    /// Dispatch the parked frame, if any, once the previous call has finished
    async fn resume_pending(
        &mut self,
        client: &Arc<dyn InferenceClient>,
        in_flight: &mut Option<InFlight>,
    ) -> Result<(), SessionError> {
        let Some(frame) = self.pending.take() else {
            return Ok(());
        };

        if self.throttle.active() {
            return self.skip(frame.sequence, Some(SkipReason::Throttled)).await;
        }

        *in_flight = Some(self.dispatch(frame, client).await?);
        Ok(())
    }

    async fn dispatch(
        &mut self,
        frame: Frame,
        client: &Arc<dyn InferenceClient>,
    ) -> Result<InFlight, SessionError> {
        self.set_state(SessionState::Processing);
        self.emit(ServerMessage::processing(frame.sequence)).await?;

        info!("Analyzing frame {} ({} bytes)", frame.sequence, frame.data.len());

        let client = Arc::clone(client);
        let timeout = self.config.inference_timeout;

        Ok(Box::pin(async move {
            let call = AssertUnwindSafe(async { client.infer(&frame.data).await }).catch_unwind();

            let outcome = match tokio::time::timeout(timeout, call).await {
                Err(_) => Err(InferenceError::timeout(timeout)),
                Ok(Err(panic)) => Err(InferenceError::Internal(panic_message(panic))),
                Ok(Ok(reply)) => reply.map(|raw| normalize(&raw)),
            };

            Completion {
                frame_number: frame.sequence,
                outcome,
            }
        }))
    }

    async fn complete(&mut self, completion: Completion) -> Result<(), SessionError> {
        self.set_state(SessionState::Ready);
        let frame_number = completion.frame_number;

        match completion.outcome {
            Ok(result) => {
                self.throttle.reset();
                info!(
                    "Frame {} analyzed: level={}, confidence={:.2}",
                    frame_number, result.drowsiness_level, result.confidence
                );
                self.stats.send_modify(|s| {
                    s.frames_analyzed += 1;
                    s.last_result = Some(result.clone());
                });
                self.emit(ServerMessage::Analysis {
                    frame_number,
                    data: result,
                })
                .await
            }
            Err(err) => {
                if let InferenceError::Throttled { retry_after } = &err {
                    let wait = self.throttle.record(
                        *retry_after,
                        self.config.throttle_backoff_base,
                        self.config.throttle_backoff_max,
                    );
                    warn!(
                        "Inference throttled {} time(s) in a row, pausing sampling for {:?}",
                        self.throttle.consecutive, wait
                    );
                } else {
                    self.throttle.reset();
                }

                error!("Frame {} analysis failed: {}", frame_number, err);
                self.stats.send_modify(|s| s.analysis_errors += 1);
                self.emit(ServerMessage::AnalysisError {
                    frame_number,
                    error: err.to_string(),
                })
                .await
            }
        }
    }

    async fn skip(&mut self, frame_number: u64, reason: Option<SkipReason>) -> Result<(), SessionError> {
        self.stats.send_modify(|s| s.frames_skipped += 1);
        self.emit(ServerMessage::skipped(frame_number, reason)).await
    }

    /// Send one message to the client
    ///
    /// A client that stops reading fills the outbound buffer; cancellation
    /// must still end the session while the send is waiting for room.
    async fn emit(&self, msg: ServerMessage) -> Result<(), SessionError> {
        tokio::select! {
            biased;

            _ = self.cancel.cancelled() => Err(SessionError::Cancelled),
            sent = self.outbound.send(msg) => sent.map_err(|_| SessionError::Disconnected),
        }
    }

    fn set_state(&self, state: SessionState) {
        self.stats.send_modify(|s| s.state = state);
    }

    fn snapshot(&self) -> SessionStats {
        self.stats.borrow().clone()
    }
}

async fn wait_in_flight(in_flight: &mut Option<InFlight>) -> Completion {
    match in_flight {
        Some(call) => call.await,
        None => std::future::pending().await,
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "inference task panicked".to_string()
    }
}

/// Exponential pause on repeated rate limiting
#[derive(Debug, Default)]
struct ThrottleBackoff {
    consecutive: u32,
    until: Option<Instant>,
}

impl ThrottleBackoff {
    /// Register one more throttled call and return how long sampling pauses
    fn record(&mut self, retry_after: Option<Duration>, base: Duration, max: Duration) -> Duration {
        self.consecutive = self.consecutive.saturating_add(1);
        let wait = backoff_delay(self.consecutive, base, max);
        let wait = retry_after.map_or(wait, |server| server.max(wait));
        self.until = Some(Instant::now() + wait);
        wait
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn active(&self) -> bool {
        self.until.is_some_and(|until| Instant::now() < until)
    }
}

fn backoff_delay(consecutive: u32, base: Duration, max: Duration) -> Duration {
    let exponent = consecutive.saturating_sub(1).min(16);
    base.saturating_mul(1u32 << exponent).min(max)
}
