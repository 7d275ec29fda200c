use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use unfollow_logging::{unfollow_debug, unfollow_info};

use crate::api::{ClientSettings, ReqwestApi, UnfollowApi};
use crate::{BatchRequest, EngineError, EngineEvent};

#[derive(Debug, Clone, Copy)]
pub struct EngineTiming {
    /// Period of the per-operation elapsed-time ticker.
    pub ticker_period: Duration,
}

impl Default for EngineTiming {
    fn default() -> Self {
        Self {
            ticker_period: Duration::from_secs(1),
        }
    }
}

enum Request {
    Status,
    RateLimits,
    Operations { seq: u64 },
    StartBatch(BatchRequest),
    Details { operation_id: String },
    Cancel { operation_id: String },
    ClearBatches,
    RefreshToken,
    RetryUserInfo,
}

enum EngineCommand {
    Send(Request),
    /// Runs `request` once `after` has elapsed.
    SendAfter { after: Duration, request: Request },
    ArmPoll { after: Duration },
    CancelPoll,
    RefreshAfter { after: Duration },
    StartTicker { operation_id: String },
    StopTicker { operation_id: String },
}

/// Handle to the background thread that owns the async runtime, the poll
/// timer and the elapsed-time tickers.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl EngineHandle {
    pub fn new(settings: &ClientSettings) -> Result<Self, EngineError> {
        let api = ReqwestApi::new(settings)?;
        Self::with_api(Arc::new(api), EngineTiming::default())
    }

    pub fn with_api(api: Arc<dyn UnfollowApi>, timing: EngineTiming) -> Result<Self, EngineError> {
        let runtime = Runtime::new()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let mut timers = Timers::default();
            while let Ok(command) = cmd_rx.recv() {
                dispatch(&runtime, &api, timing, &mut timers, command, &event_tx);
            }
            timers.shutdown();
            unfollow_debug!("Engine command channel closed");
        });

        Ok(Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        })
    }

    fn send(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }

    pub fn fetch_status(&self) {
        self.send(EngineCommand::Send(Request::Status));
    }

    pub fn fetch_rate_limits(&self) {
        self.send(EngineCommand::Send(Request::RateLimits));
    }

    pub fn poll_operations(&self, seq: u64) {
        self.send(EngineCommand::Send(Request::Operations { seq }));
    }

    pub fn submit_batch(&self, request: BatchRequest) {
        self.send(EngineCommand::Send(Request::StartBatch(request)));
    }

    pub fn fetch_details(&self, operation_id: impl Into<String>) {
        self.send(EngineCommand::Send(Request::Details {
            operation_id: operation_id.into(),
        }));
    }

    pub fn cancel_operation(&self, operation_id: impl Into<String>) {
        self.send(EngineCommand::Send(Request::Cancel {
            operation_id: operation_id.into(),
        }));
    }

    pub fn clear_batches(&self) {
        self.send(EngineCommand::Send(Request::ClearBatches));
    }

    pub fn refresh_token(&self) {
        self.send(EngineCommand::Send(Request::RefreshToken));
    }

    pub fn retry_user_info_after(&self, after: Duration) {
        self.send(EngineCommand::SendAfter {
            after,
            request: Request::RetryUserInfo,
        });
    }

    /// Arms the single poll timer, replacing any timer still pending.
    pub fn arm_poll(&self, after: Duration) {
        self.send(EngineCommand::ArmPoll { after });
    }

    pub fn cancel_poll(&self) {
        self.send(EngineCommand::CancelPoll);
    }

    /// Emits [`EngineEvent::RefreshDue`] after `after`.
    pub fn refresh_after(&self, after: Duration) {
        self.send(EngineCommand::RefreshAfter { after });
    }

    pub fn start_ticker(&self, operation_id: impl Into<String>) {
        self.send(EngineCommand::StartTicker {
            operation_id: operation_id.into(),
        });
    }

    pub fn stop_ticker(&self, operation_id: impl Into<String>) {
        self.send(EngineCommand::StopTicker {
            operation_id: operation_id.into(),
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }
}

#[derive(Default)]
struct Timers {
    poll: Option<CancellationToken>,
    tickers: HashMap<String, CancellationToken>,
}

impl Timers {
    fn shutdown(&mut self) {
        if let Some(token) = self.poll.take() {
            token.cancel();
        }
        for (_, token) in self.tickers.drain() {
            token.cancel();
        }
    }
}

fn dispatch(
    runtime: &Runtime,
    api: &Arc<dyn UnfollowApi>,
    timing: EngineTiming,
    timers: &mut Timers,
    command: EngineCommand,
    event_tx: &mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Send(request) => {
            let api = api.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                let event = perform(api.as_ref(), request).await;
                let _ = event_tx.send(event);
            });
        }
        EngineCommand::SendAfter { after, request } => {
            let api = api.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                tokio::time::sleep(after).await;
                let event = perform(api.as_ref(), request).await;
                let _ = event_tx.send(event);
            });
        }
        EngineCommand::ArmPoll { after } => {
            let token = CancellationToken::new();
            if let Some(previous) = timers.poll.replace(token.clone()) {
                previous.cancel();
            }
            unfollow_debug!("Poll timer armed for {:?}", after);
            runtime.spawn(fire_after(after, token, event_tx.clone(), EngineEvent::PollDue));
        }
        EngineCommand::CancelPoll => {
            if let Some(previous) = timers.poll.take() {
                previous.cancel();
                unfollow_debug!("Poll timer cancelled");
            }
        }
        EngineCommand::RefreshAfter { after } => {
            runtime.spawn(fire_after(
                after,
                CancellationToken::new(),
                event_tx.clone(),
                EngineEvent::RefreshDue,
            ));
        }
        EngineCommand::StartTicker { operation_id } => {
            if timers.tickers.contains_key(&operation_id) {
                return;
            }
            let token = CancellationToken::new();
            timers.tickers.insert(operation_id.clone(), token.clone());
            unfollow_info!("Elapsed ticker started for {}", operation_id);
            runtime.spawn(tick(
                operation_id,
                timing.ticker_period,
                token,
                event_tx.clone(),
            ));
        }
        EngineCommand::StopTicker { operation_id } => {
            if let Some(token) = timers.tickers.remove(&operation_id) {
                token.cancel();
                unfollow_info!("Elapsed ticker stopped for {}", operation_id);
            }
        }
    }
}

async fn perform(api: &dyn UnfollowApi, request: Request) -> EngineEvent {
    match request {
        Request::Status => EngineEvent::StatusLoaded(api.status().await),
        Request::RateLimits => EngineEvent::RateLimitsLoaded(api.rate_limits().await),
        Request::Operations { seq } => EngineEvent::OperationsPolled {
            seq,
            result: api.list_operations().await,
        },
        Request::StartBatch(batch) => EngineEvent::BatchSubmitted(api.start_batch(&batch).await),
        Request::Details { operation_id } => {
            let result = api.operation_details(&operation_id).await;
            EngineEvent::DetailsLoaded {
                operation_id,
                result,
            }
        }
        Request::Cancel { operation_id } => {
            EngineEvent::OperationCancelled(api.cancel_operation(&operation_id).await)
        }
        Request::ClearBatches => EngineEvent::BatchesCleared(api.clear_batches().await),
        Request::RefreshToken => EngineEvent::TokenRefreshed(api.refresh_token().await),
        Request::RetryUserInfo => EngineEvent::UserInfoRetried(api.retry_user_info().await),
    }
}

async fn fire_after(
    after: Duration,
    token: CancellationToken,
    event_tx: mpsc::Sender<EngineEvent>,
    event: EngineEvent,
) {
    tokio::select! {
        _ = token.cancelled() => {}
        _ = tokio::time::sleep(after) => {
            let _ = event_tx.send(event);
        }
    }
}

async fn tick(
    operation_id: String,
    period: Duration,
    token: CancellationToken,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let mut interval = tokio::time::interval(period);
    // The first tick completes immediately.
    interval.tick().await;
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = interval.tick() => {
                let event = EngineEvent::ElapsedTick {
                    operation_id: operation_id.clone(),
                };
                if event_tx.send(event).is_err() {
                    break;
                }
            }
        }
    }
}
