use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use tokio::sync::{broadcast, watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::client::ZidooClient;
use crate::events::{LifecycleState, MediaType, PlayerSnapshot, PowerState, ZidooEvent};
use crate::playback::PlaybackRecord;
use crate::settings::SETTINGS;
use crate::ZidooError;

const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Poll cadence and refresh debounce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Used while the device is off.
    pub idle_interval: Duration,
    /// Used whenever the device is on.
    pub active_interval: Duration,
    /// Manual refreshes inside this window collapse into one tick.
    pub refresh_cooldown: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            idle_interval: SETTINGS.poll_idle_interval,
            active_interval: SETTINGS.poll_active_interval,
            refresh_cooldown: SETTINGS.refresh_cooldown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollState {
    pub interval: Duration,
    pub last_tick: Option<Instant>,
    pub last_observed_power: Option<PowerState>,
}

/// Drives one client on an adaptive schedule and publishes what it sees.
pub struct PollCoordinator {
    client: Arc<Mutex<ZidooClient>>,
    settings: PollSettings,
    state: PollState,
    lifecycle: LifecycleState,
    last_record: PlaybackRecord,
    was_connected: bool,
    source_list: Vec<String>,
    snapshot_tx: watch::Sender<PlayerSnapshot>,
    event_tx: broadcast::Sender<ZidooEvent>,
}

impl PollCoordinator {
    pub fn new(client: ZidooClient, settings: PollSettings) -> Self {
        Self::with_shared_client(Arc::new(Mutex::new(client)), settings)
    }

    /// Polls a client that is also used elsewhere. All access goes through the mutex.
    pub fn with_shared_client(client: Arc<Mutex<ZidooClient>>, settings: PollSettings) -> Self {
        let (snapshot_tx, _) = watch::channel(PlayerSnapshot::default());
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            client,
            settings,
            state: PollState {
                interval: settings.idle_interval,
                last_tick: None,
                last_observed_power: None,
            },
            lifecycle: LifecycleState::Off,
            last_record: PlaybackRecord::empty(),
            was_connected: false,
            source_list: Vec::new(),
            snapshot_tx,
            event_tx,
        }
    }

    pub fn client(&self) -> Arc<Mutex<ZidooClient>> {
        self.client.clone()
    }

    pub fn settings(&self) -> PollSettings {
        self.settings
    }

    pub fn poll_state(&self) -> PollState {
        self.state
    }

    pub fn lifecycle(&self) -> LifecycleState {
        self.lifecycle
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    pub fn subscribe_snapshots(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn event_receiver(&self) -> broadcast::Receiver<ZidooEvent> {
        self.event_tx.subscribe()
    }

    /// One poll: reconnect if the device is on, read now-playing, derive
    /// the lifecycle and pick the interval for the following tick.
    pub async fn tick(&mut self) -> LifecycleState {
        let mut client = self.client.lock().await;

        if !client.is_connected() {
            let power = client.get_power_status().await;
            self.state.last_observed_power = Some(power);
            match power {
                PowerState::On => {
                    if let Err(e) = client.connect().await {
                        debug!(error = %e, "Reconnect failed");
                    }
                }
                PowerState::Off => trace!("Player is off, not reconnecting"),
            }
        }

        let mut record = PlaybackRecord::empty();
        let mut state = LifecycleState::Off;
        if client.is_connected() {
            record = client.get_playing_info().await;
            // retries ran out during the poll
            if client.is_connected() {
                state = LifecycleState::from_record(&record);
            } else {
                record = PlaybackRecord::empty();
            }
        }
        let connected = client.is_connected();
        if connected {
            self.state.last_observed_power = Some(PowerState::On);
        }

        if connected && self.source_list.is_empty() {
            self.source_list = client.load_source_list().await;
        }

        let mut snapshot = PlayerSnapshot {
            state,
            record: record.clone(),
            media_type: None,
            source: client.get_source().map(str::to_string),
            source_list: self.source_list.clone(),
            audio_output: client.current_audio_output().map(str::to_string),
            audio_output_list: client.audio_output_names(),
            last_updated: self.snapshot_tx.borrow().last_updated,
        };
        drop(client);

        if connected {
            snapshot.media_type = Some(MediaType::from_record(&record));
            if !record.is_empty() {
                snapshot.last_updated = Some(Utc::now());
            }
        }

        self.publish_transitions(connected, state, &record);

        self.state.interval = if state.is_off() {
            self.settings.idle_interval
        } else {
            self.settings.active_interval
        };
        self.state.last_tick = Some(Instant::now());
        self.lifecycle = state;
        self.last_record = record;
        self.snapshot_tx.send_replace(snapshot);
        state
    }

    fn publish_transitions(
        &mut self,
        connected: bool,
        state: LifecycleState,
        record: &PlaybackRecord,
    ) {
        if connected != self.was_connected {
            let event = if connected {
                ZidooEvent::Connected
            } else {
                ZidooEvent::Disconnected
            };
            let _ = self.event_tx.send(event);
            self.was_connected = connected;
        }

        if state != self.lifecycle {
            info!(from = ?self.lifecycle, to = ?state, "Player state changed");
            let _ = self.event_tx.send(ZidooEvent::StateChanged(state));
        }

        let media_changed = record.source != self.last_record.source
            || record.uri != self.last_record.uri
            || record.title != self.last_record.title;
        if media_changed {
            debug!(source = ?record.source, uri = ?record.uri, "Media changed");
            let _ = self.event_tx.send(ZidooEvent::MediaChanged(record.clone()));
        }
    }

    /// Moves the coordinator onto its own task.
    pub fn spawn(self) -> CoordinatorHandle {
        let shutdown = CancellationToken::new();
        let refresh = Arc::new(Notify::new());
        let client = self.client.clone();
        let snapshot_rx = self.snapshot_tx.subscribe();
        let event_tx = self.event_tx.clone();
        let task = tokio::spawn(self.run(shutdown.clone(), refresh.clone()));
        CoordinatorHandle {
            client,
            shutdown,
            refresh,
            snapshot_rx,
            event_tx,
            task: Some(task),
        }
    }

    fn ticker(start: Instant, period: Duration) -> Interval {
        let mut ticker = interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    }

    async fn run(mut self, shutdown: CancellationToken, refresh: Arc<Notify>) {
        let mut period = self.state.interval;
        let mut ticker = Self::ticker(Instant::now(), period);
        debug!(?period, "Poll loop started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = refresh.notified() => {
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = sleep(self.settings.refresh_cooldown) => {}
                    }
                    // requests made during the cooldown ride along
                    while refresh.notified().now_or_never().is_some() {}
                    trace!("Manual refresh");
                    self.tick().await;
                    ticker.reset();
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }

            if self.state.interval != period {
                period = self.state.interval;
                ticker = Self::ticker(Instant::now() + period, period);
                debug!(?period, "Poll interval changed");
            }
        }

        debug!("Poll loop stopped");
    }
}

impl std::fmt::Debug for PollCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollCoordinator")
            .field("settings", &self.settings)
            .field("state", &self.state)
            .field("lifecycle", &self.lifecycle)
            .finish_non_exhaustive()
    }
}

/// Control surface of a running coordinator. Dropping it stops polling.
pub struct CoordinatorHandle {
    client: Arc<Mutex<ZidooClient>>,
    shutdown: CancellationToken,
    refresh: Arc<Notify>,
    snapshot_rx: watch::Receiver<PlayerSnapshot>,
    event_tx: broadcast::Sender<ZidooEvent>,
    task: Option<JoinHandle<()>>,
}

impl CoordinatorHandle {
    /// Asks for an out-of-schedule poll. Calls within the cooldown coalesce.
    pub fn request_refresh(&self) {
        self.refresh.notify_one();
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe_snapshots(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshot_rx.clone()
    }

    pub fn event_receiver(&self) -> broadcast::Receiver<ZidooEvent> {
        self.event_tx.subscribe()
    }

    /// The polled client, for manual commands between ticks.
    pub fn client(&self) -> Arc<Mutex<ZidooClient>> {
        self.client.clone()
    }

    pub async fn turn_on(&self) -> bool {
        let ok = self.client.lock().await.turn_on().await;
        self.request_refresh();
        ok
    }

    pub async fn turn_off(&self, standby: bool) -> bool {
        let ok = self.client.lock().await.turn_off(standby).await;
        self.request_refresh();
        ok
    }

    pub async fn set_audio_output(&self, name: &str) -> bool {
        let ok = self.client.lock().await.set_audio_output(name).await;
        self.request_refresh();
        ok
    }

    /// Stops the poll loop and waits for the current tick to finish.
    pub async fn shutdown(mut self) -> Result<(), ZidooError> {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            task.await?;
        }
        Ok(())
    }
}

impl Drop for CoordinatorHandle {
    fn drop(&mut self) {
        if !self.shutdown.is_cancelled() {
            warn!("CoordinatorHandle dropped without shutdown, stopping poll loop");
            self.shutdown.cancel();
        }
    }
}

impl std::fmt::Debug for CoordinatorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinatorHandle")
            .field("running", &!self.shutdown.is_cancelled())
            .finish_non_exhaustive()
    }
}
