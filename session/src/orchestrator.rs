//! The acquisition session state machine.
//!
//! One [`Session`] sequences the whole overnight run: start delay, optional
//! wake signal, connection probe, camera connect, cooling with bounded
//! retries, download-time calibration, the frame loop against the session
//! deadline, warm-up, and disconnect. It runs on its own tokio task, reports
//! through a broadcast event channel, and consults the shared
//! [`SessionGuard`] at every suspension point, so a cancellation is noticed
//! within one sleep chunk or poll interval.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use skydarks_theskyx::{wol, TheSkyXClient};

use crate::cooling::CoolingPolicy;
use crate::events::{SessionEvent, SessionOutcome};
use crate::frame_set::FrameSet;
use crate::guard::SessionGuard;
use crate::timing::{self, DownloadTimeTable};
use crate::window::SessionWindow;

/// Caller-owned list of planned frame sets, shared with the session task.
/// The session increments `frames_complete` under the lock; everything else
/// is read-only while a session runs.
pub type SharedFrameSets = Arc<RwLock<Vec<FrameSet>>>;

/// TheSkyX server endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Wake-on-LAN settings for powering the server host before the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WakeOnLanConfig {
    /// How long before the start time the wake packet goes out, and how long
    /// the session waits afterward for the host to boot.
    pub lead_seconds: f64,
    pub mac_address: String,
    pub broadcast_address: String,
}

/// Timing knobs. Defaults match the cadence the session was designed around;
/// tests inject shorter values.
#[derive(Debug, Clone)]
pub struct SessionTuning {
    /// Chunk size for cancellable sleeps and progress updates.
    pub progress_interval: Duration,
    /// Poll cadence while resyncing with the camera after an exposure.
    pub resync_check_interval: Duration,
    /// Give up resyncing after this long.
    pub resync_timeout: Duration,
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            progress_interval: Duration::from_secs(2),
            resync_check_interval: Duration::from_millis(500),
            resync_timeout: Duration::from_secs(3 * 60),
        }
    }
}

/// How a stage ended when it did not succeed. Cancellation is deliberately
/// distinct from failure everywhere.
enum SessionEnd {
    Cancelled,
    Failed(String),
}

type StageResult = Result<(), SessionEnd>;

/// One acquisition session: consumes the plan, drives the protocol client,
/// emits events, and produces exactly one terminal outcome.
pub struct Session {
    frame_sets: SharedFrameSets,
    window: SessionWindow,
    cooling: CoolingPolicy,
    server: ServerConfig,
    wake_on_lan: Option<WakeOnLanConfig>,
    disconnect_when_done: bool,
    tuning: SessionTuning,
    guard: Arc<SessionGuard>,
    events: broadcast::Sender<SessionEvent>,
    download_times: DownloadTimeTable,
}

impl Session {
    pub fn new(
        frame_sets: SharedFrameSets,
        window: SessionWindow,
        cooling: CoolingPolicy,
        server: ServerConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            frame_sets,
            window,
            cooling,
            server,
            wake_on_lan: None,
            disconnect_when_done: false,
            tuning: SessionTuning::default(),
            guard: Arc::new(SessionGuard::new()),
            events,
            download_times: DownloadTimeTable::new(),
        }
    }

    pub fn with_wake_on_lan(mut self, config: WakeOnLanConfig) -> Self {
        self.wake_on_lan = Some(config);
        self
    }

    pub fn with_disconnect_when_done(mut self, disconnect: bool) -> Self {
        self.disconnect_when_done = disconnect;
        self
    }

    pub fn with_tuning(mut self, tuning: SessionTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Handle for cancelling the session from another task or thread.
    pub fn guard(&self) -> Arc<SessionGuard> {
        self.guard.clone()
    }

    /// Subscribe to session events. Subscribe before spawning to see all of
    /// them.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Sender side of the event channel, for sharing with helper tasks such
    /// as [`spawn_cooler_power_poll`].
    pub fn event_sender(&self) -> broadcast::Sender<SessionEvent> {
        self.events.clone()
    }

    /// Run the session on its own task.
    pub fn spawn(self) -> JoinHandle<SessionOutcome> {
        tokio::spawn(self.run())
    }

    /// Drive the session to completion. Emits exactly one `Finished` event
    /// no matter which path the session takes.
    pub async fn run(mut self) -> SessionOutcome {
        self.console("Starting session", 1);
        let outcome = match self.run_stages().await {
            Ok(()) => SessionOutcome::Completed,
            Err(SessionEnd::Cancelled) => SessionOutcome::Cancelled,
            Err(SessionEnd::Failed(reason)) => SessionOutcome::Failed(reason),
        };
        match &outcome {
            SessionOutcome::Completed => self.console("Session completed normally", 1),
            _ => self.console("Session cancelled or failed", 1),
        }
        self.emit(SessionEvent::Finished {
            outcome: outcome.clone(),
        });
        outcome
    }

    async fn run_stages(&mut self) -> StageResult {
        self.wait_for_start().await?;
        self.optional_wake_on_lan().await?;

        let client = TheSkyXClient::new(self.server.host.clone(), self.server.port);
        self.probe_server(&client).await?;
        self.connect_camera(&client).await?;
        self.start_cooling(&client).await?;
        let cooling_started = Instant::now();
        self.measure_download_times(&client).await?;
        self.wait_for_cooling(&client, cooling_started).await?;
        self.acquire_frames(&client).await?;
        self.warm_up_if_requested(&client).await?;
        self.disconnect_if_requested(&client).await?;
        Ok(())
    }

    /// Stage 1: sleep until the scheduled start, leaving room for the wake
    /// signal's lead time. Cancellation here ends the session before any
    /// protocol command is issued.
    async fn wait_for_start(&self) -> StageResult {
        let lead = self.wake_on_lan.as_ref().map(|wake| wake.lead_seconds);
        let wait = timing::start_wait_seconds(Local::now(), &self.window, lead);
        if wait > 0.0 {
            self.console(
                format!("Waiting {}", timing::casual_interval_format(wait)),
                1,
            );
            self.sleep_with_progress(wait).await?;
        }
        Ok(())
    }

    /// Stage 2: broadcast the wake packet and wait out the lead time so the
    /// server host has booted before we try to reach it.
    async fn optional_wake_on_lan(&self) -> StageResult {
        let Some(wake) = self.wake_on_lan.clone() else {
            return Ok(());
        };
        self.console("Sending Wake-On-Lan", 1);
        if let Err(err) = wol::send_wake_on_lan(&wake.broadcast_address, &wake.mac_address).await {
            self.console(format!("Wake on LAN error: {err}"), 2);
            return Err(SessionEnd::Failed(err.to_string()));
        }
        self.console(
            format!(
                "Wake sent.  Waiting {}",
                timing::casual_interval_format(wake.lead_seconds)
            ),
            2,
        );
        self.sleep_with_progress(wake.lead_seconds).await
    }

    /// Stage 3: fetch the autosave path as a combined connectivity probe.
    async fn probe_server(&self, client: &TheSkyXClient) -> StageResult {
        match client.camera_autosave_path().await {
            Ok(path) => {
                self.emit(SessionEvent::AutosavePath { path });
                Ok(())
            }
            Err(err) => {
                self.console("Unable to connect to TheSkyX server", 1);
                self.console(format!("Message: {err}"), 2);
                Err(SessionEnd::Failed(format!("cannot reach server: {err}")))
            }
        }
    }

    /// Stage 4: have TheSkyX connect to the camera.
    async fn connect_camera(&self, client: &TheSkyXClient) -> StageResult {
        if let Err(err) = client.connect_camera().await {
            self.console(format!("Error connecting: {err}"), 2);
            return Err(SessionEnd::Failed(err.to_string()));
        }
        Ok(())
    }

    /// Stage 5: turn regulation on toward the target. No-op for unregulated
    /// cameras. Also used to re-enable cooling between retry attempts.
    async fn start_cooling(&self, client: &TheSkyXClient) -> StageResult {
        if !self.cooling.is_regulated {
            return Ok(());
        }
        self.console(
            format!(
                "Start cooling camera to target {}",
                self.cooling.target_temperature
            ),
            1,
        );
        match client
            .set_camera_cooling(true, self.cooling.target_temperature)
            .await
        {
            Ok(()) => {
                self.emit(SessionEvent::CoolerStarted);
                Ok(())
            }
            Err(err) => {
                self.console("Error starting camera cooling", 2);
                self.console(format!("Message: {err}"), 2);
                Err(SessionEnd::Failed(err.to_string()))
            }
        }
    }

    /// Turn regulation off. Best effort: a failure here is reported on the
    /// console but does not end the session.
    async fn stop_cooling(&self, client: &TheSkyXClient) {
        if !self.cooling.is_regulated {
            return;
        }
        match client.set_camera_cooling(false, 0.0).await {
            Ok(()) => self.emit(SessionEvent::CoolerStopped),
            Err(err) => {
                self.console("Error stopping camera cooling", 2);
                self.console(format!("Message: {err}"), 2);
            }
        }
    }

    /// Stage 6: measure download time once per distinct binning in the plan,
    /// in plan order, by timing a synchronous zero-exposure bias frame.
    async fn measure_download_times(&mut self, client: &TheSkyXClient) -> StageResult {
        self.console("Measuring download times", 1);
        let binnings: Vec<u32> = self
            .frame_sets
            .read()
            .unwrap()
            .iter()
            .map(|set| set.binning())
            .collect();
        for binning in binnings {
            if self.guard.is_cancelled() {
                return Err(SessionEnd::Cancelled);
            }
            if self.download_times.contains(binning) {
                continue;
            }
            let before = Instant::now();
            match client.take_bias_frame(binning, false, false).await {
                Ok(()) => {
                    let seconds = before.elapsed().as_secs_f64();
                    self.console(
                        format!("Binned {binning} x {binning}: {seconds:.1} seconds"),
                        2,
                    );
                    self.download_times.record(binning, seconds);
                }
                Err(err) => {
                    self.console(format!("Error timing download: {err}"), 2);
                    return Err(SessionEnd::Failed(err.to_string()));
                }
            }
        }
        Ok(())
    }

    /// Stage 7: wait until the sensor reaches the target, with the policy's
    /// bounded retry loop. The time already spent calibrating counts against
    /// the first attempt's budget; retries get the full budget back.
    async fn wait_for_cooling(
        &self,
        client: &TheSkyXClient,
        cooling_started: Instant,
    ) -> StageResult {
        if !self.cooling.is_regulated {
            return Ok(());
        }
        self.console(
            format!(
                "Waiting for camera to cool to {} degrees",
                self.cooling.target_temperature
            ),
            1,
        );
        let already_waited = cooling_started.elapsed().as_secs_f64();
        let mut budget = (self.cooling.max_wait_seconds - already_waited).max(0.0);
        let mut attempts_left = self.cooling.total_attempts();
        let mut attempt_number = 0u32;
        while attempts_left > 0 {
            if self.guard.is_cancelled() {
                return Err(SessionEnd::Cancelled);
            }
            attempts_left -= 1;
            attempt_number += 1;
            // A temperature-read error inside the attempt ends the whole
            // wait through the `?`, with no further attempts.
            if self.one_cooling_attempt(client, budget).await? {
                return Ok(());
            }
            // Target not reached within the budget. Cooling goes off before
            // any retry so the cooler gets a fresh start.
            self.stop_cooling(client).await;
            // A cancellation that stopped the attempt mid-sleep must not be
            // mistaken for exhaustion.
            if self.guard.is_cancelled() {
                return Err(SessionEnd::Cancelled);
            }
            if attempts_left > 0 {
                self.console(
                    format!(
                        "Cooling failed to reach target temperature of {} after {} seconds.",
                        self.cooling.target_temperature, self.cooling.max_wait_seconds
                    ),
                    1,
                );
                self.console(
                    format!(
                        "Waiting {} seconds before attempt {}",
                        self.cooling.retry_delay_seconds,
                        attempt_number + 1
                    ),
                    2,
                );
                self.sleep_with_progress(self.cooling.retry_delay_seconds)
                    .await?;
                budget = self.cooling.max_wait_seconds;
                self.start_cooling(client).await?;
            }
        }
        self.console("Failed to cool to target temperature", 1);
        Err(SessionEnd::Failed("cooling target not reached".to_string()))
    }

    /// One bounded cooling attempt; true when the target tolerance was
    /// reached within the budget, false when time ran out or the session was
    /// cancelled mid-attempt.
    async fn one_cooling_attempt(
        &self,
        client: &TheSkyXClient,
        budget_seconds: f64,
    ) -> Result<bool, SessionEnd> {
        self.emit(SessionEvent::ProgressStart {
            max_seconds: budget_seconds.round() as u64,
        });
        let mut waited = 0.0;
        while waited < budget_seconds && self.guard.is_running() {
            self.sleep_plain(self.cooling.check_interval_seconds).await;
            // The sleep returns early on cancellation; no further round
            // trips once it has.
            if self.guard.is_cancelled() {
                break;
            }
            waited += self.cooling.check_interval_seconds;
            self.emit(SessionEvent::ProgressUpdate {
                elapsed_seconds: waited.round() as u64,
            });
            let temperature = match client.camera_temperature().await {
                Ok(temperature) => temperature,
                Err(err) => {
                    self.console(format!("Error reading temperature: {err}"), 2);
                    return Err(SessionEnd::Failed(err.to_string()));
                }
            };
            self.console(format!("Camera temperature: {temperature}"), 2);
            if (temperature - self.cooling.target_temperature).abs() <= self.cooling.tolerance {
                self.console("Target temperature reached", 2);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Stage 8: iterate the plan, acquiring each set until all are done, the
    /// deadline arrives (a success), the temperature rises too far (a
    /// failure), the session is cancelled, or a command fails.
    async fn acquire_frames(&self, client: &TheSkyXClient) -> StageResult {
        let count = self.frame_sets.read().unwrap().len();
        let mut end: StageResult = Ok(());
        for row in 0..count {
            self.emit(SessionEvent::RowStarted { row });
            if self.guard.is_cancelled() {
                self.console("Image acquisition cancelled", 1);
                end = Err(SessionEnd::Cancelled);
                break;
            }
            if self.window.deadline_passed(Local::now()) {
                // Remaining sets are simply skipped; their completed counts
                // stand and the session still counts as a success.
                self.console("Session end-time has passed, stopping session", 1);
                break;
            }
            if self.temperature_risen_too_much(client).await {
                end = Err(SessionEnd::Failed(
                    "camera temperature rose above the abort threshold".to_string(),
                ));
                break;
            }
            match self.acquire_frame_set(client, row).await {
                Ok(true) => {}
                Ok(false) => break, // deadline reached inside the set
                Err(reason) => {
                    end = Err(reason);
                    break;
                }
            }
        }
        // After a cancellation the camera is almost certainly still
        // exposing; one abort keeps it from exposing forever.
        if self.guard.is_cancelled() {
            self.abort_exposure_after_cancel(client).await;
            if end.is_ok() {
                end = Err(SessionEnd::Cancelled);
            }
        }
        end
    }

    async fn abort_exposure_after_cancel(&self, client: &TheSkyXClient) {
        if let Ok(false) = client.exposure_complete().await {
            if let Err(err) = client.abort_exposure().await {
                warn!(%err, "failed to abort in-progress exposure after cancellation");
            }
        }
    }

    /// Whether the regulated sensor has drifted above target + threshold.
    /// A temperature-read failure counts as an excursion.
    async fn temperature_risen_too_much(&self, client: &TheSkyXClient) -> bool {
        if !(self.cooling.is_regulated && self.cooling.abort_on_rise) {
            return false;
        }
        match client.camera_temperature().await {
            Ok(temperature) => {
                if temperature - self.cooling.target_temperature > self.cooling.abort_threshold {
                    self.console(
                        format!(
                            "Camera temp {temperature} exceeds target {} by more than {}",
                            self.cooling.target_temperature, self.cooling.abort_threshold
                        ),
                        1,
                    );
                    true
                } else {
                    false
                }
            }
            Err(err) => {
                self.console(format!("Error reading temperature: {err}"), 1);
                true
            }
        }
    }

    /// Stage 9: acquire one frame set. Returns whether later sets should
    /// still run; false means the deadline check tripped inside this set.
    async fn acquire_frame_set(
        &self,
        client: &TheSkyXClient,
        row: usize,
    ) -> Result<bool, SessionEnd> {
        let set = self.frame_sets.read().unwrap()[row].clone();
        let mut remaining = set.remaining();
        let total_planned = remaining;
        let exposure_seconds = set.exposure_seconds();
        let binning = set.binning();

        let exposure_part = match &set {
            FrameSet::Dark(dark) => format!(" of {} seconds", dark.exposure_seconds),
            FrameSet::Bias(_) => String::new(),
        };
        self.console(
            format!(
                "Take {remaining} {} frames{exposure_part}, binned {binning} x {binning}",
                set.type_name()
            ),
            1,
        );

        // One configuration covers the whole set of identical frames.
        if let Err(err) = client
            .set_camera_image(set.image_type(), binning, exposure_seconds)
            .await
        {
            self.console(format!("Error setting camera: {err}"), 1);
            return Err(SessionEnd::Failed(err.to_string()));
        }

        let mut frame_count = 0u32;
        while remaining > 0 && self.guard.is_running() {
            // Counted against the plan before the attempt; completion is
            // tracked separately through frames_complete.
            remaining -= 1;
            let finish = timing::predict_frame_finish(
                Local::now(),
                exposure_seconds,
                self.download_times.download_seconds(binning),
            );
            if self.window.would_overrun(finish) {
                self.console("Frame would extend past session end time.", 2);
                return Ok(false);
            }
            if self.temperature_risen_too_much(client).await {
                return Err(SessionEnd::Failed(
                    "camera temperature rose above the abort threshold".to_string(),
                ));
            }
            frame_count += 1;
            self.console(format!("Acquiring frame {frame_count} of {total_planned}"), 2);
            self.acquire_one_frame(client, row, exposure_seconds, binning)
                .await?;
        }
        if self.guard.is_cancelled() {
            return Err(SessionEnd::Cancelled);
        }
        Ok(true)
    }

    /// Start one exposure asynchronously, sleep its predicted duration, then
    /// resync with the camera until it confirms completion. The
    /// `FrameAcquired` event goes out strictly after that confirmation.
    async fn acquire_one_frame(
        &self,
        client: &TheSkyXClient,
        row: usize,
        exposure_seconds: f64,
        binning: u32,
    ) -> StageResult {
        let total_seconds = exposure_seconds + self.download_times.download_seconds(binning);
        if let Err(err) = client.start_exposure().await {
            self.console(format!("Unable to start image: {err}"), 2);
            return Err(SessionEnd::Failed(err.to_string()));
        }
        self.sleep_with_progress(total_seconds).await?;
        self.wait_for_camera_completion(client).await?;

        self.frame_sets.write().unwrap()[row].record_frame_complete();
        self.emit(SessionEvent::FrameAcquired { row });
        Ok(())
    }

    /// The exposure should be done or nearly done; poll until the camera
    /// agrees, up to the resync timeout.
    async fn wait_for_camera_completion(&self, client: &TheSkyXClient) -> StageResult {
        let mut waited = Duration::ZERO;
        loop {
            if self.guard.is_cancelled() {
                return Err(SessionEnd::Cancelled);
            }
            match client.exposure_complete().await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(err) => {
                    self.console(format!("Error from camera: {err}"), 2);
                    return Err(SessionEnd::Failed(err.to_string()));
                }
            }
            if waited >= self.tuning.resync_timeout {
                self.console("Timed out waiting for camera to finish", 2);
                return Err(SessionEnd::Failed(
                    "timed out waiting for camera to finish".to_string(),
                ));
            }
            tokio::time::sleep(self.tuning.resync_check_interval).await;
            waited += self.tuning.resync_check_interval;
        }
    }

    /// Stage 10: let the sensor warm gently before power-off, if requested.
    async fn warm_up_if_requested(&self, client: &TheSkyXClient) -> StageResult {
        if !(self.cooling.is_regulated && self.cooling.warm_up_when_done) {
            return Ok(());
        }
        if let Err(err) = client.set_camera_cooling(false, 0.0).await {
            self.console(format!("Error turning off camera cooling: {err}"), 2);
            return Err(SessionEnd::Failed(err.to_string()));
        }
        self.emit(SessionEvent::CoolerStopped);
        self.console(
            format!(
                "Allowing camera to warm up for {} seconds",
                self.cooling.warm_up_seconds
            ),
            1,
        );
        self.sleep_with_progress(self.cooling.warm_up_seconds).await
    }

    /// Stage 11: disconnect the camera, if requested.
    async fn disconnect_if_requested(&self, client: &TheSkyXClient) -> StageResult {
        if !self.disconnect_when_done {
            return Ok(());
        }
        match client.disconnect_camera().await {
            Ok(()) => {
                self.console("Camera Disconnected", 1);
                Ok(())
            }
            Err(err) => {
                self.console(format!("Error disconnecting camera: {err}"), 1);
                Err(SessionEnd::Failed(err.to_string()))
            }
        }
    }

    /// Sleep in short cancellable chunks, reporting progress each chunk.
    /// Cancellation latency is therefore bounded by one chunk.
    async fn sleep_with_progress(&self, wait_seconds: f64) -> StageResult {
        self.emit(SessionEvent::ProgressStart {
            max_seconds: wait_seconds.round().max(0.0) as u64,
        });
        let deadline = Instant::now() + Duration::from_secs_f64(wait_seconds.max(0.0));
        let mut elapsed = Duration::ZERO;
        while Instant::now() < deadline && self.guard.is_running() {
            let chunk = self
                .tuning
                .progress_interval
                .min(deadline.saturating_duration_since(Instant::now()));
            tokio::time::sleep(chunk).await;
            elapsed += chunk;
            self.emit(SessionEvent::ProgressUpdate {
                elapsed_seconds: elapsed.as_secs(),
            });
        }
        if self.guard.is_running() {
            Ok(())
        } else {
            Err(SessionEnd::Cancelled)
        }
    }

    /// Chunked cancellable sleep without progress events.
    async fn sleep_plain(&self, seconds: f64) {
        let deadline = Instant::now() + Duration::from_secs_f64(seconds.max(0.0));
        while Instant::now() < deadline && self.guard.is_running() {
            let chunk = self
                .tuning
                .progress_interval
                .min(deadline.saturating_duration_since(Instant::now()));
            tokio::time::sleep(chunk).await;
        }
    }

    fn console(&self, message: impl Into<String>, level: u8) {
        let message = message.into();
        info!(target: "session", %message);
        self.emit(SessionEvent::Console { message, level });
    }

    fn emit(&self, event: SessionEvent) {
        // Nobody listening is fine; a caller may run headless.
        let _ = self.events.send(event);
    }
}

/// Periodic cooler-power readout, independent of the main session sequence.
///
/// Runs until the guard is cancelled. Shares the client's command mutex, so
/// its round trips interleave whole command/response pairs with the
/// orchestrator's rather than corrupting them.
pub fn spawn_cooler_power_poll(
    client: Arc<TheSkyXClient>,
    events: broadcast::Sender<SessionEvent>,
    guard: Arc<SessionGuard>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while guard.is_running() {
            match client.cooler_power().await {
                Ok(percent) => {
                    let _ = events.send(SessionEvent::CoolerPower { percent });
                }
                Err(err) => warn!(%err, "cooler power query failed"),
            }
            tokio::time::sleep(interval).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_plan() -> SharedFrameSets {
        Arc::new(RwLock::new(Vec::new()))
    }

    #[test]
    fn test_default_tuning_matches_design_cadence() {
        let tuning = SessionTuning::default();
        assert_eq!(tuning.progress_interval, Duration::from_secs(2));
        assert_eq!(tuning.resync_check_interval, Duration::from_millis(500));
        assert_eq!(tuning.resync_timeout, Duration::from_secs(180));
    }

    #[test]
    fn test_session_guard_is_shared() {
        let session = Session::new(
            empty_plan(),
            SessionWindow::immediate_until_done(),
            CoolingPolicy::unregulated(),
            ServerConfig {
                host: "localhost".to_string(),
                port: 3040,
            },
        );
        let guard = session.guard();
        assert!(guard.is_running());
        guard.request_cancel();
        assert!(session.guard().is_cancelled());
    }

    #[test]
    fn test_subscribe_sees_emitted_events() {
        let session = Session::new(
            empty_plan(),
            SessionWindow::immediate_until_done(),
            CoolingPolicy::unregulated(),
            ServerConfig {
                host: "localhost".to_string(),
                port: 3040,
            },
        );
        let mut receiver = session.subscribe();
        session.console("hello", 1);
        match receiver.try_recv() {
            Ok(SessionEvent::Console { message, level }) => {
                assert_eq!(message, "hello");
                assert_eq!(level, 1);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
