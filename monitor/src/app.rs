use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use enviro_common::device::{self, HostnameProbe, NetworkStatusProvider};
use enviro_common::display::{
    Banner, ChartRenderer, DisplayError, DisplayPanelPointer, FramebufferPanel, HeadlessPanel,
};
use enviro_common::persistence::{CsvSink, PersistError};
use enviro_common::sensor::{
    CpuThermometerPointer, DummySensorAdapter, FixedThermometer, SensorBoard, SensorError,
    ThermalZoneThermometer, VcgencmdThermometer,
};
use enviro_common::upload::{LuftdatenClient, TelegramNotifier, UploadBatch, UploadError};
use enviro_common::ModeSelector;
use enviro_model::{Reading, Variable};

use crate::config::{CpuThermometerKind, MonitorConfig, ScreenMode};

/// Why part of a loop iteration did not complete.
#[derive(Debug, thiserror::Error)]
pub enum IterationError {
    #[error("sensor: {0}")]
    Sensor(#[from] SensorError),

    #[error("display: {0}")]
    Display(#[from] DisplayError),

    #[error("upload: {0}")]
    Upload(#[from] UploadError),

    #[error("saving data: {0}")]
    Persist(#[from] PersistError),
}

/// One page of the chart mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Chart(Variable),
    WifiStatus,
}

/// The charts for every available variable, then the Wi-Fi status.
pub fn screens(particulates: bool) -> Vec<Screen> {
    let variables: &[Variable] = if particulates {
        &Variable::ALL
    } else {
        &Variable::WITHOUT_PARTICULATES
    };

    variables
        .iter()
        .copied()
        .map(Screen::Chart)
        .chain(std::iter::once(Screen::WifiStatus))
        .collect()
}

/// The monitor session: everything the polling loop reads and writes.
///
/// Each iteration reads the sensors, buffers the reading, uploads when due, updates the
/// display and flushes the buffer to CSV when due.
pub struct Monitor {
    config: MonitorConfig,
    board: SensorBoard,
    renderer: ChartRenderer,
    panel: DisplayPanelPointer,
    network: Box<dyn NetworkStatusProvider + Send>,
    sink: CsvSink,
    uploader: Option<LuftdatenClient>,
    notifier: Option<TelegramNotifier>,
    serial: String,
    screens: Vec<Screen>,
    selector: ModeSelector,
    last_page: Option<Instant>,
    last_upload: Instant,
    running: Arc<AtomicBool>,
}

impl Monitor {
    /// Granularity of sleeps, so Ctrl+C is noticed quickly.
    const SLEEP_SLICE: Duration = Duration::from_millis(100);

    /// Creates the monitor and all its collaborators from `config`.
    ///
    /// Network requests run on `runtime`. The loop stops once `running` is cleared.
    pub fn new(
        config: MonitorConfig,
        runtime: tokio::runtime::Handle,
        running: Arc<AtomicBool>,
    ) -> anyhow::Result<Self> {
        // The serial number names this board on the Wi-Fi screen and at Luftdaten.
        let serial = match device::serial_number(&config.sensors.cpuinfo_path) {
            Ok(Some(serial)) => serial,
            Ok(None) => {
                log::warn!("No serial number in {}", config.sensors.cpuinfo_path.display());
                "unknown".to_string()
            }
            Err(e) => {
                log::warn!("Cannot read {}: {e}", config.sensors.cpuinfo_path.display());
                "unknown".to_string()
            }
        };

        // Pick the CPU temperature source for the compensation.
        let cpu: CpuThermometerPointer = match config.sensors.cpu_thermometer {
            CpuThermometerKind::Vcgencmd => Box::new(VcgencmdThermometer),
            CpuThermometerKind::ThermalZone => Box::new(ThermalZoneThermometer::default()),
            CpuThermometerKind::Fixed => {
                Box::new(FixedThermometer(config.sensors.fixed_cpu_temperature))
            }
        };

        // Hardware drivers plug in through `SensorAdapter`; this build simulates the board.
        log::warn!("Using the simulated Enviro+ sensor adapter");
        let adapter = DummySensorAdapter::new()?;

        let board = SensorBoard::new(
            Box::new(adapter),
            cpu,
            config.sensors.compensation_factor,
            config.sensors.particulates,
        )?;

        // Draw to the LCD framebuffer when one is configured.
        let panel: DisplayPanelPointer = match &config.display.device {
            Some(path) => Box::new(FramebufferPanel::open(
                path,
                config.display.width,
                config.display.height,
            )?),
            None => {
                log::info!("No display device configured, running headless");
                Box::new(HeadlessPanel::new())
            }
        };

        // Uploads identify as `raspi-<serial>` unless a sensor id is configured.
        let uploader = if config.upload.enabled {
            let mut settings = config.upload.luftdaten.clone();
            if settings.sensor_id.is_empty() {
                settings.sensor_id = format!("raspi-{serial}");
            }

            let client = LuftdatenClient::new(runtime.clone(), settings)?;
            log::info!(
                "Uploading as {} to {}",
                client.settings().sensor_id,
                client.settings().endpoint
            );
            Some(client)
        } else {
            None
        };

        // Telegram notices are only sent with both token and chat id.
        let notifier = config
            .telegram
            .credentials()
            .map(|(token, chat_id)| TelegramNotifier::new(runtime, token, chat_id));

        Ok(Self::from_parts(
            config,
            board,
            panel,
            Box::new(HostnameProbe),
            serial,
            uploader,
            notifier,
            running,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn from_parts(
        config: MonitorConfig,
        board: SensorBoard,
        panel: DisplayPanelPointer,
        network: Box<dyn NetworkStatusProvider + Send>,
        serial: String,
        uploader: Option<LuftdatenClient>,
        notifier: Option<TelegramNotifier>,
        running: Arc<AtomicBool>,
    ) -> Self {
        let screens = screens(board.particulates_enabled());

        Self {
            renderer: ChartRenderer::new(config.display.width, config.display.height),
            sink: CsvSink::new(config.csv.path.clone(), config.csv.mode),
            selector: ModeSelector::new(screens.len()),
            screens,
            board,
            panel,
            network,
            uploader,
            notifier,
            serial,
            last_page: None,
            last_upload: Instant::now(),
            running,
            config,
        }
    }

    /// Runs until `running` is cleared, then flushes once more if configured.
    pub fn run(&mut self) -> anyhow::Result<()> {
        // Show the startup banner for a moment.
        if let Err(e) = self.show_banner(&Banner::Startup) {
            self.recover(e);
        }
        self.pause(self.config.banner_hold());

        // Poll until Ctrl+C clears the running flag.
        while self.is_running() {
            if let Err(e) = self.iterate() {
                self.recover(e);
            }

            self.pause(self.config.poll_interval());
        }

        log::info!("Stopping");

        // Save what is still buffered.
        if self.config.csv.flush_on_exit && !self.sink.is_empty() {
            self.persist("Saving data after exit!")?;
        }

        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// One pass of the loop. Only a sensor failure abandons the rest of the iteration.
    pub fn iterate(&mut self) -> Result<(), IterationError> {
        // Read every sensor and buffer the reading for the CSV file.
        let proximity = self.board.proximity()?;
        let reading = self.board.query(proximity)?;
        self.sink.push(&reading);

        // Upload when the interval has passed, successful or not the clock restarts.
        let uploaded = if self.upload_due() {
            let result = self.upload(&reading);
            self.last_upload = Instant::now();

            match result {
                Ok(ok) => Some(ok),
                Err(e) => {
                    self.recover(e);
                    Some(false)
                }
            }
        } else {
            None
        };

        // Update the display for the current screen mode.
        let shown = match (self.config.display.mode, uploaded) {
            (ScreenMode::Status, Some(ok)) => {
                let shown = self.show_banner(&Banner::UploadStatus { ok });
                self.pause(self.config.banner_hold());
                shown
            }
            (ScreenMode::Status, None) => self.show_wifi_status(),
            (ScreenMode::Charts, _) => self.show_chart(proximity, &reading),
        };
        if let Err(e) = shown {
            self.recover(e);
        }

        // Write the buffer to the CSV file every flush interval.
        if self.sink.due(self.config.flush_interval()) {
            if let Err(e) = self.persist("Scheduled data saving!") {
                self.recover(e);
            }
        }

        Ok(())
    }

    /// Decides per kind what a failure means for the loop.
    fn recover(&mut self, error: IterationError) {
        match error {
            IterationError::Sensor(e) => log::warn!("Skipping iteration: {e}"),
            IterationError::Display(e) => log::error!("Display update failed: {e}"),
            IterationError::Upload(e) => log::error!("Upload failed: {e}"),
            IterationError::Persist(e) => {
                // Keep the readings and try again after the next interval
                log::error!("Keeping {} readings in memory: {e}", self.sink.len());
                self.sink.reset_clock();
            }
        }
    }

    fn upload_due(&self) -> bool {
        self.uploader.is_some() && self.last_upload.elapsed() > self.config.upload_interval()
    }

    fn upload(&mut self, reading: &Reading) -> Result<bool, IterationError> {
        let Some(uploader) = &self.uploader else {
            return Ok(false);
        };

        let ok = uploader.send(&UploadBatch::from_reading(reading))?;
        log::info!("Response: {}", if ok { "ok" } else { "failed" });

        Ok(ok)
    }

    /// Pages to the next screen on a debounced tap, then draws the current one.
    fn show_chart(&mut self, proximity: u16, reading: &Reading) -> Result<(), IterationError> {
        let tapped = proximity > self.config.display.proximity_threshold
            && self
                .last_page
                .map_or(true, |last| last.elapsed() > self.config.debounce());

        if tapped {
            self.selector.advance();
            self.last_page = Some(Instant::now());
        }

        match self.screens[self.selector.index()] {
            Screen::Chart(variable) => {
                let value = reading.value(variable).unwrap_or_else(|| {
                    self.renderer
                        .history(variable)
                        .map_or(0.0, |history| history.latest())
                });

                let frame = self.renderer.render_chart(variable, value);
                self.panel.show(frame)?;
                Ok(())
            }
            Screen::WifiStatus => self.show_wifi_status(),
        }
    }

    fn show_wifi_status(&mut self) -> Result<(), IterationError> {
        let banner = Banner::WifiStatus {
            serial: self.serial.clone(),
            connected: self.network.is_connected(),
        };

        self.show_banner(&banner)
    }

    fn show_banner(&mut self, banner: &Banner) -> Result<(), IterationError> {
        let frame = self.renderer.render_banner(banner);
        self.panel.show(frame)?;
        Ok(())
    }

    /// Flushes the CSV sink. The Telegram notice is best effort and never fails the save.
    fn persist(&mut self, message: &str) -> Result<(), IterationError> {
        log::info!("{message}");
        let rows = self.sink.flush()?;

        if let Some(notifier) = &self.notifier {
            let text = format!(
                "{message} {rows} readings written to {}",
                self.sink.path().display()
            );
            if let Err(e) = notifier.send_message(&text) {
                log::error!("Telegram notification failed: {e}");
            }
        }

        Ok(())
    }

    /// Sleeps for `duration` unless the monitor is stopped first.
    fn pause(&self, duration: Duration) {
        let deadline = Instant::now() + duration;

        while self.is_running() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep((deadline - now).min(Self::SLEEP_SLICE));
        }
    }

    pub fn sink(&self) -> &CsvSink {
        &self.sink
    }

    pub fn selector(&self) -> &ModeSelector {
        &self.selector
    }
}

#[cfg(test)]
struct Offline;

#[cfg(test)]
impl NetworkStatusProvider for Offline {
    fn is_connected(&self) -> bool {
        false
    }
}

#[cfg(test)]
struct Online;

#[cfg(test)]
impl NetworkStatusProvider for Online {
    fn is_connected(&self) -> bool {
        true
    }
}

#[cfg(test)]
fn test_monitor(mode: ScreenMode, csv_name: &str) -> Monitor {
    let mut config = MonitorConfig::default();
    config.display.mode = mode;
    config.upload.enabled = false;
    config.csv.path = std::env::temp_dir()
        .join(format!("enviro-monitor-{}", std::process::id()))
        .join(csv_name);
    let _ = std::fs::remove_file(&config.csv.path);

    let board = SensorBoard::new(
        Box::new(DummySensorAdapter::new().unwrap()),
        Box::new(FixedThermometer(45.0)),
        config.sensors.compensation_factor,
        config.sensors.particulates,
    )
    .unwrap();

    Monitor::from_parts(
        config,
        board,
        Box::new(HeadlessPanel::new()),
        Box::new(Offline),
        "00000000d2a1b3c4".into(),
        None,
        None,
        Arc::new(AtomicBool::new(true)),
    )
}

#[test]
fn test_screens() {
    let all = screens(true);
    assert_eq!(all.len(), 11);
    assert_eq!(all[0], Screen::Chart(Variable::Temperature));
    assert_eq!(all[10], Screen::WifiStatus);

    assert_eq!(screens(false).len(), 8);
}

#[test]
fn test_iterations_buffer_readings() {
    let mut monitor = test_monitor(ScreenMode::Charts, "buffer.csv");

    for _ in 0..3 {
        monitor.iterate().unwrap();
    }

    assert_eq!(monitor.sink().len(), 3);
    assert_eq!(monitor.selector().index(), 0);
    assert_eq!(
        monitor.renderer.history(Variable::Temperature).unwrap().len(),
        160
    );
}

#[test]
fn test_tap_pages_to_next_screen() {
    let mut monitor = test_monitor(ScreenMode::Charts, "tap.csv");

    // The simulated board reports a tap on every 40th proximity read
    for _ in 0..40 {
        monitor.iterate().unwrap();
    }

    assert_eq!(monitor.selector().index(), 1);
}

#[test]
fn test_due_flush_empties_buffer() {
    let mut monitor = test_monitor(ScreenMode::Status, "due.csv");
    monitor.config.csv.flush_interval_minutes = 0.0;

    monitor.iterate().unwrap();
    std::thread::sleep(Duration::from_millis(5));
    monitor.iterate().unwrap();

    assert_eq!(monitor.sink().len(), 0);
    let contents = std::fs::read_to_string(monitor.sink().path()).unwrap();
    assert_eq!(contents.lines().count(), 2);
}

#[test]
fn test_stopped_monitor_flushes_on_exit() {
    let mut monitor = test_monitor(ScreenMode::Charts, "exit.csv");
    monitor.iterate().unwrap();
    monitor.running.store(false, Ordering::Relaxed);

    monitor.run().unwrap();

    assert!(monitor.sink().is_empty());
    assert!(monitor.sink().path().exists());
}

#[test]
fn test_status_mode_shows_upload_result() {
    use enviro_common::upload::LuftdatenSettings;

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut monitor = test_monitor(ScreenMode::Status, "upload.csv");
    monitor.network = Box::new(Online);
    monitor.config.display.banner_hold_secs = 0.0;

    // Nothing listens on a port that was just released
    let closed = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let settings = LuftdatenSettings {
        endpoint: format!("http://{closed}/"),
        sensor_id: "raspi-00000000d2a1b3c4".into(),
        ..Default::default()
    };
    monitor.uploader = Some(LuftdatenClient::new(runtime.handle().clone(), settings).unwrap());

    monitor.iterate().unwrap();
    let connected = Banner::WifiStatus {
        serial: String::new(),
        connected: true,
    };
    assert_eq!(monitor.renderer.frame().pixel(0, 0), Some(connected.background()));

    monitor.config.upload.interval_secs = 0.0;
    std::thread::sleep(Duration::from_millis(5));
    monitor.iterate().unwrap();

    let failed = Banner::UploadStatus { ok: false };
    assert_eq!(monitor.renderer.frame().pixel(0, 0), Some(failed.background()));
    assert!(monitor.last_upload.elapsed() < Duration::from_secs(1));
    assert_eq!(monitor.sink().len(), 2);
}

#[test]
fn test_failed_notice_does_not_fail_exit_flush() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut monitor = test_monitor(ScreenMode::Charts, "notice.csv");

    let closed = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    monitor.notifier = Some(
        TelegramNotifier::new(runtime.handle().clone(), "123:abc".into(), "42".into())
            .with_api_base(format!("http://{closed}")),
    );

    monitor.iterate().unwrap();
    monitor.running.store(false, Ordering::Relaxed);

    assert!(monitor.run().is_ok());
    assert!(monitor.sink().is_empty());
}
