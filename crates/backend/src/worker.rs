//! HID worker thread
//!
//! Dedicated thread servicing backend commands from the Tokio runtime.
//! Each listened-to device gets its own reader thread that shares the open
//! handle with the command path; reads are paused while a command write
//! and its synchronous response are on the wire, so the response is never
//! swallowed by the listener.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use hidapi::{HidApi, HidDevice};
use session::{BackendCommand, BackendEvent, BackendWorker, DeviceDescriptor};
use tracing::{debug, info, warn};

/// HID report payload size in bytes
const REPORT_SIZE: usize = 64;

/// Poll interval of the command loop when idle
const COMMAND_POLL_MS: u64 = 10;

/// Backoff while a listener is paused for a command exchange
const PAUSE_POLL_MS: u64 = 50;

/// Worker tuning knobs
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Hide interfaces on usage page 0x0001 (system-claimed input
    /// interfaces, not openable on macOS)
    pub filter_system_interfaces: bool,
    /// Timeout for the synchronous response read after a write
    pub response_timeout_ms: i32,
    /// Timeout for each listener read; bounds how fast pause/stop flags
    /// are noticed
    pub read_timeout_ms: i32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            filter_system_interfaces: cfg!(target_os = "macos"),
            response_timeout_ms: 1000,
            read_timeout_ms: 100,
        }
    }
}

/// One running listener: shared device handle plus its control flags
struct Listener {
    device: Arc<Mutex<HidDevice>>,
    paused: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    alive: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

/// HID worker thread state
pub struct HidWorkerThread {
    api: HidApi,
    config: WorkerConfig,
    worker: BackendWorker,
    listeners: HashMap<String, Listener>,
}

impl HidWorkerThread {
    pub fn new(api: HidApi, worker: BackendWorker, config: WorkerConfig) -> Self {
        Self {
            api,
            config,
            worker,
            listeners: HashMap::new(),
        }
    }

    /// Run the worker loop until a Shutdown command arrives
    pub fn run(mut self) {
        info!("HID worker thread started");

        loop {
            self.prune_dead_listeners();

            match self.worker.try_recv_command() {
                Some(BackendCommand::Shutdown) => {
                    info!("HID worker shutting down");
                    break;
                }
                Some(cmd) => self.handle_command(cmd),
                None => thread::sleep(Duration::from_millis(COMMAND_POLL_MS)),
            }
        }

        self.stop_all_listeners();
        info!("HID worker thread stopped");
    }

    fn handle_command(&mut self, cmd: BackendCommand) {
        match cmd {
            BackendCommand::ScanDevices { response } => {
                let result = self.scan_devices();
                let _ = response.send(result);
            }
            BackendCommand::StartListening { path, response } => {
                debug!("Starting listener for {}", path);
                let _ = response.send(self.start_listening(&path));
            }
            BackendCommand::SendCommand { path, data, response } => {
                debug!("Sending {} byte(s) to {}", data.len(), path);
                let _ = response.send(self.send_command(&path, &data));
            }
            BackendCommand::Shutdown => unreachable!("handled by the run loop"),
        }
    }

    /// Enumerate currently visible HID interfaces
    fn scan_devices(&mut self) -> Result<Vec<DeviceDescriptor>, String> {
        self.api
            .refresh_devices()
            .map_err(|e| format!("Enumeration failed: {}", e))?;

        let filter_system = self.config.filter_system_interfaces;
        let devices: Vec<DeviceDescriptor> = self
            .api
            .device_list()
            .filter(|d| !filter_system || d.usage_page() != 0x0001)
            .map(|d| DeviceDescriptor {
                path: d.path().to_string_lossy().to_string(),
                vendor_id: format!("{:#06x}", d.vendor_id()),
                product_id: format!("{:#06x}", d.product_id()),
                product_string: d.product_string().map(str::to_string),
                manufacturer_string: d.manufacturer_string().map(str::to_string),
                usage_page: d.usage_page(),
                interface_number: d.interface_number(),
            })
            .collect();

        debug!("Enumerated {} HID interface(s)", devices.len());
        Ok(devices)
    }

    /// Start the asynchronous reader for `path`. Idempotent: an already
    /// running listener is left alone.
    fn start_listening(&mut self, path: &str) -> Result<(), String> {
        if let Some(listener) = self.listeners.get(path) {
            if listener.alive.load(Ordering::SeqCst) {
                debug!("Listener already running for {}", path);
                return Ok(());
            }
        }

        let _ = self.api.refresh_devices();
        let device_info = self
            .api
            .device_list()
            .find(|d| d.path().to_string_lossy() == path)
            .ok_or_else(|| format!("Device not found: {}", path))?;
        let device = device_info
            .open_device(&self.api)
            .map_err(|e| format!("Failed to open {}: {}", path, e))?;

        let device = Arc::new(Mutex::new(device));
        let paused = Arc::new(AtomicBool::new(false));
        let stop = Arc::new(AtomicBool::new(false));
        let alive = Arc::new(AtomicBool::new(true));

        let thread = {
            let device = device.clone();
            let paused = paused.clone();
            let stop = stop.clone();
            let alive = alive.clone();
            let event_tx = self.worker.event_tx.clone();
            let read_timeout_ms = self.config.read_timeout_ms;
            let path = path.to_string();

            thread::spawn(move || {
                debug!("Listener thread started for {}", path);
                loop {
                    if stop.load(Ordering::SeqCst) {
                        break;
                    }
                    if paused.load(Ordering::SeqCst) {
                        thread::sleep(Duration::from_millis(PAUSE_POLL_MS));
                        continue;
                    }

                    let mut buf = [0u8; REPORT_SIZE];
                    let read = {
                        let device = match device.lock() {
                            Ok(guard) => guard,
                            Err(_) => break,
                        };
                        device.read_timeout(&mut buf, read_timeout_ms)
                    };

                    match read {
                        Ok(n) if n > 0 => {
                            let frame = buf[..n].to_vec();
                            if event_tx
                                .send_blocking(BackendEvent::InboundFrame { data: frame })
                                .is_err()
                            {
                                debug!("Push channel closed, stopping listener for {}", path);
                                break;
                            }
                        }
                        Ok(_) => {} // timeout, loop to re-check flags
                        Err(e) => {
                            // Read error, likely an unplugged device
                            warn!("Listener read error for {}: {}", path, e);
                            break;
                        }
                    }
                }
                alive.store(false, Ordering::SeqCst);
                debug!("Listener thread stopped for {}", path);
            })
        };

        self.listeners.insert(
            path.to_string(),
            Listener {
                device,
                paused,
                stop,
                alive,
                thread: Some(thread),
            },
        );
        info!("Listener started for {}", path);
        Ok(())
    }

    /// Write a command frame and read back the synchronous response
    fn send_command(&mut self, path: &str, data: &[u8]) -> Result<Vec<u8>, String> {
        let listener = self
            .listeners
            .get(path)
            .filter(|l| l.alive.load(Ordering::SeqCst))
            .ok_or_else(|| format!("No active listener for {}; start listening first", path))?;

        // Pause the reader so the response is read here, not by the
        // listener thread
        listener.paused.store(true, Ordering::SeqCst);
        let result = Self::exchange(&listener.device, data, self.config.response_timeout_ms);
        listener.paused.store(false, Ordering::SeqCst);

        result
    }

    fn exchange(
        device: &Arc<Mutex<HidDevice>>,
        data: &[u8],
        response_timeout_ms: i32,
    ) -> Result<Vec<u8>, String> {
        let device = device.lock().map_err(|_| "Failed to lock device".to_string())?;

        let write_buf = build_write_buffer(data);
        device
            .write(&write_buf)
            .map_err(|e| format!("Write failed: {}", e))?;

        let mut read_buf = [0u8; REPORT_SIZE];
        match device.read_timeout(&mut read_buf, response_timeout_ms) {
            Ok(n) if n > 0 => Ok(read_buf[..n].to_vec()),
            Ok(_) => Ok(Vec::new()),
            Err(e) => Err(format!("Response read failed: {}", e)),
        }
    }

    /// Drop registry entries whose reader thread has exited
    fn prune_dead_listeners(&mut self) {
        let dead: Vec<String> = self
            .listeners
            .iter()
            .filter(|(_, l)| !l.alive.load(Ordering::SeqCst))
            .map(|(path, _)| path.clone())
            .collect();

        for path in dead {
            if let Some(mut listener) = self.listeners.remove(&path) {
                if let Some(thread) = listener.thread.take() {
                    let _ = thread.join();
                }
                info!("Listener for {} pruned after exit", path);
            }
        }
    }

    fn stop_all_listeners(&mut self) {
        for (path, mut listener) in self.listeners.drain() {
            listener.stop.store(true, Ordering::SeqCst);
            if let Some(thread) = listener.thread.take() {
                let _ = thread.join();
            }
            debug!("Listener stopped for {}", path);
        }
    }
}

/// Build the 65-byte output report: report ID byte followed by the
/// payload. A frame already starting with the zero report ID is written
/// as-is; any other frame is shifted past a leading zero byte.
fn build_write_buffer(data: &[u8]) -> Vec<u8> {
    let mut write_buf = vec![0u8; REPORT_SIZE + 1];
    if data.first() == Some(&0x00) {
        let len = data.len().min(REPORT_SIZE + 1);
        write_buf[..len].copy_from_slice(&data[..len]);
    } else {
        let len = data.len().min(REPORT_SIZE);
        write_buf[1..len + 1].copy_from_slice(&data[..len]);
    }
    write_buf
}

/// Spawn the HID worker on its own thread.
///
/// Initialization failure is not fatal to the process: every command is
/// answered with the initialization error until Shutdown, so the panel
/// stays usable and the operator sees the failure in the log.
pub fn spawn_worker(worker: BackendWorker, config: WorkerConfig) -> thread::JoinHandle<()> {
    thread::spawn(move || match HidApi::new() {
        Ok(api) => HidWorkerThread::new(api, worker, config).run(),
        Err(e) => {
            let init_err = format!("Failed to initialize HID API: {}", e);
            warn!("{}", init_err);
            run_degraded(worker, &init_err);
        }
    })
}

fn run_degraded(worker: BackendWorker, init_err: &str) {
    loop {
        match worker.recv_command() {
            Ok(BackendCommand::ScanDevices { response }) => {
                let _ = response.send(Err(init_err.to_string()));
            }
            Ok(BackendCommand::StartListening { response, .. }) => {
                let _ = response.send(Err(init_err.to_string()));
            }
            Ok(BackendCommand::SendCommand { response, .. }) => {
                let _ = response.send(Err(init_err.to_string()));
            }
            Ok(BackendCommand::Shutdown) | Err(_) => break,
        }
    }
}
