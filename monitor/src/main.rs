use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use enviro_monitor::app::Monitor;
use enviro_monitor::config::MonitorConfig;

/// Timestamped log lines, `info` unless `RUST_LOG` says otherwise.
fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:<8} {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .init();
}

/// A minimal main function that sets up the runtime and runs the monitor.
fn main() -> anyhow::Result<()> {
    init_logging();

    log::info!(
        "enviro-monitor - Displays readings from all of Enviro plus' sensors\n\nPress Ctrl+C to exit!\n"
    );

    let config = MonitorConfig::load()?;

    // Network requests and the Ctrl+C handler run on this runtime, the loop itself does not.
    let runtime = tokio::runtime::Runtime::new()?;

    let running = Arc::new(AtomicBool::new(true));
    let stop = running.clone();
    runtime.spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => stop.store(false, Ordering::Relaxed),
            Err(e) => log::error!("Cannot listen for Ctrl+C: {e}"),
        }
    });

    let mut monitor = Monitor::new(config, runtime.handle().clone(), running)?;

    monitor.run()
}
