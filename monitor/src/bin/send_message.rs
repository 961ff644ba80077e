//! Posts its command line as a message to the configured Telegram chat.

use anyhow::Context;
use enviro_common::upload::TelegramNotifier;
use enviro_monitor::config::{MonitorConfig, TELEGRAM_CHAT_ENV, TELEGRAM_TOKEN_ENV};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let message = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    anyhow::ensure!(!message.trim().is_empty(), "usage: send-message <text>");

    let config = MonitorConfig::load()?;
    let (token, chat_id) = config.telegram.credentials().with_context(|| {
        format!("set {TELEGRAM_TOKEN_ENV} and {TELEGRAM_CHAT_ENV}, or telegram.token and telegram.chat_id in the config file")
    })?;

    let runtime = tokio::runtime::Runtime::new()?;
    let notifier = TelegramNotifier::new(runtime.handle().clone(), token, chat_id);

    let response = notifier.send_message(&message)?;
    log::info!("Telegram answered: {response}");

    Ok(())
}
