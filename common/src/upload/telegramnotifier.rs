// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use tokio::runtime::Handle;

use crate::upload::UploadError;

/// Sends text messages through a Telegram bot.
pub struct TelegramNotifier {
    runtime: Handle,
    http: reqwest::Client,
    api_base: String,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub const API_BASE: &'static str = "https://api.telegram.org";

    pub fn new(runtime: Handle, token: String, chat_id: String) -> Self {
        Self {
            runtime,
            http: reqwest::Client::new(),
            api_base: Self::API_BASE.into(),
            token,
            chat_id,
        }
    }

    /// Points the notifier at another Bot API server.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{method}",
            self.api_base.trim_end_matches('/'),
            self.token
        )
    }

    /// Posts `message` to the configured chat and returns the API's JSON answer.
    pub fn send_message(&self, message: &str) -> Result<serde_json::Value, UploadError> {
        let url = self.method_url("sendMessage");

        self.runtime.block_on(async {
            let response = self
                .http
                .post(url)
                .form(&[("chat_id", self.chat_id.as_str()), ("text", message)])
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(UploadError::Rejected {
                    service: "telegram",
                    status: status.as_u16(),
                    body: response.text().await.unwrap_or_default(),
                });
            }

            log::debug!("Telegram message delivered to chat {}", self.chat_id);
            Ok::<_, UploadError>(response.json::<serde_json::Value>().await?)
        })
    }
}

#[test]
fn test_method_url() {
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
    let notifier = TelegramNotifier::new(runtime.handle().clone(), "123:abc".into(), "42".into())
        .with_api_base("http://localhost:8081/");

    assert_eq!(
        notifier.method_url("sendMessage"),
        "http://localhost:8081/bot123:abc/sendMessage"
    );
}

#[test]
fn test_send_message_posts_form() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();
    let (url, server) = crate::upload::serve(vec![
        (200, r#"{"ok":true,"result":{"message_id":7}}"#),
        (400, r#"{"ok":false,"description":"Bad Request: chat not found"}"#),
    ]);

    let mut notifier = TelegramNotifier::new(runtime.handle().clone(), "123:abc".into(), "42".into())
        .with_api_base(url);
    notifier.http = reqwest::Client::builder().no_proxy().build().unwrap();

    let answer = notifier.send_message("Scheduled data saving!").unwrap();
    assert_eq!(answer["result"]["message_id"], 7);

    match notifier.send_message("again") {
        Err(UploadError::Rejected { service, status, body }) => {
            assert_eq!(service, "telegram");
            assert_eq!(status, 400);
            assert!(body.contains("chat not found"));
        }
        other => panic!("expected a rejection, got {other:?}"),
    }

    let requests = server.join().unwrap();
    assert!(requests[0].starts_with("POST /bot123:abc/sendMessage "));
    assert!(requests[0].contains("content-type: application/x-www-form-urlencoded\r\n"));
    assert!(requests[0].ends_with("chat_id=42&text=Scheduled+data+saving%21"));
    assert!(requests[1].ends_with("chat_id=42&text=again"));
}
