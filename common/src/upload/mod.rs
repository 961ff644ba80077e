// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

mod uploadbatch;

pub use uploadbatch::{Payload, SensorDataValue, UploadBatch, PARTICULATE_PREFIX};

#[cfg(feature = "upload")]
mod luftdatenclient;
#[cfg(feature = "upload")]
mod telegramnotifier;

#[cfg(feature = "upload")]
pub use luftdatenclient::{LuftdatenClient, LuftdatenSettings};
#[cfg(feature = "upload")]
pub use telegramnotifier::TelegramNotifier;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[cfg(feature = "upload")]
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("{service} answered {status}: {body}")]
    Rejected {
        service: &'static str,
        status: u16,
        body: String,
    },
}

/// Answers one HTTP request per entry of `responses` on a local port, then returns the raw
/// requests it received (lowercase header names, as sent by reqwest).
#[cfg(all(test, feature = "upload"))]
pub(crate) fn serve(
    responses: Vec<(u16, &'static str)>,
) -> (String, std::thread::JoinHandle<Vec<String>>) {
    use std::io::{BufRead, BufReader, Read, Write};

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let handle = std::thread::spawn(move || {
        let mut requests = Vec::new();

        for (status, body) in responses {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);

            let mut request = String::new();
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
                request.push_str(&line);
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }

            let mut request_body = vec![0; content_length];
            reader.read_exact(&mut request_body).unwrap();
            request.push_str(&String::from_utf8_lossy(&request_body));
            requests.push(request);

            let response = format!(
                "HTTP/1.1 {status} Status\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            reader.get_mut().write_all(response.as_bytes()).unwrap();
        }

        requests
    });

    (url, handle)
}
