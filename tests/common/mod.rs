//! Shared utilities for integration tests.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use k6_core::config::{LogConfig, Settings};
use k6_core::observability::{Console, Stream};
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;

/// In-memory stand-in for a console stream.
#[derive(Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    pub fn stream(&self, is_terminal: bool) -> Stream {
        let capture = self.clone();
        Stream::new(move || Box::new(capture.clone()), is_terminal)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Console whose stdout and stderr are captured separately.
pub fn captured_console(is_terminal: bool) -> (Console, Capture, Capture) {
    let (stdout, stderr) = (Capture::default(), Capture::default());
    let console = Console {
        stdout: stdout.stream(is_terminal),
        stderr: stderr.stream(is_terminal),
    };
    (console, stdout, stderr)
}

/// Settings with the given log output and format, everything else default.
pub fn settings(output: &str, format: &str) -> Settings {
    Settings {
        log: LogConfig {
            output: output.to_string(),
            format: format.to_string(),
            ..Default::default()
        },
        quiet: false,
        config_path: "config.json".into(),
        address: "localhost:6565".to_string(),
    }
}

/// Start a TCP collector standing in for a remote log sink.
///
/// Returns its address and the shared buffer every received byte is appended to.
pub async fn start_collector() -> (String, Arc<Mutex<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    let received = Arc::new(Mutex::new(String::new()));

    let sink = received.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut chunk = String::new();
            if socket.read_to_string(&mut chunk).await.is_ok() {
                sink.lock().unwrap().push_str(&chunk);
            }
        }
    });

    (address, received)
}

/// Poll `check` until it passes or `timeout` elapses.
pub async fn eventually<F: Fn() -> bool>(timeout: Duration, check: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
