//! Best-effort shutdown of a service mesh proxy (linkerd) running next to us.
//!
//! Jobs that finish while the proxy sidecar keeps running never complete, so
//! once certificates are installed the proxy is asked to exit.

use std::time::Duration;

use crate::config::Sidecar;

const KUBERNETES_PORT_VAR: &str = "KUBERNETES_PORT";

/// Whether the process runs inside a Kubernetes pod
pub fn running_in_kubernetes() -> bool {
    std::env::var(KUBERNETES_PORT_VAR).is_ok_and(|port| !port.is_empty())
}

/// Posts to the sidecar shutdown endpoint.
///
/// Returns `true` only when the proxy acknowledged with a success status;
/// every failure is logged and reported as `false`.
pub async fn try_shutdown(config: &Sidecar) -> bool {
    if !config.shutdown_enabled {
        return false;
    }

    if !running_in_kubernetes() {
        tracing::debug!("not running in kubernetes, skipping sidecar shutdown");
        return false;
    }

    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        // the sidecar listens on the pod's loopback
        .no_proxy()
        .build()
    {
        Ok(client) => client,
        Err(err) => {
            tracing::warn!("failed to build sidecar client: {err}");
            return false;
        }
    };

    match client.post(config.shutdown_url.as_ref()).send().await {
        Ok(response) => {
            tracing::info!(status = %response.status(), "sidecar shutdown requested");
            response.status().is_success()
        }
        Err(err) => {
            tracing::warn!("sidecar shutdown failed: {err}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        borrow::Cow,
        io::{Read, Write},
        net::TcpListener,
    };

    use super::*;

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(future)
    }

    fn sidecar(url: String) -> Sidecar {
        Sidecar {
            shutdown_enabled: true,
            shutdown_url: Cow::Owned(url),
            timeout_secs: 2,
        }
    }

    #[test]
    fn test_disabled_shutdown_is_skipped() {
        let config = Sidecar::default();
        assert!(!block_on(try_shutdown(&config)));
    }

    #[test]
    fn test_shutdown_outside_kubernetes() {
        figment::Jail::expect_with(|jail| {
            jail.set_env(KUBERNETES_PORT_VAR, "");

            let config = sidecar("http://127.0.0.1:9/shutdown".to_string());
            assert!(!running_in_kubernetes());
            assert!(!block_on(try_shutdown(&config)));

            Ok(())
        });
    }

    #[test]
    fn test_shutdown_unreachable_sidecar() {
        figment::Jail::expect_with(|jail| {
            jail.set_env(KUBERNETES_PORT_VAR, "tcp://10.0.0.1:443");

            // Bind and drop to get a port nobody listens on
            let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
            let config = sidecar(format!("http://127.0.0.1:{port}/shutdown"));

            assert!(!block_on(try_shutdown(&config)));

            Ok(())
        });
    }

    #[test]
    fn test_shutdown_acknowledged() {
        figment::Jail::expect_with(|jail| {
            jail.set_env(KUBERNETES_PORT_VAR, "tcp://10.0.0.1:443");

            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let port = listener.local_addr().unwrap().port();
            let server = std::thread::spawn(move || {
                let (mut stream, _) = listener.accept().unwrap();
                let mut request = [0u8; 1024];
                let read = stream.read(&mut request).unwrap();
                stream
                    .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                    .unwrap();
                String::from_utf8_lossy(&request[..read]).into_owned()
            });

            let config = sidecar(format!("http://127.0.0.1:{port}/shutdown"));
            assert!(block_on(try_shutdown(&config)));

            let request = server.join().unwrap();
            assert!(request.starts_with("POST /shutdown"));

            Ok(())
        });
    }
}
