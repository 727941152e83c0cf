//! HTTP server and graceful shutdown.
//!
//! On SIGTERM or Ctrl-C the server stops accepting, lets every open
//! connection finish its in-flight requests, then returns from
//! [`Server::serve`].
//!
//! Request bodies are collected in full before routing, up to
//! [`Server::max_body`] bytes. Larger bodies get `413 Payload Too Large`.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::error::Error;
use crate::response::Response;
use crate::router::Router;

const DEFAULT_MAX_BODY: usize = 2 * 1024 * 1024;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    max_body: usize,
}

impl Server {
    /// Configures the listen address, `host:port`.
    ///
    /// ```rust
    /// use reqmap::Server;
    /// assert!(Server::bind("0.0.0.0:8080").is_ok());
    /// assert!(Server::bind("localhost").is_err());
    /// ```
    pub fn bind(addr: &str) -> Result<Self, Error> {
        Ok(Self { addr: addr.parse()?, max_body: DEFAULT_MAX_BODY })
    }

    /// Largest request body, in bytes, the server collects. Default 2 MiB.
    pub fn max_body(mut self, bytes: usize) -> Self {
        self.max_body = bytes;
        self
    }

    /// Accepts connections and dispatches every request through `router`
    /// until a shutdown signal arrives and all connections have drained.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let router = Arc::new(router);

        let max_body = self.max_body;

        info!(addr = %self.addr, routes = router.table().len(), max_body, "reqmap listening");

        let mut connections = JoinSet::new();
        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Shutdown is checked first so a signal stops accepting even
                // with a backlog of pending connections.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = connections.len(), "shutdown signal received, draining connections");
                    break;
                }

                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(v) => v,
                        Err(e) => {
                            warn!("accept error: {e}");
                            continue;
                        }
                    };
                    let router = Arc::clone(&router);

                    connections.spawn(async move {
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            async move { dispatch(&router, req, max_body).await }
                        });
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(TokioIo::new(stream), svc)
                            .await
                        {
                            debug!(%peer, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connections so the set stays small.
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        while connections.join_next().await.is_some() {}

        info!("reqmap stopped");
        Ok(())
    }
}

/// Collects the body, routes, and converts the response for hyper.
async fn dispatch(
    router: &Router,
    req: hyper::Request<Incoming>,
    max_body: usize,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    let body = match collect_body(body, max_body).await {
        Ok(body) => body,
        Err(status) => {
            warn!(path = parts.uri.path(), %status, max_body, "request body rejected");
            return Ok(Response::status(status).into_http());
        }
    };

    let response = router.handle(http::Request::from_parts(parts, body)).await;
    Ok(response.into_http())
}

/// Reads `body` to the end. `413` past `limit` bytes, `400` on a read error.
async fn collect_body<B>(body: B, limit: usize) -> Result<Bytes, StatusCode>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => Err(StatusCode::PAYLOAD_TOO_LARGE),
        Err(e) => {
            debug!("failed to read request body: {e}");
            Err(StatusCode::BAD_REQUEST)
        }
    }
}

/// Resolves on SIGTERM (Unix) or Ctrl-C. A signal that cannot be installed
/// is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn body_within_limit_is_collected() {
        let body = collect_body(Full::new(Bytes::from_static(b"{}")), 2).await;
        assert_eq!(body, Ok(Bytes::from_static(b"{}")));
    }

    #[tokio::test]
    async fn oversized_body_is_413() {
        let body = collect_body(Full::new(Bytes::from_static(b"too long")), 4).await;
        assert_eq!(body, Err(StatusCode::PAYLOAD_TOO_LARGE));
    }

    #[test]
    fn max_body_is_configurable() {
        let server = Server::bind("127.0.0.1:0").unwrap();
        assert_eq!(server.max_body, DEFAULT_MAX_BODY);
        assert_eq!(server.max_body(16).max_body, 16);
    }
}
