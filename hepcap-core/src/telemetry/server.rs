use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::{HepError, Result};
use crate::telemetry::handle_metrics;

/// Serves `/metrics` on `addr` until `shutdown` fires (spec §9 "C9
/// Telemetry"). Mirrors the accept-loop-plus-watch-shutdown shape the
/// ingest receiver and worker pool use, so every long-lived task in the
/// process is cancelled the same way.
pub async fn start_metrics_server(
    addr: SocketAddr,
    registry: prometheus::Registry,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let registry = Arc::new(registry);
    let listener = TcpListener::bind(addr).await.map_err(HepError::Bind)?;
    info!(%addr, "metrics server listening");

    loop {
        tokio::select! {
            res = shutdown.changed() => {
                if res.is_err() || *shutdown.borrow() {
                    info!("metrics server shutting down");
                    break;
                }
            }
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!(error = %e, "metrics server: accept error");
                        continue;
                    }
                };
                let registry = registry.clone();
                tokio::spawn(async move {
                    let svc = hyper::service::service_fn(move |req: Request<Incoming>| {
                        let registry = registry.clone();
                        async move {
                            if req.uri().path() == "/metrics" {
                                match handle_metrics(&registry) {
                                    Ok(resp) => Ok::<_, hyper::Error>(resp),
                                    Err(_) => Ok(not_found_response(hyper::StatusCode::INTERNAL_SERVER_ERROR)),
                                }
                            } else {
                                Ok(not_found_response(hyper::StatusCode::NOT_FOUND))
                            }
                        }
                    });

                    let builder = ConnBuilder::new(TokioExecutor::new());
                    if let Err(e) = builder.serve_connection(TokioIo::new(stream), svc).await {
                        warn!(?peer, error = %e, "metrics server: serve_connection error");
                    }
                });
            }
        }
    }

    Ok(())
}

fn not_found_response(
    status: hyper::StatusCode,
) -> hyper::Response<http_body_util::combinators::BoxBody<Bytes, hyper::Error>> {
    let body = Full::new(Bytes::from_static(b"not found")).map_err(|never| match never {}).boxed();
    let mut resp = hyper::Response::new(body);
    *resp.status_mut() = status;
    resp
}
