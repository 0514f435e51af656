// External crates
use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::Full;
use hyper::{
    body::Incoming,
    header::CONTENT_TYPE,
    http::{Method, Request, Response, StatusCode},
    service::service_fn,
};
use hyper_util::{rt::TokioExecutor, server::conn::auto::Builder as HyperServerBuilder};
use prometheus::{Encoder, TextEncoder};
use std::{convert::Infallible, net::SocketAddr};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

#[instrument(
    name = "metrics_server::handler",
    target = "metrics::http",
    skip_all,
    level = "debug"
)]
async fn metrics_handler(_req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    tracing::debug!("Collecting all registered prometheus metrics");
    let metrics_families = prometheus::gather();

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metrics_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics into prometheus text format");
        return Ok(plain_response(StatusCode::INTERNAL_SERVER_ERROR, "Encoding Failed"));
    }
    tracing::debug!(
        writer_buffer = %buffer.len(),
        "Encoded collected metrics into prometheus text format"
    );

    let mut response = Response::new(Full::new(Bytes::from(buffer)));
    if let Ok(content_type) = encoder.format_type().parse() {
        response.headers_mut().insert(CONTENT_TYPE, content_type);
    }
    Ok(response)
}

fn plain_response(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    response
}

/// Serve `GET /metrics` on `addr` until `cancel` fires
#[instrument(
    name = "metrics_server::start_metrics_server",
    target = "metrics::http",
    skip_all,
    level = "debug"
)]
pub async fn start_metrics_server(addr: &str, cancel: CancellationToken) -> Result<()> {
    let addr: SocketAddr = addr
        .parse()
        .with_context(|| format!("Invalid metrics listen address {addr:?}"))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind metrics server to {addr}"))?;

    tracing::info!(
        metrics_endpoint = %addr,
        "Pipeline input metrics available at http://{addr}/metrics"
    );

    loop {
        let stream = tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, _)) => stream,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to accept metrics connection");
                    continue;
                }
            },
        };

        let io = hyper_util::rt::TokioIo::new(stream);
        let service = service_fn(|req: Request<Incoming>| async move {
            match (req.method(), req.uri().path()) {
                (&Method::GET, "/metrics") => metrics_handler(req).await,
                _ => Ok(plain_response(StatusCode::NOT_FOUND, "Not Found")),
            }
        });

        tracing::debug!("Spawning background task to handle connection to metrics server");
        tokio::spawn(async move {
            if let Err(err) = HyperServerBuilder::new(TokioExecutor::new())
                .serve_connection(io, service)
                .await
            {
                tracing::error!(
                    error = %err,
                    "Metrics server error"
                );
            }
        });
    }

    tracing::debug!("Metrics server stopped");
    Ok(())
}
