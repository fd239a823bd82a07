//! A pipelining echo server.
//!
//! `/slow` answers after a second, everything else right away, so pipelined
//! requests behind a slow one show that responses keep request order:
//!
//! ```text
//! printf 'GET /slow HTTP/1.1\r\n\r\nPOST /echo HTTP/1.1\r\nContent-Length: 2\r\n\r\nhi' | nc 127.0.0.1 8080
//! ```

use std::time::Duration;

use http::StatusCode;
use pipeline_http::handler::make_handler;
use pipeline_http::protocol::{Request, Response};
use pipeline_http::server::{Server, ServerConfig};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let server = Server::builder()
        .address("127.0.0.1:8080")
        .config(ServerConfig::default().drain_timeout(Some(Duration::from_secs(5))))
        .handler(make_handler(echo))
        .build()
        .expect("server config is valid");

    let handle = match server.start().await {
        Ok(handle) => handle,
        Err(e) => {
            error!(cause = %e, "can't start server");
            return;
        }
    };
    info!(address = %handle.local_addr(), "serving, press ctrl-c to stop");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(cause = %e, "can't listen for ctrl-c");
    }
    handle.stop().await;
}

async fn echo(request: Request) -> Result<Response, std::io::Error> {
    info!(method = %request.method(), path = request.path(), "handle request");

    let response = match request.path() {
        "/slow" => {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Response::ok("slow\r\n")
        }
        "/echo" => Response::ok(request.into_body()),
        _ => Response::with_body(StatusCode::NOT_FOUND, "not found\r\n"),
    };
    Ok(response)
}
