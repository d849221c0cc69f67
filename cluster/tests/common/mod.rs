#![allow(dead_code)]

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;

use quorumgate_common::{Member, MemberId};

/// Serves the router on an ephemeral local port and returns its base URL.
pub async fn serve(app: Router) -> String {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .try_init();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(axum::serve(listener, app).into_future());
    format!("http://{addr}")
}

/// Wraps a router so every request it receives bumps the counter.
pub fn counted(app: Router, counter: Arc<AtomicUsize>) -> Router {
    app.layer(middleware::from_fn(move |req: Request, next: Next| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            let resp: Response = next.run(req).await;
            resp
        }
    }))
}

/// A URL in the refused-connection range; nothing listens there.
pub async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn member(id: u64, name: &str, peer_urls: &[&str], client_urls: &[&str]) -> Member {
    Member {
        id: MemberId(id),
        name: name.to_string(),
        peer_urls: peer_urls.iter().map(|u| u.to_string()).collect(),
        client_urls: client_urls.iter().map(|u| u.to_string()).collect(),
        is_learner: false,
    }
}
