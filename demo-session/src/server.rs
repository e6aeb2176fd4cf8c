use axum::Router;
use std::net::SocketAddr;
use tokio::task::JoinHandle;

pub(crate) async fn spawn_http_server(
    port: u16,
    app: Router,
) -> JoinHandle<Result<(), std::io::Error>> {
    tokio::spawn(async move {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("HTTP server listening on {}", addr);
        axum::serve(listener, app).await
    })
}
