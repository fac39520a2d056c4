use log::info;
use std::net::SocketAddr;
use warp::Filter;

pub const RUNNING: &str = "🤖 Bot is running! (Status: Active)";

pub fn routes() -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let root_route = warp::path::end()
        .and(warp::get())
        .map(|| warp::reply::with_status(RUNNING, warp::http::StatusCode::OK));

    let health_route = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    root_route.or(health_route)
}

/// Serves the liveness routes until the process exits.
pub async fn serve(port: u16) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Liveness server listening on {}", addr);
    warp::serve(routes()).run(addr).await;
}
