mod context;
mod docs;
mod errors;
mod groups;
mod member;
mod rooms;
mod schemas;
mod serialized;
mod sse;

use std::{
    net::{Ipv6Addr, SocketAddr},
    sync::Arc,
    thread,
};

use axum::routing::get;
use log::info;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use wayfarer_collab::Planner;

pub use context::ServerContext;
pub use errors::{ServerError, ServerResult};

use sse::ServerSentEvents;

/// The default port the server will listen on.
pub const DEFAULT_PORT: u16 = 9050;

pub type Router = axum::Router<ServerContext>;

/// Starts the wayfarer server and serves until the listener fails
pub async fn run_server(planner: Planner, port: u16) -> std::io::Result<()> {
    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, port).into();

    let context = ServerContext {
        planner: Arc::new(planner),
        sse: ServerSentEvents::new(),
    };

    spawn_event_relay(&context);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let version_one_router = Router::new()
        .nest("/groups", groups::router())
        .nest("/rooms", rooms::router())
        .nest("/events", sse::router());

    let root_router = Router::new()
        .nest("/v1", version_one_router)
        .route("/api.json", get(docs::docs))
        .layer(cors)
        .with_state(context);

    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, root_router.into_make_service()).await
}

/// Forwards planner events to every connected event stream
fn spawn_event_relay(context: &ServerContext) {
    let events = context.planner.events();
    let sse = context.sse.clone();

    thread::spawn(move || {
        for event in events.iter() {
            sse.broadcast(event.room_id(), event.into());
        }
    });
}
