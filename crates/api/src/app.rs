use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use domain::services::{
    InvitationRepository, InvitationService, NotificationFeed, NotificationSink,
    ParticipantViewBuilder, ResourceStore, UserDirectory,
};
use persistence::repositories;
use shared::jwt::{JwtConfig, JwtError};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{health, invitations, notifications, participants};

/// Storage and collaborator implementations the services run on.
#[derive(Clone)]
pub struct Ports {
    pub invitations: Arc<dyn InvitationRepository>,
    pub resources: Arc<dyn ResourceStore>,
    pub notification_sink: Arc<dyn NotificationSink>,
    pub notification_feed: Arc<dyn NotificationFeed>,
    pub users: Arc<dyn UserDirectory>,
}

impl Ports {
    /// PostgreSQL-backed ports sharing one pool.
    pub fn postgres(pool: PgPool) -> Self {
        let notifications = Arc::new(repositories::NotificationRepository::new(pool.clone()));
        Self {
            invitations: Arc::new(repositories::InvitationRepository::new(pool.clone())),
            resources: Arc::new(repositories::ResourceRepository::new(pool.clone())),
            notification_sink: notifications.clone(),
            notification_feed: notifications,
            users: Arc::new(repositories::UserRepository::new(pool)),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    pub invitations: Arc<InvitationService>,
    pub participants: Arc<ParticipantViewBuilder>,
    pub notifications: Arc<dyn NotificationFeed>,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool, ports: Ports) -> Result<Self, JwtError> {
        let jwt = JwtConfig::with_leeway(
            &config.jwt.private_key,
            &config.jwt.public_key,
            config.jwt.access_token_expiry_secs,
            config.jwt.leeway_secs,
        )?;

        let invitations = InvitationService::new(
            ports.invitations.clone(),
            ports.resources.clone(),
            ports.notification_sink,
            ports.users.clone(),
        );
        let participants =
            ParticipantViewBuilder::new(ports.invitations, ports.resources, ports.users);

        Ok(Self {
            pool,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
            invitations: Arc::new(invitations),
            participants: Arc::new(participants),
            notifications: ports.notification_feed,
        })
    }
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Authenticated through the UserAuth extractor in each handler.
    let api_routes = Router::new()
        .route(
            "/api/v1/invitations",
            post(invitations::send_invitation).get(invitations::list_incoming),
        )
        .route("/api/v1/invitations/sent", get(invitations::list_outgoing))
        .route(
            "/api/v1/invitations/:invitation_id/accept",
            post(invitations::accept_invitation),
        )
        .route(
            "/api/v1/invitations/:invitation_id/reject",
            post(invitations::reject_invitation),
        )
        .route(
            "/api/v1/events/:event_id/participants",
            get(participants::event_participants),
        )
        .route(
            "/api/v1/tasks/:task_id/participants",
            get(participants::task_participants),
        )
        .route(
            "/api/v1/notifications",
            get(notifications::list_notifications),
        )
        .route(
            "/api/v1/notifications/read-all",
            post(notifications::mark_all_read),
        )
        .route(
            "/api/v1/notifications/:notification_id/read",
            post(notifications::mark_read),
        );

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        // Bottom layers run first.
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
