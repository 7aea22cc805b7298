//! Application setup and router assembly.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{delete, get, post},
    Router,
};
use sendgrid::{SendGridOptions, SendGridService};
use sqlx::PgPool;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::domains::auth::JwtService;
use crate::kernel::{Ai, ExpoClient, Notifier, OpenAIClient, Scheduler, WebhookDispatcher};
use crate::server::middleware::{extract_client_ip, jwt_auth_middleware};
use crate::server::routes;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_service: Arc<JwtService>,
    /// Issuer name shown in authenticator apps
    pub totp_issuer: String,
    pub sendgrid: Arc<SendGridService>,
    pub ai: Arc<dyn Ai>,
    pub notifier: Notifier,
    pub webhooks: WebhookDispatcher,
}

/// Build the Axum application router and spawn the background workers.
pub fn build_app(pool: PgPool, config: &Config) -> Router {
    let jwt_service = Arc::new(JwtService::new(
        &config.jwt_secret,
        config.jwt_issuer.clone(),
    ));

    let sendgrid = Arc::new(SendGridService::new(SendGridOptions {
        api_key: config.sendgrid_api_key.clone(),
        from_email: config.sendgrid_from_email.clone(),
        from_name: config.sendgrid_from_name.clone(),
    }));

    let ai: Arc<dyn Ai> = Arc::new(OpenAIClient::new(&config.openai_api_key));
    let expo = Arc::new(ExpoClient::new(config.expo_access_token.clone()));
    let notifier = Notifier::new(expo);
    let webhooks = WebhookDispatcher::spawn();

    Scheduler::new(
        pool.clone(),
        sendgrid.clone(),
        notifier.clone(),
        webhooks.clone(),
    )
    .spawn();

    let app_state = AppState {
        db_pool: pool,
        jwt_service: jwt_service.clone(),
        totp_issuer: config.jwt_issuer.clone(),
        sendgrid,
        ai,
        notifier,
        webhooks,
    };

    // CORS: configured origins, or permissive when none are set (development)
    let cors = if config.allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
    };

    // Rate limiting: 10 req/sec per IP with bursts of 20
    let rate_limit_config = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .use_headers()
            .finish()
            .expect("Rate limiter configuration is valid and should never fail"),
    );
    let rate_limit_layer = GovernorLayer {
        config: rate_limit_config,
    };

    let jwt_service_for_middleware = jwt_service.clone();

    Router::new()
        // Auth
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route(
            "/auth/me",
            get(routes::auth::me).patch(routes::auth::update_me),
        )
        .route("/auth/change-password", post(routes::auth::change_password))
        // Two-factor
        .route("/two-factor/enable", post(routes::two_factor::enable))
        .route("/two-factor/verify", post(routes::two_factor::verify))
        .route("/two-factor/disable", post(routes::two_factor::disable))
        // Security
        .route("/security/events", get(routes::security::list_events))
        // Contacts
        .route(
            "/contacts",
            post(routes::contacts::create).get(routes::contacts::list),
        )
        .route(
            "/contacts/:id",
            get(routes::contacts::get_one)
                .patch(routes::contacts::update)
                .delete(routes::contacts::delete),
        )
        .route("/contacts/import", post(routes::contacts::import))
        .route("/contacts/:id/tags", post(routes::contacts::add_tag))
        .route(
            "/contacts/:id/tags/:tag",
            delete(routes::contacts::remove_tag),
        )
        // Templates
        .route(
            "/templates",
            post(routes::templates::create).get(routes::templates::list),
        )
        .route(
            "/templates/:id",
            get(routes::templates::get_one)
                .patch(routes::templates::update)
                .delete(routes::templates::delete),
        )
        .route("/templates/:id/preview", post(routes::templates::preview))
        // Campaigns
        .route(
            "/campaigns",
            post(routes::campaigns::create).get(routes::campaigns::list),
        )
        .route(
            "/campaigns/:id",
            get(routes::campaigns::get_one)
                .patch(routes::campaigns::update)
                .delete(routes::campaigns::delete),
        )
        .route("/campaigns/:id/schedule", post(routes::campaigns::schedule))
        .route("/campaigns/:id/cancel", post(routes::campaigns::cancel))
        .route("/campaigns/:id/send", post(routes::campaigns::send))
        // Analytics
        .route("/analytics/dashboard", get(routes::analytics::dashboard))
        .route(
            "/analytics/campaigns/:id",
            get(routes::analytics::campaign_funnel),
        )
        // AI
        .route("/ai/pitch", post(routes::ai::pitch))
        .route("/ai/subject-lines", post(routes::ai::subject_lines))
        .route("/ai/improve", post(routes::ai::improve))
        // Notifications
        .route("/notifications", get(routes::notifications::list))
        .route(
            "/notifications/read-all",
            post(routes::notifications::mark_all_read),
        )
        .route(
            "/notifications/:id/read",
            post(routes::notifications::mark_read),
        )
        .route(
            "/notifications/:id",
            delete(routes::notifications::delete),
        )
        .route(
            "/device-tokens",
            post(routes::notifications::register_device)
                .delete(routes::notifications::unregister_device),
        )
        // Integrations
        .route(
            "/integrations",
            post(routes::integrations::create).get(routes::integrations::list),
        )
        .route(
            "/integrations/:id",
            get(routes::integrations::get_one)
                .patch(routes::integrations::update)
                .delete(routes::integrations::delete),
        )
        .route("/integrations/:id/test", post(routes::integrations::test))
        // Email provider event webhook (authenticated by obscurity of the
        // provider config, not by session)
        .route(
            "/integrations/email/events",
            post(routes::analytics::ingest_email_events),
        )
        // Automation
        .route(
            "/automation/rules",
            post(routes::automation::create).get(routes::automation::list),
        )
        .route(
            "/automation/rules/:id",
            get(routes::automation::get_one)
                .patch(routes::automation::update)
                .delete(routes::automation::delete),
        )
        // Health check
        .route("/health", get(routes::health::health))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(jwt_service_for_middleware.clone(), req, next)
        }))
        .layer(rate_limit_layer)
        .layer(middleware::from_fn(extract_client_ip))
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
