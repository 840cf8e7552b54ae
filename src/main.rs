use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use secrecy::ExposeSecret;

use hse_induction_server::{
    app_state::AppState,
    auth::AuthMiddleware,
    config::Config,
    db::Database,
    graphql::create_schema,
    handlers,
    middleware::{RequestIdMiddleware, ACCESS_LOG_FORMAT},
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env();
    if let Err(err) = config.validate_for_production() {
        log::warn!("Configuration is not production ready: {}", err);
    }

    let db = Database::connect(&config)
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    let state = AppState::new(config.clone(), &db)
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    if let (Some(username), Some(access_code)) = (
        config.bootstrap_staff_username.as_deref(),
        config.bootstrap_staff_access_code.as_ref(),
    ) {
        if access_code.expose_secret().is_empty() {
            log::warn!("BOOTSTRAP_STAFF_ACCESS_CODE is empty, skipping staff bootstrap");
        } else if let Err(err) = state
            .participant_service
            .ensure_bootstrap_staff(username, access_code)
            .await
        {
            log::error!("Failed to bootstrap staff account '{}': {}", username, err);
        }
    }

    let schema = create_schema(state.clone());
    let jwt_service = state.jwt_service.clone();
    let bind_address = (config.web_server_host.clone(), config.web_server_port);
    let cors_origin = config.cors_allowed_origin.clone();

    log::info!(
        "Starting {} on http://{}:{}",
        config.site_title,
        bind_address.0,
        bind_address.1
    );

    HttpServer::new(move || {
        let cors = match cors_origin.as_deref() {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header()
                .max_age(3600),
            None => Cors::permissive(),
        };

        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::from(jwt_service.clone()))
            .app_data(web::Data::new(db.clone()))
            .app_data(web::Data::new(schema.clone()))
            .wrap(AuthMiddleware)
            .wrap(RequestIdMiddleware)
            .wrap(Logger::new(ACCESS_LOG_FORMAT))
            .wrap(cors)
            .configure(handlers::configure)
    })
    .bind(bind_address)?
    .run()
    .await
}
