use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::Key;
use actix_web::middleware::Logger;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use env_logger::Env;
use factrush::db::init_db;
use factrush::global::{get_bind_address, get_secret_key};
use factrush::middleware::ClientCtx;
use factrush::session::remove_expired_sessions;
use sea_orm::DatabaseConnection;
use std::time::Duration;

/// How often expired login sessions are swept from the database.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_lib_mods();
    init_our_mods();

    let db = init_db(std::env::var("DATABASE_URL").expect("DATABASE_URL must be set."))
        .await
        .expect("Database failed to initialize.");

    let secret_key = match get_secret_key() {
        Some(key) => Key::from(key),
        None => Key::generate(),
    };

    actix_web::rt::spawn(sweep_sessions(db.clone()));

    log::info!("Listening on {}", get_bind_address());

    HttpServer::new(move || {
        // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
        App::new()
            .app_data(Data::new(db.clone()))
            .app_data(factrush::web::json_config())
            .wrap(factrush::web::error_handlers())
            .wrap(ClientCtx::default())
            .wrap(SessionMiddleware::new(
                CookieSessionStore::default(),
                secret_key.clone(),
            ))
            .wrap(Logger::new("%a %r %s %Dms"))
            .configure(factrush::web::configure)
    })
    // GET    view_ (read/view/render entity)
    // PATCH  update_ (apply edit)
    // POST   create_ / post_ (new entity or action)
    // DELETE destroy_ (remove entity)
    .bind(get_bind_address())?
    .run()
    .await
}

async fn sweep_sessions(db: DatabaseConnection) {
    let mut interval = actix_web::rt::time::interval(SESSION_SWEEP_INTERVAL);
    loop {
        interval.tick().await;
        match remove_expired_sessions(&db).await {
            Ok(0) => {}
            Ok(count) => log::info!("Removed {} expired sessions.", count),
            Err(e) => log::error!("sweep_sessions: {}", e),
        }
    }
}

/// Initialize third party crates we rely on but don't have control over.
pub fn init_lib_mods() {
    // This should be calls to crates without any transformative work applied.
    if let Err(e) = dotenv::dotenv() {
        eprintln!("No .env file loaded: {}", e);
    }
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}

/// Initialize all local mods.
/// Panics
pub fn init_our_mods() {
    factrush::global::init();
}
