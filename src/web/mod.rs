pub mod account;
pub mod answer;
pub mod error;
pub mod index;
pub mod member;
pub mod question;
pub mod tag;
pub mod vote;

use actix_web::http::StatusCode;
use actix_web::middleware::ErrorHandlers;
use actix_web::web;

/// Configures the web app
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut web::ServiceConfig) {
    // Descending order. Order is important.
    // Route resolution will stop at the first match.
    index::configure(conf);
    account::configure(conf);
    member::configure(conf);
    question::configure(conf);
    answer::configure(conf);
    tag::configure(conf);
    vote::configure(conf);
}

/// JSON body settings. Unreadable bodies are a client error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| actix_web::error::ErrorBadRequest(err.to_string()))
}

/// Turns every error status the API produces into a JSON document.
pub fn error_handlers<B: 'static>() -> ErrorHandlers<B> {
    ErrorHandlers::new()
        .handler(StatusCode::BAD_REQUEST, error::error_document)
        .handler(StatusCode::UNAUTHORIZED, error::error_document)
        .handler(StatusCode::FORBIDDEN, error::error_document)
        .handler(StatusCode::NOT_FOUND, error::error_document)
        .handler(StatusCode::METHOD_NOT_ALLOWED, error::error_document)
        .handler(StatusCode::PAYLOAD_TOO_LARGE, error::error_document)
        .handler(StatusCode::INTERNAL_SERVER_ERROR, error::error_document)
}
