use actix_web::body::{BoxBody, EitherBody};
use actix_web::dev::ServiceResponse;
use actix_web::http::{header, header::HeaderValue};
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::Result;

/// Shown instead of the cause of any 5xx response.
const SERVER_ERROR_MESSAGE: &str = "Server error";

/// Rewrites an error response into a `{"message": ...}` JSON document.
///
/// Responses a route already built with a body of its own are passed through
/// with only the caching headers added.
pub fn error_document<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    let status = res.status();
    let message = match res.response().error() {
        Some(err) if status.is_server_error() => {
            log::error!("{} {}: {}", status, res.request().path(), err);
            Some(SERVER_ERROR_MESSAGE.to_owned())
        }
        Some(err) => Some(err.to_string()),
        None if res.headers().contains_key(header::CONTENT_TYPE) => None,
        None => Some(
            status
                .canonical_reason()
                .unwrap_or(SERVER_ERROR_MESSAGE)
                .to_owned(),
        ),
    };

    let message = match message {
        Some(message) => message,
        None => {
            let mut res = res.map_into_left_body();
            set_error_headers(&mut res);
            return Ok(ErrorHandlerResponse::Response(res));
        }
    };

    let body = BoxBody::new(serde_json::json!({ "message": message }).to_string());
    let mut res: ServiceResponse<EitherBody<B>> =
        res.map_body(|_, _| EitherBody::<B, BoxBody>::right(body));

    set_error_headers(&mut res);
    res.response_mut().headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    Ok(ErrorHandlerResponse::Response(res))
}

fn set_error_headers<B>(res: &mut ServiceResponse<B>) {
    let headers = res.response_mut().headers_mut();
    // Proxies love to cache error pages permanently. Explicitly say not to do that.
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
}
