use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::test::TestRequest;
use serde_json::json;

pub const PASSWORD: &str = "hunter22";

/// Builds the full application around an in-memory database.
#[macro_export]
macro_rules! test_app {
    ($db:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($db.clone()))
                .app_data(factrush::web::json_config())
                .wrap(factrush::web::error_handlers())
                .wrap(factrush::middleware::ClientCtx::default())
                .wrap(actix_session::SessionMiddleware::new(
                    actix_session::storage::CookieSessionStore::default(),
                    actix_web::cookie::Key::from(&[7u8; 64]),
                ))
                .configure(factrush::web::configure),
        )
        .await
    };
}

/// Registers an account and logs it in, returning the session cookie.
#[macro_export]
macro_rules! sign_in {
    ($app:expr, $name:expr, $email:expr) => {{
        let res = actix_web::test::call_service(
            &$app,
            common::register_request($name, $email).to_request(),
        )
        .await;
        assert_eq!(res.status(), actix_web::http::StatusCode::CREATED);

        let res = actix_web::test::call_service(
            &$app,
            common::login_request($email, common::PASSWORD).to_request(),
        )
        .await;
        assert_eq!(res.status(), actix_web::http::StatusCode::OK);
        common::session_cookie(&res)
    }};
}

pub fn register_request(name: &str, email: &str) -> TestRequest {
    TestRequest::post().uri("/auth/register").set_json(json!({
        "name": name,
        "email": email,
        "password": PASSWORD,
        "confirm_password": PASSWORD,
    }))
}

pub fn login_request(email: &str, password: &str) -> TestRequest {
    TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({ "email": email, "password": password }))
}

/// Pulls the session cookie out of a response which set one.
pub fn session_cookie<B: MessageBody>(res: &ServiceResponse<B>) -> Cookie<'static> {
    res.response()
        .cookies()
        .find(|c| c.name() == "id")
        .map(|c| c.into_owned())
        .expect("response did not set a session cookie")
}
