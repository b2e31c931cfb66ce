use once_cell::sync::OnceCell;

/// Session lifetime used when SESSION_TIME is not configured, in minutes.
const DEFAULT_SESSION_TIME: i64 = 60 * 24 * 30;
const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";

static SESSION_TIME: OnceCell<chrono::Duration> = OnceCell::new();
static BIND_ADDRESS: OnceCell<String> = OnceCell::new();
static SECRET_KEY: OnceCell<Option<Vec<u8>>> = OnceCell::new();

/// Returns how long a login session lasts.
pub fn get_session_time() -> &'static chrono::Duration {
    SESSION_TIME.get_or_init(|| chrono::Duration::minutes(DEFAULT_SESSION_TIME))
}

/// Returns the host:port pair the web server listens on.
pub fn get_bind_address() -> &'static str {
    BIND_ADDRESS.get_or_init(|| DEFAULT_BIND_ADDRESS.to_owned())
}

/// Returns the configured cookie signing key, if any.
pub fn get_secret_key() -> Option<&'static [u8]> {
    SECRET_KEY.get_or_init(|| None).as_deref()
}

/// Reads configuration from the environment.
/// Panics on values which are present but unusable.
pub fn init() {
    if let Ok(time) = std::env::var("SESSION_TIME") {
        let time = time
            .parse::<i64>()
            .expect("SESSION_TIME cannot be parsed as an integer");
        if time <= 0 {
            panic!("SESSION_TIME must be a positive number of minutes!");
        }
        SESSION_TIME
            .set(chrono::Duration::minutes(time))
            .expect("failed to set SESSION_TIME");
    }

    if let Ok(address) = std::env::var("BIND_ADDRESS") {
        BIND_ADDRESS
            .set(address)
            .expect("failed to set BIND_ADDRESS");
    }

    let key = match std::env::var("SECRET_KEY") {
        Ok(key) if key.len() >= 64 => Some(key.into_bytes()),
        Ok(_) => panic!("SECRET_KEY must be at least 64 bytes long!"),
        Err(_) => {
            log::warn!("SECRET_KEY is not set; sessions will not survive a restart.");
            None
        }
    };
    SECRET_KEY.set(key).expect("failed to set SECRET_KEY");
}
