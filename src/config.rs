// config.rs
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_maxage: i64,
    pub port: u16,
    // Payment gateway
    pub paystack_secret_key: String,
    // mNotify SMS gateway
    pub mnotify_api_key: String,
    pub mnotify_sender_id: String,
    pub mnotify_base_url: String,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let jwt_secret = std::env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set");
        let jwt_maxage = std::env::var("JWT_MAXAGE")
            .unwrap_or_else(|_| "60".to_string())
            .parse::<i64>()
            .expect("JWT_MAXAGE must be a number of minutes");
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .expect("PORT must be a valid port number");

        let paystack_secret_key = std::env::var("PAYSTACK_SECRET_KEY")
            .unwrap_or_else(|_| "test_secret_key".to_string());

        let mnotify_api_key = std::env::var("MNOTIFY_API_KEY")
            .unwrap_or_else(|_| "".to_string());
        let mnotify_sender_id = std::env::var("MNOTIFY_SENDER_ID")
            .unwrap_or_else(|_| "DataMartGH".to_string());
        let mnotify_base_url = std::env::var("MNOTIFY_BASE_URL")
            .unwrap_or_else(|_| "https://apps.mnotify.net/smsapi".to_string());

        Config {
            database_url,
            jwt_secret,
            jwt_maxage,
            port,
            paystack_secret_key,
            mnotify_api_key,
            mnotify_sender_id,
            mnotify_base_url,
        }
    }
}
