use serde::Deserialize;
use std::env;

// Top-level configuration container, assembled once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub reservation: ReservationConfig,
    pub booking: BookingConfig,
    pub qr: QrConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
}

// Knobs for the optimistic claim protocol.
#[derive(Debug, Clone, Deserialize)]
pub struct ReservationConfig {
    pub max_attempts: u32,
    pub backoff_min_ms: u64,
    pub backoff_max_ms: u64,
}

// Booking lifecycle policy: cancellation cutoff and the pending-expiry sweep.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    pub cancel_cutoff_hours: i64,
    pub pending_ttl_minutes: i64,
    pub reaper_interval_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QrConfig {
    pub secret: String,
}

// Bootstrap admin credentials; regular users are provisioned out of band.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub admin_email: String,
    pub admin_password: String,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            app: AppConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .expect("PORT must be a valid number"),
                environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
                rust_log: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "ticketgate=debug,tower_http=debug".to_string()),
            },
            reservation: ReservationConfig {
                max_attempts: env::var("RESERVATION_MAX_ATTEMPTS")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()
                    .expect("RESERVATION_MAX_ATTEMPTS must be a valid number"),
                backoff_min_ms: env::var("RESERVATION_BACKOFF_MIN_MS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .expect("RESERVATION_BACKOFF_MIN_MS must be a valid number"),
                backoff_max_ms: env::var("RESERVATION_BACKOFF_MAX_MS")
                    .unwrap_or_else(|_| "50".to_string())
                    .parse()
                    .expect("RESERVATION_BACKOFF_MAX_MS must be a valid number"),
            },
            booking: BookingConfig {
                cancel_cutoff_hours: env::var("CANCEL_CUTOFF_HOURS")
                    .unwrap_or_else(|_| "24".to_string())
                    .parse()
                    .expect("CANCEL_CUTOFF_HOURS must be a valid number"),
                pending_ttl_minutes: env::var("PENDING_TTL_MINUTES")
                    .unwrap_or_else(|_| "15".to_string())
                    .parse()
                    .expect("PENDING_TTL_MINUTES must be a valid number"),
                reaper_interval_seconds: env::var("REAPER_INTERVAL_SECONDS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .expect("REAPER_INTERVAL_SECONDS must be a valid number"),
            },
            qr: QrConfig {
                secret: env::var("QR_SECRET").expect("QR_SECRET must be set"),
            },
            auth: AuthConfig {
                admin_email: env::var("ADMIN_EMAIL").expect("ADMIN_EMAIL must be set"),
                admin_password: env::var("ADMIN_PASSWORD").expect("ADMIN_PASSWORD must be set"),
            },
        }
    }

    /// Fixed defaults for tests; no environment access.
    pub fn for_tests() -> Self {
        Config {
            app: AppConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                environment: "test".to_string(),
                rust_log: "ticketgate=debug".to_string(),
            },
            reservation: ReservationConfig {
                max_attempts: 3,
                backoff_min_ms: 1,
                backoff_max_ms: 5,
            },
            booking: BookingConfig {
                cancel_cutoff_hours: 24,
                pending_ttl_minutes: 15,
                reaper_interval_seconds: 60,
            },
            qr: QrConfig {
                secret: "test-secret".to_string(),
            },
            auth: AuthConfig {
                admin_email: "admin@example.com".to_string(),
                admin_password: "admin".to_string(),
            },
        }
    }
}
