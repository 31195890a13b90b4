//! Thin REST clients for the two external collaborators: the bucket
//! listing API (seeding only) and the Pub/Sub subscription the
//! reconciler drains. Both honour the conventional emulator host
//! environment variables and an optional bearer token.

pub mod pubsub;
pub mod storage;

/// Bearer token for the live APIs; unnecessary against an emulator.
const TOKEN_ENV: &str = "GOOGLE_ACCESS_TOKEN";

/// Resolve a service base URL from an emulator env var, defaulting to
/// the public endpoint. Emulator hosts are commonly given without a
/// scheme ("localhost:8085").
fn base_url(emulator_env: &str, default: &str) -> String {
    match std::env::var(emulator_env) {
        Ok(host) if !host.is_empty() => {
            if host.contains("://") {
                host.trim_end_matches('/').to_string()
            } else {
                format!("http://{host}")
            }
        }
        _ => default.to_string(),
    }
}

fn bearer_token() -> Option<String> {
    std::env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty())
}
