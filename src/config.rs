use std::env;

/// Everything we read from the environment, resolved once at startup.
///
/// The free tier sponsor passphrase is secret material and has to come from
/// the environment; there is deliberately no baked-in value for it.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub database_path: String,
    pub pocket_api_url: String,
    pub request_timeout_secs: u64,
    pub server_port: u16,
    pub cache_ttl_secs: u64,
    pub chain_hashes: Vec<String>,
    pub free_tier_passphrase: String,
    pub free_tier_stake_amount: String,
}

impl PortalConfig {
    pub fn from_env() -> PortalConfig {
        let chain_hashes = env::var("NETWORK_CHAIN_HASHES")
            .unwrap_or("0001,0021".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        PortalConfig {
            database_path: env::var("DATABASE_PATH").unwrap_or("portal.db".to_string()),
            pocket_api_url: env::var("POCKET_API_URL")
                .unwrap_or("http://localhost:8081".to_string()),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
            cache_ttl_secs: env::var("CACHE_TTL_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            chain_hashes,
            free_tier_passphrase: env::var("FREE_TIER_PASSPHRASE").unwrap_or_default(),
            free_tier_stake_amount: env::var("FREE_TIER_STAKE_AMOUNT")
                .unwrap_or("1000000".to_string()),
        }
    }
}
