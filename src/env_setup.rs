use std::fs::File;
use std::io::Write;
use std::path::Path;

pub fn setup_env() -> std::io::Result<()> {
    let env_path = Path::new(".env");
    if !env_path.exists() {
        let mut file = File::create(env_path)?;
        let content = r#"
DATABASE_PATH="portal.db"
POCKET_API_URL="http://localhost:8081"
REQUEST_TIMEOUT_SECONDS=30
SERVER_PORT=8080
CACHE_TTL_SECONDS=10
NETWORK_CHAIN_HASHES="0001,0021"
# Sponsor account secret. Must be set before the free tier endpoints work.
FREE_TIER_PASSPHRASE=""
# Stake committed by the sponsor per free tier staking request, in uPOKT.
FREE_TIER_STAKE_AMOUNT=1000000
RUST_LOG=debug
"#;
        file.write_all(content.as_bytes())?;
        println!("[Env] Created .env file with default configurations.");
    }
    Ok(())
}
