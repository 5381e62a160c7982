use crate::models::{StakedApplicationSummary, StakingStatus};
use crate::pocket::{NetworkError, PocketNetwork};
use log::warn;
use primitive_types::U256;

fn parse_amount(raw: &str) -> Result<U256, NetworkError> {
    U256::from_dec_str(raw)
        .map_err(|e| NetworkError::Rejected(format!("bad token amount {raw:?}: {e}")))
}

async fn compute<N: PocketNetwork>(
    network: &N,
) -> Result<StakedApplicationSummary, NetworkError> {
    let staked = network.get_applications(StakingStatus::Staked).await?;

    if staked.is_empty() {
        return Ok(StakedApplicationSummary::zeroed());
    }

    let total = U256::from(staked.len());
    let mut total_staked = U256::zero();
    let mut total_relays = U256::zero();

    for application in &staked {
        total_staked += parse_amount(&application.staked_tokens)?;
        total_relays += parse_amount(&application.max_relays)?;
    }

    // U256 division truncates, which is exactly what the dashboard shows.
    Ok(StakedApplicationSummary {
        total_applications: total.to_string(),
        average_staked: (total_staked / total).to_string(),
        average_max_relays: (total_relays / total).to_string(),
    })
}

/// Fleet-wide statistics over every application staked on the network.
///
/// Best-effort dashboard number: any failure along the way comes back as a
/// zeroed summary so the endpoint stays available, with the cause in the log.
pub async fn staked_application_summary<N: PocketNetwork>(
    network: &N,
) -> StakedApplicationSummary {
    match compute(network).await {
        Ok(summary) => summary,
        Err(e) => {
            warn!("[Summary] Falling back to zeroed summary: {e}");
            StakedApplicationSummary::zeroed()
        }
    }
}
