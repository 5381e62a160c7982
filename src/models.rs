use serde::{Deserialize, Serialize};

// Just a home for the data structures we use in the app.

/// Staking status of an application on the Pocket network.
///
/// The network RPC speaks numeric codes (0, 1, 2); our own API speaks the
/// variant names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StakingStatus {
    Unstaked,
    Unstaking,
    Staked,
}

impl StakingStatus {
    pub fn from_code(code: u8) -> Option<StakingStatus> {
        match code {
            0 => Some(StakingStatus::Unstaked),
            1 => Some(StakingStatus::Unstaking),
            2 => Some(StakingStatus::Staked),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            StakingStatus::Unstaked => 0,
            StakingStatus::Unstaking => 1,
            StakingStatus::Staked => 2,
        }
    }
}

/// Dashboard-side lifecycle status of an application record.
pub mod application_statuses {
    pub const AWAITING_STAKING: &str = "AWAITING_STAKING";
    pub const IN_SERVICE: &str = "IN_SERVICE";
}

/// Public projection of a Pocket account. This is the only account material
/// the record store ever sees.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicPocketAccount {
    pub address: String,
    pub public_key: String,
}

/// A full account as handed back by the account directory. The private key
/// arrives already encrypted under the passphrase; we never see plaintext.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PocketAccount {
    pub address: String,
    pub public_key: String,
    pub encrypted_private_key: String,
}

/// One-time credential bundle returned to the caller that created an
/// application. It is never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivatePocketAccount {
    pub address: String,
    pub public_key: String,
    pub encrypted_private_key: String,
    pub passphrase: String,
}

/// An application record as the dashboard stores it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PocketApplication {
    pub name: String,
    pub owner: String,
    pub url: String,
    pub contact_email: String,
    pub user: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub free_tier: bool,
    pub public_pocket_account: PublicPocketAccount,
    pub status: String,
    pub last_changed_at: i64,
    pub created_at: i64,
}

/// Network-side view of an application. Token amounts stay as decimal
/// strings end to end; they can exceed u64 and we never do float math on
/// them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkApplication {
    pub address: String,
    pub public_key: String,
    pub staked_tokens: String,
    pub max_relays: String,
    pub status: StakingStatus,
    pub chains: Vec<String>,
    pub jailed: bool,
}

impl NetworkApplication {
    /// Placeholder view for an application the network does not know yet
    /// (fresh creations that have not staked). Keeps the listing endpoints
    /// serving data during onboarding instead of erroring.
    pub fn unstaked_placeholder(
        account: &PublicPocketAccount,
        chains: &[String],
        parameters: &ApplicationParameters,
    ) -> NetworkApplication {
        NetworkApplication {
            address: account.address.clone(),
            public_key: account.public_key.clone(),
            staked_tokens: "0".to_string(),
            max_relays: parameters.base_relays_per_pokt.clone(),
            status: StakingStatus::Unstaked,
            chains: chains.to_vec(),
            jailed: false,
        }
    }

    /// View of a free tier application. Free tier apps relay through the
    /// shared sponsor account, so the network data is the sponsor's, never
    /// the application's own address.
    pub fn free_tier_view(
        sponsor: &PocketAccount,
        stake_amount: &str,
        chains: &[String],
        parameters: &ApplicationParameters,
    ) -> NetworkApplication {
        NetworkApplication {
            address: sponsor.address.clone(),
            public_key: sponsor.public_key.clone(),
            staked_tokens: stake_amount.to_string(),
            max_relays: parameters.base_relays_per_pokt.clone(),
            status: StakingStatus::Staked,
            chains: chains.to_vec(),
            jailed: false,
        }
    }
}

/// Application-level parameters of the network (app module params).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationParameters {
    pub app_stake_minimum: String,
    pub base_relays_per_pokt: String,
}

/// A stored application merged with its live network data. Recomputed on
/// every read; this is a view, not an entity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedPocketApplication {
    #[serde(flatten)]
    pub application: PocketApplication,
    pub network_data: NetworkApplication,
}

/// Application Authentication Token, signed by the account that staked.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aat {
    pub version: String,
    pub client_public_key: String,
    pub application_public_key: String,
    pub application_signature: String,
}

/// Fleet-wide statistics over the staked application set. Values are
/// decimal strings because the totals do not fit standard integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StakedApplicationSummary {
    pub total_applications: String,
    pub average_staked: String,
    pub average_max_relays: String,
}

impl StakedApplicationSummary {
    pub fn zeroed() -> StakedApplicationSummary {
        StakedApplicationSummary {
            total_applications: "0".to_string(),
            average_staked: "0".to_string(),
            average_max_relays: "0".to_string(),
        }
    }
}

/// What a caller sends to register a new application.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationRequest {
    pub name: String,
    pub owner: String,
    #[serde(default)]
    pub url: String,
    pub contact_email: String,
    pub user: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub imported: bool,
    #[serde(default)]
    pub private_key: Option<String>,
}

/// Everything handed back after a successful creation: the one-time private
/// credentials plus a synthesized network view of the new application.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedApplication {
    pub private_application_data: PrivatePocketAccount,
    pub network_data: NetworkApplication,
}

/// Minimal user registration payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub username: String,
}

/// Good-enough email shape check: one @, non-empty local part, dotted
/// domain, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staking_status_codes_round_trip() {
        for code in 0..=2 {
            let status = StakingStatus::from_code(code).unwrap();
            assert_eq!(status.code(), code);
        }
        assert!(StakingStatus::from_code(3).is_none());
    }

    #[test]
    fn email_validation_accepts_normal_addresses() {
        assert!(is_valid_email("dev@example.com"));
        assert!(is_valid_email("first.last@sub.example.io"));
    }

    #[test]
    fn email_validation_rejects_malformed_addresses() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("no-at-sign.example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("dev@"));
        assert!(!is_valid_email("dev@example"));
        assert!(!is_valid_email("dev@.example.com"));
        assert!(!is_valid_email("dev name@example.com"));
        assert!(!is_valid_email("dev@exa@mple.com"));
    }

    #[test]
    fn placeholder_view_is_unstaked_with_configured_chains() {
        let account = PublicPocketAccount {
            address: "aaaa".to_string(),
            public_key: "bbbb".to_string(),
        };
        let parameters = ApplicationParameters {
            app_stake_minimum: "1000000".to_string(),
            base_relays_per_pokt: "167".to_string(),
        };
        let chains = vec!["0001".to_string(), "0021".to_string()];

        let view = NetworkApplication::unstaked_placeholder(&account, &chains, &parameters);

        assert_eq!(view.address, "aaaa");
        assert_eq!(view.status, StakingStatus::Unstaked);
        assert_eq!(view.staked_tokens, "0");
        assert_eq!(view.max_relays, "167");
        assert_eq!(view.chains, chains);
    }
}
