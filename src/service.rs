use crate::config::PortalConfig;
use crate::db::AppStore;
use crate::errors::PortalError;
use crate::models::{
    application_statuses, is_valid_email, Aat, CreateApplicationRequest, CreateUserRequest,
    CreatedApplication, ExtendedPocketApplication, NetworkApplication, PocketApplication,
    PrivatePocketAccount, PublicPocketAccount, StakedApplicationSummary, StakingStatus,
};
use crate::pocket::PocketNetwork;
use crate::summary;
use chrono::Utc;
use futures::future::join_all;
use log::warn;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};

static PASSPHRASE_SEQ: AtomicU64 = AtomicU64::new(0);

/// One-way passphrase for a freshly created account, derived from the
/// application name plus the current instant. Nobody can reconstruct it, and
/// nobody needs to: it is handed to the caller exactly once.
fn derive_passphrase(name: &str) -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let seq = PASSPHRASE_SEQ.fetch_add(1, Ordering::Relaxed);
    let mut hasher = Sha256::new();
    hasher.update(format!("{name} + {nanos} + {seq}"));
    hex::encode(hasher.finalize())
}

fn validate_metadata(request: &CreateApplicationRequest) -> Result<(), PortalError> {
    if request.name.trim().is_empty() {
        return Err(PortalError::InvalidMetadata("name is required".to_string()));
    }
    if request.owner.trim().is_empty() {
        return Err(PortalError::InvalidMetadata("owner is required".to_string()));
    }
    if request.user.trim().is_empty() {
        return Err(PortalError::InvalidMetadata("user is required".to_string()));
    }
    if request.contact_email.trim().is_empty() {
        return Err(PortalError::InvalidMetadata(
            "contact email is required".to_string(),
        ));
    }
    if !is_valid_email(&request.contact_email) {
        return Err(PortalError::InvalidMetadata(
            "contact email is malformed".to_string(),
        ));
    }
    Ok(())
}

/// Orchestrates application creation, staking delegation, free tier handling
/// and the merged store-plus-network views.
pub struct ApplicationService<N: PocketNetwork> {
    store: AppStore,
    network: N,
    chain_hashes: Vec<String>,
    free_tier_passphrase: String,
    free_tier_stake_amount: String,
}

impl<N: PocketNetwork> ApplicationService<N> {
    pub fn new(store: AppStore, network: N, config: &PortalConfig) -> ApplicationService<N> {
        ApplicationService {
            store,
            network,
            chain_hashes: config.chain_hashes.clone(),
            free_tier_passphrase: config.free_tier_passphrase.clone(),
            free_tier_stake_amount: config.free_tier_stake_amount.clone(),
        }
    }

    /// Minimal registration so create_application has a user to point at.
    pub fn create_user(&self, request: &CreateUserRequest) -> Result<bool, PortalError> {
        if !is_valid_email(&request.email) {
            return Err(PortalError::InvalidMetadata(
                "email is malformed".to_string(),
            ));
        }
        if request.username.trim().is_empty() {
            return Err(PortalError::InvalidMetadata(
                "username is required".to_string(),
            ));
        }
        Ok(self.store.save_user(&request.email, &request.username)?)
    }

    /// Registers a new application and its network account.
    ///
    /// The existence pre-check gives a friendly rejection, but the unique
    /// index in the store is what actually closes the door: if a concurrent
    /// request wins the race, the write reports "not created" and we reject
    /// with the same error.
    pub async fn create_application(
        &self,
        request: CreateApplicationRequest,
    ) -> Result<CreatedApplication, PortalError> {
        validate_metadata(&request)?;

        if !self.store.user_exists(&request.user)? {
            return Err(PortalError::UserNotFound);
        }
        if self
            .store
            .get_application_by_identity(&request.name, &request.owner)?
            .is_some()
        {
            return Err(PortalError::ApplicationAlreadyExists);
        }

        let passphrase = derive_passphrase(&request.name);

        let account = if request.imported {
            let private_key = request
                .private_key
                .as_deref()
                .ok_or(PortalError::InvalidImportedAccount)?;
            match self.network.import_account(private_key, &passphrase).await {
                Ok(account) => account,
                Err(e) => {
                    warn!("[Service] Import of supplied account rejected: {e}");
                    return Err(PortalError::InvalidImportedAccount);
                }
            }
        } else {
            self.network.create_account(&passphrase).await?
        };

        let now = Utc::now().timestamp();
        let application = PocketApplication {
            name: request.name,
            owner: request.owner,
            url: request.url,
            contact_email: request.contact_email,
            user: request.user,
            description: request.description,
            icon: request.icon,
            free_tier: false,
            public_pocket_account: PublicPocketAccount {
                address: account.address.clone(),
                public_key: account.public_key.clone(),
            },
            status: application_statuses::AWAITING_STAKING.to_string(),
            last_changed_at: now,
            created_at: now,
        };

        if !self.store.save_application(&application)? {
            return Err(PortalError::ApplicationAlreadyExists);
        }

        let parameters = self.network.get_application_parameters().await?;
        let network_data = NetworkApplication::unstaked_placeholder(
            &application.public_pocket_account,
            &self.chain_hashes,
            &parameters,
        );

        Ok(CreatedApplication {
            private_application_data: PrivatePocketAccount {
                address: account.address,
                public_key: account.public_key,
                encrypted_private_key: account.encrypted_private_key,
                passphrase,
            },
            network_data,
        })
    }

    /// Validates a private key against the directory and returns the public
    /// projection, without registering anything.
    pub async fn import_application_account(
        &self,
        private_key: &str,
    ) -> Result<PublicPocketAccount, PortalError> {
        let passphrase = derive_passphrase("import-preview");
        match self.network.import_account(private_key, &passphrase).await {
            Ok(account) => Ok(PublicPocketAccount {
                address: account.address,
                public_key: account.public_key,
            }),
            Err(e) => {
                warn!("[Service] Account import preview rejected: {e}");
                Err(PortalError::InvalidImportedAccount)
            }
        }
    }

    /// Live network data for an address that is not yet registered here.
    /// Rejects when the address already has a dashboard record, or when the
    /// network does not know it.
    pub async fn get_application_from_network(
        &self,
        address: &str,
    ) -> Result<NetworkApplication, PortalError> {
        if self.store.get_application_by_address(address)?.is_some() {
            return Err(PortalError::ApplicationAlreadyExists);
        }
        match self.network.get_application(address).await {
            Ok(application) => Ok(application),
            Err(e) => {
                warn!("[Service] Network lookup for unregistered {address} failed: {e}");
                Err(PortalError::UnknownOnNetwork)
            }
        }
    }

    /// Merges one stored record with live network data.
    ///
    /// Free tier applications resolve against the shared sponsor account.
    /// For everything else a failed lookup (typically an application the
    /// network cannot see yet) degrades to the unstaked placeholder view.
    async fn extend(
        &self,
        application: PocketApplication,
    ) -> Result<ExtendedPocketApplication, PortalError> {
        let parameters = self.network.get_application_parameters().await?;

        let network_data = if application.free_tier {
            let sponsor = self
                .network
                .get_free_tier_account(&self.free_tier_passphrase)
                .await?;
            NetworkApplication::free_tier_view(
                &sponsor,
                &self.free_tier_stake_amount,
                &self.chain_hashes,
                &parameters,
            )
        } else {
            match self
                .network
                .get_application(&application.public_pocket_account.address)
                .await
            {
                Ok(network_application) => network_application,
                Err(e) => {
                    warn!(
                        "[Service] Network lookup for {} failed, serving placeholder: {e}",
                        application.public_pocket_account.address
                    );
                    NetworkApplication::unstaked_placeholder(
                        &application.public_pocket_account,
                        &self.chain_hashes,
                        &parameters,
                    )
                }
            }
        };

        Ok(ExtendedPocketApplication {
            application,
            network_data,
        })
    }

    /// Resolves all records concurrently and waits for the full set. A
    /// single per-application lookup failure is absorbed by the placeholder
    /// rule inside extend, never by dropping the entry.
    async fn extend_all(
        &self,
        applications: Vec<PocketApplication>,
    ) -> Result<Vec<ExtendedPocketApplication>, PortalError> {
        let lookups = applications.into_iter().map(|app| self.extend(app));
        join_all(lookups).await.into_iter().collect()
    }

    pub async fn get_application(
        &self,
        address: &str,
    ) -> Result<Option<ExtendedPocketApplication>, PortalError> {
        match self.store.get_application_by_address(address)? {
            Some(application) => Ok(Some(self.extend(application).await?)),
            None => Ok(None),
        }
    }

    pub async fn get_all_applications(
        &self,
        limit: u32,
        offset: u32,
        status: Option<StakingStatus>,
    ) -> Result<Vec<ExtendedPocketApplication>, PortalError> {
        let applications = self.store.get_applications(limit, offset)?;
        let mut extended = self.extend_all(applications).await?;
        if let Some(status) = status {
            extended.retain(|application| application.network_data.status == status);
        }
        Ok(extended)
    }

    pub async fn get_user_applications(
        &self,
        user_email: &str,
        limit: u32,
        offset: u32,
        status: Option<StakingStatus>,
    ) -> Result<Vec<ExtendedPocketApplication>, PortalError> {
        let applications = self.store.get_user_applications(user_email, limit, offset)?;
        let mut extended = self.extend_all(applications).await?;
        if let Some(status) = status {
            extended.retain(|application| application.network_data.status == status);
        }
        Ok(extended)
    }

    async fn try_mark_as_free_tier(
        &self,
        application: &PocketApplication,
        chains: &[String],
    ) -> Result<Aat, PortalError> {
        let sponsor = self
            .network
            .get_free_tier_account(&self.free_tier_passphrase)
            .await?;
        let aat = self
            .network
            .get_application_authentication_token(
                &application.public_pocket_account.public_key,
                &sponsor,
                &self.free_tier_passphrase,
            )
            .await?;
        self.network
            .stake_application(
                &sponsor,
                &self.free_tier_passphrase,
                &self.free_tier_stake_amount,
                chains,
            )
            .await?;
        self.store
            .mark_free_tier(&application.public_pocket_account.address)?;
        Ok(aat)
    }

    /// Stakes the sponsor account for the requested chains and flags the
    /// record as free tier. The returned AAT is what the caller relays with.
    ///
    /// Per the dashboard contract, every failure collapses to None; the
    /// actual cause only goes to the log.
    pub async fn mark_as_free_tier_application(
        &self,
        address: &str,
        chains: &[String],
    ) -> Option<Aat> {
        let application = match self.store.get_application_by_address(address) {
            Ok(Some(application)) => application,
            Ok(None) => return None,
            Err(e) => {
                warn!("[Service] Free tier marking: store lookup for {address} failed: {e}");
                return None;
            }
        };

        match self.try_mark_as_free_tier(&application, chains).await {
            Ok(aat) => Some(aat),
            Err(e) => {
                warn!("[Service] Free tier marking for {address} failed: {e}");
                None
            }
        }
    }

    /// AAT signed by the sponsor for an already registered application.
    pub async fn get_free_tier_aat(&self, address: &str) -> Option<Aat> {
        let application = match self.store.get_application_by_address(address) {
            Ok(Some(application)) => application,
            Ok(None) => return None,
            Err(e) => {
                warn!("[Service] Free tier AAT: store lookup for {address} failed: {e}");
                return None;
            }
        };

        let result: Result<Aat, PortalError> = async {
            let sponsor = self
                .network
                .get_free_tier_account(&self.free_tier_passphrase)
                .await?;
            Ok(self
                .network
                .get_application_authentication_token(
                    &application.public_pocket_account.public_key,
                    &sponsor,
                    &self.free_tier_passphrase,
                )
                .await?)
        }
        .await;

        match result {
            Ok(aat) => Some(aat),
            Err(e) => {
                warn!("[Service] Free tier AAT for {address} failed: {e}");
                None
            }
        }
    }

    /// Unstakes the sponsor account for a free tier application. Same
    /// negative-result contract as the staking path.
    pub async fn unstake_free_tier_application(&self, address: &str) -> bool {
        match self.store.get_application_by_address(address) {
            Ok(Some(_)) => {}
            Ok(None) => return false,
            Err(e) => {
                warn!("[Service] Free tier unstake: store lookup for {address} failed: {e}");
                return false;
            }
        }

        let result: Result<(), PortalError> = async {
            let sponsor = self
                .network
                .get_free_tier_account(&self.free_tier_passphrase)
                .await?;
            self.network
                .unstake_application(&sponsor, &self.free_tier_passphrase)
                .await?;
            Ok(())
        }
        .await;

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("[Service] Free tier unstake for {address} failed: {e}");
                false
            }
        }
    }

    /// Removes the dashboard record. Deliberately never touches the network:
    /// this is deregistration, not a network unstake.
    pub fn delete_application(&self, address: &str) -> Result<bool, PortalError> {
        Ok(self.store.delete_application(address)?)
    }

    /// Fleet statistics over the staked application set, straight from the
    /// network. Best effort: failures come back as a zeroed summary.
    pub async fn staked_application_summary(&self) -> StakedApplicationSummary {
        summary::staked_application_summary(&self.network).await
    }
}
