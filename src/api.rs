use crate::errors::PortalError;
use crate::formatters;
use crate::models::{CreateApplicationRequest, CreateUserRequest, StakingStatus};
use crate::pocket::HttpPocketClient;
use crate::service::ApplicationService;
use actix_web::{delete, get, post, web, HttpResponse};
use chrono::Utc;
use log::info;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// The concrete service the handlers run against.
pub type PortalService = ApplicationService<HttpPocketClient>;

/// Short-lived cache in front of the staked summary, same deal as any hot
/// dashboard statistic: recomputing on every poll would hammer the network
/// service for a number that moves slowly.
pub type SummaryCache = Cache<String, StakedSummaryResponse>;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StakedSummaryResponse {
    pub total_applications: String,
    pub average_staked: String,
    pub average_staked_pokt: String,
    pub average_max_relays: String,
    pub computed_at: String,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<u32>,
    offset: Option<u32>,
    status: Option<u8>,
}

impl ListQuery {
    fn staking_status(&self) -> Result<Option<StakingStatus>, PortalError> {
        match self.status {
            None => Ok(None),
            Some(code) => StakingStatus::from_code(code).map(Some).ok_or_else(|| {
                PortalError::InvalidMetadata(format!("unknown staking status code {code}"))
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FreeTierStakeRequest {
    address: String,
    network_chains: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FreeTierUnstakeRequest {
    address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportAccountRequest {
    private_key: String,
}

#[post("/api/users")]
async fn create_user(
    service: web::Data<PortalService>,
    body: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, PortalError> {
    let created = service.create_user(&body)?;
    if created {
        Ok(HttpResponse::Created().json(json!({ "success": true })))
    } else {
        Ok(HttpResponse::Ok().json(json!({ "success": true, "existing": true })))
    }
}

#[post("/api/applications")]
async fn create_application(
    service: web::Data<PortalService>,
    body: web::Json<CreateApplicationRequest>,
) -> Result<HttpResponse, PortalError> {
    let created = service.create_application(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(created))
}

/// Validates a private key and shows the account it maps to, before the
/// caller commits to an imported creation.
#[post("/api/applications/import")]
async fn import_application_account(
    service: web::Data<PortalService>,
    body: web::Json<ImportAccountRequest>,
) -> Result<HttpResponse, PortalError> {
    let account = service.import_application_account(&body.private_key).await?;
    Ok(HttpResponse::Ok().json(account))
}

#[get("/api/applications")]
async fn get_all_applications(
    service: web::Data<PortalService>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, PortalError> {
    let status = query.staking_status()?;
    let applications = service
        .get_all_applications(query.limit.unwrap_or(100), query.offset.unwrap_or(0), status)
        .await?;
    Ok(HttpResponse::Ok().json(applications))
}

#[get("/api/applications/user/{email}")]
async fn get_user_applications(
    service: web::Data<PortalService>,
    path: web::Path<String>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, PortalError> {
    let status = query.staking_status()?;
    let applications = service
        .get_user_applications(
            &path,
            query.limit.unwrap_or(100),
            query.offset.unwrap_or(0),
            status,
        )
        .await?;
    Ok(HttpResponse::Ok().json(applications))
}

#[get("/api/applications/freetier/aat/{address}")]
async fn get_free_tier_aat(
    service: web::Data<PortalService>,
    path: web::Path<String>,
) -> HttpResponse {
    match service.get_free_tier_aat(&path).await {
        Some(aat) => HttpResponse::Ok().json(aat),
        None => HttpResponse::NotFound().json(json!({ "success": false })),
    }
}

#[get("/api/applications/{address}")]
async fn get_application(
    service: web::Data<PortalService>,
    path: web::Path<String>,
) -> Result<HttpResponse, PortalError> {
    match service.get_application(&path).await? {
        Some(application) => Ok(HttpResponse::Ok().json(application)),
        None => Ok(HttpResponse::NotFound().json(json!({ "error": "application not found" }))),
    }
}

#[get("/api/applications/{address}/network")]
async fn get_application_from_network(
    service: web::Data<PortalService>,
    path: web::Path<String>,
) -> Result<HttpResponse, PortalError> {
    let application = service.get_application_from_network(&path).await?;
    Ok(HttpResponse::Ok().json(application))
}

#[delete("/api/applications/{address}")]
async fn delete_application(
    service: web::Data<PortalService>,
    path: web::Path<String>,
) -> Result<HttpResponse, PortalError> {
    if service.delete_application(&path)? {
        Ok(HttpResponse::Ok().json(json!({ "success": true })))
    } else {
        Ok(HttpResponse::NotFound().json(json!({ "success": false })))
    }
}

#[post("/api/applications/freetier/stake")]
async fn stake_free_tier(
    service: web::Data<PortalService>,
    body: web::Json<FreeTierStakeRequest>,
) -> HttpResponse {
    match service
        .mark_as_free_tier_application(&body.address, &body.network_chains)
        .await
    {
        Some(aat) => HttpResponse::Ok().json(aat),
        // The service already logged what actually went wrong; the caller
        // only gets the boolean-shaped outcome.
        None => HttpResponse::BadRequest().json(json!({ "success": false })),
    }
}

#[post("/api/applications/freetier/unstake")]
async fn unstake_free_tier(
    service: web::Data<PortalService>,
    body: web::Json<FreeTierUnstakeRequest>,
) -> HttpResponse {
    if service.unstake_free_tier_application(&body.address).await {
        HttpResponse::Ok().json(json!({ "success": true }))
    } else {
        HttpResponse::BadRequest().json(json!({ "success": false }))
    }
}

/// Handler for the GET /api/summary/staked endpoint.
///
/// It serves the fleet statistic, trying the cache first. The summary itself
/// is always recomputed from live network data on a miss; nothing is
/// persisted.
#[get("/api/summary/staked")]
async fn staked_summary(
    service: web::Data<PortalService>,
    cache: web::Data<SummaryCache>,
) -> HttpResponse {
    let cache_key = "staked-summary".to_string();

    if let Some(cached) = cache.get(&cache_key).await {
        info!("[API] Cache hit for /api/summary/staked");
        return HttpResponse::Ok().json(cached);
    }
    info!("[API] Cache miss for /api/summary/staked");

    let summary = service.staked_application_summary().await;
    let response = StakedSummaryResponse {
        average_staked_pokt: formatters::format_pokt(&summary.average_staked),
        total_applications: summary.total_applications,
        average_staked: summary.average_staked,
        average_max_relays: summary.average_max_relays,
        computed_at: formatters::format_timestamp(Utc::now().timestamp()),
    };

    cache.insert(cache_key, response.clone()).await;
    HttpResponse::Ok().json(response)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_user)
        .service(create_application)
        .service(import_application_account)
        .service(get_all_applications)
        .service(get_user_applications)
        .service(get_free_tier_aat)
        .service(stake_free_tier)
        .service(unstake_free_tier)
        .service(get_application_from_network)
        .service(get_application)
        .service(delete_application)
        .service(staked_summary);
}
