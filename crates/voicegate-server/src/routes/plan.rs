use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use voicegate::{Plan, PlanSource};

use crate::auth::authenticate;
use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSyncRequest {
    #[serde(default)]
    pub is_premium: Option<bool>,
    #[serde(default)]
    pub plan: Option<String>,
}

/// POST /plan/sync - Store the plan the app believes the caller has.
///
/// Gives immediate feedback after an in-app purchase. Not authoritative:
/// the billing webhook overwrites it, and synthesis trusts only the stored
/// plan or the signed claim.
pub async fn sync_plan(
    req: HttpRequest,
    body: web::Json<PlanSyncRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let caller = authenticate(&req, &state.verifier, &state.db)?;
    let plan = Plan::from_client_input(body.plan.as_deref(), body.is_premium)?;

    state.db.set_plan(&caller.uid, plan, PlanSource::Client)?;

    metrics::PLAN_SYNCS
        .with_label_values(&[PlanSource::Client.as_str(), plan.as_str()])
        .inc();
    tracing::info!(uid = %caller.uid, plan = %plan, "plan synced from client");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "ok": true,
        "plan": plan,
    })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/plan/sync", web::post().to(sync_plan));
}
