pub mod health;
pub mod plan;
pub mod synthesize;
pub mod webhook;

use actix_web::web;

use crate::error::ApiError;

/// JSON body limit for caller requests.
const JSON_LIMIT: usize = 64 * 1024;

/// JSON extractor config that reports bad bodies as `invalid_argument`.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| {
            ApiError::InvalidArgument(format!("invalid request body: {err}")).into()
        })
}

/// Register every route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config());
    health::configure(cfg);
    synthesize::configure(cfg);
    plan::configure(cfg);
    webhook::configure(cfg);
}
