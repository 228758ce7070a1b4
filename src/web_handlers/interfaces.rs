use actix_web::{web, HttpResponse};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::generator::render::{OutputFormat, RenderError};
use crate::interfaces::{check_content, render_by_token, CheckReport};
use crate::models::AppState;
use crate::utils::url::url_encode;

/// Query parameters of a group download
#[derive(Deserialize, Debug, Default, Clone)]
pub struct GroupQuery {
    /// `base64` (default) or `clash`
    pub format: Option<String>,
}

/// Body of a content check
#[derive(Deserialize, Debug, Default, Clone)]
pub struct CheckRequest {
    #[serde(default, alias = "url")]
    pub content: String,
}

#[derive(Serialize, Debug)]
pub struct CheckResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<CheckReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Handler for published group downloads
pub async fn group_handler(
    token: web::Path<String>,
    query: web::Query<GroupQuery>,
    app_state: web::Data<Arc<AppState>>,
) -> HttpResponse {
    let token = token.into_inner();
    let format = match query.format.as_deref().unwrap_or("").parse::<OutputFormat>() {
        Ok(format) => format,
        Err(e) => {
            debug!("Rejected group request: {}", e);
            return HttpResponse::BadRequest().body(e.to_string());
        }
    };

    let store = app_state.store.as_ref();
    match render_by_token(store, store, &token, format).await {
        Ok(output) => {
            let filename = url_encode(&output.filename);
            let mut resp = HttpResponse::Ok();
            resp.append_header((
                "Content-Disposition",
                format!(
                    "attachment; filename*=UTF-8''{}; filename=\"{}\"",
                    filename, filename
                ),
            ));
            if !app_state.config.subscription_userinfo.is_empty() {
                resp.append_header((
                    "Subscription-Userinfo",
                    app_state.config.subscription_userinfo.clone(),
                ));
            }
            resp.content_type(output.content_type).body(output.body)
        }
        Err(RenderError::NotFound) => {
            debug!("No enabled group for token {}", token);
            HttpResponse::NotFound().body("Group not found")
        }
        Err(e) => {
            error!("Failed to render group {}: {}", token, e);
            HttpResponse::InternalServerError().body(e.to_string())
        }
    }
}

/// Handler that reports which nodes a piece of content contains
pub async fn check_handler(body: web::Json<CheckRequest>) -> HttpResponse {
    if body.content.trim().is_empty() {
        return HttpResponse::BadRequest().json(CheckResponse {
            success: false,
            data: None,
            error: Some("Missing content".to_string()),
        });
    }

    let report = check_content(&body.content);
    debug!("Checked content: {} nodes", report.node_count);
    HttpResponse::Ok().json(CheckResponse {
        success: true,
        data: Some(report),
        error: None,
    })
}

pub async fn health_handler() -> &'static str {
    "submerge is running!"
}

/// Register the routes of this module
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(health_handler))
        .route("/api/g/{token}", web::get().to(group_handler))
        .route("/api/check", web::post().to(check_handler));
}
