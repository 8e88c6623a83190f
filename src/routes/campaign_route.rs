use actix_web::{get, web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{CampaignSnapshot, DEFAULT_GOAL},
    services::{get_campaign_snapshot, PageFetcher},
};

#[derive(Deserialize)]
struct CampaignQuery {
    url: String,
    #[serde(default = "default_goal")]
    goal: f64,
}

fn default_goal() -> f64 {
    DEFAULT_GOAL
}

/// The envelope handed to the presentation layer. Always HTTP 200; the
/// `success` flag carries the outcome.
#[derive(Serialize)]
struct CampaignEnvelope {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<CampaignSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl CampaignEnvelope {
    fn ok(snapshot: CampaignSnapshot) -> Self {
        CampaignEnvelope {
            success: true,
            data: Some(snapshot),
            error: None,
        }
    }

    fn err(message: &str) -> Self {
        CampaignEnvelope {
            success: false,
            data: None,
            error: Some(message.to_string()),
        }
    }
}

#[get("")]
async fn campaign(
    fetcher: web::Data<PageFetcher>,
    query: web::Query<CampaignQuery>,
) -> HttpResponse {
    if query.url.trim().is_empty() {
        return HttpResponse::Ok().json(CampaignEnvelope::err("Please provide a campaign URL"));
    }

    match get_campaign_snapshot(&fetcher, &query.url, query.goal).await {
        Ok(snapshot) => HttpResponse::Ok().json(CampaignEnvelope::ok(snapshot)),
        Err(e) => {
            // The taxonomy stays in the logs; callers get one generic line.
            log::error!("Failed to build a snapshot for {}: {:?}", query.url, e);
            HttpResponse::Ok().json(CampaignEnvelope::err(
                "Unable to fetch campaign data. Please verify the URL and try again.",
            ))
        }
    }
}
