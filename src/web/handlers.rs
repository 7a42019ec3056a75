use axum::{
    extract::{ConnectInfo, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use super::{ApiError, ApiResponse, AppState};
use crate::classifier::ClassifierError;
use crate::models::{FeatureVector, QueryRecord};

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub website: Option<String>,
    pub url: Option<String>,
}

impl ScanRequest {
    /// Either key is accepted; `website` wins when both carry a value.
    fn target(&self) -> Option<&str> {
        fn pick(field: &Option<String>) -> Option<&str> {
            field.as_deref().map(str::trim).filter(|t| !t.is_empty())
        }
        pick(&self.website).or_else(|| pick(&self.url))
    }
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub website: String,
    pub features: FeatureVector,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub website: String,
    pub features: FeatureVector,
    pub label: u8,
    pub result: String,
}

#[derive(Debug, Deserialize)]
pub struct RecentParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_queries: i64,
    pub fake: i64,
    pub legit: i64,
}

/// POST /api/query/extract - Feature vector for a URL, no classification
pub async fn extract(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<ScanRequest>,
) -> Result<Json<ApiResponse<ExtractResponse>>, ApiError> {
    let url = payload
        .target()
        .ok_or_else(|| ApiError::BadRequest("Missing website/url".to_string()))?;

    if !state.rate_limiters.extract.check(&addr.ip().to_string()) {
        return Err(ApiError::RateLimited);
    }

    let features = state
        .engine
        .extract(url)
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok(Json(ApiResponse::ok(ExtractResponse {
        website: url.to_string(),
        features,
    })))
}

/// POST /api/query/predict - Extract features and classify
pub async fn predict(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<ScanRequest>,
) -> Result<Json<ApiResponse<PredictResponse>>, ApiError> {
    let url = payload
        .target()
        .ok_or_else(|| ApiError::BadRequest("Missing website/url".to_string()))?
        .to_string();

    if !state.rate_limiters.predict.check(&addr.ip().to_string()) {
        return Err(ApiError::RateLimited);
    }

    let features = state
        .engine
        .extract(&url)
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let prediction = state.classifier.predict(&features).map_err(|e| match e {
        ClassifierError::Unavailable(reason) => ApiError::ModelUnavailable(reason),
        other => ApiError::Internal(other.to_string()),
    })?;

    // Log the query; a failed write must not fail the prediction.
    let record = QueryRecord {
        id: uuid::Uuid::new_v4().to_string(),
        website: url.clone(),
        result: prediction.result.clone(),
        label: prediction.label as i64,
        created_at: chrono::Utc::now().timestamp(),
    };
    match state.db.lock() {
        Ok(mut db) => {
            if let Err(e) = db.insert_query(&record) {
                tracing::warn!(error = %e, "failed to log query");
            }
        }
        Err(e) => tracing::warn!(error = %e, "query log lock poisoned"),
    }

    Ok(Json(ApiResponse::ok(PredictResponse {
        website: url,
        features,
        label: prediction.label,
        result: prediction.result,
    })))
}

/// GET /api/query/recent - Latest logged predictions
pub async fn recent_queries(
    State(state): State<AppState>,
    Query(params): Query<RecentParams>,
) -> Result<Json<ApiResponse<Vec<QueryRecord>>>, ApiError> {
    let limit = params.limit.unwrap_or(50).min(500);
    let db = state
        .db
        .lock()
        .map_err(|e| ApiError::Internal(format!("Database lock error: {}", e)))?;
    let records = db
        .recent_queries(limit)
        .map_err(|e| ApiError::Internal(format!("Failed to fetch queries: {}", e)))?;
    Ok(Json(ApiResponse::ok(records)))
}

/// GET /api/stats - Aggregate query log counts
pub async fn statistics(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<StatsResponse>>, ApiError> {
    let db = state
        .db
        .lock()
        .map_err(|e| ApiError::Internal(format!("Database lock error: {}", e)))?;
    let total_queries = db
        .query_count()
        .map_err(|e| ApiError::Internal(format!("Stats query failed: {}", e)))?;
    let fake = db
        .count_by_result("Fake")
        .map_err(|e| ApiError::Internal(format!("Stats query failed: {}", e)))?;
    let legit = db
        .count_by_result("Legit")
        .map_err(|e| ApiError::Internal(format!("Stats query failed: {}", e)))?;

    Ok(Json(ApiResponse::ok(StatsResponse {
        total_queries,
        fake,
        legit,
    })))
}
