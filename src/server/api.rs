// * JSON API routes
// * Success: `{"success": true, ...}`; failure: `{"success": false, "error": "..."}`.

use chrono::Utc;
use hyper::body::HttpBody as _;
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Body, Method, Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::Arc;
use thiserror::Error;

use crate::automation::SchedulerError;
use crate::config::constants::ALERT_CAPACITY;
use crate::engine::scorer::PageAnalysis;
use crate::generators::images::{batch_optimize, ImageRequest};
use crate::generators::meta::{self, MetaRequest};
use crate::generators::robots::{self, RobotsProfile, UserAgentRule};
use crate::generators::sitemap::{self, SitemapEntry, SitemapOptions, SitemapRef};
use crate::generators::social::{self, Platform, SocialContent};
use crate::generators::structured_data::{self, StructuredDataError};
use crate::keywords::competitors::keyword_report;
use crate::keywords::rankings::keyword_health;
use crate::network::FetchError;
use crate::ops::telemetry;
use crate::persistence::{ReportKind, StoreError};
use crate::server::AppState;

const DEFAULT_HISTORY_LIMIT: usize = 10;
// * Request bodies above this are rejected
const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

const ENDPOINTS: [&str; 20] = [
    "GET /health",
    "GET /metrics",
    "GET /api/status",
    "POST /api/analyze",
    "POST /api/analyze/batch",
    "GET /api/report",
    "GET /api/history",
    "GET /api/alerts",
    "GET /api/keywords",
    "POST /api/check-keywords",
    "POST /api/optimize/meta",
    "POST /api/optimize/social-media",
    "POST /api/optimize/images",
    "POST /api/generate/structured-data",
    "POST /api/generate/sitemap",
    "POST /api/generate/robots",
    "POST /api/automation/trigger",
    "GET /api/automation/status",
    "GET /api/robots/analyze",
    "GET /api/images/checklist",
];

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Endpoint not found: {method} {path}")]
    NotFound { method: Method, path: String },

    #[error("{0}")]
    Upstream(#[from] FetchError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Scheduler(SchedulerError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            // * Malformed URL is client input
            ApiError::Upstream(FetchError::InvalidUrl(_)) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Scheduler(SchedulerError::UnknownTask(_)) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) | ApiError::Scheduler(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn body(&self) -> Value {
        match self {
            ApiError::NotFound { .. } => json!({
                "success": false,
                "error": self.to_string(),
                "availableEndpoints": ENDPOINTS,
            }),
            _ => json!({ "success": false, "error": self.to_string() }),
        }
    }
}

impl From<SchedulerError> for ApiError {
    fn from(e: SchedulerError) -> Self {
        ApiError::Scheduler(e)
    }
}

impl From<StructuredDataError> for ApiError {
    fn from(e: StructuredDataError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

type ApiResult = Result<Value, ApiError>;

fn json_response(status: StatusCode, body: &Value) -> Response<Body> {
    let bytes = serde_json::to_vec(body).unwrap_or_default();
    let mut resp = Response::new(Body::from(bytes));
    *resp.status_mut() = status;
    resp.headers_mut().insert(
        CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    resp
}

fn text_response(content_type: &str, body: String) -> Response<Body> {
    let mut resp = Response::new(Body::from(body));
    if let Ok(value) = hyper::header::HeaderValue::from_str(content_type) {
        resp.headers_mut().insert(CONTENT_TYPE, value);
    }
    resp
}

fn ok(mut body: Value) -> ApiResult {
    if let Value::Object(map) = &mut body {
        map.insert("success".to_string(), Value::Bool(true));
    }
    Ok(body)
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(e.to_string()))
}

async fn read_json<T: DeserializeOwned + Default>(req: Request<Body>) -> Result<T, ApiError> {
    read_json_limited(req, MAX_BODY_BYTES).await
}

/// Buffers at most `limit` bytes; a declared or streamed overrun stops the read
async fn read_json_limited<T: DeserializeOwned + Default>(req: Request<Body>, limit: usize) -> Result<T, ApiError> {
    let declared = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared.is_some_and(|len| len > limit as u64) {
        return Err(ApiError::PayloadTooLarge { limit });
    }

    let mut body = req.into_body();
    let mut bytes = Vec::new();
    while let Some(chunk) = body.data().await {
        let chunk = chunk.map_err(|e| ApiError::BadRequest(format!("Failed to read body: {}", e)))?;
        if bytes.len() + chunk.len() > limit {
            return Err(ApiError::PayloadTooLarge { limit });
        }
        bytes.extend_from_slice(&chunk);
    }

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(&bytes).map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))
}

fn query_param(req: &Request<Body>, key: &str) -> Option<String> {
    let query = req.uri().query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

fn require(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{} is required", field)))
}

/// Entry point for every request
pub async fn handle_request(state: Arc<AppState>, req: Request<Body>) -> Result<Response<Body>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    // * Plain-text endpoint
    if method == Method::GET && path == "/metrics" {
        return Ok(text_response(&telemetry::metrics_content_type(), telemetry::get_metrics_string()));
    }

    let result = route(&state, req, &method, &path).await;
    let response = match result {
        Ok(body) => json_response(StatusCode::OK, &body),
        Err(e) => {
            let status = e.status();
            if status.is_server_error() {
                tracing::error!(method = %method, path = %path, error = %e, "Request failed");
            } else {
                tracing::debug!(method = %method, path = %path, error = %e, "Request rejected");
            }
            json_response(status, &e.body())
        }
    };
    Ok(response)
}

async fn route(state: &AppState, req: Request<Body>, method: &Method, path: &str) -> ApiResult {
    match (method, path) {
        (&Method::GET, "/health") => health(state),
        (&Method::GET, "/api/status") => status(state).await,
        (&Method::POST, "/api/analyze") => analyze(state, read_json(req).await?).await,
        (&Method::POST, "/api/analyze/batch") => analyze_batch(state, read_json(req).await?).await,
        (&Method::GET, "/api/report") => ok(json!({ "report": state.history.report().await })),
        (&Method::GET, "/api/history") => history(state, query_param(&req, "limit")).await,
        (&Method::GET, "/api/alerts") => alerts(state).await,
        (&Method::GET, "/api/keywords") => keywords(state).await,
        (&Method::POST, "/api/check-keywords") => check_keywords(state).await,
        (&Method::POST, "/api/optimize/meta") => optimize_meta(read_json(req).await?),
        (&Method::POST, "/api/optimize/social-media") => optimize_social(read_json(req).await?),
        (&Method::POST, "/api/optimize/images") => optimize_images(read_json(req).await?),
        (&Method::POST, "/api/generate/structured-data") => generate_structured_data(read_json(req).await?),
        (&Method::POST, "/api/generate/sitemap") => generate_sitemap(read_json(req).await?),
        (&Method::POST, "/api/generate/robots") => generate_robots(state, read_json(req).await?),
        (&Method::GET, "/api/robots/analyze") => analyze_robots(state, query_param(&req, "domain")).await,
        (&Method::GET, "/api/images/checklist") => {
            ok(json!({ "checklist": crate::generators::images::checklist() }))
        }
        (&Method::POST, "/api/automation/trigger") => trigger(state, read_json(req).await?).await,
        (&Method::GET, "/api/automation/status") => {
            ok(json!({ "status": state.scheduler.status().await }))
        }
        _ => Err(ApiError::NotFound {
            method: method.clone(),
            path: path.to_string(),
        }),
    }
}

fn health(state: &AppState) -> ApiResult {
    ok(json!({
        "status": "healthy",
        "timestamp": Utc::now(),
        "uptimeSecs": state.started_at.elapsed().as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn status(state: &AppState) -> ApiResult {
    ok(json!({
        "targetWebsite": state.config.target_website,
        "historySize": state.history.analysis_count().await,
        "alertCount": state.history.alert_count().await,
        "errorRate": state.alerts.error_rate(),
        "alertChannels": state.alerts.handler_names(),
        "automation": state.scheduler.status().await,
        "timestamp": Utc::now(),
    }))
}

/// Keeps the analysis and raises audit alerts against the previous one
async fn record_analysis(state: &AppState, analysis: &PageAnalysis) {
    let previous = state.history.latest_for(&analysis.url).await;
    let candidates = state.alerts.audit_alerts(previous.as_ref(), analysis);
    state.history.push_analysis(analysis.clone()).await;
    let fired = state.alerts.fire_all(candidates).await;
    state.history.push_alerts(fired).await;
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AnalyzeRequest {
    url: Option<String>,
    html: Option<String>,
}

async fn analyze(state: &AppState, body: AnalyzeRequest) -> ApiResult {
    let url = require(body.url, "url")?;
    let analysis = match body.html {
        Some(html) => state.auditor.audit_html(&url, &html),
        None => {
            let result = state.auditor.audit_url(&url).await;
            match &result {
                Ok(_) => state.alerts.record_success(),
                Err(_) => state.alerts.record_failure(),
            }
            result?
        }
    };
    record_analysis(state, &analysis).await;
    ok(json!({ "analysis": analysis }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct BatchRequest {
    domain: Option<String>,
    urls: Option<Vec<String>>,
}

async fn analyze_batch(state: &AppState, body: BatchRequest) -> ApiResult {
    let domain = require(body.domain, "domain")?;
    let report = state.auditor.audit_batch(&domain, body.urls).await;
    for analysis in report.analyses() {
        record_analysis(state, analysis).await;
    }
    let path = state.store.save(ReportKind::Batch, &report).await?;
    ok(json!({ "report": report, "savedTo": path }))
}

async fn history(state: &AppState, limit: Option<String>) -> ApiResult {
    let limit = match limit {
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| ApiError::BadRequest(format!("Invalid limit: {}", raw)))?,
        None => DEFAULT_HISTORY_LIMIT,
    };
    ok(json!({
        "history": state.history.recent(limit).await,
        "total": state.history.analysis_count().await,
    }))
}

async fn alerts(state: &AppState) -> ApiResult {
    ok(json!({
        "alerts": state.history.recent_alerts(ALERT_CAPACITY).await,
        "total": state.history.alert_count().await,
    }))
}

async fn keywords(state: &AppState) -> ApiResult {
    let rankings = state.history.rankings().await;
    let snapshots: Vec<_> = rankings.values().cloned().collect();
    ok(json!({
        "analysis": keyword_report(),
        "rankings": rankings,
        "health": keyword_health(&snapshots),
        "lastChecked": state.history.rankings_updated_at().await,
    }))
}

async fn check_keywords(state: &AppState) -> ApiResult {
    let (check, fired) = state.scheduler.check_keywords().await?;
    ok(json!({ "check": check, "alertsFired": fired }))
}

fn optimize_meta(body: MetaRequest) -> ApiResult {
    ok(json!({ "optimization": meta::optimize(&body) }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SocialRequest {
    #[serde(flatten)]
    content: SocialContent,
    platform: Option<String>,
    canonical: Option<String>,
}

fn optimize_social(body: SocialRequest) -> ApiResult {
    let tags = social::all_tags(&body.content);
    let html = social::render(&tags, body.canonical.as_deref());
    let platform = match body.platform.as_deref() {
        Some(name) => {
            let platform: Platform = name.parse().map_err(ApiError::BadRequest)?;
            Some(social::optimize_for_platform(&body.content, platform))
        }
        None => None,
    };
    ok(json!({
        "tags": tags,
        "html": html,
        "platform": platform,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ImagesRequest {
    images: Vec<ImageRequest>,
}

fn optimize_images(body: ImagesRequest) -> ApiResult {
    if body.images.is_empty() {
        return Err(ApiError::BadRequest("images must not be empty".to_string()));
    }
    ok(json!({ "result": batch_optimize(&body.images) }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StructuredDataRequest {
    #[serde(rename = "type")]
    kind: Option<String>,
    data: Value,
}

fn generate_structured_data(body: StructuredDataRequest) -> ApiResult {
    let kind = require(body.kind, "type")?;
    let schema = structured_data::generate(&kind, body.data)?;
    let validation = structured_data::validate(&schema);
    ok(json!({
        "schema": schema,
        "script": structured_data::to_script_tag(&schema),
        "validation": validation,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SitemapUrl {
    Plain(String),
    Entry(SitemapEntry),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SitemapRequest {
    urls: Vec<SitemapUrl>,
    domain: Option<String>,
    options: SitemapOptions,
}

fn generate_sitemap(body: SitemapRequest) -> ApiResult {
    let entries: Vec<SitemapEntry> = body
        .urls
        .into_iter()
        .map(|u| match u {
            SitemapUrl::Plain(url) => SitemapEntry::new(url),
            SitemapUrl::Entry(entry) => entry,
        })
        .collect();

    if entries.is_empty() {
        let domain = require(body.domain, "urls or domain")?;
        let xml = sitemap::video_greeting_sitemap(&format!("https://{}", domain.trim_end_matches('/')));
        let validation = sitemap::validate(&xml);
        return ok(json!({ "sitemap": xml, "urlCount": validation.url_count, "validation": validation }));
    }

    let files = sitemap::split(&entries, body.options);
    if let [single] = files.as_slice() {
        let validation = sitemap::validate(&single.content);
        return ok(json!({ "sitemap": single.content, "urlCount": single.url_count, "validation": validation }));
    }

    // * Too many URLs for one file: sitemap index plus numbered parts
    let base = body
        .domain
        .map(|d| format!("https://{}", d.trim_end_matches('/')))
        .unwrap_or_default();
    let refs: Vec<SitemapRef> = files
        .iter()
        .map(|f| SitemapRef {
            url: format!("{}/{}", base, f.filename),
            lastmod: None,
        })
        .collect();
    ok(json!({
        "index": sitemap::index(&refs),
        "files": to_value(&files)?,
        "urlCount": entries.len(),
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RobotsRequest {
    domain: Option<String>,
    profile: Option<String>,
    sitemap_urls: Vec<String>,
    custom_rules: Vec<UserAgentRule>,
}

fn generate_robots(state: &AppState, body: RobotsRequest) -> ApiResult {
    let domain = body
        .domain
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| state.config.target_website.clone());
    let profile = match body.profile.as_deref() {
        Some(name) => name.parse::<RobotsProfile>().map_err(ApiError::BadRequest)?,
        None => RobotsProfile::default(),
    };

    let content = if body.custom_rules.is_empty() && body.sitemap_urls.is_empty() {
        robots::generate(profile, &domain)
    } else {
        robots::custom(&domain, body.custom_rules, &body.sitemap_urls)
    };
    let validation = robots::validate(&content);
    ok(json!({
        "robots": content,
        "validation": validation,
        "suggestions": robots::optimization_suggestions(&domain, profile),
    }))
}

/// Fetches a live robots.txt and reports its structure
async fn analyze_robots(state: &AppState, domain: Option<String>) -> ApiResult {
    let domain = domain.unwrap_or_else(|| state.config.target_website.clone());
    let url = format!("https://{}/robots.txt", domain.trim_end_matches('/'));
    let page = state.auditor.source().fetch_page(&url).await?;
    ok(json!({
        "url": url,
        "analysis": robots::analyze(&page.body),
        "validation": robots::validate(&page.body),
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TriggerRequest {
    task: Option<String>,
}

async fn trigger(state: &AppState, body: TriggerRequest) -> ApiResult {
    let task = require(body.task, "task")?;
    let outcome = state.scheduler.trigger(&task).await?;
    ok(json!({ "outcome": outcome }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::body::Bytes;

    #[derive(Debug, Default, Deserialize)]
    struct Named {
        name: Option<String>,
    }

    fn post(body: Body) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/analyze")
            .body(body)
            .unwrap()
    }

    #[tokio::test]
    async fn test_read_json_within_limit() {
        let named: Named = read_json_limited(post(Body::from(r#"{"name":"wishes"}"#)), 64)
            .await
            .unwrap();
        assert_eq!(named.name.as_deref(), Some("wishes"));

        let empty: Named = read_json_limited(post(Body::from("  \n")), 64).await.unwrap();
        assert!(empty.name.is_none());
    }

    #[tokio::test]
    async fn test_declared_length_rejected_before_reading() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/analyze")
            .header(CONTENT_LENGTH, "1048576")
            .body(Body::empty())
            .unwrap();

        let err = read_json_limited::<Named>(req, 64).await.unwrap_err();
        assert!(matches!(err, ApiError::PayloadTooLarge { limit: 64 }));
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_streamed_body_stops_at_limit() {
        // * Chunked upload with no Content-Length; the stream would never end on its own
        let (mut sender, body) = Body::channel();
        tokio::spawn(async move {
            while sender.send_data(Bytes::from_static(&[b' '; 16])).await.is_ok() {}
        });

        let err = read_json_limited::<Named>(post(body), 64).await.unwrap_err();
        assert!(matches!(err, ApiError::PayloadTooLarge { .. }));
    }

    #[test]
    fn test_invalid_url_is_client_error() {
        let invalid = ApiError::Upstream(FetchError::InvalidUrl("not a url".to_string()));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let upstream = ApiError::Upstream(FetchError::Status {
            url: "https://wishesvideo.com/".to_string(),
            status: 503,
        });
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);
    }
}
