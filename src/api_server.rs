// Axum Dashboard Server Module
//
// Purpose: serve the dashboard (HTML + HTMX partials) and a JSON API over the
// same process-scoped state: region index, fitted soil model, weather client,
// translation cache.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use anyhow::Context;

use crate::classifier::{ClassProbabilities, ForestParams, SoilModel, SoilReading};
use crate::config::AppConfig;
use crate::data::{ReferenceData, PRODUCTION_FILE, SOIL_FILE};
use crate::error::{ModelError, RecommendError};
use crate::i18n::{GoogleTranslateBackend, TranslationBackend, Translator};
use crate::recommend::{rank_recommendations, Recommendation, Recommendations};
use crate::region::RegionIndex;
use crate::soil_guide::SOIL_GUIDE;
use crate::weather::{ForecastEntry, OpenWeatherClient, WeatherError, WeatherSource};
use crate::web::handlers::pages;

pub const MISSING_PRODUCTION_NOTICE: &str = "Please upload crop_production.csv.";
pub const MISSING_SOIL_NOTICE: &str = "Please upload data_core.csv.";
pub const WEATHER_UNAVAILABLE_NOTICE: &str = "Weather unavailable. Try a nearby city.";
pub const NO_MATCH_NOTICE: &str = "No matching crops from prediction found in this district.";

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    /// None when crop_production.csv is missing or unreadable
    pub regions: Option<Arc<RegionIndex>>,
    /// None when data_core.csv is missing or the model could not be fitted
    pub soil_model: Option<Arc<SoilModel>>,
    pub weather: Arc<dyn WeatherSource>,
    pub translator: Translator,
    /// Forecasts per city (10 min TTL)
    pub forecast_cache: Cache<String, Arc<Vec<ForecastEntry>>>,
}

impl AppState {
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        tracing::info!("Loading reference data from {}...", config.data_dir.display());
        let data_dir = config.data_dir.clone();
        let forest = config.forest.clone();

        // CSV parsing and forest fitting are CPU-bound
        let (regions, soil_model) = tokio::task::spawn_blocking(move || {
            let reference = ReferenceData::load(&data_dir);
            build_reference_state(reference, &forest)
        })
        .await
        .context("Reference data loading task failed")?;

        tracing::info!("Initializing weather client...");
        let weather = OpenWeatherClient::new(&config.weather_base_url, config.weather_api_key.clone())
            .context("Failed to build weather client")?;

        tracing::info!("Initializing translator...");
        let backend = GoogleTranslateBackend::new(&config.translate_base_url)
            .context("Failed to build translation client")?;

        Ok(Self::with_services(
            regions,
            soil_model,
            Arc::new(weather),
            Translator::new(Arc::new(backend)),
        ))
    }

    /// Build from already-loaded tables and caller-supplied collaborators
    pub fn from_reference(
        reference: ReferenceData,
        forest: &ForestParams,
        weather: Arc<dyn WeatherSource>,
        translation: Arc<dyn TranslationBackend>,
    ) -> Self {
        let (regions, soil_model) = build_reference_state(reference, forest);
        Self::with_services(regions, soil_model, weather, Translator::new(translation))
    }

    fn with_services(
        regions: Option<Arc<RegionIndex>>,
        soil_model: Option<Arc<SoilModel>>,
        weather: Arc<dyn WeatherSource>,
        translator: Translator,
    ) -> Self {
        let forecast_cache = Cache::builder()
            .max_capacity(1_000)
            .time_to_live(Duration::from_secs(600))
            .build();

        Self {
            regions,
            soil_model,
            weather,
            translator,
            forecast_cache,
        }
    }

    pub(crate) fn regions(&self) -> Result<&RegionIndex, AppError> {
        self.regions
            .as_deref()
            .ok_or_else(|| AppError::Unavailable(MISSING_PRODUCTION_NOTICE.to_string()))
    }

    pub(crate) fn soil_model(&self) -> Result<Arc<SoilModel>, AppError> {
        self.soil_model
            .clone()
            .ok_or_else(|| AppError::Unavailable(MISSING_SOIL_NOTICE.to_string()))
    }
}

fn build_reference_state(
    reference: ReferenceData,
    forest: &ForestParams,
) -> (Option<Arc<RegionIndex>>, Option<Arc<SoilModel>>) {
    let regions = reference
        .production
        .ok()
        .map(|history| Arc::new(RegionIndex::build(&history)));

    let soil_model = match reference.soil {
        Ok(dataset) => match SoilModel::train(&dataset, forest) {
            Ok(model) => {
                tracing::info!(
                    "Soil model ready: {} examples, {} crop labels, {} soil types",
                    model.n_examples(),
                    model.crop_labels().len(),
                    model.soil_types().len()
                );
                Some(Arc::new(model))
            }
            Err(e) => {
                tracing::warn!("Soil model training failed: {}", e);
                None
            }
        },
        Err(_) => None,
    };

    if regions.is_none() {
        tracing::warn!("{} not loaded: region selection disabled", PRODUCTION_FILE);
    }
    if soil_model.is_none() {
        tracing::warn!("{} not loaded: crop prediction disabled", SOIL_FILE);
    }

    (regions, soil_model)
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Dashboard (HTML + HTMX partials)
        .route("/", get(pages::dashboard_page))
        .route("/partials/districts", get(pages::district_options))
        .route("/partials/weather", get(pages::weather_section))
        .route("/partials/soil/:soil", get(pages::soil_crops))
        .route("/partials/recommend", post(pages::recommendation_section))

        // Region endpoints (JSON)
        .route("/api/regions/states", get(list_states))
        .route("/api/regions/districts", get(list_districts))
        .route("/api/regions/seasons", get(list_seasons))
        .route("/api/regions/crops", get(region_crops))

        // Reference + services (JSON)
        .route("/api/soil-guide", get(soil_guide))
        .route("/api/weather", get(weather_forecast))
        .route("/api/recommend", post(recommend))

        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Shared operations (used by JSON and HTML handlers)
// ============================================================================

/// Forecast for `city`, served from the forecast cache when fresh
pub(crate) async fn cached_forecast(
    state: &AppState,
    city: &str,
) -> Result<Arc<Vec<ForecastEntry>>, WeatherError> {
    let key = city.trim().to_lowercase();
    if let Some(cached) = state.forecast_cache.get(&key).await {
        tracing::debug!("Cache hit for forecast {}", key);
        return Ok(cached);
    }

    let entries = Arc::new(state.weather.forecast(city).await?);
    state.forecast_cache.insert(key, entries.clone()).await;
    Ok(entries)
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendRequest {
    pub state: String,
    pub district: String,
    #[serde(flatten)]
    pub reading: SoilReading,
}

/// Result of one prediction request
#[derive(Debug, Clone, PartialEq)]
pub enum RecommendOutcome {
    Ranked(Recommendations),
    /// The district grows none of the classifier's crops
    NoLocalMatch,
}

pub(crate) async fn run_recommendation(
    state: &AppState,
    request: RecommendRequest,
) -> Result<RecommendOutcome, AppError> {
    let regions = state.regions()?;
    let model = state.soil_model()?;

    if !regions.contains_district(&request.state, &request.district) {
        return Err(AppError::NotFound(format!(
            "District {} in {} not found",
            request.district, request.state
        )));
    }
    let district_crops = regions.district_crops(&request.state, &request.district).to_vec();

    tracing::info!(
        "Predicting crops for {}, {} (soil: {})",
        request.district,
        request.state,
        request.reading.soil_type
    );

    // CPU-bound work: run in blocking thread pool
    let reading = request.reading;
    let probabilities: ClassProbabilities = tokio::task::spawn_blocking(move || model.predict(&reading))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))??;

    match rank_recommendations(&probabilities, &district_crops) {
        Ok(recommendations) => Ok(RecommendOutcome::Ranked(recommendations)),
        Err(RecommendError::NoLocalMatch) => Ok(RecommendOutcome::NoLocalMatch),
    }
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "production_data": state.regions.is_some(),
        "soil_model": state.soil_model.is_some(),
    }))
}

async fn list_states(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let regions = state.regions()?;
    Ok(Json(serde_json::json!({
        "rows": regions.states().len(),
        "data": regions.states(),
    })))
}

#[derive(Debug, Deserialize)]
struct DistrictQuery {
    state: String,
}

async fn list_districts(
    State(state): State<AppState>,
    Query(params): Query<DistrictQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let regions = state.regions()?;
    let districts = regions.districts(&params.state);
    if districts.is_empty() {
        return Err(AppError::NotFound(format!("State {} not found", params.state)));
    }

    Ok(Json(serde_json::json!({
        "state": params.state,
        "rows": districts.len(),
        "data": districts,
    })))
}

async fn list_seasons(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let regions = state.regions()?;
    Ok(Json(serde_json::json!({
        "rows": regions.seasons().len(),
        "data": regions.seasons(),
    })))
}

#[derive(Debug, Deserialize)]
struct CropQuery {
    state: String,
    district: String,
    season: Option<String>,
}

async fn region_crops(
    State(state): State<AppState>,
    Query(params): Query<CropQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let regions = state.regions()?;
    if !regions.contains_district(&params.state, &params.district) {
        return Err(AppError::NotFound(format!(
            "District {} in {} not found",
            params.district, params.state
        )));
    }

    let seasonal = params
        .season
        .as_deref()
        .map(|season| regions.seasonal_crops(&params.state, &params.district, season));

    Ok(Json(serde_json::json!({
        "state": params.state,
        "district": params.district,
        "season": params.season,
        "district_crops": regions.district_crops(&params.state, &params.district),
        "seasonal_crops": seasonal,
    })))
}

async fn soil_guide() -> impl IntoResponse {
    Json(serde_json::json!({
        "rows": SOIL_GUIDE.len(),
        "data": SOIL_GUIDE,
    }))
}

#[derive(Debug, Deserialize)]
struct WeatherQuery {
    city: String,
}

async fn weather_forecast(
    State(state): State<AppState>,
    Query(params): Query<WeatherQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let forecast = cached_forecast(&state, &params.city).await.map_err(|e| {
        tracing::warn!("Forecast for {} unavailable: {}", params.city, e);
        AppError::Upstream(WEATHER_UNAVAILABLE_NOTICE.to_string())
    })?;

    Ok(Json(serde_json::json!({
        "city": params.city,
        "rows": forecast.len(),
        "data": forecast.as_slice(),
    })))
}

#[derive(Debug, Serialize)]
struct RecommendResponse {
    status: &'static str,
    state: String,
    district: String,
    recommendations: Vec<Recommendation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

async fn recommend(
    State(state): State<AppState>,
    Json(payload): Json<RecommendRequest>,
) -> Result<Json<RecommendResponse>, AppError> {
    let state_name = payload.state.clone();
    let district = payload.district.clone();

    let response = match run_recommendation(&state, payload).await? {
        RecommendOutcome::Ranked(recommendations) => RecommendResponse {
            status: "ok",
            state: state_name,
            district,
            recommendations: recommendations.into_vec(),
            message: None,
        },
        RecommendOutcome::NoLocalMatch => RecommendResponse {
            status: "no_match",
            state: state_name,
            district,
            recommendations: Vec::new(),
            message: Some(NO_MATCH_NOTICE),
        },
    };

    Ok(Json(response))
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    /// Reference data or model not loaded
    Unavailable(String),
    /// External service (weather) failed
    Upstream(String),
    Internal(String),
}

impl From<ModelError> for AppError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::UnknownCategory { .. } | ModelError::InvalidReading { .. } => {
                AppError::BadRequest(e.to_string())
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl AppError {
    pub(crate) fn status_and_message(self) -> (StatusCode, String) {
        match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = self.status_and_message();

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
