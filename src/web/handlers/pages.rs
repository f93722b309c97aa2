// Page handlers for HTML rendering with Askama
//
// The dashboard page renders every section once; each interactive section
// (districts, weather, soil guide, prediction) is then refreshed in place
// through an HTMX partial.

use askama::Template;
use axum::{
    extract::{rejection::FormRejection, Form, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_htmx::HxRequest;
use serde::{de, Deserialize, Deserializer};

use crate::api_server::{
    cached_forecast, run_recommendation, AppError, AppState, RecommendOutcome, RecommendRequest,
    MISSING_PRODUCTION_NOTICE, MISSING_SOIL_NOTICE, NO_MATCH_NOTICE, WEATHER_UNAVAILABLE_NOTICE,
};
use crate::classifier::SoilReading;
use crate::i18n::{Language, Translator};
use crate::soil_guide::{suitable_crops, SOIL_GUIDE};

// ============================================================================
// View models
// ============================================================================

/// `<option>` in a select: raw value, translated label
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

pub struct LanguageOption {
    pub code: &'static str,
    pub name: &'static str,
    pub selected: bool,
}

pub struct SoilButton {
    pub label: String,
    pub url: String,
}

pub struct ForecastRow {
    pub time: String,
    pub temperature: String,
    pub description: String,
}

pub struct RecommendationRow {
    pub crop: String,
    pub percent: String,
}

/// Static UI strings, translated once per render
pub struct Labels {
    pub title: String,
    pub language: String,
    pub select_state: String,
    pub select_district: String,
    pub select_season: String,
    pub selected_region: String,
    pub season: String,
    pub weather_forecast: String,
    pub soil_guide: String,
    pub enter_readings: String,
    pub nitrogen: String,
    pub phosphorous: String,
    pub potassium: String,
    pub temperature: String,
    pub humidity: String,
    pub moisture: String,
    pub ml_heading: String,
    pub select_soil: String,
    pub predict: String,
}

impl Labels {
    async fn load(t: &Translator, lang: Language) -> Self {
        Self {
            title: t.translate("AgriGuru Lite – Smart Farming Assistant", lang).await,
            language: t.translate("Language", lang).await,
            select_state: t.translate("Select State", lang).await,
            select_district: t.translate("Select District", lang).await,
            select_season: t.translate("Select Season", lang).await,
            selected_region: t.translate("Selected Region", lang).await,
            season: t.translate("Season", lang).await,
            weather_forecast: t.translate("Weather Forecast", lang).await,
            soil_guide: t.translate("Explore Suitable Crops by Soil Type", lang).await,
            enter_readings: t.translate("Enter Soil and Climate Data (for ML Prediction)", lang).await,
            nitrogen: t.translate("Nitrogen", lang).await,
            phosphorous: t.translate("Phosphorous", lang).await,
            potassium: t.translate("Potassium", lang).await,
            temperature: t.translate("Temperature (°C)", lang).await,
            humidity: t.translate("Humidity (%)", lang).await,
            moisture: t.translate("Moisture (%)", lang).await,
            ml_heading: t.translate("ML-Powered Crop Recommendation (Filtered by District)", lang).await,
            select_soil: t.translate("Select Soil Type for ML", lang).await,
            predict: t.translate("Predict Best Crops in District", lang).await,
        }
    }
}

fn language_from(param: Option<&str>) -> Language {
    param.and_then(Language::parse).unwrap_or_default()
}

async fn options(
    t: &Translator,
    lang: Language,
    values: &[String],
    selected: &str,
) -> Vec<SelectOption> {
    let labels = t.translate_all(values, lang).await;
    values
        .iter()
        .zip(labels)
        .map(|(value, label)| SelectOption {
            selected: value == selected,
            value: value.clone(),
            label,
        })
        .collect()
}

fn render<T: Template>(template: &T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Template error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Template error: {}", e)).into_response()
        }
    }
}

/// Partials requested outside HTMX get a minimal document around them
fn render_fragment<T: Template>(template: &T, lang: Language, is_htmx: bool) -> Response {
    if is_htmx {
        return render(template);
    }
    match template.render() {
        Ok(content) => render(&FragmentPageTemplate {
            lang: lang.code(),
            content,
        }),
        Err(e) => {
            tracing::error!("Template error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Template error: {}", e)).into_response()
        }
    }
}

fn notice_fragment(kind: &'static str, message: String, lang: Language, is_htmx: bool) -> Response {
    render_fragment(&NoticeTemplate { kind, message }, lang, is_htmx)
}

// ============================================================================
// Dashboard Page
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub lang: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub season: Option<String>,
}

#[derive(Template)]
#[template(path = "pages/dashboard.html")]
pub struct DashboardTemplate {
    pub lang: &'static str,
    pub labels: Labels,
    pub languages: Vec<LanguageOption>,
    pub region_notice: Option<String>,
    pub states: Vec<SelectOption>,
    pub districts: Vec<SelectOption>,
    pub seasons: Vec<SelectOption>,
    pub selected_state: String,
    pub selected_district: String,
    pub selected_season: String,
    pub seasonal_crops: String,
    pub weather_url: String,
    pub soil_buttons: Vec<SoilButton>,
    pub model_notice: Option<String>,
    pub soil_types: Vec<SelectOption>,
}

pub async fn dashboard_page(
    State(state): State<AppState>,
    Query(params): Query<DashboardQuery>,
) -> Response {
    let lang = language_from(params.lang.as_deref());
    let t = &state.translator;
    let labels = Labels::load(t, lang).await;

    let languages = Language::ALL
        .into_iter()
        .map(|l| LanguageOption {
            code: l.code(),
            name: l.name(),
            selected: l == lang,
        })
        .collect();

    let mut region_notice = None;
    let mut states = Vec::new();
    let mut districts = Vec::new();
    let mut seasons = Vec::new();
    let mut selected_state = String::new();
    let mut selected_district = String::new();
    let mut selected_season = String::new();
    let mut seasonal_crops = String::new();

    match state.regions.as_deref() {
        Some(regions) => {
            selected_state = pick(params.state.as_deref(), regions.states());
            let district_list = regions.districts(&selected_state);
            selected_district = pick(params.district.as_deref(), district_list);
            selected_season = pick(params.season.as_deref(), regions.seasons());

            states = options(t, lang, regions.states(), &selected_state).await;
            districts = options(t, lang, district_list, &selected_district).await;
            seasons = options(t, lang, regions.seasons(), &selected_season).await;

            let crops = regions.seasonal_crops(&selected_state, &selected_district, &selected_season);
            seasonal_crops = t.translate_all(&crops, lang).await.join(", ");
        }
        None => {
            region_notice = Some(t.translate(MISSING_PRODUCTION_NOTICE, lang).await);
        }
    }

    let weather_url = format!(
        "/partials/weather?district={}&lang={}",
        urlencoding::encode(&selected_district),
        lang.code()
    );

    let mut soil_buttons = Vec::with_capacity(SOIL_GUIDE.len());
    for entry in SOIL_GUIDE.iter() {
        soil_buttons.push(SoilButton {
            label: t.translate(entry.soil, lang).await,
            url: format!("/partials/soil/{}?lang={}", urlencoding::encode(entry.soil), lang.code()),
        });
    }

    let (model_notice, soil_types) = match state.soil_model.as_deref() {
        Some(model) => {
            let first = model.soil_types().first().cloned().unwrap_or_default();
            (None, options(t, lang, model.soil_types(), &first).await)
        }
        None => (Some(t.translate(MISSING_SOIL_NOTICE, lang).await), Vec::new()),
    };

    render(&DashboardTemplate {
        lang: lang.code(),
        labels,
        languages,
        region_notice,
        states,
        districts,
        seasons,
        selected_state,
        selected_district,
        selected_season,
        seasonal_crops,
        weather_url,
        soil_buttons,
        model_notice,
        soil_types,
    })
}

/// Requested value if it is one of `values`, else the first value
fn pick(requested: Option<&str>, values: &[String]) -> String {
    requested
        .filter(|r| values.iter().any(|v| v == r))
        .map(str::to_string)
        .or_else(|| values.first().cloned())
        .unwrap_or_default()
}

// ============================================================================
// Partials
// ============================================================================

/// Standalone page around a rendered partial
#[derive(Template)]
#[template(path = "pages/fragment.html")]
pub struct FragmentPageTemplate {
    pub lang: &'static str,
    /// Already-escaped partial HTML
    pub content: String,
}

#[derive(Template)]
#[template(path = "partials/notice.html")]
pub struct NoticeTemplate {
    /// CSS modifier: "info", "warning" or "success"
    pub kind: &'static str,
    pub message: String,
}

#[derive(Template)]
#[template(path = "partials/district_options.html")]
pub struct DistrictOptionsTemplate {
    pub districts: Vec<SelectOption>,
}

#[derive(Debug, Deserialize)]
pub struct DistrictOptionsQuery {
    pub state: String,
    pub lang: Option<String>,
}

pub async fn district_options(
    State(state): State<AppState>,
    HxRequest(is_htmx): HxRequest,
    Query(params): Query<DistrictOptionsQuery>,
) -> Response {
    let lang = language_from(params.lang.as_deref());
    let regions = match state.regions() {
        Ok(r) => r,
        Err(e) => return html_error(e, &state.translator, lang, is_htmx).await,
    };

    let list = regions.districts(&params.state);
    let first = list.first().cloned().unwrap_or_default();
    let districts = options(&state.translator, lang, list, &first).await;
    render_fragment(&DistrictOptionsTemplate { districts }, lang, is_htmx)
}

#[derive(Template)]
#[template(path = "partials/weather.html")]
pub struct WeatherTemplate {
    pub rows: Vec<ForecastRow>,
}

#[derive(Debug, Deserialize)]
pub struct WeatherSectionQuery {
    pub district: String,
    pub lang: Option<String>,
}

pub async fn weather_section(
    State(state): State<AppState>,
    HxRequest(is_htmx): HxRequest,
    Query(params): Query<WeatherSectionQuery>,
) -> Response {
    let lang = language_from(params.lang.as_deref());
    let t = &state.translator;

    let forecast = match cached_forecast(&state, &params.district).await {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("Forecast for {} unavailable: {}", params.district, e);
            let message = t.translate(WEATHER_UNAVAILABLE_NOTICE, lang).await;
            return notice_fragment("warning", message, lang, is_htmx);
        }
    };

    let mut rows = Vec::with_capacity(forecast.len());
    for entry in forecast.iter() {
        rows.push(ForecastRow {
            time: entry.time.clone(),
            temperature: format!("{:.1}", entry.temperature_c),
            description: t.translate(&entry.description, lang).await,
        });
    }

    render_fragment(&WeatherTemplate { rows }, lang, is_htmx)
}

#[derive(Debug, Deserialize)]
pub struct LangQuery {
    pub lang: Option<String>,
}

pub async fn soil_crops(
    State(state): State<AppState>,
    HxRequest(is_htmx): HxRequest,
    Path(soil): Path<String>,
    Query(params): Query<LangQuery>,
) -> Response {
    let lang = language_from(params.lang.as_deref());
    let t = &state.translator;

    let Some(entry) = suitable_crops(&soil) else {
        let message = format!("{}: {}", t.translate("Unknown soil type", lang).await, soil);
        let mut response = notice_fragment("warning", message, lang, is_htmx);
        if !is_htmx {
            *response.status_mut() = StatusCode::NOT_FOUND;
        }
        return response;
    };

    let crops = t.translate_all(entry.crops, lang).await.join(", ");
    let message = format!("{}: {}", t.translate("Suitable Crops", lang).await, crops);
    notice_fragment("success", message, lang, is_htmx)
}

#[derive(Template)]
#[template(path = "partials/recommendation.html")]
pub struct RecommendationTemplate {
    pub heading: String,
    pub confidence_label: String,
    pub rows: Vec<RecommendationRow>,
}

/// Flat form body (urlencoded forms cannot use `#[serde(flatten)]` with numbers)
///
/// A cleared or missing number input reads as 0.
#[derive(Debug, Deserialize)]
pub struct RecommendForm {
    pub lang: Option<String>,
    pub state: String,
    pub district: String,
    #[serde(default, deserialize_with = "blank_as_zero")]
    pub nitrogen: f64,
    #[serde(default, deserialize_with = "blank_as_zero")]
    pub phosphorous: f64,
    #[serde(default, deserialize_with = "blank_as_zero")]
    pub potassium: f64,
    #[serde(default, deserialize_with = "blank_as_zero")]
    pub temperature: f64,
    #[serde(default, deserialize_with = "blank_as_zero")]
    pub humidity: f64,
    #[serde(default, deserialize_with = "blank_as_zero")]
    pub moisture: f64,
    pub soil_type: String,
}

fn blank_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0.0);
    }
    raw.parse().map_err(de::Error::custom)
}

impl From<RecommendForm> for RecommendRequest {
    fn from(form: RecommendForm) -> Self {
        RecommendRequest {
            state: form.state,
            district: form.district,
            reading: SoilReading {
                nitrogen: form.nitrogen,
                phosphorous: form.phosphorous,
                potassium: form.potassium,
                temperature: form.temperature,
                humidity: form.humidity,
                moisture: form.moisture,
                soil_type: form.soil_type,
            },
        }
    }
}

pub async fn recommendation_section(
    State(state): State<AppState>,
    HxRequest(is_htmx): HxRequest,
    form: Result<Form<RecommendForm>, FormRejection>,
) -> Response {
    let t = &state.translator;
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::debug!("Rejected recommendation form: {}", rejection.body_text());
            let e = AppError::BadRequest("Please enter numeric soil and climate readings.".to_string());
            return html_error(e, t, Language::default(), is_htmx).await;
        }
    };
    let lang = language_from(form.lang.as_deref());

    let outcome = match run_recommendation(&state, form.into()).await {
        Ok(outcome) => outcome,
        Err(e) => return html_error(e, t, lang, is_htmx).await,
    };

    match outcome {
        RecommendOutcome::Ranked(recommendations) => {
            let mut rows = Vec::with_capacity(recommendations.len());
            for rec in &recommendations {
                rows.push(RecommendationRow {
                    crop: t.translate(&rec.crop, lang).await,
                    percent: format!("{:.1}", rec.confidence * 100.0),
                });
            }
            render_fragment(
                &RecommendationTemplate {
                    heading: t.translate("Top Recommended Crops Grown in Your District:", lang).await,
                    confidence_label: t.translate("Confidence", lang).await,
                    rows,
                },
                lang,
                is_htmx,
            )
        }
        RecommendOutcome::NoLocalMatch => {
            notice_fragment("info", t.translate(NO_MATCH_NOTICE, lang).await, lang, is_htmx)
        }
    }
}

/// AppError rendered as a notice
///
/// HTMX only swaps 2xx responses, so the error status is kept for plain
/// requests only.
async fn html_error(e: AppError, t: &Translator, lang: Language, is_htmx: bool) -> Response {
    let (status, message) = e.status_and_message();
    let message = t.translate(&message, lang).await;
    let mut response = notice_fragment("warning", message, lang, is_htmx);
    if !is_htmx {
        *response.status_mut() = status;
    }
    response
}
