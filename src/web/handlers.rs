use actix_web::{
    error::{JsonPayloadError, QueryPayloadError},
    http::StatusCode,
    web, HttpRequest, HttpResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculation::parse_due_date;
use crate::error::RoyaltyError;
use crate::io::write_records_csv_to;
use crate::models::{
    RoyaltyCalculationInput, RoyaltyCalculationResult, RoyaltyRecord, RoyaltySettings,
    SettingsIssue, SettingsPatch,
};

use super::state::AppState;

// ---------------------------------------------------------------------------
// Error wrapper
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    details: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    issues: Vec<SettingsIssue>,
}

#[derive(Debug)]
pub(crate) struct WebError(RoyaltyError);

impl From<RoyaltyError> for WebError {
    fn from(e: RoyaltyError) -> Self {
        WebError(e)
    }
}

impl std::fmt::Display for WebError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl actix_web::ResponseError for WebError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            RoyaltyError::InvalidInput(_)
            | RoyaltyError::SettingsValidation(_)
            | RoyaltyError::ParseError(_) => StatusCode::BAD_REQUEST,
            RoyaltyError::NotFound(_) => StatusCode::NOT_FOUND,
            RoyaltyError::Duplicate(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorBody {
            error: status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            details: self.0.to_string(),
            issues: Vec::new(),
        })
    }
}

/// Malformed JSON bodies get the same error body as every other failure.
pub(crate) fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    WebError(RoyaltyError::InvalidInput(err.to_string())).into()
}

pub(crate) fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    WebError(RoyaltyError::InvalidInput(err.to_string())).into()
}

/// 400 carrying every rejected settings field.
fn settings_rejected(issues: Vec<SettingsIssue>) -> HttpResponse {
    let details = issues
        .iter()
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    HttpResponse::BadRequest().json(ErrorBody {
        error: "Bad Request".to_string(),
        details,
        issues,
    })
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    water_gel: f64,
    nh4no3: f64,
    powder_factor: f64,
    /// `YYYY-MM-DD` or RFC 3339; defaults to today plus the payment terms
    #[serde(default)]
    payment_due_date: Option<String>,
}

pub async fn calculate(
    state: web::Data<AppState>,
    body: web::Json<CalculateRequest>,
) -> Result<HttpResponse, WebError> {
    let body = body.into_inner();
    let input = RoyaltyCalculationInput::new(body.water_gel, body.nh4no3, body.powder_factor);
    let calculator = state.calculator();
    let result = match body.payment_due_date.as_deref() {
        Some(due) => calculator.calculate_due(&input, parse_due_date(due)?)?,
        None => calculator.calculate(&input)?,
    };
    Ok(HttpResponse::Ok().json(result))
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

pub async fn get_settings(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.settings.get())
}

pub async fn put_settings(
    state: web::Data<AppState>,
    body: web::Json<RoyaltySettings>,
) -> Result<HttpResponse, WebError> {
    let settings = body.into_inner();
    let issues = settings.validate_all(state.settings.bound());
    if !issues.is_empty() {
        return Ok(settings_rejected(issues));
    }
    state.settings.update(settings)?;
    Ok(HttpResponse::Ok().json(settings))
}

pub async fn patch_settings(
    state: web::Data<AppState>,
    body: web::Json<SettingsPatch>,
) -> Result<HttpResponse, WebError> {
    let patch = body.into_inner();
    let issues = patch
        .apply(state.settings.get())
        .validate_all(state.settings.bound());
    if !issues.is_empty() {
        return Ok(settings_rejected(issues));
    }
    let merged = state.settings.apply_patch(&patch)?;
    Ok(HttpResponse::Ok().json(merged))
}

pub async fn reset_settings(state: web::Data<AppState>) -> Result<HttpResponse, WebError> {
    state.settings.reset()?;
    Ok(HttpResponse::Ok().json(RoyaltySettings::DEFAULT))
}

// ---------------------------------------------------------------------------
// Saved royalties
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SaveRoyaltyRequest {
    miner_id: String,
    calculation: RoyaltyCalculationResult,
}

#[derive(Debug, Serialize, Deserialize)]
struct SaveRoyaltyResponse {
    success: bool,
    message: String,
    data: RoyaltyRecord,
}

pub async fn save_royalty(
    state: web::Data<AppState>,
    body: web::Json<SaveRoyaltyRequest>,
) -> Result<HttpResponse, WebError> {
    let body = body.into_inner();
    let record = RoyaltyRecord::from_result(&body.miner_id, &body.calculation)?;
    state.records.insert(&record)?;
    Ok(HttpResponse::Ok().json(SaveRoyaltyResponse {
        success: true,
        message: "Royalty calculation saved successfully".to_string(),
        data: record,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    miner_id: Option<String>,
}

pub async fn list_royalties(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, WebError> {
    let records = state.records.list(query.miner_id.as_deref())?;
    Ok(HttpResponse::Ok().json(records))
}

fn record_not_found(id: Uuid) -> WebError {
    WebError(RoyaltyError::NotFound(format!("Royalty record {id} not found")))
}

pub async fn get_royalty(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, WebError> {
    let id = path.into_inner();
    let record = state.records.get(id)?.ok_or_else(|| record_not_found(id))?;
    Ok(HttpResponse::Ok().json(record))
}

pub async fn delete_royalty(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, WebError> {
    let id = path.into_inner();
    if !state.records.delete(id)? {
        return Err(record_not_found(id));
    }
    Ok(HttpResponse::NoContent().finish())
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    format: Option<String>,
    miner_id: Option<String>,
}

pub async fn export_royalties(
    state: web::Data<AppState>,
    query: web::Query<ExportQuery>,
) -> Result<HttpResponse, WebError> {
    let records = state.records.list(query.miner_id.as_deref())?;

    match query.format.as_deref().unwrap_or("csv") {
        "csv" => {
            let mut data = Vec::new();
            write_records_csv_to(&records, &mut data)?;
            Ok(HttpResponse::Ok()
                .content_type("text/csv")
                .insert_header((
                    "Content-Disposition",
                    "attachment; filename=\"royalties.csv\"",
                ))
                .body(data))
        }
        "json" => {
            let data = serde_json::to_string_pretty(&records).map_err(RoyaltyError::from)?;
            Ok(HttpResponse::Ok()
                .content_type("application/json")
                .insert_header((
                    "Content-Disposition",
                    "attachment; filename=\"royalties.json\"",
                ))
                .body(data))
        }
        other => Err(WebError(RoyaltyError::InvalidInput(format!(
            "Unsupported export format: {other}. Use csv or json"
        )))),
    }
}
