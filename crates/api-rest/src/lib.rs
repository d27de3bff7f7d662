//! # API REST
//!
//! REST API for wardbook.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON request/response shapes, CORS, status
//!   code mapping)
//!
//! Domain rules live in `wardbook-core`; this crate only translates between
//! HTTP and the core services. The acting user is taken from the
//! `x-actor-id`/`x-actor-name` headers, falling back to `system` for
//! unattributed calls.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path as AxumPath, Query as AxumQuery, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use wardbook_core::{
    Admission, AdmissionStatus, AdmissionsService, AdmitRequest, Bed, CoreConfig, Dispatcher,
    Facility, Invoice, InvoiceItem, InvoiceStatus, LedgerService, NewFacility, NewItem,
    OrgContext, RegistryService, WardError,
};
use wardbook_docstore::{DocumentStore, StoreError};
use wardbook_types::{Money, NonEmptyText};

/// Application state shared across REST API handlers.
///
/// Holds the core service instances; all of them sit on the same document
/// store so a handler never mixes storage backends.
#[derive(Clone)]
pub struct AppState {
    registry: RegistryService,
    ledger: LedgerService,
    admissions: AdmissionsService,
}

impl AppState {
    pub fn new(
        cfg: Arc<CoreConfig>,
        store: Arc<dyn DocumentStore>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        let ledger = LedgerService::new(cfg, store.clone());
        Self {
            registry: RegistryService::new(store.clone()),
            admissions: AdmissionsService::new(store, ledger.clone(), dispatcher),
            ledger,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        create_facility,
        list_facilities,
        get_facility,
        available_beds,
        set_facility_rate,
        admit,
        list_admissions,
        get_admission,
        discharge,
        admitted_everywhere,
        get_invoice,
        list_invoice_items,
        add_invoice_item,
        remove_invoice_item,
        transition_invoice,
        verify_invoice_total,
        patient_invoices,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        CreateFacilityReq,
        CreateFacilityRes,
        FacilityRes,
        BedRes,
        SetRateReq,
        AdmitReq,
        AdmitRes,
        AdmissionRes,
        DischargeRes,
        InvoiceRes,
        InvoiceItemRes,
        AddItemReq,
        AddItemRes,
        TransitionReq,
        VerifyTotalRes,
    ))
)]
struct ApiDoc;

/// Builds the REST router with Swagger UI and permissive CORS.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/organizations/:org/facilities", post(create_facility))
        .route("/organizations/:org/facilities", get(list_facilities))
        .route("/organizations/:org/facilities/:facility_id", get(get_facility))
        .route(
            "/organizations/:org/facilities/:facility_id/beds/available",
            get(available_beds),
        )
        .route(
            "/organizations/:org/facilities/:facility_id/rate",
            put(set_facility_rate),
        )
        .route("/organizations/:org/admissions", post(admit))
        .route("/organizations/:org/admissions", get(list_admissions))
        .route("/organizations/:org/admissions/:admission_id", get(get_admission))
        .route(
            "/organizations/:org/admissions/:admission_id/discharge",
            post(discharge),
        )
        .route("/admissions/admitted", get(admitted_everywhere))
        .route("/organizations/:org/invoices/:invoice_id", get(get_invoice))
        .route(
            "/organizations/:org/invoices/:invoice_id/items",
            get(list_invoice_items),
        )
        .route(
            "/organizations/:org/invoices/:invoice_id/items",
            post(add_invoice_item),
        )
        .route(
            "/organizations/:org/invoices/:invoice_id/items/:item_id",
            delete(remove_invoice_item),
        )
        .route(
            "/organizations/:org/invoices/:invoice_id/status",
            post(transition_invoice),
        )
        .route(
            "/organizations/:org/invoices/:invoice_id/total-check",
            get(verify_invoice_total),
        )
        .route(
            "/organizations/:org/patients/:patient_id/invoices",
            get(patient_invoices),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Serialize, ToSchema)]
struct HealthRes {
    ok: bool,
    message: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct CreateFacilityReq {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    cost_per_day: f64,
    bed_ids: Vec<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct CreateFacilityRes {
    facility_id: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct BedRes {
    id: String,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    patient_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    patient_name: Option<String>,
}

impl From<Bed> for BedRes {
    fn from(bed: Bed) -> Self {
        Self {
            id: bed.id,
            status: bed.status.as_str().to_owned(),
            patient_id: bed.patient_id,
            patient_name: bed.patient_name,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct FacilityRes {
    id: String,
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[schema(value_type = f64)]
    cost_per_day: Money,
    total_beds: u32,
    beds: Vec<BedRes>,
}

impl FacilityRes {
    fn from_facility(id: String, facility: Facility) -> Self {
        Self {
            id,
            name: facility.name.as_str().to_owned(),
            kind: facility.kind.as_str().to_owned(),
            cost_per_day: facility.cost_per_day,
            total_beds: facility.total_beds,
            beds: facility.beds.into_values().map(BedRes::from).collect(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct SetRateReq {
    cost_per_day: f64,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct AdmitReq {
    patient_id: String,
    patient_name: String,
    facility_id: String,
    bed_id: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct AdmitRes {
    admission_id: String,
    invoice_id: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct AdmissionRes {
    id: String,
    patient_id: String,
    patient_name: String,
    facility_id: String,
    facility_name: String,
    bed_id: String,
    #[schema(value_type = Option<f64>)]
    #[serde(skip_serializing_if = "Option::is_none")]
    facility_cost_per_day: Option<Money>,
    #[schema(value_type = String)]
    admission_date: chrono::DateTime<chrono::Utc>,
    #[schema(value_type = Option<String>)]
    #[serde(skip_serializing_if = "Option::is_none")]
    discharge_date: Option<chrono::DateTime<chrono::Utc>>,
    status: String,
}

impl AdmissionRes {
    fn from_admission(id: String, admission: Admission) -> Self {
        Self {
            id,
            patient_id: admission.patient_id,
            patient_name: admission.patient_name,
            facility_id: admission.facility_id,
            facility_name: admission.facility_name,
            bed_id: admission.bed_id,
            facility_cost_per_day: admission.facility_cost_per_day,
            admission_date: admission.admission_date,
            discharge_date: admission.discharge_date,
            status: admission.status.as_str().to_owned(),
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct DischargeRes {
    additional_days: i64,
    #[schema(value_type = Option<f64>)]
    #[serde(skip_serializing_if = "Option::is_none")]
    additional_charge: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    invoice_id: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct InvoiceRes {
    id: String,
    patient_id: String,
    organization_id: String,
    status: String,
    #[schema(value_type = f64)]
    total_amount: Money,
    #[schema(value_type = String)]
    created_at: chrono::DateTime<chrono::Utc>,
    #[schema(value_type = String)]
    due_date: chrono::DateTime<chrono::Utc>,
}

impl InvoiceRes {
    fn from_invoice(id: String, invoice: Invoice) -> Self {
        Self {
            id,
            patient_id: invoice.patient_id,
            organization_id: invoice.organization_id,
            status: invoice.status.as_str().to_owned(),
            total_amount: invoice.total_amount,
            created_at: invoice.created_at,
            due_date: invoice.due_date,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct InvoiceItemRes {
    id: String,
    name: String,
    quantity: u32,
    #[schema(value_type = f64)]
    unit_cost: Money,
    #[schema(value_type = f64)]
    total_cost: Money,
    #[schema(value_type = String)]
    created_at: chrono::DateTime<chrono::Utc>,
}

impl InvoiceItemRes {
    fn from_item(id: String, item: InvoiceItem) -> Self {
        Self {
            id,
            name: item.name.as_str().to_owned(),
            quantity: item.quantity,
            unit_cost: item.unit_cost,
            total_cost: item.total_cost,
            created_at: item.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct AddItemReq {
    name: String,
    quantity: u32,
    unit_cost: f64,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct AddItemRes {
    item_id: String,
}

#[derive(Deserialize, ToSchema)]
struct TransitionReq {
    status: String,
}

#[derive(Serialize, ToSchema)]
struct VerifyTotalRes {
    consistent: bool,
}

#[derive(Deserialize)]
struct ListAdmissionsParams {
    status: Option<String>,
    limit: Option<usize>,
    after: Option<String>,
}

// ---------------------------------------------------------------------------
// Error and input mapping
// ---------------------------------------------------------------------------

type ApiError = (StatusCode, Json<ErrorRes>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn api_error(err: WardError) -> ApiError {
    let status = match &err {
        WardError::InvalidInput(_) | WardError::Money(_) => StatusCode::BAD_REQUEST,
        WardError::FacilityNotFound(_)
        | WardError::AdmissionNotFound(_)
        | WardError::InvoiceNotFound(_)
        | WardError::InvoiceItemNotFound(_)
        | WardError::BedNotFound { .. } => StatusCode::NOT_FOUND,
        WardError::BedUnavailable { .. }
        | WardError::BedNotOccupied { .. }
        | WardError::AlreadyDischarged(_)
        | WardError::MissingDischargeRate(_)
        | WardError::InvoiceNotEditable(_)
        | WardError::InvalidStatusTransition { .. } => StatusCode::CONFLICT,
        // A keyed-create collision means someone else won the race; the
        // request can be retried and will resolve to the winner's document.
        WardError::Commit(StoreError::AlreadyExists(_)) => StatusCode::CONFLICT,
        WardError::Store(_) | WardError::Commit(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "request failed");
        return (
            status,
            Json(ErrorRes {
                error: "Internal error".into(),
            }),
        );
    }
    (
        status,
        Json(ErrorRes {
            error: err.to_string(),
        }),
    )
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorRes {
            error: message.into(),
        }),
    )
}

fn text(field: &str, value: &str) -> Result<NonEmptyText, ApiError> {
    NonEmptyText::new(value).map_err(|_| bad_request(format!("{field} must not be empty")))
}

fn money(field: &str, raw: f64) -> Result<Money, ApiError> {
    let amount = Decimal::from_f64(raw)
        .ok_or_else(|| bad_request(format!("{field} must be a finite number")))?;
    Money::new(amount).map_err(|e| bad_request(format!("{field}: {e}")))
}

fn invoice_status(raw: &str) -> Result<InvoiceStatus, ApiError> {
    match raw {
        "draft" => Ok(InvoiceStatus::Draft),
        "open" => Ok(InvoiceStatus::Open),
        "paid" => Ok(InvoiceStatus::Paid),
        "void" => Ok(InvoiceStatus::Void),
        other => Err(bad_request(format!("unknown invoice status: {other:?}"))),
    }
}

fn admission_status(raw: &str) -> Result<AdmissionStatus, ApiError> {
    match raw {
        "admitted" => Ok(AdmissionStatus::Admitted),
        "discharged" => Ok(AdmissionStatus::Discharged),
        other => Err(bad_request(format!("unknown admission status: {other:?}"))),
    }
}

/// Builds the per-call context from the path's organization and the actor
/// headers. Calls without actor headers are attributed to `system`.
fn org_context(org: &str, headers: &HeaderMap) -> Result<OrgContext, ApiError> {
    let actor_id = headers
        .get("x-actor-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("system");
    let actor_name = headers
        .get("x-actor-name")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("System");

    Ok(OrgContext::new(
        text("organization id", org)?,
        text("x-actor-id", actor_id)?,
        text("x-actor-name", actor_name)?,
    ))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint used by monitoring and load balancers.
#[axum::debug_handler]
async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "wardbook REST API is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/organizations/{org}/facilities",
    request_body = CreateFacilityReq,
    responses(
        (status = 200, description = "Facility created", body = CreateFacilityRes),
        (status = 400, description = "Bad request", body = ErrorRes)
    )
)]
/// Create a facility with every listed bed available.
#[axum::debug_handler]
async fn create_facility(
    State(state): State<AppState>,
    AxumPath(org): AxumPath<String>,
    headers: HeaderMap,
    Json(req): Json<CreateFacilityReq>,
) -> ApiResult<CreateFacilityRes> {
    let ctx = org_context(&org, &headers)?;
    let bed_ids = req
        .bed_ids
        .iter()
        .map(|id| text("bed id", id))
        .collect::<Result<Vec<_>, _>>()?;

    let facility_id = state
        .registry
        .create(
            &ctx,
            NewFacility {
                name: text("name", &req.name)?,
                kind: text("type", &req.kind)?,
                cost_per_day: money("costPerDay", req.cost_per_day)?,
                bed_ids,
            },
        )
        .map_err(api_error)?;
    Ok(Json(CreateFacilityRes { facility_id }))
}

#[utoipa::path(
    get,
    path = "/organizations/{org}/facilities",
    responses(
        (status = 200, description = "Facilities of the organization", body = [FacilityRes])
    )
)]
/// List the organization's facilities with their bed maps.
#[axum::debug_handler]
async fn list_facilities(
    State(state): State<AppState>,
    AxumPath(org): AxumPath<String>,
    headers: HeaderMap,
) -> ApiResult<Vec<FacilityRes>> {
    let ctx = org_context(&org, &headers)?;
    let facilities = state.registry.list(&ctx).map_err(api_error)?;
    Ok(Json(
        facilities
            .into_iter()
            .map(|(id, facility)| FacilityRes::from_facility(id, facility))
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/organizations/{org}/facilities/{facility_id}",
    responses(
        (status = 200, description = "Facility", body = FacilityRes),
        (status = 404, description = "Facility not found", body = ErrorRes)
    )
)]
/// Read one facility.
#[axum::debug_handler]
async fn get_facility(
    State(state): State<AppState>,
    AxumPath((org, facility_id)): AxumPath<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<FacilityRes> {
    let ctx = org_context(&org, &headers)?;
    let facility = state.registry.get(&ctx, &facility_id).map_err(api_error)?;
    Ok(Json(FacilityRes::from_facility(facility_id, facility)))
}

#[utoipa::path(
    get,
    path = "/organizations/{org}/facilities/{facility_id}/beds/available",
    responses(
        (status = 200, description = "Beds currently free to assign", body = [BedRes]),
        (status = 404, description = "Facility not found", body = ErrorRes)
    )
)]
/// List a facility's available beds.
#[axum::debug_handler]
async fn available_beds(
    State(state): State<AppState>,
    AxumPath((org, facility_id)): AxumPath<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<Vec<BedRes>> {
    let ctx = org_context(&org, &headers)?;
    let beds = state
        .registry
        .available_beds(&ctx, &facility_id)
        .map_err(api_error)?;
    Ok(Json(beds.into_iter().map(BedRes::from).collect()))
}

#[utoipa::path(
    put,
    path = "/organizations/{org}/facilities/{facility_id}/rate",
    request_body = SetRateReq,
    responses(
        (status = 200, description = "Rate updated"),
        (status = 404, description = "Facility not found", body = ErrorRes)
    )
)]
/// Update a facility's per-day rate. Only future admissions see the new
/// rate; existing admissions keep their snapshot.
#[axum::debug_handler]
async fn set_facility_rate(
    State(state): State<AppState>,
    AxumPath((org, facility_id)): AxumPath<(String, String)>,
    headers: HeaderMap,
    Json(req): Json<SetRateReq>,
) -> Result<StatusCode, ApiError> {
    let ctx = org_context(&org, &headers)?;
    state
        .registry
        .set_cost_per_day(&ctx, &facility_id, money("costPerDay", req.cost_per_day)?)
        .map_err(api_error)?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/organizations/{org}/admissions",
    request_body = AdmitReq,
    responses(
        (status = 200, description = "Patient admitted", body = AdmitRes),
        (status = 404, description = "Facility or bed not found", body = ErrorRes),
        (status = 409, description = "Bed is not available", body = ErrorRes)
    )
)]
/// Admit a patient to a bed.
///
/// Atomically creates the admission, occupies the bed, and bills the first
/// day onto the patient's draft invoice (created on demand).
#[axum::debug_handler]
async fn admit(
    State(state): State<AppState>,
    AxumPath(org): AxumPath<String>,
    headers: HeaderMap,
    Json(req): Json<AdmitReq>,
) -> ApiResult<AdmitRes> {
    let ctx = org_context(&org, &headers)?;
    let outcome = state
        .admissions
        .admit(
            &ctx,
            AdmitRequest {
                patient_id: text("patientId", &req.patient_id)?,
                patient_name: text("patientName", &req.patient_name)?,
                facility_id: text("facilityId", &req.facility_id)?,
                bed_id: text("bedId", &req.bed_id)?,
            },
        )
        .map_err(api_error)?;
    Ok(Json(AdmitRes {
        admission_id: outcome.admission_id,
        invoice_id: outcome.invoice_id,
    }))
}

#[utoipa::path(
    get,
    path = "/organizations/{org}/admissions",
    responses(
        (status = 200, description = "Admissions of the organization", body = [AdmissionRes])
    )
)]
/// List the organization's admissions in admission-date order.
///
/// Supports `status`, `limit`, and `after` (cursor: the last admission id of
/// the previous page) query parameters.
#[axum::debug_handler]
async fn list_admissions(
    State(state): State<AppState>,
    AxumPath(org): AxumPath<String>,
    AxumQuery(params): AxumQuery<ListAdmissionsParams>,
    headers: HeaderMap,
) -> ApiResult<Vec<AdmissionRes>> {
    let ctx = org_context(&org, &headers)?;
    let status = params
        .status
        .as_deref()
        .map(admission_status)
        .transpose()?;

    let admissions = state
        .admissions
        .list(&ctx, status, params.limit, params.after.as_deref())
        .map_err(api_error)?;
    Ok(Json(
        admissions
            .into_iter()
            .map(|(id, admission)| AdmissionRes::from_admission(id, admission))
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/organizations/{org}/admissions/{admission_id}",
    responses(
        (status = 200, description = "Admission", body = AdmissionRes),
        (status = 404, description = "Admission not found", body = ErrorRes)
    )
)]
/// Read one admission.
#[axum::debug_handler]
async fn get_admission(
    State(state): State<AppState>,
    AxumPath((org, admission_id)): AxumPath<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<AdmissionRes> {
    let ctx = org_context(&org, &headers)?;
    let admission = state
        .admissions
        .get(&ctx, &admission_id)
        .map_err(api_error)?;
    Ok(Json(AdmissionRes::from_admission(admission_id, admission)))
}

#[utoipa::path(
    post,
    path = "/organizations/{org}/admissions/{admission_id}/discharge",
    responses(
        (status = 200, description = "Patient discharged", body = DischargeRes),
        (status = 404, description = "Admission not found", body = ErrorRes),
        (status = 409, description = "Already discharged or missing rate", body = ErrorRes)
    )
)]
/// Discharge a patient.
///
/// Atomically marks the admission discharged, frees the bed, and bills any
/// additional whole days of the stay.
#[axum::debug_handler]
async fn discharge(
    State(state): State<AppState>,
    AxumPath((org, admission_id)): AxumPath<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<DischargeRes> {
    let ctx = org_context(&org, &headers)?;
    let outcome = state
        .admissions
        .discharge(&ctx, &admission_id)
        .map_err(api_error)?;
    Ok(Json(DischargeRes {
        additional_days: outcome.additional_days,
        additional_charge: outcome.additional_charge,
        invoice_id: outcome.invoice_id,
    }))
}

#[utoipa::path(
    get,
    path = "/admissions/admitted",
    responses(
        (status = 200, description = "Currently admitted patients across all organizations", body = [AdmissionRes])
    )
)]
/// Admin view: every currently admitted patient in every organization.
#[axum::debug_handler]
async fn admitted_everywhere(State(state): State<AppState>) -> ApiResult<Vec<AdmissionRes>> {
    let admissions = state
        .admissions
        .admitted_across_organizations()
        .map_err(api_error)?;
    Ok(Json(
        admissions
            .into_iter()
            .map(|(id, admission)| AdmissionRes::from_admission(id, admission))
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/organizations/{org}/invoices/{invoice_id}",
    responses(
        (status = 200, description = "Invoice", body = InvoiceRes),
        (status = 404, description = "Invoice not found", body = ErrorRes)
    )
)]
/// Read one invoice.
#[axum::debug_handler]
async fn get_invoice(
    State(state): State<AppState>,
    AxumPath((org, invoice_id)): AxumPath<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<InvoiceRes> {
    let ctx = org_context(&org, &headers)?;
    let invoice = state.ledger.get(&ctx, &invoice_id).map_err(api_error)?;
    Ok(Json(InvoiceRes::from_invoice(invoice_id, invoice)))
}

#[utoipa::path(
    get,
    path = "/organizations/{org}/invoices/{invoice_id}/items",
    responses(
        (status = 200, description = "Line items in creation order", body = [InvoiceItemRes]),
        (status = 404, description = "Invoice not found", body = ErrorRes)
    )
)]
/// List an invoice's line items.
#[axum::debug_handler]
async fn list_invoice_items(
    State(state): State<AppState>,
    AxumPath((org, invoice_id)): AxumPath<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<Vec<InvoiceItemRes>> {
    let ctx = org_context(&org, &headers)?;
    let items = state.ledger.items(&ctx, &invoice_id).map_err(api_error)?;
    Ok(Json(
        items
            .into_iter()
            .map(|(id, item)| InvoiceItemRes::from_item(id, item))
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/organizations/{org}/invoices/{invoice_id}/items",
    request_body = AddItemReq,
    responses(
        (status = 200, description = "Item added", body = AddItemRes),
        (status = 404, description = "Invoice not found", body = ErrorRes),
        (status = 409, description = "Invoice is not editable", body = ErrorRes)
    )
)]
/// Add a line item to a draft invoice. The item and the invoice total
/// change together or not at all.
#[axum::debug_handler]
async fn add_invoice_item(
    State(state): State<AppState>,
    AxumPath((org, invoice_id)): AxumPath<(String, String)>,
    headers: HeaderMap,
    Json(req): Json<AddItemReq>,
) -> ApiResult<AddItemRes> {
    let ctx = org_context(&org, &headers)?;
    let item_id = state
        .ledger
        .add_item(
            &ctx,
            &invoice_id,
            NewItem {
                name: text("name", &req.name)?,
                quantity: req.quantity,
                unit_cost: money("unitCost", req.unit_cost)?,
            },
        )
        .map_err(api_error)?;
    Ok(Json(AddItemRes { item_id }))
}

#[utoipa::path(
    delete,
    path = "/organizations/{org}/invoices/{invoice_id}/items/{item_id}",
    responses(
        (status = 200, description = "Item removed"),
        (status = 404, description = "Invoice or item not found", body = ErrorRes),
        (status = 409, description = "Invoice is not editable", body = ErrorRes)
    )
)]
/// Remove a line item from a draft invoice.
#[axum::debug_handler]
async fn remove_invoice_item(
    State(state): State<AppState>,
    AxumPath((org, invoice_id, item_id)): AxumPath<(String, String, String)>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let ctx = org_context(&org, &headers)?;
    state
        .ledger
        .remove_item(&ctx, &invoice_id, &item_id)
        .map_err(api_error)?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/organizations/{org}/invoices/{invoice_id}/status",
    request_body = TransitionReq,
    responses(
        (status = 200, description = "Status changed"),
        (status = 404, description = "Invoice not found", body = ErrorRes),
        (status = 409, description = "Invalid status transition", body = ErrorRes)
    )
)]
/// Move an invoice through its lifecycle (draft→open, open→paid,
/// draft/open→void).
#[axum::debug_handler]
async fn transition_invoice(
    State(state): State<AppState>,
    AxumPath((org, invoice_id)): AxumPath<(String, String)>,
    headers: HeaderMap,
    Json(req): Json<TransitionReq>,
) -> Result<StatusCode, ApiError> {
    let ctx = org_context(&org, &headers)?;
    state
        .ledger
        .transition(&ctx, &invoice_id, invoice_status(&req.status)?)
        .map_err(api_error)?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/organizations/{org}/invoices/{invoice_id}/total-check",
    responses(
        (status = 200, description = "Whether the stored total matches the item sum", body = VerifyTotalRes),
        (status = 404, description = "Invoice not found", body = ErrorRes)
    )
)]
/// Audit endpoint: recompute the item sum and compare it with the stored
/// total.
#[axum::debug_handler]
async fn verify_invoice_total(
    State(state): State<AppState>,
    AxumPath((org, invoice_id)): AxumPath<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<VerifyTotalRes> {
    let ctx = org_context(&org, &headers)?;
    let consistent = state
        .ledger
        .verify_total(&ctx, &invoice_id)
        .map_err(api_error)?;
    Ok(Json(VerifyTotalRes { consistent }))
}

#[utoipa::path(
    get,
    path = "/organizations/{org}/patients/{patient_id}/invoices",
    responses(
        (status = 200, description = "The patient's invoices, newest first", body = [InvoiceRes])
    )
)]
/// List a patient's invoices within the organization.
#[axum::debug_handler]
async fn patient_invoices(
    State(state): State<AppState>,
    AxumPath((org, patient_id)): AxumPath<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<Vec<InvoiceRes>> {
    let ctx = org_context(&org, &headers)?;
    let invoices = state
        .ledger
        .list_for_patient(&ctx, &patient_id)
        .map_err(api_error)?;
    Ok(Json(
        invoices
            .into_iter()
            .map(|(id, invoice)| InvoiceRes::from_invoice(id, invoice))
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use wardbook_core::InboxSink;
    use wardbook_docstore::MemoryStore;

    fn test_app() -> Router {
        let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
        let dispatcher = Arc::new(Dispatcher::spawn(Arc::new(InboxSink::new(store.clone()))));
        app(AppState::new(
            Arc::new(CoreConfig::default()),
            store,
            dispatcher,
        ))
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let request = match body {
            Some(json) => Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = test_app();
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn admit_and_discharge_over_http() {
        let app = test_app();

        let (status, body) = send(
            &app,
            "POST",
            "/organizations/org-1/facilities",
            Some(serde_json::json!({
                "name": "Ward A",
                "type": "ward",
                "costPerDay": 1500.0,
                "bedIds": ["bed-1", "bed-2"],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let facility_id = body["facilityId"].as_str().unwrap().to_owned();

        let (status, body) = send(
            &app,
            "POST",
            "/organizations/org-1/admissions",
            Some(serde_json::json!({
                "patientId": "p1",
                "patientName": "Patient One",
                "facilityId": facility_id,
                "bedId": "bed-1",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let admission_id = body["admissionId"].as_str().unwrap().to_owned();
        let invoice_id = body["invoiceId"].as_str().unwrap().to_owned();

        let (status, body) = send(
            &app,
            "GET",
            &format!("/organizations/org-1/invoices/{invoice_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "draft");
        assert_eq!(body["totalAmount"], 1500.0);

        let (status, body) = send(
            &app,
            "POST",
            &format!("/organizations/org-1/admissions/{admission_id}/discharge"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["additionalDays"], 0);

        // The bed is free again.
        let (status, body) = send(
            &app,
            "GET",
            &format!("/organizations/org-1/facilities/{facility_id}/beds/available"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_admission_is_404() {
        let app = test_app();
        let (status, body) = send(
            &app,
            "GET",
            "/organizations/org-1/admissions/missing",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn occupied_bed_is_409() {
        let app = test_app();

        let (_, body) = send(
            &app,
            "POST",
            "/organizations/org-1/facilities",
            Some(serde_json::json!({
                "name": "Cabin",
                "type": "cabin",
                "costPerDay": 2000.0,
                "bedIds": ["only-bed"],
            })),
        )
        .await;
        let facility_id = body["facilityId"].as_str().unwrap().to_owned();

        let admit_body = serde_json::json!({
            "patientId": "p1",
            "patientName": "Patient One",
            "facilityId": facility_id,
            "bedId": "only-bed",
        });
        let (status, _) = send(
            &app,
            "POST",
            "/organizations/org-1/admissions",
            Some(admit_body.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let mut second = admit_body;
        second["patientId"] = "p2".into();
        let (status, body) = send(&app, "POST", "/organizations/org-1/admissions", Some(second)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("not available"));
    }

    #[tokio::test]
    async fn invalid_money_is_400() {
        let app = test_app();
        let (status, _) = send(
            &app,
            "POST",
            "/organizations/org-1/facilities",
            Some(serde_json::json!({
                "name": "Ward",
                "type": "ward",
                "costPerDay": -5.0,
                "bedIds": ["bed-1"],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invoice_status_transition_and_verify() {
        let app = test_app();

        let (_, body) = send(
            &app,
            "POST",
            "/organizations/org-1/facilities",
            Some(serde_json::json!({
                "name": "Ward A",
                "type": "ward",
                "costPerDay": 100.0,
                "bedIds": ["bed-1"],
            })),
        )
        .await;
        let facility_id = body["facilityId"].as_str().unwrap().to_owned();

        let (_, body) = send(
            &app,
            "POST",
            "/organizations/org-1/admissions",
            Some(serde_json::json!({
                "patientId": "p1",
                "patientName": "Patient One",
                "facilityId": facility_id,
                "bedId": "bed-1",
            })),
        )
        .await;
        let invoice_id = body["invoiceId"].as_str().unwrap().to_owned();

        let (status, body) = send(
            &app,
            "GET",
            &format!("/organizations/org-1/invoices/{invoice_id}/total-check"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["consistent"], true);

        let (status, _) = send(
            &app,
            "POST",
            &format!("/organizations/org-1/invoices/{invoice_id}/status"),
            Some(serde_json::json!({"status": "open"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // Items are frozen once the invoice leaves draft.
        let (status, _) = send(
            &app,
            "POST",
            &format!("/organizations/org-1/invoices/{invoice_id}/items"),
            Some(serde_json::json!({"name": "Late charge", "quantity": 1, "unitCost": 50.0})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        // paid → anything is rejected.
        let (status, _) = send(
            &app,
            "POST",
            &format!("/organizations/org-1/invoices/{invoice_id}/status"),
            Some(serde_json::json!({"status": "paid"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(
            &app,
            "POST",
            &format!("/organizations/org-1/invoices/{invoice_id}/status"),
            Some(serde_json::json!({"status": "void"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }
}
