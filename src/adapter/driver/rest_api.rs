use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::adapter::driver::request_dto::{
    AvailabilityQueryParams, BookingsQueryParams, CreateBookingRequest, PriceQuoteRequest,
    SeedAvailabilityRequest,
};
use crate::adapter::driver::response_dto::{
    AvailabilityResponse, BookingResponse, PriceQuoteResponse, SeedAvailabilityResponse,
    SlotResponse,
};
use crate::application::service::{
    AvailabilityApplicationService, BookingAdmissionService, BookingQueryService,
};
use crate::application::{ApplicationError, Requester};
use crate::domain::error::PricingError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

// アプリケーションサービスを含む状態
#[derive(Clone)]
pub struct AppState {
    pub admission_service: Arc<BookingAdmissionService>,
    pub availability_service: Arc<AvailabilityApplicationService>,
    pub query_service: Arc<BookingQueryService>,
    /// 登録日数の省略時の値
    pub seed_days: u32,
}

// REST APIルーターを作成
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/bookings", post(create_booking).get(list_own_bookings))
        .route("/bookings/:booking_id", get(get_booking).delete(cancel_booking))
        .route("/bookings/:booking_id/cancel", post(cancel_booking))
        .route(
            "/experiences/:experience_id/availability",
            get(get_availability),
        )
        .route("/pricing/quote", post(quote_price))
        // 管理者用エンドポイント
        .route("/admin/bookings", get(list_all_bookings))
        .route("/admin/bookings/:booking_id/complete", post(complete_booking))
        .route(
            "/admin/experiences/:experience_id/availability",
            post(seed_availability),
        )
}

// ヘルスチェックエンドポイント
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "experience-booking",
        "version": "0.1.0"
    }))
}

fn bad_request(message: String, code: &str) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError {
            error: message,
            code: code.to_string(),
        }),
    )
}

fn invalid_body(rejection: JsonRejection) -> (StatusCode, Json<ApiError>) {
    bad_request(
        format!("無効なリクエストボディです: {}", rejection.body_text()),
        "INVALID_BODY",
    )
}

fn invalid_query(_: QueryRejection) -> (StatusCode, Json<ApiError>) {
    bad_request(
        "無効なクエリパラメータです".to_string(),
        "INVALID_PARAMETER",
    )
}

// 予約作成エンドポイント
async fn create_booking(
    State(state): State<AppState>,
    requester: Requester,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<BookingResponse>)> {
    let Json(request) = payload.map_err(invalid_body)?;

    match state
        .admission_service
        .admit(request.into_command(), &requester)
        .await
    {
        Ok(booking) => Ok((
            StatusCode::CREATED,
            Json(BookingResponse::from_booking(&booking)),
        )),
        Err(err) => Err(map_application_error(err)),
    }
}

// 自分の予約一覧取得エンドポイント
async fn list_own_bookings(
    State(state): State<AppState>,
    requester: Requester,
) -> ApiResult<Json<Vec<BookingResponse>>> {
    let bookings = state
        .query_service
        .list_own_bookings(&requester)
        .await
        .map_err(map_application_error)?;

    Ok(Json(
        bookings.iter().map(BookingResponse::from_booking).collect(),
    ))
}

// 予約詳細取得エンドポイント
async fn get_booking(
    State(state): State<AppState>,
    requester: Requester,
    Path(booking_id): Path<String>,
) -> ApiResult<Json<BookingResponse>> {
    match state.query_service.get_booking(&booking_id, &requester).await {
        Ok(booking) => Ok(Json(BookingResponse::from_booking(&booking))),
        Err(err) => Err(map_application_error(err)),
    }
}

// 予約キャンセルエンドポイント（POST /cancel と DELETE の両方）
async fn cancel_booking(
    State(state): State<AppState>,
    requester: Requester,
    Path(booking_id): Path<String>,
) -> ApiResult<Json<BookingResponse>> {
    match state.admission_service.cancel(&booking_id, &requester).await {
        Ok(booking) => Ok(Json(BookingResponse::from_booking(&booking))),
        Err(err) => Err(map_application_error(err)),
    }
}

// 空き状況取得エンドポイント
async fn get_availability(
    State(state): State<AppState>,
    Path(experience_id): Path<i64>,
    query: Result<Query<AvailabilityQueryParams>, QueryRejection>,
) -> ApiResult<Json<AvailabilityResponse>> {
    let Query(params) = query.map_err(invalid_query)?;

    let response = match params.time {
        Some(time) => {
            let snapshot = state
                .availability_service
                .peek_availability(experience_id, &params.date, &time)
                .await
                .map_err(map_application_error)?;
            AvailabilityResponse::Slot(SlotResponse::from_snapshot(&snapshot))
        }
        None => {
            let snapshots = state
                .availability_service
                .list_availability(experience_id, &params.date)
                .await
                .map_err(map_application_error)?;
            AvailabilityResponse::Slots(snapshots.iter().map(SlotResponse::from_snapshot).collect())
        }
    };

    Ok(Json(response))
}

// 料金見積もりエンドポイント
async fn quote_price(
    State(state): State<AppState>,
    payload: Result<Json<PriceQuoteRequest>, JsonRejection>,
) -> ApiResult<Json<PriceQuoteResponse>> {
    let Json(request) = payload.map_err(invalid_body)?;

    match state.admission_service.quote(request.into_command()).await {
        Ok(quote) => Ok(Json(PriceQuoteResponse::from_quote(&quote))),
        Err(err) => Err(map_application_error(err)),
    }
}

// 全予約一覧取得エンドポイント（管理者）
async fn list_all_bookings(
    State(state): State<AppState>,
    requester: Requester,
    query: Result<Query<BookingsQueryParams>, QueryRejection>,
) -> ApiResult<Json<Vec<BookingResponse>>> {
    let Query(params) = query.map_err(invalid_query)?;

    let bookings = state
        .query_service
        .list_all_bookings(&requester, params.status.as_deref(), params.experience_id)
        .await
        .map_err(map_application_error)?;

    Ok(Json(
        bookings.iter().map(BookingResponse::from_booking).collect(),
    ))
}

// 催行完了エンドポイント（管理者）
async fn complete_booking(
    State(state): State<AppState>,
    requester: Requester,
    Path(booking_id): Path<String>,
) -> ApiResult<Json<BookingResponse>> {
    match state.admission_service.complete(&booking_id, &requester).await {
        Ok(booking) => Ok(Json(BookingResponse::from_booking(&booking))),
        Err(err) => Err(map_application_error(err)),
    }
}

// 標準スケジュール登録エンドポイント（管理者）
async fn seed_availability(
    State(state): State<AppState>,
    requester: Requester,
    Path(experience_id): Path<i64>,
    payload: Result<Json<SeedAvailabilityRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SeedAvailabilityResponse>)> {
    let Json(request) = payload.map_err(invalid_body)?;
    let days = request.days.unwrap_or(state.seed_days);

    let slots_created = state
        .availability_service
        .seed_default_schedule(&requester, experience_id, &request.start_date, days)
        .await
        .map_err(map_application_error)?;

    Ok((
        StatusCode::CREATED,
        Json(SeedAvailabilityResponse {
            experience_id,
            start_date: request.start_date,
            days,
            slots_created,
        }),
    ))
}

// アプリケーションエラーをHTTPエラーにマッピング
fn map_application_error(err: ApplicationError) -> (StatusCode, Json<ApiError>) {
    let message = err.to_string();
    let (status, code) = match err {
        ApplicationError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        ApplicationError::Pricing(pricing_err) => map_pricing_error(&pricing_err),
        ApplicationError::SlotFull(_) => (StatusCode::CONFLICT, "SLOT_FULL"),
        ApplicationError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        ApplicationError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        ApplicationError::InvalidTransition { .. } => {
            (StatusCode::CONFLICT, "INVALID_TRANSITION")
        }
        ApplicationError::StoreUnavailable(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE")
        }
        ApplicationError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        ApplicationError::Repository(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "REPOSITORY_ERROR")
        }
    };

    (
        status,
        Json(ApiError {
            error: message,
            code: code.to_string(),
        }),
    )
}

// 料金計算エラーを適切なHTTPステータスコードとエラーコードにマッピング
fn map_pricing_error(err: &PricingError) -> (StatusCode, &'static str) {
    match err {
        PricingError::BookingTypeUnsupported(_) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "BOOKING_TYPE_UNSUPPORTED")
        }
        PricingError::InvalidGuestComposition(_) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_GUEST_COMPOSITION")
        }
        PricingError::UnknownAddOn(_) => (StatusCode::UNPROCESSABLE_ENTITY, "UNKNOWN_ADD_ON"),
    }
}
