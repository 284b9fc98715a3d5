use crate::adapter::driver::rest_api::ApiError;
use crate::application::Requester;
use crate::domain::model::UserId;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::Json;

/// 認証済みユーザーIDを運ぶヘッダー
pub const USER_ID_HEADER: &str = "x-user-id";
/// ロールを運ぶヘッダー（adminのみ意味を持つ）
pub const USER_ROLE_HEADER: &str = "x-user-role";

const ADMIN_ROLE: &str = "admin";

/// 前段の認証ゲートウェイが付与したヘッダーから呼び出し元を取り出す
#[async_trait]
impl<S> FromRequestParts<S> for Requester
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ApiError>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let unauthorized = |message: &str| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ApiError {
                    error: message.to_string(),
                    code: "UNAUTHORIZED".to_string(),
                }),
            )
        };

        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| unauthorized("ユーザーIDヘッダーがありません"))?
            .to_str()
            .map_err(|_| unauthorized("ユーザーIDヘッダーが不正です"))?;
        let user_id =
            UserId::from_string(raw).map_err(|_| unauthorized("ユーザーIDが空です"))?;

        let is_admin = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(|role| role.trim().eq_ignore_ascii_case(ADMIN_ROLE))
            .unwrap_or(false);

        Ok(if is_admin {
            Requester::admin(user_id)
        } else {
            Requester::user(user_id)
        })
    }
}
