use crate::application::{AdmissionRequest, QuoteRequest};
use serde::{Deserialize, Serialize};

/// 参加人数
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuestsDto {
    #[serde(default)]
    pub adults: i64,
    #[serde(default)]
    pub kids: i64,
}

/// 予約作成用のリクエストDTO
/// 合計金額はサーバー側で計算するため受け取らない
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub experience_id: i64,
    pub booking_type: String,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub guests: GuestsDto,
    pub group_size: Option<i64>,
    #[serde(default)]
    pub add_ons: Vec<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
}

impl CreateBookingRequest {
    pub fn into_command(self) -> AdmissionRequest {
        AdmissionRequest {
            experience_id: self.experience_id,
            booking_type: self.booking_type,
            date: self.date,
            time: self.time,
            adults: self.guests.adults,
            kids: self.guests.kids,
            group_size: self.group_size,
            add_on_ids: self.add_ons,
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            customer_phone: self.customer_phone,
        }
    }
}

/// 料金見積もり用のリクエストDTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceQuoteRequest {
    pub experience_id: i64,
    pub booking_type: String,
    #[serde(default)]
    pub guests: GuestsDto,
    pub group_size: Option<i64>,
    #[serde(default)]
    pub add_ons: Vec<String>,
}

impl PriceQuoteRequest {
    pub fn into_command(self) -> QuoteRequest {
        QuoteRequest {
            experience_id: self.experience_id,
            booking_type: self.booking_type,
            adults: self.guests.adults,
            kids: self.guests.kids,
            group_size: self.group_size,
            add_on_ids: self.add_ons,
        }
    }
}

/// 空き枠登録用のリクエストDTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedAvailabilityRequest {
    pub start_date: String,
    /// 省略時は設定値
    pub days: Option<u32>,
}

/// 予約一覧取得用のクエリパラメータ（管理者）
#[derive(Debug, Deserialize)]
pub struct BookingsQueryParams {
    pub status: Option<String>,
    pub experience_id: Option<i64>,
}

/// 空き状況取得用のクエリパラメータ
/// timeを省略するとその日のすべての時間枠を返す
#[derive(Debug, Deserialize)]
pub struct AvailabilityQueryParams {
    pub date: String,
    pub time: Option<String>,
}
