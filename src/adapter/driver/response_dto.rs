use crate::domain::model::{
    AddOnCharge, Booking, PriceQuote, SlotSnapshot, DATE_FORMAT, TIME_FORMAT,
};
use serde::{Deserialize, Serialize};

/// アドオン明細用のレスポンスDTO
#[derive(Debug, Serialize, Deserialize)]
pub struct AddOnChargeResponse {
    pub add_on_id: String,
    pub name: String,
    pub amount: i64,
}

/// 料金見積もり用のレスポンスDTO
#[derive(Debug, Serialize, Deserialize)]
pub struct PriceQuoteResponse {
    pub base_price: i64,
    pub add_ons: Vec<AddOnChargeResponse>,
    pub add_ons_total: i64,
    pub total_price: i64,
}

/// 予約用のレスポンスDTO
#[derive(Debug, Serialize, Deserialize)]
pub struct BookingResponse {
    pub id: String,
    pub user_id: String,
    pub experience_id: i64,
    pub experience_title: String,
    pub booking_type: String,
    pub date: String,
    pub time: String,
    pub adults: u32,
    pub kids: u32,
    pub group_size: Option<u32>,
    pub add_ons: Vec<String>,
    pub price: PriceQuoteResponse,
    pub total_price: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

/// 時間枠の空き状況用のレスポンスDTO
#[derive(Debug, Serialize, Deserialize)]
pub struct SlotResponse {
    pub experience_id: i64,
    pub date: String,
    pub time: String,
    pub booking_type: String,
    pub max_capacity: u32,
    pub current_bookings: u32,
    pub available: bool,
}

/// 空き状況のレスポンスDTO
/// 時刻指定時は単一の時間枠、省略時はその日の一覧
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AvailabilityResponse {
    Slot(SlotResponse),
    Slots(Vec<SlotResponse>),
}

/// 空き枠登録結果のレスポンスDTO
#[derive(Debug, Serialize, Deserialize)]
pub struct SeedAvailabilityResponse {
    pub experience_id: i64,
    pub start_date: String,
    pub days: u32,
    pub slots_created: u32,
}

impl AddOnChargeResponse {
    pub fn from_charge(charge: &AddOnCharge) -> Self {
        Self {
            add_on_id: charge.add_on_id.clone(),
            name: charge.name.clone(),
            amount: charge.amount.amount(),
        }
    }
}

impl PriceQuoteResponse {
    /// ドメインオブジェクトからPriceQuoteResponseを作成
    pub fn from_quote(quote: &PriceQuote) -> Self {
        Self {
            base_price: quote.base().amount(),
            add_ons: quote
                .add_ons()
                .iter()
                .map(AddOnChargeResponse::from_charge)
                .collect(),
            add_ons_total: quote.add_ons_total().amount(),
            total_price: quote.total().amount(),
        }
    }
}

impl BookingResponse {
    /// ドメインオブジェクトからBookingResponseを作成
    pub fn from_booking(booking: &Booking) -> Self {
        let details = booking.details();
        Self {
            id: booking.id().to_string(),
            user_id: booking.user_id().to_string(),
            experience_id: details.experience_id.value(),
            experience_title: details.experience_title.clone(),
            booking_type: details.booking_type.to_string(),
            date: details.date.format(DATE_FORMAT).to_string(),
            time: details.time.format(TIME_FORMAT).to_string(),
            adults: details.guests.adults(),
            kids: details.guests.kids(),
            group_size: details.guests.group_size(),
            add_ons: details.add_on_ids.clone(),
            price: PriceQuoteResponse::from_quote(booking.price()),
            total_price: booking.price().total().amount(),
            customer_name: details.customer.name().to_string(),
            customer_email: details.customer.email().to_string(),
            customer_phone: details.customer.phone().to_string(),
            status: booking.status().to_string(),
            created_at: booking.created_at().to_rfc3339(),
            updated_at: booking.updated_at().to_rfc3339(),
        }
    }
}

impl SlotResponse {
    /// ドメインオブジェクトからSlotResponseを作成
    pub fn from_snapshot(snapshot: &SlotSnapshot) -> Self {
        Self {
            experience_id: snapshot.key.experience_id.value(),
            date: snapshot.key.date.format(DATE_FORMAT).to_string(),
            time: snapshot.key.time.format(TIME_FORMAT).to_string(),
            booking_type: snapshot.booking_type.to_string(),
            max_capacity: snapshot.max_capacity,
            current_bookings: snapshot.current_bookings,
            available: snapshot.available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{
        BookingDetails, BookingId, BookingType, CustomerContact, ExperienceId, GuestComposition,
        Money, ReservationToken, SlotKey, TimeSlot, UserId,
    };
    use chrono::{NaiveDate, NaiveTime};

    #[test]
    fn test_booking_response_from_booking() {
        let details = BookingDetails {
            experience_id: ExperienceId::new(1),
            experience_title: "Amaravati Heritage Walk".to_string(),
            booking_type: BookingType::Private,
            date: NaiveDate::from_ymd_opt(2025, 2, 15).unwrap(),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            guests: GuestComposition::new(2, 0, None),
            add_on_ids: vec!["addon-5".to_string()],
            customer: CustomerContact::new(
                "Asha".to_string(),
                "asha@example.com".to_string(),
                "9876543210".to_string(),
            )
            .unwrap(),
        };
        let token = ReservationToken::new(details.slot_key(), 1);
        let price = PriceQuote::new(
            Money::new(5800),
            vec![AddOnCharge {
                add_on_id: "addon-5".to_string(),
                name: "Photography / Reels".to_string(),
                amount: Money::new(1500),
            }],
        )
        .unwrap();
        let booking = Booking::confirm(
            BookingId::generate(),
            UserId::from_string("user-1").unwrap(),
            details,
            price,
            token,
        );

        let response = BookingResponse::from_booking(&booking);

        assert_eq!(response.booking_type, "private");
        assert_eq!(response.date, "2025-02-15");
        assert_eq!(response.time, "09:00");
        assert_eq!(response.status, "confirmed");
        assert_eq!(response.total_price, 7300);
        assert_eq!(response.price.base_price, 5800);
        assert_eq!(response.price.add_ons_total, 1500);
        assert!(response.id.starts_with("BD"));
    }

    #[test]
    fn test_slot_response_from_snapshot() {
        let key = SlotKey::parse(ExperienceId::new(1), "2025-02-15", "10:00").unwrap();
        let mut slot = TimeSlot::new(key.time, BookingType::Shared, 5);
        slot.reserve(5).unwrap();

        let response = SlotResponse::from_snapshot(&SlotSnapshot::from_slot(key, &slot));

        assert_eq!(response.time, "10:00");
        assert_eq!(response.booking_type, "shared");
        assert_eq!(response.current_bookings, 5);
        assert!(!response.available);
    }
}
