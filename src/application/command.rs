// アプリケーション層への入力
// ドライバーから受け取った未検証の値と、認証済みの呼び出し元を表す

use crate::application::ApplicationError;
use crate::domain::model::{
    Booking, BookingDetails, BookingType, CustomerContact, ExperienceId, GuestComposition,
    SlotKey, UserId,
};
use std::collections::HashSet;

/// 1件の予約で受け付ける参加者数の上限
pub const MAX_GUESTS_PER_BOOKING: u32 = 100;

/// 呼び出し元の権限
/// 上流の認証ゲートウェイが確定した利用者IDと管理者フラグ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub user_id: UserId,
    pub is_admin: bool,
}

impl Requester {
    /// 一般利用者
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }

    /// 管理者
    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: true,
        }
    }

    /// 予約の所有者または管理者か
    pub fn can_access(&self, booking: &Booking) -> bool {
        self.is_admin || booking.user_id() == &self.user_id
    }
}

/// 予約受付リクエスト（未検証）
#[derive(Debug, Clone, PartialEq)]
pub struct AdmissionRequest {
    pub experience_id: i64,
    pub booking_type: String,
    pub date: String,
    pub time: String,
    pub adults: i64,
    pub kids: i64,
    pub group_size: Option<i64>,
    pub add_on_ids: Vec<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
}

/// 形式検証済みの予約受付リクエスト
/// 体験名はカタログから取得するため、予約内容への変換時に渡す
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedAdmission {
    pub slot: SlotKey,
    pub booking_type: BookingType,
    pub guests: GuestComposition,
    pub add_on_ids: Vec<String>,
    pub customer: CustomerContact,
}

impl ValidatedAdmission {
    pub fn into_details(self, experience_title: String) -> BookingDetails {
        BookingDetails {
            experience_id: self.slot.experience_id,
            experience_title,
            booking_type: self.booking_type,
            date: self.slot.date,
            time: self.slot.time,
            guests: self.guests,
            add_on_ids: self.add_on_ids,
            customer: self.customer,
        }
    }
}

impl AdmissionRequest {
    /// リクエストの形式を検証する
    /// 料金ルールに依存する検証（大人の人数、団体の人数帯）は料金計算で行う
    ///
    /// # Returns
    /// * `Ok(ValidatedAdmission)` - 検証済みリクエスト
    /// * `Err(ApplicationError::Validation)` - 形式不正
    pub fn validate(&self) -> Result<ValidatedAdmission, ApplicationError> {
        let booking_type = BookingType::from_string(&self.booking_type)?;
        let slot = SlotKey::parse(ExperienceId::new(self.experience_id), &self.date, &self.time)?;
        let guests = parse_guests(booking_type, self.adults, self.kids, self.group_size)?;
        let add_on_ids = unique_add_on_ids(&self.add_on_ids)?;
        let customer = CustomerContact::new(
            self.customer_name.clone(),
            self.customer_email.clone(),
            self.customer_phone.clone(),
        )?;

        Ok(ValidatedAdmission {
            slot,
            booking_type,
            guests,
            add_on_ids,
            customer,
        })
    }
}

/// 料金見積もりリクエスト（未検証）
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRequest {
    pub experience_id: i64,
    pub booking_type: String,
    pub adults: i64,
    pub kids: i64,
    pub group_size: Option<i64>,
    pub add_on_ids: Vec<String>,
}

impl QuoteRequest {
    pub fn validate(
        &self,
    ) -> Result<(ExperienceId, BookingType, GuestComposition, Vec<String>), ApplicationError> {
        let booking_type = BookingType::from_string(&self.booking_type)?;
        let guests = parse_guests(booking_type, self.adults, self.kids, self.group_size)?;
        let add_on_ids = unique_add_on_ids(&self.add_on_ids)?;
        Ok((
            ExperienceId::new(self.experience_id),
            booking_type,
            guests,
            add_on_ids,
        ))
    }
}

fn parse_count(field: &str, value: i64) -> Result<u32, ApplicationError> {
    u32::try_from(value).map_err(|_| {
        ApplicationError::Validation(format!("{} は0以上である必要があります: {}", field, value))
    })
}

fn parse_guests(
    booking_type: BookingType,
    adults: i64,
    kids: i64,
    group_size: Option<i64>,
) -> Result<GuestComposition, ApplicationError> {
    let adults = parse_count("adults", adults)?;
    let kids = parse_count("kids", kids)?;
    let group_size = group_size
        .map(|size| parse_count("group_size", size))
        .transpose()?;

    if booking_type == BookingType::Group && group_size.is_none() {
        return Err(ApplicationError::Validation(
            "団体予約には group_size が必要です".to_string(),
        ));
    }

    let party = u64::from(adults) + u64::from(kids);
    let largest = party.max(group_size.map_or(0, u64::from));
    if largest > u64::from(MAX_GUESTS_PER_BOOKING) {
        return Err(ApplicationError::Validation(format!(
            "参加者数は{}名以下である必要があります: {}",
            MAX_GUESTS_PER_BOOKING, largest
        )));
    }
    Ok(GuestComposition::new(adults, kids, group_size))
}

fn unique_add_on_ids(ids: &[String]) -> Result<Vec<String>, ApplicationError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id.as_str()) {
            return Err(ApplicationError::Validation(format!(
                "アドオンが重複しています: {}",
                id
            )));
        }
    }
    Ok(ids.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AdmissionRequest {
        AdmissionRequest {
            experience_id: 1,
            booking_type: "private".to_string(),
            date: "2025-02-15".to_string(),
            time: "09:00".to_string(),
            adults: 2,
            kids: 0,
            group_size: None,
            add_on_ids: vec!["addon-1".to_string()],
            customer_name: "Asha".to_string(),
            customer_email: "asha@example.com".to_string(),
            customer_phone: "+91 98765 43210".to_string(),
        }
    }

    #[test]
    fn test_valid_request() {
        let validated = request().validate().unwrap();
        assert_eq!(validated.booking_type, BookingType::Private);
        assert_eq!(validated.slot.to_string(), "experience 1 @ 2025-02-15 09:00");
        assert_eq!(validated.guests.adults(), 2);
    }

    #[test]
    fn test_malformed_date_and_time() {
        let mut req = request();
        req.date = "2025/02/15".to_string();
        assert!(matches!(req.validate(), Err(ApplicationError::Validation(_))));

        let mut req = request();
        req.time = "25:00".to_string();
        assert!(matches!(req.validate(), Err(ApplicationError::Validation(_))));
    }

    #[test]
    fn test_unknown_booking_type() {
        let mut req = request();
        req.booking_type = "vip".to_string();
        assert!(matches!(req.validate(), Err(ApplicationError::Validation(_))));
    }

    #[test]
    fn test_negative_counts() {
        let mut req = request();
        req.kids = -1;
        assert!(matches!(req.validate(), Err(ApplicationError::Validation(_))));
    }

    #[test]
    fn test_guest_count_upper_bound() {
        let mut req = request();
        req.adults = i64::from(u32::MAX);
        req.kids = 1;
        assert!(matches!(req.validate(), Err(ApplicationError::Validation(_))));

        let mut req = request();
        req.adults = 60;
        req.kids = 41;
        assert!(matches!(req.validate(), Err(ApplicationError::Validation(_))));

        let mut req = request();
        req.adults = 60;
        req.kids = 40;
        assert!(req.validate().is_ok());

        let quote = QuoteRequest {
            experience_id: 1,
            booking_type: "group".to_string(),
            adults: 0,
            kids: 0,
            group_size: Some(i64::from(MAX_GUESTS_PER_BOOKING) + 1),
            add_on_ids: Vec::new(),
        };
        assert!(matches!(quote.validate(), Err(ApplicationError::Validation(_))));
    }

    #[test]
    fn test_group_requires_size() {
        let mut req = request();
        req.booking_type = "group".to_string();
        assert!(matches!(req.validate(), Err(ApplicationError::Validation(_))));

        req.group_size = Some(12);
        let validated = req.validate().unwrap();
        assert_eq!(validated.guests.group_size(), Some(12));
    }

    #[test]
    fn test_duplicate_add_ons() {
        let mut req = request();
        req.add_on_ids = vec!["addon-1".to_string(), "addon-1".to_string()];
        assert!(matches!(req.validate(), Err(ApplicationError::Validation(_))));
    }

    #[test]
    fn test_missing_contact() {
        let mut req = request();
        req.customer_phone = " ".to_string();
        assert!(matches!(req.validate(), Err(ApplicationError::Validation(_))));
    }

    #[test]
    fn test_into_details_keeps_slot() {
        let details = request()
            .validate()
            .unwrap()
            .into_details("Amaravati Heritage Walk".to_string());
        assert_eq!(details.slot_key().to_string(), "experience 1 @ 2025-02-15 09:00");
        assert_eq!(details.experience_title, "Amaravati Heritage Walk");
    }
}
