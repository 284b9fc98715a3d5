use crate::domain::error::DomainError;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

/// 日付の書式（例: 2025-02-15）
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// 時刻の書式（例: 09:00）
pub const TIME_FORMAT: &str = "%H:%M";

/// 予約の一意識別子
/// クライアントにとっては不透明なトークン（BD + 大文字16進8桁）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(String);

impl BookingId {
    /// 新しい一意のBookingIdを生成
    pub fn generate() -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        Self(format!("BD{}", simple[..8].to_uppercase()))
    }

    /// 文字列からBookingIdを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidValue(
                "予約IDは空にできません".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// 内部の文字列を取得
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 体験（ツアー）の識別子
/// カタログ側で採番される整数ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExperienceId(i64);

impl ExperienceId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ExperienceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 利用者の識別子
/// 認証済みコンテキストから渡される値をそのまま保持する
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// 文字列からUserIdを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidValue(
                "ユーザーIDは空にできません".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 容量予約の識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReservationId(Uuid);

impl ReservationId {
    /// 新しい一意のReservationIdを生成
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// 文字列からReservationIdを作成
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        let uuid = Uuid::parse_str(s)?;
        Ok(Self(uuid))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for ReservationId {
    fn default() -> Self {
        Self::new()
    }
}

/// 金額を表す値オブジェクト
/// 通貨単位の整数（小数なし）で保持し、丸めは発生しない
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub fn new(amount: i64) -> Self {
        Self(amount)
    }

    pub fn zero() -> Self {
        Self(0)
    }

    /// 金額を取得
    pub fn amount(&self) -> i64 {
        self.0
    }

    /// 金額を加算
    /// 桁あふれする場合はNoneを返す
    pub fn checked_add(&self, other: &Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// 金額を乗算
    /// 桁あふれする場合はNoneを返す
    pub fn checked_multiply(&self, factor: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(factor)).map(Money)
    }
}

/// 予約タイプ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingType {
    /// 貸切
    Private,
    /// 相乗り
    Shared,
    /// 団体
    Group,
}

impl BookingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingType::Private => "private",
            BookingType::Shared => "shared",
            BookingType::Group => "group",
        }
    }

    /// 文字列からBookingTypeを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "private" => Ok(BookingType::Private),
            "shared" => Ok(BookingType::Shared),
            "group" => Ok(BookingType::Group),
            _ => Err(DomainError::InvalidValue(format!(
                "無効な予約タイプ: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for BookingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 予約のステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// 確定（初期状態、容量1単位を消費中）
    Confirmed,
    /// キャンセル済み（終端、容量は解放済み）
    Cancelled,
    /// 催行済み（終端、容量は消費されたまま）
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    /// 文字列からBookingStatusを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "completed" => Ok(BookingStatus::Completed),
            _ => Err(DomainError::InvalidValue(format!(
                "無効な予約ステータス: {}",
                s
            ))),
        }
    }

    /// 終端状態かどうか
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BookingStatus::Confirmed)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 参加者構成
/// 団体予約ではgroup_sizeが人数を表し、adults/kidsは料金計算に使わない
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestComposition {
    adults: u32,
    kids: u32,
    group_size: Option<u32>,
}

impl GuestComposition {
    pub fn new(adults: u32, kids: u32, group_size: Option<u32>) -> Self {
        Self {
            adults,
            kids,
            group_size,
        }
    }

    pub fn adults(&self) -> u32 {
        self.adults
    }

    pub fn kids(&self) -> u32 {
        self.kids
    }

    pub fn group_size(&self) -> Option<u32> {
        self.group_size
    }

    /// 予約タイプごとの総人数
    /// 大人と子供の合計がu32に収まらない場合はNoneを返す
    pub fn headcount(&self, booking_type: BookingType) -> Option<u32> {
        match booking_type {
            BookingType::Group => Some(self.group_size.unwrap_or(0)),
            BookingType::Private | BookingType::Shared => self.adults.checked_add(self.kids),
        }
    }

    /// 予約タイプごとの大人の人数
    /// 団体は全員を大人として数える
    pub fn adult_count(&self, booking_type: BookingType) -> u32 {
        match booking_type {
            BookingType::Group => self.group_size.unwrap_or(0),
            BookingType::Private | BookingType::Shared => self.adults,
        }
    }
}

/// 時間枠のキー（体験・日付・時刻）
/// 容量カウンタの直列化単位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    pub experience_id: ExperienceId,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl SlotKey {
    pub fn new(experience_id: ExperienceId, date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            experience_id,
            date,
            time,
        }
    }

    /// 文字列の日付・時刻からSlotKeyを作成
    pub fn parse(experience_id: ExperienceId, date: &str, time: &str) -> Result<Self, DomainError> {
        Ok(Self::new(experience_id, parse_date(date)?, parse_time(time)?))
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "experience {} @ {} {}",
            self.experience_id,
            self.date.format(DATE_FORMAT),
            self.time.format(TIME_FORMAT)
        )
    }
}

/// YYYY-MM-DD形式の日付を解析
pub fn parse_date(s: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| DomainError::InvalidValue(format!("無効な日付: {}", s)))
}

/// HH:MM形式の時刻を解析
pub fn parse_time(s: &str) -> Result<NaiveTime, DomainError> {
    NaiveTime::parse_from_str(s.trim(), TIME_FORMAT)
        .map_err(|_| DomainError::InvalidValue(format!("無効な時刻: {}", s)))
}

/// 予約者の連絡先を表す値オブジェクト
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerContact {
    name: String,
    email: String,
    phone: String,
}

impl CustomerContact {
    /// 新しい連絡先を作成
    /// バリデーション:
    /// - 氏名、電話番号は空でない必要がある
    /// - メールアドレスは@を含む必要がある
    pub fn new(name: String, email: String, phone: String) -> Result<Self, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::InvalidValue(
                "氏名は空にできません".to_string(),
            ));
        }
        if !Self::is_valid_email(&email) {
            return Err(DomainError::InvalidValue(format!(
                "無効なメールアドレス: {}",
                email
            )));
        }
        if phone.trim().is_empty() {
            return Err(DomainError::InvalidValue(
                "電話番号は空にできません".to_string(),
            ));
        }
        Ok(Self { name, email, phone })
    }

    fn is_valid_email(email: &str) -> bool {
        match email.trim().split_once('@') {
            Some((local, domain)) => !local.is_empty() && domain.contains('.'),
            None => false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }
}

/// アドオンごとの料金明細
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOnCharge {
    pub add_on_id: String,
    pub name: String,
    pub amount: Money,
}

/// 料金見積もり
/// 基本料金とアドオン明細の合計
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    base: Money,
    add_ons: Vec<AddOnCharge>,
    total: Money,
}

impl PriceQuote {
    /// 基本料金とアドオン明細から見積もりを作成
    /// 合計は常に明細から計算する
    ///
    /// # Returns
    /// 合計が桁あふれする場合は `DomainError::InvalidValue`
    pub fn new(base: Money, add_ons: Vec<AddOnCharge>) -> Result<Self, DomainError> {
        let total = add_ons
            .iter()
            .try_fold(base, |acc, charge| acc.checked_add(&charge.amount))
            .ok_or_else(|| {
                DomainError::InvalidValue(format!(
                    "料金の合計が上限を超えています: base={}",
                    base.amount()
                ))
            })?;
        Ok(Self {
            base,
            add_ons,
            total,
        })
    }

    pub fn base(&self) -> Money {
        self.base
    }

    pub fn add_ons(&self) -> &[AddOnCharge] {
        &self.add_ons
    }

    /// アドオン合計
    pub fn add_ons_total(&self) -> Money {
        Money(self.total.0 - self.base.0)
    }

    pub fn total(&self) -> Money {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_id_format() {
        let id = BookingId::generate();
        assert_eq!(id.as_str().len(), 10);
        assert!(id.as_str().starts_with("BD"));
        assert!(id.as_str()[2..]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_booking_id_uniqueness() {
        assert_ne!(BookingId::generate(), BookingId::generate());
    }

    #[test]
    fn test_empty_booking_id_rejected() {
        assert!(BookingId::from_string("  ").is_err());
    }

    #[test]
    fn test_money_arithmetic() {
        let money = Money::new(2200);
        assert_eq!(money.checked_multiply(3).unwrap().amount(), 6600);
        assert_eq!(money.checked_add(&Money::new(1400)).unwrap().amount(), 3600);
        assert_eq!(money.checked_multiply(0), Some(Money::zero()));
    }

    #[test]
    fn test_money_overflow_is_reported() {
        assert_eq!(Money::new(i64::MAX).checked_add(&Money::new(1)), None);
        assert_eq!(Money::new(2200).checked_multiply(u32::MAX).unwrap().amount(), 2200 * i64::from(u32::MAX));
        assert_eq!(Money::new(i64::MAX / 2).checked_multiply(3), None);
    }

    #[test]
    fn test_booking_type_from_string() {
        assert_eq!(BookingType::from_string("private").unwrap(), BookingType::Private);
        assert_eq!(BookingType::from_string("shared").unwrap(), BookingType::Shared);
        assert_eq!(BookingType::from_string("group").unwrap(), BookingType::Group);
        assert!(BookingType::from_string("Private").is_err());
        assert!(BookingType::from_string("").is_err());
    }

    #[test]
    fn test_booking_status_terminal() {
        assert!(!BookingStatus::Confirmed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(BookingStatus::Completed.is_terminal());
    }

    #[test]
    fn test_headcount_by_booking_type() {
        let guests = GuestComposition::new(2, 1, Some(12));
        assert_eq!(guests.headcount(BookingType::Private), Some(3));
        assert_eq!(guests.headcount(BookingType::Shared), Some(3));
        assert_eq!(guests.headcount(BookingType::Group), Some(12));
        assert_eq!(guests.adult_count(BookingType::Shared), 2);
        assert_eq!(guests.adult_count(BookingType::Group), 12);
    }

    #[test]
    fn test_headcount_overflow_is_none() {
        let guests = GuestComposition::new(u32::MAX, 1, None);
        assert_eq!(guests.headcount(BookingType::Shared), None);
        assert_eq!(guests.headcount(BookingType::Private), None);
    }

    #[test]
    fn test_slot_key_parse() {
        let key = SlotKey::parse(ExperienceId::new(1), "2025-02-15", "09:00").unwrap();
        assert_eq!(key.to_string(), "experience 1 @ 2025-02-15 09:00");
        assert!(SlotKey::parse(ExperienceId::new(1), "15/02/2025", "09:00").is_err());
        assert!(SlotKey::parse(ExperienceId::new(1), "2025-02-15", "9am").is_err());
    }

    #[test]
    fn test_customer_contact_validation() {
        let ok = CustomerContact::new(
            "Asha".to_string(),
            "asha@example.com".to_string(),
            "+91 98765 43210".to_string(),
        );
        assert!(ok.is_ok());

        let bad_email = CustomerContact::new(
            "Asha".to_string(),
            "asha.example.com".to_string(),
            "+91 98765 43210".to_string(),
        );
        assert!(bad_email.is_err());

        let empty_name = CustomerContact::new(
            "".to_string(),
            "asha@example.com".to_string(),
            "+91 98765 43210".to_string(),
        );
        assert!(empty_name.is_err());
    }

    #[test]
    fn test_price_quote_total() {
        let quote = PriceQuote::new(
            Money::new(5800),
            vec![AddOnCharge {
                add_on_id: "addon-5".to_string(),
                name: "Photography / Reels".to_string(),
                amount: Money::new(1500),
            }],
        )
        .unwrap();
        assert_eq!(quote.total().amount(), 7300);
        assert_eq!(quote.add_ons_total().amount(), 1500);
    }

    #[test]
    fn test_price_quote_total_overflow_rejected() {
        let quote = PriceQuote::new(
            Money::new(i64::MAX),
            vec![AddOnCharge {
                add_on_id: "addon-1".to_string(),
                name: "Traditional Lunch".to_string(),
                amount: Money::new(1),
            }],
        );
        assert!(matches!(quote, Err(DomainError::InvalidValue(_))));
    }
}
