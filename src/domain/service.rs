// ドメインサービス
// 料金計算（外部状態を持たない純粋な計算）

use crate::domain::error::PricingError;
use crate::domain::model::{
    AddOn, AddOnCalculationType, AddOnCharge, BookingType, Experience, GuestComposition, Money,
    PriceQuote,
};

/// 料金計算サービス
/// 同じ入力には常に同じ見積もりを返す
pub struct PricingCalculator;

impl PricingCalculator {
    /// 予約の合計金額を計算する
    ///
    /// # Arguments
    /// * `experience` - 対象の体験
    /// * `booking_type` - 予約タイプ
    /// * `guests` - 参加者構成
    /// * `add_on_ids` - 選択されたアドオンID
    ///
    /// # Returns
    /// * `Ok(PriceQuote)` - 見積もり
    /// * `Err(PricingError)` - 予約タイプ非対応、人数構成不正、不明なアドオン
    pub fn compute_total(
        experience: &Experience,
        booking_type: BookingType,
        guests: &GuestComposition,
        add_on_ids: &[String],
    ) -> Result<PriceQuote, PricingError> {
        if !experience.accepts(booking_type) {
            return Err(PricingError::BookingTypeUnsupported(booking_type));
        }

        let base = Self::base_price(experience, booking_type, guests)?;

        let charges = add_on_ids
            .iter()
            .map(|id| {
                let add_on = experience
                    .find_active_add_on(id)
                    .ok_or_else(|| PricingError::UnknownAddOn(id.clone()))?;
                Self::add_on_charge(add_on, booking_type, guests)
            })
            .collect::<Result<Vec<_>, _>>()?;

        PriceQuote::new(base, charges).map_err(|_| Self::overflow())
    }

    /// 予約タイプごとの基本料金
    fn base_price(
        experience: &Experience,
        booking_type: BookingType,
        guests: &GuestComposition,
    ) -> Result<Money, PricingError> {
        let pricing = &experience.pricing;
        match booking_type {
            BookingType::Private => {
                let rule = &pricing.private;
                let additional_adults = guests.adults().checked_sub(1).ok_or_else(|| {
                    PricingError::InvalidGuestComposition(
                        "大人は1名以上必要です".to_string(),
                    )
                })?;
                let adults = rule
                    .additional_adult
                    .checked_multiply(additional_adults)
                    .and_then(|extra| rule.first_adult.checked_add(&extra));
                let kids = rule.child.checked_multiply(guests.kids());
                Self::sum(adults, kids)
            }
            BookingType::Shared => {
                let rule = &pricing.shared;
                if guests.adults() < 1 {
                    return Err(PricingError::InvalidGuestComposition(
                        "大人は1名以上必要です".to_string(),
                    ));
                }
                Self::sum(
                    rule.adult.checked_multiply(guests.adults()),
                    rule.child.checked_multiply(guests.kids()),
                )
            }
            BookingType::Group => {
                let group_size = guests.group_size().ok_or_else(|| {
                    PricingError::InvalidGuestComposition(
                        "団体予約には人数が必要です".to_string(),
                    )
                })?;
                let tier = pricing.group.tier_for(group_size).ok_or_else(|| {
                    PricingError::InvalidGuestComposition(format!(
                        "団体人数 {} に該当する料金帯がありません",
                        group_size
                    ))
                })?;
                tier.price_per_person
                    .checked_multiply(group_size)
                    .ok_or_else(Self::overflow)
            }
        }
    }

    /// アドオン1件の料金
    fn add_on_charge(
        add_on: &AddOn,
        booking_type: BookingType,
        guests: &GuestComposition,
    ) -> Result<AddOnCharge, PricingError> {
        let headcount = guests.headcount(booking_type).ok_or_else(Self::overflow)?;
        let amount = match add_on.calculation_type {
            AddOnCalculationType::PerPerson => add_on.price.checked_multiply(headcount),
            AddOnCalculationType::PerAdult => {
                add_on.price.checked_multiply(guests.adult_count(booking_type))
            }
            AddOnCalculationType::PerThreeGuests => {
                add_on.price.checked_multiply(headcount.div_ceil(3))
            }
            AddOnCalculationType::Flat => Some(add_on.price),
        }
        .ok_or_else(Self::overflow)?;
        Ok(AddOnCharge {
            add_on_id: add_on.id.clone(),
            name: add_on.name.clone(),
            amount,
        })
    }

    fn sum(left: Option<Money>, right: Option<Money>) -> Result<Money, PricingError> {
        left.zip(right)
            .and_then(|(left, right)| left.checked_add(&right))
            .ok_or_else(Self::overflow)
    }

    fn overflow() -> PricingError {
        PricingError::InvalidGuestComposition(
            "人数が多すぎるため料金を計算できません".to_string(),
        )
    }
}
