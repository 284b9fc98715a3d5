use crate::domain::model::{BookingType, ExperienceId, Money};
use serde::{Deserialize, Serialize};

/// 体験（ツアー）
/// カタログが所有し、予約処理からは読み取り専用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub id: ExperienceId,
    pub title: String,
    pub booking_types: Vec<BookingType>,
    pub pricing: PricingStructure,
    pub add_ons: Vec<AddOn>,
}

impl Experience {
    /// 指定された予約タイプを受け付けるか
    /// 提供タイプに含まれ、かつ料金ルールが有効である必要がある
    pub fn accepts(&self, booking_type: BookingType) -> bool {
        self.booking_types.contains(&booking_type) && self.pricing.is_enabled(booking_type)
    }

    /// IDで有効なアドオンを検索
    pub fn find_active_add_on(&self, add_on_id: &str) -> Option<&AddOn> {
        self.add_ons
            .iter()
            .find(|add_on| add_on.id == add_on_id && add_on.active)
    }
}

/// 予約タイプごとの料金体系
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingStructure {
    pub private: PrivatePricing,
    pub shared: SharedPricing,
    pub group: GroupPricing,
}

impl PricingStructure {
    pub fn is_enabled(&self, booking_type: BookingType) -> bool {
        match booking_type {
            BookingType::Private => self.private.enabled,
            BookingType::Shared => self.shared.enabled,
            BookingType::Group => self.group.enabled,
        }
    }
}

/// 貸切料金: 最初の大人 + 追加の大人 + 子供
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivatePricing {
    pub enabled: bool,
    pub first_adult: Money,
    pub additional_adult: Money,
    pub child: Money,
}

/// 相乗り料金: 大人・子供の一人あたり定額
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedPricing {
    pub enabled: bool,
    pub adult: Money,
    pub child: Money,
}

/// 団体料金: 人数帯ごとの一人あたり料金
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPricing {
    pub enabled: bool,
    pub tiers: Vec<GroupTier>,
}

impl GroupPricing {
    /// 人数を含む最初の料金帯を検索
    pub fn tier_for(&self, group_size: u32) -> Option<&GroupTier> {
        self.tiers.iter().find(|tier| tier.contains(group_size))
    }
}

/// 団体料金の人数帯（min, maxとも含む）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupTier {
    pub min: u32,
    pub max: u32,
    pub price_per_person: Money,
}

impl GroupTier {
    pub fn contains(&self, group_size: u32) -> bool {
        self.min <= group_size && group_size <= self.max
    }
}

/// アドオンの課金方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddOnCalculationType {
    /// 参加者一人ごと
    #[serde(rename = "per_person")]
    PerPerson,
    /// 3人ごと（端数切り上げ）
    #[serde(rename = "per_3_guests")]
    PerThreeGuests,
    /// 予約ごとに1回
    #[serde(rename = "flat")]
    Flat,
    /// 大人一人ごと
    #[serde(rename = "per_adult")]
    PerAdult,
}

/// アドオン定義
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOn {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    pub calculation_type: AddOnCalculationType,
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_experience() -> Experience {
        Experience {
            id: ExperienceId::new(1),
            title: "Amaravati Heritage Walk".to_string(),
            booking_types: vec![BookingType::Private, BookingType::Shared],
            pricing: PricingStructure {
                private: PrivatePricing {
                    enabled: true,
                    first_adult: Money::new(3600),
                    additional_adult: Money::new(2200),
                    child: Money::new(1500),
                },
                shared: SharedPricing {
                    enabled: false,
                    adult: Money::new(2500),
                    child: Money::new(1700),
                },
                group: GroupPricing {
                    enabled: true,
                    tiers: vec![GroupTier {
                        min: 10,
                        max: 17,
                        price_per_person: Money::new(2200),
                    }],
                },
            },
            add_ons: vec![AddOn {
                id: "addon-1".to_string(),
                name: "Pickup".to_string(),
                description: String::new(),
                price: Money::new(1800),
                calculation_type: AddOnCalculationType::PerThreeGuests,
                active: false,
            }],
        }
    }

    #[test]
    fn test_accepts_requires_listed_and_enabled() {
        let experience = sample_experience();
        assert!(experience.accepts(BookingType::Private));
        // 提供タイプに含まれるが料金ルールが無効
        assert!(!experience.accepts(BookingType::Shared));
        // 料金ルールは有効だが提供タイプに含まれない
        assert!(!experience.accepts(BookingType::Group));
    }

    #[test]
    fn test_inactive_add_on_not_found() {
        let experience = sample_experience();
        assert!(experience.find_active_add_on("addon-1").is_none());
        assert!(experience.find_active_add_on("addon-2").is_none());
    }

    #[test]
    fn test_tier_bounds_inclusive() {
        let tier = GroupTier {
            min: 10,
            max: 17,
            price_per_person: Money::new(2200),
        };
        assert!(tier.contains(10));
        assert!(tier.contains(17));
        assert!(!tier.contains(9));
        assert!(!tier.contains(18));
    }

    #[test]
    fn test_add_on_deserializes_document_shape() {
        let json = r#"{
            "id": "addon-1",
            "name": "Pickup & Drop Off - Vijayawada",
            "description": "Round trip from Vijayawada",
            "price": 1800,
            "calculationType": "per_3_guests",
            "active": true
        }"#;
        let add_on: AddOn = serde_json::from_str(json).unwrap();
        assert_eq!(add_on.calculation_type, AddOnCalculationType::PerThreeGuests);
        assert_eq!(add_on.price, Money::new(1800));
    }

    #[test]
    fn test_private_pricing_deserializes_camel_case() {
        let json = r#"{"enabled": true, "firstAdult": 3600, "additionalAdult": 2200, "child": 1500}"#;
        let pricing: PrivatePricing = serde_json::from_str(json).unwrap();
        assert_eq!(pricing.first_adult, Money::new(3600));
        assert_eq!(pricing.additional_adult, Money::new(2200));
    }
}
