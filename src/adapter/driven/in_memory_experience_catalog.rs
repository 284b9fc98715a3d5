use crate::domain::model::{
    AddOn, AddOnCalculationType, BookingType, Experience, ExperienceId, GroupPricing, GroupTier,
    Money, PricingStructure, PrivatePricing, SharedPricing,
};
use crate::domain::port::{ExperienceCatalog, RepositoryError};
use async_trait::async_trait;
use dashmap::DashMap;

/// インメモリ体験カタログ
/// 開発環境とテストで使用する
#[derive(Debug, Default)]
pub struct InMemoryExperienceCatalog {
    experiences: DashMap<ExperienceId, Experience>,
}

impl InMemoryExperienceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 体験を登録（同じIDは上書き）
    pub fn insert(&self, experience: Experience) {
        self.experiences.insert(experience.id, experience);
    }

    /// 標準の料金体系とアドオンを持つ体験を登録したカタログ
    pub fn with_default_experience(id: i64, title: &str) -> Self {
        let catalog = Self::new();
        catalog.insert(default_experience(ExperienceId::new(id), title));
        catalog
    }
}

/// 標準の料金体系
/// 貸切 3600/2200/1500、相乗り 2500/1700、団体 10-17名 2200・18-25名 2000
pub fn default_pricing() -> PricingStructure {
    PricingStructure {
        private: PrivatePricing {
            enabled: true,
            first_adult: Money::new(3600),
            additional_adult: Money::new(2200),
            child: Money::new(1500),
        },
        shared: SharedPricing {
            enabled: true,
            adult: Money::new(2500),
            child: Money::new(1700),
        },
        group: GroupPricing {
            enabled: true,
            tiers: vec![
                GroupTier {
                    min: 10,
                    max: 17,
                    price_per_person: Money::new(2200),
                },
                GroupTier {
                    min: 18,
                    max: 25,
                    price_per_person: Money::new(2000),
                },
            ],
        },
    }
}

/// 標準のアドオン
pub fn default_add_ons() -> Vec<AddOn> {
    [
        (
            "addon-1",
            "Pickup & Drop Off - Vijayawada",
            1800,
            AddOnCalculationType::PerThreeGuests,
        ),
        (
            "addon-2",
            "Pickup & Drop Off - Guntur",
            2300,
            AddOnCalculationType::PerThreeGuests,
        ),
        (
            "addon-3",
            "Special Puja Tickets",
            500,
            AddOnCalculationType::PerPerson,
        ),
        (
            "addon-4",
            "Souvenir Kits",
            1000,
            AddOnCalculationType::PerAdult,
        ),
        (
            "addon-5",
            "Photography / Reels",
            1500,
            AddOnCalculationType::Flat,
        ),
    ]
    .into_iter()
    .map(|(id, name, price, calculation_type)| AddOn {
        id: id.to_string(),
        name: name.to_string(),
        description: String::new(),
        price: Money::new(price),
        calculation_type,
        active: true,
    })
    .collect()
}

/// 全予約タイプを提供する標準の体験
pub fn default_experience(id: ExperienceId, title: &str) -> Experience {
    Experience {
        id,
        title: title.to_string(),
        booking_types: vec![BookingType::Private, BookingType::Shared, BookingType::Group],
        pricing: default_pricing(),
        add_ons: default_add_ons(),
    }
}

#[async_trait]
impl ExperienceCatalog for InMemoryExperienceCatalog {
    async fn get_experience(
        &self,
        experience_id: ExperienceId,
    ) -> Result<Option<Experience>, RepositoryError> {
        Ok(self
            .experiences
            .get(&experience_id)
            .map(|entry| entry.value().clone()))
    }
}
