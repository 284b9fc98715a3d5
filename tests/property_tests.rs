use experience_booking::adapter::driven::{default_experience, InMemoryAvailabilityStore};
use experience_booking::domain::model::{
    default_daily_slots, BookingType, ExperienceId, GuestComposition, Money, ReservationToken,
    SlotKey, TimeSlot,
};
use experience_booking::domain::error::PricingError;
use experience_booking::domain::port::AvailabilityStore;
use experience_booking::domain::service::PricingCalculator;
use chrono::{NaiveDate, NaiveTime};
use proptest::prelude::*;

fn nine_am() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

// 料金計算のプロパティベーステスト
proptest! {
    /// 貸切料金 = 最初の大人 + 追加の大人 × (大人 - 1) + 子供 × 子供数
    #[test]
    fn test_private_price_formula(adults in 1u32..20, kids in 0u32..20) {
        let experience = default_experience(ExperienceId::new(1), "Heritage Walk");
        let guests = GuestComposition::new(adults, kids, None);

        let quote = PricingCalculator::compute_total(
            &experience, BookingType::Private, &guests, &[],
        ).unwrap();

        let expected = 3600 + 2200 * i64::from(adults - 1) + 1500 * i64::from(kids);
        prop_assert_eq!(quote.total(), Money::new(expected));
    }

    /// 相乗り料金 = 大人 × 大人単価 + 子供 × 子供単価
    #[test]
    fn test_shared_price_formula(adults in 1u32..20, kids in 0u32..20) {
        let experience = default_experience(ExperienceId::new(1), "Heritage Walk");
        let guests = GuestComposition::new(adults, kids, None);

        let quote = PricingCalculator::compute_total(
            &experience, BookingType::Shared, &guests, &[],
        ).unwrap();

        prop_assert_eq!(
            quote.base(),
            Money::new(2500 * i64::from(adults) + 1700 * i64::from(kids))
        );
    }

    /// 団体料金は該当する料金帯の単価 × 人数
    #[test]
    fn test_group_price_uses_matching_tier(group_size in 10u32..=25) {
        let experience = default_experience(ExperienceId::new(1), "Heritage Walk");
        let guests = GuestComposition::new(0, 0, Some(group_size));

        let quote = PricingCalculator::compute_total(
            &experience, BookingType::Group, &guests, &[],
        ).unwrap();

        let per_person = if group_size <= 17 { 2200 } else { 2000 };
        prop_assert_eq!(quote.total(), Money::new(per_person * i64::from(group_size)));
    }

    /// 料金帯の外の団体人数は常に拒否される
    #[test]
    fn test_group_outside_tiers_rejected(group_size in prop_oneof![1u32..10, 26u32..100]) {
        let experience = default_experience(ExperienceId::new(1), "Heritage Walk");
        let guests = GuestComposition::new(0, 0, Some(group_size));

        let result = PricingCalculator::compute_total(
            &experience, BookingType::Group, &guests, &[],
        );
        prop_assert!(result.is_err());
    }

    /// 3人ごとのアドオンは人数/3の切り上げ回数だけ課金される
    #[test]
    fn test_per_three_guests_rounds_up(adults in 1u32..15, kids in 0u32..15) {
        let experience = default_experience(ExperienceId::new(1), "Heritage Walk");
        let guests = GuestComposition::new(adults, kids, None);

        let quote = PricingCalculator::compute_total(
            &experience, BookingType::Shared, &guests, &["addon-1".to_string()],
        ).unwrap();

        let units = (adults + kids).div_ceil(3);
        prop_assert_eq!(quote.add_ons_total(), Money::new(1800 * i64::from(units)));
    }

    /// 合計は基本料金とアドオン明細の和に等しい
    #[test]
    fn test_total_is_base_plus_add_ons(
        adults in 1u32..10,
        kids in 0u32..10,
        selected in proptest::sample::subsequence(
            vec!["addon-1", "addon-2", "addon-3", "addon-4", "addon-5"], 0..=5
        ),
    ) {
        let experience = default_experience(ExperienceId::new(1), "Heritage Walk");
        let guests = GuestComposition::new(adults, kids, None);
        let add_on_ids: Vec<String> = selected.iter().map(|s| s.to_string()).collect();

        let quote = PricingCalculator::compute_total(
            &experience, BookingType::Private, &guests, &add_on_ids,
        ).unwrap();

        let add_on_sum: i64 = quote.add_ons().iter().map(|c| c.amount.amount()).sum();
        prop_assert_eq!(quote.add_ons().len(), add_on_ids.len());
        prop_assert_eq!(quote.total().amount(), quote.base().amount() + add_on_sum);
    }

    /// 同じ入力には同じ見積もりを返す
    #[test]
    fn test_pricing_is_deterministic(adults in 1u32..10, kids in 0u32..10) {
        let experience = default_experience(ExperienceId::new(1), "Heritage Walk");
        let guests = GuestComposition::new(adults, kids, None);
        let add_ons = vec!["addon-3".to_string(), "addon-4".to_string()];

        let first = PricingCalculator::compute_total(
            &experience, BookingType::Private, &guests, &add_ons,
        ).unwrap();
        let second = PricingCalculator::compute_total(
            &experience, BookingType::Private, &guests, &add_ons,
        ).unwrap();

        prop_assert_eq!(first, second);
    }
}

// 人数が極端に大きくても料金計算はパニックしない
proptest! {
    #[test]
    fn test_extreme_guest_counts_never_panic(
        adults in any::<u32>(),
        kids in any::<u32>(),
        group_size in any::<u32>(),
    ) {
        let experience = default_experience(ExperienceId::new(1), "Amaravati Heritage Walk");
        let add_ons: Vec<String> = experience
            .add_ons
            .iter()
            .filter(|add_on| add_on.active)
            .map(|add_on| add_on.id.clone())
            .collect();
        for booking_type in [BookingType::Private, BookingType::Shared, BookingType::Group] {
            let guests = GuestComposition::new(adults, kids, Some(group_size));
            match PricingCalculator::compute_total(&experience, booking_type, &guests, &add_ons) {
                Ok(quote) => prop_assert!(quote.total().amount() >= quote.base().amount()),
                Err(err) => prop_assert!(matches!(
                    err,
                    PricingError::InvalidGuestComposition(_) | PricingError::BookingTypeUnsupported(_)
                )),
            }
        }
    }
}

// 時間枠の容量に関するプロパティベーステスト
proptest! {
    /// どのような予約・解放の列でも 0 <= current_bookings <= max_capacity が保たれる
    #[test]
    fn test_capacity_invariant_holds(
        capacity in 1u32..10,
        operations in prop::collection::vec(any::<bool>(), 0..50),
    ) {
        let mut slot = TimeSlot::new(nine_am(), BookingType::Private, capacity);

        for reserve in operations {
            let before = slot.current_bookings();
            let result = if reserve { slot.reserve(1) } else { slot.release(1) };
            if result.is_err() {
                prop_assert_eq!(slot.current_bookings(), before);
            }
            prop_assert!(slot.current_bookings() <= slot.max_capacity());
            prop_assert_eq!(slot.is_available(), slot.current_bookings() < slot.max_capacity());
        }
    }

    /// 予約して解放すると元のカウンタに戻る
    #[test]
    fn test_reserve_release_round_trip(capacity in 1u32..10, prefilled in 0u32..10) {
        let prefilled = prefilled.min(capacity - 1);
        let runtime = runtime();
        let store = InMemoryAvailabilityStore::new();
        let date = NaiveDate::from_ymd_opt(2025, 2, 15).unwrap();
        let experience_id = ExperienceId::new(1);
        let slot = SlotKey::new(experience_id, date, nine_am());

        runtime.block_on(async {
            store
                .seed_slots(
                    experience_id,
                    date,
                    &[TimeSlot::reconstruct(nine_am(), BookingType::Private, capacity, prefilled).unwrap()],
                )
                .await
                .unwrap();

            let token = ReservationToken::new(slot, 1);
            store.try_reserve(&token).await.unwrap();
            assert_eq!(store.peek(slot).await.unwrap().current_bookings, prefilled + 1);

            store.release(&token).await.unwrap();
            assert_eq!(store.peek(slot).await.unwrap().current_bookings, prefilled);
            assert_eq!(store.outstanding_reservations(), 0);
        });
    }

    /// 満席までの予約はちょうど容量分だけ成功する
    #[test]
    fn test_reservations_stop_at_capacity(capacity in 1u32..8, attempts in 1u32..16) {
        let runtime = runtime();
        let store = InMemoryAvailabilityStore::new();
        let date = NaiveDate::from_ymd_opt(2025, 2, 15).unwrap();
        let experience_id = ExperienceId::new(1);
        let slot = SlotKey::new(experience_id, date, nine_am());

        let succeeded = runtime.block_on(async {
            store
                .seed_slots(
                    experience_id,
                    date,
                    &[TimeSlot::new(nine_am(), BookingType::Private, capacity)],
                )
                .await
                .unwrap();

            let mut succeeded = 0;
            for _ in 0..attempts {
                if store.try_reserve(&ReservationToken::new(slot, 1)).await.is_ok() {
                    succeeded += 1;
                }
            }
            succeeded
        });

        prop_assert_eq!(succeeded, attempts.min(capacity));
    }
}

#[test]
fn test_default_daily_slots_schedule() {
    let slots = default_daily_slots();
    let summary: Vec<(String, BookingType, u32)> = slots
        .iter()
        .map(|s| (s.time().format("%H:%M").to_string(), s.booking_type(), s.max_capacity()))
        .collect();

    assert_eq!(
        summary,
        vec![
            ("09:00".to_string(), BookingType::Private, 2),
            ("10:00".to_string(), BookingType::Shared, 5),
            ("14:00".to_string(), BookingType::Private, 2),
            ("15:00".to_string(), BookingType::Group, 3),
        ]
    );
}
