// ドメインモデル（エンティティと値オブジェクト）

mod value_objects;
mod experience;
mod availability;
mod booking;

pub use value_objects::{
    BookingId, ExperienceId, UserId, ReservationId,
    Money,
    BookingType, BookingStatus,
    GuestComposition,
    SlotKey,
    CustomerContact,
    AddOnCharge, PriceQuote,
    parse_date, parse_time, DATE_FORMAT, TIME_FORMAT,
};

pub use experience::{
    Experience, PricingStructure, PrivatePricing, SharedPricing, GroupPricing, GroupTier,
    AddOn, AddOnCalculationType,
};
pub use availability::{default_daily_slots, ReservationToken, SlotSnapshot, TimeSlot};
pub use booking::{Booking, BookingDetails};
