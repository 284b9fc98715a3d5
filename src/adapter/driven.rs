// 駆動される側アダプター（リポジトリ実装など）

mod event_publisher;
mod in_memory_availability_store;
mod in_memory_booking_repository;
mod in_memory_experience_catalog;
mod mysql_availability_store;
mod mysql_booking_repository;
mod mysql_experience_catalog;

pub use event_publisher::TracingEventPublisher;
pub use in_memory_availability_store::InMemoryAvailabilityStore;
pub use in_memory_booking_repository::InMemoryBookingRepository;
pub use in_memory_experience_catalog::{
    default_add_ons, default_experience, default_pricing, InMemoryExperienceCatalog,
};
pub use mysql_availability_store::MySqlAvailabilityStore;
pub use mysql_booking_repository::MySqlBookingRepository;
pub use mysql_experience_catalog::MySqlExperienceCatalog;
