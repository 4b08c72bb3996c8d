pub mod app_config;
pub mod database;
pub mod flight_repo;
pub mod memory;

pub use database::DbClient;
pub use flight_repo::PostgresFlightStore;
pub use memory::InMemoryFlightStore;
