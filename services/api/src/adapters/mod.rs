pub mod credentials;
pub mod csv_store;
pub mod session_store;

pub use credentials::{HashedCredentials, StaticCredentials};
pub use csv_store::CsvResponseStore;
pub use session_store::InMemorySessionStore;
