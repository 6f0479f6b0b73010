//! JSON-file-backed storage: a single ordered array of registration records,
//! rewritten wholesale on every mutation.

pub mod connection;
pub mod registration_repository;

pub use connection::JsonConnection;
pub use registration_repository::RegistrationRepository;
