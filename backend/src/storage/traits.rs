//! Storage abstraction trait.
//!
//! The domain layer works against this trait so the backing store can be
//! swapped (the JSON file store in production, fakes in tests) without
//! touching the services.

use async_trait::async_trait;

use shared::Registration;

use crate::domain::commands::registrations::{NewRegistration, RegistrationPatch};
use crate::domain::errors::StoreError;

#[async_trait]
pub trait RegistrationStorage: Send + Sync {
    /// Append one registration and persist the full collection.
    /// The id and both timestamps are assigned here.
    async fn create_registration(
        &self,
        new: NewRegistration,
    ) -> Result<Registration, StoreError>;

    /// Fresh snapshot of the whole collection in insertion order
    async fn list_registrations(&self) -> Result<Vec<Registration>, StoreError>;

    /// Retrieve a specific registration by ID
    async fn get_registration(&self, id: &str) -> Result<Registration, StoreError>;

    /// Apply a partial update and refresh `updated_at`. `id` and
    /// `created_at` are never touched.
    async fn update_registration(
        &self,
        id: &str,
        patch: RegistrationPatch,
    ) -> Result<Registration, StoreError>;

    /// Remove a registration, returning the removed record. Irreversible.
    async fn delete_registration(&self, id: &str) -> Result<Registration, StoreError>;
}
