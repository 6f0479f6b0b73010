use std::sync::Arc;

use tracing::info;

use shared::{
    default_amount, CreateRegistrationRequest, PatchRegistrationRequest, Registration,
    UpdateRegistrationRequest,
};

use crate::domain::commands::registrations::{NewRegistration, RegistrationPatch};
use crate::domain::errors::StoreError;
use crate::storage::RegistrationStorage;

/// Service for managing event registrations.
///
/// Owns all input validation and defaulting; the storage layer behind it only
/// deals with already-clean records.
#[derive(Clone)]
pub struct RegistrationService {
    storage: Arc<dyn RegistrationStorage>,
}

impl RegistrationService {
    pub fn new(storage: Arc<dyn RegistrationStorage>) -> Self {
        Self { storage }
    }

    /// Create a new registration
    pub async fn create_registration(
        &self,
        request: CreateRegistrationRequest,
    ) -> Result<Registration, StoreError> {
        let couple_name = Self::resolve_couple_name(&request);
        let phone = request.phone.as_deref().unwrap_or("").trim().to_string();

        if couple_name.is_empty() || phone.is_empty() {
            return Err(StoreError::Validation(
                "Couple name and phone are required".to_string(),
            ));
        }

        let number_of_kids = Self::validate_kids(request.number_of_kids)?;
        let amount = Self::resolve_amount(request.amount, number_of_kids);

        info!(
            "Creating registration: couple={}, kids={}, amount={:.2}",
            couple_name, number_of_kids, amount
        );

        let new = NewRegistration {
            couple_name,
            phone,
            number_of_kids,
            amount,
            husband_name: Self::normalize_optional(request.husband_name),
            wife_name: Self::normalize_optional(request.wife_name),
            last_name: Self::normalize_optional(request.last_name),
        };

        let registration = self.storage.create_registration(new).await?;
        info!("Created registration {}", registration.id);
        Ok(registration)
    }

    /// Fresh snapshot of all registrations, in insertion order
    pub async fn list_registrations(&self) -> Result<Vec<Registration>, StoreError> {
        self.storage.list_registrations().await
    }

    /// Get a registration by ID
    pub async fn get_registration(&self, id: &str) -> Result<Registration, StoreError> {
        self.storage.get_registration(id).await
    }

    /// Apply the form-editable fields (PUT semantics)
    pub async fn update_registration(
        &self,
        id: &str,
        request: UpdateRegistrationRequest,
    ) -> Result<Registration, StoreError> {
        let patch = RegistrationPatch {
            couple_name: Self::normalize_optional(request.couple_name),
            phone: Self::normalize_optional(request.phone),
            number_of_kids: Self::validate_optional_kids(request.number_of_kids)?,
            ..Default::default()
        };

        info!("Updating registration {}", id);
        self.storage.update_registration(id, patch).await
    }

    /// Apply an arbitrary partial update (PATCH semantics). `id` and
    /// `createdAt` are not part of the request type and cannot be changed.
    pub async fn patch_registration(
        &self,
        id: &str,
        request: PatchRegistrationRequest,
    ) -> Result<Registration, StoreError> {
        let patch = RegistrationPatch {
            couple_name: Self::normalize_optional(request.couple_name),
            phone: Self::normalize_optional(request.phone),
            number_of_kids: Self::validate_optional_kids(request.number_of_kids)?,
            amount: request.amount.filter(|amount| amount.is_finite() && *amount >= 0.0),
            husband_name: Self::normalize_optional(request.husband_name),
            wife_name: Self::normalize_optional(request.wife_name),
            last_name: Self::normalize_optional(request.last_name),
        };

        info!("Patching registration {}", id);
        self.storage.update_registration(id, patch).await
    }

    /// Delete a registration, returning the removed record
    pub async fn delete_registration(&self, id: &str) -> Result<Registration, StoreError> {
        info!("Deleting registration {}", id);
        self.storage.delete_registration(id).await
    }

    /// The display name: either the supplied couple name, or one composed
    /// from the individual name parts ("<husband> & <wife> <last>").
    fn resolve_couple_name(request: &CreateRegistrationRequest) -> String {
        if let Some(name) = &request.couple_name {
            let name = name.trim();
            if !name.is_empty() {
                return name.to_string();
            }
        }

        let husband = request.husband_name.as_deref().unwrap_or("").trim();
        let wife = request.wife_name.as_deref().unwrap_or("").trim();
        let last = request.last_name.as_deref().unwrap_or("").trim();

        if husband.is_empty() || wife.is_empty() {
            return String::new();
        }

        if last.is_empty() {
            format!("{} & {}", husband, wife)
        } else {
            format!("{} & {} {}", husband, wife, last)
        }
    }

    /// A missing kid count means zero; a negative one is rejected
    fn validate_kids(number_of_kids: Option<i64>) -> Result<u32, StoreError> {
        let kids = number_of_kids.unwrap_or(0);
        if kids < 0 {
            return Err(StoreError::Validation(
                "Number of kids cannot be negative".to_string(),
            ));
        }
        Ok(kids as u32)
    }

    fn validate_optional_kids(number_of_kids: Option<i64>) -> Result<Option<u32>, StoreError> {
        match number_of_kids {
            None => Ok(None),
            Some(kids) => Ok(Some(Self::validate_kids(Some(kids))?)),
        }
    }

    /// Keep a sane client-supplied amount; otherwise fall back to the
    /// kid-count formula. The amount is not cross-checked against the kid
    /// count: the payment happens off-platform and cannot be verified here.
    fn resolve_amount(amount: Option<f64>, number_of_kids: u32) -> f64 {
        match amount {
            Some(amount) if amount.is_finite() && amount >= 0.0 => amount,
            _ => default_amount(number_of_kids),
        }
    }

    fn normalize_optional(value: Option<String>) -> Option<String> {
        value
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}
