use serde::{Deserialize, Serialize};

/// Base price per couple, in dollars.
pub const BASE_AMOUNT: f64 = 100.0;

/// Surcharge per accompanying kid, in dollars.
pub const PER_KID_FEE: f64 = 25.0;

/// Default payment amount for a registration with the given number of kids.
pub fn default_amount(number_of_kids: u32) -> f64 {
    BASE_AMOUNT + number_of_kids as f64 * PER_KID_FEE
}

/// Registration ID in format: "registration::<epoch_millis>::<random>"
///
/// The wire format of all fields is camelCase to match the public API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: String,
    /// Display name for the couple, e.g. "Anna & Boris Petrov"
    pub couple_name: String,
    /// Contact phone number (free-form, validated as non-empty only)
    pub phone: String,
    pub number_of_kids: u32,
    /// Payment amount the couple committed to, in dollars
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub husband_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub wife_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_name: Option<String>,
    /// Creation timestamp (RFC 3339), never mutated after creation
    pub created_at: String,
    /// Last-modification timestamp (RFC 3339)
    pub updated_at: String,
}

/// Errors that can occur when parsing a registration ID
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistrationIdError {
    #[error("Invalid registration ID format")]
    InvalidFormat,
    #[error("Invalid timestamp in registration ID")]
    InvalidTimestamp,
}

impl Registration {
    /// Generate a new registration ID from an epoch-millis timestamp.
    ///
    /// The random fragment keeps IDs unique even when two registrations are
    /// created within the same millisecond.
    pub fn generate_id(epoch_millis: u64) -> String {
        let random = uuid::Uuid::new_v4().simple().to_string();
        format!("registration::{}::{}", epoch_millis, &random[..8])
    }

    /// Parse a registration ID and extract its timestamp component
    pub fn parse_id(id: &str) -> Result<u64, RegistrationIdError> {
        let parts: Vec<&str> = id.split("::").collect();
        if parts.len() != 3 || parts[0] != "registration" {
            return Err(RegistrationIdError::InvalidFormat);
        }

        parts[1]
            .parse::<u64>()
            .map_err(|_| RegistrationIdError::InvalidTimestamp)
    }
}

/// Body of POST /api/register.
///
/// `couple_name` may be omitted when the individual name parts are supplied;
/// the server composes the display name from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateRegistrationRequest {
    pub couple_name: Option<String>,
    pub phone: Option<String>,
    /// Accepted as a signed integer so a negative value can be rejected with
    /// a readable message instead of a deserialization failure
    pub number_of_kids: Option<i64>,
    /// Optional client-supplied amount; replaced by the formula default when
    /// missing, negative, or not finite
    pub amount: Option<f64>,
    pub husband_name: Option<String>,
    pub wife_name: Option<String>,
    pub last_name: Option<String>,
}

/// Body of PUT /api/users/:id: the fields the edit form can change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateRegistrationRequest {
    pub couple_name: Option<String>,
    pub phone: Option<String>,
    pub number_of_kids: Option<i64>,
}

/// Body of PATCH /api/users/:id: arbitrary partial fields.
///
/// `id` and `createdAt` are not representable here; attempts to send them are
/// ignored by serde rather than applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PatchRegistrationRequest {
    pub couple_name: Option<String>,
    pub phone: Option<String>,
    pub number_of_kids: Option<i64>,
    pub amount: Option<f64>,
    pub husband_name: Option<String>,
    pub wife_name: Option<String>,
    pub last_name: Option<String>,
}

/// Subset of a registration echoed back by POST /api/register
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationSummary {
    pub id: String,
    pub couple_name: String,
    pub phone: String,
    pub number_of_kids: u32,
    pub created_at: String,
}

impl From<&Registration> for RegistrationSummary {
    fn from(registration: &Registration) -> Self {
        Self {
            id: registration.id.clone(),
            couple_name: registration.couple_name.clone(),
            phone: registration.phone.clone(),
            number_of_kids: registration.number_of_kids,
            created_at: registration.created_at.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    pub registration: RegistrationSummary,
}

/// Response of GET /api/users: aggregate totals plus the full guest list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewResponse {
    pub success: bool,
    pub count: usize,
    pub total_adults: u32,
    pub total_kids: u32,
    pub registrations: Vec<Registration>,
}

impl OverviewResponse {
    /// Adults plus kids, as shown on the overview page
    pub fn total_guests(&self) -> u32 {
        self.total_adults + self.total_kids
    }
}

/// Response of GET /api/users/:id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationResponse {
    pub success: bool,
    pub registration: Registration,
}

/// Response of PUT/PATCH/DELETE /api/users/:id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
    pub message: String,
    pub registration: Registration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_and_parse_id() {
        let id = Registration::generate_id(1735689600000);
        assert!(id.starts_with("registration::1735689600000::"));
        assert_eq!(Registration::parse_id(&id), Ok(1735689600000));
    }

    #[test]
    fn test_ids_distinct_within_same_millisecond() {
        let a = Registration::generate_id(1735689600000);
        let b = Registration::generate_id(1735689600000);
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse_id_rejects_bad_input() {
        assert_eq!(
            Registration::parse_id("child::123"),
            Err(RegistrationIdError::InvalidFormat)
        );
        assert_eq!(
            Registration::parse_id("registration::abc::def0"),
            Err(RegistrationIdError::InvalidTimestamp)
        );
    }

    #[test]
    fn test_default_amount_formula() {
        assert_eq!(default_amount(0), 100.0);
        assert_eq!(default_amount(2), 150.0);
    }

    #[test]
    fn test_registration_wire_format_is_camel_case() {
        let registration = Registration {
            id: "registration::1::aa".to_string(),
            couple_name: "Anna & Boris".to_string(),
            phone: "555-1234".to_string(),
            number_of_kids: 2,
            amount: 150.0,
            husband_name: None,
            wife_name: None,
            last_name: None,
            created_at: "2025-01-01T00:00:00+00:00".to_string(),
            updated_at: "2025-01-01T00:00:00+00:00".to_string(),
        };

        let json = serde_json::to_value(&registration).unwrap();
        assert_eq!(json["coupleName"], "Anna & Boris");
        assert_eq!(json["numberOfKids"], 2);
        assert_eq!(json["createdAt"], "2025-01-01T00:00:00+00:00");
        // Absent optional name parts are omitted entirely
        assert!(json.get("husbandName").is_none());
    }

    #[test]
    fn test_create_request_accepts_partial_body() {
        let request: CreateRegistrationRequest =
            serde_json::from_str(r#"{"coupleName":"A & B","phone":"555"}"#).unwrap();
        assert_eq!(request.couple_name.as_deref(), Some("A & B"));
        assert_eq!(request.number_of_kids, None);
        assert_eq!(request.amount, None);
    }
}
