//! Domain-level command types.
//!
//! These structs are used by the service and storage layers and are not
//! exposed over the public API; the REST layer maps the public DTOs from the
//! `shared` crate onto these internal types after validation.

pub mod registrations {
    /// Input for creating a registration. Already validated and defaulted;
    /// the storage layer only assigns the id and timestamps.
    #[derive(Debug, Clone)]
    pub struct NewRegistration {
        pub couple_name: String,
        pub phone: String,
        pub number_of_kids: u32,
        pub amount: f64,
        pub husband_name: Option<String>,
        pub wife_name: Option<String>,
        pub last_name: Option<String>,
    }

    /// Partial update applied by PUT/PATCH. `None` leaves a field untouched;
    /// `id` and `created_at` are not representable here at all.
    #[derive(Debug, Clone, Default)]
    pub struct RegistrationPatch {
        pub couple_name: Option<String>,
        pub phone: Option<String>,
        pub number_of_kids: Option<u32>,
        pub amount: Option<f64>,
        pub husband_name: Option<String>,
        pub wife_name: Option<String>,
        pub last_name: Option<String>,
    }
}
