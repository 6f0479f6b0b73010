use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use shared::Registration;

use super::connection::JsonConnection;
use crate::domain::commands::registrations::{NewRegistration, RegistrationPatch};
use crate::domain::errors::StoreError;
use crate::storage::RegistrationStorage;

/// Bounded retries for the id collision case
const MAX_ID_ATTEMPTS: u32 = 5;

/// JSON-file-backed registration repository.
///
/// Every mutation is a whole-collection cycle: read the file, apply the
/// change in memory, write the collection back through a temp file and an
/// atomic rename. `write_lock` serializes that entire cycle, so interleaved
/// mutations cannot lose updates. Reads take no lock: the rename guarantees
/// they always observe a complete snapshot.
#[derive(Clone)]
pub struct RegistrationRepository {
    connection: JsonConnection,
    write_lock: Arc<Mutex<()>>,
}

impl RegistrationRepository {
    pub fn new(connection: JsonConnection) -> Self {
        Self {
            connection,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Parse the collection file. `Ok(None)` means the file exists but is
    /// unparsable (corrupted); I/O failures are real errors.
    fn try_read_registrations(&self) -> Result<Option<Vec<Registration>>> {
        self.connection.ensure_registrations_file_exists()?;

        let file_path = self.connection.registrations_file_path();
        let file = File::open(&file_path)?;
        let reader = BufReader::new(file);

        match serde_json::from_reader(reader) {
            Ok(registrations) => Ok(Some(registrations)),
            Err(e) => {
                error!(
                    "Registrations file {} is unparsable: {}",
                    file_path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    /// Recover from a corrupted file by persisting an empty collection,
    /// trading the unrecoverable records for availability. Callers must hold
    /// `write_lock`.
    fn reset_collection(&self) -> Result<Vec<Registration>> {
        error!(
            "Resetting {} to an empty collection; records in the old file are lost",
            self.connection.registrations_file_path().display()
        );
        let empty: Vec<Registration> = Vec::new();
        self.write_registrations(&empty)?;
        Ok(empty)
    }

    /// Read for a mutation. The caller already holds `write_lock`, so a
    /// corrupted file can be reset in place.
    fn read_for_update(&self) -> Result<Vec<Registration>> {
        match self.try_read_registrations()? {
            Some(registrations) => Ok(registrations),
            None => self.reset_collection(),
        }
    }

    /// Lock-free snapshot for the read path. Only when the file turns out to
    /// be corrupted does this take the write lock to reset it, re-checking
    /// first since a concurrent mutation may have already rewritten the file
    /// by the time the lock is ours.
    async fn snapshot(&self) -> Result<Vec<Registration>> {
        if let Some(registrations) = self.try_read_registrations()? {
            return Ok(registrations);
        }

        let _guard = self.write_lock.lock().await;
        if let Some(registrations) = self.try_read_registrations()? {
            return Ok(registrations);
        }
        self.reset_collection()
    }

    /// Write the full collection to a temp file, then atomically replace the
    /// real one
    fn write_registrations(&self, registrations: &[Registration]) -> Result<()> {
        let file_path = self.connection.registrations_file_path();
        let temp_path = file_path.with_extension("tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)?;

            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, registrations)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }

        std::fs::rename(&temp_path, &file_path)?;
        Ok(())
    }

    /// Allocate an id not present in the current collection.
    ///
    /// The timestamp-plus-random format makes a collision astronomically
    /// unlikely; if one happens anyway we regenerate a bounded number of
    /// times and then fail loudly rather than overwrite an existing record.
    fn allocate_id(existing: &[Registration]) -> Result<String> {
        let epoch_millis = chrono::Utc::now().timestamp_millis() as u64;

        for _ in 0..MAX_ID_ATTEMPTS {
            let id = Registration::generate_id(epoch_millis);
            if !existing.iter().any(|r| r.id == id) {
                return Ok(id);
            }
        }

        Err(anyhow!(
            "could not allocate a unique registration id after {} attempts",
            MAX_ID_ATTEMPTS
        ))
    }
}

#[async_trait]
impl RegistrationStorage for RegistrationRepository {
    async fn create_registration(
        &self,
        new: NewRegistration,
    ) -> Result<Registration, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut registrations = self.read_for_update().map_err(StoreError::Persistence)?;
        let id = Self::allocate_id(&registrations).map_err(StoreError::Persistence)?;
        let now = chrono::Utc::now().to_rfc3339();

        let registration = Registration {
            id,
            couple_name: new.couple_name,
            phone: new.phone,
            number_of_kids: new.number_of_kids,
            amount: new.amount,
            husband_name: new.husband_name,
            wife_name: new.wife_name,
            last_name: new.last_name,
            created_at: now.clone(),
            updated_at: now,
        };

        registrations.push(registration.clone());
        self.write_registrations(&registrations)
            .map_err(StoreError::Persistence)?;

        info!("Stored registration {}", registration.id);
        Ok(registration)
    }

    async fn list_registrations(&self) -> Result<Vec<Registration>, StoreError> {
        self.snapshot().await.map_err(StoreError::Persistence)
    }

    async fn get_registration(&self, id: &str) -> Result<Registration, StoreError> {
        let registrations = self.snapshot().await.map_err(StoreError::Persistence)?;

        registrations
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn update_registration(
        &self,
        id: &str,
        patch: RegistrationPatch,
    ) -> Result<Registration, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut registrations = self.read_for_update().map_err(StoreError::Persistence)?;
        let registration = registrations
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if let Some(couple_name) = patch.couple_name {
            registration.couple_name = couple_name;
        }
        if let Some(phone) = patch.phone {
            registration.phone = phone;
        }
        if let Some(number_of_kids) = patch.number_of_kids {
            registration.number_of_kids = number_of_kids;
        }
        if let Some(amount) = patch.amount {
            registration.amount = amount;
        }
        if let Some(husband_name) = patch.husband_name {
            registration.husband_name = Some(husband_name);
        }
        if let Some(wife_name) = patch.wife_name {
            registration.wife_name = Some(wife_name);
        }
        if let Some(last_name) = patch.last_name {
            registration.last_name = Some(last_name);
        }
        registration.updated_at = chrono::Utc::now().to_rfc3339();

        let updated = registration.clone();
        self.write_registrations(&registrations)
            .map_err(StoreError::Persistence)?;

        info!("Updated registration {}", id);
        Ok(updated)
    }

    async fn delete_registration(&self, id: &str) -> Result<Registration, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut registrations = self.read_for_update().map_err(StoreError::Persistence)?;
        let index = registrations
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let removed = registrations.remove(index);
        self.write_registrations(&registrations)
            .map_err(StoreError::Persistence)?;

        info!("Deleted registration {}", id);
        Ok(removed)
    }
}
