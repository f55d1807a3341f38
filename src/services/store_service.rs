// src/services/store_service.rs
use async_trait::async_trait;
use futures::future::try_join_all;
use serde::{de::DeserializeOwned, Serialize};

use crate::models::{
    complaint::Complaint,
    route::{city_pair_key, Route},
    shipment::Shipment,
    user::{User, UserRole},
    vehicle::Vehicle,
};
use crate::utils::id_generator::{IdType, WithGeneratedId};
pub use crate::services::store_backends::{MemoryStore, RedisStore};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Operation error: {0}")]
    Operation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Guard failed on key {key}")]
    GuardFailed { key: String },

    #[error("Transaction aborted by a concurrent writer")]
    Contended,
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

// ------------------------------
// Write batches
// ------------------------------

/// What the current value of a key must be for a batch to apply.
#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    Absent,
    AbsentOr(String),
    Equals(String),
}

impl Expectation {
    pub fn matches(&self, current: Option<&str>) -> bool {
        match (self, current) {
            (Expectation::Absent, current) => current.is_none(),
            (Expectation::AbsentOr(_), None) => true,
            (Expectation::AbsentOr(expected), Some(current)) => expected == current,
            (Expectation::Equals(expected), Some(current)) => expected == current,
            (Expectation::Equals(_), None) => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Guard {
    pub key: String,
    pub expect: Expectation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Set { key: String, value: String },
    Delete { key: String },
    AddMember { set: String, member: String },
    RemoveMember { set: String, member: String },
}

/// Guards are all checked before any op runs; either every op lands or none.
#[derive(Debug, Default)]
pub struct WriteBatch {
    pub guards: Vec<Guard>,
    pub ops: Vec<WriteOp>,
}

#[async_trait]
pub trait StoreOperations: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn members(&self, set: &str) -> Result<Vec<String>, StoreError>;
    async fn apply(&self, batch: WriteBatch) -> Result<(), StoreError>;
}

// Enum to wrap the different store implementations
pub enum Store {
    Redis(RedisStore),
    Memory(MemoryStore),
}

#[async_trait]
impl StoreOperations for Store {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self {
            Store::Redis(store) => store.get(key).await,
            Store::Memory(store) => store.get(key).await,
        }
    }

    async fn members(&self, set: &str) -> Result<Vec<String>, StoreError> {
        match self {
            Store::Redis(store) => store.members(set).await,
            Store::Memory(store) => store.members(set).await,
        }
    }

    async fn apply(&self, batch: WriteBatch) -> Result<(), StoreError> {
        match self {
            Store::Redis(store) => store.apply(batch).await,
            Store::Memory(store) => store.apply(batch).await,
        }
    }
}

// ------------------------------
// Keys
// ------------------------------

pub struct StoreKeys;

impl StoreKeys {
    fn composite(parts: &[&str]) -> String {
        parts.join(":")
    }

    pub fn record(collection: &str, id: &str) -> String {
        Self::composite(&[collection, "id", id])
    }

    pub fn all(collection: &str) -> String {
        Self::composite(&[collection, "all"])
    }

    pub fn user_email(email: &str) -> String {
        Self::composite(&["user", "email", &email.trim().to_lowercase()])
    }

    pub fn users_by_role(role: UserRole) -> String {
        Self::composite(&["users", "role", role.as_str()])
    }

    pub fn vehicle_number(number: &str) -> String {
        Self::composite(&["vehicle", "number", &number.trim().to_uppercase()])
    }

    pub fn route_pair(origin: &str, destination: &str) -> String {
        Self::composite(&["route", "pair", &city_pair_key(origin, destination)])
    }

    pub fn shipment_code(code: &str) -> String {
        Self::composite(&["shipment", "code", code])
    }

    pub fn shipments_by_sender(sender_id: &str) -> String {
        Self::composite(&["shipments", "sender", sender_id])
    }

    pub fn shipments_by_driver(driver_id: &str) -> String {
        Self::composite(&["shipments", "driver", driver_id])
    }

    pub fn complaint_ticket(ticket_id: &str) -> String {
        Self::composite(&["complaint", "ticket", &ticket_id.trim().to_uppercase()])
    }
}

// ------------------------------
// Records
// ------------------------------

/// A document stored as JSON under `{COLLECTION}:id:{id}`, listed in the
/// collection set, with optional unique index keys and secondary sets.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: &'static str;

    fn id(&self) -> &str;

    /// Keys that map to this record's id and must not belong to another record.
    fn unique_keys(&self) -> Vec<String> {
        Vec::new()
    }

    /// Secondary sets this record's id belongs to.
    fn memberships(&self) -> Vec<String> {
        Vec::new()
    }
}

impl Record for User {
    const COLLECTION: &'static str = "user";

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_keys(&self) -> Vec<String> {
        vec![StoreKeys::user_email(&self.email)]
    }

    fn memberships(&self) -> Vec<String> {
        vec![StoreKeys::users_by_role(self.role)]
    }
}

impl Record for Vehicle {
    const COLLECTION: &'static str = "vehicle";

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_keys(&self) -> Vec<String> {
        vec![StoreKeys::vehicle_number(&self.number)]
    }
}

impl Record for Route {
    const COLLECTION: &'static str = "route";

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_keys(&self) -> Vec<String> {
        vec![StoreKeys::route_pair(&self.origin, &self.destination)]
    }
}

impl Record for Shipment {
    const COLLECTION: &'static str = "shipment";

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_keys(&self) -> Vec<String> {
        vec![StoreKeys::shipment_code(&self.shipment_code)]
    }

    fn memberships(&self) -> Vec<String> {
        let mut sets = vec![StoreKeys::shipments_by_sender(&self.sender_id)];
        if let Some(driver_id) = &self.driver_id {
            sets.push(StoreKeys::shipments_by_driver(driver_id));
        }
        sets
    }
}

impl Record for Complaint {
    const COLLECTION: &'static str = "complaint";

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_keys(&self) -> Vec<String> {
        vec![StoreKeys::complaint_ticket(&self.ticket_id)]
    }
}

/// A record together with the exact JSON it was read from. Updates are guarded
/// on that snapshot, so a write only lands if nobody changed the record since.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub record: T,
    snapshot: String,
}

impl<T> Versioned<T> {
    pub fn into_inner(self) -> T {
        self.record
    }
}

// ------------------------------
// Unit of work
// ------------------------------

#[derive(Debug, Default)]
pub struct UnitOfWork {
    batch: WriteBatch,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.ops.is_empty()
    }

    pub fn insert<T: Record>(&mut self, record: &T) -> Result<(), StoreError> {
        let id = record.id().to_string();
        let key = StoreKeys::record(T::COLLECTION, &id);

        self.guard(&key, Expectation::Absent);
        self.batch.ops.push(WriteOp::Set { key, value: serde_json::to_string(record)? });
        self.add_member(StoreKeys::all(T::COLLECTION), &id);

        for set in record.memberships() {
            self.add_member(set, &id);
        }
        for unique_key in record.unique_keys() {
            self.guard(&unique_key, Expectation::Absent);
            self.batch.ops.push(WriteOp::Set { key: unique_key, value: id.clone() });
        }

        Ok(())
    }

    pub fn update<T: Record>(&mut self, before: &Versioned<T>, after: &T) -> Result<(), StoreError> {
        let id = after.id().to_string();
        debug_assert_eq!(before.record.id(), id, "update must keep the record id");
        let key = StoreKeys::record(T::COLLECTION, &id);

        self.guard(&key, Expectation::Equals(before.snapshot.clone()));
        self.batch.ops.push(WriteOp::Set { key, value: serde_json::to_string(after)? });

        let (old_sets, new_sets) = (before.record.memberships(), after.memberships());
        for set in old_sets.iter().filter(|set| !new_sets.contains(set)) {
            self.remove_member(set.clone(), &id);
        }
        for set in new_sets.iter().filter(|set| !old_sets.contains(set)) {
            self.add_member(set.clone(), &id);
        }

        let (old_keys, new_keys) = (before.record.unique_keys(), after.unique_keys());
        for unique_key in old_keys.iter().filter(|k| !new_keys.contains(k)) {
            self.batch.ops.push(WriteOp::Delete { key: unique_key.clone() });
        }
        for unique_key in new_keys.into_iter().filter(|k| !old_keys.contains(k)) {
            self.guard(&unique_key, Expectation::AbsentOr(id.clone()));
            self.batch.ops.push(WriteOp::Set { key: unique_key, value: id.clone() });
        }

        Ok(())
    }

    pub fn delete<T: Record>(&mut self, before: &Versioned<T>) {
        let id = before.record.id().to_string();
        let key = StoreKeys::record(T::COLLECTION, &id);

        self.guard(&key, Expectation::Equals(before.snapshot.clone()));
        self.batch.ops.push(WriteOp::Delete { key });
        self.remove_member(StoreKeys::all(T::COLLECTION), &id);

        for set in before.record.memberships() {
            self.remove_member(set, &id);
        }
        for unique_key in before.record.unique_keys() {
            self.batch.ops.push(WriteOp::Delete { key: unique_key });
        }
    }

    fn guard(&mut self, key: &str, expect: Expectation) {
        self.batch.guards.push(Guard { key: key.to_string(), expect });
    }

    fn add_member(&mut self, set: String, member: &str) {
        self.batch.ops.push(WriteOp::AddMember { set, member: member.to_string() });
    }

    fn remove_member(&mut self, set: String, member: &str) {
        self.batch.ops.push(WriteOp::RemoveMember { set, member: member.to_string() });
    }

    pub fn into_batch(self) -> WriteBatch {
        self.batch
    }
}

// ------------------------------
// Typed access
// ------------------------------

const MAX_INSERT_ATTEMPTS: usize = 5;

pub struct EntityStore {
    backend: Store,
}

impl EntityStore {
    pub fn new(backend: Store) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Store::Memory(MemoryStore::new()))
    }

    pub async fn load<T: Record>(&self, id: &str) -> Result<Option<Versioned<T>>, StoreError> {
        let key = StoreKeys::record(T::COLLECTION, id);
        match self.backend.get(&key).await? {
            Some(snapshot) => {
                let record = serde_json::from_str(&snapshot)?;
                Ok(Some(Versioned { record, snapshot }))
            }
            None => Ok(None),
        }
    }

    pub async fn get<T: Record>(&self, id: &str) -> Result<Option<T>, StoreError> {
        Ok(self.load(id).await?.map(Versioned::into_inner))
    }

    /// Resolves a unique index key (see `StoreKeys`) to its record.
    pub async fn load_by_key<T: Record>(&self, unique_key: &str) -> Result<Option<Versioned<T>>, StoreError> {
        match self.backend.get(unique_key).await? {
            Some(id) => self.load(&id).await,
            None => Ok(None),
        }
    }

    pub async fn list<T: Record>(&self) -> Result<Vec<T>, StoreError> {
        self.list_in(&StoreKeys::all(T::COLLECTION)).await
    }

    pub async fn list_in<T: Record>(&self, set: &str) -> Result<Vec<T>, StoreError> {
        let ids = self.backend.members(set).await?;
        let records = try_join_all(ids.iter().map(|id| self.get::<T>(id))).await?;
        Ok(records.into_iter().flatten().collect())
    }

    /// Inserts a record whose id and unique keys all come from the id
    /// generator, drawing fresh values when a guard reports a collision.
    pub async fn insert_generated<T>(&self, template: T, id_type: IdType) -> Result<T, StoreError>
    where
        T: Record + WithGeneratedId,
    {
        let mut attempt = 1;
        loop {
            let record = template.clone().with_generated_id(id_type);
            let mut unit = UnitOfWork::new();
            unit.insert(&record)?;

            match self.commit(unit).await {
                Ok(()) => return Ok(record),
                Err(StoreError::GuardFailed { key }) if attempt < MAX_INSERT_ATTEMPTS => {
                    tracing::warn!("Generated key {} already taken (attempt {}), regenerating", key, attempt);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub async fn commit(&self, unit: UnitOfWork) -> Result<(), StoreError> {
        if unit.is_empty() {
            return Ok(());
        }
        self.backend.apply(unit.into_batch()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn vehicle(id: &str, number: &str) -> Vehicle {
        Vehicle {
            id: id.to_string(),
            number: number.to_string(),
            vehicle_type: "Truck".to_string(),
            capacity_kg: 2000.0,
            fuel_type: "Diesel".to_string(),
            status: crate::models::vehicle::VehicleStatus::Available,
            current_driver_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_expectations() {
        assert!(Expectation::Absent.matches(None));
        assert!(!Expectation::Absent.matches(Some("x")));
        assert!(Expectation::AbsentOr("a".into()).matches(None));
        assert!(Expectation::AbsentOr("a".into()).matches(Some("a")));
        assert!(!Expectation::AbsentOr("a".into()).matches(Some("b")));
        assert!(!Expectation::Equals("a".into()).matches(None));
    }

    #[test]
    fn test_key_layout() {
        assert_eq!(StoreKeys::record("shipment", "shp-1"), "shipment:id:shp-1");
        assert_eq!(StoreKeys::all("route"), "route:all");
        assert_eq!(StoreKeys::user_email(" Asha@Example.com "), "user:email:asha@example.com");
        assert_eq!(StoreKeys::route_pair("Pune", "Mumbai"), StoreKeys::route_pair("mumbai", "pune"));
    }

    #[tokio::test]
    async fn test_insert_load_and_unique_key_lookup() {
        let store = EntityStore::in_memory();
        let mut unit = UnitOfWork::new();
        unit.insert(&vehicle("veh-1", "MH-12-AB-9999")).unwrap();
        store.commit(unit).await.unwrap();

        let loaded = store
            .load_by_key::<Vehicle>(&StoreKeys::vehicle_number("mh-12-ab-9999"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.record.id, "veh-1");
        assert_eq!(store.list::<Vehicle>().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_unique_key_rejects_whole_batch() {
        let store = EntityStore::in_memory();
        let mut unit = UnitOfWork::new();
        unit.insert(&vehicle("veh-1", "MH-12-AB-9999")).unwrap();
        store.commit(unit).await.unwrap();

        let mut unit = UnitOfWork::new();
        unit.insert(&vehicle("veh-2", "mh-12-ab-9999")).unwrap();
        let result = store.commit(unit).await;
        assert!(matches!(result, Err(StoreError::GuardFailed { .. })));
        assert!(store.get::<Vehicle>("veh-2").await.unwrap().is_none());
        assert_eq!(store.list::<Vehicle>().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_snapshot_is_rejected() {
        let store = EntityStore::in_memory();
        let mut unit = UnitOfWork::new();
        unit.insert(&vehicle("veh-1", "MH-01")).unwrap();
        store.commit(unit).await.unwrap();

        let first = store.load::<Vehicle>("veh-1").await.unwrap().unwrap();
        let second = store.load::<Vehicle>("veh-1").await.unwrap().unwrap();

        let mut changed = first.record.clone();
        changed.capacity_kg = 1000.0;
        let mut unit = UnitOfWork::new();
        unit.update(&first, &changed).unwrap();
        store.commit(unit).await.unwrap();

        let mut racing = second.record.clone();
        racing.capacity_kg = 500.0;
        let mut unit = UnitOfWork::new();
        unit.update(&second, &racing).unwrap();
        assert!(matches!(store.commit(unit).await, Err(StoreError::GuardFailed { .. })));

        let stored = store.get::<Vehicle>("veh-1").await.unwrap().unwrap();
        assert_eq!(stored.capacity_kg, 1000.0);
    }

    #[tokio::test]
    async fn test_update_moves_unique_key_and_delete_frees_it() {
        let store = EntityStore::in_memory();
        let mut unit = UnitOfWork::new();
        unit.insert(&vehicle("veh-1", "MH-01")).unwrap();
        store.commit(unit).await.unwrap();

        let before = store.load::<Vehicle>("veh-1").await.unwrap().unwrap();
        let mut renamed = before.record.clone();
        renamed.number = "MH-02".to_string();
        let mut unit = UnitOfWork::new();
        unit.update(&before, &renamed).unwrap();
        store.commit(unit).await.unwrap();

        assert!(store.load_by_key::<Vehicle>(&StoreKeys::vehicle_number("MH-01")).await.unwrap().is_none());
        let current = store
            .load_by_key::<Vehicle>(&StoreKeys::vehicle_number("MH-02"))
            .await
            .unwrap()
            .unwrap();

        let mut unit = UnitOfWork::new();
        unit.delete(&current);
        store.commit(unit).await.unwrap();
        assert!(store.list::<Vehicle>().await.unwrap().is_empty());

        let mut unit = UnitOfWork::new();
        unit.insert(&vehicle("veh-3", "MH-02")).unwrap();
        store.commit(unit).await.unwrap();
    }
}
