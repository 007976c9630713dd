//! # Collection Codec
//!
//! On-disk shape of every collection file:
//!
//! ```text
//! {
//!   "meta":  { "version": 1, "updated_at": "2025-01-10T08:00:00Z", ... },
//!   "items": { "<id>": { ...record... }, ... }
//! }
//! ```
//!
//! Items are kept as raw JSON (`Box<RawValue>`) so a write only re-encodes
//! the records it touches and unknown fields in untouched records survive
//! byte-for-byte. Typed access goes through [`Collection::decode`] and
//! [`Collection::get`].
//!
//! ## Decode Policy
//! A record that fails to decode is skipped on list reads and logged with
//! `warn!`. When an operation needs that specific record, [`Collection::get`]
//! reports it as `CoreError::InvalidRecord` instead of pretending it is
//! missing.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use kavling_core::time::format_timestamp;
use kavling_core::{CoreError, Records};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use tracing::warn;

use crate::error::{StoreError, StoreResult};
use crate::names::{CollectionName, StoredRecord};

/// Current file format version.
pub const FORMAT_VERSION: u32 = 1;

/// `meta` object. Fields other than `version`/`updated_at` are preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_version() -> u32 {
    FORMAT_VERSION
}

impl Default for Meta {
    fn default() -> Self {
        Meta {
            version: FORMAT_VERSION,
            updated_at: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// One collection file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub meta: Meta,
    pub items: BTreeMap<String, Box<RawValue>>,
}

impl Collection {
    /// `{meta:{version:1, updated_at:null}, items:{}}`
    pub fn empty() -> Self {
        Collection {
            meta: Meta::default(),
            items: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// Decodes every item as `T`, skipping (and logging) the ones that fail.
    /// The map key wins over any `id` inside the record body.
    pub fn decode<T: StoredRecord>(&self) -> Records<T> {
        self.items
            .iter()
            .filter_map(|(id, raw)| match decode_one::<T>(id, raw) {
                Ok(record) => Some((id.clone(), record)),
                Err(err) => {
                    warn!(
                        collection = %T::COLLECTION,
                        id = %id,
                        error = %err,
                        "Skipping undecodable record"
                    );
                    None
                }
            })
            .collect()
    }

    /// Decodes one item. `Ok(None)` if absent, `InvalidRecord` if present
    /// but undecodable.
    pub fn get<T: StoredRecord>(&self, id: &str) -> StoreResult<Option<T>> {
        let Some(raw) = self.items.get(id) else {
            return Ok(None);
        };
        decode_one::<T>(id, raw).map(Some).map_err(|err| {
            warn!(collection = %T::COLLECTION, id = %id, error = %err, "Undecodable record");
            StoreError::Core(CoreError::InvalidRecord {
                entity: T::ENTITY,
                id: id.to_string(),
            })
        })
    }

    /// Like [`Collection::get`] but absence is `NotFound`.
    pub fn require<T: StoredRecord>(&self, id: &str) -> StoreResult<T> {
        self.get(id)?
            .ok_or_else(|| CoreError::not_found(T::ENTITY, id).into())
    }

    /// Encodes `record` under its id, replacing any previous value.
    pub fn put<T: StoredRecord>(&mut self, record: &T) -> StoreResult<()> {
        let raw = serde_json::value::to_raw_value(record).map_err(|source| StoreError::EncodeFailed {
            name: T::COLLECTION,
            source,
        })?;
        self.items.insert(record.id().to_string(), raw);
        Ok(())
    }

    /// Removes `id`. Returns whether it was present.
    pub fn remove(&mut self, id: &str) -> bool {
        self.items.remove(id).is_some()
    }

    /// Stamps `meta.updated_at`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.meta.updated_at = Some(format_timestamp(&now));
    }

    /// Items as generic JSON values, for diagnostics and untyped readers.
    pub fn values(&self, name: CollectionName) -> BTreeMap<String, serde_json::Value> {
        self.items
            .iter()
            .filter_map(|(id, raw)| match serde_json::from_str(raw.get()) {
                Ok(v) => Some((id.clone(), v)),
                Err(err) => {
                    warn!(collection = %name, id = %id, error = %err, "Skipping undecodable record");
                    None
                }
            })
            .collect()
    }
}

fn decode_one<T: StoredRecord>(id: &str, raw: &RawValue) -> Result<T, serde_json::Error> {
    let mut record: T = serde_json::from_str(raw.get())?;
    record.set_id(id.to_string());
    Ok(record)
}
