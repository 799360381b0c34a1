use serde::de::DeserializeOwned;
use serde::Serialize;

/// An entity persisted as one record of a named collection, upserted by id.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;

    fn record_id(&self) -> &str;
}
