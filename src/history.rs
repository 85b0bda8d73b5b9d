use anyhow::{Context, Result};
use tracing::info;

use crate::db::KvStore;
use crate::model::Prediction;

pub const LATEST_KEY: &str = "latest";
pub const HISTORY_KEY: &str = "history";

#[derive(Debug, PartialEq, Eq)]
pub enum Recorded {
    Inserted,
    /// Same identifier already in history; nothing written.
    Duplicate,
}

pub fn latest(store: &impl KvStore) -> Result<Option<Prediction>> {
    store
        .get(LATEST_KEY)?
        .map(|bytes| serde_json::from_slice(&bytes).context("Corrupt latest prediction"))
        .transpose()
}

/// Most recent first.
pub fn load(store: &impl KvStore) -> Result<Vec<Prediction>> {
    match store.get(HISTORY_KEY)? {
        Some(bytes) => serde_json::from_slice(&bytes).context("Corrupt prediction history"),
        None => Ok(Vec::new()),
    }
}

/// Store as latest and prepend to history, keeping at most `limit` entries.
pub fn record(store: &mut impl KvStore, prediction: &Prediction, limit: usize) -> Result<Recorded> {
    let mut history = load(&*store)?;
    if !push_capped(&mut history, prediction.clone(), limit) {
        info!(id = ?prediction.identifier, "prediction already recorded, skipping");
        return Ok(Recorded::Duplicate);
    }

    store.put(LATEST_KEY, &serde_json::to_vec(prediction)?)?;
    store.put(HISTORY_KEY, &serde_json::to_vec(&history)?)?;
    info!(
        source = ?prediction.source,
        id = ?prediction.identifier,
        entries = history.len(),
        "recorded prediction"
    );
    Ok(Recorded::Inserted)
}

/// Returns false when an entry with the same identifier is already present.
fn push_capped(history: &mut Vec<Prediction>, prediction: Prediction, limit: usize) -> bool {
    if let Some(id) = prediction.identifier.as_deref() {
        if history.iter().any(|p| p.identifier.as_deref() == Some(id)) {
            return false;
        }
    }
    history.insert(0, prediction);
    history.truncate(limit.max(1));
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::model::Source;
    use chrono::DateTime;

    fn prediction(id: Option<&str>, ts: i64) -> Prediction {
        Prediction {
            gas: None,
            diesel: None,
            notes: None,
            source: Source::Reddit,
            identifier: id.map(str::to_string),
            timestamp: DateTime::from_timestamp(ts, 0).unwrap(),
        }
    }

    #[test]
    fn newest_first_and_capped() {
        let mut store = MemoryStore::default();
        for i in 0..5 {
            let id = format!("post{}", i);
            assert_eq!(record(&mut store, &prediction(Some(&id), i), 3).unwrap(), Recorded::Inserted);
        }
        let history = load(&store).unwrap();
        let ids: Vec<_> = history.iter().map(|p| p.identifier.clone().unwrap()).collect();
        assert_eq!(ids, vec!["post4", "post3", "post2"]);
        assert_eq!(latest(&store).unwrap().unwrap().identifier.as_deref(), Some("post4"));
    }

    #[test]
    fn duplicate_identifier_skipped() {
        let mut store = MemoryStore::default();
        record(&mut store, &prediction(Some("abc"), 1), 10).unwrap();
        record(&mut store, &prediction(Some("def"), 2), 10).unwrap();
        assert_eq!(record(&mut store, &prediction(Some("abc"), 3), 10).unwrap(), Recorded::Duplicate);
        assert_eq!(load(&store).unwrap().len(), 2);
        assert_eq!(latest(&store).unwrap().unwrap().identifier.as_deref(), Some("def"));
    }

    #[test]
    fn anonymous_submissions_always_inserted() {
        let mut store = MemoryStore::default();
        record(&mut store, &prediction(None, 1), 10).unwrap();
        record(&mut store, &prediction(None, 2), 10).unwrap();
        assert_eq!(load(&store).unwrap().len(), 2);
    }

    #[test]
    fn empty_store() {
        let store = MemoryStore::default();
        assert!(latest(&store).unwrap().is_none());
        assert!(load(&store).unwrap().is_empty());
    }
}
