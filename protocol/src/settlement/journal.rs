//! # Purchase Journal
//!
//! Durable record of every ticket purchase, kept in sled's embedded
//! key-value store. One tree, keyed by purchase id:
//!
//! | Tree        | Key              | Value                     |
//! |-------------|------------------|---------------------------|
//! | `purchases` | `uuid` (16B)     | `bincode(PurchaseRecord)` |
//!
//! Records are rewritten whole at every phase boundary and flushed before
//! the orchestrator moves on, so after a crash the journal shows the last
//! phase that completed. Nothing is resumed automatically.

use sled::{Db, Tree};
use std::path::Path;
use uuid::Uuid;

use super::error::JournalError;
use super::state::PurchaseRecord;

pub type JournalResult<T> = Result<T, JournalError>;

#[derive(Debug, Clone)]
pub struct PurchaseJournal {
    db: Db,
    purchases: Tree,
}

impl PurchaseJournal {
    /// Opens or creates a journal at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> JournalResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// An in-memory journal, removed on drop.
    pub fn open_temporary() -> JournalResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> JournalResult<Self> {
        let purchases = db.open_tree("purchases")?;
        Ok(Self { db, purchases })
    }

    /// Writes `record`, replacing any earlier version, and flushes.
    pub fn put(&self, record: &PurchaseRecord) -> JournalResult<()> {
        let bytes =
            bincode::serialize(record).map_err(|e| JournalError::Serialization(e.to_string()))?;
        self.purchases.insert(record.id.as_bytes(), bytes)?;
        self.db.flush()?;
        Ok(())
    }

    pub fn get(&self, id: &Uuid) -> JournalResult<Option<PurchaseRecord>> {
        match self.purchases.get(id.as_bytes())? {
            Some(bytes) => {
                let record = bincode::deserialize(&bytes)
                    .map_err(|e| JournalError::Serialization(e.to_string()))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Like [`get`](Self::get), but a missing record is an error.
    pub fn require(&self, id: &Uuid) -> JournalResult<PurchaseRecord> {
        self.get(id)?.ok_or(JournalError::NotFound(*id))
    }

    /// Every record, oldest first.
    pub fn list(&self) -> JournalResult<Vec<PurchaseRecord>> {
        let mut records = Vec::with_capacity(self.purchases.len());
        for entry in self.purchases.iter() {
            let (_key, value) = entry?;
            let record: PurchaseRecord = bincode::deserialize(&value)
                .map_err(|e| JournalError::Serialization(e.to_string()))?;
            records.push(record);
        }
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }

    /// Records that have not reached a terminal state.
    pub fn unfinished(&self) -> JournalResult<Vec<PurchaseRecord>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|r| !r.is_terminal())
            .collect())
    }

    pub fn len(&self) -> usize {
        self.purchases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.purchases.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement::{Phase, TicketPurchaseState};

    #[test]
    fn put_get_overwrite() {
        let journal = PurchaseJournal::open_temporary().unwrap();
        let mut record = PurchaseRecord::new("testnet", 0, 2);
        journal.put(&record).unwrap();

        record.advance(TicketPurchaseState::SplitSigned);
        journal.put(&record).unwrap();

        assert_eq!(journal.len(), 1);
        let back = journal.get(&record.id).unwrap().unwrap();
        assert_eq!(back.state(), TicketPurchaseState::SplitSigned);
        assert_eq!(back.tickets.len(), 2);
    }

    #[test]
    fn missing_record() {
        let journal = PurchaseJournal::open_temporary().unwrap();
        let id = Uuid::new_v4();
        assert!(journal.get(&id).unwrap().is_none());
        assert!(matches!(journal.require(&id), Err(JournalError::NotFound(x)) if x == id));
    }

    #[test]
    fn unfinished_excludes_terminal() {
        let journal = PurchaseJournal::open_temporary().unwrap();
        let open = PurchaseRecord::new("testnet", 0, 1);
        let mut failed = PurchaseRecord::new("testnet", 0, 1);
        failed.fail(Some(Phase::Construct), "no funds");
        journal.put(&open).unwrap();
        journal.put(&failed).unwrap();

        assert_eq!(journal.list().unwrap().len(), 2);
        let unfinished = journal.unfinished().unwrap();
        assert_eq!(unfinished.len(), 1);
        assert_eq!(unfinished[0].id, open.id);
    }

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let record = PurchaseRecord::new("simnet", 1, 1);
        {
            let journal = PurchaseJournal::open(dir.path()).unwrap();
            journal.put(&record).unwrap();
        }
        let journal = PurchaseJournal::open(dir.path()).unwrap();
        assert_eq!(journal.require(&record.id).unwrap(), record);
    }
}
