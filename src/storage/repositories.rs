use color_eyre::{Result, eyre::WrapErr};
use fjall::PartitionHandle;
use serde::{Deserialize, Serialize};

/// Most recently visited contracts, one entry per contract address.
#[derive(Clone)]
pub struct HistoryRepository {
    handle: PartitionHandle,
}

impl HistoryRepository {
    pub const LIMIT: usize = 50;

    pub(crate) fn new(handle: PartitionHandle) -> Self {
        Self { handle }
    }

    /// Newest first.
    pub fn list(&self) -> Result<Vec<VisitRecord>> {
        let mut items = Vec::new();
        for entry in self.handle.iter() {
            let (key, value) = entry?;
            let mut record: VisitRecord = serde_json::from_slice(value.as_ref())
                .wrap_err("failed to deserialize visit record")?;
            record.contract =
                String::from_utf8(key.to_vec()).wrap_err("history key is not valid UTF-8")?;
            items.push(record);
        }
        items.sort_by(|a, b| b.visited_at.cmp(&a.visited_at));
        Ok(items)
    }

    /// Inserts or refreshes the entry for `record.contract`, then drops the
    /// oldest entries beyond [`Self::LIMIT`].
    pub fn record(&self, record: &VisitRecord) -> Result<()> {
        let key = record.contract.to_ascii_lowercase();
        let stored = serde_json::to_vec(record).wrap_err("failed to serialize visit record")?;
        self.handle
            .insert(key.as_bytes(), stored)
            .wrap_err("failed to insert visit record")?;

        for stale in self.list()?.into_iter().skip(Self::LIMIT) {
            self.handle
                .remove(stale.contract.as_bytes())
                .wrap_err("failed to prune visit history")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VisitRecord {
    /// What the user typed: an ENS name or the address itself.
    pub entered: String,
    pub contract: String,
    /// Seconds since the unix epoch.
    pub visited_at: u64,
}

#[derive(Clone)]
pub struct SettingsRepository {
    handle: PartitionHandle,
}

impl SettingsRepository {
    pub(crate) fn new(handle: PartitionHandle) -> Self {
        Self { handle }
    }

    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .handle
            .get(key.as_bytes())
            .wrap_err("failed to read setting")?
            .map(|v| v.to_vec()))
    }

    pub fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        self.handle
            .insert(key.as_bytes(), value)
            .wrap_err("failed to write setting")
    }
}
