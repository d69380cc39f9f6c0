use color_eyre::{Result, eyre::WrapErr};
use fjall::{Config, Keyspace, PartitionCreateOptions, PersistMode};
use std::{
    fs,
    path::{Path, PathBuf},
};

mod repositories;

pub use repositories::{HistoryRepository, SettingsRepository, VisitRecord};

pub struct Storage {
    root: PathBuf,
    keyspace: Keyspace,
    history: HistoryRepository,
    settings: SettingsRepository,
}

impl Storage {
    pub fn open_default() -> Result<Self> {
        let root = default_data_dir()?;
        Self::open(root)
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .wrap_err_with(|| format!("failed to create data dir {}", root.display()))?;

        let keyspace = Config::new(&root).open()?;
        let history = keyspace.open_partition("history", PartitionCreateOptions::default())?;
        let settings = keyspace.open_partition("settings", PartitionCreateOptions::default())?;

        Ok(Self {
            root,
            history: HistoryRepository::new(history),
            settings: SettingsRepository::new(settings),
            keyspace,
        })
    }

    pub fn history(&self) -> &HistoryRepository {
        &self.history
    }

    pub fn settings(&self) -> &SettingsRepository {
        &self.settings
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Flushes the journal to disk.
    pub fn persist(&self) -> Result<()> {
        self.keyspace
            .persist(PersistMode::SyncAll)
            .wrap_err("failed to persist storage")
    }
}

fn default_data_dir() -> Result<PathBuf> {
    let mut root = dirs::data_local_dir()
        .unwrap_or(std::env::current_dir()?)
        .join("dapp-tui");
    if cfg!(debug_assertions) {
        root = root.join("dev");
    }
    Ok(root)
}
