use crate::model::{AssignmentRecord, ChurchId, Registry, RoleId};
use crate::scheduler::{RotationOptions, RotationScheduler};
use anyhow::Context;
use chrono::NaiveDate;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub trait Storage {
    /// Charge un registre depuis un support.
    fn load(&self) -> anyhow::Result<Registry>;
    /// Sauvegarde de manière atomique.
    fn save(&self, registry: &Registry) -> anyhow::Result<()>;
}

pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self { path: path.as_ref().to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Registre vide si le fichier n'existe pas encore ; une erreur de lecture
    /// ou de parsing reste une erreur.
    pub fn load_or_default(&self) -> anyhow::Result<Registry> {
        if !self.path.exists() {
            return Ok(Registry::default());
        }
        self.load()
    }
}

impl Storage for JsonStorage {
    fn load(&self) -> anyhow::Result<Registry> {
        let data = fs::read(&self.path).with_context(|| format!("reading {}", self.path.display()))?;
        let registry: Registry = serde_json::from_slice(&data)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(registry)
    }

    fn save(&self, registry: &Registry) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(registry)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).with_context(|| "creating temp file")?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).with_context(|| "atomic rename")?;
        Ok(())
    }
}

/// Génération persistée en une seule unité de travail : chargement,
/// suppression + insertion en mémoire, puis écriture atomique. Si une étape
/// échoue, le support garde l'escala précédente.
pub fn generate_persisted(
    storage: &dyn Storage,
    dates: &[NaiveDate],
    church: &ChurchId,
    role: &RoleId,
    opts: RotationOptions,
) -> anyhow::Result<Vec<AssignmentRecord>> {
    let mut scheduler = RotationScheduler::from_registry(storage.load()?);
    let records = scheduler
        .generate(dates, church, role, opts)
        .context("could not generate schedule")?;
    storage
        .save(scheduler.registry())
        .context("could not persist schedule")?;
    Ok(records)
}
