use crate::model::{AbsenceDeclaration, ArrangementTable, DayMode, Suggestion};
use anyhow::Context;
use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Origine du tableau enregistré.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Auto,
    Manual,
}

/// Arrangement d'une journée, tel qu'archivé.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub date: NaiveDate,
    pub day: Weekday,
    pub source: Source,
    pub generated_at: DateTime<Utc>,
    pub mode: DayMode,
    /// Toutes les absences déclarées, même sans période à couvrir.
    #[serde(default)]
    pub absences: Vec<AbsenceDeclaration>,
    pub table: ArrangementTable,
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
}

impl LogEntry {
    pub fn new(
        date: NaiveDate,
        mode: DayMode,
        absences: Vec<AbsenceDeclaration>,
        table: ArrangementTable,
        suggestions: Vec<Suggestion>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            day: date.weekday(),
            source: Source::Auto,
            generated_at,
            mode,
            absences,
            table,
            suggestions,
        }
    }

    /// Périodes à couvrir restées sans remplaçant, corrections manuelles
    /// comprises. Les périodes libres de l'absent ne comptent pas.
    pub fn unassigned(&self) -> usize {
        self.suggestions
            .iter()
            .filter(|s| self.table.cell(&s.absent_teacher, s.period).is_none())
            .count()
    }
}

/// Historique des arrangements, au plus une entrée par date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrangementLog {
    pub entries: Vec<LogEntry>,
}

impl ArrangementLog {
    /// Remplace l'entrée de la même date, sinon ajoute ; entrées triées par date.
    pub fn upsert(&mut self, entry: LogEntry) {
        match self.entries.iter_mut().find(|e| e.date == entry.date) {
            Some(existing) => *existing = entry,
            None => {
                self.entries.push(entry);
                self.entries.sort_by_key(|e| e.date);
            }
        }
    }

    pub fn for_date(&self, date: NaiveDate) -> Option<&LogEntry> {
        self.entries.iter().find(|e| e.date == date)
    }

    pub fn for_date_mut(&mut self, date: NaiveDate) -> Option<&mut LogEntry> {
        self.entries.iter_mut().find(|e| e.date == date)
    }

    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.iter().max_by_key(|e| e.date)
    }
}

pub trait Storage {
    /// Charge l'historique depuis un support.
    fn load(&self) -> anyhow::Result<ArrangementLog>;
    /// Sauvegarde de manière atomique.
    fn save(&self, log: &ArrangementLog) -> anyhow::Result<()>;
}

pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self {
            path: path.as_ref().to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Historique vide si le fichier n'existe pas encore.
    pub fn load_or_default(&self) -> anyhow::Result<ArrangementLog> {
        if self.path.exists() {
            self.load()
        } else {
            Ok(ArrangementLog::default())
        }
    }
}

impl Storage for JsonStorage {
    fn load(&self) -> anyhow::Result<ArrangementLog> {
        let data =
            fs::read(&self.path).with_context(|| format!("reading {}", self.path.display()))?;
        let log: ArrangementLog = serde_json::from_slice(&data)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(log)
    }

    fn save(&self, log: &ArrangementLog) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(log)?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
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
