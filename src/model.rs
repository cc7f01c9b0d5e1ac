use crate::scheduler::ArrangeError;
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

/// Nombre de périodes dans une journée de cours.
pub const PERIODS_PER_DAY: u8 = 8;

/// Mots-clés (tokens) qui classent un enseignant en personnel auxiliaire.
pub const MISC_KEYWORDS: &[&str] = &[
    "LIBRARIAN",
    "PTI",
    "PET",
    "SPORTS",
    "MUSIC",
    "ART",
    "DANCE",
    "YOGA",
    "COUNSELLOR",
    "EDUCATOR",
    "INSTRUCTOR",
];

/// Catégorie d'enseignant, dérivée une seule fois de son nom/rôle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    #[serde(rename = "PRT")]
    Prt,
    #[serde(rename = "TGT")]
    Tgt,
    #[serde(rename = "PGT")]
    Pgt,
    Principal,
    Misc,
    Unknown,
}

impl Domain {
    /// Classe un enseignant à partir des tokens de son nom.
    ///
    /// Les mots-clés auxiliaires passent avant `PRINCIPAL`, puis `PGT`,
    /// `TGT` et `PRT`. Comparaison par token entier ("Martha" n'est pas `ART`).
    pub fn classify(name: &str) -> Self {
        let upper = name.to_uppercase();
        let tokens: HashSet<&str> = upper
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        if MISC_KEYWORDS.iter().any(|kw| tokens.contains(kw)) {
            Domain::Misc
        } else if tokens.contains("PRINCIPAL") {
            Domain::Principal
        } else if tokens.contains("PGT") {
            Domain::Pgt
        } else if tokens.contains("TGT") {
            Domain::Tgt
        } else if tokens.contains("PRT") {
            Domain::Prt
        } else {
            Domain::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Prt => "PRT",
            Domain::Tgt => "TGT",
            Domain::Pgt => "PGT",
            Domain::Principal => "Principal",
            Domain::Misc => "Misc",
            Domain::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Jour de semaine, insensible à la casse ("monday", "Mon", "MONDAY").
pub fn parse_day(raw: &str) -> Result<Weekday, ArrangeError> {
    raw.trim()
        .parse::<Weekday>()
        .map_err(|_| ArrangeError::UnknownDay(raw.to_string()))
}

/// Une période d'un enseignant, un jour donné.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableEntry {
    pub teacher: String,
    pub day: Weekday,
    pub period: u8,
    /// Classe enseignée, `None` pour une période libre.
    pub class_assigned: Option<String>,
    /// Total des périodes de service du jour (TPOD).
    pub tpod: Option<u32>,
    pub domain: Domain,
}

impl TimetableEntry {
    pub fn new<T: Into<String>>(
        teacher: T,
        day: Weekday,
        period: u8,
        class_assigned: Option<String>,
        tpod: Option<u32>,
    ) -> Self {
        let teacher = teacher.into();
        let domain = Domain::classify(&teacher);
        Self {
            teacher,
            day,
            period,
            class_assigned,
            tpod,
            domain,
        }
    }

    /// Libellé de classe nettoyé, `None` si vide.
    pub fn class_label(&self) -> Option<&str> {
        self.class_assigned
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Emploi du temps hebdomadaire validé.
#[derive(Debug, Clone, Default)]
pub struct Timetable {
    entries: Vec<TimetableEntry>,
}

impl Timetable {
    /// Construit un emploi du temps en validant sa structure : nom non vide,
    /// période dans `1..=8`, au plus une entrée par (enseignant, jour, période).
    pub fn new(entries: Vec<TimetableEntry>) -> Result<Self, ArrangeError> {
        Self::validate(&entries)?;
        Ok(Self { entries })
    }

    fn validate(entries: &[TimetableEntry]) -> Result<(), ArrangeError> {
        let mut seen = HashSet::new();
        for e in entries {
            if e.teacher.trim().is_empty() {
                return Err(ArrangeError::EmptyTeacher);
            }
            if !(1..=PERIODS_PER_DAY).contains(&e.period) {
                return Err(ArrangeError::InvalidPeriod(e.period));
            }
            if !seen.insert((e.teacher.as_str(), e.day, e.period)) {
                return Err(ArrangeError::DuplicateEntry {
                    teacher: e.teacher.clone(),
                    day: e.day,
                    period: e.period,
                });
            }
        }
        Ok(())
    }

    pub fn entries(&self) -> &[TimetableEntry] {
        &self.entries
    }

    pub fn for_day(&self, day: Weekday) -> impl Iterator<Item = &TimetableEntry> + '_ {
        self.entries.iter().filter(move |e| e.day == day)
    }

    /// Enseignants distincts, dans l'ordre d'apparition.
    pub fn teachers(&self) -> Vec<(&str, Domain)> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .filter(|e| seen.insert(e.teacher.as_str()))
            .map(|e| (e.teacher.as_str(), e.domain))
            .collect()
    }
}

/// Portée d'une absence sur la journée.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbsenceScope {
    Full,
    FirstHalf,
    SecondHalf,
}

impl AbsenceScope {
    /// Périodes de l'absent qui doivent être remplacées.
    ///
    /// Une absence "1st half" ne couvre que les périodes 5 à 8, une absence
    /// "2nd half" les périodes 1 à 4 ; l'autre moitié reste sur l'emploi du
    /// temps de l'enseignant.
    pub fn covers(&self, period: u8) -> bool {
        match self {
            AbsenceScope::Full => true,
            AbsenceScope::FirstHalf => (5..=8).contains(&period),
            AbsenceScope::SecondHalf => (1..=4).contains(&period),
        }
    }
}

impl FromStr for AbsenceScope {
    type Err = ArrangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" | "full day" => Ok(AbsenceScope::Full),
            "1st half" | "first half" | "first" => Ok(AbsenceScope::FirstHalf),
            "2nd half" | "second half" | "second" => Ok(AbsenceScope::SecondHalf),
            _ => Err(ArrangeError::UnknownScope(s.to_string())),
        }
    }
}

/// Déclaration d'absence pour la journée à arranger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsenceDeclaration {
    pub teacher: String,
    pub scope: AbsenceScope,
    #[serde(default)]
    pub reason: String,
}

impl AbsenceDeclaration {
    pub fn new<T: Into<String>, R: Into<String>>(
        teacher: T,
        scope: AbsenceScope,
        reason: R,
    ) -> Self {
        Self {
            teacher: teacher.into(),
            scope,
            reason: reason.into(),
        }
    }
}

/// Mode de journée : quelles périodes arranger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayMode {
    FullDay,
    HalfDay,
    Custom(Vec<u8>),
}

impl DayMode {
    pub fn periods(&self) -> BTreeSet<u8> {
        match self {
            DayMode::FullDay => (1..=PERIODS_PER_DAY).collect(),
            DayMode::HalfDay => (1..=4).collect(),
            DayMode::Custom(list) => list.iter().copied().collect(),
        }
    }
}

/// Palier de recherche qui a produit un remplaçant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateTier {
    /// Enseignants libres sous le seuil de charge.
    Primary,
    /// Seuil de charge ignoré, faute de candidat au palier principal.
    Relaxed,
}

/// Ligne d'affectation (plate) produite par le moteur.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub absent_teacher: String,
    pub period: u8,
    pub class_assigned: String,
    /// `None` : aucun remplaçant disponible, trou à combler à la main.
    pub substitute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<CandidateTier>,
}

/// Candidats classés pour une période, en vue d'une reprise manuelle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub absent_teacher: String,
    pub period: u8,
    pub class_assigned: String,
    pub candidates: Vec<String>,
}

/// Cellule remplie du tableau : remplaçant et classe couverte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cover {
    pub substitute: String,
    pub class_assigned: String,
}

impl fmt::Display for Cover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.substitute, self.class_assigned)
    }
}

/// Une ligne par enseignant absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrangementRow {
    pub absent_teacher: String,
    pub reason: String,
    /// Alignées sur `ArrangementTable::periods`.
    pub cells: Vec<Option<Cover>>,
}

/// Tableau pivoté : absents en lignes, périodes demandées en colonnes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArrangementTable {
    pub periods: Vec<u8>,
    pub rows: Vec<ArrangementRow>,
}

impl ArrangementTable {
    pub fn find_row(&self, absent_teacher: &str) -> Option<&ArrangementRow> {
        self.rows.iter().find(|r| r.absent_teacher == absent_teacher)
    }

    pub fn find_row_mut(&mut self, absent_teacher: &str) -> Option<&mut ArrangementRow> {
        self.rows.iter_mut().find(|r| r.absent_teacher == absent_teacher)
    }

    pub fn column_of(&self, period: u8) -> Option<usize> {
        self.periods.iter().position(|p| *p == period)
    }

    pub fn cell(&self, absent_teacher: &str, period: u8) -> Option<&Cover> {
        let col = self.column_of(period)?;
        self.find_row(absent_teacher)?.cells.get(col)?.as_ref()
    }

    /// Texte d'une cellule : `"<remplaçant> (<classe>)"` ou vide.
    pub fn cell_text(&self, absent_teacher: &str, period: u8) -> String {
        self.cell(absent_teacher, period)
            .map(Cover::to_string)
            .unwrap_or_default()
    }

    pub fn header(&self) -> Vec<String> {
        let mut out = vec!["Absent Teacher".to_string(), "Reason".to_string()];
        out.extend(self.periods.iter().map(|p| format!("Period {p}")));
        out
    }

    /// Lignes textuelles, dans l'ordre de `header()`.
    pub fn records(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                let mut rec = vec![row.absent_teacher.clone(), row.reason.clone()];
                rec.extend(
                    row.cells
                        .iter()
                        .map(|c| c.as_ref().map(Cover::to_string).unwrap_or_default()),
                );
                rec
            })
            .collect()
    }
}

/// Résultat complet d'une génération.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arrangement {
    pub assignments: Vec<Assignment>,
    pub table: ArrangementTable,
    pub suggestions: Vec<Suggestion>,
}

impl Arrangement {
    /// Périodes restées sans remplaçant.
    pub fn gaps(&self) -> impl Iterator<Item = &Assignment> + '_ {
        self.assignments.iter().filter(|a| a.substitute.is_none())
    }
}
