use crate::model::{AbsenceDeclaration, DayMode, PERIODS_PER_DAY};
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Options d'arrangement
#[derive(Debug, Clone, Copy)]
pub struct ArrangeOptions {
    /// Un enseignant à `tpod >= max_tpod` n'est retenu qu'au palier relâché.
    pub max_tpod: u32,
    pub max_suggestions: usize,
}

impl Default for ArrangeOptions {
    fn default() -> Self {
        Self {
            max_tpod: 7,
            max_suggestions: 5,
        }
    }
}

/// Demande de génération pour une journée.
#[derive(Debug, Clone)]
pub struct ArrangementRequest {
    pub day: Weekday,
    pub periods: BTreeSet<u8>,
    pub absences: Vec<AbsenceDeclaration>,
}

impl ArrangementRequest {
    pub fn new(day: Weekday, periods: BTreeSet<u8>, absences: Vec<AbsenceDeclaration>) -> Self {
        Self {
            day,
            periods,
            absences,
        }
    }

    pub fn with_mode(day: Weekday, mode: &DayMode, absences: Vec<AbsenceDeclaration>) -> Self {
        Self::new(day, mode.periods(), absences)
    }

    pub(super) fn validate(&self) -> Result<(), ArrangeError> {
        if let Some(p) = self
            .periods
            .iter()
            .find(|p| !(1..=PERIODS_PER_DAY).contains(*p))
        {
            return Err(ArrangeError::InvalidPeriod(*p));
        }
        let mut seen = BTreeSet::new();
        for absence in &self.absences {
            if absence.teacher.trim().is_empty() {
                return Err(ArrangeError::EmptyTeacher);
            }
            if !seen.insert(absence.teacher.as_str()) {
                return Err(ArrangeError::DuplicateAbsence(absence.teacher.clone()));
            }
        }
        Ok(())
    }
}

/// Double affectation d'un remplaçant sur une même période.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub period: u8,
    pub substitute: String,
    pub first_absent: String,
    pub also_absent: String,
}

#[derive(Error, Debug)]
pub enum ArrangeError {
    #[error("invalid period {0}: expected 1..=8")]
    InvalidPeriod(u8),
    #[error("empty teacher name")]
    EmptyTeacher,
    #[error("duplicate timetable entry for {teacher} on {day} period {period}")]
    DuplicateEntry {
        teacher: String,
        day: Weekday,
        period: u8,
    },
    #[error("absence declared twice for {0}")]
    DuplicateAbsence(String),
    #[error("timetable has no entries for {0}")]
    NoEntriesForDay(Weekday),
    #[error("unknown day: {0}")]
    UnknownDay(String),
    #[error("unknown absence scope: {0}")]
    UnknownScope(String),
    #[error("no arrangement row for {0}")]
    UnknownRow(String),
    #[error("override invalid: {0}")]
    OverrideInvalid(&'static str),
}
