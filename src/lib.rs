#![forbid(unsafe_code)]
//! Arrangement : affectation de remplaçants pour les périodes des enseignants
//! absents, à partir d'un emploi du temps hebdomadaire (sans BD).
//!
//! - Import CSV (emploi du temps par enseignant, absences).
//! - Moteur glouton : domaine prioritaire, seuil de charge, palier relâché.
//! - Suggestions classées, reprise manuelle, rapport de conflits.
//! - Historique JSON, une entrée par date.

pub mod io;
pub mod model;
pub mod scheduler;
pub mod storage;

pub use model::{
    parse_day, AbsenceDeclaration, AbsenceScope, Arrangement, ArrangementRow, ArrangementTable,
    Assignment, CandidateTier, Cover, DayMode, Domain, Suggestion, Timetable, TimetableEntry,
};
pub use scheduler::{
    apply_override, detect_conflicts, pivot, substitute_load, ArrangeError, ArrangeOptions,
    ArrangementRequest, Arranger, Conflict,
};
pub use storage::{ArrangementLog, JsonStorage, LogEntry, Source, Storage};
