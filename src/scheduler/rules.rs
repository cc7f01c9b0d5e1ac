//! Tables de règles du moteur : créneaux non enseignants, niveaux de classe
//! et ordre de priorité des domaines.

use crate::model::Domain;
use serde::{Deserialize, Serialize};

/// Libellés qui ne désignent pas un cours (période libre de fait).
pub const NON_TEACHING_SLOTS: &[&str] = &["CCA", "LIB", "LIBRARY", "P.E.", "SPORTS"];

const ROMAN_LEVELS: &[(&str, u8)] = &[
    ("I", 1),
    ("II", 2),
    ("III", 3),
    ("IV", 4),
    ("V", 5),
    ("VI", 6),
    ("VII", 7),
    ("VIII", 8),
    ("IX", 9),
    ("X", 10),
    ("XI", 11),
    ("XII", 12),
];

/// Vrai pour un libellé absent, vide ou sentinelle non enseignante.
pub fn is_free_slot(class: Option<&str>) -> bool {
    match class.map(str::trim) {
        None | Some("") => true,
        Some(label) => is_non_teaching(label),
    }
}

pub fn is_non_teaching(label: &str) -> bool {
    let label = label.trim();
    NON_TEACHING_SLOTS
        .iter()
        .any(|s| s.eq_ignore_ascii_case(label))
}

/// Niveau (1..=12) d'une classe d'après son premier token en chiffres romains
/// ("VI", "ix B", "XII-Sci").
pub fn class_level(label: &str) -> Option<u8> {
    let first = label
        .split(|c: char| c.is_whitespace() || c == '-')
        .find(|t| !t.is_empty())?
        .to_ascii_uppercase();
    ROMAN_LEVELS
        .iter()
        .find(|(roman, _)| *roman == first)
        .map(|(_, level)| *level)
}

/// Cycle visé par une classe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetDomain {
    Primary,
    Secondary,
    SeniorSecondary,
}

impl TargetDomain {
    pub fn from_level(level: u8) -> Self {
        match level {
            0..=5 => TargetDomain::Primary,
            6..=10 => TargetDomain::Secondary,
            _ => TargetDomain::SeniorSecondary,
        }
    }

    /// Ordre de recherche des domaines ; le premier non vide l'emporte.
    pub fn priority(&self) -> &'static [Domain] {
        match self {
            TargetDomain::SeniorSecondary => &[Domain::Pgt, Domain::Principal, Domain::Misc],
            TargetDomain::Secondary => &[Domain::Tgt, Domain::Misc, Domain::Pgt, Domain::Principal],
            TargetDomain::Primary => &[Domain::Prt, Domain::Misc, Domain::Principal],
        }
    }
}
