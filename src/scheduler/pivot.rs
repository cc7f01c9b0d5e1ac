use crate::model::{AbsenceDeclaration, ArrangementRow, ArrangementTable, Assignment, Cover};
use std::collections::{BTreeMap, BTreeSet};

/// Pivote les affectations : une ligne par absent (ordre alphabétique), une
/// colonne par période demandée, plus le motif déclaré.
///
/// Fonction pure ; seuls les absents ayant au moins une affectation
/// apparaissent.
pub fn pivot(
    assignments: &[Assignment],
    absences: &[AbsenceDeclaration],
    periods: &BTreeSet<u8>,
) -> ArrangementTable {
    let columns: Vec<u8> = periods.iter().copied().collect();
    let mut rows: BTreeMap<&str, Vec<Option<Cover>>> = BTreeMap::new();

    for a in assignments {
        let Some(col) = columns.iter().position(|p| *p == a.period) else {
            continue;
        };
        let cells = rows
            .entry(a.absent_teacher.as_str())
            .or_insert_with(|| vec![None; columns.len()]);
        cells[col] = a.substitute.as_ref().map(|s| Cover {
            substitute: s.clone(),
            class_assigned: a.class_assigned.clone(),
        });
    }

    let rows = rows
        .into_iter()
        .map(|(teacher, cells)| ArrangementRow {
            absent_teacher: teacher.to_string(),
            reason: absences
                .iter()
                .find(|d| d.teacher == teacher)
                .map(|d| d.reason.clone())
                .unwrap_or_default(),
            cells,
        })
        .collect();

    ArrangementTable {
        periods: columns,
        rows,
    }
}
