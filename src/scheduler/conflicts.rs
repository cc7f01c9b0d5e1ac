use super::Conflict;
use crate::model::ArrangementTable;
use std::collections::HashMap;

pub fn detect_conflicts(table: &ArrangementTable) -> Vec<Conflict> {
    let mut first_seen: HashMap<(&str, u8), &str> = HashMap::new();
    let mut out = Vec::new();

    for row in &table.rows {
        for (period, cell) in table.periods.iter().zip(&row.cells) {
            let Some(cover) = cell else {
                continue;
            };
            let key = (cover.substitute.as_str(), *period);
            match first_seen.get(&key) {
                Some(first) => out.push(Conflict {
                    period: *period,
                    substitute: cover.substitute.clone(),
                    first_absent: first.to_string(),
                    also_absent: row.absent_teacher.clone(),
                }),
                None => {
                    first_seen.insert(key, row.absent_teacher.as_str());
                }
            }
        }
    }

    out
}

/// Nombre de périodes couvertes par remplaçant, charge décroissante puis nom.
pub fn substitute_load(table: &ArrangementTable) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for cover in table.rows.iter().flat_map(|r| r.cells.iter().flatten()) {
        *counts.entry(cover.substitute.as_str()).or_insert(0) += 1;
    }
    let mut out: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(name, n)| (name.to_string(), n))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}
