use super::ArrangeError;
use crate::model::{ArrangementTable, Cover, Suggestion};

/// Remplace (ou vide) la cellule d'un absent pour une période, en se limitant
/// aux candidats suggérés pour ce créneau.
pub fn apply_override(
    table: &mut ArrangementTable,
    suggestions: &[Suggestion],
    absent_teacher: &str,
    period: u8,
    substitute: Option<&str>,
) -> Result<(), ArrangeError> {
    let Some(col) = table.column_of(period) else {
        return Err(ArrangeError::OverrideInvalid("period not in arrangement"));
    };
    let suggestion = suggestions
        .iter()
        .find(|s| s.absent_teacher == absent_teacher && s.period == period)
        .ok_or(ArrangeError::OverrideInvalid("no suggestion for this period"))?;

    let cover = match substitute.map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) => {
            if !suggestion.candidates.iter().any(|c| c == name) {
                return Err(ArrangeError::OverrideInvalid(
                    "substitute not among suggestions",
                ));
            }
            Some(Cover {
                substitute: name.to_string(),
                class_assigned: suggestion.class_assigned.clone(),
            })
        }
        None => None,
    };

    let row = table
        .find_row_mut(absent_teacher)
        .ok_or_else(|| ArrangeError::UnknownRow(absent_teacher.to_string()))?;
    let slot = row
        .cells
        .get_mut(col)
        .ok_or(ArrangeError::OverrideInvalid("row shorter than period columns"))?;
    *slot = cover;
    Ok(())
}
