use super::{
    context::RunContext,
    rules::{self, TargetDomain},
    util, ArrangeError, ArrangeOptions, ArrangementRequest, Arranger,
};
use crate::model::{Arrangement, Assignment, CandidateTier, Suggestion, TimetableEntry};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, info, warn};

pub(super) fn generate<R: Rng + ?Sized>(
    arranger: &Arranger,
    request: &ArrangementRequest,
    opts: ArrangeOptions,
    rng: &mut R,
) -> Result<Arrangement, ArrangeError> {
    request.validate()?;

    let day: Vec<&TimetableEntry> = arranger.timetable.for_day(request.day).collect();
    if day.is_empty() {
        return Err(ArrangeError::NoEntriesForDay(request.day));
    }

    let absent: HashSet<&str> = request
        .absences
        .iter()
        .map(|a| a.teacher.as_str())
        .collect();
    let mut ctx = RunContext::default();
    let mut assignments = Vec::new();
    let mut suggestions = Vec::new();

    for absence in &request.absences {
        let schedule = day.iter().filter(|e| {
            e.teacher == absence.teacher
                && absence.scope.covers(e.period)
                && request.periods.contains(&e.period)
        });

        for entry in schedule {
            let Some(class) = entry.class_label() else {
                continue;
            };
            if rules::is_non_teaching(class) {
                continue;
            }
            let Some(level) = rules::class_level(class) else {
                debug!(
                    teacher = %absence.teacher,
                    period = entry.period,
                    class,
                    "unparseable class label, skipped"
                );
                continue;
            };
            let period = entry.period;
            let target = TargetDomain::from_level(level);

            let (substitute, tier, ranked) =
                match select_candidates(&day, period, &absent, target, opts) {
                    Some((mut ranked, tier)) => {
                        // un seul mélange puis tri stable : l'aléa ne départage que les égalités
                        ranked.shuffle(rng);
                        ranked.sort_by_key(|t| ctx.count(t));
                        let chosen = ranked
                            .iter()
                            .find(|t| !ctx.is_occupied(t, period))
                            .map(|t| t.to_string());
                        (chosen, Some(tier), ranked)
                    }
                    None => (None, None, Vec::new()),
                };

            match &substitute {
                Some(s) => {
                    ctx.commit(s, period);
                    if tier == Some(CandidateTier::Relaxed) {
                        warn!(
                            substitute = %s,
                            period,
                            "committed from relaxed tier (load threshold ignored)"
                        );
                    } else {
                        debug!(absent = %absence.teacher, substitute = %s, period, "committed");
                    }
                }
                None => warn!(absent = %absence.teacher, period, class, "no substitute available"),
            }

            assignments.push(Assignment {
                absent_teacher: absence.teacher.clone(),
                period,
                class_assigned: class.to_string(),
                substitute: substitute.clone(),
                tier: substitute.as_ref().and(tier),
            });
            suggestions.push(Suggestion {
                absent_teacher: absence.teacher.clone(),
                period,
                class_assigned: class.to_string(),
                candidates: ranked
                    .iter()
                    .take(opts.max_suggestions)
                    .map(|t| t.to_string())
                    .collect(),
            });
        }
    }

    let table = super::pivot::pivot(&assignments, &request.absences, &request.periods);
    info!(
        day = %request.day,
        rows = assignments.len(),
        gaps = assignments.iter().filter(|a| a.substitute.is_none()).count(),
        "arrangement generated"
    );

    Ok(Arrangement {
        assignments,
        table,
        suggestions,
    })
}

/// Candidats du premier domaine non vide ; palier relâché si le palier
/// principal est vide sur tout l'ordre de priorité.
fn select_candidates<'a>(
    day: &[&'a TimetableEntry],
    period: u8,
    absent: &HashSet<&str>,
    target: TargetDomain,
    opts: ArrangeOptions,
) -> Option<(Vec<&'a str>, CandidateTier)> {
    let primary = free_pool(day, period, absent, Some(opts.max_tpod));
    if let Some(bucket) = first_bucket(&primary, target) {
        return Some((bucket, CandidateTier::Primary));
    }
    let relaxed = free_pool(day, period, absent, None);
    first_bucket(&relaxed, target).map(|bucket| (bucket, CandidateTier::Relaxed))
}

fn free_pool<'a>(
    day: &[&'a TimetableEntry],
    period: u8,
    absent: &HashSet<&str>,
    max_tpod: Option<u32>,
) -> Vec<&'a TimetableEntry> {
    day.iter()
        .copied()
        .filter(|e| {
            e.period == period
                && !absent.contains(e.teacher.as_str())
                && max_tpod.map_or(true, |max| e.tpod.is_some_and(|t| t < max))
                && rules::is_free_slot(e.class_assigned.as_deref())
        })
        .collect()
}

fn first_bucket<'a>(pool: &[&'a TimetableEntry], target: TargetDomain) -> Option<Vec<&'a str>> {
    target.priority().iter().find_map(|domain| {
        let bucket = util::unique_in_order(
            pool.iter()
                .filter(|e| e.domain == *domain)
                .map(|e| e.teacher.as_str()),
        );
        (!bucket.is_empty()).then_some(bucket)
    })
}
