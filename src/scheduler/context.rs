use std::collections::{HashMap, HashSet};

/// État propre à une génération : compteur d'affectations par remplaçant et
/// occupation (remplaçant, période). Jamais partagé entre deux appels.
#[derive(Debug, Default)]
pub(super) struct RunContext {
    counts: HashMap<String, usize>,
    occupied: HashSet<(String, u8)>,
}

impl RunContext {
    pub(super) fn count(&self, teacher: &str) -> usize {
        self.counts.get(teacher).copied().unwrap_or(0)
    }

    pub(super) fn is_occupied(&self, teacher: &str, period: u8) -> bool {
        self.occupied.contains(&(teacher.to_string(), period))
    }

    pub(super) fn commit(&mut self, teacher: &str, period: u8) {
        self.occupied.insert((teacher.to_string(), period));
        *self.counts.entry(teacher.to_string()).or_insert(0) += 1;
    }
}
