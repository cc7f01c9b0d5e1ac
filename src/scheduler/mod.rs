mod assignment;
mod conflicts;
mod context;
mod mutate;
mod pivot;
pub mod rules;
mod types;
mod util;

pub use conflicts::{detect_conflicts, substitute_load};
pub use mutate::apply_override;
pub use pivot::pivot;
pub use types::{ArrangeError, ArrangeOptions, ArrangementRequest, Conflict};

use crate::model::{Arrangement, Timetable};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Arranger : moteur d'affectation des remplaçants sur un emploi du temps.
///
/// Chaque appel à [`Arranger::generate`] part d'un état vierge (compteurs et
/// occupation locaux à l'appel) ; un même `Arranger` peut servir plusieurs
/// générations indépendantes.
#[derive(Debug, Default)]
pub struct Arranger {
    timetable: Timetable,
}

impl Arranger {
    pub fn new(timetable: Timetable) -> Self {
        Self { timetable }
    }

    pub fn timetable(&self) -> &Timetable {
        &self.timetable
    }

    /// Génère tableau et suggestions ; `rng` ne sert qu'à départager les
    /// candidats à égalité de charge.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        request: &ArrangementRequest,
        opts: ArrangeOptions,
        rng: &mut R,
    ) -> Result<Arrangement, ArrangeError> {
        assignment::generate(self, request, opts, rng)
    }

    /// Variante reproductible, graine fixe.
    pub fn generate_seeded(
        &self,
        request: &ArrangementRequest,
        opts: ArrangeOptions,
        seed: u64,
    ) -> Result<Arrangement, ArrangeError> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.generate(request, opts, &mut rng)
    }
}
