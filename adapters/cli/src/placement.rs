use glam::Vec2;
use portal_runner_core::PlacementError;
use portal_runner_system_population::Placement;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const EDGE_MARGIN: f32 = 24.0;
const ENEMY_CLEARANCE: f32 = 180.0;
const MAX_ATTEMPTS: u32 = 16;

/// Placement service that scatters entities uniformly across the arena.
///
/// Enemies keep a clearance around the reference position so they never
/// appear on top of the player.
#[derive(Debug)]
pub(crate) struct ScatterPlacement {
    rng: ChaCha8Rng,
    arena: Vec2,
}

impl ScatterPlacement {
    pub(crate) fn new(seed: u64, arena: Vec2) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            arena,
        }
    }

    fn scatter(
        &mut self,
        subject: &str,
        reference: Vec2,
        clearance: f32,
    ) -> Result<Vec2, PlacementError> {
        let max = self.arena - Vec2::splat(EDGE_MARGIN);
        if max.x <= EDGE_MARGIN || max.y <= EDGE_MARGIN {
            return Err(PlacementError::Unavailable);
        }

        for _ in 0..MAX_ATTEMPTS {
            let candidate = Vec2::new(
                self.rng.gen_range(EDGE_MARGIN..max.x),
                self.rng.gen_range(EDGE_MARGIN..max.y),
            );
            if candidate.distance(reference) >= clearance {
                return Ok(candidate);
            }
        }

        Err(PlacementError::NoFreeSpot {
            subject: subject.to_owned(),
            attempts: MAX_ATTEMPTS,
        })
    }
}

impl Placement for ScatterPlacement {
    fn place_enemy(&mut self, kind: &str, reference: Vec2) -> Result<Vec2, PlacementError> {
        self.scatter(kind, reference, ENEMY_CLEARANCE)
    }

    fn place_key(&mut self, reference: Vec2) -> Result<Vec2, PlacementError> {
        self.scatter("key", reference, 0.0)
    }
}
