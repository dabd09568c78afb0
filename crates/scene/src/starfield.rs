use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Seeded generator for a cube of randomly placed star points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarField {
    pub count: u32,
    /// Edge length of the cube the stars are scattered in.
    pub spread: f32,
    pub seed: u64,
}

impl StarField {
    /// Every coordinate is uniform in `[-spread/2, spread/2)`. The same seed
    /// always yields the same positions.
    pub fn generate(&self) -> Vec<[f32; 3]> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        (0..self.count)
            .map(|_| {
                let mut p = [0.0; 3];
                for c in &mut p {
                    *c = (rng.random::<f32>() - 0.5) * self.spread;
                }
                p
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(seed: u64) -> StarField {
        StarField {
            count: 200,
            spread: 20.0,
            seed,
        }
    }

    #[test]
    fn count_and_bounds() {
        let stars = field(1).generate();
        assert_eq!(stars.len(), 200);
        for p in &stars {
            assert!(p.iter().all(|c| (-10.0..10.0).contains(c)));
        }
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        assert_eq!(field(42).generate(), field(42).generate());
        assert_ne!(field(42).generate(), field(43).generate());
    }

    #[test]
    fn stars_fill_the_cube() {
        let stars = field(7).generate();
        let max = stars
            .iter()
            .flatten()
            .fold(0.0f32, |m, c| m.max(c.abs()));
        assert!(max > 8.0);
    }

    #[test]
    fn zero_count_is_empty() {
        let stars = StarField {
            count: 0,
            ..field(0)
        }
        .generate();
        assert!(stars.is_empty());
    }
}
