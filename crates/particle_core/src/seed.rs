use particle_data::{Color, SeedSpec};
use rand::Rng;

/// Random world with `groups` equally sized groups, palette colors, a shared
/// interaction radius and rules drawn uniformly from `[-1, 1]`.
pub fn random_seed_spec<R: Rng>(groups: usize, group_size: usize, radius: f32, rng: &mut R) -> SeedSpec {
    SeedSpec {
        sizes: vec![group_size; groups],
        colors: (0..groups).map(Color::palette).collect(),
        radii2: vec![radius * radius; groups],
        enabled: vec![true; groups],
        rules: (0..groups * groups).map(|_| rng.gen_range(-1.0..=1.0)).collect(),
    }
}
