/// Asserts that group ranges are sorted, contiguous and cover every particle,
/// and that the particle→group lookup agrees with them.
#[macro_export]
macro_rules! assert_partitioned {
    ($world:expr) => {
        let world = &$world;
        assert!(world.is_partitioned(), "Group ranges do not partition the particles");
        for (g, r) in world.ranges().iter().enumerate() {
            for i in r.start..r.end {
                assert_eq!(world.group_of(i), g, "Particle {} mapped to wrong group", i);
            }
        }
    };
}

/// Asserts two floats are within `eps` of each other.
#[macro_export]
macro_rules! assert_close {
    ($a:expr, $b:expr) => {
        let (a, b) = ($a as f64, $b as f64);
        assert!((a - b).abs() <= 1e-4, "{} is not within 1e-4 of {}", a, b);
    };
    ($a:expr, $b:expr, $eps:expr) => {
        let (a, b) = ($a as f64, $b as f64);
        assert!((a - b).abs() <= $eps, "{} is not within {} of {}", a, $eps, b);
    };
}
