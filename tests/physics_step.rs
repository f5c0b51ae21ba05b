mod common;

use common::{step_world, WorldBuilder};
use particle_core::physics::reflect_axis;
use particle_core::{ConfigSnapshot, WorkerPool};

/// No damping, no walls, no gravity, 100×100 domain.
fn inert_config() -> ConfigSnapshot {
    ConfigSnapshot {
        bounds_width: 100.0,
        bounds_height: 100.0,
        time_scale: 1.0,
        viscosity: 0.0,
        wall_repel: 0.0,
        wall_strength: 0.0,
        gravity_x: 0.0,
        gravity_y: 0.0,
        ..Default::default()
    }
}

#[test]
fn test_reflection_at_low_bound() {
    assert_eq!(reflect_axis(-5.0, 3.0, 100.0), (5.0, -3.0));
    assert_eq!(reflect_axis(50.0, 3.0, 100.0), (50.0, 3.0));
}

#[test]
fn test_step_reflects_at_both_walls() {
    let pool = WorkerPool::unstarted();
    let mut world = WorldBuilder::new()
        .with_group(2, 0.0)
        .with_particle(0, -8.0, 50.0, 3.0, 0.0)
        .with_particle(1, 98.0, 99.0, 5.0, 4.0)
        .build();

    step_world(&mut world, &inert_config(), &pool);

    assert_close!(world.x[0], 5.0);
    assert_close!(world.vx[0], -3.0);
    assert_close!(world.y[0], 50.0);

    assert_close!(world.x[1], 97.0);
    assert_close!(world.vx[1], -5.0);
    assert_close!(world.y[1], 97.0);
    assert_close!(world.vy[1], -4.0);
}

#[test]
fn test_huge_displacement_stays_in_domain() {
    let pool = WorkerPool::unstarted();
    let mut world = WorldBuilder::new()
        .with_group(1, 0.0)
        .with_particle(0, 50.0, 50.0, 1000.0, -1000.0)
        .build();
    step_world(&mut world, &inert_config(), &pool);
    assert!((0.0..=100.0).contains(&world.x[0]));
    assert!((0.0..=100.0).contains(&world.y[0]));
    assert_close!(world.vx[0], -1000.0);
    assert_close!(world.vy[0], 1000.0);
}

#[test]
fn test_gravity_only_step() {
    let pool = WorkerPool::unstarted();
    let config = ConfigSnapshot {
        gravity_y: 1.0,
        ..inert_config()
    };
    let mut world = WorldBuilder::new()
        .with_group(1, 0.0)
        .with_particle(0, 50.0, 50.0, 0.0, 0.0)
        .build();

    step_world(&mut world, &config, &pool);

    assert_eq!(world.vy[0], 1.0);
    assert_eq!(world.y[0], 51.0);
    assert_eq!(world.vx[0], 0.0);
    assert_eq!(world.x[0], 50.0);
}

#[test]
fn test_viscosity_damps_velocity() {
    let pool = WorkerPool::unstarted();
    let config = ConfigSnapshot {
        viscosity: 0.5,
        ..inert_config()
    };
    let mut world = WorldBuilder::new()
        .with_group(1, 0.0)
        .with_particle(0, 20.0, 20.0, 10.0, 0.0)
        .build();
    step_world(&mut world, &config, &pool);
    assert_eq!(world.vx[0], 5.0);
    assert_eq!(world.x[0], 25.0);
}

#[test]
fn test_pair_force_follows_rule_sign() {
    let pool = WorkerPool::unstarted();
    let mut world = WorldBuilder::new()
        .with_group(2, 400.0)
        .with_rule(0, 0, 1.0)
        .with_particle(0, 40.0, 50.0, 0.0, 0.0)
        .with_particle(1, 50.0, 50.0, 0.0, 0.0)
        .build();

    step_world(&mut world, &inert_config(), &pool);

    // f = rule / d · (p_i − p_j): a positive rule pushes the pair apart
    assert_close!(world.vx[0], -1.0, 0.01);
    assert_close!(world.vx[1], 1.0, 0.01);
    assert_close!(world.vy[0], 0.0);
}

#[test]
fn test_no_force_beyond_radius() {
    let pool = WorkerPool::unstarted();
    let mut world = WorldBuilder::new()
        .with_group(2, 99.0)
        .with_rule(0, 0, 1.0)
        .with_particle(0, 40.0, 50.0, 0.0, 0.0)
        .with_particle(1, 50.0, 50.0, 0.0, 0.0)
        .build();
    step_world(&mut world, &inert_config(), &pool);
    assert_eq!(world.vx[0], 0.0);
    assert_eq!(world.vx[1], 0.0);
}

#[test]
fn test_disabled_group_is_inert() {
    let pool = WorkerPool::unstarted();
    let config = ConfigSnapshot {
        gravity_y: 1.0,
        wall_repel: 40.0,
        wall_strength: 0.1,
        ..inert_config()
    };
    let mut world = WorldBuilder::new()
        .with_group(1, 400.0)
        .with_group(1, 400.0)
        .with_disabled(1)
        .with_rule(0, 1, 1.0)
        .with_rule(1, 0, 1.0)
        .with_particle(0, 45.0, 50.0, 0.0, 0.0)
        .with_particle(1, 50.0, 50.0, 0.0, 0.0)
        .build();

    step_world(&mut world, &config, &pool);

    // disabled particle feels nothing
    assert_eq!((world.vx[1], world.vy[1]), (0.0, 0.0));
    assert_eq!((world.x[1], world.y[1]), (50.0, 50.0));
    // and exerts nothing: only gravity acts on the enabled one
    assert_eq!(world.vx[0], 0.0);
    assert_eq!(world.vy[0], 1.0);
}

#[test]
fn test_thread_count_does_not_change_result() {
    let config = ConfigSnapshot {
        bounds_width: 600.0,
        bounds_height: 600.0,
        ..Default::default()
    };
    let builder = || {
        WorldBuilder::new()
            .with_group(1500, 1600.0)
            .with_group(1500, 900.0)
            .with_rule(0, 0, -0.3)
            .with_rule(0, 1, 0.5)
            .with_rule(1, 0, -0.8)
            .with_rule(1, 1, 0.2)
            .scattered(600.0, 600.0, 11)
            .build()
    };

    let mut serial = builder();
    let mut parallel = builder();
    let single = WorkerPool::new(1).unwrap();
    let quad = WorkerPool::new(4).unwrap();

    for _ in 0..5 {
        step_world(&mut serial, &config, &single);
        step_world(&mut parallel, &config, &quad);
    }

    assert_eq!(serial.x, parallel.x);
    assert_eq!(serial.y, parallel.y);
    assert_eq!(serial.vx, parallel.vx);
    assert_eq!(serial.vy, parallel.vy);
}
