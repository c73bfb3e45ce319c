use std::time::Duration;

use glam::Vec2;
use portal_runner_core::{
    ActorId, ActorKind, ActorStats, CloneConfig, CloneError, ClonePolicy, Command, Event, Lineage,
};
use portal_runner_system_cloning::{CloneFactory, Cloning};
use portal_runner_world::{self as world, query, World};

fn chaser_policy() -> ClonePolicy {
    ClonePolicy {
        clone_detection_radius: 150.0,
        chase_radius: 0.0,
        chase_speed: 95.0,
        clones_can_clone: false,
        clone_lifetime: Some(Duration::from_millis(5_000)),
        clone_count: 3,
        clone_spawn_delay: Duration::from_millis(200),
    }
}

fn lineage_config() -> CloneConfig {
    CloneConfig {
        kind: "CHASER".to_owned(),
        position: Vec2::new(64.0, 32.0),
        lineage: Lineage::Clone {
            parent: ActorId::new(1),
        },
        spawn_time: Duration::from_millis(1_250),
        stats: ActorStats::new(80.0, 3, 2),
        policy: chaser_policy(),
        facing: Some(std::f32::consts::FRAC_PI_2),
        blink: true,
    }
}

fn pump(world: &mut World, cloning: &mut Cloning, commands: Vec<Command>) -> Vec<Event> {
    let mut pending = commands;
    let mut all_events = Vec::new();
    while !pending.is_empty() {
        let mut events = Vec::new();
        for command in pending.drain(..) {
            world::apply(world, command, &mut events);
        }
        cloning.handle(&events, &mut pending);
        all_events.extend(events);
    }
    all_events
}

#[test]
fn clone_lineage_and_policy_are_propagated_verbatim() {
    let mut world = World::new();
    let config = lineage_config();
    let mut commands = Vec::new();

    let kind = CloneFactory::new()
        .create_clone(&config, &mut commands)
        .expect("chaser is supported");
    assert_eq!(kind, ActorKind::Chaser);
    assert_eq!(commands.len(), 1);

    let mut events = Vec::new();
    for command in commands {
        world::apply(&mut world, command, &mut events);
    }

    let roster = query::roster(&world);
    let clone = roster.iter().next().expect("clone inserted");
    assert_eq!(clone.lineage.parent(), Some(ActorId::new(1)));
    assert!(clone.lineage.is_clone());
    assert_eq!(clone.spawn_time, config.spawn_time);
    assert_eq!(clone.stats, config.stats);
    assert_eq!(clone.policy, config.policy);
    assert_eq!(clone.policy.clone_lifetime, Some(Duration::from_millis(5_000)));
    assert!(!clone.policy.clones_can_clone);
    assert!((clone.velocity - Vec2::new(0.0, 80.0)).length() < 1e-3);
}

#[test]
fn unsupported_kinds_are_dropped_without_commands() {
    let mut config = lineage_config();
    config.kind = "DRAGON".to_owned();
    let mut commands = Vec::new();

    let error = CloneFactory::new()
        .create_clone(&config, &mut commands)
        .expect_err("dragon is not supported");

    assert!(commands.is_empty());
    match error {
        CloneError::UnknownKind(unknown) => assert_eq!(unknown.name(), "DRAGON"),
    }
}

#[test]
fn broods_are_staggered_and_fanned_out() {
    let mut world = World::new();
    let mut cloning = Cloning::new();
    let mut parent = lineage_config();
    parent.lineage = Lineage::Original;
    parent.spawn_time = Duration::ZERO;
    parent.position = Vec2::new(300.0, 300.0);
    parent.facing = Some(0.0);

    let mut spawn = Vec::new();
    CloneFactory::new()
        .create_clone(&parent, &mut spawn)
        .expect("chaser is supported");
    let _ = pump(&mut world, &mut cloning, spawn);
    let parent_id = query::roster(&world)
        .iter()
        .next()
        .map(|actor| actor.id)
        .expect("parent spawned");

    let events = pump(
        &mut world,
        &mut cloning,
        vec![Command::UpdateActor {
            actor: parent_id,
            player: Vec2::new(310.0, 300.0),
            dt: Duration::ZERO,
        }],
    );
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::CloneRequested { .. })));
    assert_eq!(query::roster(&world).len(), 2);
    assert_eq!(cloning.pending(), 2);

    let mut released_at = Vec::new();
    for _ in 0..5 {
        let events = pump(
            &mut world,
            &mut cloning,
            vec![Command::Tick {
                dt: Duration::from_millis(100),
            }],
        );
        for event in events {
            if let Event::ActorSpawned { lineage, .. } = event {
                assert_eq!(lineage, Lineage::Clone { parent: parent_id });
                released_at.push(query::clock(&world));
            }
        }
    }

    assert_eq!(
        released_at,
        vec![Duration::from_millis(200), Duration::from_millis(400)]
    );
    assert_eq!(cloning.pending(), 0);

    let roster = query::roster(&world);
    let clones: Vec<_> = roster
        .iter()
        .filter(|actor| actor.lineage.is_clone())
        .collect();
    assert_eq!(clones.len(), 3);
    assert_eq!(clones[0].spawn_time, Duration::ZERO);
    assert_eq!(clones[1].spawn_time, Duration::from_millis(200));
    assert_eq!(clones[2].spawn_time, Duration::from_millis(400));
    assert!(clones.iter().all(|clone| clone.policy == parent.policy));

    let headings: Vec<f32> = clones
        .iter()
        .map(|clone| clone.velocity.y.atan2(clone.velocity.x))
        .collect();
    let third = std::f32::consts::TAU / 3.0;
    assert!(headings[0].abs() < 1e-3);
    assert!((headings[1] - third).abs() < 1e-3);
    assert!((headings[2] + third).abs() < 1e-3);
}

#[test]
fn teardown_discards_pending_broods() {
    let mut world = World::new();
    let mut cloning = Cloning::new();
    let mut parent = lineage_config();
    parent.lineage = Lineage::Original;
    parent.spawn_time = Duration::ZERO;

    let mut spawn = Vec::new();
    CloneFactory::new()
        .create_clone(&parent, &mut spawn)
        .expect("chaser is supported");
    let _ = pump(&mut world, &mut cloning, spawn);
    let parent_id = query::roster(&world)
        .iter()
        .next()
        .map(|actor| actor.id)
        .expect("parent spawned");

    let _ = pump(
        &mut world,
        &mut cloning,
        vec![Command::UpdateActor {
            actor: parent_id,
            player: parent.position,
            dt: Duration::ZERO,
        }],
    );
    assert_eq!(cloning.pending(), 2);

    let _ = pump(&mut world, &mut cloning, vec![Command::TearDownScene]);
    assert_eq!(cloning.pending(), 0);
}
