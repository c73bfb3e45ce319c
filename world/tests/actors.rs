use std::time::Duration;

use glam::Vec2;
use portal_runner_core::{
    ActorBlueprint, ActorId, ActorKind, ActorState, ActorStats, ClonePolicy, Command, Event,
    Lineage, SoundCue, BLINK_DURATION, DEATH_ANIMATION,
};
use portal_runner_world::{self as world, query, World};

fn blueprint(kind: ActorKind, lineage: Lineage, spawn_time: Duration) -> ActorBlueprint {
    ActorBlueprint {
        kind,
        position: Vec2::new(200.0, 200.0),
        lineage,
        spawn_time,
        stats: ActorStats::new(0.0, 2, 1),
        policy: ClonePolicy::default(),
        facing: None,
        blink: false,
    }
}

fn spawn(world: &mut World, blueprint: ActorBlueprint) -> (ActorId, Vec<Event>) {
    let mut events = Vec::new();
    world::apply(world, Command::SpawnActor { blueprint }, &mut events);
    let actor = events
        .iter()
        .find_map(|event| match event {
            Event::ActorSpawned { actor, .. } => Some(*actor),
            _ => None,
        })
        .expect("actor spawned");
    (actor, events)
}

fn run(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    events
}

#[test]
fn blinking_clones_request_indicator_and_sound() {
    let mut world = World::new();
    let mut clone = blueprint(
        ActorKind::Chaser,
        Lineage::Clone {
            parent: ActorId::new(9),
        },
        Duration::ZERO,
    );
    clone.blink = true;

    let (actor, events) = spawn(&mut world, clone);

    assert!(events.contains(&Event::BlinkStarted {
        actor,
        duration: BLINK_DURATION,
    }));
    assert_eq!(
        events.last(),
        Some(&Event::SoundCue {
            cue: SoundCue::Spawn
        })
    );
    let snapshot = query::actor(&world, actor).expect("actor exists");
    assert_eq!(snapshot.lineage.parent(), Some(ActorId::new(9)));
}

#[test]
fn eviction_is_soft_until_the_death_animation_ends() {
    let mut world = World::new();
    let (actor, _) = spawn(
        &mut world,
        blueprint(ActorKind::Wanderer, Lineage::Original, Duration::from_millis(10)),
    );

    let events = run(&mut world, Command::EvictActor { actor });
    assert_eq!(
        events,
        vec![
            Event::ActorEvicted {
                actor,
                spawn_time: Duration::from_millis(10),
            },
            Event::DeathAnimationStarted { actor },
            Event::SoundCue {
                cue: SoundCue::Death
            },
        ]
    );

    let snapshot = query::actor(&world, actor).expect("dying actor is still grouped");
    assert!(!snapshot.body_enabled);
    assert!(matches!(snapshot.state, ActorState::Dying { .. }));
    assert!(query::roster(&world).is_empty());
    assert_eq!(query::grouped_actor_count(&world), 1);

    assert!(run(&mut world, Command::EvictActor { actor }).is_empty());

    let first_half = run(
        &mut world,
        Command::Tick {
            dt: DEATH_ANIMATION / 2,
        },
    );
    assert!(!first_half.contains(&Event::ActorDespawned { actor }));

    let second_half = run(
        &mut world,
        Command::Tick {
            dt: DEATH_ANIMATION / 2,
        },
    );
    assert!(second_half.contains(&Event::ActorDespawned { actor }));
    assert_eq!(query::grouped_actor_count(&world), 0);
}

#[test]
fn clones_expire_after_their_lifetime() {
    let mut world = World::new();
    let mut clone = blueprint(
        ActorKind::Chaser,
        Lineage::Clone {
            parent: ActorId::new(0),
        },
        Duration::ZERO,
    );
    clone.policy.clone_lifetime = Some(Duration::from_millis(300));
    let (actor, _) = spawn(&mut world, clone);

    let update = Command::UpdateActor {
        actor,
        player: Vec2::ZERO,
        dt: Duration::from_millis(100),
    };

    let _ = run(
        &mut world,
        Command::Tick {
            dt: Duration::from_millis(200),
        },
    );
    assert!(run(&mut world, update.clone()).is_empty());

    let _ = run(
        &mut world,
        Command::Tick {
            dt: Duration::from_millis(100),
        },
    );
    let events = run(&mut world, update);
    assert_eq!(events.first(), Some(&Event::ActorExpired { actor }));
    assert!(query::roster(&world).is_empty());
}

#[test]
fn originals_never_expire() {
    let mut world = World::new();
    let mut original = blueprint(ActorKind::Chaser, Lineage::Original, Duration::ZERO);
    original.policy.clone_lifetime = Some(Duration::from_millis(1));
    let (actor, _) = spawn(&mut world, original);

    let _ = run(
        &mut world,
        Command::Tick {
            dt: Duration::from_secs(10),
        },
    );
    let events = run(
        &mut world,
        Command::UpdateActor {
            actor,
            player: Vec2::ZERO,
            dt: Duration::from_millis(16),
        },
    );
    assert!(events.is_empty());
    assert_eq!(query::roster(&world).len(), 1);
}

#[test]
fn chasers_steer_toward_a_nearby_player() {
    let mut world = World::new();
    let mut chaser = blueprint(ActorKind::Chaser, Lineage::Original, Duration::ZERO);
    chaser.policy.chase_radius = 500.0;
    chaser.policy.chase_speed = 100.0;
    let (actor, _) = spawn(&mut world, chaser);

    let _ = run(
        &mut world,
        Command::UpdateActor {
            actor,
            player: Vec2::new(400.0, 200.0),
            dt: Duration::from_millis(500),
        },
    );

    let snapshot = query::actor(&world, actor).expect("actor exists");
    assert!((snapshot.position - Vec2::new(250.0, 200.0)).length() < 1e-3);
    assert!((snapshot.velocity - Vec2::new(100.0, 0.0)).length() < 1e-3);
}

#[test]
fn cloning_triggers_once_per_actor() {
    let mut world = World::new();
    let mut chaser = blueprint(ActorKind::Chaser, Lineage::Original, Duration::ZERO);
    chaser.policy = ActorKind::Chaser.default_template().policy;
    let (actor, _) = spawn(&mut world, chaser);

    let update = Command::UpdateActor {
        actor,
        player: Vec2::new(210.0, 200.0),
        dt: Duration::ZERO,
    };
    let first = run(&mut world, update.clone());
    let parent = match first.as_slice() {
        [Event::CloneRequested { parent }] => parent.clone(),
        other => panic!("unexpected events: {other:?}"),
    };
    assert_eq!(parent.id, actor);
    assert!(parent.cloned);

    assert!(run(&mut world, update).is_empty());
}

#[test]
fn clones_respect_the_recursive_cloning_flag() {
    let mut world = World::new();
    let mut clone = blueprint(
        ActorKind::Chaser,
        Lineage::Clone {
            parent: ActorId::new(0),
        },
        Duration::ZERO,
    );
    clone.policy = ActorKind::Chaser.default_template().policy;
    clone.policy.clones_can_clone = false;
    let (barren, _) = spawn(&mut world, clone.clone());
    clone.policy.clones_can_clone = true;
    let (fertile, _) = spawn(&mut world, clone);

    let near = Vec2::new(205.0, 200.0);
    let barren_events = run(
        &mut world,
        Command::UpdateActor {
            actor: barren,
            player: near,
            dt: Duration::ZERO,
        },
    );
    let fertile_events = run(
        &mut world,
        Command::UpdateActor {
            actor: fertile,
            player: near,
            dt: Duration::ZERO,
        },
    );

    assert!(barren_events.is_empty());
    assert!(matches!(
        fertile_events.as_slice(),
        [Event::CloneRequested { .. }]
    ));
}

#[test]
fn lethal_damage_kills_once() {
    let mut world = World::new();
    let (actor, _) = spawn(
        &mut world,
        blueprint(ActorKind::Brute, Lineage::Original, Duration::ZERO),
    );

    assert!(run(&mut world, Command::DamageActor { actor, amount: 1 }).is_empty());
    let lethal = run(&mut world, Command::DamageActor { actor, amount: 5 });
    assert_eq!(lethal.first(), Some(&Event::ActorKilled { actor }));
    assert!(run(&mut world, Command::DamageActor { actor, amount: 5 }).is_empty());
}

#[test]
fn teardown_empties_the_roster_and_rejects_spawns() {
    let mut world = World::new();
    let _ = spawn(
        &mut world,
        blueprint(ActorKind::Wanderer, Lineage::Original, Duration::ZERO),
    );
    let _ = run(
        &mut world,
        Command::SpawnKey {
            position: Vec2::ONE,
        },
    );

    let events = run(&mut world, Command::TearDownScene);
    assert_eq!(events, vec![Event::SceneTornDown]);
    assert!(query::roster(&world).is_empty());
    assert!(query::keys(&world).is_empty());

    let rejected = run(
        &mut world,
        Command::SpawnActor {
            blueprint: blueprint(ActorKind::Wanderer, Lineage::Original, Duration::ZERO),
        },
    );
    assert!(rejected.is_empty());
    assert!(run(&mut world, Command::TearDownScene).is_empty());
}

#[test]
fn keys_are_collected_once() {
    let mut world = World::new();
    let spawned = run(
        &mut world,
        Command::SpawnKey {
            position: Vec2::new(5.0, 6.0),
        },
    );
    let key = match spawned.as_slice() {
        [Event::KeySpawned { key, .. }] => *key,
        other => panic!("unexpected events: {other:?}"),
    };
    assert_eq!(query::keys(&world).len(), 1);

    assert_eq!(
        run(&mut world, Command::CollectKey { key }),
        vec![Event::KeyCollected { key }]
    );
    assert!(run(&mut world, Command::CollectKey { key }).is_empty());
}
