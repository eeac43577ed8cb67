use anyhow::{Context, Result};
use log::{debug, info};
use std::collections::HashMap;
use std::time::Duration;

use arcade_physics::{
    presets, BodyBuilder, BodyKind, Callbacks, CollisionTarget, GameLoop, GameObjectId, GridLayer,
    PhysicsEvent, Transform, World, WorldConfig,
};

/// Frames simulated by the headless demo
const DEMO_FRAMES: u32 = 240;

const PLAYER: GameObjectId = GameObjectId(1);

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    info!("Starting arcade physics demo...");

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading world config {}", path))?;
            WorldConfig::from_json(&json).with_context(|| format!("parsing {}", path))?
        }
        None => WorldConfig::default()
            .with_gravity(0.0, 600.0)
            .with_bounds(0.0, 0.0, 800.0, 600.0),
    };

    let mut world = World::new(config)?;
    let mut objects: HashMap<GameObjectId, Transform> = HashMap::new();
    build_scene(&mut world, &mut objects)?;

    let mut game_loop = GameLoop::new();
    for _ in 0..DEMO_FRAMES {
        if !game_loop.run_frame(Duration::from_millis(16), &mut world, &mut objects) {
            continue;
        }

        for event in world.drain_events() {
            match event {
                PhysicsEvent::WorldStep { .. } => {}
                PhysicsEvent::WorldBounds { body, down: true, .. } => {
                    debug!("{:?} reached the floor of the world", body)
                }
                other => debug!("{:?}", other),
            }
        }
    }

    if let Some(player) = objects.get(&PLAYER) {
        info!(
            "Player came to rest at ({:.1}, {:.1}) after {} frames ({:.0} fps simulated)",
            player.x,
            player.y,
            game_loop.frame_count(),
            game_loop.fps()
        );
    }

    world.shutdown();
    Ok(())
}

/// Floor, a player, a bouncing ball, a moving platform, a stack of crates and
/// a small tile map
fn build_scene(world: &mut World, objects: &mut HashMap<GameObjectId, Transform>) -> Result<()> {
    let floor = world.add_body(presets::platform(0.0, 560.0, 800.0, 40.0));

    let player_transform = Transform::new(100.0, 500.0, 32.0, 48.0);
    objects.insert(PLAYER, player_transform);
    let player = world.enable_body(PLAYER, &player_transform, BodyKind::Dynamic);
    if let Some(body) = world.body_mut(player) {
        body.collide_world_bounds = true;
        body.on_collide = true;
    }

    let ball = world.add_body(presets::ball(400.0, 100.0, 12.0, 150.0, 0.0));
    let lift = world.add_body(presets::moving_platform(500.0, 400.0, 120.0, 16.0, -60.0, 0.0));

    let crates = world.create_group(BodyKind::Dynamic);
    for i in 0..3 {
        let crate_body = BodyBuilder::new_dynamic()
            .position(250.0 + i as f32 * 40.0, 300.0)
            .size(32.0, 32.0)
            .collide_world_bounds(true)
            .build();
        let handle = world.add_body(crate_body);
        world.add_to_group(crates, handle)?;
    }

    let ground = vec![
        vec![-1, -1, -1, -1, -1, -1],
        vec![-1, -1, 1, 1, -1, -1],
        vec![1, 1, 1, 1, 1, 1],
    ];
    let mut tiles = GridLayer::from_rows(&ground, 32.0, 32.0).with_origin(600.0, 464.0);
    tiles.set_collision(&[1], true);
    let layer = world.add_tile_layer(tiles);

    let solids = CollisionTarget::Bodies(vec![floor, lift]);
    world.add_collider(player, Some(solids.clone()), Callbacks::none())?;
    world.add_collider(ball, Some(solids.clone()), Callbacks::none())?;
    world.add_collider(crates, Some(solids), Callbacks::none())?;
    world.add_collider(crates, None, Callbacks::none())?;
    world.add_collider(ball, Some(layer.into()), Callbacks::none())?;
    world.add_overlap(
        player,
        Some(crates.into()),
        Callbacks::on_collide(|_, contact| debug!("Player brushed {:?}", contact)),
    )?;

    info!(
        "Scene ready: {} dynamic, {} static bodies",
        world.body_count(),
        world.static_body_count()
    );
    Ok(())
}
