mod args;

use std::process::ExitCode;

use clap::Parser;
use origin_demos::{find_scene, new_world, scenes};
use origin_ecs::{GlobalTransform, Name, World};
use origin_physics::{PhysicsConfig, PhysicsError, PhysicsResult, PhysicsWorld, RigidBody};

use args::DemoArgs;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = DemoArgs::parse();
    if args.list {
        for scene in scenes() {
            println!("{}", scene.name());
        }
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Physics demo failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &DemoArgs) -> PhysicsResult<()> {
    let mut config = match &args.config {
        Some(path) => PhysicsConfig::load(path)?,
        None => PhysicsConfig::default(),
    };
    if let Some(backend) = args.backend {
        config.backend = backend.into();
    }

    let Some(scene) = find_scene(&args.scene) else {
        let names: Vec<String> = scenes().iter().map(|s| s.name().to_owned()).collect();
        return Err(PhysicsError::Config(format!(
            "unknown scene '{}', expected one of: {}",
            args.scene,
            names.join(", ")
        )));
    };

    let mut world = new_world();
    scene.setup(&mut world);
    log::info!(
        "Scene '{}': {} entities, backend {}",
        scene.name(),
        world.entity_count(),
        config.backend
    );

    let mut physics = PhysicsWorld::new(config);
    physics.init_from_config()?;
    physics.on_simulation_start(&mut world)?;
    for (entity, reason) in physics.skipped_entities() {
        log::warn!("{} skipped: {reason}", Name::label(&world, *entity));
    }

    let started = std::time::Instant::now();
    for frame in 1..=args.frames {
        physics.simulate(&mut world, args.dt)?;
        origin_core::frame_mark!();

        if args.report_every > 0 && frame % args.report_every == 0 {
            report(&world, &physics, frame);
        }
    }
    let elapsed = started.elapsed();
    log::info!(
        "Simulated {} frames in {:.2?} ({:.3} ms/frame)",
        args.frames,
        elapsed,
        elapsed.as_secs_f64() * 1000.0 / f64::from(args.frames.max(1))
    );

    physics.on_simulation_stop(&mut world)?;
    physics.shutdown()
}

/// Logs the body count and the lowest and highest simulated body.
fn report(world: &World, physics: &PhysicsWorld, frame: u32) {
    let mut lowest: Option<(f32, String)> = None;
    let mut highest: Option<(f32, String)> = None;
    for entity in world.entities_with::<RigidBody>() {
        if physics.body_of(entity).is_none() {
            continue;
        }
        let Some(global) = world.get::<GlobalTransform>(entity) else {
            continue;
        };
        let y = global.translation.y;
        if lowest.as_ref().map_or(true, |(low, _)| y < *low) {
            lowest = Some((y, Name::label(world, entity)));
        }
        if highest.as_ref().map_or(true, |(high, _)| y > *high) {
            highest = Some((y, Name::label(world, entity)));
        }
    }

    if let (Some((low, low_name)), Some((high, high_name))) = (lowest, highest) {
        log::info!(
            "frame {frame}: {} bodies, lowest {low_name} at y={low:.3}, highest {high_name} at y={high:.3}",
            physics.body_count()
        );
    }
}
