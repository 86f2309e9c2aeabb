//! Headless stage demo
//!
//! Fills a stage with ships, lights and particle systems, moves them around a
//! box for a number of frames and reports how the octree and the render queue
//! keep up:
//! - Ships bounce off the walls and occasionally jump far outside them,
//!   forcing the octree to grow and later collapse again
//! - A fixed camera culls against the octree every frame
//! - Visible ships are batched by material and the state changes counted
//!
//! Usage: `stage_demo [config.toml|config.ron] [frames]`

use log::{debug, info};
use rand::Rng;
use scene_core::foundation::logging;
use scene_core::foundation::math::Point3;
use scene_core::prelude::*;

// Ships bounce inside -ARENA_SIZE/2..ARENA_SIZE/2 on each axis
const ARENA_SIZE: f32 = 100.0;
const NUM_SMALL_SHIPS: usize = 40;
const NUM_LARGE_SHIPS: usize = 8;
const NUM_LIGHTS: usize = 4;
const NUM_PARTICLE_SYSTEMS: usize = 6;

const SMALL_SHIP_SIZE: f32 = 0.8;
const LARGE_SHIP_SIZE: f32 = 2.0;
const SMALL_SHIP_SPEED: f32 = 6.0;
const LARGE_SHIP_SPEED: f32 = 3.0;
const LIGHT_RADIUS: f32 = 20.0;

const FRAME_TIME: f32 = 1.0 / 60.0;
const DEFAULT_FRAMES: u64 = 600;
const REPORT_INTERVAL: u64 = 60;

/// Chance per frame that a ship warps far outside the arena and back
const WARP_CHANCE: f64 = 0.002;

struct Ship {
    actor: ActorId,
    renderable: RenderableId,
    position: Vec3,
    velocity: Vec3,
    size: f32,
    passes: Vec<MaterialPass>,
    lights: u32,
    warped: bool,
}

impl Ship {
    fn bounds(&self) -> AABB {
        AABB::cube(self.position, self.size * 0.5)
    }

    fn advance(&mut self, rng: &mut impl Rng) {
        if self.warped {
            self.position = random_point(rng, ARENA_SIZE / 2.0 - 10.0);
            self.warped = false;
        } else if rng.gen_bool(WARP_CHANCE) {
            self.position *= 40.0;
            self.warped = true;
            return;
        }

        self.position += self.velocity * FRAME_TIME;
        let half = ARENA_SIZE / 2.0;
        for axis in 0..3 {
            if self.position[axis].abs() > half {
                self.velocity[axis] = -self.velocity[axis];
                self.position[axis] = self.position[axis].clamp(-half, half);
            }
        }
    }
}

impl Renderable for Ship {
    fn renderable_id(&self) -> RenderableId {
        self.renderable
    }

    fn material_passes(&self) -> &[MaterialPass] {
        &self.passes
    }

    fn render_priority(&self) -> RenderPriority {
        if self.warped {
            RenderPriority::DISTANT
        } else {
            RenderPriority::MAIN
        }
    }

    fn affecting_light_count(&self) -> u32 {
        self.lights
    }
}

fn random_point(rng: &mut impl Rng, half: f32) -> Vec3 {
    Vec3::new(
        rng.gen_range(-half..half),
        rng.gen_range(-half..half),
        rng.gen_range(-half..half),
    )
}

fn random_velocity(rng: &mut impl Rng, speed: f32) -> Vec3 {
    let direction = Vec3::new(
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
    );
    direction.try_normalize(1.0e-6).unwrap_or_else(Vec3::x) * speed
}

fn spawn_ships(stage: &mut Stage, rng: &mut impl Rng) -> Vec<Ship> {
    let hull = MaterialPass::new(ShaderId(1)).with_texture(TextureId(1));
    let lit = MaterialPass::new(ShaderId(2)).with_iteration(IterationType::OncePerLight, 2);
    let heavy_hull = MaterialPass::new(ShaderId(1)).with_texture(TextureId(2));

    let small = (0..NUM_SMALL_SHIPS).map(|_| (SMALL_SHIP_SIZE, SMALL_SHIP_SPEED, vec![hull.clone()]));
    let large = (0..NUM_LARGE_SHIPS)
        .map(|_| (LARGE_SHIP_SIZE, LARGE_SHIP_SPEED, vec![heavy_hull.clone(), lit.clone()]));

    small
        .chain(large)
        .map(|(size, speed, passes)| {
            let position = random_point(rng, ARENA_SIZE / 2.0 - 10.0);
            let actor = stage.new_actor(AABB::cube(position, size * 0.5));
            Ship {
                actor,
                renderable: stage.new_renderable_id(),
                position,
                velocity: random_velocity(rng, speed),
                size,
                passes,
                lights: 0,
                warped: false,
            }
        })
        .collect()
}

fn load_config(path: Option<&str>) -> Result<SceneConfig, ConfigError> {
    match path {
        Some(path) => SceneConfig::load_from_file(path),
        None => Ok(SceneConfig::default()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let config = load_config(args.get(1).map(String::as_str))?;
    let frames = match args.get(2) {
        Some(frames) => frames.parse()?,
        None => DEFAULT_FRAMES,
    };
    logging::init_from_config(&config.logging);

    info!("=== Stage Demo ===");
    info!("{NUM_SMALL_SHIPS} small ships, {NUM_LARGE_SHIPS} large ships, {frames} frames");

    let mut rng = rand::thread_rng();
    let mut stage = Stage::new(&config)?;

    let mut ships = spawn_ships(&mut stage, &mut rng);
    for _ in 0..NUM_LIGHTS {
        stage.new_light(AABB::cube(random_point(&mut rng, ARENA_SIZE / 2.0), LIGHT_RADIUS));
    }
    for _ in 0..NUM_PARTICLE_SYSTEMS {
        stage.new_particle_system(AABB::cube(random_point(&mut rng, ARENA_SIZE / 2.0), 3.0));
    }

    let view = Mat4::look_at_rh(
        &Point3::new(0.0, 40.0, 90.0),
        &Point3::origin(),
        &Vec3::y(),
    );
    let projection = Mat4::new_perspective(16.0 / 9.0, std::f32::consts::FRAC_PI_3, 0.1, 500.0);
    let frustum = Frustum::from_matrix(&(projection * view));

    let mut total_draws = 0_usize;
    let mut total_state_changes = 0_usize;
    let mut max_root_width = 0.0_f32;

    for frame in 0..frames {
        for ship in &mut ships {
            ship.advance(&mut rng);
            stage.set_bounds(ship.actor.into(), ship.bounds())?;
        }
        stage.update(frame);
        max_root_width = max_root_width.max(stage.octree().root_width());

        let visible = stage.visible_objects(&frustum, ObjectKinds::ACTORS);
        for ship in &mut ships {
            if visible.binary_search(&SceneObject::from(ship.actor)).is_ok() {
                let lights = stage.objects_in_aabb(&ship.bounds(), ObjectKinds::LIGHTS);
                ship.lights = u32::try_from(lights.len()).unwrap_or(u32::MAX);
                stage.register_renderable(&*ship);
            } else {
                stage.unregister_renderable(ship.renderable);
            }
        }

        let mut draws = 0;
        let mut state_changes = 0;
        stage.render_queue().traverse(frame, |step| {
            draws += 1;
            if step.group_changed() {
                state_changes += 1;
            }
        });
        total_draws += draws;
        total_state_changes += state_changes;
        debug!("Frame {frame}: {} visible, {draws} draws, {state_changes} state changes", visible.len());

        if frame % REPORT_INTERVAL == 0 {
            let octree = stage.octree();
            info!(
                "Frame {frame}: {} nodes on {} levels, root width {}, {} visible ships, {} groups in pass 0",
                octree.node_count(),
                octree.level_count(),
                octree.root_width(),
                visible.len(),
                stage.render_queue().group_count(0).unwrap_or(0),
            );
        }
    }

    info!("=== Summary ===");
    info!("Largest root width: {max_root_width}");
    info!("Draws: {total_draws}, state changes: {total_state_changes}");
    Ok(())
}
