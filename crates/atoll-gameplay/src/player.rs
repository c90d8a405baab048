//! Player controller: movement physics, facing and animation.
//!
//! Movement is resolved against the world by sampling four collision points
//! around the player's feet. Velocity is in tiles per tick.

use ahash::AHashSet;
use atoll_common::coords::TilePos;
use atoll_common::ids::WorldId;
use atoll_world::render::{BlitTarget, Camera, TextureLookup, PLAYER_SPRITES, TILE_PIXELS};
use atoll_world::tile::TileEffect;
use atoll_world::world::World;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::input::InputState;

/// Velocity gained per tick of held movement input.
pub const ACCELERATION: f32 = 0.025;
/// Velocity factor applied when only the diagonal step collides.
pub const BOUNCE: f32 = -0.1;
/// Velocity retained after each tick.
pub const DAMPING: f32 = 0.75;
/// Speed below which the player counts as standing still.
pub const MIN_SPEED: f32 = 0.001;
/// Ticks per animation frame (5 Hz at 60 ticks per second).
pub const ANIMATION_TICKS: u32 = 12;
/// Frames in a walk cycle.
pub const ANIMATION_FRAMES: usize = 4;

/// Collision sample points relative to the player position.
pub const COLLISION_POINTS: [Vec2; 4] = [
    Vec2::new(-0.25, -0.25),
    Vec2::new(0.25, -0.25),
    Vec2::new(-0.25, 0.4),
    Vec2::new(0.25, 0.4),
];

/// Direction the player is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Facing up
    Up,
    /// Facing down (default)
    #[default]
    Down,
    /// Facing left
    Left,
    /// Facing right
    Right,
}

impl Direction {
    /// Tile step in this direction.
    #[must_use]
    pub const fn step(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// Direction of the dominant axis of a vector, `None` for zero.
    #[must_use]
    pub fn from_vec2(v: Vec2) -> Option<Self> {
        if v.x == 0.0 && v.y == 0.0 {
            return None;
        }
        if v.x.abs() > v.y.abs() {
            if v.x > 0.0 {
                Some(Self::Right)
            } else {
                Some(Self::Left)
            }
        } else if v.y > 0.0 {
            Some(Self::Down)
        } else {
            Some(Self::Up)
        }
    }

    const fn sprite_row(self) -> usize {
        match self {
            Self::Up => 0,
            Self::Down => 1,
            Self::Left => 2,
            Self::Right => 3,
        }
    }
}

/// The player in one world.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    world: WorldId,
    position: Vec2,
    velocity: Vec2,
    facing: Direction,
    frame: usize,
    frame_ticks: u32,
}

impl Player {
    /// Creates a player standing still at `position` in `world`.
    #[must_use]
    pub fn new(world: WorldId, position: Vec2) -> Self {
        Self {
            world,
            position,
            velocity: Vec2::ZERO,
            facing: Direction::Down,
            frame: 0,
            frame_ticks: 0,
        }
    }

    /// Restores a saved player.
    #[must_use]
    pub fn restored(world: WorldId, position: Vec2, facing: Direction) -> Self {
        Self {
            facing,
            ..Self::new(world, position)
        }
    }

    /// World the player is in.
    #[must_use]
    pub const fn world(&self) -> WorldId {
        self.world
    }

    /// Position in tile space.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Velocity in tiles per tick.
    #[must_use]
    pub const fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Sets the velocity.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    /// Facing direction.
    #[must_use]
    pub const fn facing(&self) -> Direction {
        self.facing
    }

    /// Current animation frame.
    #[must_use]
    pub const fn frame(&self) -> usize {
        self.frame
    }

    /// Tile under the player's position.
    #[must_use]
    pub fn tile_pos(&self) -> TilePos {
        TilePos::from_f32(self.position.x, self.position.y)
    }

    /// Tile one step ahead in the facing direction.
    #[must_use]
    pub fn looking_at(&self) -> TilePos {
        let (dx, dy) = self.facing.step();
        self.tile_pos().offset(dx, dy)
    }

    /// Sprite name for the current facing and frame.
    #[must_use]
    pub const fn sprite(&self) -> &'static str {
        PLAYER_SPRITES[self.facing.sprite_row()][self.frame]
    }

    /// Advances one tick: applies input, resolves collisions, dispatches
    /// collision hooks and moves. Returns the effects raised by tiles the
    /// player touched.
    pub fn tick(&mut self, world: &mut World, input: &InputState) -> Vec<TileEffect> {
        self.velocity += input.movement() * ACCELERATION;
        self.resolve_collisions(world);
        let effects = self.dispatch_collisions(world);

        let speed = world.block_at(self.tile_pos()).player_speed();
        self.velocity *= speed;
        self.position += self.velocity;
        self.clamp_to(world);
        self.velocity *= DAMPING;

        self.animate();
        effects
    }

    fn collides(world: &mut World, position: Vec2) -> bool {
        COLLISION_POINTS.iter().any(|offset| {
            let point = position + *offset;
            world
                .block_at(TilePos::from_f32(point.x, point.y))
                .collides_at(point.x, point.y)
        })
    }

    fn resolve_collisions(&mut self, world: &mut World) {
        let position = self.position;
        if Self::collides(world, position) {
            return;
        }
        let x_hit = Self::collides(world, position + Vec2::new(self.velocity.x, 0.0));
        let y_hit = Self::collides(world, position + Vec2::new(0.0, self.velocity.y));
        if x_hit {
            self.velocity.x = 0.0;
        }
        if y_hit {
            self.velocity.y = 0.0;
        }
        if !x_hit && !y_hit && Self::collides(world, position + self.velocity) {
            self.velocity *= BOUNCE;
        }
    }

    /// Distinct tiles under the collision points.
    #[must_use]
    pub fn occupied_tiles(&self) -> Vec<TilePos> {
        let mut seen = AHashSet::new();
        COLLISION_POINTS
            .iter()
            .map(|offset| {
                let point = self.position + *offset;
                TilePos::from_f32(point.x, point.y)
            })
            .filter(|pos| seen.insert(*pos))
            .collect()
    }

    fn dispatch_collisions(&self, world: &mut World) -> Vec<TileEffect> {
        let position = (self.position.x, self.position.y);
        self.occupied_tiles()
            .into_iter()
            .flat_map(|pos| world.collide(pos, position))
            .collect()
    }

    fn clamp_to(&mut self, world: &World) {
        let size = world.size();
        let max_x = size.width as f32 - 0.01;
        let max_y = size.height as f32 - 0.01;
        self.position.x = self.position.x.clamp(0.0, max_x);
        self.position.y = self.position.y.clamp(0.0, max_y);
    }

    fn animate(&mut self) {
        if self.velocity.length() <= MIN_SPEED {
            self.frame = 0;
            self.frame_ticks = 0;
            return;
        }
        if let Some(facing) = Direction::from_vec2(self.velocity) {
            self.facing = facing;
        }
        self.frame_ticks += 1;
        if self.frame_ticks >= ANIMATION_TICKS {
            self.frame_ticks = 0;
            self.frame = (self.frame + 1) % ANIMATION_FRAMES;
        }
    }

    /// Draws the sprite with its feet on the player position.
    pub fn draw<T: BlitTarget + ?Sized>(
        &self,
        target: &mut T,
        camera: &Camera,
        textures: &dyn TextureLookup,
    ) {
        let (x, y) = camera.to_screen(self.position.x, self.position.y);
        let half = i64::from(TILE_PIXELS / 2);
        target.blit(textures.texture(self.sprite()), x - half, y - half - 4);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use atoll_common::coords::WorldSize;
    use atoll_common::tick::TickClock;
    use atoll_world::config::WorldConfig;
    use atoll_world::meta::WorldMeta;
    use atoll_world::storage::SaveLayout;
    use atoll_world::tile::{build_tile_registry, Tile, TileKind};

    use super::*;
    use crate::input::Action;

    fn test_world(dir: &std::path::Path) -> World {
        World::create(
            &SaveLayout::new(dir),
            WorldMeta::overworld("physics", 1, WorldSize::square(1024)),
            WorldConfig::default(),
            Arc::new(build_tile_registry()),
            TickClock::new(),
        )
        .unwrap()
    }

    fn fill(world: &mut World, x0: i32, y0: i32, x1: i32, y1: i32, kind: TileKind) {
        for y in y0..=y1 {
            for x in x0..=x1 {
                let pos = TilePos::new(x, y);
                world.set_block(pos, Tile::new(kind, pos));
            }
        }
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_corner_bounce() {
        let dir = tempfile::tempdir().unwrap();
        let mut world = test_world(dir.path());
        fill(&mut world, 3, 3, 6, 6, TileKind::Grass);
        world.set_block(TilePos::new(5, 5), Tile::new(TileKind::Stone, TilePos::new(5, 5)));

        let mut player = Player::new(world.meta().world_id, Vec2::new(4.5, 4.5));
        player.set_velocity(Vec2::new(1.0, 1.0));
        player.tick(&mut world, &InputState::new());

        // Both single-axis steps are free, the diagonal hits stone.
        let pos = player.position();
        assert!(approx(pos.x, 4.4) && approx(pos.y, 4.4), "{pos:?}");
        let v = player.velocity();
        assert!(approx(v.x, BOUNCE * DAMPING) && approx(v.y, BOUNCE * DAMPING), "{v:?}");
        assert!(!Player::collides(&mut world, pos));
    }

    #[test]
    fn test_axis_blocked_by_wall() {
        let dir = tempfile::tempdir().unwrap();
        let mut world = test_world(dir.path());
        fill(&mut world, 3, 3, 7, 7, TileKind::Grass);
        fill(&mut world, 6, 3, 6, 7, TileKind::Stone);

        let mut player = Player::new(world.meta().world_id, Vec2::new(5.5, 5.5));
        player.set_velocity(Vec2::new(0.5, 0.2));
        player.tick(&mut world, &InputState::new());

        assert!(approx(player.position().x, 5.5));
        assert!(approx(player.position().y, 5.7));
        assert!(approx(player.velocity().x, 0.0));
    }

    #[test]
    fn test_input_accelerates_and_faces() {
        let dir = tempfile::tempdir().unwrap();
        let mut world = test_world(dir.path());
        fill(&mut world, 3, 3, 7, 7, TileKind::Grass);

        let mut input = InputState::new();
        input.set(Action::MoveLeft, true);
        let mut player = Player::new(world.meta().world_id, Vec2::new(5.5, 5.5));
        player.tick(&mut world, &input);

        assert!(approx(player.position().x, 5.5 - ACCELERATION));
        assert_eq!(player.facing(), Direction::Left);
        assert_eq!(player.looking_at(), TilePos::new(4, 5));
    }

    #[test]
    fn test_sand_slows_movement() {
        let dir = tempfile::tempdir().unwrap();
        let mut world = test_world(dir.path());
        fill(&mut world, 3, 3, 7, 7, TileKind::Sand);

        let mut player = Player::new(world.meta().world_id, Vec2::new(5.5, 5.5));
        player.set_velocity(Vec2::new(0.1, 0.0));
        player.tick(&mut world, &InputState::new());
        assert!(approx(player.position().x, 5.5 + 0.1 * 0.8));
    }

    #[test]
    fn test_walking_tramples_short_grass() {
        let dir = tempfile::tempdir().unwrap();
        let mut world = test_world(dir.path());
        fill(&mut world, 3, 3, 7, 7, TileKind::ShortGrass);

        let mut player = Player::new(world.meta().world_id, Vec2::new(5.5, 5.5));
        let effects = player.tick(&mut world, &InputState::new());
        assert!(effects.is_empty());
        let under = world.block_at(TilePos::new(5, 5));
        assert_eq!(under.texture_name(), Some("short_grass_trampled"));
    }

    #[test]
    fn test_position_is_clamped_to_world() {
        let dir = tempfile::tempdir().unwrap();
        let mut world = test_world(dir.path());
        fill(&mut world, 0, 0, 2, 2, TileKind::Grass);

        let mut player = Player::new(world.meta().world_id, Vec2::new(0.3, 1.5));
        player.set_velocity(Vec2::new(-0.5, 0.0));
        player.tick(&mut world, &InputState::new());
        assert!(player.position().x >= 0.0);
    }

    #[test]
    fn test_animation_cycles_while_moving() {
        let dir = tempfile::tempdir().unwrap();
        let mut world = test_world(dir.path());
        fill(&mut world, 3, 3, 12, 7, TileKind::Grass);

        let mut input = InputState::new();
        input.set(Action::MoveRight, true);
        let mut player = Player::new(world.meta().world_id, Vec2::new(4.5, 5.5));
        for _ in 0..ANIMATION_TICKS {
            player.tick(&mut world, &input);
        }
        assert_eq!(player.frame(), 1);
        assert_eq!(player.sprite(), "player_right_1");

        input.set(Action::MoveRight, false);
        for _ in 0..40 {
            player.tick(&mut world, &input);
        }
        assert_eq!(player.frame(), 0);
    }

    #[test]
    fn test_direction_from_dominant_axis() {
        assert_eq!(Direction::from_vec2(Vec2::ZERO), None);
        assert_eq!(Direction::from_vec2(Vec2::new(0.3, -0.1)), Some(Direction::Right));
        assert_eq!(Direction::from_vec2(Vec2::new(0.1, -0.3)), Some(Direction::Up));
    }
}
