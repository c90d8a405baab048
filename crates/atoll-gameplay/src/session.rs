//! Game session: the level stack, per-tick update and drawing.
//!
//! A level is a world plus the player in it. Entering a cave pushes a new
//! level; leaving it flushes the cave and pops back to the previous level,
//! whose player is left exactly where it was.

use std::sync::Arc;

use atoll_common::coords::TilePos;
use atoll_common::ids::WorldId;
use atoll_common::items::ItemKind;
use atoll_common::tick::{TickClock, TICKS_PER_SECOND};
use atoll_world::config::WorldConfig;
use atoll_world::meta::{WorldMeta, WorldType};
use atoll_world::render::{BlitTarget, Camera, DrawStats, TextureLookup};
use atoll_world::storage::SaveLayout;
use atoll_world::tile::{build_tile_registry, TileEffect, TileRegistry};
use atoll_world::world::World;
use glam::Vec2;
use image::Rgba;
use tracing::{debug, error, info, warn};

use crate::input::{Action, InputState, HOTBAR_SLOTS};
use crate::inventory::Inventory;
use crate::player::Player;
use crate::save::{
    read_inventory, read_player_stack, write_inventory, write_player_stack, PlayerRecord,
    PlayerStackRecord, SaveError, SaveResult,
};

const HOTBAR_CELL: u32 = 20;
const HOTBAR_BACKGROUND: Rgba<u8> = Rgba([20, 20, 20, 180]);
const HOTBAR_SELECTED: Rgba<u8> = Rgba([240, 240, 240, 220]);

/// A world and the player in it.
#[derive(Debug)]
pub struct Level {
    /// The world
    pub world: World,
    /// The player in that world
    pub player: Player,
}

impl Level {
    fn spawn(world: World) -> Self {
        let (x, y) = world.meta().spawn_point();
        let player = Player::new(world.meta().world_id, Vec2::new(x, y));
        Self { world, player }
    }
}

/// A running game.
#[derive(Debug)]
pub struct GameSession {
    layout: SaveLayout,
    config: WorldConfig,
    registry: Arc<TileRegistry>,
    clock: TickClock,
    base: WorldId,
    level: Level,
    parents: Vec<Level>,
    inventory: Inventory,
    camera: Camera,
    debug: bool,
}

impl GameSession {
    /// Starts a new game in a fresh save base.
    pub fn new_game(
        layout: SaveLayout,
        config: WorldConfig,
        name: &str,
        seed: i64,
    ) -> SaveResult<Self> {
        let registry = Arc::new(build_tile_registry());
        let clock = TickClock::new();
        let meta = WorldMeta::overworld(name, seed, config.world_size);
        let base = meta.base_id;
        let world = World::create(&layout, meta, config, Arc::clone(&registry), clock.clone())?;
        info!("Started new game {} (seed {})", base, seed);
        Ok(Self {
            layout,
            config,
            registry,
            clock,
            base,
            level: Level::spawn(world),
            parents: Vec::new(),
            inventory: Inventory::starter(),
            camera: Camera::new(0, 0),
            debug: false,
        })
    }

    /// Continues a saved game.
    pub fn continue_game(layout: SaveLayout, config: WorldConfig, base: WorldId) -> SaveResult<Self> {
        let registry = Arc::new(build_tile_registry());
        let stack = read_player_stack(&layout, base)?;
        let inventory = match read_inventory(&layout, base) {
            Ok(inventory) => inventory,
            Err(e) => {
                warn!("Inventory of {} unreadable, starting empty: {}", base, e);
                Inventory::default()
            }
        };
        let clock = TickClock::starting_at(stack.tick);

        let mut levels = Vec::with_capacity(stack.levels.len());
        for record in &stack.levels {
            let world = World::open(
                &layout,
                base,
                record.world_id,
                config,
                Arc::clone(&registry),
                clock.clone(),
            )?;
            levels.push(Level {
                world,
                player: record.restore(),
            });
        }
        let Some(level) = levels.pop() else {
            return Err(SaveError::NotFound(base));
        };
        info!("Continued game {} at depth {}", base, levels.len());
        Ok(Self {
            layout,
            config,
            registry,
            clock,
            base,
            level,
            parents: levels,
            inventory,
            camera: Camera::new(0, 0),
            debug: false,
        })
    }

    /// Continues the most recently played game, or starts a new one.
    pub fn open_latest(layout: SaveLayout, config: WorldConfig, seed: i64) -> SaveResult<Self> {
        if let Some(base) = layout.latest_base() {
            match Self::continue_game(layout.clone(), config, base) {
                Ok(session) => return Ok(session),
                Err(e) => error!("Failed to continue {}: {}; starting a new game", base, e),
            }
        }
        Self::new_game(layout, config, "Atoll", seed)
    }

    /// Save base of this game.
    #[must_use]
    pub const fn base(&self) -> WorldId {
        self.base
    }

    /// Number of levels below the current one.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.parents.len()
    }

    /// Current level.
    #[must_use]
    pub const fn level(&self) -> &Level {
        &self.level
    }

    /// Current level, mutably.
    pub fn level_mut(&mut self) -> &mut Level {
        &mut self.level
    }

    /// Player of the current level.
    #[must_use]
    pub const fn player(&self) -> &Player {
        &self.level.player
    }

    /// World of the current level.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.level.world
    }

    /// Inventory.
    #[must_use]
    pub const fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Tick clock.
    #[must_use]
    pub const fn clock(&self) -> &TickClock {
        &self.clock
    }

    /// Whether the debug overlay is on.
    #[must_use]
    pub const fn is_debug(&self) -> bool {
        self.debug
    }

    /// One simulation tick.
    pub fn update(&mut self, input: &InputState) {
        self.clock.advance();
        if let Some(slot) = input.hotbar() {
            self.inventory.select(slot);
        }
        if input.just_pressed(Action::ToggleDebug) {
            self.debug = !self.debug;
            info!("Debug overlay {}", if self.debug { "on" } else { "off" });
        }

        let Level { world, player } = &mut self.level;
        world.update();
        let mut effects = player.tick(world, input);

        if input.just_pressed(Action::Interact) {
            effects.extend(self.interact());
        }
        if input.just_pressed(Action::Break) {
            effects.extend(self.break_block());
        }
        if input.just_pressed(Action::Place) {
            self.place_selected();
        }
        for effect in effects {
            self.apply(effect);
        }
    }

    fn interact(&mut self) -> Vec<TileEffect> {
        let Level { world, player } = &mut self.level;
        let position = player.position();
        let looking_at = player.looking_at();
        let target = if world
            .peek_block(looking_at)
            .is_some_and(|tile| tile.is_interactive())
        {
            looking_at
        } else {
            player.tile_pos()
        };
        world.interact(target, (position.x, position.y))
    }

    fn break_block(&mut self) -> Vec<TileEffect> {
        let tool = self.inventory.selected_tool();
        let target = self.level.player.looking_at();
        match self.level.world.break_block(target, tool) {
            Some(drops) => drops.into_iter().map(TileEffect::GiveItem).collect(),
            None => Vec::new(),
        }
    }

    fn place_selected(&mut self) {
        let Some(stack) = self.inventory.selected() else {
            return;
        };
        let target = self.level.player.looking_at();
        if self.level.player.occupied_tiles().contains(&target) {
            return;
        }
        if self.level.world.place_block(target, stack.kind) {
            self.inventory.consume_selected();
            debug!("Placed {} at {}", stack.kind.name(), target);
        }
    }

    fn apply(&mut self, effect: TileEffect) {
        match effect {
            TileEffect::GiveItem(stack) => {
                if let Err(e) = self.inventory.add(stack) {
                    warn!("Dropped {}: {}", stack.kind.name(), e);
                }
            }
            TileEffect::EnterCave { entrance, cave } => {
                if let Err(e) = self.enter_cave(entrance, cave) {
                    error!("Failed to enter cave at {}: {}", entrance, e);
                }
            }
            TileEffect::ExitCave => {
                if let Err(e) = self.exit_cave() {
                    error!("Failed to save cave on exit: {}", e);
                }
            }
        }
    }

    /// Enters the cave behind `entrance`, creating it on first visit.
    pub fn enter_cave(&mut self, entrance: TilePos, cave: Option<WorldId>) -> SaveResult<()> {
        let parent = self.level.world.meta().clone();
        if parent.world_type == WorldType::Cave {
            return Ok(());
        }
        let registry = Arc::clone(&self.registry);
        let world = match cave {
            Some(id) if self.layout.world(self.base, id).meta().is_file() => World::open(
                &self.layout,
                self.base,
                id,
                self.config,
                registry,
                self.clock.clone(),
            )?,
            _ => {
                let meta = WorldMeta::cave(&parent, entrance, self.config.cave_size);
                let id = meta.world_id;
                let world =
                    World::create(&self.layout, meta, self.config, registry, self.clock.clone())?;
                self.level.world.link_cave(entrance, id);
                world
            }
        };
        info!("Entering cave {} from {}", world.meta().world_id, entrance);
        let previous = std::mem::replace(&mut self.level, Level::spawn(world));
        self.parents.push(previous);
        Ok(())
    }

    /// Leaves the current cave, returning to the level it was entered from.
    pub fn exit_cave(&mut self) -> SaveResult<()> {
        let Some(parent) = self.parents.pop() else {
            return Ok(());
        };
        let cave = std::mem::replace(&mut self.level, parent);
        info!("Leaving cave {}", cave.world.meta().world_id);
        cave.world.close()?;
        Ok(())
    }

    /// Draws the current level and the hotbar.
    pub fn draw<T: BlitTarget + ?Sized>(
        &mut self,
        target: &mut T,
        textures: &dyn TextureLookup,
    ) -> DrawStats {
        let (width, height) = target.size();
        self.camera.set_viewport(width, height);
        let position = self.level.player.position();
        self.camera.center_on(position.x, position.y);

        let stats = self
            .level
            .world
            .draw(target, &self.camera, textures, self.debug);
        self.level.player.draw(target, &self.camera, textures);
        self.draw_hotbar(target);

        if self.debug && self.clock.now() % TICKS_PER_SECOND == 0 {
            let world = self.level.world.stats();
            info!(
                "tick {}: {} resident ({} pending), {} dirty, {} saving; drew {} ({} repainted)",
                self.clock.now(),
                world.resident,
                world.placeholders,
                world.dirty,
                world.saving,
                stats.chunks_drawn,
                stats.chunks_redrawn
            );
        }
        stats
    }

    fn draw_hotbar<T: BlitTarget + ?Sized>(&self, target: &mut T) {
        let (width, height) = target.size();
        let total = HOTBAR_CELL * HOTBAR_SLOTS as u32;
        let left = i64::from(width.saturating_sub(total) / 2);
        let top = i64::from(height.saturating_sub(HOTBAR_CELL + 4));
        for (index, slot) in self.inventory.slots()[..HOTBAR_SLOTS].iter().enumerate() {
            let x = left + index as i64 * i64::from(HOTBAR_CELL);
            let frame = if index == self.inventory.selected_index() {
                HOTBAR_SELECTED
            } else {
                HOTBAR_BACKGROUND
            };
            target.fill_rect(x, top, HOTBAR_CELL, HOTBAR_CELL, frame);
            target.fill_rect(x + 2, top + 2, HOTBAR_CELL - 4, HOTBAR_CELL - 4, HOTBAR_BACKGROUND);
            if let Some(stack) = slot {
                target.fill_rect(x + 5, top + 5, HOTBAR_CELL - 10, HOTBAR_CELL - 10, item_color(stack.kind));
            }
        }
    }

    /// Repaints every resident chunk of every level, after textures change.
    pub fn redraw_all(&mut self) {
        self.level.world.redraw_all();
        for level in &mut self.parents {
            level.world.redraw_all();
        }
    }

    /// Writes the player stack and inventory and flushes every world.
    pub fn save(&mut self) -> SaveResult<()> {
        let levels = self
            .parents
            .iter()
            .chain(std::iter::once(&self.level))
            .map(|level| PlayerRecord::capture(&level.player, level.world.meta().world_type))
            .collect();
        let record = PlayerStackRecord {
            tick: self.clock.now(),
            levels,
        };
        write_player_stack(&self.layout, self.base, &record)?;
        write_inventory(&self.layout, self.base, &self.inventory)?;
        self.level.world.flush()?;
        for level in &mut self.parents {
            level.world.flush()?;
        }
        info!("Saved game {} at tick {}", self.base, record.tick);
        Ok(())
    }

    /// Saves and shuts every world down.
    pub fn close(mut self) -> SaveResult<()> {
        self.save()?;
        self.level.world.close()?;
        for level in self.parents {
            level.world.close()?;
        }
        Ok(())
    }
}

fn item_color(kind: ItemKind) -> Rgba<u8> {
    match kind {
        ItemKind::Wood => Rgba([120, 80, 40, 255]),
        ItemKind::Stone => Rgba([130, 130, 130, 255]),
        ItemKind::Sapling => Rgba([60, 160, 60, 255]),
        ItemKind::Berries => Rgba([180, 30, 60, 255]),
        ItemKind::Mushroom => Rgba([200, 60, 40, 255]),
        ItemKind::Flower => Rgba([230, 200, 60, 255]),
        ItemKind::Campfire => Rgba([240, 120, 20, 255]),
        ItemKind::WoodenAxe | ItemKind::WoodenPickaxe => Rgba([170, 130, 80, 255]),
    }
}
