//! Static per-kind capability table.
//!
//! Everything about a tile that does not depend on its state lives here, one
//! [`TileDescriptor`] per [`TileKind`], indexed by discriminant.

use atoll_common::coords::TilePos;
use atoll_common::items::ToolFamily;

use super::state::TileState;
use super::TileKind;

/// Axis-aligned collision rectangle in local tile space (`0.0..=1.0`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionBox {
    /// Left edge
    pub min_x: f32,
    /// Top edge
    pub min_y: f32,
    /// Right edge (exclusive)
    pub max_x: f32,
    /// Bottom edge (exclusive)
    pub max_y: f32,
}

impl CollisionBox {
    /// The whole tile.
    pub const FULL: Self = Self::new(0.0, 0.0, 1.0, 1.0);

    /// Creates a box from its edges.
    #[must_use]
    pub const fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Corners in world space for a tile at `pos`: top-left, top-right,
    /// bottom-left, bottom-right.
    #[must_use]
    pub fn world_corners(&self, pos: TilePos) -> [(f32, f32); 4] {
        let (x, y) = (pos.x as f32, pos.y as f32);
        [
            (x + self.min_x, y + self.min_y),
            (x + self.max_x, y + self.min_y),
            (x + self.min_x, y + self.max_y),
            (x + self.max_x, y + self.max_y),
        ]
    }

    /// Whether a world-space point overlaps the box of a tile at `pos`.
    #[must_use]
    pub fn contains(&self, pos: TilePos, x: f32, y: f32) -> bool {
        let [top_left, top_right, bottom_left, _] = self.world_corners(pos);
        let right_of_left = x >= top_left.0;
        let left_of_right = x < top_right.0;
        let below_top = y >= top_left.1;
        let above_bottom = y < bottom_left.1;
        right_of_left && left_of_right && below_top && above_bottom
    }
}

/// Tool needed to break a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakRule {
    /// Required tool family
    pub family: ToolFamily,
    /// Minimum tool strength
    pub min_strength: u8,
}

impl BreakRule {
    const HAND: Self = Self {
        family: ToolFamily::Hand,
        min_strength: 0,
    };
    const AXE: Self = Self {
        family: ToolFamily::Axe,
        min_strength: 1,
    };
    const PICKAXE: Self = Self {
        family: ToolFamily::Pickaxe,
        min_strength: 1,
    };
}

/// How a tile is textured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureSpec {
    /// Not drawn
    None,
    /// A single named texture (state may select a variant)
    Simple(&'static str),
    /// A 4×4 atlas picked by cardinal neighbours
    Connected {
        /// Atlas name
        base: &'static str,
        /// Neighbour kinds this texture joins with
        connects_to: &'static [TileKind],
    },
}

/// What is drawn beneath a tile with a transparent texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Underlay {
    /// Nothing
    None,
    /// The ground kind of the world the tile is in
    Ground,
    /// A specific kind
    Kind(TileKind),
}

/// Shape of the state payload a kind carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateSchema {
    /// [`TileState::Plain`]
    Plain,
    /// [`TileState::ShortGrass`]
    ShortGrass,
    /// [`TileState::Flowers`]
    Flowers,
    /// [`TileState::Sapling`]
    Sapling,
    /// [`TileState::BerryBush`]
    BerryBush,
    /// [`TileState::Campfire`]
    Campfire,
    /// [`TileState::CaveEntrance`]
    CaveEntrance,
}

impl StateSchema {
    /// State of a freshly created tile at tick `now`.
    #[must_use]
    pub const fn initial(self, now: u64) -> TileState {
        match self {
            Self::Plain => TileState::Plain,
            Self::ShortGrass => TileState::ShortGrass { trampled_at: None },
            Self::Flowers => TileState::Flowers { variant: 0 },
            Self::Sapling => TileState::Sapling { planted_at: now },
            Self::BerryBush => TileState::BerryBush { picked_at: None },
            Self::Campfire => TileState::Campfire { lit_at: Some(now) },
            Self::CaveEntrance => TileState::CaveEntrance { cave: None },
        }
    }

    /// Whether a payload has this shape.
    #[must_use]
    pub const fn accepts(self, state: &TileState) -> bool {
        matches!(
            (self, state),
            (Self::Plain, TileState::Plain)
                | (Self::ShortGrass, TileState::ShortGrass { .. })
                | (Self::Flowers, TileState::Flowers { .. })
                | (Self::Sapling, TileState::Sapling { .. })
                | (Self::BerryBush, TileState::BerryBush { .. })
                | (Self::Campfire, TileState::Campfire { .. })
                | (Self::CaveEntrance, TileState::CaveEntrance { .. })
        )
    }
}

/// Static capabilities of a tile kind.
#[derive(Debug, Clone, Copy)]
pub struct TileDescriptor {
    /// Kind described
    pub kind: TileKind,
    /// Display name
    pub name: &'static str,
    /// Texture
    pub texture: TextureSpec,
    /// Drawn beneath the texture
    pub underlay: Underlay,
    /// Collision rectangle; `Some` means collidable
    pub collision: Option<CollisionBox>,
    /// Movement multiplier when walked over
    pub player_speed: f32,
    /// Tool requirement; `Some` means breakable
    pub breakable: Option<BreakRule>,
    /// Has an interact behaviour
    pub interactive: bool,
    /// Reacts to the player walking through it
    pub collision_reactive: bool,
    /// Has a per-tick update behaviour
    pub updatable: bool,
    /// Items may be placed over it
    pub replaceable: bool,
    /// State payload shape
    pub schema: StateSchema,
}

const GRASS_CONNECTS: &[TileKind] = &[
    TileKind::Grass,
    TileKind::ShortGrass,
    TileKind::Flowers,
    TileKind::RedMushroom,
    TileKind::BrownMushroom,
    TileKind::PineTree,
    TileKind::Sapling,
    TileKind::BerryBush,
    TileKind::Stone,
    TileKind::Campfire,
    TileKind::CaveEntrance,
];

const fn base(kind: TileKind, name: &'static str) -> TileDescriptor {
    TileDescriptor {
        kind,
        name,
        texture: TextureSpec::None,
        underlay: Underlay::None,
        collision: None,
        player_speed: 1.0,
        breakable: None,
        interactive: false,
        collision_reactive: false,
        updatable: false,
        replaceable: false,
        schema: StateSchema::Plain,
    }
}

static DESCRIPTORS: [TileDescriptor; TileKind::COUNT] = [
    base(TileKind::Empty, "Empty"),
    TileDescriptor {
        texture: TextureSpec::Connected {
            base: "water",
            connects_to: &[TileKind::Water],
        },
        collision: Some(CollisionBox::FULL),
        ..base(TileKind::Water, "Water")
    },
    TileDescriptor {
        texture: TextureSpec::Connected {
            base: "sand",
            connects_to: &[TileKind::Sand, TileKind::SandWithStones],
        },
        player_speed: 0.8,
        replaceable: true,
        ..base(TileKind::Sand, "Sand")
    },
    TileDescriptor {
        texture: TextureSpec::Simple("sand_stones"),
        underlay: Underlay::Kind(TileKind::Sand),
        player_speed: 0.8,
        breakable: Some(BreakRule::HAND),
        ..base(TileKind::SandWithStones, "Sand with stones")
    },
    TileDescriptor {
        texture: TextureSpec::Connected {
            base: "grass",
            connects_to: GRASS_CONNECTS,
        },
        replaceable: true,
        ..base(TileKind::Grass, "Grass")
    },
    TileDescriptor {
        texture: TextureSpec::Simple("short_grass"),
        underlay: Underlay::Kind(TileKind::Grass),
        breakable: Some(BreakRule::HAND),
        collision_reactive: true,
        updatable: true,
        replaceable: true,
        schema: StateSchema::ShortGrass,
        ..base(TileKind::ShortGrass, "Short grass")
    },
    TileDescriptor {
        texture: TextureSpec::Simple("flowers_0"),
        underlay: Underlay::Kind(TileKind::Grass),
        breakable: Some(BreakRule::HAND),
        schema: StateSchema::Flowers,
        ..base(TileKind::Flowers, "Flowers")
    },
    TileDescriptor {
        texture: TextureSpec::Simple("red_mushroom"),
        underlay: Underlay::Kind(TileKind::Grass),
        breakable: Some(BreakRule::HAND),
        ..base(TileKind::RedMushroom, "Red mushroom")
    },
    TileDescriptor {
        texture: TextureSpec::Simple("brown_mushroom"),
        underlay: Underlay::Kind(TileKind::Grass),
        breakable: Some(BreakRule::HAND),
        ..base(TileKind::BrownMushroom, "Brown mushroom")
    },
    TileDescriptor {
        texture: TextureSpec::Simple("pine_tree"),
        underlay: Underlay::Ground,
        collision: Some(CollisionBox::new(0.3, 0.5, 0.7, 1.0)),
        breakable: Some(BreakRule::AXE),
        ..base(TileKind::PineTree, "Pine tree")
    },
    TileDescriptor {
        texture: TextureSpec::Simple("sapling"),
        underlay: Underlay::Ground,
        breakable: Some(BreakRule::HAND),
        updatable: true,
        schema: StateSchema::Sapling,
        ..base(TileKind::Sapling, "Sapling")
    },
    TileDescriptor {
        texture: TextureSpec::Simple("berry_bush"),
        underlay: Underlay::Ground,
        collision: Some(CollisionBox::new(0.15, 0.2, 0.85, 0.95)),
        breakable: Some(BreakRule::AXE),
        interactive: true,
        updatable: true,
        schema: StateSchema::BerryBush,
        ..base(TileKind::BerryBush, "Berry bush")
    },
    TileDescriptor {
        texture: TextureSpec::Connected {
            base: "stone",
            connects_to: &[TileKind::Stone],
        },
        underlay: Underlay::Ground,
        collision: Some(CollisionBox::FULL),
        breakable: Some(BreakRule::PICKAXE),
        ..base(TileKind::Stone, "Stone")
    },
    TileDescriptor {
        texture: TextureSpec::Simple("campfire_out"),
        underlay: Underlay::Ground,
        collision: Some(CollisionBox::new(0.2, 0.3, 0.8, 0.9)),
        breakable: Some(BreakRule::HAND),
        interactive: true,
        updatable: true,
        schema: StateSchema::Campfire,
        ..base(TileKind::Campfire, "Campfire")
    },
    TileDescriptor {
        texture: TextureSpec::Simple("cave_entrance"),
        underlay: Underlay::Kind(TileKind::Grass),
        interactive: true,
        schema: StateSchema::CaveEntrance,
        ..base(TileKind::CaveEntrance, "Cave entrance")
    },
    TileDescriptor {
        texture: TextureSpec::Simple("cave_floor"),
        player_speed: 0.9,
        replaceable: true,
        ..base(TileKind::CaveFloor, "Cave floor")
    },
    TileDescriptor {
        texture: TextureSpec::Connected {
            base: "cave_wall",
            connects_to: &[TileKind::CaveWall],
        },
        underlay: Underlay::Kind(TileKind::CaveFloor),
        collision: Some(CollisionBox::FULL),
        breakable: Some(BreakRule::PICKAXE),
        ..base(TileKind::CaveWall, "Cave wall")
    },
    TileDescriptor {
        texture: TextureSpec::Simple("cave_exit"),
        underlay: Underlay::Kind(TileKind::CaveFloor),
        player_speed: 0.9,
        interactive: true,
        ..base(TileKind::CaveExit, "Cave exit")
    },
];

/// Descriptor for a kind.
#[must_use]
pub fn descriptor(kind: TileKind) -> &'static TileDescriptor {
    &DESCRIPTORS[kind.index()]
}

/// Every texture and atlas name referenced by the table, including state
/// variants. Simple names first, then atlas bases.
#[must_use]
pub fn texture_names() -> (Vec<&'static str>, Vec<&'static str>) {
    let mut simple = Vec::new();
    let mut connected = Vec::new();
    for entry in &DESCRIPTORS {
        match entry.texture {
            TextureSpec::None => {}
            TextureSpec::Simple(name) => simple.push(name),
            TextureSpec::Connected { base, .. } => connected.push(base),
        }
    }
    simple.extend([
        "short_grass_trampled",
        "flowers_1",
        "flowers_2",
        "berry_bush_picked",
        "campfire_lit",
    ]);
    (simple, connected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_indexed_by_kind() {
        for kind in TileKind::ALL {
            assert_eq!(descriptor(kind).kind, kind);
        }
    }

    #[test]
    fn test_initial_state_matches_schema() {
        for kind in TileKind::ALL {
            let schema = descriptor(kind).schema;
            assert!(schema.accepts(&schema.initial(10)), "{kind:?}");
        }
        assert!(!StateSchema::Plain.accepts(&TileState::Flowers { variant: 1 }));
    }

    #[test]
    fn test_grass_connects_to_decorations_but_not_back() {
        let TextureSpec::Connected { connects_to, .. } = descriptor(TileKind::Grass).texture else {
            panic!("grass is connected-textured");
        };
        assert!(connects_to.contains(&TileKind::Flowers));
        assert!(matches!(
            descriptor(TileKind::Flowers).texture,
            TextureSpec::Simple(_)
        ));
    }

    #[test]
    fn test_collision_box_corners() {
        let trunk = descriptor(TileKind::PineTree).collision.expect("trees collide");
        let corners = trunk.world_corners(TilePos::new(2, 3));
        assert_eq!(corners[0], (2.3, 3.5));
        assert_eq!(corners[3], (2.7, 4.0));
        assert!(trunk.contains(TilePos::new(2, 3), 2.5, 3.75));
        assert!(!trunk.contains(TilePos::new(2, 3), 2.1, 3.75));
    }

    #[test]
    fn test_texture_names_are_unique() {
        let (simple, connected) = texture_names();
        let mut all: Vec<_> = simple.iter().chain(connected.iter()).collect();
        let total = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), total);
    }
}
