//! Item and tool types shared by tiles (drops, tool requirements) and the
//! inventory.

use serde::{Deserialize, Serialize};

/// Tool family required to break a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolFamily {
    /// Bare hands; any held item counts
    Hand,
    /// Axes (trees, bushes)
    Axe,
    /// Pickaxes (stone, cave walls)
    Pickaxe,
}

/// A tool as held by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tool {
    /// Tool family
    pub family: ToolFamily,
    /// Strength (0 = hand)
    pub strength: u8,
}

impl Tool {
    /// Empty hand.
    pub const HAND: Self = Self {
        family: ToolFamily::Hand,
        strength: 0,
    };

    /// Whether this tool satisfies a requirement.
    #[must_use]
    pub fn satisfies(self, family: ToolFamily, min_strength: u8) -> bool {
        (family == ToolFamily::Hand || self.family == family) && self.strength >= min_strength
    }
}

/// Every item type in the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Logs from pine trees
    Wood,
    /// Stone chunks
    Stone,
    /// Pine sapling (placeable)
    Sapling,
    /// Berries (placeable as a bush)
    Berries,
    /// Mushroom
    Mushroom,
    /// Flower
    Flower,
    /// Campfire kit (placeable)
    Campfire,
    /// Wooden axe
    WoodenAxe,
    /// Wooden pickaxe
    WoodenPickaxe,
}

impl ItemKind {
    /// Maximum stack size.
    #[must_use]
    pub const fn max_stack(self) -> u32 {
        match self {
            Self::WoodenAxe | Self::WoodenPickaxe => 1,
            Self::Campfire => 16,
            _ => 64,
        }
    }

    /// Tool provided when held, if any.
    #[must_use]
    pub const fn tool(self) -> Option<Tool> {
        match self {
            Self::WoodenAxe => Some(Tool {
                family: ToolFamily::Axe,
                strength: 1,
            }),
            Self::WoodenPickaxe => Some(Tool {
                family: ToolFamily::Pickaxe,
                strength: 1,
            }),
            _ => None,
        }
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Wood => "Wood",
            Self::Stone => "Stone",
            Self::Sapling => "Sapling",
            Self::Berries => "Berries",
            Self::Mushroom => "Mushroom",
            Self::Flower => "Flower",
            Self::Campfire => "Campfire",
            Self::WoodenAxe => "Wooden Axe",
            Self::WoodenPickaxe => "Wooden Pickaxe",
        }
    }
}

/// A quantity of one item kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// Item kind
    pub kind: ItemKind,
    /// Quantity
    pub count: u32,
}

impl ItemStack {
    /// Creates a new stack.
    #[must_use]
    pub const fn new(kind: ItemKind, count: u32) -> Self {
        Self { kind, count }
    }

    /// A single item.
    #[must_use]
    pub const fn one(kind: ItemKind) -> Self {
        Self::new(kind, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hand_breaks_hand_tiles_only() {
        assert!(Tool::HAND.satisfies(ToolFamily::Hand, 0));
        assert!(!Tool::HAND.satisfies(ToolFamily::Axe, 1));
    }

    #[test]
    fn test_tools_match_their_family() {
        let axe = ItemKind::WoodenAxe.tool().expect("axe is a tool");
        assert!(axe.satisfies(ToolFamily::Axe, 1));
        assert!(axe.satisfies(ToolFamily::Hand, 0));
        assert!(!axe.satisfies(ToolFamily::Pickaxe, 1));
        assert!(ItemKind::Wood.tool().is_none());
    }
}
