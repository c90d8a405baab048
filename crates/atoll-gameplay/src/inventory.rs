//! Inventory system.
//!
//! A fixed array of slots; the first [`HOTBAR_SLOTS`] form the hotbar, one of
//! which is selected.

use atoll_common::items::{ItemKind, ItemStack, Tool};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::input::HOTBAR_SLOTS;

/// Default number of slots.
pub const INVENTORY_SLOTS: usize = 27;

/// Inventory error types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InventoryError {
    /// Not enough items
    #[error("Not enough {kind:?}: need {needed}, have {have}")]
    NotEnough {
        /// Item kind
        kind: ItemKind,
        /// Amount needed
        needed: u32,
        /// Amount available
        have: u32,
    },
    /// Inventory full
    #[error("Inventory full: {leftover} items did not fit")]
    Full {
        /// Items that did not fit
        leftover: u32,
    },
}

/// Result type for inventory operations.
pub type InventoryResult<T> = Result<T, InventoryError>;

/// Slot-based inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    slots: Vec<Option<ItemStack>>,
    selected: usize,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new(INVENTORY_SLOTS)
    }
}

impl Inventory {
    /// Creates an empty inventory with `capacity` slots (at least the hotbar).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity.max(HOTBAR_SLOTS)],
            selected: 0,
        }
    }

    /// Inventory a new player starts with.
    #[must_use]
    pub fn starter() -> Self {
        let mut inventory = Self::default();
        for stack in [
            ItemStack::one(ItemKind::WoodenAxe),
            ItemStack::one(ItemKind::WoodenPickaxe),
            ItemStack::new(ItemKind::Campfire, 2),
            ItemStack::new(ItemKind::Sapling, 4),
        ] {
            // An empty inventory always has room for the kit.
            let _ = inventory.add(stack);
        }
        inventory
    }

    /// Rebuilds an inventory from saved slots.
    #[must_use]
    pub fn from_slots(slots: Vec<Option<ItemStack>>, selected: usize) -> Self {
        let mut inventory = Self { slots, selected: 0 };
        if inventory.slots.len() < HOTBAR_SLOTS {
            inventory.slots.resize(HOTBAR_SLOTS, None);
        }
        inventory.select(selected);
        inventory
    }

    /// All slots.
    #[must_use]
    pub fn slots(&self) -> &[Option<ItemStack>] {
        &self.slots
    }

    /// Index of the selected hotbar slot.
    #[must_use]
    pub const fn selected_index(&self) -> usize {
        self.selected
    }

    /// Selects a hotbar slot. Out-of-range slots are ignored.
    pub fn select(&mut self, slot: usize) {
        if slot < HOTBAR_SLOTS {
            self.selected = slot;
        }
    }

    /// Stack in the selected slot.
    #[must_use]
    pub fn selected(&self) -> Option<ItemStack> {
        self.slots[self.selected]
    }

    /// Tool in hand; an empty hand or non-tool item counts as bare hands.
    #[must_use]
    pub fn selected_tool(&self) -> Tool {
        self.selected()
            .and_then(|stack| stack.kind.tool())
            .unwrap_or(Tool::HAND)
    }

    /// Total count of an item kind.
    #[must_use]
    pub fn count(&self, kind: ItemKind) -> u32 {
        self.slots
            .iter()
            .flatten()
            .filter(|stack| stack.kind == kind)
            .map(|stack| stack.count)
            .sum()
    }

    /// Adds a stack, filling existing stacks before empty slots.
    ///
    /// On [`InventoryError::Full`] the items that fit have been added.
    pub fn add(&mut self, stack: ItemStack) -> InventoryResult<()> {
        let max = stack.kind.max_stack();
        let mut remaining = stack.count;
        for slot in self.slots.iter_mut().flatten() {
            if remaining == 0 {
                break;
            }
            if slot.kind == stack.kind && slot.count < max {
                let moved = remaining.min(max - slot.count);
                slot.count += moved;
                remaining -= moved;
            }
        }
        for slot in &mut self.slots {
            if remaining == 0 {
                break;
            }
            if slot.is_none() {
                let moved = remaining.min(max);
                *slot = Some(ItemStack::new(stack.kind, moved));
                remaining -= moved;
            }
        }
        if remaining > 0 {
            return Err(InventoryError::Full {
                leftover: remaining,
            });
        }
        Ok(())
    }

    /// Removes items, taking from the last slots first.
    pub fn remove(&mut self, kind: ItemKind, count: u32) -> InventoryResult<()> {
        let have = self.count(kind);
        if have < count {
            return Err(InventoryError::NotEnough {
                kind,
                needed: count,
                have,
            });
        }
        let mut remaining = count;
        for slot in self.slots.iter_mut().rev() {
            if remaining == 0 {
                break;
            }
            let Some(stack) = slot else {
                continue;
            };
            if stack.kind != kind {
                continue;
            }
            let taken = remaining.min(stack.count);
            stack.count -= taken;
            remaining -= taken;
            if stack.count == 0 {
                *slot = None;
            }
        }
        Ok(())
    }

    /// Removes one item from the selected slot.
    pub fn consume_selected(&mut self) -> Option<ItemKind> {
        let index = self.selected;
        let slot = &mut self.slots[index];
        let stack = slot.as_mut()?;
        let kind = stack.kind;
        stack.count -= 1;
        if stack.count == 0 {
            *slot = None;
        }
        Some(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_starter_kit_tools() {
        let mut inventory = Inventory::starter();
        assert_eq!(inventory.selected_tool(), ItemKind::WoodenAxe.tool().unwrap());
        inventory.select(1);
        assert_eq!(inventory.selected_tool(), ItemKind::WoodenPickaxe.tool().unwrap());
        inventory.select(2);
        assert_eq!(inventory.selected_tool(), Tool::HAND);
        inventory.select(8);
        assert_eq!(inventory.selected(), None);
        inventory.select(HOTBAR_SLOTS);
        assert_eq!(inventory.selected_index(), 8);
    }

    #[test]
    fn test_add_merges_then_spills() {
        let mut inventory = Inventory::new(HOTBAR_SLOTS);
        inventory.add(ItemStack::new(ItemKind::Wood, 60)).unwrap();
        inventory.add(ItemStack::new(ItemKind::Wood, 10)).unwrap();
        assert_eq!(inventory.slots()[0], Some(ItemStack::new(ItemKind::Wood, 64)));
        assert_eq!(inventory.slots()[1], Some(ItemStack::new(ItemKind::Wood, 6)));
        assert_eq!(inventory.count(ItemKind::Wood), 70);
    }

    #[test]
    fn test_full_inventory_reports_leftover() {
        let mut inventory = Inventory::new(HOTBAR_SLOTS);
        for _ in 0..HOTBAR_SLOTS {
            inventory.add(ItemStack::one(ItemKind::WoodenAxe)).unwrap();
        }
        assert_eq!(
            inventory.add(ItemStack::new(ItemKind::Stone, 3)),
            Err(InventoryError::Full { leftover: 3 })
        );
    }

    #[test]
    fn test_remove_and_consume() {
        let mut inventory = Inventory::starter();
        assert!(inventory.remove(ItemKind::Sapling, 5).is_err());
        inventory.remove(ItemKind::Sapling, 3).unwrap();
        assert_eq!(inventory.count(ItemKind::Sapling), 1);

        inventory.select(2);
        assert_eq!(inventory.consume_selected(), Some(ItemKind::Campfire));
        assert_eq!(inventory.consume_selected(), Some(ItemKind::Campfire));
        assert_eq!(inventory.consume_selected(), None);
    }

    proptest! {
        #[test]
        fn prop_add_then_remove_preserves_count(a in 1u32..200, b in 1u32..200) {
            let mut inventory = Inventory::default();
            inventory.add(ItemStack::new(ItemKind::Stone, a)).unwrap();
            inventory.add(ItemStack::new(ItemKind::Stone, b)).unwrap();
            prop_assert_eq!(inventory.count(ItemKind::Stone), a + b);
            inventory.remove(ItemKind::Stone, a).unwrap();
            prop_assert_eq!(inventory.count(ItemKind::Stone), b);
            prop_assert!(inventory.slots().iter().flatten().all(|s| s.count > 0 && s.count <= 64));
        }
    }
}
