//! Block palette catalog
//!
//! A static data table the editor consumes: named block types grouped into
//! palettes, each with a representative average color used by the automatic
//! color-matching step. The dynamically assigned `idx` ties a type to the
//! small integers stored in the grid for the life of one buffer; only the
//! string `id` is durable across sessions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One paintable block type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockType {
    /// Stable string key, durable across sessions
    pub id: String,
    /// Display name
    pub name: String,
    /// Average texture color, used for nearest-color matching
    pub color: [u8; 3],
    /// Grid index assigned lazily on first paint; cleared on buffer clear
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idx: Option<u16>,
    /// Whether this type participates in automatic matching
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// A named palette of block types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockGroup {
    pub name: String,
    /// Group-level matching toggle, independent of the per-type flags
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub types: Vec<BlockType>,
}

/// The block-type table consumed by a [`BlockBuffer`](crate::BlockBuffer)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockCatalog {
    pub groups: Vec<BlockGroup>,
}

impl BlockCatalog {
    pub fn iter(&self) -> impl Iterator<Item = &BlockType> {
        self.groups.iter().flat_map(|g| g.types.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut BlockType> {
        self.groups.iter_mut().flat_map(|g| g.types.iter_mut())
    }

    pub fn get(&self, id: &str) -> Option<&BlockType> {
        self.iter().find(|t| t.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut BlockType> {
        self.iter_mut().find(|t| t.id == id)
    }

    /// Types eligible for color matching: group and type flags both set
    pub fn matchable(&self) -> impl Iterator<Item = &BlockType> {
        self.groups
            .iter()
            .filter(|g| g.enabled)
            .flat_map(|g| g.types.iter())
            .filter(|t| t.enabled)
    }

    /// Forget every lazily assigned grid index
    pub fn reset_indices(&mut self) {
        for t in self.iter_mut() {
            t.idx = None;
        }
    }

    pub fn set_type_enabled(&mut self, id: &str, enabled: bool) {
        if let Some(t) = self.get_mut(id) {
            t.enabled = enabled;
        }
    }

    pub fn set_group_enabled(&mut self, name: &str, enabled: bool) {
        if let Some(g) = self.groups.iter_mut().find(|g| g.name == name) {
            g.enabled = enabled;
        }
    }

    /// Per-type enabled flags keyed by id, for session persistence.
    /// Ordered so serialized snapshots are byte-stable.
    pub fn enabled_map(&self) -> BTreeMap<String, bool> {
        self.iter().map(|t| (t.id.clone(), t.enabled)).collect()
    }

    /// Apply persisted enabled flags; unknown ids are ignored
    pub fn apply_enabled_map(&mut self, map: &BTreeMap<String, bool>) {
        for t in self.iter_mut() {
            if let Some(&e) = map.get(&t.id) {
                t.enabled = e;
            }
        }
    }
}

fn bt(id: &str, name: &str, color: [u8; 3]) -> BlockType {
    BlockType {
        id: id.to_string(),
        name: name.to_string(),
        color,
        idx: None,
        enabled: true,
    }
}

/// The default catalog: wool, concrete and terracotta palettes
pub fn block_catalog() -> BlockCatalog {
    BlockCatalog {
        groups: vec![
            BlockGroup {
                name: "Wool".to_string(),
                enabled: true,
                types: vec![
                    bt("white_wool", "White Wool", [233, 236, 236]),
                    bt("orange_wool", "Orange Wool", [240, 118, 19]),
                    bt("magenta_wool", "Magenta Wool", [189, 68, 179]),
                    bt("light_blue_wool", "Light Blue Wool", [58, 175, 217]),
                    bt("yellow_wool", "Yellow Wool", [248, 198, 39]),
                    bt("lime_wool", "Lime Wool", [112, 185, 25]),
                    bt("pink_wool", "Pink Wool", [237, 141, 172]),
                    bt("gray_wool", "Gray Wool", [62, 68, 71]),
                    bt("light_gray_wool", "Light Gray Wool", [142, 142, 134]),
                    bt("cyan_wool", "Cyan Wool", [21, 137, 145]),
                    bt("purple_wool", "Purple Wool", [121, 42, 172]),
                    bt("blue_wool", "Blue Wool", [53, 57, 157]),
                    bt("brown_wool", "Brown Wool", [114, 71, 40]),
                    bt("green_wool", "Green Wool", [84, 109, 27]),
                    bt("red_wool", "Red Wool", [160, 39, 34]),
                    bt("black_wool", "Black Wool", [20, 21, 25]),
                ],
            },
            BlockGroup {
                name: "Concrete".to_string(),
                enabled: true,
                types: vec![
                    bt("white_concrete", "White Concrete", [207, 213, 214]),
                    bt("orange_concrete", "Orange Concrete", [224, 97, 0]),
                    bt("magenta_concrete", "Magenta Concrete", [169, 48, 159]),
                    bt("light_blue_concrete", "Light Blue Concrete", [35, 137, 198]),
                    bt("yellow_concrete", "Yellow Concrete", [240, 175, 21]),
                    bt("lime_concrete", "Lime Concrete", [94, 168, 24]),
                    bt("pink_concrete", "Pink Concrete", [213, 101, 142]),
                    bt("gray_concrete", "Gray Concrete", [54, 57, 61]),
                    bt("light_gray_concrete", "Light Gray Concrete", [125, 125, 115]),
                    bt("cyan_concrete", "Cyan Concrete", [21, 119, 136]),
                    bt("purple_concrete", "Purple Concrete", [100, 31, 156]),
                    bt("blue_concrete", "Blue Concrete", [44, 46, 143]),
                    bt("brown_concrete", "Brown Concrete", [96, 59, 31]),
                    bt("green_concrete", "Green Concrete", [73, 91, 36]),
                    bt("red_concrete", "Red Concrete", [142, 32, 32]),
                    bt("black_concrete", "Black Concrete", [8, 10, 15]),
                ],
            },
            BlockGroup {
                name: "Terracotta".to_string(),
                enabled: true,
                types: vec![
                    bt("terracotta", "Terracotta", [152, 94, 67]),
                    bt("white_terracotta", "White Terracotta", [209, 178, 161]),
                    bt("orange_terracotta", "Orange Terracotta", [161, 83, 37]),
                    bt("magenta_terracotta", "Magenta Terracotta", [149, 88, 108]),
                    bt("light_blue_terracotta", "Light Blue Terracotta", [113, 108, 137]),
                    bt("yellow_terracotta", "Yellow Terracotta", [186, 133, 35]),
                    bt("lime_terracotta", "Lime Terracotta", [103, 117, 52]),
                    bt("pink_terracotta", "Pink Terracotta", [161, 78, 78]),
                    bt("gray_terracotta", "Gray Terracotta", [57, 42, 35]),
                    bt("light_gray_terracotta", "Light Gray Terracotta", [135, 106, 97]),
                    bt("cyan_terracotta", "Cyan Terracotta", [86, 91, 91]),
                    bt("purple_terracotta", "Purple Terracotta", [118, 70, 86]),
                    bt("blue_terracotta", "Blue Terracotta", [74, 59, 91]),
                    bt("brown_terracotta", "Brown Terracotta", [77, 51, 35]),
                    bt("green_terracotta", "Green Terracotta", [76, 83, 42]),
                    bt("red_terracotta", "Red Terracotta", [143, 61, 46]),
                ],
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lookup() {
        let cat = block_catalog();
        assert!(cat.get("white_wool").is_some());
        assert!(cat.get("no_such_block").is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        let cat = block_catalog();
        let mut seen = std::collections::HashSet::new();
        for t in cat.iter() {
            assert!(seen.insert(t.id.clone()), "duplicate id {}", t.id);
        }
    }

    #[test]
    fn test_matchable_respects_group_and_type_flags() {
        let mut cat = block_catalog();
        let total = cat.iter().count();
        assert_eq!(cat.matchable().count(), total);

        cat.set_type_enabled("white_wool", false);
        assert_eq!(cat.matchable().count(), total - 1);

        let wool_count = cat.groups[0].types.len();
        cat.set_group_enabled("Wool", false);
        assert_eq!(cat.matchable().count(), total - wool_count);
    }

    #[test]
    fn test_enabled_map_round_trip() {
        let mut cat = block_catalog();
        cat.set_type_enabled("red_concrete", false);
        let map = cat.enabled_map();

        let mut other = block_catalog();
        other.apply_enabled_map(&map);
        assert!(!other.get("red_concrete").unwrap().enabled);
        assert!(other.get("blue_concrete").unwrap().enabled);
    }
}
