//! Level hierarchy: one level root, named zones beneath it, tiles beneath the zones.
//!
//! Nodes live in a flat arena and refer to each other by index, so the tree has a single owner and
//! no reference cycles. A coordinate index sits next to the arena so grounded/solid queries from the
//! movement code stay O(1) per cell.
//!
//! Grid coordinates follow Bevy's orientation: x grows to the right, y grows upward.

use std::collections::HashMap;

use bevy::math::IVec2;
use bevy::prelude::*;
use thiserror::Error;

pub const ZONE_BACKGROUND: &str = "Background";
pub const ZONE_SOLID: &str = "Solid Tiles";
pub const ZONE_HAZARDS: &str = "Hazards";
pub const ZONE_GOAL: &str = "Goal";

pub const DEFAULT_TILE_SIZE: f32 = 16.0;

/// How far below the feet the grounded probe looks.
const GROUND_PROBE: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileKind {
    Solid,
    Background,
    Hazard,
    Goal,
}

impl TileKind {
    fn zone(self) -> &'static str {
        match self {
            TileKind::Solid => ZONE_SOLID,
            TileKind::Background => ZONE_BACKGROUND,
            TileKind::Hazard => ZONE_HAZARDS,
            TileKind::Goal => ZONE_GOAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub coords: IVec2,
    pub kind: TileKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Level { number: u32 },
    Zone { name: String },
    Tile(Tile),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("level layout has no rows")]
    Empty,

    #[error("row {row} is {found} cells wide, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("unknown glyph '{glyph}' at row {row}, column {column}")]
    UnknownGlyph {
        glyph: char,
        row: usize,
        column: usize,
    },
}

#[derive(Resource, Debug, Clone)]
pub struct LevelTree {
    nodes: Vec<Node>,
    index: HashMap<IVec2, NodeId>,
    pub tile_size: Vec2,
    /// World position of grid cell (0, 0)'s lower-left corner.
    pub origin: Vec2,
}

impl Default for LevelTree {
    fn default() -> Self {
        Self::new(1, Vec2::splat(DEFAULT_TILE_SIZE), Vec2::ZERO)
    }
}

impl LevelTree {
    pub fn new(number: u32, tile_size: Vec2, origin: Vec2) -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Level { number },
                parent: None,
                children: Vec::new(),
            }],
            index: HashMap::new(),
            tile_size,
            origin,
        }
    }

    /// Builds the standard four-zone layout from a flat list of cells. Zones are created up front
    /// so they exist (possibly empty) regardless of which tile kinds the source contains.
    pub fn assemble(
        number: u32,
        tile_size: Vec2,
        origin: Vec2,
        cells: impl IntoIterator<Item = (IVec2, TileKind)>,
    ) -> Self {
        let mut tree = Self::new(number, tile_size, origin);
        for name in [ZONE_BACKGROUND, ZONE_SOLID, ZONE_HAZARDS, ZONE_GOAL] {
            tree.add_zone(name);
        }

        for (coords, kind) in cells {
            if let Some(zone) = tree.zone_by_name(kind.zone()) {
                tree.add_tile(zone, Tile { coords, kind });
            }
        }
        tree
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn number(&self) -> u32 {
        match self.nodes[0].kind {
            NodeKind::Level { number } => number,
            _ => 0,
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.0).map(|node| &node.kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    pub fn add_zone(&mut self, name: impl Into<String>) -> NodeId {
        let root = self.root();
        self.push(NodeKind::Zone { name: name.into() }, root)
    }

    /// Attaches `tile` under `zone`. Only zones accept tiles; any other parent is refused.
    /// A tile already sitting on the same coordinates is detached and replaced.
    pub fn add_tile(&mut self, zone: NodeId, tile: Tile) -> Option<NodeId> {
        if !matches!(self.node(zone), Some(NodeKind::Zone { .. })) {
            return None;
        }
        if let Some(previous) = self.index.get(&tile.coords).copied() {
            self.detach(previous);
        }
        let id = self.push(NodeKind::Tile(tile), zone);
        self.index.insert(tile.coords, id);
        Some(id)
    }

    pub fn zones(&self) -> impl Iterator<Item = (NodeId, &str)> + '_ {
        self.children(self.root())
            .iter()
            .filter_map(move |&id| match self.node(id) {
                Some(NodeKind::Zone { name }) => Some((id, name.as_str())),
                _ => None,
            })
    }

    pub fn zone_by_name(&self, name: &str) -> Option<NodeId> {
        self.zones()
            .find(|(_, zone)| *zone == name)
            .map(|(id, _)| id)
    }

    pub fn tiles(&self, zone: NodeId) -> impl Iterator<Item = &Tile> + '_ {
        self.children(zone)
            .iter()
            .filter_map(move |&id| match self.node(id) {
                Some(NodeKind::Tile(tile)) => Some(tile),
                _ => None,
            })
    }

    /// Walks every zone and yields the tiles that block movement.
    pub fn solid_tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.zones()
            .flat_map(move |(zone, _)| self.tiles(zone))
            .filter(|tile| tile.kind == TileKind::Solid)
    }

    pub fn tile_count(&self) -> usize {
        self.index.len()
    }

    pub fn tile_at(&self, coords: IVec2) -> Option<&Tile> {
        match self.index.get(&coords).and_then(|&id| self.node(id)) {
            Some(NodeKind::Tile(tile)) => Some(tile),
            _ => None,
        }
    }

    fn kind_at(&self, coords: IVec2) -> Option<TileKind> {
        self.tile_at(coords).map(|tile| tile.kind)
    }

    pub fn is_solid(&self, coords: IVec2) -> bool {
        self.kind_at(coords) == Some(TileKind::Solid)
    }

    pub fn is_hazard(&self, coords: IVec2) -> bool {
        self.kind_at(coords) == Some(TileKind::Hazard)
    }

    pub fn is_goal(&self, coords: IVec2) -> bool {
        self.kind_at(coords) == Some(TileKind::Goal)
    }

    pub fn world_to_grid(&self, position: Vec2) -> IVec2 {
        ((position - self.origin) / self.tile_size).floor().as_ivec2()
    }

    /// Center of `coords` in world space.
    pub fn grid_to_world(&self, coords: IVec2) -> Vec2 {
        self.origin + (coords.as_vec2() + Vec2::splat(0.5)) * self.tile_size
    }

    /// True when any cell overlapped by the box is of `kind`.
    pub fn touches(&self, center: Vec2, half_extents: Vec2, kind: TileKind) -> bool {
        let min = self.world_to_grid(center - half_extents);
        let max = self.world_to_grid(center + half_extents);
        (min.y..=max.y).any(|y| (min.x..=max.x).any(|x| self.kind_at(IVec2::new(x, y)) == Some(kind)))
    }

    /// A body rests on the ground when a solid cell sits directly beneath its feet.
    pub fn grounded(&self, center: Vec2, half_extents: Vec2) -> bool {
        let feet = center.y - half_extents.y - GROUND_PROBE;
        let row = self.world_to_grid(Vec2::new(center.x, feet)).y;
        let left = self.world_to_grid(Vec2::new(center.x - half_extents.x + GROUND_PROBE, feet)).x;
        let right = self.world_to_grid(Vec2::new(center.x + half_extents.x - GROUND_PROBE, feet)).x;
        (left..=right).any(|x| self.is_solid(IVec2::new(x, row)))
    }

    /// World-space y below which nothing can be stood on.
    pub fn floor_limit(&self) -> Option<f32> {
        self.index
            .keys()
            .map(|coords| coords.y)
            .min()
            .map(|row| self.origin.y + row as f32 * self.tile_size.y)
    }

    pub fn summary(&self) -> String {
        let hazards = self
            .zone_by_name(ZONE_HAZARDS)
            .map(|zone| self.tiles(zone).count())
            .unwrap_or(0);
        format!(
            "Level {} assembled: {} zones, {} solid tiles, {} hazards",
            self.number(),
            self.zones().count(),
            self.solid_tiles().count(),
            hazards
        )
    }

    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.nodes.get_mut(id.0).and_then(|node| node.parent.take()) else {
            return;
        };
        self.nodes[parent.0].children.retain(|child| *child != id);
    }

    fn push(&mut self, kind: NodeKind, parent: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }
}

/// An ASCII stage: the assembled tree plus everything it asks to have spawned.
#[derive(Debug, Clone)]
pub struct StageLayout {
    pub tree: LevelTree,
    /// Width and height in cells.
    pub size: UVec2,
    /// Factory tags with the grid cell they were placed on.
    pub spawns: Vec<(&'static str, IVec2)>,
    pub player_spawn: Option<IVec2>,
}

/// Parses rows of glyphs, top row first.
///
/// `.` empty, `#` solid, `~` background, `^` spike, `G` goal, `P` player start. Letters for
/// enemies and items become spawn requests: `M` metall, `B` blader, `K` gutsman, `e` life energy,
/// `E` big life energy, `o` score ball, `s` speed boost, `x` strength boost, `d` defense boost,
/// `h` health boost, `m` multi shot.
pub fn parse_stage(number: u32, tile_size: f32, rows: &[&str]) -> Result<StageLayout, LevelError> {
    let expected = rows.first().ok_or(LevelError::Empty)?.chars().count();
    let height = rows.len() as i32;

    let mut cells = Vec::new();
    let mut spawns = Vec::new();
    let mut player_spawn = None;

    for (row, line) in rows.iter().enumerate() {
        let found = line.chars().count();
        if found != expected {
            return Err(LevelError::RaggedRow {
                row,
                found,
                expected,
            });
        }

        let y = height - 1 - row as i32;
        for (column, glyph) in line.chars().enumerate() {
            let coords = IVec2::new(column as i32, y);
            match glyph {
                '.' => {}
                '#' => cells.push((coords, TileKind::Solid)),
                '~' => cells.push((coords, TileKind::Background)),
                '^' => cells.push((coords, TileKind::Hazard)),
                'G' => cells.push((coords, TileKind::Goal)),
                'P' => player_spawn = Some(coords),
                other => match spawn_tag(other) {
                    Some(tag) => spawns.push((tag, coords)),
                    None => {
                        return Err(LevelError::UnknownGlyph {
                            glyph: other,
                            row,
                            column,
                        })
                    }
                },
            }
        }
    }

    Ok(StageLayout {
        tree: LevelTree::assemble(number, Vec2::splat(tile_size), Vec2::ZERO, cells),
        size: UVec2::new(expected as u32, rows.len() as u32),
        spawns,
        player_spawn,
    })
}

fn spawn_tag(glyph: char) -> Option<&'static str> {
    Some(match glyph {
        'M' => "metall",
        'B' => "blader",
        'K' => "gutsman",
        'e' => "life_energy",
        'E' => "big_life_energy",
        'o' => "score_ball",
        's' => "speed_boost",
        'x' => "strength_boost",
        'd' => "defense_boost",
        'h' => "health_boost",
        'm' => "multi_shot",
        _ => return None,
    })
}
