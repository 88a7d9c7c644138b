use crate::geom::Position;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use serde::Serialize;
use std::sync::Arc;

/// Opaque per-node / per-edge payload. Keys starting with `$` are style overrides.
pub type Data = serde_json::Map<String, serde_json::Value>;

pub(crate) type AdjacencyMap = IndexMap<String, Adjacency, FxBuildHasher>;

/// Selects one of the three position slots of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PosProp {
    Pos,
    StartPos,
    EndPos,
}

impl PosProp {
    pub const ALL: [PosProp; 3] = [PosProp::Pos, PosProp::StartPos, PosProp::EndPos];
}

/// Angular sector reserved for a subtree in radial layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AngleSpan {
    pub begin: f64,
    pub end: f64,
}

impl AngleSpan {
    pub fn width(&self) -> f64 {
        self.end - self.begin
    }
}

/// One directed half of an undirected connection.
///
/// Both halves share the same `data` allocation; alphas are per half so that fades can be driven
/// from either side.
#[derive(Debug, Clone)]
pub struct Adjacency {
    pub node_from: String,
    pub node_to: String,
    pub data: Arc<Data>,
    pub alpha: f64,
    pub start_alpha: f64,
    pub end_alpha: f64,
    pub ignore: bool,
}

impl Adjacency {
    pub(crate) fn new(node_from: &str, node_to: &str, data: Arc<Data>) -> Self {
        Self {
            node_from: node_from.to_string(),
            node_to: node_to.to_string(),
            data,
            alpha: 1.0,
            start_alpha: 1.0,
            end_alpha: 1.0,
            ignore: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub data: Data,
    pub(crate) adjacencies: AdjacencyMap,
    pub pos: Position,
    pub start_pos: Position,
    pub end_pos: Position,
    pub alpha: f64,
    pub start_alpha: f64,
    pub end_alpha: f64,
    pub selected: bool,
    pub drawn: bool,
    pub exist: bool,
    /// Excluded from layout while a structural operation is fading it out.
    pub ignore: bool,
    pub angle_span: AngleSpan,
}

impl Node {
    pub(crate) fn new(
        id: &str,
        name: &str,
        data: Data,
        complex: bool,
        defaults: super::NodeDefaults,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            data,
            adjacencies: AdjacencyMap::default(),
            pos: Position::zero(complex),
            start_pos: Position::zero(complex),
            end_pos: Position::zero(complex),
            alpha: 1.0,
            start_alpha: 1.0,
            end_alpha: 1.0,
            selected: defaults.selected,
            drawn: defaults.drawn,
            exist: defaults.exist,
            ignore: false,
            angle_span: AngleSpan::default(),
        }
    }

    pub fn position(&self, prop: PosProp) -> &Position {
        match prop {
            PosProp::Pos => &self.pos,
            PosProp::StartPos => &self.start_pos,
            PosProp::EndPos => &self.end_pos,
        }
    }

    pub fn position_mut(&mut self, prop: PosProp) -> &mut Position {
        match prop {
            PosProp::Pos => &mut self.pos,
            PosProp::StartPos => &mut self.start_pos,
            PosProp::EndPos => &mut self.end_pos,
        }
    }

    pub fn adjacent_to(&self, id: &str) -> bool {
        self.adjacencies.contains_key(id)
    }

    pub fn get_adjacency(&self, id: &str) -> Option<&Adjacency> {
        self.adjacencies.get(id)
    }

    pub fn adjacencies(&self) -> impl Iterator<Item = &Adjacency> {
        self.adjacencies.values()
    }

    pub fn adjacencies_mut(&mut self) -> impl Iterator<Item = &mut Adjacency> {
        self.adjacencies.values_mut()
    }

    pub fn neighbor_ids(&self) -> impl Iterator<Item = &str> {
        self.adjacencies.keys().map(String::as_str)
    }

    pub fn degree(&self) -> usize {
        self.adjacencies.len()
    }

    /// Reads a `$`-prefixed numeric style override from `data`.
    pub fn data_f64(&self, key: &str) -> Option<f64> {
        self.data.get(key).and_then(serde_json::Value::as_f64)
    }

    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(serde_json::Value::as_str)
    }
}
