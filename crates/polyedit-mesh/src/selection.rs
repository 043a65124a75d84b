//! Mesh selection state.
//!
//! A selection is four independent element sets (vertices, edges, faces,
//! lines) plus a mask of the element types the user is currently working on.
//! Lines are two-vertex faces, so they are addressed by face index like
//! polygons but kept in their own set.
//!
//! # Usage
//!
//! ```ignore
//! let mut selection = SelectionState::new();
//! selection.select_hit(ElementHit::Face(0), SelectOp::Replace);
//!
//! let adjacency = MeshAdjacency::build(&mesh);
//! let region = select_connected(&mesh, &adjacency, ElementHit::Face(0));
//! selection.apply(&region, SelectOp::Add);
//! ```

use crate::remap::IndexRemap;
use crate::{Mesh, VertexPair};
use bitflags::bitflags;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

bitflags! {
    /// Element types that selection edits apply to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct ElementMask: u8 {
        /// Vertices.
        const VERTEX = 0b0001;
        /// Polygon edges.
        const EDGE = 0b0010;
        /// Polygons.
        const FACE = 0b0100;
        /// Construction lines.
        const LINE = 0b1000;
    }
}

impl Default for ElementMask {
    fn default() -> Self {
        Self::all()
    }
}

/// One of the four selectable element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ElementKind {
    /// Vertices.
    Vertex,
    /// Polygon edges.
    Edge,
    /// Polygons.
    Face,
    /// Construction lines.
    Line,
}

impl ElementKind {
    /// The mask bit for this kind.
    pub fn mask(self) -> ElementMask {
        match self {
            ElementKind::Vertex => ElementMask::VERTEX,
            ElementKind::Edge => ElementMask::EDGE,
            ElementKind::Face => ElementMask::FACE,
            ElementKind::Line => ElementMask::LINE,
        }
    }
}

/// An element the host resolved under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ElementHit {
    /// A vertex index.
    Vertex(u32),
    /// A polygon edge.
    Edge(VertexPair),
    /// A polygon index.
    Face(u32),
    /// A line (two-vertex face) index.
    Line(u32),
}

impl ElementHit {
    /// The kind of element hit.
    pub fn kind(self) -> ElementKind {
        match self {
            ElementHit::Vertex(_) => ElementKind::Vertex,
            ElementHit::Edge(_) => ElementKind::Edge,
            ElementHit::Face(_) => ElementKind::Face,
            ElementHit::Line(_) => ElementKind::Line,
        }
    }

    /// Returns true if the element exists in `mesh` with the expected shape.
    pub fn is_valid(self, mesh: &Mesh) -> bool {
        match self {
            ElementHit::Vertex(v) => (v as usize) < mesh.vertex_count(),
            ElementHit::Edge(pair) => {
                !pair.is_degenerate() && (pair.high() as usize) < mesh.vertex_count()
            }
            ElementHit::Face(f) => mesh
                .faces
                .get(f as usize)
                .is_some_and(|face| face.is_polygon()),
            ElementHit::Line(l) => mesh.faces.get(l as usize).is_some_and(|face| face.is_line()),
        }
    }
}

/// How a set of elements combines with the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SelectOp {
    /// Clear the masked element types, then add.
    #[default]
    Replace,
    /// Add to the selection.
    Add,
    /// Remove from the selection.
    Remove,
    /// Flip membership of each element.
    Toggle,
}

/// Ordered sets of vertices, edges, faces and lines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ElementSet {
    /// Vertex indices.
    pub vertices: BTreeSet<u32>,
    /// Polygon edges.
    pub edges: BTreeSet<VertexPair>,
    /// Polygon indices.
    pub faces: BTreeSet<u32>,
    /// Line indices.
    pub lines: BTreeSet<u32>,
}

impl ElementSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no element of any kind is present.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
            && self.edges.is_empty()
            && self.faces.is_empty()
            && self.lines.is_empty()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.vertices.len() + self.edges.len() + self.faces.len() + self.lines.len()
    }

    /// Inserts one element; returns false if it was already present.
    pub fn insert_hit(&mut self, hit: ElementHit) -> bool {
        match hit {
            ElementHit::Vertex(v) => self.vertices.insert(v),
            ElementHit::Edge(e) => self.edges.insert(e),
            ElementHit::Face(f) => self.faces.insert(f),
            ElementHit::Line(l) => self.lines.insert(l),
        }
    }

    /// Removes one element; returns false if it was absent.
    pub fn remove_hit(&mut self, hit: ElementHit) -> bool {
        match hit {
            ElementHit::Vertex(v) => self.vertices.remove(&v),
            ElementHit::Edge(e) => self.edges.remove(&e),
            ElementHit::Face(f) => self.faces.remove(&f),
            ElementHit::Line(l) => self.lines.remove(&l),
        }
    }

    /// Returns true if the element is present.
    pub fn contains_hit(&self, hit: ElementHit) -> bool {
        match hit {
            ElementHit::Vertex(v) => self.vertices.contains(&v),
            ElementHit::Edge(e) => self.edges.contains(&e),
            ElementHit::Face(f) => self.faces.contains(&f),
            ElementHit::Line(l) => self.lines.contains(&l),
        }
    }

    /// Iterates every element as a hit.
    pub fn hits(&self) -> impl Iterator<Item = ElementHit> + '_ {
        self.vertices
            .iter()
            .map(|&v| ElementHit::Vertex(v))
            .chain(self.edges.iter().map(|&e| ElementHit::Edge(e)))
            .chain(self.faces.iter().map(|&f| ElementHit::Face(f)))
            .chain(self.lines.iter().map(|&l| ElementHit::Line(l)))
    }

    /// Adds every element of `other`.
    pub fn union_with(&mut self, other: &ElementSet) {
        self.vertices.extend(other.vertices.iter().copied());
        self.edges.extend(other.edges.iter().copied());
        self.faces.extend(other.faces.iter().copied());
        self.lines.extend(other.lines.iter().copied());
    }

    /// Removes every element of `other`.
    pub fn difference_with(&mut self, other: &ElementSet) {
        self.vertices.retain(|v| !other.vertices.contains(v));
        self.edges.retain(|e| !other.edges.contains(e));
        self.faces.retain(|f| !other.faces.contains(f));
        self.lines.retain(|l| !other.lines.contains(l));
    }

    /// Keeps only the element types in `mask`.
    pub fn masked(&self, mask: ElementMask) -> ElementSet {
        let mut out = ElementSet::new();
        if mask.contains(ElementMask::VERTEX) {
            out.vertices = self.vertices.clone();
        }
        if mask.contains(ElementMask::EDGE) {
            out.edges = self.edges.clone();
        }
        if mask.contains(ElementMask::FACE) {
            out.faces = self.faces.clone();
        }
        if mask.contains(ElementMask::LINE) {
            out.lines = self.lines.clone();
        }
        out
    }
}

/// The user's current selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SelectionState {
    /// Selected elements.
    pub elements: ElementSet,
    /// Element types affected by selection edits.
    pub mask: ElementMask,
}

impl SelectionState {
    /// Creates an empty selection with every element type active.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty selection with the given active types.
    pub fn with_mask(mask: ElementMask) -> Self {
        Self {
            elements: ElementSet::new(),
            mask,
        }
    }

    /// Returns true if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Clears every set.
    pub fn clear(&mut self) {
        self.elements = ElementSet::new();
    }

    /// Combines `set` with the selection. Only the active element types change.
    pub fn apply(&mut self, set: &ElementSet, op: SelectOp) {
        let set = set.masked(self.mask);
        match op {
            SelectOp::Replace => {
                let keep = self.elements.masked(!self.mask);
                self.elements = keep;
                self.elements.union_with(&set);
            }
            SelectOp::Add => self.elements.union_with(&set),
            SelectOp::Remove => self.elements.difference_with(&set),
            SelectOp::Toggle => {
                for hit in set.hits() {
                    if !self.elements.remove_hit(hit) {
                        self.elements.insert_hit(hit);
                    }
                }
            }
        }
    }

    /// Applies a single element.
    pub fn select_hit(&mut self, hit: ElementHit, op: SelectOp) {
        let mut set = ElementSet::new();
        set.insert_hit(hit);
        self.apply(&set, op);
    }

    /// Returns true if the element is selected.
    pub fn contains(&self, hit: ElementHit) -> bool {
        self.elements.contains_hit(hit)
    }

    /// Selects every element of the active types.
    pub fn select_all(&mut self, mesh: &Mesh) {
        for kind in [
            ElementKind::Vertex,
            ElementKind::Edge,
            ElementKind::Face,
            ElementKind::Line,
        ] {
            if self.mask.contains(kind.mask()) {
                let all = all_of_kind(mesh, kind);
                self.elements.union_with(&all);
            }
        }
    }

    /// Inverts the selection of one element type.
    pub fn invert(&mut self, mesh: &Mesh, kind: ElementKind) {
        let all = all_of_kind(mesh, kind);
        match kind {
            ElementKind::Vertex => {
                self.elements.vertices = all.vertices.difference(&self.elements.vertices).copied().collect();
            }
            ElementKind::Edge => {
                self.elements.edges = all.edges.difference(&self.elements.edges).copied().collect();
            }
            ElementKind::Face => {
                self.elements.faces = all.faces.difference(&self.elements.faces).copied().collect();
            }
            ElementKind::Line => {
                self.elements.lines = all.lines.difference(&self.elements.lines).copied().collect();
            }
        }
    }

    /// Selects the lines spanning each selected edge's vertex pair.
    ///
    /// Returns the number of lines added.
    pub fn edges_to_lines(&mut self, mesh: &Mesh) -> usize {
        let before = self.elements.lines.len();
        for (fi, face) in mesh.faces.iter().enumerate() {
            if face.is_line() {
                let pair = VertexPair::new(face.vertices[0], face.vertices[1]);
                if self.elements.edges.contains(&pair) {
                    self.elements.lines.insert(fi as u32);
                }
            }
        }
        self.elements.lines.len() - before
    }

    /// Selects the vertex pair of each selected line as an edge.
    ///
    /// Returns the number of edges added.
    pub fn lines_to_edges(&mut self, mesh: &Mesh) -> usize {
        let before = self.elements.edges.len();
        for &l in &self.elements.lines {
            if let Some(face) = mesh.faces.get(l as usize).filter(|f| f.is_line()) {
                let pair = VertexPair::new(face.vertices[0], face.vertices[1]);
                if !pair.is_degenerate() {
                    self.elements.edges.insert(pair);
                }
            }
        }
        self.elements.edges.len() - before
    }

    /// Every vertex touched by a selected element.
    pub fn covered_vertices(&self, mesh: &Mesh) -> BTreeSet<u32> {
        let mut out = self.elements.vertices.clone();
        for edge in &self.elements.edges {
            out.insert(edge.low());
            out.insert(edge.high());
        }
        for &f in self.elements.faces.iter().chain(self.elements.lines.iter()) {
            if let Some(face) = mesh.faces.get(f as usize) {
                out.extend(face.vertices.iter().copied());
            }
        }
        out.retain(|&v| (v as usize) < mesh.vertex_count());
        out
    }

    /// Drops entries that do not exist in `mesh`.
    ///
    /// An edge survives only if some face or line of `mesh` still spans it.
    pub fn retain_valid(&mut self, mesh: &Mesh) {
        let vertex_count = mesh.vertex_count();
        self.elements.vertices.retain(|&v| (v as usize) < vertex_count);
        if !self.elements.edges.is_empty() {
            let edges = mesh.edges();
            self.elements.edges.retain(|e| edges.contains(e));
        }
        self.elements
            .faces
            .retain(|&f| mesh.faces.get(f as usize).is_some_and(|face| face.is_polygon()));
        self.elements
            .lines
            .retain(|&l| mesh.faces.get(l as usize).is_some_and(|face| face.is_line()));
    }

    /// Renumbers vertices and edges after a vertex compaction.
    ///
    /// Entries referencing removed vertices are dropped.
    pub fn remap_vertices(&mut self, remap: &IndexRemap) {
        self.elements.vertices = self
            .elements
            .vertices
            .iter()
            .filter_map(|&v| remap.get(v))
            .collect();
        self.elements.edges = self
            .elements
            .edges
            .iter()
            .filter_map(|e| Some(VertexPair::new(remap.get(e.low())?, remap.get(e.high())?)))
            .filter(|e| !e.is_degenerate())
            .collect();
    }

    /// Renumbers faces and lines after a face compaction.
    ///
    /// `mesh` is the compacted mesh; entries whose face was removed, or that
    /// changed between polygon and line, are dropped.
    pub fn remap_faces(&mut self, mesh: &Mesh, remap: &IndexRemap) {
        self.elements.faces = self
            .elements
            .faces
            .iter()
            .filter_map(|&f| remap.get(f))
            .filter(|&f| mesh.faces.get(f as usize).is_some_and(|face| face.is_polygon()))
            .collect();
        self.elements.lines = self
            .elements
            .lines
            .iter()
            .filter_map(|&l| remap.get(l))
            .filter(|&l| mesh.faces.get(l as usize).is_some_and(|face| face.is_line()))
            .collect();
    }
}

fn all_of_kind(mesh: &Mesh, kind: ElementKind) -> ElementSet {
    let mut set = ElementSet::new();
    match kind {
        ElementKind::Vertex => set.vertices = (0..mesh.vertex_count() as u32).collect(),
        ElementKind::Edge => {
            set.edges = mesh
                .faces
                .iter()
                .filter(|f| f.is_polygon())
                .flat_map(|f| f.edges())
                .map(|(a, b)| VertexPair::new(a, b))
                .filter(|e| !e.is_degenerate())
                .collect();
        }
        ElementKind::Face => {
            set.faces = face_indices(mesh, |f| f.is_polygon());
        }
        ElementKind::Line => {
            set.lines = face_indices(mesh, |f| f.is_line());
        }
    }
    set
}

fn face_indices(mesh: &Mesh, pred: impl Fn(&crate::Face) -> bool) -> BTreeSet<u32> {
    mesh.faces
        .iter()
        .enumerate()
        .filter(|(_, f)| pred(f))
        .map(|(i, _)| i as u32)
        .collect()
}
