use std::cell::Cell;
use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::config::{DEFAULT_MAX_HIERARCHY_DEPTH, DEFAULT_MAX_HIERARCHY_NODES};
use crate::error::{CatalogError, Result};
use crate::models::{
    ClassificationKind, ClassificationNode, GroupsClassification, HierarchyEdge, MineralNode,
};
use crate::taxonomy::{formula_html, mineral_ns_index};

/// Edge list of one hierarchy fragment, indexed by parent mineral.
///
/// Nodes are referenced by position in `edges`; nothing holds pointers to
/// other nodes, so cyclic input cannot produce cyclic structures.
#[derive(Debug, Clone)]
pub struct HierarchyArena {
    edges: Vec<HierarchyEdge>,
    children_by_parent: HashMap<Uuid, Vec<usize>>,
    roots: Vec<usize>,
}

impl HierarchyArena {
    #[must_use]
    pub fn new(edges: Vec<HierarchyEdge>) -> Self {
        let mut children_by_parent = HashMap::<Uuid, Vec<usize>>::new();
        let mut roots = Vec::new();
        let mut root_minerals = HashSet::new();
        for (idx, edge) in edges.iter().enumerate() {
            match edge.parent_id {
                Some(parent_id) => children_by_parent.entry(parent_id).or_default().push(idx),
                // One branch per distinct base-level mineral.
                None => {
                    if root_minerals.insert(edge.mineral_id) {
                        roots.push(idx);
                    }
                }
            }
        }
        Self {
            edges,
            children_by_parent,
            roots,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    #[must_use]
    pub fn base_level_count(&self) -> usize {
        self.roots.len()
    }

    /// Every mineral the fragment mentions, as child or as parent.
    #[must_use]
    pub fn referenced_minerals(&self) -> Vec<Uuid> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for edge in &self.edges {
            for id in std::iter::once(edge.mineral_id).chain(edge.parent_id) {
                if seen.insert(id) {
                    out.push(id);
                }
            }
        }
        out
    }

    fn children_of(&self, mineral_id: Uuid) -> &[usize] {
        self.children_by_parent
            .get(&mineral_id)
            .map_or(&[], Vec::as_slice)
    }
}

/// Bounds on one classification render.
///
/// `max_depth` cuts long chains; `max_nodes` caps the whole output, since
/// shared ancestors are rendered once per route that reaches them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HierarchyLimits {
    pub max_depth: usize,
    pub max_nodes: usize,
}

impl Default for HierarchyLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_HIERARCHY_DEPTH,
            max_nodes: DEFAULT_MAX_HIERARCHY_NODES,
        }
    }
}

struct Descent<'a> {
    arena: &'a HierarchyArena,
    nodes: &'a HashMap<Uuid, MineralNode>,
    target: Uuid,
    max_depth: usize,
    max_nodes: usize,
    rendered: Cell<usize>,
    budget_spent: Cell<bool>,
}

impl Descent<'_> {
    fn has_budget(&self) -> bool {
        if self.rendered.get() < self.max_nodes {
            return true;
        }
        if !self.budget_spent.replace(true) {
            tracing::warn!(
                target_mineral = %self.target,
                max_nodes = self.max_nodes,
                "hierarchy descent cut at node budget"
            );
        }
        false
    }

    fn render(
        &self,
        edge_idx: usize,
        depth: usize,
        path: &mut HashSet<Uuid>,
    ) -> Result<ClassificationNode> {
        let edge = self.arena.edges[edge_idx];
        let node = self.nodes.get(&edge.mineral_id).ok_or_else(|| {
            CatalogError::DataIntegrity(format!(
                "hierarchy edge {} references missing mineral {}",
                edge.id, edge.mineral_id
            ))
        })?;
        self.rendered.set(self.rendered.get() + 1);

        let mut children = Vec::new();
        let child_edges = self.arena.children_of(edge.mineral_id);
        if edge.mineral_id != self.target && !child_edges.is_empty() {
            if depth + 1 >= self.max_depth {
                tracing::warn!(
                    target_mineral = %self.target,
                    mineral = %edge.mineral_id,
                    max_depth = self.max_depth,
                    "hierarchy descent cut at depth limit"
                );
            } else {
                let mut siblings = HashSet::new();
                for &child_idx in child_edges {
                    let child_mineral = self.arena.edges[child_idx].mineral_id;
                    if !siblings.insert(child_mineral) {
                        continue;
                    }
                    if !self.has_budget() {
                        break;
                    }
                    if !path.insert(child_mineral) {
                        tracing::warn!(
                            target_mineral = %self.target,
                            mineral = %child_mineral,
                            "hierarchy cycle skipped"
                        );
                        continue;
                    }
                    let child = self.render(child_idx, depth + 1, path);
                    path.remove(&child_mineral);
                    children.push(child?);
                }
            }
        }

        Ok(ClassificationNode {
            id: edge.id,
            mineral_id: edge.mineral_id,
            name: node.mineral.name.clone(),
            formula: formula_html(&node.mineral.formula),
            ns_index: mineral_ns_index(&node.mineral),
            statuses: node.statuses.clone(),
            children,
        })
    }
}

/// Render every branch of `arena` from its base level down to `target`.
///
/// Descent stops at `target` and at any mineral already on the current path.
/// `limits` caps depth and the total number of rendered nodes. Returns `None`
/// when there is nothing beyond the target's own root edge to show.
pub fn resolve_groups_classification(
    target: Uuid,
    arena: &HierarchyArena,
    nodes: &HashMap<Uuid, MineralNode>,
    limits: HierarchyLimits,
) -> Result<Option<GroupsClassification>> {
    for mineral_id in arena.referenced_minerals() {
        if !nodes.contains_key(&mineral_id) {
            return Err(CatalogError::DataIntegrity(format!(
                "hierarchy references missing mineral {mineral_id}"
            )));
        }
    }

    let descent = Descent {
        arena,
        nodes,
        target,
        max_depth: limits.max_depth.max(1),
        max_nodes: limits.max_nodes.max(1),
        rendered: Cell::new(0),
        budget_spent: Cell::new(false),
    };
    let mut branches = Vec::with_capacity(arena.roots.len());
    for &root_idx in &arena.roots {
        if !descent.has_budget() {
            break;
        }
        let mut path = HashSet::from([arena.edges[root_idx].mineral_id]);
        branches.push(descent.render(root_idx, 0, &mut path)?);
    }

    if branches.is_empty() || arena.len() <= 1 {
        return Ok(None);
    }
    Ok(Some(GroupsClassification::new(
        ClassificationKind::Groups,
        branches,
    )))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::MineralRecord;
    use crate::status::StatusCode;

    fn mineral(name: &str) -> MineralNode {
        let now = Utc::now();
        MineralNode {
            mineral: MineralRecord {
                id: Uuid::new_v4(),
                name: name.to_string(),
                formula: format!("{name}O_2_"),
                note: None,
                ns_class: None,
                ns_subclass: None,
                ns_family: None,
                ns_mineral: None,
                created_at: now,
                updated_at: now,
            },
            statuses: vec![StatusCode::from_parts(1, 1)],
        }
    }

    fn edge(id: i64, mineral: &MineralNode, parent: Option<&MineralNode>) -> HierarchyEdge {
        HierarchyEdge {
            id,
            mineral_id: mineral.mineral.id,
            parent_id: parent.map(|p| p.mineral.id),
        }
    }

    fn index(nodes: &[&MineralNode]) -> HashMap<Uuid, MineralNode> {
        nodes
            .iter()
            .map(|node| (node.mineral.id, (*node).clone()))
            .collect()
    }

    #[test]
    fn single_root_edge_yields_nothing() {
        let x = mineral("X");
        let arena = HierarchyArena::new(vec![edge(1, &x, None)]);
        let out = resolve_groups_classification(
            x.mineral.id,
            &arena,
            &index(&[&x]),
            HierarchyLimits::default(),
        )
        .expect("resolve");
        assert!(out.is_none());
    }

    #[test]
    fn empty_fragment_yields_nothing() {
        let arena = HierarchyArena::new(Vec::new());
        let out = resolve_groups_classification(
            Uuid::new_v4(),
            &arena,
            &HashMap::new(),
            HierarchyLimits::default(),
        )
        .expect("resolve");
        assert!(out.is_none());
    }

    #[test]
    fn chain_renders_from_supergroup_down_to_target() {
        let supergroup = mineral("Garnet");
        let group = mineral("Pyralspite");
        let target = mineral("Almandine");
        let arena = HierarchyArena::new(vec![
            edge(1, &target, Some(&group)),
            edge(2, &group, Some(&supergroup)),
            edge(3, &supergroup, None),
        ]);
        let out = resolve_groups_classification(
            target.mineral.id,
            &arena,
            &index(&[&supergroup, &group, &target]),
            HierarchyLimits::default(),
        )
        .expect("resolve")
        .expect("groups present");

        assert_eq!(out.kind, ClassificationKind::Groups);
        assert_eq!(out.title, "Groups Classification");
        assert_eq!(out.data.len(), 1);
        let root = &out.data[0];
        assert_eq!(root.name, "Garnet");
        assert_eq!(root.id, 3);
        assert_eq!(root.formula, "GarnetO<sub>2</sub>");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].name, "Pyralspite");
        let leaf = &root.children[0].children[0];
        assert_eq!(leaf.mineral_id, target.mineral.id);
        assert!(leaf.children.is_empty());
    }

    #[test]
    fn multiple_base_level_minerals_fan_out() {
        let first = mineral("Spinel supergroup");
        let second = mineral("Oxyspinel group");
        let target = mineral("Magnetite");
        let arena = HierarchyArena::new(vec![
            edge(1, &target, Some(&first)),
            edge(2, &target, Some(&second)),
            edge(3, &first, None),
            edge(4, &second, None),
            edge(5, &first, None),
        ]);
        assert_eq!(arena.base_level_count(), 2);
        let out = resolve_groups_classification(
            target.mineral.id,
            &arena,
            &index(&[&first, &second, &target]),
            HierarchyLimits::default(),
        )
        .expect("resolve")
        .expect("groups present");
        let names: Vec<_> = out.data.iter().map(|node| node.name.as_str()).collect();
        assert_eq!(names, vec!["Spinel supergroup", "Oxyspinel group"]);
        for branch in &out.data {
            assert_eq!(branch.children.len(), 1);
            assert_eq!(branch.children[0].name, "Magnetite");
        }
    }

    #[test]
    fn descent_stops_at_target_even_when_it_has_children() {
        let root = mineral("Root");
        let target = mineral("Target");
        let below = mineral("Below");
        let arena = HierarchyArena::new(vec![
            edge(1, &target, Some(&root)),
            edge(2, &root, None),
            edge(3, &below, Some(&target)),
        ]);
        let out = resolve_groups_classification(
            target.mineral.id,
            &arena,
            &index(&[&root, &target, &below]),
            HierarchyLimits::default(),
        )
        .expect("resolve")
        .expect("groups present");
        assert!(out.data[0].children[0].children.is_empty());
    }

    #[test]
    fn cycles_below_the_root_terminate() {
        let root = mineral("Root");
        let a = mineral("A");
        let b = mineral("B");
        let target = mineral("Target");
        // A and B are each other's parents; the target hangs elsewhere.
        let arena = HierarchyArena::new(vec![
            edge(1, &a, Some(&root)),
            edge(2, &b, Some(&a)),
            edge(3, &a, Some(&b)),
            edge(4, &root, None),
            edge(5, &target, Some(&root)),
        ]);
        let out = resolve_groups_classification(
            target.mineral.id,
            &arena,
            &index(&[&root, &a, &b, &target]),
            HierarchyLimits::default(),
        )
        .expect("resolve")
        .expect("groups present");
        let branch = &out.data[0];
        assert_eq!(branch.children.len(), 2);
        let a_node = &branch.children[0];
        assert_eq!(a_node.name, "A");
        assert_eq!(a_node.children[0].name, "B");
        assert!(a_node.children[0].children.is_empty());
    }

    #[test]
    fn depth_limit_bounds_long_chains() {
        let chain: Vec<MineralNode> = (0..10).map(|i| mineral(&format!("M{i}"))).collect();
        let mut edges = vec![edge(0, &chain[0], None)];
        for (i, pair) in chain.windows(2).enumerate() {
            edges.push(edge(i as i64 + 1, &pair[1], Some(&pair[0])));
        }
        let arena = HierarchyArena::new(edges);
        let nodes: HashMap<_, _> = chain
            .iter()
            .map(|node| (node.mineral.id, node.clone()))
            .collect();
        let target = chain[9].mineral.id;
        let out = resolve_groups_classification(
            target,
            &arena,
            &nodes,
            HierarchyLimits {
                max_depth: 3,
                ..HierarchyLimits::default()
            },
        )
            .expect("resolve")
            .expect("groups present");
        let mut depth = 1;
        let mut cursor = &out.data[0];
        while let Some(next) = cursor.children.first() {
            depth += 1;
            cursor = next;
        }
        assert_eq!(depth, 3);
    }

    #[test]
    fn missing_mineral_is_a_data_integrity_error() {
        let root = mineral("Root");
        let target = mineral("Target");
        let arena = HierarchyArena::new(vec![edge(1, &target, Some(&root)), edge(2, &root, None)]);
        let err = resolve_groups_classification(
            target.mineral.id,
            &arena,
            &index(&[&target]),
            HierarchyLimits::default(),
        )
        .expect_err("missing root mineral must fail");
        assert!(matches!(err, CatalogError::DataIntegrity(_)));
    }

    fn rendered_nodes(node: &ClassificationNode) -> usize {
        1 + node.children.iter().map(rendered_nodes).sum::<usize>()
    }

    // Two minerals per level, each linked to both minerals of the level above.
    fn diamond_lattice(levels: usize) -> (Uuid, HierarchyArena, HashMap<Uuid, MineralNode>) {
        let rows: Vec<[MineralNode; 2]> = (0..levels)
            .map(|level| [mineral(&format!("L{level}a")), mineral(&format!("L{level}b"))])
            .collect();
        let target = mineral("Target");
        let mut edges = Vec::new();
        let mut next_id = 0;
        let mut push = |child: &MineralNode, parent: Option<&MineralNode>| {
            next_id += 1;
            edges.push(edge(next_id, child, parent));
        };
        for top in &rows[0] {
            push(top, None);
        }
        for pair in rows.windows(2) {
            for child in &pair[1] {
                for parent in &pair[0] {
                    push(child, Some(parent));
                }
            }
        }
        for parent in &rows[levels - 1] {
            push(&target, Some(parent));
        }
        let mut nodes: HashMap<_, _> = rows
            .iter()
            .flatten()
            .map(|node| (node.mineral.id, node.clone()))
            .collect();
        nodes.insert(target.mineral.id, target.clone());
        (target.mineral.id, HierarchyArena::new(edges), nodes)
    }

    #[test]
    fn shared_ancestors_stay_within_the_node_budget() {
        let (target, arena, nodes) = diamond_lattice(20);
        assert_eq!(arena.len(), 2 + 19 * 4 + 2);
        let limits = HierarchyLimits {
            max_depth: 64,
            max_nodes: 500,
        };
        let out = resolve_groups_classification(target, &arena, &nodes, limits)
            .expect("resolve")
            .expect("groups present");
        let total: usize = out.data.iter().map(rendered_nodes).sum();
        assert!(total <= 500, "rendered {total} nodes");
        assert!(total > 20, "budget must still allow a full path, got {total}");
    }

    #[test]
    fn small_lattices_render_completely_under_default_limits() {
        let (target, arena, nodes) = diamond_lattice(3);
        let out =
            resolve_groups_classification(target, &arena, &nodes, HierarchyLimits::default())
                .expect("resolve")
                .expect("groups present");
        // Each top mineral reaches 2 * 2 routes down to the target.
        let per_branch: Vec<_> = out.data.iter().map(rendered_nodes).collect();
        assert_eq!(per_branch, vec![1 + 2 + 4 + 4, 1 + 2 + 4 + 4]);
    }
}
