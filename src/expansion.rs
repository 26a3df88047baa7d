use std::collections::BTreeSet;

use crate::models::{NodeAttributes, OrgNode, PersonId, PersonRecord, RawNode};
use crate::orgchart::{self, RootPolicy};

/// Ids of nodes currently showing their children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState(BTreeSet<PersonId>);

impl ExpansionState {
    pub fn root_only(tree: &OrgNode) -> Self {
        Self(BTreeSet::from([tree.person_id]))
    }

    pub fn contains(&self, id: PersonId) -> bool {
        self.0.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = PersonId> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<PersonId> for ExpansionState {
    fn from_iter<I: IntoIterator<Item = PersonId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Collapses `id` together with every expanded descendant, or expands `id`
/// alone. Ids absent from `tree` leave the state untouched.
pub fn toggle(tree: &OrgNode, state: &ExpansionState, id: PersonId) -> ExpansionState {
    let Some(node) = tree.find(id) else {
        tracing::debug!(id, "ignoring toggle for node outside the current tree");
        return state.clone();
    };

    let mut next = state.clone();
    if next.0.contains(&id) {
        for descendant in node.ids() {
            next.0.remove(&descendant);
        }
    } else {
        next.0.insert(id);
    }
    next
}

pub fn expand_all(tree: &OrgNode) -> ExpansionState {
    tree.ids().into_iter().collect()
}

/// Root plus its direct reports; only deeper levels are hidden.
pub fn collapse_all(tree: &OrgNode) -> ExpansionState {
    std::iter::once(tree.person_id)
        .chain(tree.children.iter().map(|c| c.person_id))
        .collect()
}

pub fn is_fully_expanded(tree: &OrgNode, state: &ExpansionState) -> bool {
    tree.ids().into_iter().all(|id| state.contains(id))
}

/// Renderer view of `tree`: a node lists its children only while it is
/// expanded. Built bottom-up from a breadth-first list of visible nodes, so
/// deep hierarchies never recurse.
pub fn project(tree: &OrgNode, state: &ExpansionState) -> RawNode {
    // each visible node paired with its parent's position in the list
    let mut visible: Vec<(&OrgNode, usize)> = vec![(tree, 0)];
    let mut next = 0;
    while let Some(&(node, _)) = visible.get(next) {
        if state.contains(node.person_id) {
            visible.extend(node.children.iter().map(|child| (child, next)));
        }
        next += 1;
    }

    let mut built: Vec<Vec<RawNode>> = visible.iter().map(|_| Vec::new()).collect();
    for position in (1..visible.len()).rev() {
        let (node, parent) = visible[position];
        let children = std::mem::take(&mut built[position]);
        let raw = raw_node(node, state, children);
        built[parent].push(raw);
    }
    let children = std::mem::take(&mut built[0]);
    raw_node(tree, state, children)
}

/// `children` arrives last-first from the bottom-up pass.
fn raw_node(node: &OrgNode, state: &ExpansionState, mut children: Vec<RawNode>) -> RawNode {
    children.reverse();
    let children = (state.contains(node.person_id) && node.has_children()).then_some(children);
    RawNode {
        name: node.display_name.clone(),
        attributes: NodeAttributes {
            id: node.person_id.to_string(),
            name: node.display_name.clone(),
            role: node.role.clone(),
            team: node.team.clone(),
            location: node.location.clone(),
            email: node.email.clone(),
            has_children: node.has_children(),
        },
        children,
    }
}

/// The tree and its expansion state as one unit: a rebuild always replaces
/// both, so no id from a previous tree survives into the next.
#[derive(Debug, Default)]
pub struct OrgChart {
    tree: Option<OrgNode>,
    expanded: ExpansionState,
    fully_expanded: bool,
}

impl OrgChart {
    pub fn build(records: &[PersonRecord], policy: &RootPolicy) -> Self {
        let mut chart = Self::default();
        chart.rebuild(records, policy);
        chart
    }

    pub fn rebuild(&mut self, records: &[PersonRecord], policy: &RootPolicy) {
        self.tree = orgchart::build_tree(records, policy);
        self.expanded = match &self.tree {
            Some(tree) => ExpansionState::root_only(tree),
            None => ExpansionState::default(),
        };
        self.refresh();
    }

    pub fn tree(&self) -> Option<&OrgNode> {
        self.tree.as_ref()
    }

    pub fn expanded(&self) -> &ExpansionState {
        &self.expanded
    }

    pub fn is_fully_expanded(&self) -> bool {
        self.fully_expanded
    }

    pub fn toggle(&mut self, id: PersonId) {
        if let Some(tree) = &self.tree {
            self.expanded = toggle(tree, &self.expanded, id);
            self.refresh();
        }
    }

    pub fn expand_all(&mut self) {
        if let Some(tree) = &self.tree {
            self.expanded = expand_all(tree);
            self.refresh();
        }
    }

    pub fn collapse_all(&mut self) {
        if let Some(tree) = &self.tree {
            self.expanded = collapse_all(tree);
            self.refresh();
        }
    }

    /// The expand/collapse-all button: collapses when everything is open.
    pub fn toggle_all(&mut self) {
        if self.fully_expanded {
            self.collapse_all();
        } else {
            self.expand_all();
        }
    }

    pub fn project(&self) -> Option<RawNode> {
        self.tree.as_ref().map(|tree| project(tree, &self.expanded))
    }

    fn refresh(&mut self) {
        self.fully_expanded = self
            .tree
            .as_ref()
            .is_some_and(|tree| is_fully_expanded(tree, &self.expanded));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: PersonId, name: &str, manager_id: Option<PersonId>) -> PersonRecord {
        PersonRecord {
            id,
            name: name.to_string(),
            team: "Eng".to_string(),
            manager_id,
            ..Default::default()
        }
    }

    fn chain() -> Vec<PersonRecord> {
        vec![
            person(1, "John Doe", None),
            person(2, "A", Some(1)),
            person(3, "B", Some(2)),
        ]
    }

    // 1 -> {2 -> {4 -> {6}}, 3 -> {5}}
    fn wide() -> Vec<PersonRecord> {
        vec![
            person(1, "John Doe", None),
            person(2, "A", Some(1)),
            person(3, "B", Some(1)),
            person(4, "C", Some(2)),
            person(5, "D", Some(3)),
            person(6, "E", Some(4)),
        ]
    }

    fn policy() -> RootPolicy {
        RootPolicy::with_legacy_name("John Doe")
    }

    fn ids(state: &ExpansionState) -> Vec<PersonId> {
        state.ids().collect()
    }

    #[test]
    fn initial_projection_hides_grandchildren() {
        let chart = OrgChart::build(&chain(), &policy());
        assert_eq!(ids(chart.expanded()), vec![1]);

        let raw = chart.project().unwrap();
        assert_eq!(raw.attributes.id, "1");
        let children = raw.children.as_ref().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "A");
        assert!(children[0].attributes.has_children);
        assert!(children[0].children.is_none());
    }

    #[test]
    fn toggle_reveals_next_level() {
        let mut chart = OrgChart::build(&chain(), &policy());
        chart.toggle(2);
        assert_eq!(ids(chart.expanded()), vec![1, 2]);

        let raw = chart.project().unwrap();
        let children = raw.children.as_ref().unwrap();
        let mid = &children[0];
        let leaf = &mid.children.as_ref().unwrap()[0];
        assert_eq!(leaf.attributes.id, "3");
        assert!(leaf.children.is_none());
        assert!(!chart.is_fully_expanded());
    }

    #[test]
    fn toggle_pair_restores_state() {
        let chart = OrgChart::build(&wide(), &policy());
        let tree = chart.tree().unwrap();
        let start = chart.expanded().clone();

        for id in [1, 2, 3, 4, 5, 6] {
            let back = toggle(tree, &toggle(tree, &start, id), id);
            assert_eq!(back, start, "toggle pair on {id}");
        }
    }

    #[test]
    fn collapse_then_expand_leaves_descendants_collapsed() {
        let mut chart = OrgChart::build(&chain(), &policy());
        chart.expand_all();
        assert_eq!(ids(chart.expanded()), vec![1, 2, 3]);

        chart.toggle(2);
        chart.toggle(2);
        assert_eq!(ids(chart.expanded()), vec![1, 2]);
        assert!(!chart.is_fully_expanded());
    }

    #[test]
    fn collapse_removes_expanded_descendants_only() {
        let chart = OrgChart::build(&wide(), &policy());
        let tree = chart.tree().unwrap();
        let all = expand_all(tree);

        let after = toggle(tree, &all, 2);
        assert_eq!(ids(&after), vec![1, 3, 5]);
    }

    #[test]
    fn unknown_id_is_ignored() {
        let mut chart = OrgChart::build(&chain(), &policy());
        let before = chart.expanded().clone();
        chart.toggle(404);
        assert_eq!(chart.expanded(), &before);
    }

    #[test]
    fn collapse_all_keeps_root_reports_visible() {
        let mut chart = OrgChart::build(&wide(), &policy());
        chart.collapse_all();
        assert_eq!(ids(chart.expanded()), vec![1, 2, 3]);
        assert!(!chart.is_fully_expanded());

        chart.expand_all();
        assert_eq!(ids(chart.expanded()), vec![1, 2, 3, 4, 5, 6]);
        assert!(chart.is_fully_expanded());
    }

    #[test]
    fn toggle_all_alternates() {
        let mut chart = OrgChart::build(&wide(), &policy());
        chart.toggle_all();
        assert!(chart.is_fully_expanded());
        chart.toggle_all();
        assert_eq!(ids(chart.expanded()), vec![1, 2, 3]);
    }

    #[test]
    fn expanding_every_node_by_hand_sets_flag() {
        let mut chart = OrgChart::build(&chain(), &policy());
        chart.toggle(2);
        chart.toggle(3);
        assert!(chart.is_fully_expanded());
        chart.toggle(3);
        assert!(!chart.is_fully_expanded());
    }

    #[test]
    fn rebuild_resets_to_new_root() {
        let mut chart = OrgChart::build(&wide(), &policy());
        chart.expand_all();

        let replacement = vec![person(10, "Kiara Patel", None), person(11, "Jules", Some(10))];
        chart.rebuild(&replacement, &policy());
        assert_eq!(ids(chart.expanded()), vec![10]);
        assert!(!chart.is_fully_expanded());

        chart.rebuild(&[], &policy());
        assert!(chart.tree().is_none());
        assert!(chart.expanded().is_empty());
        assert!(chart.project().is_none());
    }

    #[test]
    fn expanded_leaf_projects_without_children() {
        let records = vec![person(1, "John Doe", None)];
        let chart = OrgChart::build(&records, &policy());
        let raw = chart.project().unwrap();
        assert!(raw.children.is_none());
        assert!(!raw.attributes.has_children);
        assert!(chart.is_fully_expanded());
    }

    #[test]
    fn projection_serializes_for_renderer() {
        let chart = OrgChart::build(&chain(), &policy());
        let json = serde_json::to_value(chart.project().unwrap()).unwrap();
        assert_eq!(json["attributes"]["hasChildren"], true);
        assert_eq!(json["children"][0]["name"], "A");
        assert!(json["children"][0].get("children").is_none());
    }

    #[test]
    fn fully_expanded_projection_keeps_sibling_order() {
        let mut chart = OrgChart::build(&wide(), &policy());
        chart.expand_all();
        let raw = chart.project().unwrap();
        let children = raw.children.as_ref().unwrap();
        let names: Vec<&str> = children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        let grandchild = &children[0].children.as_ref().unwrap()[0];
        assert_eq!(grandchild.attributes.id, "4");
        assert_eq!(grandchild.children.as_ref().unwrap()[0].attributes.id, "6");
    }

    #[test]
    fn very_deep_chain_expands_and_projects() {
        let records: Vec<PersonRecord> = (1..=10_000)
            .map(|id| person(id, &format!("P{id}"), if id == 1 { None } else { Some(id - 1) }))
            .collect();
        let mut chart = OrgChart::build(&records, &RootPolicy::default());
        assert_eq!(chart.tree().unwrap().depth(), 10_000);

        chart.expand_all();
        assert!(chart.is_fully_expanded());

        let raw = chart.project().unwrap();
        let mut level = 1;
        let mut node = &raw;
        while let Some(children) = node.children.as_ref() {
            node = &children[0];
            level += 1;
        }
        assert_eq!(level, 10_000);
        assert_eq!(node.attributes.id, "10000");

        chart.toggle(1);
        assert!(chart.expanded().is_empty());
    }
}
