use std::collections::{HashMap, HashSet};

use indexmap::IndexSet;

use crate::models::{OrgNode, PersonId, PersonRecord};

/// How the anchor of the tree is chosen.
#[derive(Debug, Clone, Default)]
pub struct RootPolicy {
    /// Exact name that wins root selection outright, if set.
    pub legacy_name: Option<String>,
}

impl RootPolicy {
    pub fn with_legacy_name(name: impl Into<String>) -> Self {
        Self {
            legacy_name: Some(name.into()),
        }
    }
}

pub fn select_root<'a>(records: &'a [PersonRecord], policy: &RootPolicy) -> Option<&'a PersonRecord> {
    if let Some(name) = policy.legacy_name.as_deref() {
        if let Some(found) = records.iter().find(|r| r.name == name) {
            return Some(found);
        }
    }

    records
        .iter()
        .find(|r| r.manager_id.is_none() && (is_executive(&r.job_role) || !r.direct_reports.is_empty()))
        .or_else(|| records.first())
}

fn is_executive(job_role: &str) -> bool {
    let role = job_role.to_lowercase();
    role.contains("ceo") || role.contains("chief")
}

/// Lookup tables over a record set, built once per tree build.
struct RecordIndex<'a> {
    by_id: HashMap<PersonId, &'a PersonRecord>,
    reports_of: HashMap<PersonId, Vec<PersonId>>,
}

impl<'a> RecordIndex<'a> {
    fn new(records: &'a [PersonRecord]) -> Self {
        let mut by_id = HashMap::with_capacity(records.len());
        let mut reports_of: HashMap<PersonId, Vec<PersonId>> = HashMap::new();
        for record in records {
            // first record wins on duplicate ids
            by_id.entry(record.id).or_insert(record);
            if let Some(manager) = record.manager_id {
                reports_of.entry(manager).or_default().push(record.id);
            }
        }
        Self { by_id, reports_of }
    }
}

/// Reconciles the forward `directReports` hint with reverse `managerId`
/// lookups. Forward entries that do not resolve are dropped; the result is
/// deduplicated in first-appearance order, forward edges first.
pub fn child_ids(record: &PersonRecord, records: &[PersonRecord]) -> Vec<PersonId> {
    let index = RecordIndex::new(records);
    reconcile(record, &index).into_iter().collect()
}

fn reconcile(record: &PersonRecord, index: &RecordIndex<'_>) -> IndexSet<PersonId> {
    let mut ids: IndexSet<PersonId> = record
        .direct_reports
        .iter()
        .copied()
        .filter(|id| index.by_id.contains_key(id))
        .collect();
    if let Some(reverse) = index.reports_of.get(&record.id) {
        ids.extend(reverse.iter().copied());
    }
    ids
}

/// Builds the hierarchy anchored at the selected root. Returns `None` for an
/// empty record set. Each record is placed at most once, so cyclic or
/// multiply-parented data terminates with the repeat omitted.
pub fn build_tree(records: &[PersonRecord], policy: &RootPolicy) -> Option<OrgNode> {
    let root = select_root(records, policy)?;
    let index = RecordIndex::new(records);
    let mut placed = HashSet::with_capacity(records.len());
    let tree = build_node(root, &index, &mut placed);
    tracing::debug!(root = tree.person_id, nodes = placed.len(), "built org tree");
    Some(tree)
}

/// Depth-first placement with an explicit stack of open managers. A record
/// is placed when first reached, so the visiting order matches a plain
/// recursive walk over the reconciled child lists.
fn build_node<'a>(root: &'a PersonRecord, index: &RecordIndex<'a>, placed: &mut HashSet<PersonId>) -> OrgNode {
    placed.insert(root.id);
    let mut root_frame = Pending::new(root, index);
    let mut open: Vec<Pending<'a>> = Vec::new();

    loop {
        let top = open.last_mut().unwrap_or(&mut root_frame);
        if let Some(child) = top.next_child(index, placed) {
            placed.insert(child.id);
            open.push(Pending::new(child, index));
            continue;
        }

        match open.pop() {
            Some(done) => {
                let node = done.finish();
                open.last_mut().unwrap_or(&mut root_frame).children.push(node);
            }
            None => return root_frame.finish(),
        }
    }
}

/// A manager whose reports are still being placed.
struct Pending<'a> {
    record: &'a PersonRecord,
    report_ids: indexmap::set::IntoIter<PersonId>,
    children: Vec<OrgNode>,
}

impl<'a> Pending<'a> {
    fn new(record: &'a PersonRecord, index: &RecordIndex<'a>) -> Self {
        Self {
            record,
            report_ids: reconcile(record, index).into_iter(),
            children: Vec::new(),
        }
    }

    fn next_child(&mut self, index: &RecordIndex<'a>, placed: &HashSet<PersonId>) -> Option<&'a PersonRecord> {
        for id in self.report_ids.by_ref() {
            if placed.contains(&id) {
                tracing::debug!(parent = self.record.id, child = id, "skipping already placed report");
                continue;
            }
            if let Some(child) = index.by_id.get(&id) {
                return Some(*child);
            }
        }
        None
    }

    fn finish(self) -> OrgNode {
        let record = self.record;
        OrgNode {
            person_id: record.id,
            display_name: record.name.clone(),
            role: record.job_role.clone(),
            team: record.team.clone(),
            location: record.location.clone(),
            email: record.email.clone(),
            children: self.children,
        }
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
            job_role: "Engineer".to_string(),
            manager_id,
            ..Default::default()
        }
    }

    fn legacy() -> RootPolicy {
        RootPolicy::with_legacy_name("John Doe")
    }

    #[test]
    fn empty_input_has_no_tree() {
        assert!(build_tree(&[], &legacy()).is_none());
    }

    #[test]
    fn builds_three_level_chain() {
        let records = vec![
            person(1, "John Doe", None),
            person(2, "A", Some(1)),
            person(3, "B", Some(2)),
        ];
        let tree = build_tree(&records, &legacy()).unwrap();
        assert_eq!(tree.person_id, 1);
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].person_id, 2);
        assert_eq!(tree.children[0].children[0].person_id, 3);
        assert!(!tree.children[0].children[0].has_children());
    }

    #[test]
    fn legacy_name_beats_executive() {
        let mut ceo = person(1, "Kiara Patel", None);
        ceo.job_role = "CEO".to_string();
        let records = vec![ceo, person(2, "John Doe", Some(1))];
        assert_eq!(select_root(&records, &legacy()).unwrap().id, 2);
        assert_eq!(select_root(&records, &RootPolicy::default()).unwrap().id, 1);
    }

    #[test]
    fn executive_root_is_case_insensitive() {
        let mut chief = person(5, "Jules Moreno", None);
        chief.job_role = "Chief Technology Officer".to_string();
        let records = vec![person(4, "Avery Lee", Some(5)), chief];
        assert_eq!(select_root(&records, &legacy()).unwrap().id, 5);
    }

    #[test]
    fn managed_executive_is_not_root() {
        let mut ceo = person(2, "Acting CEO", Some(1));
        ceo.job_role = "ceo".to_string();
        let records = vec![person(1, "Avery Lee", None), ceo];
        // no unmanaged executive and no direct reports hint: first record
        assert_eq!(select_root(&records, &legacy()).unwrap().id, 1);
    }

    #[test]
    fn direct_reports_hint_qualifies_root() {
        let mut lead = person(3, "Lead", None);
        lead.direct_reports = vec![1];
        let records = vec![person(1, "X", None), person(2, "Y", None), lead];
        assert_eq!(select_root(&records, &legacy()).unwrap().id, 3);
    }

    #[test]
    fn child_ids_union_forward_then_reverse() {
        let mut manager = person(1, "M", None);
        manager.direct_reports = vec![4, 99, 2, 4];
        let records = vec![
            manager.clone(),
            person(2, "A", Some(1)),
            person(3, "B", Some(1)),
            person(4, "C", None),
        ];
        assert_eq!(child_ids(&manager, &records), vec![4, 2, 3]);
    }

    #[test]
    fn dangling_manager_is_not_attached() {
        let records = vec![
            person(1, "John Doe", None),
            person(2, "Orphan", Some(42)),
        ];
        let tree = build_tree(&records, &legacy()).unwrap();
        assert!(tree.children.is_empty());
    }

    #[test]
    fn cycle_terminates_with_each_record_once() {
        // 1 -> 2 -> 3 -> 1 through managerId, plus a forward hint back to 1
        let mut third = person(3, "C", Some(2));
        third.direct_reports = vec![1];
        let records = vec![person(1, "A", Some(3)), person(2, "B", Some(1)), third];
        let tree = build_tree(&records, &legacy()).unwrap();

        let mut ids = tree.ids();
        assert_eq!(ids.len(), 3);
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn self_managed_record_is_a_leaf() {
        let records = vec![person(1, "Loop", Some(1))];
        let tree = build_tree(&records, &legacy()).unwrap();
        assert_eq!(tree.person_id, 1);
        assert!(tree.children.is_empty());
    }

    #[test]
    fn shared_report_is_placed_once() {
        let mut left = person(2, "L", Some(1));
        left.direct_reports = vec![4];
        let mut right = person(3, "R", Some(1));
        right.direct_reports = vec![4];
        let records = vec![person(1, "John Doe", None), left, right, person(4, "Shared", None)];
        let tree = build_tree(&records, &legacy()).unwrap();
        assert_eq!(tree.ids(), vec![1, 2, 4, 3]);
    }

    #[test]
    fn long_chain_builds_fully() {
        let records: Vec<PersonRecord> = (1..=10_000)
            .map(|id| person(id, &format!("P{id}"), if id == 1 { None } else { Some(id - 1) }))
            .collect();
        let tree = build_tree(&records, &legacy()).unwrap();
        assert_eq!(tree.depth(), 10_000);
        assert_eq!(tree.ids().len(), 10_000);
    }

    #[test]
    fn deep_chain_keeps_shared_report_under_first_manager() {
        // a 5,000 deep chain whose tail also names an early node as a report
        let mut records: Vec<PersonRecord> = (1..=5_000)
            .map(|id| person(id, &format!("P{id}"), if id == 1 { None } else { Some(id - 1) }))
            .collect();
        records[4_999].direct_reports = vec![3];
        let tree = build_tree(&records, &legacy()).unwrap();
        assert_eq!(tree.depth(), 5_000);
        assert_eq!(tree.ids(), (1..=5_000).collect::<Vec<_>>());
    }
}
