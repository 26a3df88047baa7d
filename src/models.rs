use serde::{Deserialize, Serialize};

pub type PersonId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillAssignment {
    pub skill_id: String,
    pub level: u8,
    pub years_of_experience: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDefinition {
    pub id: String,
    pub name: String,
    pub category: String,
}

/// One directory entry, as persisted in the `users` blob.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRecord {
    pub id: PersonId,
    pub name: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub job_role: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub linkedin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<PersonId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub direct_reports: Vec<PersonId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<SkillAssignment>,
}

/// A node of the built hierarchy. Immutable once built.
///
/// Every walk over the tree, drop included, uses an explicit stack, so
/// depth is bounded by memory rather than by the call stack.
#[derive(Debug)]
pub struct OrgNode {
    pub person_id: PersonId,
    pub display_name: String,
    pub role: String,
    pub team: String,
    pub location: String,
    pub email: String,
    pub children: Vec<OrgNode>,
}

impl OrgNode {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn find(&self, id: PersonId) -> Option<&OrgNode> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.person_id == id {
                return Some(node);
            }
            stack.extend(node.children.iter());
        }
        None
    }

    /// Ids of this node and all its descendants, pre-order.
    pub fn ids(&self) -> Vec<PersonId> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node.person_id);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, level)) = stack.pop() {
            deepest = deepest.max(level);
            stack.extend(node.children.iter().map(|child| (child, level + 1)));
        }
        deepest
    }
}

impl Drop for OrgNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeAttributes {
    pub id: String,
    pub name: String,
    pub role: String,
    pub team: String,
    pub location: String,
    pub email: String,
    pub has_children: bool,
}

/// Renderer-facing view of a node; `children` is present only when expanded.
#[derive(Debug, Serialize)]
pub struct RawNode {
    pub name: String,
    pub attributes: NodeAttributes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<RawNode>>,
}

impl Drop for RawNode {
    fn drop(&mut self) {
        let mut pending = self.children.take().unwrap_or_default();
        while let Some(mut node) = pending.pop() {
            if let Some(mut children) = node.children.take() {
                pending.append(&mut children);
            }
        }
    }
}
