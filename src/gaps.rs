use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::models::{PersonRecord, SkillDefinition};

/// Team x skill coverage, in percent of team members holding the skill.
/// Dense: every tracked team carries every catalog skill.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SkillGapTable(IndexMap<String, IndexMap<String, f64>>);

impl SkillGapTable {
    pub fn get(&self, team: &str, skill_id: &str) -> Option<f64> {
        self.0.get(team).and_then(|row| row.get(skill_id)).copied()
    }

    pub fn teams(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn row(&self, team: &str) -> Option<&IndexMap<String, f64>> {
        self.0.get(team)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Distinct non-blank teams in first-appearance order.
pub fn distinct_teams(records: &[PersonRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.team.as_str())
        .filter(|team| !team.is_empty())
        .collect::<IndexSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

pub fn team_sizes(records: &[PersonRecord], teams: &[String]) -> IndexMap<String, usize> {
    teams
        .iter()
        .map(|team| {
            let size = records.iter().filter(|r| &r.team == team).count();
            (team.clone(), size)
        })
        .collect()
}

pub fn compute_gaps(
    records: &[PersonRecord],
    skills: &[SkillDefinition],
    teams: &[String],
) -> SkillGapTable {
    let sizes = team_sizes(records, teams);

    let mut counts: IndexMap<String, IndexMap<String, usize>> = sizes
        .keys()
        .map(|team| {
            let row: IndexMap<String, usize> = skills.iter().map(|s| (s.id.clone(), 0)).collect();
            (team.clone(), row)
        })
        .collect();

    for record in records {
        let Some(row) = counts.get_mut(&record.team) else {
            continue;
        };
        // a person counts once per skill even if assigned twice
        let mut seen = HashSet::new();
        for assignment in &record.skills {
            if !seen.insert(assignment.skill_id.as_str()) {
                continue;
            }
            if let Some(count) = row.get_mut(&assignment.skill_id) {
                *count += 1;
            }
        }
    }

    let table: IndexMap<String, IndexMap<String, f64>> = counts
        .into_iter()
        .map(|(team, row)| {
            let size = sizes.get(&team).copied().unwrap_or(0);
            let row: IndexMap<String, f64> = row
                .into_iter()
                .map(|(skill_id, count)| (skill_id, percentage(count, size)))
                .collect();
            (team, row)
        })
        .collect();

    SkillGapTable(table)
}

fn percentage(count: usize, size: usize) -> f64 {
    if size == 0 {
        return 0.0;
    }
    100.0 * count as f64 / size as f64
}

/// 0 is red (no coverage), 120 is green (full coverage).
pub fn heat_hue(percentage: f64) -> f64 {
    percentage * 120.0 / 100.0
}

pub fn heat_color(percentage: f64) -> String {
    format!("hsl({}, 70%, 50%)", heat_hue(percentage))
}
