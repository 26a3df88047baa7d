use std::fmt::Write;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::gaps::{self, SkillGapTable};
use crate::models::{RawNode, SkillDefinition};

pub fn render_outline(root: &RawNode) -> String {
    let mut output = String::new();
    let mut stack = vec![(root, 0)];
    while let Some((node, depth)) = stack.pop() {
        write_node(&mut output, node, depth);
        for child in node.children.iter().flatten().rev() {
            stack.push((child, depth + 1));
        }
    }
    output
}

fn write_node(output: &mut String, node: &RawNode, depth: usize) {
    let attrs = &node.attributes;
    let marker = if attrs.has_children && node.children.is_none() {
        " [+]"
    } else {
        ""
    };
    let _ = writeln!(
        output,
        "{}- {} ({}, {}) #{}{}",
        "  ".repeat(depth),
        node.name,
        attrs.role,
        attrs.team,
        attrs.id,
        marker
    );
}

/// Markdown heatmap: one row per skill, one column per team, whole percents.
pub fn render_gap_table(table: &SkillGapTable, skills: &[&SkillDefinition], teams: &[String]) -> String {
    let mut output = String::new();
    let _ = write!(output, "| Skill | Category |");
    for team in teams {
        let _ = write!(output, " {team} |");
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "|---|---|{}", "---:|".repeat(teams.len()));

    for skill in skills {
        let _ = write!(output, "| {} | {} |", skill.name, skill.category);
        for team in teams {
            let value = table.get(team, &skill.id).unwrap_or(0.0);
            let _ = write!(
                output,
                " <span style=\"color: {}\">{:.0}%</span> |",
                gaps::heat_color(value),
                value
            );
        }
        let _ = writeln!(output);
    }
    output
}

pub fn build_report(
    generated_at: DateTime<Utc>,
    org: Option<&RawNode>,
    team_sizes: &IndexMap<String, usize>,
    table: &SkillGapTable,
    skills: &[SkillDefinition],
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Talent Map Report");
    let _ = writeln!(output, "Generated {}", generated_at.format("%Y-%m-%d %H:%M UTC"));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Organization Chart");

    match org {
        Some(root) => output.push_str(&render_outline(root)),
        None => {
            let _ = writeln!(output, "No users loaded.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Team Sizes");

    if team_sizes.is_empty() {
        let _ = writeln!(output, "No teams recorded.");
    } else {
        for (team, size) in team_sizes {
            let _ = writeln!(output, "- {team}: {size} members");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Skills Gap Heatmap");

    if table.is_empty() || skills.is_empty() {
        let _ = writeln!(output, "No skills or teams to compare.");
    } else {
        let teams: Vec<String> = team_sizes.keys().cloned().collect();
        let skills: Vec<&SkillDefinition> = skills.iter().collect();
        output.push_str(&render_gap_table(table, &skills, &teams));
    }

    output
}
