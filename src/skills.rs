use std::path::Path;

use indexmap::IndexSet;

use crate::error::{Result, TalentError};
use crate::models::SkillDefinition;

pub const LEVEL_DESCRIPTIONS: [(u8, &str); 5] = [
    (1, "Beginner - Basic knowledge, needs guidance"),
    (2, "Intermediate - Can work with supervision"),
    (3, "Proficient - Works independently on most tasks"),
    (4, "Advanced - Deep knowledge, can teach others"),
    (5, "Expert - Subject matter expert, leads initiatives"),
];

/// Expected years of experience per proficiency level, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearsRule {
    pub min: u32,
    pub max: u32,
}

pub fn years_rule(level: u8) -> Option<YearsRule> {
    let (min, max) = match level {
        1 => (0, 2),
        2 => (1, 3),
        3 => (2, 5),
        4 => (3, 8),
        5 => (5, 999),
        _ => return None,
    };
    Some(YearsRule { min, max })
}

pub fn validate_level(level: u8, years: u32) -> Result<()> {
    let rule = years_rule(level).ok_or(TalentError::InvalidLevel(level))?;
    if years < rule.min {
        return Err(TalentError::TooFewYears {
            level,
            min: rule.min,
        });
    }
    if years > rule.max {
        return Err(TalentError::TooManyYears {
            level,
            max: rule.max,
        });
    }
    Ok(())
}

pub fn level_description(level: u8) -> Option<&'static str> {
    LEVEL_DESCRIPTIONS
        .iter()
        .find(|(l, _)| *l == level)
        .map(|(_, d)| *d)
}

/// Parses an `id,name,category` catalog. The first row is a header; blank
/// rows are skipped and fields are read by position.
pub fn parse_catalog(text: &str) -> Result<Vec<SkillDefinition>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut skills = Vec::new();
    for row in reader.records() {
        let row = row?;
        let id = row.get(0).unwrap_or_default();
        if id.is_empty() {
            continue;
        }
        skills.push(SkillDefinition {
            id: id.to_string(),
            name: row.get(1).unwrap_or_default().to_string(),
            category: row.get(2).unwrap_or_default().to_string(),
        });
    }
    Ok(skills)
}

pub async fn load_catalog(path: &Path) -> Result<Vec<SkillDefinition>> {
    let text = tokio::fs::read_to_string(path).await?;
    let skills = parse_catalog(&text)?;
    tracing::debug!(path = %path.display(), count = skills.len(), "loaded skill catalog");
    Ok(skills)
}

pub fn skills_by_category<'a>(skills: &'a [SkillDefinition], category: &str) -> Vec<&'a SkillDefinition> {
    skills.iter().filter(|s| s.category == category).collect()
}

pub fn all_categories(skills: &[SkillDefinition]) -> Vec<String> {
    skills
        .iter()
        .map(|s| s.category.as_str())
        .collect::<IndexSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = "id,name,category\n\
        js, JavaScript ,Frontend\n\
        \n\
        rust,Rust,Backend\n\
        sql,SQL,Backend\n";

    #[test]
    fn parses_catalog_and_skips_blank_lines() {
        let skills = parse_catalog(CATALOG).unwrap();
        assert_eq!(skills.len(), 3);
        assert_eq!(skills[0].name, "JavaScript");
        assert_eq!(skills[2].category, "Backend");
    }

    #[test]
    fn header_only_catalog_is_empty() {
        assert!(parse_catalog("id,name,category\n").unwrap().is_empty());
        assert!(parse_catalog("").unwrap().is_empty());
    }

    #[test]
    fn short_rows_default_missing_fields() {
        let skills = parse_catalog("id,name,category\ngo,Go\n").unwrap();
        assert_eq!(skills[0].name, "Go");
        assert_eq!(skills[0].category, "");
    }

    #[test]
    fn categories_in_first_seen_order() {
        let skills = parse_catalog(CATALOG).unwrap();
        assert_eq!(all_categories(&skills), vec!["Frontend", "Backend"]);
        let backend = skills_by_category(&skills, "Backend");
        assert_eq!(backend.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(), vec!["rust", "sql"]);
    }

    #[test]
    fn level_rules_bound_years() {
        assert!(validate_level(1, 0).is_ok());
        assert!(validate_level(5, 20).is_ok());
        assert!(matches!(
            validate_level(3, 1),
            Err(TalentError::TooFewYears { level: 3, min: 2 })
        ));
        assert!(matches!(
            validate_level(2, 4),
            Err(TalentError::TooManyYears { level: 2, max: 3 })
        ));
        assert!(matches!(validate_level(0, 1), Err(TalentError::InvalidLevel(0))));
        assert!(matches!(validate_level(6, 1), Err(TalentError::InvalidLevel(6))));
    }

    #[test]
    fn every_level_has_description() {
        for level in 1..=5 {
            assert!(level_description(level).is_some());
        }
        assert!(level_description(9).is_none());
    }

    #[tokio::test]
    async fn loads_catalog_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skills.csv");
        std::fs::write(&path, CATALOG).unwrap();
        let skills = load_catalog(&path).await.unwrap();
        assert_eq!(skills.len(), 3);
    }
}
