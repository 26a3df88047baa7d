use indexmap::IndexSet;

use crate::error::{Result, TalentError};
use crate::models::{PersonId, PersonRecord, SkillAssignment, SkillDefinition};
use crate::skills;
use crate::store::BlobStore;

pub const REQUIRED_HEADERS: [&str; 6] = ["name", "team", "location", "jobRole", "email", "phone"];

#[derive(Debug, Clone, Default)]
pub struct ImportOutcome {
    pub users: Vec<PersonRecord>,
    pub added: usize,
    pub updated: usize,
}

/// Imports a user CSV into `existing`. Rows are merged by name: a known name
/// keeps its stored id and skills, anything else is appended with a fresh id.
pub fn import_users(existing: &[PersonRecord], text: &str) -> Result<ImportOutcome> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let missing: Vec<String> = REQUIRED_HEADERS
        .iter()
        .filter(|h| !headers.iter().any(|have| have == *h))
        .map(|h| h.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(TalentError::MissingHeaders(missing));
    }

    let next_id = existing.iter().map(|u| u.id).max().unwrap_or(0) + 1;
    let mut rows: Vec<(PersonRecord, String)> = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut user = PersonRecord::default();
        let mut manager_name = String::new();
        for (header, value) in headers.iter().zip(row.iter()) {
            if value.is_empty() {
                continue;
            }
            match header.as_str() {
                "name" => user.name = value.to_string(),
                "team" => user.team = value.to_string(),
                "location" => user.location = value.to_string(),
                "jobRole" => user.job_role = value.to_string(),
                "email" => user.email = value.to_string(),
                "phone" => user.phone = value.to_string(),
                "linkedin" => user.linkedin = value.to_string(),
                "manager" => manager_name = value.to_string(),
                _ => {}
            }
        }
        if user.name.is_empty() {
            tracing::debug!(line = ?row.position().map(|p| p.line()), "skipping row without a name");
            continue;
        }

        user.id = next_id + rows.len() as PersonId;
        if user.email.is_empty() {
            user.email = email_from_name(&user.name);
        }
        if user.phone.is_empty() {
            user.phone = phone_from_id(user.id);
        }
        if user.linkedin.is_empty() {
            user.linkedin = linkedin_from_name(&user.name);
        }
        rows.push((user, manager_name));
    }

    let resolved: Vec<PersonRecord> = rows
        .iter()
        .map(|(user, manager_name)| {
            let mut user = user.clone();
            if !manager_name.is_empty() {
                user.manager_id = existing
                    .iter()
                    .find(|u| &u.name == manager_name)
                    .or_else(|| rows.iter().map(|(u, _)| u).find(|u| &u.name == manager_name))
                    .map(|u| u.id);
                if user.manager_id.is_none() {
                    tracing::debug!(user = %user.name, manager = %manager_name, "manager not found");
                }
            }
            user
        })
        .collect();

    let outcome = merge_by_name(existing, resolved);
    tracing::info!(added = outcome.added, updated = outcome.updated, "imported users");
    Ok(outcome)
}

/// Imports into the stored directory. An unreadable `users` blob aborts the
/// import and stays on disk as it was.
pub async fn import_into(store: &BlobStore, text: &str) -> Result<ImportOutcome> {
    let existing = store.users().await?;
    let outcome = import_users(&existing, text)?;
    store.save_users(&outcome.users).await?;
    Ok(outcome)
}

pub fn merge_by_name(existing: &[PersonRecord], incoming: Vec<PersonRecord>) -> ImportOutcome {
    let mut users = existing.to_vec();
    let (mut added, mut updated) = (0, 0);

    for user in incoming {
        match users.iter_mut().find(|u| u.name == user.name) {
            Some(current) => {
                current.team = user.team;
                current.location = user.location;
                current.job_role = user.job_role;
                current.email = user.email;
                current.phone = user.phone;
                current.linkedin = user.linkedin;
                if user.manager_id.is_some() {
                    current.manager_id = user.manager_id;
                }
                updated += 1;
            }
            None => {
                users.push(user);
                added += 1;
            }
        }
    }

    ImportOutcome {
        users,
        added,
        updated,
    }
}

fn email_from_name(name: &str) -> String {
    format!("{}@company.com", name.to_lowercase().replacen(' ', ".", 1))
}

fn linkedin_from_name(name: &str) -> String {
    format!("https://linkedin.com/in/{}", name.to_lowercase().replacen(' ', "-", 1))
}

/// Always `+1 (555) XXX-XXXX`, whatever the size or sign of the id.
fn phone_from_id(id: PersonId) -> String {
    format!("+1 (555) {:03}-{:04}", id.rem_euclid(1_000), id.rem_euclid(10_000))
}

#[derive(Debug, Clone, Default)]
pub struct DirectoryFilter {
    pub search: Option<String>,
    pub team: Option<String>,
    pub location: Option<String>,
    pub role: Option<String>,
}

impl DirectoryFilter {
    pub fn matches(&self, user: &PersonRecord) -> bool {
        if let Some(term) = self.search.as_deref().filter(|t| !t.is_empty()) {
            let term = term.to_lowercase();
            let hit = [&user.name, &user.team, &user.location, &user.job_role]
                .iter()
                .any(|field| field.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }
        exact(&self.team, &user.team) && exact(&self.location, &user.location) && exact(&self.role, &user.job_role)
    }

    pub fn apply<'a>(&self, users: &'a [PersonRecord]) -> Vec<&'a PersonRecord> {
        users.iter().filter(|u| self.matches(u)).collect()
    }
}

fn exact(wanted: &Option<String>, value: &str) -> bool {
    match wanted.as_deref() {
        Some(w) if !w.is_empty() => w == value,
        _ => true,
    }
}

pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// 1-based page; out-of-range pages are empty.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = (start + page_size).min(items.len());
    &items[start..end]
}

pub fn distinct_values<'a>(users: &'a [PersonRecord], field: impl Fn(&'a PersonRecord) -> &'a str) -> Vec<&'a str> {
    users
        .iter()
        .map(field)
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

pub fn export_csv(users: &[&PersonRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Name", "Team", "Location", "Job Role", "Email", "Phone", "LinkedIn"])?;
    for user in users {
        writer.write_record([
            &user.name,
            &user.team,
            &user.location,
            &user.job_role,
            &user.email,
            &user.phone,
            &user.linkedin,
        ])?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Users in any of `teams` holding any of `skill_ids`; empty selections match all.
pub fn filter_by_teams_and_skills<'a>(
    users: &'a [PersonRecord],
    teams: &[String],
    skill_ids: &[String],
) -> Vec<&'a PersonRecord> {
    users
        .iter()
        .filter(|u| teams.is_empty() || teams.contains(&u.team))
        .filter(|u| skill_ids.is_empty() || u.skills.iter().any(|s| skill_ids.contains(&s.skill_id)))
        .collect()
}

pub fn assign_skill(
    users: &mut [PersonRecord],
    catalog: &[SkillDefinition],
    user_id: PersonId,
    assignment: SkillAssignment,
) -> Result<()> {
    let user = users
        .iter_mut()
        .find(|u| u.id == user_id)
        .ok_or(TalentError::UserNotFound(user_id))?;
    if !catalog.iter().any(|s| s.id == assignment.skill_id) {
        return Err(TalentError::SkillNotFound(assignment.skill_id));
    }
    if user.skills.iter().any(|s| s.skill_id == assignment.skill_id) {
        return Err(TalentError::DuplicateSkill {
            user: user_id,
            skill: assignment.skill_id,
        });
    }
    skills::validate_level(assignment.level, assignment.years_of_experience)?;

    tracing::info!(user = user_id, skill = %assignment.skill_id, level = assignment.level, "assigned skill");
    user.skills.push(assignment);
    Ok(())
}

/// Returns whether the skill was present.
pub fn remove_skill(users: &mut [PersonRecord], user_id: PersonId, skill_id: &str) -> Result<bool> {
    let user = users
        .iter_mut()
        .find(|u| u.id == user_id)
        .ok_or(TalentError::UserNotFound(user_id))?;
    let before = user.skills.len();
    user.skills.retain(|s| s.skill_id != skill_id);
    Ok(user.skills.len() != before)
}
