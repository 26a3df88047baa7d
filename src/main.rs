use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand};

use talentmap::config::{self, Settings};
use talentmap::directory::{self, DirectoryFilter};
use talentmap::expansion::OrgChart;
use talentmap::models::{SkillAssignment, SkillDefinition};
use talentmap::store::BlobStore;
use talentmap::{gaps, report, skills};

#[derive(Parser)]
#[command(name = "talentmap")]
#[command(about = "Org chart and skills matrix for a personnel directory", long_about = None)]
struct Cli {
    /// Directory holding the JSON blobs
    #[arg(long, global = true, env = "TALENTMAP_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log at info level unless RUST_LOG says otherwise
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct FilterArgs {
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    team: Option<String>,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    role: Option<String>,
}

impl From<FilterArgs> for DirectoryFilter {
    fn from(args: FilterArgs) -> Self {
        Self {
            search: args.search,
            team: args.team,
            location: args.location,
            role: args.role,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Import users from a CSV file, merging by name
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// List users in the directory
    Users {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// List the distinct teams, locations and roles instead
        #[arg(long)]
        facets: bool,
    },
    /// Export the (filtered) directory as CSV
    Export {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, default_value = "users.csv")]
        out: PathBuf,
    },
    /// Show the organization chart
    #[command(group(
        ArgGroup::new("bulk")
            .args(["expand_all", "collapse_all"])
            .multiple(false)
    ))]
    Org {
        /// Toggle a node, in order; may repeat
        #[arg(long = "toggle")]
        toggles: Vec<i64>,
        #[arg(long)]
        expand_all: bool,
        #[arg(long)]
        collapse_all: bool,
        /// Print the renderer tree as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the skill catalog
    Skills {
        #[arg(long)]
        skills: Option<PathBuf>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Add a skill to a user
    AssignSkill {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        skill: String,
        #[arg(long)]
        level: u8,
        #[arg(long)]
        years: u32,
        #[arg(long)]
        skills: Option<PathBuf>,
    },
    /// Remove a skill from a user
    RemoveSkill {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        skill: String,
    },
    /// Users with their skills, filtered by team and skill
    Matrix {
        #[arg(long)]
        skills: Option<PathBuf>,
        #[arg(long = "team")]
        teams: Vec<String>,
        #[arg(long = "skill")]
        skill_ids: Vec<String>,
    },
    /// Team x skill coverage percentages
    Gaps {
        #[arg(long)]
        skills: Option<PathBuf>,
        /// Only show these teams; may repeat
        #[arg(long = "team")]
        teams: Vec<String>,
        /// Only show these skill ids; may repeat
        #[arg(long = "skill")]
        skill_ids: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        skills: Option<PathBuf>,
        #[arg(long)]
        expand_all: bool,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Inspect or change persisted settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Show,
    SetRootName { name: String },
    ClearRootName,
    SetPageSize { size: usize },
    SetCatalog { path: PathBuf },
}

async fn load_catalog(flag: Option<PathBuf>, settings: &Settings) -> anyhow::Result<Vec<SkillDefinition>> {
    let Some(path) = flag.or_else(|| settings.skills_catalog.clone()) else {
        anyhow::bail!("no skill catalog: pass --skills or run `config set-catalog`");
    };
    skills::load_catalog(&path)
        .await
        .with_context(|| format!("failed to read skill catalog {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_DATA_DIR));
    let store = BlobStore::new(data_dir);
    let settings = Settings::load(&store)
        .await
        .context("failed to load settings")?;

    match cli.command {
        Commands::Import { csv } => {
            let text = tokio::fs::read_to_string(&csv)
                .await
                .with_context(|| format!("failed to read {}", csv.display()))?;
            let outcome = directory::import_into(&store, &text)
                .await
                .context("import aborted, stored users left unchanged")?;
            println!(
                "Added {} and updated {} users from {}.",
                outcome.added,
                outcome.updated,
                csv.display()
            );
        }
        Commands::Users {
            filter,
            page,
            facets,
        } => {
            let users = store.load_users().await;
            if facets {
                let teams = directory::distinct_values(&users, |u| u.team.as_str());
                let locations = directory::distinct_values(&users, |u| u.location.as_str());
                let roles = directory::distinct_values(&users, |u| u.job_role.as_str());
                println!("Teams: {}", teams.join(", "));
                println!("Locations: {}", locations.join(", "));
                println!("Roles: {}", roles.join(", "));
                return Ok(());
            }
            let filtered = DirectoryFilter::from(filter).apply(&users);
            if filtered.is_empty() {
                println!("No users match.");
                return Ok(());
            }

            let pages = directory::page_count(filtered.len(), settings.page_size);
            for user in directory::paginate(&filtered, page, settings.page_size) {
                let manager = user
                    .manager_id
                    .and_then(|id| users.iter().find(|u| u.id == id))
                    .map_or("None", |m| m.name.as_str());
                println!(
                    "- #{} {} ({}, {}, {}) manager: {}",
                    user.id, user.name, user.job_role, user.team, user.location, manager
                );
            }
            println!("Page {page} of {pages} ({} users).", filtered.len());
        }
        Commands::Export { filter, out } => {
            let users = store.load_users().await;
            let filtered = DirectoryFilter::from(filter).apply(&users);
            let csv = directory::export_csv(&filtered)?;
            tokio::fs::write(&out, csv).await?;
            println!("Exported {} users to {}.", filtered.len(), out.display());
        }
        Commands::Org {
            toggles,
            expand_all,
            collapse_all,
            json,
        } => {
            let users = store.load_users().await;
            let mut chart = OrgChart::build(&users, &settings.root_policy());
            if expand_all {
                chart.expand_all();
            } else if collapse_all {
                chart.collapse_all();
            }
            for id in toggles {
                chart.toggle(id);
            }

            let Some(tree) = chart.project() else {
                println!("No users loaded.");
                return Ok(());
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&tree)?);
            } else {
                print!("{}", report::render_outline(&tree));
                let label = if chart.is_fully_expanded() {
                    "fully expanded"
                } else {
                    "partially collapsed"
                };
                println!("({label})");
            }
        }
        Commands::Skills {
            skills: catalog_path,
            category,
        } => {
            let catalog = load_catalog(catalog_path, &settings).await?;
            let categories = match category {
                Some(category) => vec![category],
                None => skills::all_categories(&catalog),
            };
            for category in categories {
                println!("{category}:");
                for skill in skills::skills_by_category(&catalog, &category) {
                    println!("  - {} ({})", skill.name, skill.id);
                }
            }
        }
        Commands::AssignSkill {
            user,
            skill,
            level,
            years,
            skills: catalog_path,
        } => {
            let catalog = load_catalog(catalog_path, &settings).await?;
            let mut users = store
                .users()
                .await
                .context("could not read stored users")?;
            let assignment = SkillAssignment {
                skill_id: skill.clone(),
                level,
                years_of_experience: years,
            };
            directory::assign_skill(&mut users, &catalog, user, assignment)?;
            store.save_users(&users).await?;
            let description = skills::level_description(level).unwrap_or_default();
            println!("Assigned {skill} to #{user} at level {level} ({description}).");
        }
        Commands::RemoveSkill { user, skill } => {
            let mut users = store
                .users()
                .await
                .context("could not read stored users")?;
            if directory::remove_skill(&mut users, user, &skill)? {
                store.save_users(&users).await?;
                println!("Removed {skill} from #{user}.");
            } else {
                println!("#{user} does not have {skill}.");
            }
        }
        Commands::Matrix {
            skills: catalog_path,
            teams,
            skill_ids,
        } => {
            let catalog = load_catalog(catalog_path, &settings).await?;
            let users = store.load_users().await;
            let matched = directory::filter_by_teams_and_skills(&users, &teams, &skill_ids);
            if matched.is_empty() {
                println!("No users match.");
                return Ok(());
            }
            for user in matched {
                let chips: Vec<String> = user
                    .skills
                    .iter()
                    .map(|s| {
                        let name = catalog
                            .iter()
                            .find(|d| d.id == s.skill_id)
                            .map_or(s.skill_id.as_str(), |d| d.name.as_str());
                        format!("{} ({}★, {}y)", name, s.level, s.years_of_experience)
                    })
                    .collect();
                println!("- {} [{}]: {}", user.name, user.team, chips.join(", "));
            }
        }
        Commands::Gaps {
            skills: catalog_path,
            teams,
            skill_ids,
            json,
        } => {
            let catalog = load_catalog(catalog_path, &settings).await?;
            let users = store.load_users().await;
            let all_teams = gaps::distinct_teams(&users);
            let table = gaps::compute_gaps(&users, &catalog, &all_teams);

            if json {
                println!("{}", serde_json::to_string_pretty(&table)?);
                return Ok(());
            }

            let shown_teams: Vec<String> = all_teams
                .into_iter()
                .filter(|t| teams.is_empty() || teams.contains(t))
                .collect();
            let shown_skills: Vec<&SkillDefinition> = catalog
                .iter()
                .filter(|s| skill_ids.is_empty() || skill_ids.contains(&s.id))
                .collect();
            if shown_teams.is_empty() || shown_skills.is_empty() {
                println!("No skills or teams to compare.");
                return Ok(());
            }
            print!("{}", report::render_gap_table(&table, &shown_skills, &shown_teams));
        }
        Commands::Report {
            skills: catalog_path,
            expand_all,
            out,
        } => {
            let catalog = load_catalog(catalog_path, &settings).await?;
            let users = store.load_users().await;
            let mut chart = OrgChart::build(&users, &settings.root_policy());
            if expand_all {
                chart.expand_all();
            }
            let teams = gaps::distinct_teams(&users);
            let sizes = gaps::team_sizes(&users, &teams);
            let table = gaps::compute_gaps(&users, &catalog, &teams);
            let report = report::build_report(
                chrono::Utc::now(),
                chart.project().as_ref(),
                &sizes,
                &table,
                &catalog,
            );
            tokio::fs::write(&out, report).await?;
            println!("Report written to {}.", out.display());
        }
        Commands::Config { action } => {
            let mut settings = settings;
            match action {
                ConfigAction::Show => {
                    println!("{}", serde_json::to_string_pretty(&settings)?);
                    return Ok(());
                }
                ConfigAction::SetRootName { name } => settings.legacy_root_name = Some(name),
                ConfigAction::ClearRootName => settings.legacy_root_name = None,
                ConfigAction::SetPageSize { size } => settings.page_size = size,
                ConfigAction::SetCatalog { path } => settings.skills_catalog = Some(path),
            }
            settings.save(&store).await?;
            println!("Settings saved to {}.", store.dir().display());
        }
    }

    Ok(())
}
