use thiserror::Error;

#[derive(Debug, Error)]
pub enum TalentError {
    #[error("missing required headers: {}", .0.join(", "))]
    MissingHeaders(Vec<String>),

    #[error("user not found: {0}")]
    UserNotFound(i64),

    #[error("skill not found in catalog: {0}")]
    SkillNotFound(String),

    #[error("skill '{skill}' already assigned to user {user}")]
    DuplicateSkill { user: i64, skill: String },

    #[error("invalid skill level: {0}")]
    InvalidLevel(u8),

    #[error("level {level} requires at least {min} year{}", plural(.min))]
    TooFewYears { level: u8, min: u32 },

    #[error("level {level} typically has up to {max} year{}", plural(.max))]
    TooManyYears { level: u8, max: u32 },

    #[error("page size must be at least 1")]
    InvalidPageSize,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

fn plural(n: &u32) -> &'static str {
    if *n == 1 {
        ""
    } else {
        "s"
    }
}

pub type Result<T> = std::result::Result<T, TalentError>;
