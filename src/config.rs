use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TalentError};
use crate::orgchart::RootPolicy;
use crate::store::{BlobStore, SETTINGS_KEY};

pub const DEFAULT_DATA_DIR: &str = ".talentmap";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_legacy_root_name")]
    pub legacy_root_name: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub skills_catalog: Option<PathBuf>,
}

fn default_legacy_root_name() -> Option<String> {
    Some("John Doe".to_string())
}

fn default_page_size() -> usize {
    20
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            legacy_root_name: default_legacy_root_name(),
            page_size: default_page_size(),
            skills_catalog: None,
        }
    }
}

impl Settings {
    pub async fn load(store: &BlobStore) -> Result<Self> {
        Ok(store.get(SETTINGS_KEY).await?.unwrap_or_default())
    }

    pub async fn save(&self, store: &BlobStore) -> Result<()> {
        if self.page_size == 0 {
            return Err(TalentError::InvalidPageSize);
        }
        store.put(SETTINGS_KEY, self).await
    }

    pub fn root_policy(&self) -> RootPolicy {
        RootPolicy {
            legacy_name: self.legacy_root_name.clone(),
        }
    }
}
