use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use crate::error::{ProformaError, Result};

/// Rows per PDF file unless configured otherwise.
pub const DEFAULT_PDF_BATCH_SIZE: usize = 50;

// ---------------------------------------------------------------------------
// FormHeader
// ---------------------------------------------------------------------------

/// Title block and metadata line printed above the proforma table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormHeader {
    pub institution: String,
    pub department: String,
    pub form_title: String,
    pub college: String,
    pub category: String,
    pub tournament: String,
    pub year: String,
    pub manager: String,
}

impl Default for FormHeader {
    fn default() -> Self {
        Self {
            institution: "University".into(),
            department: "Department of Sports".into(),
            form_title: "Eligibility Proforma".into(),
            college: String::new(),
            category: String::new(),
            tournament: String::new(),
            year: String::new(),
            manager: String::new(),
        }
    }
}

impl FormHeader {
    /// The four labelled fields of the metadata line, left to right. College
    /// and category share the first slot.
    pub fn metadata_fields(&self) -> [String; 4] {
        [
            format!("College: {}   Category: {}", self.college, self.category),
            format!("Tournament: {}", self.tournament),
            format!("Year: {}", self.year),
            format!("Manager: {}", self.manager),
        ]
    }
}

// ---------------------------------------------------------------------------
// ProformaConfig
// ---------------------------------------------------------------------------

/// Application configuration stored at `~/.proforma/config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProformaConfig {
    /// Backend base URL, e.g. `https://sports.example.edu/api`.
    pub api_base_url: String,
    /// Where exported files are written.
    pub output_dir: PathBuf,
    pub pdf_batch_size: usize,
    pub log_level: String,
    pub form: FormHeader,
}

impl Default for ProformaConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".into(),
            output_dir: PathBuf::from("exports"),
            pdf_batch_size: DEFAULT_PDF_BATCH_SIZE,
            log_level: "info".into(),
            form: FormHeader::default(),
        }
    }
}

impl ProformaConfig {
    /// Returns the base config directory: `~/.proforma/`
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ProformaError::Config("Could not determine home directory".into()))?;
        Ok(home.join(".proforma"))
    }

    /// Returns the config file path: `~/.proforma/config.json`
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.json"))
    }

    /// Returns the logs directory: `~/.proforma/logs/`
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("logs"))
    }

    /// Ensures all required directories exist.
    pub fn ensure_dirs() -> Result<()> {
        for dir in [Self::base_dir()?, Self::logs_dir()?] {
            if !dir.exists() {
                std::fs::create_dir_all(&dir)?;
            }
        }
        Ok(())
    }

    /// Loads config from disk, or creates default if missing.
    pub fn load() -> Result<Self> {
        Self::ensure_dirs()?;
        let path = Self::config_path()?;
        Self::load_from_path(&path)
    }

    /// Load config from a specific file path, writing defaults when the file
    /// does not exist yet.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| ProformaError::Config(format!("{}: {e}", path.display())))?;
            config.validate()?;
            info!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            info!("Created default config at {}", path.display());
            Ok(config)
        }
    }

    /// Save config to a specific file path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.pdf_batch_size == 0 {
            return Err(ProformaError::Config(
                "pdf_batch_size must be at least 1".into(),
            ));
        }
        Url::parse(&self.api_base_url).map_err(|e| {
            ProformaError::Config(format!("invalid api_base_url {:?}: {e}", self.api_base_url))
        })?;
        Ok(())
    }
}
