use crate::error::{NorthfallError, Result};
use crate::job::{BackendCommand, JobContext};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_PORT: u16 = 4117;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// IdentityConfig / ContractConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractConfig {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// WebSocket endpoint the terminal submits jobs to.
    #[serde(default = "default_server_url")]
    pub url: String,
    /// Port `winter serve` listens on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_server_url() -> String {
    format!("ws://127.0.0.1:{DEFAULT_PORT}/api/jobs/ws")
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// ExecutorConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Program and arguments run for each backend command.
    #[serde(default = "default_jobs")]
    pub jobs: BTreeMap<BackendCommand, Vec<String>>,
    #[serde(default)]
    pub max_retries: u32,
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn default_jobs() -> BTreeMap<BackendCommand, Vec<String>> {
    BTreeMap::from([
        (BackendCommand::Build, argv(&["anchor", "build"])),
        (BackendCommand::Test, argv(&["anchor", "test"])),
        (
            BackendCommand::DeployDevnet,
            argv(&["anchor", "deploy", "--provider.cluster", "devnet"]),
        ),
        (
            BackendCommand::DeployMainnet,
            argv(&["anchor", "deploy", "--provider.cluster", "mainnet"]),
        ),
        (BackendCommand::Verify, argv(&["anchor", "verify"])),
    ])
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            max_retries: 0,
        }
    }
}

impl ExecutorConfig {
    pub fn argv_for(&self, command: BackendCommand) -> Option<&[String]> {
        self.jobs
            .get(&command)
            .map(Vec::as_slice)
            .filter(|argv| !argv.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub contract: ContractConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
}

fn default_version() -> u32 {
    1
}

impl Config {
    pub fn new(
        user_id: impl Into<String>,
        contract_id: impl Into<String>,
        contract_name: impl Into<String>,
    ) -> Self {
        Self {
            version: 1,
            identity: IdentityConfig {
                user_id: user_id.into(),
            },
            contract: ContractConfig {
                id: contract_id.into(),
                name: contract_name.into(),
            },
            server: ServerConfig::default(),
            executor: ExecutorConfig::default(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(NorthfallError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Write this config only if none exists yet. Returns `false` when an
    /// existing file was kept.
    pub fn save_if_missing(&self, root: &Path) -> Result<bool> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::write_if_missing(&path, data.as_bytes())
    }

    pub fn job_context(&self) -> JobContext {
        JobContext::new(
            self.identity.user_id.clone(),
            self.contract.id.clone(),
            self.contract.name.clone(),
        )
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.identity.user_id.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "identity.user_id is empty; the job server will reject submissions"
                    .to_string(),
            });
        }

        if self.contract.id.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "contract.id is empty; the job server will reject submissions"
                    .to_string(),
            });
        }

        if self.contract.name.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "contract.name is empty".to_string(),
            });
        }

        match url::Url::parse(&self.server.url) {
            Ok(u) if matches!(u.scheme(), "ws" | "wss") => {}
            Ok(u) => warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "server.url '{}' uses scheme '{}'; expected ws or wss",
                    self.server.url,
                    u.scheme()
                ),
            }),
            Err(e) => warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("server.url '{}' is not a valid URL: {e}", self.server.url),
            }),
        }

        for command in BackendCommand::all() {
            if command.is_submittable() && self.executor.argv_for(*command).is_none() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("executor.jobs has no program for {command}"),
                });
            }
        }

        warnings
    }
}
