//! `vizeval.yaml` loading.
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `VIZEVAL_CACHE_DIR` | Overrides `cache_dir` |
//! | `VIZEVAL_CONCURRENCY` | Overrides `concurrency` |

use crate::error::{EvalError, EvalResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;
pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_PROMPT_PREFIX: &str = "Generate a good visualization for this query: ";

pub const ENV_CACHE_DIR: &str = "VIZEVAL_CACHE_DIR";
pub const ENV_CONCURRENCY: &str = "VIZEVAL_CONCURRENCY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Benchmark JSONL file.
    pub tests: PathBuf,
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Deadline for one test's whole pipeline run.
    #[serde(default)]
    pub test_timeout_secs: Option<u64>,
    #[serde(default)]
    pub max_tests_per_group: Option<usize>,
    #[serde(default = "default_prompt_prefix")]
    pub prompt_prefix: String,
    pub agent: AgentConfig,
    pub checks: ChecksConfig,
    #[serde(default)]
    pub judge: JudgeConfig,
}

/// External program invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(flatten)]
    pub command: CommandSpec,
    /// Arguments for the once-per-group setup call (e.g. schema introspection).
    /// No setup call is made when absent.
    #[serde(default)]
    pub setup_args: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecksConfig {
    pub surface_form: CommandSpec,
    pub deconstruct: CommandSpec,
    pub chart_type: CommandSpec,
    pub data: CommandSpec,
    pub order: CommandSpec,
    /// Layout engine; the layout check is skipped when absent.
    #[serde(default)]
    pub layout: Option<CommandSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JudgeProvider {
    #[default]
    None,
    Openai,
    Fake,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeConfig {
    #[serde(default)]
    pub provider: JudgeProvider,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Canned answer for the `fake` provider.
    #[serde(default)]
    pub fake_response: Option<String>,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            provider: JudgeProvider::None,
            model: None,
            base_url: None,
            api_key_env: default_api_key_env(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            fake_response: None,
        }
    }
}

impl JudgeConfig {
    pub fn enabled(&self) -> bool {
        self.provider != JudgeProvider::None
    }
}

fn default_version() -> u32 {
    SUPPORTED_CONFIG_VERSION
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_prompt_prefix() -> String {
    DEFAULT_PROMPT_PREFIX.to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_max_tokens() -> u32 {
    512
}

pub fn load_config(path: &Path) -> EvalResult<EvalConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        EvalError::config(format!("failed to read config {}: {}", path.display(), e))
    })?;
    let mut cfg: EvalConfig = serde_yaml::from_str(&raw)
        .map_err(|e| EvalError::config(format!("failed to parse YAML: {}", e)))?;

    if cfg.version != SUPPORTED_CONFIG_VERSION {
        return Err(EvalError::config(format!(
            "unsupported config version {} (supported: {})",
            cfg.version, SUPPORTED_CONFIG_VERSION
        )));
    }

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    cfg.tests = resolve(base, &cfg.tests);
    cfg.cache_dir = cfg.cache_dir.as_deref().map(|p| resolve(base, p));

    cfg.apply_env_overrides()?;
    cfg.validate()?;
    Ok(cfg)
}

fn resolve(base: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

impl EvalConfig {
    /// `cache_dir`, or the per-user cache directory.
    pub fn cache_root(&self) -> EvalResult<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => crate::storage::FsBlobStore::default_root(),
        }
    }

    pub fn apply_env_overrides(&mut self) -> EvalResult<()> {
        if let Ok(dir) = std::env::var(ENV_CACHE_DIR) {
            if !dir.is_empty() {
                self.cache_dir = Some(PathBuf::from(dir));
            }
        }
        if let Ok(raw) = std::env::var(ENV_CONCURRENCY) {
            self.concurrency = raw.trim().parse().map_err(|_| {
                EvalError::config(format!("{} must be a positive integer, got {:?}", ENV_CONCURRENCY, raw))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> EvalResult<()> {
        if self.concurrency == 0 {
            return Err(EvalError::config("concurrency must be at least 1"));
        }
        if self.judge.provider == JudgeProvider::Openai && self.judge.model.is_none() {
            return Err(EvalError::config("judge provider openai requires judge.model"));
        }
        if self.max_tests_per_group == Some(0) {
            return Err(EvalError::config("max_tests_per_group must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    const MINIMAL: &str = r#"
version: 1
tests: data/tests.jsonl
agent:
  program: ./agent.sh
  setup_args: ["--introspect"]
checks:
  surface_form: { program: ./check.sh, args: ["surface"] }
  deconstruct: { program: ./check.sh, args: ["deconstruct"] }
  chart_type: { program: ./check.sh, args: ["chart"] }
  data: { program: ./check.sh, args: ["data"] }
  order: { program: ./check.sh, args: ["order"] }
"#;

    fn write_config(body: &str) -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("vizeval.yaml");
        std::fs::write(&path, body).unwrap();
        (tmp, path)
    }

    #[test]
    #[serial]
    fn minimal_config_gets_defaults() {
        std::env::remove_var(ENV_CACHE_DIR);
        std::env::remove_var(ENV_CONCURRENCY);
        let (tmp, path) = write_config(MINIMAL);
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(cfg.prompt_prefix, DEFAULT_PROMPT_PREFIX);
        assert_eq!(cfg.tests, tmp.path().join("data/tests.jsonl"));
        assert_eq!(cfg.cache_dir, None);
        assert!(!cfg.judge.enabled());
        assert!(cfg.checks.layout.is_none());
        assert_eq!(
            cfg.agent.setup_args.as_deref(),
            Some(&["--introspect".to_string()][..])
        );
    }

    #[test]
    #[serial]
    fn env_overrides_apply() {
        let (_tmp, path) = write_config(MINIMAL);
        std::env::set_var(ENV_CACHE_DIR, "/tmp/vizeval-env-cache");
        std::env::set_var(ENV_CONCURRENCY, "3");
        let cfg = load_config(&path);
        std::env::remove_var(ENV_CACHE_DIR);
        std::env::remove_var(ENV_CONCURRENCY);

        let cfg = cfg.unwrap();
        assert_eq!(cfg.concurrency, 3);
        assert_eq!(cfg.cache_dir, Some(PathBuf::from("/tmp/vizeval-env-cache")));
    }

    #[test]
    #[serial]
    fn zero_concurrency_is_rejected() {
        std::env::remove_var(ENV_CONCURRENCY);
        let (_tmp, path) = write_config(&format!("{}concurrency: 0\n", MINIMAL));
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("concurrency"));
    }

    #[test]
    #[serial]
    fn unsupported_version_is_rejected() {
        let (_tmp, path) = write_config(&MINIMAL.replace("version: 1", "version: 2"));
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, EvalError::Config { .. }));
    }

    #[test]
    #[serial]
    fn openai_judge_requires_model() {
        std::env::remove_var(ENV_CONCURRENCY);
        let (_tmp, path) = write_config(&format!("{}judge:\n  provider: openai\n", MINIMAL));
        assert!(load_config(&path).is_err());
    }
}
