use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::answers::AnswerClientConfig;
use crate::error::{HubError, Result};
use crate::recommend::RecommenderConfig;
use crate::search::HybridConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub recommend: RecommendConfig,
    #[serde(default)]
    pub answers: AnswersConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub robot: RobotConfig,
}

impl Config {
    /// Defaults, then global and root config files (or only the explicit
    /// one), then `SOHUB_*` environment overrides.
    pub fn load(explicit_path: Option<&Path>, root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("SOHUB_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            let patch = Self::load_patch(&path)?.ok_or_else(|| {
                HubError::MissingConfig(format!("config file {} not found", path.display()))
            })?;
            config.merge_patch(patch);
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_patch(&root.join("config.toml"))? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Parse a single TOML document over the defaults.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let patch: ConfigPatch =
            toml::from_str(raw).map_err(|err| HubError::Config(format!("parse config: {err}")))?;
        let mut config = Self::default();
        config.merge_patch(patch);
        config.validate()?;
        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        match dirs::config_dir() {
            Some(dir) => Self::load_patch(&dir.join("sohub/config.toml")),
            None => Ok(None),
        }
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| HubError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| HubError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.data {
            self.data.merge(patch);
        }
        if let Some(patch) = patch.search {
            self.search.merge(patch);
        }
        if let Some(patch) = patch.recommend {
            self.recommend.merge(patch);
        }
        if let Some(patch) = patch.answers {
            self.answers.merge(patch);
        }
        if let Some(patch) = patch.cache {
            self.cache.merge(patch);
        }
        if let Some(patch) = patch.robot {
            self.robot.merge(patch);
        }
    }

    /// Apply `SOHUB_*` overrides read through `lookup`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let env = EnvReader(lookup);

        if let Some(value) = env.string("SOHUB_CORPUS") {
            self.data.corpus_path = PathBuf::from(value);
        }
        if let Some(value) = env.string("SOHUB_INDEX") {
            self.data.index_path = PathBuf::from(value);
        }
        if let Some(value) = env.string("SOHUB_PROFILE_DB") {
            self.data.profile_db = PathBuf::from(value);
        }

        if let Some(value) = env.parse::<usize>("SOHUB_TOP_K")? {
            self.search.default_top_k = value;
        }
        if let Some(value) = env.parse::<f32>("SOHUB_SEMANTIC_WEIGHT")? {
            self.search.semantic_weight = value;
        }
        if let Some(value) = env.parse::<f32>("SOHUB_PERSONALIZATION_WEIGHT")? {
            self.search.personalization_weight = value;
        }
        if let Some(value) = env.parse::<usize>("SOHUB_EMBEDDING_DIMS")? {
            self.search.embedding_dims = value;
        }

        if let Some(value) = env.parse::<usize>("SOHUB_NUM_RECS")? {
            self.recommend.num_recs_per_tag = value;
            self.recommend.num_recs_all = value;
        }
        if let Some(value) = env.parse::<usize>("SOHUB_MAX_TOPICS")? {
            self.recommend.max_topics = value;
        }

        if env.bool("SOHUB_ANSWERS_DISABLED").unwrap_or(false) {
            self.answers.enabled = false;
        }
        if let Some(value) = env.string("SOHUB_API_BASE") {
            self.answers.api_base = value;
        }
        if let Some(value) = env.string("SOHUB_SITE") {
            self.answers.site = value;
        }
        if let Some(value) = env.parse::<u64>("SOHUB_ANSWER_TIMEOUT")? {
            self.answers.timeout_seconds = value;
        }

        if env.bool("SOHUB_CACHE_DISABLED").unwrap_or(false) {
            self.cache.enabled = false;
        }
        if let Some(value) = env.parse::<u64>("SOHUB_CACHE_TTL")? {
            self.cache.ttl_seconds = value;
        }

        Ok(())
    }

    /// Reject values that would make ranking meaningless.
    pub fn validate(&self) -> Result<()> {
        let weights = [self.search.semantic_weight, self.search.personalization_weight];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(HubError::Config(
                "search weights must be finite and non-negative".to_string(),
            ));
        }
        let counts = [
            ("search.default_top_k", self.search.default_top_k),
            ("search.overfetch", self.search.overfetch),
            ("search.embedding_dims", self.search.embedding_dims),
            ("recommend.num_recs_per_tag", self.recommend.num_recs_per_tag),
            ("recommend.num_recs_all", self.recommend.num_recs_all),
            ("recommend.max_topics", self.recommend.max_topics),
            ("recommend.learning_path_limit", self.recommend.learning_path_limit),
        ];
        if let Some((name, _)) = counts.iter().find(|(_, value)| *value == 0) {
            return Err(HubError::Config(format!("{name} must be positive")));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Corpus table, Parquet or JSON Lines by extension. Relative paths
    /// resolve against the root
    pub corpus_path: PathBuf,
    /// Row-aligned vector index file
    pub index_path: PathBuf,
    /// SQLite profile database
    pub profile_db: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            corpus_path: PathBuf::from("corpus.parquet"),
            index_path: PathBuf::from("index.sovx"),
            profile_db: PathBuf::from("profiles.db"),
        }
    }
}

impl DataConfig {
    fn merge(&mut self, patch: DataPatch) {
        if let Some(value) = patch.corpus_path {
            self.corpus_path = value;
        }
        if let Some(value) = patch.index_path {
            self.index_path = value;
        }
        if let Some(value) = patch.profile_db {
            self.profile_db = value;
        }
    }

    #[must_use]
    pub fn corpus_path(&self, root: &Path) -> PathBuf {
        root.join(&self.corpus_path)
    }

    #[must_use]
    pub fn index_path(&self, root: &Path) -> PathBuf {
        root.join(&self.index_path)
    }

    #[must_use]
    pub fn profile_db(&self, root: &Path) -> PathBuf {
        root.join(&self.profile_db)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub default_top_k: usize,
    pub overfetch: usize,
    pub semantic_weight: f32,
    pub personalization_weight: f32,
    pub embedding_dims: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: 5,
            overfetch: 20,
            semantic_weight: 0.9,
            personalization_weight: 0.1,
            embedding_dims: 384,
        }
    }
}

impl SearchConfig {
    fn merge(&mut self, patch: SearchPatch) {
        if let Some(value) = patch.default_top_k {
            self.default_top_k = value;
        }
        if let Some(value) = patch.overfetch {
            self.overfetch = value;
        }
        if let Some(value) = patch.semantic_weight {
            self.semantic_weight = value;
        }
        if let Some(value) = patch.personalization_weight {
            self.personalization_weight = value;
        }
        if let Some(value) = patch.embedding_dims {
            self.embedding_dims = value;
        }
    }

    #[must_use]
    pub const fn hybrid(&self) -> HybridConfig {
        HybridConfig {
            semantic_weight: self.semantic_weight,
            personalization_weight: self.personalization_weight,
            overfetch: self.overfetch,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendConfig {
    pub num_recs_per_tag: usize,
    pub num_recs_all: usize,
    pub max_topics: usize,
    pub profile_bonus: u32,
    pub learning_path_limit: usize,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            num_recs_per_tag: 5,
            num_recs_all: 10,
            max_topics: 7,
            profile_bonus: 2,
            learning_path_limit: 20,
        }
    }
}

impl RecommendConfig {
    fn merge(&mut self, patch: RecommendPatch) {
        if let Some(value) = patch.num_recs_per_tag {
            self.num_recs_per_tag = value;
        }
        if let Some(value) = patch.num_recs_all {
            self.num_recs_all = value;
        }
        if let Some(value) = patch.max_topics {
            self.max_topics = value;
        }
        if let Some(value) = patch.profile_bonus {
            self.profile_bonus = value;
        }
        if let Some(value) = patch.learning_path_limit {
            self.learning_path_limit = value;
        }
    }

    #[must_use]
    pub const fn recommender(&self) -> RecommenderConfig {
        RecommenderConfig {
            max_topics: self.max_topics,
            profile_bonus: self.profile_bonus,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswersConfig {
    pub enabled: bool,
    pub api_base: String,
    pub site: String,
    pub timeout_seconds: u64,
}

impl Default for AnswersConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base: "https://api.stackexchange.com/2.3".to_string(),
            site: "stackoverflow".to_string(),
            timeout_seconds: 10,
        }
    }
}

impl AnswersConfig {
    fn merge(&mut self, patch: AnswersPatch) {
        if let Some(value) = patch.enabled {
            self.enabled = value;
        }
        if let Some(value) = patch.api_base {
            self.api_base = value;
        }
        if let Some(value) = patch.site {
            self.site = value;
        }
        if let Some(value) = patch.timeout_seconds {
            self.timeout_seconds = value;
        }
    }

    /// Client settings; a disabled cache keeps nothing between calls.
    #[must_use]
    pub fn client(&self, cache: &CacheConfig) -> AnswerClientConfig {
        AnswerClientConfig {
            api_base: self.api_base.clone(),
            site: self.site.clone(),
            timeout: Duration::from_secs(self.timeout_seconds),
            cache_ttl: if cache.enabled {
                Duration::from_secs(cache.ttl_seconds)
            } else {
                Duration::ZERO
            },
            cache_capacity: cache.max_entries,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_seconds: u64,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 3600,
            max_entries: 256,
        }
    }
}

impl CacheConfig {
    fn merge(&mut self, patch: CachePatch) {
        if let Some(value) = patch.enabled {
            self.enabled = value;
        }
        if let Some(value) = patch.ttl_seconds {
            self.ttl_seconds = value;
        }
        if let Some(value) = patch.max_entries {
            self.max_entries = value;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotConfig {
    /// Emit `timestamp` and `version` alongside robot payloads
    pub include_metadata: bool,
    pub pretty: bool,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            include_metadata: true,
            pretty: false,
        }
    }
}

impl RobotConfig {
    fn merge(&mut self, patch: RobotPatch) {
        if let Some(value) = patch.include_metadata {
            self.include_metadata = value;
        }
        if let Some(value) = patch.pretty {
            self.pretty = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigPatch {
    pub data: Option<DataPatch>,
    pub search: Option<SearchPatch>,
    pub recommend: Option<RecommendPatch>,
    pub answers: Option<AnswersPatch>,
    pub cache: Option<CachePatch>,
    pub robot: Option<RobotPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DataPatch {
    pub corpus_path: Option<PathBuf>,
    pub index_path: Option<PathBuf>,
    pub profile_db: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchPatch {
    pub default_top_k: Option<usize>,
    pub overfetch: Option<usize>,
    pub semantic_weight: Option<f32>,
    pub personalization_weight: Option<f32>,
    pub embedding_dims: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecommendPatch {
    pub num_recs_per_tag: Option<usize>,
    pub num_recs_all: Option<usize>,
    pub max_topics: Option<usize>,
    pub profile_bonus: Option<u32>,
    pub learning_path_limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct AnswersPatch {
    pub enabled: Option<bool>,
    pub api_base: Option<String>,
    pub site: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CachePatch {
    pub enabled: Option<bool>,
    pub ttl_seconds: Option<u64>,
    pub max_entries: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RobotPatch {
    pub include_metadata: Option<bool>,
    pub pretty: Option<bool>,
}

struct EnvReader<F>(F);

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    fn string(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.is_empty())
    }

    fn bool(&self, key: &str) -> Option<bool> {
        self.string(key)
            .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
    }

    fn parse<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.string(key) {
            Some(value) => value
                .parse::<T>()
                .map(Some)
                .map_err(|err| HubError::Config(format!("invalid {key} value {value}: {err}"))),
            None => Ok(None),
        }
    }
}
