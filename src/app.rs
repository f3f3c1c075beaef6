use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::answers::AnswerClient;
use crate::config::Config;
use crate::corpus::{Corpus, load_corpus};
use crate::error::{HubError, Result};
use crate::recommend::Recommender;
use crate::search::{Embedder, HashEmbedder, RequestContext, SearchEngine, TtlCache, VectorIndex};
use crate::storage::{Database, ProfileService, SqliteProfileStore, UserProfile};

/// User assumed when neither `--user` nor `SOHUB_USER` is given.
pub const DEFAULT_USER: &str = "local";

pub struct AppContext {
    pub root: PathBuf,
    pub config: Config,
    pub robot_mode: bool,
    pub user_id: String,
    engine: TtlCache<(), Arc<SearchEngine>>,
    profiles: TtlCache<(), Arc<ProfileService>>,
    answers: TtlCache<(), Arc<AnswerClient>>,
}

impl AppContext {
    pub fn from_cli(cli: &crate::cli::Cli) -> Result<Self> {
        let root = Self::find_root()?;
        let config = Config::load(cli.config.as_deref(), &root)?;
        let user_id = cli
            .user
            .clone()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USER.to_string());
        debug!(root = %root.display(), user_id, "app context ready");
        Ok(Self::new(root, config, cli.robot, user_id))
    }

    #[must_use]
    pub fn new(root: PathBuf, config: Config, robot_mode: bool, user_id: String) -> Self {
        Self {
            root,
            config,
            robot_mode,
            user_id,
            engine: TtlCache::new(1),
            profiles: TtlCache::new(1),
            answers: TtlCache::new(1),
        }
    }

    fn find_root() -> Result<PathBuf> {
        if let Ok(root) = std::env::var("SOHUB_ROOT") {
            return Ok(PathBuf::from(root));
        }
        let cwd = std::env::current_dir()?;
        if let Some(found) = find_upwards(&cwd, ".sohub") {
            return Ok(found);
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| HubError::MissingConfig("data directory not found".to_string()))?;
        Ok(data_dir.join("sohub"))
    }

    #[must_use]
    pub fn embedder(&self) -> Arc<dyn Embedder> {
        Arc::new(HashEmbedder::new(self.config.search.embedding_dims))
    }

    pub fn load_corpus(&self) -> Result<Corpus> {
        load_corpus(&self.config.data.corpus_path(&self.root))
    }

    /// Corpus, index and embedder, loaded on first use and kept for the
    /// life of the process. Any load failure is fatal to the caller.
    pub fn engine(&self) -> Result<Arc<SearchEngine>> {
        self.engine.get_or_load((), None, || {
            let corpus = Arc::new(self.load_corpus()?);
            let index = Arc::new(VectorIndex::load(&self.config.data.index_path(&self.root))?);
            let engine = SearchEngine::new(corpus, index, self.embedder())?
                .with_config(self.config.search.hybrid());
            info!(rows = engine.corpus().len(), "search engine ready");
            Ok(Arc::new(engine))
        })
    }

    pub fn recommender(&self) -> Result<Recommender> {
        let corpus = self.engine()?.shared_corpus();
        Ok(Recommender::with_config(corpus, self.config.recommend.recommender()))
    }

    pub fn profiles(&self) -> Result<Arc<ProfileService>> {
        self.profiles.get_or_load((), None, || {
            let db = Database::open(self.config.data.profile_db(&self.root))?;
            let store = Arc::new(SqliteProfileStore::new(db));
            Ok(Arc::new(ProfileService::new(store)))
        })
    }

    pub fn answers(&self) -> Result<Arc<AnswerClient>> {
        if !self.config.answers.enabled {
            return Err(HubError::Config(
                "answer lookups are disabled ([answers] enabled = false)".to_string(),
            ));
        }
        self.answers.get_or_load((), None, || {
            let config = self.config.answers.client(&self.config.cache);
            Ok(Arc::new(AnswerClient::new(config)?))
        })
    }

    /// Current user's profile, created on first access.
    pub fn profile(&self) -> Result<UserProfile> {
        self.profiles()?.get_or_create(&self.user_id)
    }

    /// Per-request snapshot of the current user's profile.
    pub fn request_context(&self) -> Result<RequestContext> {
        Ok(RequestContext::from_profile(&self.profile()?))
    }
}

fn find_upwards(start: &Path, name: &str) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        let candidate = dir.join(name);
        if candidate.is_dir() {
            return Some(candidate);
        }
        current = dir.parent();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::build_index;
    use crate::test_utils::fixtures::{UnitTestFixture, corpus, sample_documents};

    fn context(fixture: &UnitTestFixture) -> AppContext {
        AppContext::new(fixture.root.clone(), Config::default(), false, "tester".to_string())
    }

    #[test]
    fn test_find_upwards() {
        let fixture = UnitTestFixture::new();
        std::fs::create_dir_all(fixture.root.join(".sohub")).unwrap();
        let nested = fixture.root.join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_upwards(&nested, ".sohub"), Some(fixture.root.join(".sohub")));
    }

    #[test]
    fn test_engine_missing_index_is_fatal() {
        let fixture = UnitTestFixture::new();
        let _ = fixture.create_corpus(&sample_documents());
        let err = context(&fixture).engine().unwrap_err();
        assert!(err.is_load_fatal());
    }

    #[test]
    fn test_engine_loads_once() {
        let fixture = UnitTestFixture::new();
        let _ = fixture.create_corpus(&sample_documents());
        let ctx = context(&fixture);
        let index = build_index(&corpus(sample_documents()), ctx.embedder().as_ref()).unwrap();
        index.save(&ctx.config.data.index_path(&fixture.root)).unwrap();

        let first = ctx.engine().unwrap();
        let second = ctx.engine().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.corpus().len(), sample_documents().len());
    }

    #[test]
    fn test_stale_index_is_fatal() {
        let fixture = UnitTestFixture::new();
        let _ = fixture.create_corpus(&sample_documents());
        let ctx = context(&fixture);
        let short = corpus(sample_documents().into_iter().take(3).collect());
        build_index(&short, ctx.embedder().as_ref())
            .unwrap()
            .save(&ctx.config.data.index_path(&fixture.root))
            .unwrap();
        assert!(matches!(ctx.engine(), Err(HubError::IndexMismatch { .. })));
    }

    #[test]
    fn test_profile_created_on_first_access() {
        let fixture = UnitTestFixture::new();
        let ctx = context(&fixture);
        let profile = ctx.profile().unwrap();
        assert_eq!(profile.user_id, "tester");
        assert!(ctx.config.data.profile_db(&fixture.root).exists());
        assert!(ctx.request_context().unwrap().history.is_empty());
    }

    #[test]
    fn test_disabled_answers() {
        let fixture = UnitTestFixture::new();
        let mut ctx = context(&fixture);
        ctx.config.answers.enabled = false;
        assert!(matches!(ctx.answers(), Err(HubError::Config(_))));
    }
}
