use crate::config::ZenusConfig;
use crate::store::fs::FsRepository;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub struct TestEnv {
    // Kept so the directory lives as long as the env
    pub _temp_dir: TempDir,
    pub repo: Arc<FsRepository>,
    pub config: ZenusConfig,
    pub root: PathBuf,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        let config = ZenusConfig {
            data_dir: Some(root.clone()),
            ..Default::default()
        };
        Self {
            _temp_dir: temp_dir,
            repo: Arc::new(FsRepository::new(root.clone())),
            config,
            root,
        }
    }
}
