use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use versefind::{Config, IndexCache, Origin, Pipeline, Result, Status};

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample.txt")
}

fn config_for(temp_dir: &TempDir, source: &Path) -> Config {
    Config::new(Some(temp_dir.path().join("test_versefind")))
        .unwrap()
        .with_source(source.to_string_lossy().to_string())
}

#[tokio::test]
async fn test_cold_start_ingests_and_caches() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let config = config_for(&temp_dir, &fixture());

    let (pipeline, status) = Pipeline::new(config.clone());
    let (index, origin) = pipeline.load().await?;

    assert_eq!(origin, Origin::Document);
    assert_eq!(index.units().len(), 8);
    assert_eq!(*status.borrow(), Status::Ready);

    let cache = pipeline.cache().expect("cache should open in a temp dir");
    assert_eq!(cache.versions()?, vec![config.schema_version.clone()]);
    Ok(())
}

#[tokio::test]
async fn test_warm_start_skips_document() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("bom.txt");
    fs::copy(fixture(), &source)?;
    let config = config_for(&temp_dir, &source);

    let first = {
        let (pipeline, _status) = Pipeline::new(config.clone());
        pipeline.load().await?.0
    };

    // The document is no longer needed once the index is cached.
    fs::remove_file(&source)?;

    let (pipeline, status) = Pipeline::new(config);
    let (second, origin) = pipeline.load().await?;
    assert_eq!(origin, Origin::Cache);
    assert_eq!(second, first);
    assert!(status.borrow().is_ready());
    Ok(())
}

#[tokio::test]
async fn test_schema_version_bump_forces_reingestion() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let config = config_for(&temp_dir, &fixture());

    {
        let (pipeline, _status) = Pipeline::new(config.clone());
        pipeline.load().await?;
    }

    let bumped = config.with_schema_version("bom_data_v6")?;
    let (pipeline, _status) = Pipeline::new(bumped);
    let (_, origin) = pipeline.load().await?;
    assert_eq!(origin, Origin::Document);

    // The old record was replaced, not migrated.
    let cache = pipeline.cache().unwrap();
    assert_eq!(cache.versions()?, vec!["bom_data_v6".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_missing_document_reports_failure() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_for(&temp_dir, &temp_dir.path().join("missing.txt"));

    let (pipeline, status) = Pipeline::new(config);
    let result = pipeline.load().await;

    assert!(matches!(result, Err(versefind::Error::DocumentUnavailable(_))));
    match &*status.borrow() {
        Status::Failed(msg) => assert!(msg.starts_with("Error loading text.")),
        other => panic!("unexpected status {:?}", other),
    };
}

#[tokio::test]
async fn test_unavailable_cache_does_not_block_ingestion() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let mut config = config_for(&temp_dir, &fixture());

    // A directory where the database file should be cannot be opened.
    config.cache_path = temp_dir.path().join("not_a_file");
    fs::create_dir_all(&config.cache_path)?;
    assert!(IndexCache::open(&config).is_err());

    let (pipeline, status) = Pipeline::new(config);
    assert!(pipeline.cache().is_none());

    let (index, origin) = pipeline.load().await?;
    assert_eq!(origin, Origin::Document);
    assert!(!index.is_empty());
    assert!(status.borrow().is_ready());
    Ok(())
}

#[tokio::test]
async fn test_corrupt_cache_is_rebuilt() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let config = config_for(&temp_dir, &fixture());

    {
        let (pipeline, _status) = Pipeline::new(config.clone());
        pipeline.load().await?;
    }

    // Corrupt the whole database file.
    fs::write(&config.cache_path, b"not a database")?;

    let first = {
        let (pipeline, _status) = Pipeline::new(config.clone());
        assert!(pipeline.cache().is_some());
        let (index, origin) = pipeline.load().await?;
        assert_eq!(origin, Origin::Document);
        assert_eq!(index.units().len(), 8);
        index
    };

    // The rebuilt file serves the next start.
    let (pipeline, _status) = Pipeline::new(config);
    let (index, origin) = pipeline.load().await?;
    assert_eq!(origin, Origin::Cache);
    assert_eq!(index, first);
    Ok(())
}
