use std::fs;
use tempfile::TempDir;
use versefind::{highlight_with, search, suggest, Config, Origin, Pipeline, Result, SplitStrategy};

/// End-to-end functionality test: ingest, cache, reload and query
#[tokio::test]
async fn test_end_to_end_workflow() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let base_dir = temp_dir.path().join("test_versefind");
    let source = temp_dir.path().join("bom.txt");

    // 1. Initialize
    let config = Config::new(Some(base_dir))?.with_source(source.to_string_lossy().to_string());
    config.init()?;
    assert!(config.is_initialized());

    // 2. Write a document
    fs::write(
        &source,
        "Legal notice for this edition of the text\n\n\
         THE FIRST BOOK OF NEPHI\n\n\
         1 Nephi 3:7\nI will go and do the things which the Lord hath commanded\n\n\
         Alma 32:21\nFaith is not to have a perfect knowledge of things\n\n\
         Mosiah 2:17\nWhen ye are in the service of your fellow beings\nye are only in the service of your God\n",
    )?;

    // 3. Cold start
    let (pipeline, status) = Pipeline::new(config.clone());
    let (index, origin) = pipeline.load().await?;
    assert_eq!(origin, Origin::Document);
    assert_eq!(status.borrow().to_string(), "Ready to search.");
    drop(pipeline);

    // 4. Query the fresh index
    let limits = config.limits;
    let references: Vec<&str> = index.units().iter().map(|u| u.reference.as_str()).collect();
    assert_eq!(
        references,
        vec!["THE FIRST BOOK OF NEPHI...", "1 Nephi 3:7", "Alma 32:21", "Mosiah 2:17"]
    );
    assert_eq!(index.front_matter(), "Legal notice for this edition of the text\n\n");

    assert_eq!(suggest(&index, "se", &limits), vec!["service"]);
    assert_eq!(suggest(&index, "Th", &limits), vec!["the", "things"]);

    let results = search(&index, "service of", &limits).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(
        highlight_with(&results.units[0].text, "service of", "*", "*"),
        "When ye are in the *service of* your fellow beings ye are only in the *service of* your God"
    );
    assert_eq!(results.summary(), "1 match found.");

    let none = search(&index, "nowhere", &limits).unwrap();
    assert_eq!(none.summary(), "No matches found.");

    // 5. Warm start returns the same index
    let (pipeline, _status) = Pipeline::new(config.clone());
    let (reloaded, origin) = pipeline.load().await?;
    assert_eq!(origin, Origin::Cache);
    assert_eq!(reloaded, index);
    drop(pipeline);

    // 6. Line-count strategy under a new schema version
    let by_lines = config
        .with_split(SplitStrategy::LineCount(1))
        .with_schema_version("bom_data_lines")?;
    let (pipeline, _status) = Pipeline::new(by_lines);
    let (index, origin) = pipeline.load().await?;
    assert_eq!(origin, Origin::Document);
    assert_eq!(index.front_matter(), "Legal notice for this edition of the text\n");
    assert_eq!(index.units().len(), 4);

    Ok(())
}

/// Units survive a document without the configured marker
#[tokio::test]
async fn test_document_without_marker() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("plain.txt");
    fs::write(&source, "Helaman 5:12\nRemember that it is upon the rock of our Redeemer\n")?;

    let config = Config::new(Some(temp_dir.path().join("test_versefind")))?
        .with_source(source.to_string_lossy().to_string());
    let (pipeline, _status) = Pipeline::new(config);
    let index = pipeline.ingest().await?;

    assert_eq!(index.front_matter(), versefind::indexing::splitter::MISSING_FRONT_MATTER);
    assert_eq!(index.units().len(), 1);
    assert_eq!(index.units()[0].reference, "Helaman 5:12");
    Ok(())
}
