/*!
 * Integration tests for application lifecycle: files in, session, files out
 */

use anyhow::Result;
use std::sync::Arc;

use subgloss::app_config::Config;
use subgloss::file_utils::FileManager;
use subgloss::providers::mock::MockProvider;
use subgloss::session::Phase;
use subgloss::translation::ProgressTracker;
use subgloss::{Controller, SubtitleDocument};
use crate::common;

fn test_config() -> Config {
    let mut config = Config::default();
    config.translation.common.retry_backoff_ms = 0;
    config
}

#[tokio::test]
async fn test_session_fromFileToFile_shouldWriteTranslatedSubtitle() -> Result<()> {
    common::init_logging();
    let dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(dir.path(), "running_man_e01.srt")?;

    let provider = MockProvider::working().with_suggestions("김민성:金敏成, 런닝맨:Running Man");
    let tracker = Arc::new(ProgressTracker::new());
    let mut controller = Controller::new(test_config(), tracker.clone()).with_provider(Arc::new(provider));

    controller.submit_context(common::SAMPLE_CONTEXT)?;
    controller.upload(&FileManager::read_to_string(&input)?)?;
    let glossary = controller.analyze().await?;
    assert_eq!(glossary.len(), 2);
    assert_eq!(tracker.analysis(), 100);

    let output = controller.translate().await?;
    let output_path = FileManager::generate_output_path(&input, None, &controller.config().target_language);
    FileManager::write_to_file(&output_path, &output)?;

    assert_eq!(output_path.file_name().and_then(|n| n.to_str()), Some("running_man_e01.zh.srt"));
    let written = SubtitleDocument::parse(&FileManager::read_to_string(&output_path)?)?;
    let original = SubtitleDocument::parse(common::SAMPLE_SRT)?;
    assert_eq!(written.len(), original.len());
    for (translated, source) in written.blocks().iter().zip(original.blocks()) {
        assert_eq!(translated.id, source.id);
        assert_eq!(translated.timestamp, source.timestamp);
        assert_eq!(translated.text_lines.len(), source.text_lines.len());
    }
    Ok(())
}

#[tokio::test]
async fn test_session_withReviewedGlossaryFile_shouldTranslateWithEditedTerms() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let glossary_path = dir.path().join("running_man_e01.glossary.txt");
    let provider = MockProvider::working().with_suggestions("김민성:金民成");
    let mut controller = Controller::new(test_config(), Arc::new(ProgressTracker::new()))
        .with_provider(Arc::new(provider.clone()));

    controller.submit_context(common::SAMPLE_CONTEXT)?;
    controller.upload(common::SAMPLE_SRT)?;
    let suggested = controller.analyze().await?;
    FileManager::write_glossary(&glossary_path, &suggested)?;

    // The operator corrects the file before translating
    common::create_test_file(dir.path(), "running_man_e01.glossary.txt", "김민성:金敏成, 유재석:劉在錫\n")?;
    controller.edit_glossary(FileManager::read_glossary(&glossary_path)?)?;
    controller.translate().await?;

    let chunk_prompt = provider
        .requests()
        .into_iter()
        .find(|r| r.response_schema.is_some())
        .map(|r| r.prompt)
        .unwrap_or_default();
    assert!(chunk_prompt.contains("김민성:金敏成"));
    assert!(chunk_prompt.contains("유재석:劉在錫"));
    assert!(!chunk_prompt.contains("金民成"));
    Ok(())
}

#[tokio::test]
async fn test_session_afterReset_shouldAcceptNewProgram() -> Result<()> {
    let mut controller = Controller::new(test_config(), Arc::new(ProgressTracker::new()))
        .with_provider(Arc::new(MockProvider::working()));

    controller.submit_context(common::SAMPLE_CONTEXT)?;
    controller.upload(common::SAMPLE_SRT)?;
    controller.analyze().await?;
    controller.translate().await?;
    controller.reset();

    controller.submit_context("Knowing Bros, JTBC")?;
    controller.upload(&common::generate_srt(3))?;
    match controller.phase() {
        Phase::Analyzing(state) => {
            assert_eq!(state.program_context, "Knowing Bros, JTBC");
            assert_eq!(state.document.len(), 3);
            assert!(state.established.is_empty());
        }
        other => panic!("unexpected phase {}", other.name()),
    }
    Ok(())
}

#[test]
fn test_config_roundTrip_throughFile_shouldDriveController() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("conf.json");
    let config = Config::load_or_create(&path)?;
    config.validate()?;

    let controller = Controller::new(config, Arc::new(ProgressTracker::new()));
    assert_eq!(controller.phase(), &Phase::default());
    assert_eq!(controller.config().translation.common.chunk_size, 100);
    Ok(())
}

/// Drives a session from synchronous code, the way a blocking caller would
#[test]
fn test_session_withBlockingRuntime_shouldReachReview() -> Result<()> {
    let mut controller = Controller::new(test_config(), Arc::new(ProgressTracker::new()))
        .with_provider(Arc::new(MockProvider::working().with_suggestions("하하:HAHA")));
    controller.submit_context(common::SAMPLE_CONTEXT)?;
    controller.upload(common::SAMPLE_SRT)?;

    let glossary = tokio_test::block_on(controller.analyze())?;

    assert_eq!(glossary.get("하하"), Some("HAHA"));
    assert_eq!(controller.phase().name(), "Reviewing");
    Ok(())
}
