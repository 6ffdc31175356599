/*!
 * Tests for subtitle segmentation and the glossary store
 */

use subgloss::errors::SubtitleError;
use subgloss::subtitle_processor::{SubtitleBlock, SubtitleDocument};
use subgloss::translation::{Glossary, Reassembler, TranslationResult};
use crate::common;

#[test]
fn test_parse_withSampleFile_shouldProduceBlocksAndUnits() {
    let document = SubtitleDocument::parse(common::SAMPLE_SRT).unwrap();

    assert_eq!(document.len(), 3);
    assert_eq!(document.unit_count(), 4);
    assert_eq!(document.blocks()[1].timestamp, "00:00:05,000 --> 00:00:09,000");

    let ids: Vec<String> = document.units().into_iter().map(|u| u.unique_id).collect();
    assert_eq!(ids, vec!["1-0", "2-0", "2-1", "3-0"]);
}

#[test]
fn test_parse_withCrlfAndExtraBlankLines_shouldMatchLf() {
    let crlf = common::SAMPLE_SRT.replace('\n', "\r\n").replace("\r\n\r\n2", "\r\n\r\n\r\n  \r\n2");
    let lf = SubtitleDocument::parse(common::SAMPLE_SRT).unwrap();
    assert_eq!(SubtitleDocument::parse(&crlf).unwrap(), lf);
}

#[test]
fn test_parse_withBlockMissingTimestamp_shouldFail() {
    let result = SubtitleDocument::parse("1\n00:00:01,000 --> 00:00:02,000\nhi\n\n2\n");
    assert!(matches!(result, Err(SubtitleError::MissingTimestamp { block_id }) if block_id == "2"));
}

#[test]
fn test_parse_withDuplicateIds_shouldFail() {
    let result = SubtitleDocument::parse(
        "1\n00:00:01,000 --> 00:00:02,000\na\n\n1\n00:00:03,000 --> 00:00:04,000\nb\n",
    );
    assert!(matches!(result, Err(SubtitleError::DuplicateBlockId { .. })));
}

#[test]
fn test_parse_withWhitespaceOnly_shouldBeEmptyInput() {
    assert!(matches!(SubtitleDocument::parse(" \n\t\n"), Err(SubtitleError::EmptyInput)));
}

#[test]
fn test_blockWithoutText_shouldContributeNoUnits() {
    let document = SubtitleDocument::from_blocks(vec![
        SubtitleBlock::new("1", "00:00:01,000 --> 00:00:02,000", vec![]),
        SubtitleBlock::new("2", "00:00:03,000 --> 00:00:04,000", vec!["hi".into()]),
    ])
    .unwrap();
    assert_eq!(document.unit_count(), 1);
    assert_eq!(document.units()[0].unique_id, "2-0");
}

/// Identity translation of a parsed file reproduces its canonical form
#[test]
fn test_roundTrip_withIdentityTranslation_shouldReproduceCanonicalText() {
    for source in [common::SAMPLE_SRT.to_string(), common::generate_srt(25)] {
        let document = SubtitleDocument::parse(&source).unwrap();
        let identity: Vec<TranslationResult> = document
            .units()
            .into_iter()
            .map(|u| TranslationResult::new(u.unique_id, u.original_text))
            .collect();

        let output = Reassembler::new().reassemble(&document, &identity).unwrap();
        assert_eq!(output, document.to_srt_string());
        assert_eq!(SubtitleDocument::parse(&output).unwrap().len(), document.len());
    }
}

#[test]
fn test_glossaryParse_shouldSkipMalformedPairsAndTrim() {
    let glossary = Glossary::parse(" 김민성 : 金敏成 ,broken, a:b:c, :empty, 런닝맨：RunningMan ");
    assert_eq!(glossary.len(), 2);
    assert_eq!(glossary.get("김민성"), Some("金敏成"));
    assert_eq!(glossary.get("런닝맨"), Some("RunningMan"));
}

#[test]
fn test_glossaryParse_withEmptyText_shouldBeEmpty() {
    assert!(Glossary::parse("").is_empty());
    assert!(Glossary::parse("  ,  ,").is_empty());
}

#[test]
fn test_glossaryMerge_shouldFollowMergeLaws() {
    let a = Glossary::parse("x:1, y:2");
    let b = Glossary::parse("y:3, z:4");
    let empty = Glossary::new();

    assert_eq!(a.merge(&empty), a);
    assert_eq!(empty.merge(&a), a);
    assert_eq!(a.merge(&a), a);

    let merged = a.merge(&b);
    assert_eq!(merged.get("y"), Some("3"));
    assert_eq!(merged.len(), 3);
    assert_eq!(merged.serialize(), "x:1, y:3, z:4");
}

#[test]
fn test_glossarySerialize_shouldParseBackToSameGlossary() {
    let glossary = Glossary::parse("MBC:MBC電視台, 유재석:劉在錫");
    assert_eq!(Glossary::parse(&glossary.serialize()), glossary);
}
