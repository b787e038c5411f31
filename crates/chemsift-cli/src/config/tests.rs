use super::*;
use chemsift_ner::EntityType;

#[test]
fn test_empty_file_gives_defaults() {
    let config = Config::from_toml_str("").unwrap();
    assert_eq!(config.partition.num_splits, 32);
    assert_eq!(config.filter.density_percent, 1.25);
    assert_eq!(config.filter.max_chunk_size, 25_000);
    assert_eq!(config.filter.categories, vec!["CHEMICAL", "DISEASE"]);
    assert!(!config.filter.keep_empty_documents);
    assert!(config.ner.embedded_lexicon);
    assert_eq!(config.orchestrator.output_dir, PathBuf::from("filtered_jsons"));
    assert_eq!(config.orchestrator.error_log_dir, PathBuf::from("filter_logs"));
    assert_eq!(config.orchestrator.max_concurrency, 0);
}

#[test]
fn test_partial_sections_keep_other_defaults() {
    let config = Config::from_toml_str(
        r#"
        [filter]
        density_percent = 2.5
        categories = ["chemical"]

        [orchestrator]
        max_concurrency = 4
        "#,
    )
    .unwrap();
    assert_eq!(config.filter.density_percent, 2.5);
    assert_eq!(config.filter.max_chunk_size, 25_000);
    assert_eq!(config.filter.extension, "xml");
    assert_eq!(config.orchestrator.max_concurrency, 4);
    assert_eq!(config.partition.num_splits, 32);

    let filter = config.filter.to_filter_config().unwrap();
    assert!(filter.policy.categories.contains(EntityType::Chemical));
    assert!(!filter.policy.categories.contains(EntityType::Disease));
}

#[test]
fn test_default_filter_section_matches_library_defaults() {
    let filter = FilterSection::default().to_filter_config().unwrap();
    assert_eq!(filter, FilterConfig::default());
}

#[test]
fn test_empty_extension_accepts_everything() {
    let section = FilterSection {
        extension: String::new(),
        ..FilterSection::default()
    };
    assert_eq!(section.to_filter_config().unwrap().extension, None);
}

#[test]
fn test_invalid_filter_values_are_rejected() {
    let unknown = FilterSection {
        categories: vec!["CHEMICAL".into(), "POTATO".into()],
        ..FilterSection::default()
    };
    assert!(unknown.to_filter_config().is_err());

    let empty = FilterSection {
        categories: Vec::new(),
        ..FilterSection::default()
    };
    assert!(empty.to_filter_config().is_err());

    let zero_density = FilterSection {
        density_percent: 0.0,
        ..FilterSection::default()
    };
    assert!(zero_density.to_filter_config().is_err());
}

#[test]
fn test_malformed_toml_is_an_error() {
    assert!(Config::from_toml_str("[filter\ndensity_percent = 1").is_err());
    assert!(Config::from_toml_str("[filter]\ndensity_percent = \"high\"").is_err());
}

#[test]
fn test_ner_sources() {
    let ner = NerConfig {
        embedded_lexicon: true,
        lexicons: vec![PathBuf::from("a.tsv"), PathBuf::from("b.tsv")],
        mesh_descriptors: "desc2024.xml".to_string(),
    };
    let sources = ner.sources();
    assert_eq!(sources.len(), 3);
    assert!(matches!(&sources[2], LexiconSource::MeshDescriptors(p) if p == Path::new("desc2024.xml")));
    assert!(NerConfig::default().sources().is_empty());
}

#[test]
fn test_build_tagger_from_tsv_lexicon() {
    let dir = tempfile::tempdir().unwrap();
    let lexicon = dir.path().join("extra.tsv");
    std::fs::write(&lexicon, "# extra terms\nzorbicillin\tCHEMICAL\n").unwrap();

    let ner = NerConfig {
        embedded_lexicon: false,
        lexicons: vec![lexicon],
        mesh_descriptors: String::new(),
    };
    let tagger = ner.build_tagger().unwrap();
    let found = tagger.extract("treated with zorbicillin daily");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].label, EntityType::Chemical);
}

#[test]
fn test_missing_lexicon_fails_setup() {
    let ner = NerConfig {
        lexicons: vec![PathBuf::from("/definitely/not/here.tsv")],
        ..NerConfig::default()
    };
    assert!(ner.build_tagger().is_err());
}

#[test]
fn test_from_path_and_explicit_missing_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chemsift.toml");
    std::fs::write(&path, "[partition]\nnum_splits = 8\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.partition.num_splits, 8);

    assert!(Config::load(Some(&dir.path().join("missing.toml"))).is_err());
}
