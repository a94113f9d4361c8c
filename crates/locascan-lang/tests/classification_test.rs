use locascan_core::{BoundingRegion, ClassificationRule, ScanConfig, TextBlock, Verdict};
use locascan_lang::{Classifier, ClassifierConfig};

fn block(text: &str) -> TextBlock {
    TextBlock::new(text, BoundingRegion::new(0.0, 0.0, 120.0, 24.0), 0.95)
}

fn scan_config() -> ScanConfig {
    let toml = r#"
        [application]
        base_url = "http://localhost:8080"

        [[pages]]
        name = "Dashboard"
        url_path = "/dashboard"

        [ocr]
        target_language = "fr"
        allowed_terms = ["OK", "Wifi"]

        [language_detection]
        check_languages = ["en"]

        [language_detection.custom_dictionary]
        en = ["dashboard", "save changes"]
        fr = ["check-in"]
    "#;
    ScanConfig::from_toml_str(toml).expect("valid config")
}

#[test]
fn test_scenarios_from_configuration() {
    let classifier = Classifier::from_scan_config(&scan_config()).expect("classifier");

    let dashboard = classifier.classify(&block("Dashboard"));
    assert_eq!(dashboard.verdict, Verdict::Flagged);
    assert!((dashboard.classification_confidence - 1.0).abs() < f32::EPSILON);

    let ok = classifier.classify(&block("OK"));
    assert_eq!(ok.verdict, Verdict::Suppressed);

    let checkin = classifier.classify(&block("Check-in"));
    assert_eq!(checkin.verdict, Verdict::Clean);
    assert_eq!(checkin.rule, ClassificationRule::TargetDictionary);

    let short = classifier.classify(&block("Go"));
    assert_eq!(short.verdict, Verdict::Clean);
}

#[test]
fn test_allow_listed_text_never_flagged() {
    let classifier = Classifier::from_scan_config(&scan_config()).expect("classifier");
    for text in [
        "Wifi",
        "Free Wifi for every guest staying with us this weekend",
        "Press OK to save your changes to this reservation",
    ] {
        let result = classifier.classify(&block(text));
        assert_eq!(result.verdict, Verdict::Suppressed, "{text}");
    }
}

#[test]
fn test_long_sentences_with_real_detector() {
    let classifier = Classifier::new("fr", &["en".to_string()], &ClassifierConfig::default())
        .expect("classifier");

    let english = classifier.classify(&block(
        "Please review the details of your upcoming stay before you continue to payment",
    ));
    assert_eq!(english.rule, ClassificationRule::Detector);
    assert_eq!(english.detected_language.as_deref(), Some("en"));

    let french = classifier.classify(&block(
        "Veuillez vérifier les détails de votre prochain séjour avant de passer au paiement",
    ));
    assert_eq!(french.verdict, Verdict::Clean);
    assert_eq!(french.detected_language.as_deref(), Some("fr"));
}

#[test]
fn test_batch_classification_preserves_order() {
    let classifier = Classifier::from_scan_config(&scan_config()).expect("classifier");
    let results = classifier.classify_all(&[block("OK"), block("Dashboard"), block("Go")]);
    let verdicts: Vec<Verdict> = results.iter().map(|r| r.verdict).collect();
    assert_eq!(
        verdicts,
        vec![Verdict::Suppressed, Verdict::Flagged, Verdict::Clean]
    );
}
