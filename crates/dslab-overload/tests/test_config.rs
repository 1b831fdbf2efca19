use dslab_overload::config::{
    detector_resolver, fallback_resolver, parse_config_value, parse_options, predictor_resolver,
    regression_detector_resolver, OverloadDetectionConfig,
};
use dslab_overload::error::OverloadError;
use dslab_overload::host::{Host, MonitoredHost};
use dslab_overload::prediction::UtilizationPredictor;

fn name_wrapper(file_name: &str) -> String {
    format!("test-configs/{}", file_name)
}

#[test]
fn test_load_config() {
    let config = OverloadDetectionConfig::from_file(&name_wrapper("config.yaml")).unwrap();
    assert_eq!(config.scheduling_interval, 300.);
    assert_eq!(config.history_length, 20);
    assert_eq!(config.safety_parameter, 1.2);
    assert_eq!(config.utilization_threshold, Some(0.9));
    assert_eq!(config.detector, "HybridLocalRegression[safety=1.5]");

    // safety option of the detector overrides the global parameter
    let detector = regression_detector_resolver(&config.detector, &config).unwrap();
    assert_eq!(detector.predictor(), UtilizationPredictor::HybridLocalRegression);
    assert_eq!(detector.safety_parameter(), 1.5);
    assert_eq!(detector.scheduling_interval(), 300.);
    assert_eq!(detector.utilization_threshold(), Some(0.9));
    assert_eq!(detector.fallback().name(), "StaticThreshold[threshold=0.7]");

    let detector = config.build_detector().unwrap();
    assert_eq!(detector.name(), "HybridLocalRegression[safety=1.5]");
}

#[test]
// Absent parameters take default values.
fn test_load_partial_config() {
    let config = OverloadDetectionConfig::from_file(&name_wrapper("partial.yaml")).unwrap();
    let default = OverloadDetectionConfig::default();
    assert_eq!(config.scheduling_interval, default.scheduling_interval);
    assert_eq!(config.history_length, 30);
    assert_eq!(config.utilization_threshold, None);
    assert_eq!(config.fallback, default.fallback);

    let detector = regression_detector_resolver(&config.detector, &config).unwrap();
    assert_eq!(detector.predictor(), UtilizationPredictor::MultipleRegression);
    assert_eq!(detector.safety_parameter(), 1.2);
    assert_eq!(detector.utilization_threshold(), None);
}

#[test]
fn test_invalid_configs() {
    let result = OverloadDetectionConfig::from_file(&name_wrapper("invalid_interval.yaml"));
    assert!(matches!(result, Err(OverloadError::Config(_))));

    let config = OverloadDetectionConfig::from_file(&name_wrapper("unknown_detector.yaml")).unwrap();
    assert!(matches!(config.build_detector(), Err(OverloadError::Config(_))));

    let result = OverloadDetectionConfig::from_file(&name_wrapper("missing.yaml"));
    assert!(matches!(result, Err(OverloadError::Io(_))));

    for yaml in ["safety_parameter: 0.0", "history_length: 0", "scheduling_interval: [1, 2]"] {
        assert!(matches!(
            OverloadDetectionConfig::from_yaml(yaml),
            Err(OverloadError::Config(_))
        ));
    }
}

#[test]
fn test_parse_config_value() {
    assert_eq!(
        parse_config_value("StaticThreshold[threshold=0.8]"),
        ("StaticThreshold".to_string(), Some("threshold=0.8".to_string()))
    );
    assert_eq!(parse_config_value(" LocalRegression "), ("LocalRegression".to_string(), None));

    let options = parse_options("safety=1.4, threshold = 0.7,broken");
    assert_eq!(options.len(), 2);
    assert_eq!(options["safety"], "1.4");
    assert_eq!(options["threshold"], "0.7");
}

#[test]
fn test_resolvers() {
    assert_eq!(predictor_resolver("Lr"), Some(UtilizationPredictor::LocalRegression));
    assert_eq!(predictor_resolver("OlsMr"), Some(UtilizationPredictor::MultipleRegression));
    assert_eq!(predictor_resolver("HLrHod"), Some(UtilizationPredictor::HybridLocalRegression));
    assert_eq!(predictor_resolver("Mad"), None);

    let fallback = fallback_resolver("StaticThreshold[threshold=0.75]").unwrap();
    assert_eq!(fallback.name(), "StaticThreshold[threshold=0.75]");
    assert!(matches!(fallback_resolver("StaticThreshold"), Err(OverloadError::Config(_))));
    assert!(matches!(
        fallback_resolver("StaticThreshold[threshold=high]"),
        Err(OverloadError::Config(_))
    ));

    let config = OverloadDetectionConfig::default();
    let detector = detector_resolver("StaticThreshold[threshold=0.9]", &config).unwrap();
    assert_eq!(detector.name(), "StaticThreshold[threshold=0.9]");
    let detector = detector_resolver("Lr[safety=2]", &config).unwrap();
    assert_eq!(detector.name(), "LocalRegression[safety=2]");

    let config = OverloadDetectionConfig {
        fallback: "Unknown".to_string(),
        ..OverloadDetectionConfig::default()
    };
    assert!(matches!(
        detector_resolver("LocalRegression", &config),
        Err(OverloadError::Config(_))
    ));
}

#[test]
// Safety option of the detector is validated like the global safety parameter.
fn test_invalid_safety_option() {
    let config = OverloadDetectionConfig::default();
    for config_str in ["Lr[safety=-3]", "Lr[safety=0]", "OlsMr[safety=NaN]", "HLrHod[safety=inf]"] {
        assert!(
            matches!(regression_detector_resolver(config_str, &config), Err(OverloadError::Config(_))),
            "{} should be rejected",
            config_str
        );
    }
    let config = OverloadDetectionConfig::from_yaml("detector: Lr[safety=-3]").unwrap();
    assert!(matches!(config.build_detector(), Err(OverloadError::Config(_))));
}

#[test]
fn test_invalid_threshold_option() {
    for config_str in ["StaticThreshold[threshold=-0.5]", "StaticThreshold[threshold=NaN]"] {
        assert!(matches!(fallback_resolver(config_str), Err(OverloadError::Config(_))));
    }
    let config = OverloadDetectionConfig::from_yaml("fallback: StaticThreshold[threshold=NaN]").unwrap();
    assert!(matches!(config.build_detector(), Err(OverloadError::Config(_))));
}

#[test]
// History shorter than the predictor window would always fall back.
fn test_history_length_below_window() {
    let config = OverloadDetectionConfig::from_yaml("history_length: 8\ndetector: LocalRegression").unwrap();
    assert!(matches!(config.build_detector(), Err(OverloadError::Config(_))));

    let config = OverloadDetectionConfig::from_yaml("history_length: 8\ndetector: HybridLocalRegression").unwrap();
    assert!(config.build_detector().is_ok());

    let yaml = "history_length: 8\ndetector: StaticThreshold[threshold=0.9]";
    let config = OverloadDetectionConfig::from_yaml(yaml).unwrap();
    assert!(config.build_detector().is_ok());
}

#[test]
fn test_host_from_config() {
    let config = OverloadDetectionConfig::from_file(&name_wrapper("config.yaml")).unwrap();
    let host = Host::from_config(1, 16, 16384, 1000., &config);
    assert_eq!(host.history().capacity(), 20);
    assert_eq!(host.cpu_utilization_history().len(), 20);
}
