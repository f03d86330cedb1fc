use std::time::Duration;
use parley::options::{ModelOptions, TransportOptions};

#[test]
fn test_transport_options_builder() {
    let options = TransportOptions::new()
        .with_timeout(Duration::from_secs(30))
        .with_proxy("http://proxy.example.com")
        .with_header("X-Custom-Header", "Value");

    match options {
        TransportOptions::Http {
            timeout,
            proxy,
            headers,
        } => {
            assert_eq!(timeout, Some(Duration::from_secs(30)));
            assert_eq!(proxy, Some("http://proxy.example.com".to_string()));

            let headers = headers.unwrap();
            assert_eq!(headers.get("X-Custom-Header"), Some(&"Value".to_string()));
        }
    }
}

#[test]
fn test_model_options_new() {
    let options = ModelOptions::new();

    assert_eq!(options.system, None);
    assert_eq!(options.temperature, None);
    assert_eq!(options.max_tokens, None);
}

#[test]
fn test_model_options_custom() {
    let options = ModelOptions::new()
        .with_temperature(0.7)
        .with_top_p(0.9)
        .with_max_tokens(100)
        .with_random_seed(42);

    assert_eq!(options.temperature, Some(0.7));
    assert_eq!(options.top_p, Some(0.9));
    assert_eq!(options.max_tokens, Some(100));
    assert_eq!(options.random_seed, Some(42));
    assert_eq!(options.safe_prompt, None);
}

#[test]
fn test_model_options_serialization_skips_unset() {
    let options = ModelOptions::new().with_max_tokens(10);

    assert_eq!(
        serde_json::to_value(&options).unwrap(),
        serde_json::json!({"max_tokens": 10})
    );
}
