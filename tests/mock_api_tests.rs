//! Mock API tests for the RapidAPI provider
//!
//! These tests run the HTTP client against a local wiremock server.

use lingua_relay::config::ResponseShape;
use lingua_relay::error::RelayError;
use lingua_relay::provider::{RapidApiClient, TranslationProvider};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, shape: ResponseShape) -> RapidApiClient {
    RapidApiClient::new("test-api-key".to_string())
        .with_host("translator.test")
        .with_catalog_url(format!("{}/v2/languages", server.uri()))
        .with_translate_url(format!("{}/v2", server.uri()))
        .with_shape(shape)
}

async fn mount_catalog(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v2/languages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "languages": [
                    {"language": "en", "name": "English"},
                    {"language": "ru", "name": "Russian"}
                ]
            }
        })))
        .mount(server)
        .await;
}

// ============================================================================
// Catalog Tests
// ============================================================================

mod catalog_tests {
    use super::*;
    use lingua_relay::language::is_supported;

    #[tokio::test]
    async fn test_fetch_nested_catalog_sends_api_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/languages"))
            .and(header("x-rapidapi-key", "test-api-key"))
            .and(header("x-rapidapi-host", "translator.test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"languages": [
                    {"language": "en", "name": "English"},
                    {"language": "ru", "name": "Russian"}
                ]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, ResponseShape::Nested);
        let catalog = client.fetch_supported_languages().await.unwrap();

        assert_eq!(catalog.len(), 2);
        assert!(is_supported("en", &catalog));
        assert!(is_supported("ru", &catalog));
    }

    #[tokio::test]
    async fn test_fetch_flat_catalog() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/languages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "languages": [{"language": "es", "name": "Spanish"}]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, ResponseShape::Flat);
        let catalog = client.fetch_supported_languages().await.unwrap();
        assert!(is_supported("es", &catalog));
    }

    #[tokio::test]
    async fn test_catalog_is_refetched_every_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/languages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"languages": []}
            })))
            .expect(3)
            .mount(&server)
            .await;

        let client = client_for(&server, ResponseShape::Nested);
        for _ in 0..3 {
            client.fetch_supported_languages().await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_catalog_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/languages"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let client = client_for(&server, ResponseShape::Nested);
        match client.fetch_supported_languages().await {
            Err(RelayError::ProviderAccess(detail)) => {
                assert!(detail.contains("503"));
                assert!(detail.contains("maintenance"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_catalog_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/languages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"languages": "not a list"}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, ResponseShape::Nested);
        assert!(matches!(
            client.fetch_supported_languages().await,
            Err(RelayError::ProviderAccess(_))
        ));
    }
}

// ============================================================================
// Word Translation Tests
// ============================================================================

mod translate_word_tests {
    use super::*;

    #[tokio::test]
    async fn test_translate_word_request_and_decoding() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2"))
            .and(header("x-rapidapi-key", "test-api-key"))
            .and(header("x-rapidapi-host", "translator.test"))
            .and(body_json(json!({"q": "Hello", "source": "en", "target": "ru"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"translations": [{"translatedText": "%D0%9F%D1%80%D0%B8%D0%B2%D0%B5%D1%82"}]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, ResponseShape::Nested);
        let text = client.translate_word("Hello", "en", "ru").await.unwrap();
        assert_eq!(text, "Привет");
    }

    #[tokio::test]
    async fn test_translate_word_flat_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "translations": [{"translatedText": "мир"}]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, ResponseShape::Flat);
        assert_eq!(client.translate_word("world", "en", "ru").await.unwrap(), "мир");
    }

    #[tokio::test]
    async fn test_empty_word_is_still_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2"))
            .and(body_json(json!({"q": "", "source": "en", "target": "ru"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"translations": [{"translatedText": ""}]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, ResponseShape::Nested);
        assert_eq!(client.translate_word("", "en", "ru").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_translate_word_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, ResponseShape::Nested);
        assert!(matches!(
            client.translate_word("Hello", "en", "ru").await,
            Err(RelayError::ProviderAccess(_))
        ));
    }

    #[tokio::test]
    async fn test_translate_word_client_error_keeps_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, ResponseShape::Nested);
        match client.translate_word("Hello", "en", "ru").await {
            Err(RelayError::ProviderRejected { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid key");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_translate_word_missing_translations() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
            .mount(&server)
            .await;

        let client = client_for(&server, ResponseShape::Nested);
        assert!(matches!(
            client.translate_word("Hello", "en", "ru").await,
            Err(RelayError::ProviderAccess(_))
        ));
    }
}

// ============================================================================
// Orchestrator Over HTTP Tests
// ============================================================================

mod orchestrator_http_tests {
    use super::*;
    use async_trait::async_trait;
    use lingua_relay::orchestrator::{TranslationJob, TranslationOrchestrator};
    use lingua_relay::pool::WorkerPool;
    use lingua_relay::record::MemoryRecordSink;
    use lingua_relay::retry::Sleeper;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct VirtualClock {
        slept: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for VirtualClock {
        async fn sleep(&self, duration: Duration) {
            self.slept.lock().unwrap().push(duration);
        }
    }

    #[tokio::test]
    async fn test_hello_world_end_to_end() {
        let server = MockServer::start().await;
        mount_catalog(&server).await;
        Mock::given(method("POST"))
            .and(path("/v2"))
            .and(body_json(json!({"q": "Hello", "source": "en", "target": "ru"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"translations": [{"translatedText": "Привет"}]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v2"))
            .and(body_json(json!({"q": "world", "source": "en", "target": "ru"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"translations": [{"translatedText": "мир"}]}
            })))
            .mount(&server)
            .await;

        let sink = Arc::new(MemoryRecordSink::new());
        let orchestrator = TranslationOrchestrator::new(
            Arc::new(client_for(&server, ResponseShape::Nested)),
            sink.clone(),
            WorkerPool::new(4),
        );

        let text = orchestrator
            .translate(&TranslationJob::new("Hello world", "en", "ru"))
            .await
            .unwrap();

        assert_eq!(text, "Привет мир");
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_key_is_not_retried() {
        let server = MockServer::start().await;
        mount_catalog(&server).await;
        Mock::given(method("POST"))
            .and(path("/v2"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .expect(1)
            .mount(&server)
            .await;

        let sink = Arc::new(MemoryRecordSink::new());
        let clock = Arc::new(VirtualClock::default());
        let orchestrator = TranslationOrchestrator::new(
            Arc::new(client_for(&server, ResponseShape::Nested)),
            sink.clone(),
            WorkerPool::new(4),
        )
        .with_sleeper(clock.clone());

        let result = orchestrator
            .translate(&TranslationJob::new("Hello", "en", "ru"))
            .await;

        assert!(matches!(
            result,
            Err(RelayError::ProviderRejected { status: 403, .. })
        ));
        assert!(sink.is_empty());
        assert!(clock.slept.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persistent_server_error_exhausts_retries() {
        let server = MockServer::start().await;
        mount_catalog(&server).await;
        Mock::given(method("POST"))
            .and(path("/v2"))
            .respond_with(ResponseTemplate::new(500))
            .expect(5)
            .mount(&server)
            .await;

        let sink = Arc::new(MemoryRecordSink::new());
        let clock = Arc::new(VirtualClock::default());
        let orchestrator = TranslationOrchestrator::new(
            Arc::new(client_for(&server, ResponseShape::Nested)),
            sink.clone(),
            WorkerPool::new(4),
        )
        .with_sleeper(clock.clone());

        let result = orchestrator
            .translate(&TranslationJob::new("Hello", "en", "ru"))
            .await;

        assert!(matches!(result, Err(RelayError::ProviderAccess(_))));
        assert!(sink.is_empty());

        let slept = clock.slept.lock().unwrap().clone();
        assert_eq!(
            slept,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8)
            ]
        );
        assert!(slept.iter().sum::<Duration>() >= Duration::from_secs(15));
    }
}
