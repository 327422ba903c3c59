//! Start-up flow of the application core

use async_trait::async_trait;
use bridge_desktop::SqliteSettingsStore;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{HttpClient, HttpRequest, HttpResponse};
use core_network::{Outcome, QuoteReceived};
use core_preferences::PreferenceKey;
use core_runtime::{AppConfig, HostContext};
use core_service::{AppCore, CoreDependencies, CoreError};
use mockall::mock;
use std::sync::{Arc, Mutex};

mock! {
    HttpClient {}

    #[async_trait]
    impl HttpClient for HttpClient {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

const QUOTE_BODY: &str = r#"{"quote":"Here's looking at you, kid.","author":"Casablanca","category":"Movies"}"#;

fn requested_category(request: &HttpRequest) -> Option<String> {
    let body: serde_json::Value = serde_json::from_slice(request.body.as_deref()?).ok()?;
    body.get("cat")?.as_str().map(str::to_string)
}

fn config() -> AppConfig {
    AppConfig::builder()
        .api_key("test-key")
        .settings_dir(std::env::temp_dir().join("simple-framework-tests"))
        .build()
        .unwrap()
}

async fn core_with(mock: MockHttpClient) -> AppCore {
    let store = Arc::new(SqliteSettingsStore::in_memory().await.unwrap());
    AppCore::new(&config(), CoreDependencies::new(Arc::new(mock), store)).unwrap()
}

#[tokio::test]
async fn test_on_start_requests_default_category_and_counts_launches() {
    let categories = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&categories);

    let mut mock = MockHttpClient::new();
    mock.expect_execute().times(2).returning(move |request| {
        seen.lock().unwrap().push(requested_category(&request));
        Ok(HttpResponse::new(200, QUOTE_BODY))
    });
    let core = core_with(mock).await;

    let context = HostContext::new("simple-framework", "0.1.0");
    let outcome = core.on_start(Some(context.clone())).await.unwrap().outcome().await.unwrap();
    assert!(matches!(outcome, Outcome::Success(quote) if quote.author == "Casablanca"));
    assert!(core.network().is_initialized());
    assert_eq!(core.preferences().get_int(PreferenceKey::LaunchCount).await, 1);

    core.on_start(Some(context)).await.unwrap().outcome().await.unwrap();
    assert_eq!(core.preferences().get_int(PreferenceKey::LaunchCount).await, 2);

    assert_eq!(
        *categories.lock().unwrap(),
        vec![Some("movies".to_string()), Some("movies".to_string())]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_overlapping_starts_count_every_launch() {
    let mut mock = MockHttpClient::new();
    mock.expect_execute()
        .times(8)
        .returning(|_| Ok(HttpResponse::new(200, QUOTE_BODY)));
    let core = core_with(mock).await;

    let starts: Vec<_> = (0..8)
        .map(|_| {
            let core = core.clone();
            tokio::spawn(async move { core.on_start(None).await })
        })
        .collect();
    for start in starts {
        start.await.unwrap().unwrap().outcome().await.unwrap();
    }

    assert_eq!(core.preferences().get_int(PreferenceKey::LaunchCount).await, 8);
}

#[tokio::test]
async fn test_on_start_uses_stored_category() {
    let mut mock = MockHttpClient::new();
    mock.expect_execute()
        .withf(|request| requested_category(request).as_deref() == Some("famous"))
        .times(1)
        .returning(|_| Ok(HttpResponse::new(200, QUOTE_BODY)));
    let core = core_with(mock).await;

    core.preferences()
        .put(PreferenceKey::QuoteCategory, "famous")
        .await
        .unwrap();

    let outcome = core.on_start(None).await.unwrap().outcome().await.unwrap();
    assert!(outcome.is_success());
    // A missing host context is logged, not fatal
    assert!(!core.network().is_initialized());
}

#[tokio::test]
async fn test_quote_reaches_bus_subscribers() {
    let mut mock = MockHttpClient::new();
    mock.expect_execute()
        .returning(|_| Ok(HttpResponse::new(200, QUOTE_BODY)));
    let core = core_with(mock).await;

    let (_, mut quotes) = core.events().subscribe_channel::<QuoteReceived>();
    core.on_start(Some(HostContext::new("app", "1")))
        .await
        .unwrap()
        .detach();

    let QuoteReceived(quote) = quotes.recv().await.unwrap();
    assert_eq!(quote.quote, "Here's looking at you, kid.");
}

#[tokio::test]
async fn test_bootstrap_opens_settings_file() {
    let dir = std::env::temp_dir().join(format!("simple-framework-{}", uuid::Uuid::new_v4()));
    let mock: Arc<dyn HttpClient> = Arc::new(MockHttpClient::new());
    let config = AppConfig::builder()
        .api_key("test-key")
        .settings_dir(dir.clone())
        .http_client(mock)
        .build()
        .unwrap();

    let core = AppCore::bootstrap(config.clone()).await.unwrap();
    core.preferences()
        .put(PreferenceKey::SampleKeyTest, "persisted")
        .await
        .unwrap();

    assert!(config.settings_path().unwrap().exists());
    assert!(dir.join("default_settings.db").exists());

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let config = AppConfig {
        network: core_runtime::NetworkConfig {
            api_key: String::new(),
            ..config().network
        },
        ..config()
    };
    let store = Arc::new(SqliteSettingsStore::in_memory().await.unwrap());

    let result = AppCore::new(
        &config,
        CoreDependencies::new(Arc::new(MockHttpClient::new()), store),
    );

    assert!(matches!(
        result,
        Err(CoreError::Runtime(core_runtime::Error::Config(_)))
    ));
}
