use serde_json::Value;

use alo_session::{Session, SessionContext, SessionData, StartOutcome};

use crate::common::{ALL_STORES, MockBrowser, make_store, test_config};

#[tokio::test]
async fn test_persist_then_reject_tampered_fingerprint() {
    for kind in ALL_STORES {
        // Given a started session holding a value
        let config = test_config();
        let store = make_store(kind, &config).await;
        let mut browser = MockBrowser::new("browser/1.0");
        let mut ctx = browser.context();
        let s1 = Session::new(store.clone(), config.clone(), &mut ctx)
            .await
            .unwrap();
        assert_eq!(s1.start(&mut ctx).await.unwrap(), StartOutcome::Started);
        assert!(ctx.is_active());
        assert!(ctx.set("x", "hello"));

        // When the request ends
        let response = ctx.finish().await;
        browser.receive(&response);

        // Then the store holds the payload with the value and a fingerprint
        let raw = store.read(s1.id()).await.unwrap().expect("stored payload");
        let payload: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(payload["x"], "hello", "{kind:?}");
        assert!(payload[config.fingerprint_key()].is_string(), "{kind:?}");
        assert_eq!(browser.cookie(config.cookie_name()), Some(s1.id()));

        // Given the stored fingerprint has been tampered with
        let mut tampered = SessionData::decode(&raw, &config);
        assert!(tampered.fingerprint().is_some());
        let mut object = payload.as_object().unwrap().clone();
        object.insert(
            config.fingerprint_key().to_string(),
            Value::String("0".repeat(64)),
        );
        store
            .write(s1.id(), &Value::Object(object).to_string())
            .await
            .unwrap();
        tampered = SessionData::decode(&store.read(s1.id()).await.unwrap().unwrap(), &config);
        assert_eq!(tampered.fingerprint(), Some("0".repeat(64).as_str()));

        // When a new session starts with the same cookie id
        let mut ctx = browser.context();
        let s2 = Session::new(store.clone(), config.clone(), &mut ctx)
            .await
            .unwrap();
        assert_eq!(s2.id(), s1.id());
        let outcome = s2.start(&mut ctx).await.unwrap();

        // Then the identity check fails and the entry is gone
        assert_eq!(outcome, StartOutcome::IdentityCheckFailed, "{kind:?}");
        assert!(!ctx.is_active());
        assert!(!store.id_exists(s1.id()).await.unwrap(), "{kind:?}");
        assert_eq!(store.read(s1.id()).await.unwrap(), None);

        // And the browser is told to drop the cookie
        browser.receive(&ctx.finish().await);
        assert_eq!(browser.cookie(config.cookie_name()), None);
    }
}

#[tokio::test]
async fn test_session_survives_across_requests() {
    for kind in ALL_STORES {
        let config = test_config();
        let store = make_store(kind, &config).await;
        let mut browser = MockBrowser::new("browser/1.0");

        // Three requests, each incrementing a counter
        let mut first_id = None;
        for expected in 1..=3u32 {
            let mut ctx = browser.context();
            let session = Session::new(store.clone(), config.clone(), &mut ctx)
                .await
                .unwrap();
            assert!(session.start(&mut ctx).await.unwrap().is_started());

            let visits = ctx.get::<u32>("visits").unwrap_or(0) + 1;
            assert_eq!(visits, expected, "{kind:?}");
            ctx.set("visits", &visits);

            let id = first_id.get_or_insert_with(|| session.id().to_string());
            assert_eq!(session.id(), id.as_str());

            browser.receive(&ctx.finish().await);
        }
    }
}

#[tokio::test]
async fn test_logout_destroys_stored_session() {
    for kind in ALL_STORES {
        // Given a persisted session
        let config = test_config();
        let store = make_store(kind, &config).await;
        let mut browser = MockBrowser::new("browser/1.0");
        let mut ctx = browser.context();
        let session = Session::new(store.clone(), config.clone(), &mut ctx)
            .await
            .unwrap();
        session.start(&mut ctx).await.unwrap();
        ctx.set("user", "alice");
        browser.receive(&ctx.finish().await);

        // When the next request destroys it
        let mut ctx = browser.context();
        let session = Session::new(store.clone(), config.clone(), &mut ctx)
            .await
            .unwrap();
        session.start(&mut ctx).await.unwrap();
        assert!(ctx.destroy_safely().await);
        assert!(!ctx.is_active());
        browser.receive(&ctx.finish().await);

        // Then storage and cookie are both gone and the next visit starts fresh
        assert!(!store.id_exists(session.id()).await.unwrap(), "{kind:?}");
        assert_eq!(browser.cookie(config.cookie_name()), None);

        let mut ctx = browser.context();
        let fresh = Session::new(store.clone(), config.clone(), &mut ctx)
            .await
            .unwrap();
        fresh.start(&mut ctx).await.unwrap();
        assert_ne!(fresh.id(), session.id());
        assert_eq!(ctx.get::<String>("user"), None);
    }
}

#[tokio::test]
async fn test_non_interactive_sessions_are_not_persisted_by_default() {
    for kind in ALL_STORES {
        let config = test_config();
        let store = make_store(kind, &config).await;

        let mut ctx = SessionContext::non_interactive();
        let session = Session::new(store.clone(), config.clone(), &mut ctx)
            .await
            .unwrap();
        assert!(session.start(&mut ctx).await.unwrap().is_started());
        ctx.set("job", "nightly");

        // Writing is skipped, so write_close reports nothing persisted
        assert!(!ctx.write_close().await);
        assert!(!store.id_exists(session.id()).await.unwrap(), "{kind:?}");
    }
}

#[tokio::test]
async fn test_non_interactive_sessions_persist_when_enabled() {
    for kind in ALL_STORES {
        let config = std::sync::Arc::new(
            alo_session::SessionConfig::default().with_persist_in_non_interactive_mode(true),
        );
        let store = make_store(kind, &config).await;

        let mut ctx = SessionContext::non_interactive();
        let session = Session::new(store.clone(), config.clone(), &mut ctx)
            .await
            .unwrap();
        session.start(&mut ctx).await.unwrap();
        ctx.set("job", "nightly");

        assert!(ctx.write_close().await);
        let raw = store.read(session.id()).await.unwrap().unwrap();
        assert!(raw.contains("nightly"), "{kind:?}");
    }
}
