use alo_session::{Session, SessionError, Token};

use crate::common::{ALL_STORES, MockBrowser, make_store, test_config};

#[tokio::test]
async fn test_csrf_token_across_requests() {
    for kind in ALL_STORES {
        let config = test_config();
        let store = make_store(kind, &config).await;
        let mut browser = MockBrowser::new("browser/1.0");

        // Given a form page that issues a token
        let mut ctx = browser.context();
        let session = Session::new(store.clone(), config.clone(), &mut ctx)
            .await
            .unwrap();
        session.start(&mut ctx).await.unwrap();
        let token = Token::from_context("form", &ctx).unwrap();
        let issued = token.create(&mut ctx).unwrap();
        browser.receive(&ctx.finish().await);

        // When the form is posted with a forged value
        let mut ctx = browser.context();
        let session = Session::new(store.clone(), config.clone(), &mut ctx)
            .await
            .unwrap();
        session.start(&mut ctx).await.unwrap();
        assert!(!token.verify(&mut ctx, "forged"), "{kind:?}");

        // Then the real value still verifies, once
        assert!(token.verify(&mut ctx, &issued), "{kind:?}");
        assert!(!token.verify(&mut ctx, &issued));
        browser.receive(&ctx.finish().await);

        // And the consumed token stays consumed in the next request
        let mut ctx = browser.context();
        let session = Session::new(store.clone(), config.clone(), &mut ctx)
            .await
            .unwrap();
        session.start(&mut ctx).await.unwrap();
        assert_eq!(token.get(&ctx), None, "{kind:?}");
    }
}

#[tokio::test]
async fn test_token_requires_active_session() {
    let browser = MockBrowser::new("browser/1.0");
    let ctx = browser.context();

    let result = Token::from_context("form", &ctx);

    assert!(matches!(result, Err(SessionError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_stolen_cookie_does_not_leak_tokens() {
    for kind in ALL_STORES {
        // Given a victim with an issued token
        let config = test_config();
        let store = make_store(kind, &config).await;
        let mut victim = MockBrowser::new("victim/1.0");
        let mut ctx = victim.context();
        let session = Session::new(store.clone(), config.clone(), &mut ctx)
            .await
            .unwrap();
        session.start(&mut ctx).await.unwrap();
        Token::with_session("form", &session).create(&mut ctx).unwrap();
        victim.receive(&ctx.finish().await);

        // When an attacker replays the victim's cookie
        let attacker = victim.impersonate("attacker/1.0");
        let mut ctx = attacker.context();
        let session = Session::new(store.clone(), config.clone(), &mut ctx)
            .await
            .unwrap();
        let outcome = session.start(&mut ctx).await.unwrap();

        // Then no session, no token
        assert!(!outcome.is_started(), "{kind:?}");
        assert_eq!(Token::with_config("form", &config).get(&ctx), None);
    }
}
