use alo_session::StorageError;

use crate::common::{ALL_STORES, make_store, test_config};

#[tokio::test]
async fn test_round_trip() {
    for kind in ALL_STORES {
        let config = test_config();
        let store = make_store(kind, &config).await;

        // Nothing stored yet
        assert_eq!(store.read("abc").await.unwrap(), None, "{kind:?}");
        assert!(!store.id_exists("abc").await.unwrap());

        // Write then read back
        store.write("abc", r#"{"foo":"bar"}"#).await.unwrap();
        assert_eq!(
            store.read("abc").await.unwrap().as_deref(),
            Some(r#"{"foo":"bar"}"#),
            "{kind:?}"
        );
        assert!(store.id_exists("abc").await.unwrap());

        // Overwrite
        store.write("abc", r#"{"foo":"baz"}"#).await.unwrap();
        assert_eq!(
            store.read("abc").await.unwrap().as_deref(),
            Some(r#"{"foo":"baz"}"#)
        );

        // Destroy, twice
        store.destroy("abc").await.unwrap();
        store.destroy("abc").await.unwrap();
        assert_eq!(store.read("abc").await.unwrap(), None, "{kind:?}");
        assert!(!store.id_exists("abc").await.unwrap());
    }
}

#[tokio::test]
async fn test_entries_are_isolated_by_id() {
    for kind in ALL_STORES {
        let config = test_config();
        let store = make_store(kind, &config).await;

        store.write("one", "1").await.unwrap();
        store.write("two", "2").await.unwrap();
        store.destroy("one").await.unwrap();

        assert_eq!(store.read("one").await.unwrap(), None, "{kind:?}");
        assert_eq!(store.read("two").await.unwrap().as_deref(), Some("2"));
    }
}

#[tokio::test]
async fn test_gc_keeps_fresh_entries() -> Result<(), StorageError> {
    for kind in ALL_STORES {
        let config = test_config();
        let store = make_store(kind, &config).await;
        store.write("fresh", "x").await?;

        store.gc(config.timeout()).await?;

        assert!(store.id_exists("fresh").await?, "{kind:?}");
    }
    Ok(())
}
