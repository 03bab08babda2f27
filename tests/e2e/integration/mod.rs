//! Integration test utilities and helpers

pub mod fixtures {
    use std::sync::Once;

    use uuid::Uuid;
    use vset_store::StoreConfig;

    static INIT: Once = Once::new();

    /// Initialize test environment
    pub fn init() {
        INIT.call_once(|| {
            // Initialize logging for tests
            let _ = tracing_subscriber::fmt()
                .with_test_writer()
                .try_init();
        });
    }

    /// Connection settings from the environment, on a key no other test uses
    pub fn isolated_config() -> StoreConfig {
        let config = StoreConfig::from_env();
        let key = format!("{}:e2e:{}", config.key, Uuid::new_v4());
        config.with_key(key)
    }
}

pub mod asserts {
    use vset_store::Match;

    /// Assert that matches come back most similar first
    pub fn assert_scores_descending(matches: &[Match]) {
        for pair in matches.windows(2) {
            assert!(
                pair[0].score >= pair[1].score,
                "match '{}' ({}) ranked above '{}' ({})",
                pair[0].id,
                pair[0].score,
                pair[1].id,
                pair[1].score
            );
        }
    }
}
