// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixtures shared by the engine's unit tests.

use std::sync::Arc;
use std::time::Duration;

use smsgate_config::model::QueueConfig;
use smsgate_core::{MessageStore, NewMessage};
use smsgate_providers::ProviderRegistry;
use smsgate_storage::{Database, QueueSettings, SqliteStorage};
use smsgate_test_utils::{MockOutcome, MockProvider};

pub(crate) fn provider(name: &str, script: Vec<MockOutcome>) -> Arc<MockProvider> {
    Arc::new(MockProvider::with_script(name, script))
}

pub(crate) fn accept(reference: &str) -> MockOutcome {
    MockOutcome::Accept(reference.to_string())
}

pub(crate) fn reject() -> MockOutcome {
    MockOutcome::Reject("rejected".to_string())
}

pub(crate) fn registry(providers: &[Arc<MockProvider>]) -> Arc<ProviderRegistry> {
    let mut registry = ProviderRegistry::new();
    for p in providers {
        registry
            .register(p.clone(), Duration::from_millis(200))
            .unwrap();
    }
    Arc::new(registry)
}

pub(crate) async fn storage(max_attempts: u32) -> (Arc<SqliteStorage>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("engine.db").to_str().unwrap())
        .await
        .unwrap();
    let queue = QueueSettings::from(&QueueConfig {
        max_attempts,
        ..QueueConfig::default()
    });
    (Arc::new(SqliteStorage::with_database(db, queue)), dir)
}

pub(crate) async fn queued(store: &SqliteStorage, tracking_id: &str) {
    store
        .create_message(&NewMessage {
            tracking_id: tracking_id.to_string(),
            client: Some("c1".into()),
            recipient: "+15550100".into(),
            text: "hello".into(),
        })
        .await
        .unwrap();
}
