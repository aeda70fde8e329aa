//! Concurrent providers racing for the same task

use std::sync::Arc;

use axle_ledger::{Ledger, MemoryLedger};
use axle_sdk::{AxleClient, CreateTaskParams, ErrorKind, KeyPair, TaskStatus};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_one_provider_wins_the_race() {
    let ledger = Arc::new(MemoryLedger::new());
    let requester = AxleClient::new(ledger.clone(), KeyPair::generate());
    ledger.airdrop(&requester.wallet_address(), 10_000).await.unwrap();

    let mut providers = Vec::new();
    for i in 0..6 {
        let client = AxleClient::new(ledger.clone(), KeyPair::generate());
        client
            .register_agent(format!("racer-{}", i), vec!["scraping".into()], 0)
            .await
            .unwrap();
        providers.push(client);
    }

    let now = ledger.clock().await.unwrap();
    let task = requester
        .create_task(CreateTaskParams {
            description: "first come first served".into(),
            required_capability: "scraping".into(),
            reward: 10_000,
            deadline: now + 600,
        })
        .await
        .unwrap();

    let attempts = providers.iter().map(|p| p.accept_task(&task.handle));
    let results = futures::future::join_all(attempts).await;

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(err.kind(), ErrorKind::InvalidStateTransition);
    }

    let record = requester.get_task(&task.handle).await.unwrap().unwrap();
    assert_eq!(record.status, TaskStatus::Accepted);
    let winner = providers
        .iter()
        .position(|p| Some(p.wallet_address()) == record.provider);
    assert!(winner.is_some());
}
