//! Daily riddle idempotency, hint billing and solve credit across devices

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;

use common::{CHILD, SharedStore, add_child, day};
use kidbank::{Economy, EconomyError, EntryKind};
use kidbank::riddle::{Difficulty, GeneratedRiddle, RiddleGenerator};

/// Generator that answers slowly with a distinct question per call
struct CountingGenerator {
    calls: AtomicUsize,
    delay: Duration,
}

#[async_trait]
impl RiddleGenerator for CountingGenerator {
    async fn generate(&self, difficulty: Difficulty) -> anyhow::Result<GeneratedRiddle> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(GeneratedRiddle {
            question: format!("{difficulty} riddle #{n}"),
            answer: "shadow".to_string(),
            hint: "It follows you in the sun.".to_string(),
            points: 10,
        })
    }

    fn id(&self) -> &str {
        "counting"
    }
}

/// Persist today's riddle through one handle so other devices can race on it
async fn seed_riddle(store: &SharedStore, balance: i64) {
    let economy = store.open_with(Arc::new(CountingGenerator {
        calls: AtomicUsize::new(0),
        delay: Duration::ZERO,
    }));
    add_child(&economy, balance);
    economy.daily_riddle(CHILD).await.unwrap();
}

fn entries_of_kind(economy: &Economy, kind: EntryKind) -> usize {
    economy
        .ledger()
        .history(CHILD, 50)
        .unwrap()
        .iter()
        .filter(|e| e.kind == kind)
        .count()
}

/// Generator that never produces usable output
struct BrokenGenerator;

#[async_trait]
impl RiddleGenerator for BrokenGenerator {
    async fn generate(&self, _difficulty: Difficulty) -> anyhow::Result<GeneratedRiddle> {
        kidbank::riddle::parse_payload(serde_json::json!({ "text": "Sorry, no riddle today." }))
    }

    fn id(&self) -> &str {
        "broken"
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_get_or_create_across_devices() {
    let store = SharedStore::new();
    let generator = Arc::new(CountingGenerator {
        calls: AtomicUsize::new(0),
        delay: Duration::from_millis(50),
    });
    let device_a = store.open_with(generator.clone());
    let device_b = store.open_with(generator.clone());
    add_child(&device_a, 0);

    let a = tokio::spawn(async move { device_a.daily_riddle(CHILD).await });
    let b = tokio::spawn(async move { device_b.daily_riddle(CHILD).await });
    let a = a.await.unwrap().unwrap();
    let b = b.await.unwrap().unwrap();

    assert_eq!(a.id, b.id);
    assert_eq!(a.question, b.question);

    let economy = store.open();
    let count: i64 = economy
        .db()
        .conn()
        .query_row("SELECT COUNT(*) FROM daily_riddles", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_broken_generator_persists_nothing() {
    let store = SharedStore::new();
    let economy = store.open_with(Arc::new(BrokenGenerator));
    add_child(&economy, 0);

    let err = economy.daily_riddle(CHILD).await.unwrap_err();
    assert!(matches!(err, EconomyError::GenerationFailed(_)));
    assert!(err.is_retryable());
    assert!(economy.riddles().get(CHILD, day(2024, 3, 1)).unwrap().is_none());

    // Buying a hint for a riddle that never materialized has no context
    assert!(matches!(
        economy.purchase_hint(CHILD, day(2024, 3, 1)),
        Err(EconomyError::NoHintContext)
    ));
}

#[tokio::test]
async fn test_hint_then_solve_flow() {
    let store = SharedStore::new();
    let generator = Arc::new(CountingGenerator {
        calls: AtomicUsize::new(0),
        delay: Duration::ZERO,
    });
    let economy = store.open_with(generator);
    add_child(&economy, 10);
    let today = economy.today();

    let riddle = economy.daily_riddle(CHILD).await.unwrap();
    assert_eq!(riddle.difficulty, Difficulty::Medium);

    let receipt = economy.purchase_hint(CHILD, today).unwrap();
    assert!(receipt.charged);
    assert_eq!(receipt.balance, 5);
    let again = store.open().purchase_hint(CHILD, today).unwrap();
    assert!(!again.charged);
    assert_eq!(again.hint, receipt.hint);
    assert_eq!(again.balance, 5);

    let solved = economy.solve_riddle(CHILD, today, " Shadow ").unwrap();
    assert_eq!(solved.balance, 15);
    let second = economy.solve_riddle(CHILD, today, "shadow").unwrap_err();
    assert!(second.is_duplicate());
    assert_eq!(economy.ledger().balance(CHILD).unwrap(), 15);

    // Nothing left to buy once solved
    assert!(matches!(
        economy.purchase_hint(CHILD, today),
        Err(EconomyError::AlreadySolved)
    ));
    assert!(economy.ledger().verify(CHILD).unwrap().is_consistent());
}

#[tokio::test]
async fn test_next_day_brings_new_riddle() {
    let store = SharedStore::new();
    let economy = store.open();
    add_child(&economy, 0);

    let first = economy.daily_riddle(CHILD).await.unwrap();
    store.clock.advance(chrono::Duration::days(1));
    let second = economy.daily_riddle(CHILD).await.unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(second.day, "2024-03-02");
}

#[tokio::test]
async fn test_concurrent_hint_purchase_charges_once() {
    let store = SharedStore::new();
    seed_riddle(&store, 10).await;
    let today = day(2024, 3, 1);

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = [store.open(), store.open()]
        .into_iter()
        .map(|economy| {
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                economy.purchase_hint(CHILD, today)
            })
        })
        .collect();
    let receipts: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("hint thread panicked").unwrap())
        .collect();

    assert_eq!(receipts.iter().filter(|r| r.charged).count(), 1);
    assert_eq!(receipts[0].hint, receipts[1].hint);
    assert!(receipts.iter().all(|r| r.balance == 5));

    let economy = store.open();
    assert_eq!(economy.ledger().balance(CHILD).unwrap(), 5);
    assert_eq!(entries_of_kind(&economy, EntryKind::HintPurchase), 1);
    assert!(economy.ledger().verify(CHILD).unwrap().is_consistent());
}

#[tokio::test]
async fn test_concurrent_solve_credits_once() {
    let store = SharedStore::new();
    seed_riddle(&store, 5).await;
    let today = day(2024, 3, 1);

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = [store.open(), store.open()]
        .into_iter()
        .map(|economy| {
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                economy.solve_riddle(CHILD, today, "shadow")
            })
        })
        .collect();
    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("solve thread panicked"))
        .collect();

    let solved: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(solved.len(), 1);
    assert_eq!(solved[0].balance, 15);
    assert!(
        results
            .iter()
            .any(|r| matches!(r, Err(EconomyError::AlreadySolved)))
    );

    let economy = store.open();
    assert_eq!(economy.ledger().balance(CHILD).unwrap(), 15);
    assert_eq!(entries_of_kind(&economy, EntryKind::RiddleSolve), 1);
    assert!(economy.ledger().verify(CHILD).unwrap().is_consistent());
}
