//! Session Convergence Tests
//!
//! End-to-end originator/partner sessions over in-memory streams.

mod common;

use common::*;
use std::sync::Arc;
use tsae_anti_entropy::SessionRole;

// ============================================================================
// Two-replica exchange
// ============================================================================

#[tokio::test]
async fn originator_pulls_missing_operations_from_partner() {
    let all = ["x", "y"];
    let x = replica("x", &all);
    let y = replica("y", &all);
    assert!(x.perform_operation(op("x", 1)));
    assert!(x.perform_operation(op("x", 2)));

    let (orig, part) = session(&y, &x).await;
    let orig = orig.unwrap();
    let part = part.unwrap();

    assert_eq!(log_entries(&y), vec![("x".to_string(), 1), ("x".to_string(), 2)]);
    assert_eq!(last_seen(&x, "x"), 2);
    assert_eq!(last_seen(&y, "x"), 2);

    assert_eq!(orig.role, SessionRole::Originator);
    assert_eq!(orig.operations_admitted, 2);
    assert_eq!(orig.operations_sent, 0);
    assert_eq!(part.role, SessionRole::Partner);
    assert_eq!(part.operations_sent, 2);
    assert_eq!(part.session_number, orig.session_number);
}

#[tokio::test]
async fn both_directions_converge_in_one_session() {
    let all = ["x", "y"];
    let x = replica("x", &all);
    let y = replica("y", &all);
    for n in 0..3 {
        x.issue(format!("x-{n}"));
    }
    for n in 0..2 {
        y.issue(format!("y-{n}"));
    }

    let (orig, part) = session(&x, &y).await;
    assert_eq!(orig.unwrap().operations_admitted, 2);
    assert_eq!(part.unwrap().operations_admitted, 3);

    assert_eq!(log_entries(&x), log_entries(&y));
    assert_eq!(x.summary(), y.summary());
    assert_eq!(last_seen(&x, "x"), 2);
    assert_eq!(last_seen(&x, "y"), 1);
}

#[tokio::test]
async fn empty_session_completes_handshake() {
    let all = ["x", "y"];
    let x = replica("x", &all);
    let y = replica("y", &all);

    let (orig, part) = session(&x, &y).await;
    let orig = orig.unwrap();
    let part = part.unwrap();

    assert_eq!(orig.operations_sent + orig.operations_received, 0);
    assert_eq!(part.operations_sent + part.operations_received, 0);
    assert!(x.log_snapshot().is_empty());
}

#[tokio::test]
async fn repeated_session_sends_nothing_new() {
    let all = ["x", "y"];
    let x = replica("x", &all);
    let y = replica("y", &all);
    x.issue("a".to_string());
    x.issue("b".to_string());

    session(&y, &x).await.0.unwrap();
    let (orig, part) = session(&y, &x).await;

    assert_eq!(orig.unwrap().operations_received, 0);
    assert_eq!(part.unwrap().operations_sent, 0);
    assert_eq!(last_seen(&y, "x"), 1);
    // Both replicas now acknowledge x:1, so only the watermark entry remains.
    assert_eq!(log_entries(&y), vec![("x".to_string(), 1)]);
    assert_eq!(log_entries(&x), vec![("x".to_string(), 1)]);
}

// ============================================================================
// Acknowledgment propagation and purge
// ============================================================================

#[tokio::test]
async fn purge_happens_once_every_replica_acknowledges() {
    let all = ["x", "y", "z"];
    let x = replica("x", &all);
    let y = replica("y", &all);
    let z = replica("z", &all);
    for n in 0..6 {
        x.issue(format!("x-{n}"));
    }

    // Deliver, then report back so x learns everyone holds x:5.
    session(&y, &x).await.0.unwrap();
    session(&z, &x).await.0.unwrap();
    assert_eq!(log_entries(&x).len(), 6);
    session(&y, &x).await.0.unwrap();
    session(&z, &x).await.0.unwrap();

    assert_eq!(log_entries(&x), vec![("x".to_string(), 5)]);

    // y folds in x's ack matrix on the next session and purges too.
    session(&y, &x).await.0.unwrap();
    assert_eq!(log_entries(&y), vec![("x".to_string(), 5)]);
    assert_eq!(last_seen(&y, "x"), 5);
}

#[tokio::test]
async fn late_replica_still_receives_unpurged_history() {
    let all = ["x", "y", "z"];
    let x = replica("x", &all);
    let y = replica("y", &all);
    let z = replica("z", &all);
    for n in 0..3 {
        x.issue(format!("x-{n}"));
    }

    session(&y, &x).await.0.unwrap();
    session(&y, &x).await.0.unwrap();
    // z has never synced, so its null row keeps the watermark null.
    assert_eq!(log_entries(&x).len(), 3);
    assert_eq!(log_entries(&y).len(), 3);

    session(&z, &y).await.0.unwrap();
    assert_eq!(log_entries(&z).len(), 3);
}

// ============================================================================
// Concurrent sessions
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sessions_admit_the_union() {
    let all = ["x", "y", "z"];
    let x = replica("x", &all);
    let y = replica("y", &all);
    let z = replica("z", &all);
    for n in 0..20 {
        x.issue(format!("x-{n}"));
        z.issue(format!("z-{n}"));
    }

    let with_x = {
        let (y, x) = (Arc::clone(&y), Arc::clone(&x));
        tokio::spawn(async move { session(&y, &x).await })
    };
    let with_z = {
        let (y, z) = (Arc::clone(&y), Arc::clone(&z));
        tokio::spawn(async move { session(&y, &z).await })
    };
    let (a, b) = tokio::join!(with_x, with_z);
    a.unwrap().0.unwrap();
    b.unwrap().0.unwrap();

    // Same sessions run sequentially against fresh replicas.
    let x2 = replica("x", &all);
    let y2 = replica("y", &all);
    let z2 = replica("z", &all);
    for n in 0..20 {
        x2.issue(format!("x-{n}"));
        z2.issue(format!("z-{n}"));
    }
    session(&y2, &z2).await.0.unwrap();
    session(&y2, &x2).await.0.unwrap();

    assert_eq!(log_entries(&y).len(), 40);
    assert_eq!(log_entries(&y), log_entries(&y2));
    assert_eq!(y.summary(), y2.summary());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn issuing_during_sessions_keeps_log_ordered() {
    let all = ["x", "y"];
    let x = replica("x", &all);
    let y = replica("y", &all);

    let issuer = {
        let x = Arc::clone(&x);
        tokio::spawn(async move {
            for n in 0..50 {
                x.issue(format!("x-{n}"));
                tokio::task::yield_now().await;
            }
        })
    };
    for _ in 0..5 {
        session(&y, &x).await.0.unwrap();
    }
    issuer.await.unwrap();
    session(&y, &x).await.0.unwrap();

    assert_eq!(last_seen(&y, "x"), 49);
    let seqs: Vec<i64> = log_entries(&y).into_iter().map(|(_, s)| s).collect();
    assert!(seqs.windows(2).all(|w| w[1] == w[0] + 1));
    assert_eq!(seqs.last(), Some(&49));
}
