//! Session Property Tests
//!
//! Random histories on two replicas, one session, identical state after.

mod common;

use common::*;
use proptest::prelude::*;

/// Operations issued by x, by y, and how many of x's y already holds.
fn histories() -> impl Strategy<Value = (usize, usize, usize)> {
    (0usize..8, 0usize..8)
        .prop_flat_map(|(from_x, from_y)| (Just(from_x), Just(from_y), 0..=from_x))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn one_session_converges_logs_and_summaries(
        (from_x, from_y, known) in histories(),
        x_originates in any::<bool>(),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let all = ["x", "y"];
        let x = replica("x", &all);
        let y = replica("y", &all);

        for n in 0..from_x {
            x.issue(format!("x-{n}"));
        }
        for n in 0..from_y {
            y.issue(format!("y-{n}"));
        }
        for operation in x.log_snapshot().operations(&id("x"))[..known].to_vec() {
            prop_assert!(y.perform_operation(operation));
        }

        let (originated, partnered) = if x_originates {
            runtime.block_on(session(&x, &y))
        } else {
            runtime.block_on(session(&y, &x))
        };
        prop_assert!(originated.is_ok());
        prop_assert!(partnered.is_ok());

        prop_assert_eq!(log_entries(&x), log_entries(&y));
        prop_assert_eq!(x.summary(), y.summary());
        prop_assert_eq!(last_seen(&y, "x"), from_x as i64 - 1);
        prop_assert_eq!(last_seen(&x, "y"), from_y as i64 - 1);

        // Both sides may drop x's history below what y held at the start.
        let kept_from_x = log_entries(&y).iter().filter(|(origin, _)| origin == "x").count();
        prop_assert_eq!(kept_from_x, from_x - known.saturating_sub(1));
    }
}
