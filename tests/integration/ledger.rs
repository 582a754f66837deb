//! End-to-end tests for the voting ledger.

use rand::{seq::SliceRandom, thread_rng, Rng};

use std::{error::Error as _, num::NonZeroU64};

use crate::{Setup, END, OWNER, START, VALUE_BOUND};
use confidential_qv::{
    group::Group,
    ledger::{BudgetPolicy, LedgerError, LedgerParams, OracleError, Phase, VotingId},
    toolkit::ToolkitError,
};

const WEEK: u64 = 604_800;

fn test_quadratic_ballot_lifecycle<G: Group>() {
    let setup = Setup::<G>::new(&[("alice", 100)]);
    let now = 10_000;
    setup.clock.set(now);
    let start = now + 1;
    let id = setup
        .ledger
        .create_voting(&OWNER, start, start + WEEK, 5)
        .unwrap();

    let ballot = setup.ballot(&[0, 6, 0, 0, 8]);
    let err = setup.ledger.submit_ballot(id, &"alice", &ballot).unwrap_err();
    assert_eq!(
        err,
        LedgerError::VotingNotOpen {
            id,
            phase: Phase::Pending
        }
    );
    assert!(!setup.ledger.has_voted(id, &"alice").unwrap());

    setup.clock.set(start);
    setup.ledger.submit_ballot(id, &"alice", &ballot).unwrap();
    assert_eq!(setup.tallies(id), [0, 6, 0, 0, 8]);
    assert!(setup.ledger.has_voted(id, &"alice").unwrap());

    // Any second ballot is rejected, even an empty one.
    let ballot = setup.ballot(&[0; 5]);
    let err = setup.ledger.submit_ballot(id, &"alice", &ballot).unwrap_err();
    assert_eq!(err, LedgerError::DuplicateVote(id));
    assert_eq!(setup.tallies(id), [0, 6, 0, 0, 8]);

    setup.clock.set(start + WEEK + 1);
    let snapshot = setup.ledger.voting(id).unwrap();
    assert_eq!(snapshot.status(), Phase::Closed);
    assert_eq!(snapshot.voter_count(), 1);
    assert_eq!(setup.decrypt(snapshot.tallies()), [0, 6, 0, 0, 8]);
}

fn test_invalid_creations_do_not_change_registry<G: Group>() {
    let setup = Setup::<G>::new(&[]);
    setup.create_voting(3);
    assert_eq!(setup.ledger.len(), 1);

    let err = setup.ledger.create_voting(&OWNER, 10, 5, 3).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidTimeWindow { .. }));
    let err = setup.ledger.create_voting(&OWNER, 10, 10, 3).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidTimeWindow { .. }));
    let err = setup.ledger.create_voting(&OWNER, START, END, 2).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidOptionCount { .. }));
    let err = setup.ledger.create_voting(&OWNER, START, END, 65).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidOptionCount { .. }));
    let err = setup.ledger.create_voting(&"alice", START, END, 3).unwrap_err();
    assert_eq!(err, LedgerError::Unauthorized);

    setup.clock.set(START + 1);
    let err = setup.ledger.create_voting(&OWNER, START, END, 3).unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidTimeWindow {
            start: START,
            end: END,
            now: START + 1
        }
    );
    assert_eq!(setup.ledger.len(), 1);
    assert_eq!(setup.ledger.votings().len(), 1);
}

fn test_over_budget_ballot_is_zeroed<G: Group>() {
    let balances = [("alice", 100), ("bob", 99), ("carol", 50), ("dave", 50)];
    let setup = Setup::<G>::new(&balances);
    let id = setup.create_voting(5);
    setup.open();

    setup
        .ledger
        .submit_ballot(id, &"alice", &setup.ballot(&[0, 6, 0, 0, 8]))
        .unwrap();
    // 36 + 64 = 100 > 99
    setup
        .ledger
        .submit_ballot(id, &"bob", &setup.ballot(&[0, 6, 0, 0, 8]))
        .unwrap();
    // Allocation far beyond the budget saturates the cost instead of wrapping.
    setup
        .ledger
        .submit_ballot(id, &"carol", &setup.ballot(&[1_000, 0, 0, 0, 0]))
        .unwrap();
    // Allocations for another key are zeroed the same way.
    let foreign = Setup::<G>::new(&[]).ballot(&[1, 2, 3, 0, 0]);
    setup.ledger.submit_ballot(id, &"dave", &foreign).unwrap();

    assert_eq!(setup.tallies(id), [0, 6, 0, 0, 8]);
    assert!(setup.ledger.has_voted(id, &"dave").unwrap());
    // Rejected ballots still count as cast.
    assert!(setup.ledger.has_voted(id, &"bob").unwrap());
    assert!(setup.ledger.has_voted(id, &"carol").unwrap());
    let err = setup
        .ledger
        .submit_ballot(id, &"bob", &setup.ballot(&[1, 0, 0, 0, 0]))
        .unwrap_err();
    assert_eq!(err, LedgerError::DuplicateVote(id));
}

fn test_budget_above_allocation_bound<G: Group>() {
    let balances = [("alice", 100), ("whale", 1_000_000), ("shark", 1_000_000)];
    let setup = Setup::<G>::new(&balances);
    let id = setup.create_voting(3);
    setup.open();

    // 36 + 64 = 100 exceeds the bound on a single allocation, but not the budget.
    setup
        .ledger
        .submit_ballot(id, &"alice", &setup.ballot(&[6, 8, 0]))
        .unwrap();
    assert_eq!(setup.tallies(id), [6, 8, 0]);

    // Budgets beyond `COST_BOUND` accept every ballot with valid allocations.
    let max = VALUE_BOUND;
    setup
        .ledger
        .submit_ballot(id, &"whale", &setup.ballot(&[max, max, max]))
        .unwrap();
    assert_eq!(setup.tallies(id), [6 + max, 8 + max, max]);

    // ...but an out-of-range allocation cannot be checked against such a budget.
    let err = setup
        .ledger
        .submit_ballot(id, &"shark", &setup.ballot(&[max + 1, 0, 0]))
        .unwrap_err();
    assert_eq!(err, LedgerError::Toolkit(ToolkitError::CapacityExceeded));
    assert!(!setup.ledger.has_voted(id, &"shark").unwrap());
    assert_eq!(setup.tallies(id), [6 + max, 8 + max, max]);
}

fn test_ballot_order_independence<G: Group>() {
    let mut rng = thread_rng();
    let voters = ["v0", "v1", "v2", "v3", "v4", "v5"];
    let balances: Vec<_> = voters.iter().map(|&voter| (voter, 60)).collect();
    let allocations: Vec<Vec<u64>> = voters
        .iter()
        .map(|_| (0..4).map(|_| rng.gen_range(0..=5)).collect())
        .collect();

    let mut totals = vec![];
    for _ in 0..2 {
        let setup = Setup::<G>::new(&balances);
        let id = setup.create_voting(4);
        setup.open();

        let mut order: Vec<_> = (0..voters.len()).collect();
        order.shuffle(&mut rng);
        for i in order {
            let ballot = setup.ballot(&allocations[i]);
            setup.ledger.submit_ballot(id, &voters[i], &ballot).unwrap();
        }
        totals.push(setup.tallies(id));
    }

    let expected: Vec<u64> = (0..4)
        .map(|option| {
            allocations
                .iter()
                .filter(|ballot| ballot.iter().map(|x| x * x).sum::<u64>() <= 60)
                .map(|ballot| ballot[option])
                .sum()
        })
        .collect();
    assert_eq!(totals[0], expected);
    assert_eq!(totals[1], expected);
}

fn test_submission_checks_are_ordered<G: Group>() {
    let setup = Setup::<G>::new(&[("alice", 100)]);
    let id = setup.create_voting(3);

    let missing = VotingId::new(id.get() + 1);
    let err = setup
        .ledger
        .submit_ballot(missing, &"alice", &setup.ballot(&[1]))
        .unwrap_err();
    assert_eq!(err, LedgerError::NotFound(missing));

    // Phase is checked before the ballot shape.
    let err = setup
        .ledger
        .submit_ballot(id, &"alice", &setup.ballot(&[1]))
        .unwrap_err();
    assert!(matches!(err, LedgerError::VotingNotOpen { .. }));

    setup.open();
    let err = setup
        .ledger
        .submit_ballot(id, &"alice", &setup.ballot(&[1, 2]))
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::OptionCountMismatch {
            expected: 3,
            actual: 2
        }
    );

    setup.close();
    let err = setup
        .ledger
        .submit_ballot(id, &"alice", &setup.ballot(&[1, 2, 3]))
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::VotingNotOpen {
            id,
            phase: Phase::Closed
        }
    );
    assert_eq!(setup.tallies(id), [0, 0, 0]);
}

fn test_oracle_failure_is_atomic<G: Group>() {
    let setup = Setup::<G>::new(&[("alice", 100)]);
    let id = setup.create_voting(3);
    setup.open();
    let ballot = setup.ballot(&[3, 4, 5]);

    setup.oracle.set_down(true);
    let err = setup.ledger.submit_ballot(id, &"alice", &ballot).unwrap_err();
    assert_eq!(
        err,
        LedgerError::BudgetCheckUnavailable(OracleError::Unavailable("timed out".to_owned()))
    );
    assert!(err.source().is_some());
    assert!(!setup.ledger.has_voted(id, &"alice").unwrap());
    assert_eq!(setup.tallies(id), [0, 0, 0]);

    // The voter can retry once the oracle is back.
    setup.oracle.set_down(false);
    let calls_before = setup.oracle.calls();
    setup.ledger.submit_ballot(id, &"alice", &ballot).unwrap();
    assert_eq!(setup.oracle.calls(), calls_before + 1);
    assert_eq!(setup.tallies(id), [3, 4, 5]);

    // Unknown accounts cannot vote.
    let err = setup.ledger.submit_ballot(id, &"mallory", &ballot).unwrap_err();
    assert_eq!(
        err,
        LedgerError::BudgetCheckUnavailable(OracleError::UnknownAccount)
    );
    assert!(!setup.ledger.has_voted(id, &"mallory").unwrap());
}

fn test_toolkit_failure_is_atomic<G: Group>() {
    let setup = Setup::<G>::new(&[("alice", 100)]);
    let id = setup.create_voting(3);
    setup.open();
    let ballot = setup.ballot(&[1, 2, 3]);

    setup.ledger.toolkit().set_down(true);
    let err = setup.ledger.submit_ballot(id, &"alice", &ballot).unwrap_err();
    assert!(matches!(err, LedgerError::Toolkit(ToolkitError::Unavailable(_))));
    let err = setup.ledger.create_voting(&OWNER, START, END, 3).unwrap_err();
    assert!(matches!(err, LedgerError::Toolkit(_)));
    assert_eq!(setup.ledger.len(), 1);

    setup.ledger.toolkit().set_down(false);
    assert!(!setup.ledger.has_voted(id, &"alice").unwrap());
    assert_eq!(setup.tallies(id), [0, 0, 0]);

    setup.ledger.submit_ballot(id, &"alice", &ballot).unwrap();
    assert_eq!(setup.tallies(id), [1, 2, 3]);
}

fn test_budget_policies<G: Group>() {
    let halved = BudgetPolicy::Scaled {
        numerator: 1,
        denominator: NonZeroU64::new(2).unwrap(),
    };
    let params = LedgerParams::default().with_budget_policy(halved);
    let setup = Setup::<G>::with_params(&[("alice", 200), ("bob", 199)], params);
    let id = setup.create_voting(3);
    setup.open();
    setup
        .ledger
        .submit_ballot(id, &"alice", &setup.ballot(&[6, 8, 0]))
        .unwrap();
    setup
        .ledger
        .submit_ballot(id, &"bob", &setup.ballot(&[6, 8, 0]))
        .unwrap();
    assert_eq!(setup.tallies(id), [6, 8, 0]);

    let params = LedgerParams::default().with_budget_policy(BudgetPolicy::Uniform(25));
    let setup = Setup::<G>::with_params(&[("alice", 1_000_000), ("bob", 0)], params);
    let id = setup.create_voting(3);
    setup.open();
    setup
        .ledger
        .submit_ballot(id, &"alice", &setup.ballot(&[0, 0, 6]))
        .unwrap();
    setup
        .ledger
        .submit_ballot(id, &"bob", &setup.ballot(&[3, 4, 0]))
        .unwrap();
    assert_eq!(setup.tallies(id), [3, 4, 0]);
}

fn test_listing_votings<G: Group>() {
    let setup = Setup::<G>::new(&[("alice", 100)]);
    assert!(setup.ledger.is_empty());
    assert_eq!(*setup.ledger.owner(), OWNER);

    let first = setup.ledger.create_voting(&OWNER, 10, 20, 3).unwrap();
    let second = setup.ledger.create_voting(&OWNER, 15, 30, 4).unwrap();
    let third = setup.ledger.create_voting(&OWNER, 100, 200, 5).unwrap();
    assert_eq!(
        [first, second, third].map(VotingId::get),
        [0, 1, 2]
    );

    setup.clock.set(25);
    let votings = setup.ledger.votings();
    let ids: Vec<_> = votings.iter().map(|voting| voting.id()).collect();
    assert_eq!(ids, [first, second, third]);
    assert!(votings.iter().all(|voting| *voting.creator() == OWNER));
    assert_eq!(votings[1].option_count(), 4);
    assert_eq!(votings[1].window().end(), 30);

    let by_status = setup.ledger.votings_by_status();
    assert_eq!(by_status.len(), 3);
    assert_eq!(by_status.closed[0].id(), first);
    assert_eq!(by_status.open[0].id(), second);
    assert_eq!(by_status.pending[0].id(), third);

    // Boundaries are inclusive.
    setup.clock.set(30);
    let by_status = setup.ledger.votings_by_status();
    assert_eq!(by_status.open.len(), 1);
    setup.clock.set(31);
    let by_status = setup.ledger.votings_by_status();
    assert_eq!(by_status.closed.len(), 2);
    assert_eq!(by_status.pending.len(), 1);
}

fn test_weekly_demo_voting<G: Group>() {
    let setup = Setup::<G>::new(&[("alice", 100), ("bob", 30)]);
    let now = 1_700_000_000;
    setup.clock.set(now);
    let start = now + 335;
    let id = setup
        .ledger
        .create_voting(&OWNER, start, start + 7 * 86_400, 5)
        .unwrap();

    let snapshot = setup.ledger.voting(id).unwrap();
    assert_eq!(snapshot.status(), Phase::Pending);
    assert_eq!(setup.ledger.votings_by_status().pending.len(), 1);

    setup.clock.advance(335 + 86_400);
    assert_eq!(setup.ledger.voting(id).unwrap().status(), Phase::Open);
    setup
        .ledger
        .submit_ballot(id, &"alice", &setup.ballot(&[1, 3, 0, 9, 0]))
        .unwrap();
    setup
        .ledger
        .submit_ballot(id, &"bob", &setup.ballot(&[5, 0, 2, 1, 0]))
        .unwrap();
    assert_eq!(setup.tallies(id), [6, 3, 2, 10, 0]);
}

macro_rules! instantiate_tests {
    ($group:ty) => {
        #[test]
        fn quadratic_ballot_lifecycle() {
            test_quadratic_ballot_lifecycle::<$group>();
        }

        #[test]
        fn invalid_creations_do_not_change_registry() {
            test_invalid_creations_do_not_change_registry::<$group>();
        }

        #[test]
        fn over_budget_ballot_is_zeroed() {
            test_over_budget_ballot_is_zeroed::<$group>();
        }

        #[test]
        fn budget_above_allocation_bound() {
            test_budget_above_allocation_bound::<$group>();
        }

        #[test]
        fn ballot_order_independence() {
            test_ballot_order_independence::<$group>();
        }

        #[test]
        fn submission_checks_are_ordered() {
            test_submission_checks_are_ordered::<$group>();
        }

        #[test]
        fn oracle_failure_is_atomic() {
            test_oracle_failure_is_atomic::<$group>();
        }

        #[test]
        fn toolkit_failure_is_atomic() {
            test_toolkit_failure_is_atomic::<$group>();
        }

        #[test]
        fn budget_policies() {
            test_budget_policies::<$group>();
        }

        #[test]
        fn listing_votings() {
            test_listing_votings::<$group>();
        }

        #[test]
        fn weekly_demo_voting() {
            test_weekly_demo_voting::<$group>();
        }
    };
}

mod curve25519 {
    use super::*;
    use confidential_qv::group::Curve25519Subgroup;

    instantiate_tests!(Curve25519Subgroup);
}

mod ristretto {
    use super::*;
    use confidential_qv::group::Ristretto;

    instantiate_tests!(Ristretto);
}
