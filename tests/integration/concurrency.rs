//! Tests for concurrent access to the ledger.

use std::{sync::Barrier, thread};

use crate::{Setup, END, OWNER, START};
use confidential_qv::{
    group::Ristretto,
    ledger::{LedgerError, VotingId},
};

const THREADS: usize = 8;

static VOTERS: [&str; THREADS] = ["v0", "v1", "v2", "v3", "v4", "v5", "v6", "v7"];

#[test]
fn concurrent_ballots_are_not_lost() {
    let balances: Vec<_> = VOTERS.iter().map(|&voter| (voter, 100)).collect();
    let setup = Setup::<Ristretto>::new(&balances);
    let id = setup.create_voting(3);
    setup.open();

    let barrier = Barrier::new(THREADS);
    thread::scope(|scope| {
        for (i, voter) in VOTERS.iter().enumerate() {
            let (setup, barrier) = (&setup, &barrier);
            scope.spawn(move || {
                let ballot = setup.ballot(&[1, i as u64, 0]);
                barrier.wait();
                setup.ledger.submit_ballot(id, voter, &ballot).unwrap();
            });
        }
    });

    let expected_sum: u64 = (0..THREADS as u64).sum();
    assert_eq!(setup.tallies(id), [THREADS as u64, expected_sum, 0]);
    assert_eq!(setup.ledger.voting(id).unwrap().voter_count(), THREADS);
}

#[test]
fn concurrent_duplicate_ballots_are_accepted_once() {
    let setup = Setup::<Ristretto>::new(&[("alice", 100)]);
    let id = setup.create_voting(3);
    setup.open();

    let barrier = Barrier::new(THREADS);
    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let (setup, barrier) = (&setup, &barrier);
                scope.spawn(move || {
                    let ballot = setup.ballot(&[2, 0, 1]);
                    barrier.wait();
                    setup.ledger.submit_ballot(id, &"alice", &ballot)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    let accepted = results.iter().filter(|res| res.is_ok()).count();
    assert_eq!(accepted, 1);
    for res in &results {
        if let Err(err) = res {
            assert_eq!(*err, LedgerError::DuplicateVote(id));
        }
    }
    assert_eq!(setup.tallies(id), [2, 0, 1]);
}

#[test]
fn concurrent_creations_get_distinct_ids() {
    let setup = Setup::<Ristretto>::new(&[]);
    let mut ids: Vec<VotingId> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let setup = &setup;
                scope.spawn(move || {
                    setup
                        .ledger
                        .create_voting(&OWNER, START, END, 3)
                        .unwrap()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    ids.sort_unstable();
    let expected: Vec<_> = (0..THREADS as u64).map(VotingId::new).collect();
    assert_eq!(ids, expected);
    assert_eq!(setup.ledger.len(), THREADS);
}
