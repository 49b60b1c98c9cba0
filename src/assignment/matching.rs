//! Augmenting-path bipartite matching over allowed giver→receiver edges.
//!
//! Givers sit on the left, receivers on the right, and an edge exists when
//! the giver may give to the receiver. A perfect matching is exactly a valid
//! assignment set, so this search fails only when none exists. Giver order
//! and each giver's edge order are shuffled to keep outputs varied.

use rand::seq::SliceRandom;
use rand::Rng;

/// Finds a perfect matching, returned as `(giver, receiver)` index pairs in
/// processing order. Returns `None` when no perfect matching exists.
pub(crate) fn perfect_matching<R: Rng + ?Sized>(
    allowed: &[Vec<bool>],
    rng: &mut R,
) -> Option<Vec<(usize, usize)>> {
    let n = allowed.len();

    let mut edges: Vec<Vec<usize>> = allowed
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .filter_map(|(receiver, &ok)| ok.then_some(receiver))
                .collect()
        })
        .collect();
    for row in &mut edges {
        row.shuffle(rng);
    }

    let mut givers: Vec<usize> = (0..n).collect();
    givers.shuffle(rng);

    // owner[receiver] = giver currently matched to that receiver
    let mut owner: Vec<Option<usize>> = vec![None; n];
    for &giver in &givers {
        let mut visited = vec![false; n];
        if !augment(giver, &edges, &mut owner, &mut visited) {
            return None;
        }
    }

    let mut receiver_of = vec![0; n];
    for (receiver, giver) in owner.iter().enumerate() {
        receiver_of[(*giver)?] = receiver;
    }

    Some(givers.iter().map(|&g| (g, receiver_of[g])).collect())
}

/// Tries to match `giver`, re-routing already matched givers along an
/// alternating path when its preferred receivers are taken.
fn augment(
    giver: usize,
    edges: &[Vec<usize>],
    owner: &mut [Option<usize>],
    visited: &mut [bool],
) -> bool {
    for &receiver in &edges[giver] {
        if visited[receiver] {
            continue;
        }
        visited[receiver] = true;

        let free = match owner[receiver] {
            None => true,
            Some(current) => augment(current, edges, owner, visited),
        };
        if free {
            owner[receiver] = Some(giver);
            return true;
        }
    }
    false
}
