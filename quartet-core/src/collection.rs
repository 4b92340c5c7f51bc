use core::mem;

use crate::node::SearchNode;

/// Stable sort of a freshly expanded generation by total delay. Equal totals
/// keep their expansion order.
pub fn sort_generation(nodes: &mut [SearchNode]) {
    nodes.sort_by_key(|node| node.total_delay);
}

/// Merges two runs sorted by total delay. On equal totals, nodes from `left`
/// come first.
pub fn merge_sorted(left: Vec<SearchNode>, right: Vec<SearchNode>) -> Vec<SearchNode> {
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_left = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => l.total_delay <= r.total_delay,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_left { left.next() } else { right.next() };
        merged.extend(next);
    }
    merged
}

/// Drops every node that repeats the search state and total delay of the
/// node directly before it, keeping the first. Equal states that are not
/// adjacent both survive.
pub fn remove_duplicates(nodes: &mut Vec<SearchNode>) {
    nodes.dedup_by(|later, earlier| earlier.same_search_state(later));
}

/// Sorts `pending` into `live`, leaving `pending` empty. `live` is normally
/// empty here because expansion consumes the previous generation.
pub fn merge_generation(live: &mut Vec<SearchNode>, pending: &mut Vec<SearchNode>, dedup: bool) {
    sort_generation(pending);
    if live.is_empty() {
        mem::swap(live, pending);
    } else {
        let incoming = mem::take(pending);
        *live = merge_sorted(mem::take(live), incoming);
    }
    if dedup {
        remove_duplicates(live);
    }
}

pub fn is_sorted_by_total(nodes: &[SearchNode]) -> bool {
    nodes
        .windows(2)
        .all(|pair| pair[0].total_delay <= pair[1].total_delay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{FaceRng, NextFace};

    fn node(rng: u16, next_face: u8, total_delay: u32, marker: u8) -> SearchNode {
        let mut node = SearchNode::from_seed(0x0101).unwrap();
        node.rng = FaceRng::from_state(rng).unwrap();
        node.next_face = NextFace::from_raw(next_face);
        node.total_delay = total_delay;
        node.delays[1] = marker;
        node
    }

    #[test]
    fn merge_keeps_ascending_totals() {
        let mut live = Vec::new();
        let mut pending = vec![
            node(5, 0x01, 30, 0),
            node(3, 0x01, 10, 0),
            node(9, 0x10, 20, 0),
            node(1, 0x22, 10, 0),
        ];
        merge_generation(&mut live, &mut pending, true);

        assert!(pending.is_empty());
        assert!(is_sorted_by_total(&live));
        let totals: Vec<u32> = live.iter().map(|n| n.total_delay).collect();
        assert_eq!(totals, vec![10, 10, 20, 30]);
    }

    #[test]
    fn equal_totals_keep_expansion_order() {
        let mut live = Vec::new();
        let mut pending = vec![node(9, 0x01, 10, 1), node(3, 0x01, 10, 2), node(1, 0x01, 4, 3)];
        merge_generation(&mut live, &mut pending, true);

        let markers: Vec<u8> = live.iter().map(|n| n.delays[1]).collect();
        assert_eq!(markers, vec![3, 1, 2]);
    }

    #[test]
    fn dedup_only_drops_adjacent_repeats() {
        let mut live = Vec::new();
        let mut pending = vec![
            node(7, 0x01, 12, 1),
            node(8, 0x01, 12, 2),
            node(7, 0x01, 12, 3),
            node(7, 0x01, 13, 4),
            node(8, 0x01, 12, 5),
            node(7, 0x01, 12, 6),
        ];
        merge_generation(&mut live, &mut pending, true);

        let markers: Vec<u8> = live.iter().map(|n| n.delays[1]).collect();
        assert_eq!(markers, vec![1, 2, 3, 5, 6, 4]);
    }

    #[test]
    fn dedup_keeps_the_first_of_a_run() {
        let mut live = Vec::new();
        let mut pending = vec![
            node(7, 0x01, 12, 1),
            node(7, 0x01, 12, 2),
            node(7, 0x01, 12, 3),
            node(8, 0x01, 12, 4),
        ];
        merge_generation(&mut live, &mut pending, true);

        let markers: Vec<u8> = live.iter().map(|n| n.delays[1]).collect();
        assert_eq!(markers, vec![1, 4]);
    }

    #[test]
    fn without_dedup_duplicates_survive() {
        let mut live = Vec::new();
        let mut pending = vec![node(7, 0x01, 12, 1), node(7, 0x01, 12, 2)];
        merge_generation(&mut live, &mut pending, false);
        assert_eq!(live.len(), 2);
    }

    #[test]
    fn merging_into_a_non_empty_set_is_stable() {
        let mut live = vec![node(2, 0x00, 5, 1), node(4, 0x00, 9, 1)];
        let mut pending = vec![node(4, 0x00, 9, 2), node(3, 0x00, 1, 2)];
        merge_generation(&mut live, &mut pending, false);

        let order: Vec<(u32, u8)> = live.iter().map(|n| (n.total_delay, n.delays[1])).collect();
        assert_eq!(order, vec![(1, 2), (5, 1), (9, 1), (9, 2)]);
    }
}
