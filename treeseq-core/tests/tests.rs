use proptest::prelude::*;
use treeseq_core::{NodeId, Position, Time};

proptest! {
    #[test]
    fn test_position_order_matches_f64(a in 0.0..1e12f64, b in 0.0..1e12f64) {
        let pa = Position::new_valid(a);
        let pb = Position::new_valid(b);
        prop_assert_eq!(pa < pb, a < b);
        prop_assert_eq!(pa == pb, a == b);
        prop_assert_eq!(std::cmp::max(pa, pb), Position::new_valid(a.max(b)));
    }

    #[test]
    fn test_negative_positions_rejected(a in -1e12f64..-1e-9) {
        prop_assert!(Position::new(a).is_none());
        prop_assert!(Time::new(a).is_none());
    }

    #[test]
    fn test_node_id_round_trip(n in 0..i32::MAX) {
        let id = NodeId::from(n);
        prop_assert_eq!(id.raw(), n);
        prop_assert_eq!(usize::try_from(id).unwrap(), n as usize);
        prop_assert_eq!(NodeId::try_from(n as usize).unwrap(), id);
    }
}

#[test]
fn test_time_difference() {
    let parent = Time::from(3);
    let child = Time::from(1.5);
    assert_eq!(parent - child, 1.5);
    assert!(parent > child);
}
