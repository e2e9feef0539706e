//! Pure scoring arithmetic (the durable half of rating storage lives in
//! [`crate::store`]). Kept free of I/O so the rating formula and
//! standings ordering are unit-testable without a store.

use crate::protocol::{StandingEntry, UserId};

/// `newRating := max(1200, prevRating) + score * 10`.
pub fn new_rating(prev_rating: i64, score: i64) -> i64 {
    std::cmp::max(1200, prev_rating) + score * 10
}

/// Descending by score, ascending `userId` on ties.
pub fn sort_standings(mut entries: Vec<StandingEntry>) -> Vec<StandingEntry> {
    entries.sort_by(|a, b| b.score.cmp(&a.score).then(a.user_id.cmp(&b.user_id)));
    entries
}

pub fn synthetic_tx_hash(room_id: &str, question_index: u8, user_id: UserId, unix_millis: i64) -> String {
    format!("claim_{room_id}_{question_index}_{user_id}_{unix_millis}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_formula_matches_spec_scenario() {
        assert_eq!(new_rating(1200, 7), 1270);
    }

    #[test]
    fn rating_floor_applies_even_to_low_prior_rating() {
        assert_eq!(new_rating(900, 0), 1200);
    }

    #[test]
    fn standings_sort_by_score_desc_then_user_id_asc() {
        let entries = vec![
            StandingEntry {
                user_id: 2,
                user_name: "b".into(),
                score: 3,
                new_rating: 1230,
            },
            StandingEntry {
                user_id: 1,
                user_name: "a".into(),
                score: 3,
                new_rating: 1230,
            },
            StandingEntry {
                user_id: 3,
                user_name: "c".into(),
                score: 5,
                new_rating: 1250,
            },
        ];
        let sorted = sort_standings(entries);
        assert_eq!(
            sorted.iter().map(|e| e.user_id).collect::<Vec<_>>(),
            vec![3, 1, 2]
        );
    }

    #[test]
    fn tx_hash_embeds_all_claim_coordinates() {
        let hash = synthetic_tx_hash("room-1", 3, 42, 1_700_000_000_000);
        assert_eq!(hash, "claim_room-1_3_42_1700000000000");
    }
}
