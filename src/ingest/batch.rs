//! Collect-then-dedupe helpers for bulk writes

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::catalog::FilmCredit;
use crate::model::release_sort_key;

/// Keep the first item for every key, preserving input order
pub fn unique_by<T, K, F>(items: impl IntoIterator<Item = T>, mut key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(key(item)))
        .collect()
}

/// The part of a filmography worth ingesting
///
/// Drops credits billed below `max_billing_order`, keeps the most prominent
/// credit per film, then caps the result to the `max_films` most recent
/// productions (undated films last, ties on the larger film id).
pub fn relevant_filmography(
    credits: Vec<FilmCredit>,
    max_billing_order: i64,
    max_films: usize,
) -> Vec<FilmCredit> {
    let mut best: HashMap<i64, FilmCredit> = HashMap::new();
    for credit in credits
        .into_iter()
        .filter(|c| c.billing_order <= max_billing_order)
    {
        match best.get(&credit.film_id.0) {
            Some(kept) if kept.billing_order <= credit.billing_order => {}
            _ => {
                best.insert(credit.film_id.0, credit);
            }
        }
    }

    let mut films: Vec<(Option<String>, FilmCredit)> = best
        .into_values()
        .map(|c| (release_sort_key(&c.release_date), c))
        .collect();
    films.sort_by(|(a_key, a), (b_key, b)| {
        a_key
            .is_none()
            .cmp(&b_key.is_none())
            .then_with(|| b_key.cmp(a_key))
            .then_with(|| Reverse(a.film_id).cmp(&Reverse(b.film_id)))
    });
    films.truncate(max_films);
    films.into_iter().map(|(_, c)| c).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FilmId;

    fn credit(film: i64, release_date: &str, billing_order: i64) -> FilmCredit {
        FilmCredit {
            film_id: FilmId(film),
            title: format!("Film {}", film),
            poster: None,
            release_date: release_date.to_string(),
            rating: 6.0,
            character: String::new(),
            billing_order,
        }
    }

    fn ids(credits: &[FilmCredit]) -> Vec<i64> {
        credits.iter().map(|c| c.film_id.0).collect()
    }

    #[test]
    fn test_unique_by_keeps_first() {
        let items = vec![(1, "a"), (2, "b"), (1, "c"), (3, "d"), (2, "e")];
        let kept = unique_by(items, |(k, _)| *k);
        assert_eq!(kept, vec![(1, "a"), (2, "b"), (3, "d")]);
    }

    #[test]
    fn test_filmography_drops_minor_roles() {
        let kept = relevant_filmography(
            vec![credit(1, "2020-01-01", 0), credit(2, "2021-01-01", 16), credit(3, "2019", 15)],
            15,
            10,
        );
        assert_eq!(ids(&kept), vec![1, 3]);
    }

    #[test]
    fn test_filmography_orders_most_recent_first_undated_last() {
        let kept = relevant_filmography(
            vec![
                credit(1, "", 1),
                credit(2, "2001-05-04", 1),
                credit(3, "2022", 1),
                credit(4, "not a date", 1),
                credit(5, "2022-01-01", 1),
            ],
            15,
            10,
        );
        // "2022" and "2022-01-01" share a key; larger id wins the tie
        assert_eq!(ids(&kept), vec![5, 3, 2, 4, 1]);
    }

    #[test]
    fn test_filmography_caps_to_most_recent() {
        let credits: Vec<FilmCredit> = (1..=10)
            .map(|i| credit(i, &format!("{}-01-01", 2000 + i), 0))
            .collect();
        let kept = relevant_filmography(credits, 15, 3);
        assert_eq!(ids(&kept), vec![10, 9, 8]);
    }

    #[test]
    fn test_filmography_keeps_most_prominent_credit_per_film() {
        let mut voice = credit(7, "2010", 12);
        voice.character = "Narrator".to_string();
        let mut lead = credit(7, "2010", 2);
        lead.character = "Lead".to_string();

        let kept = relevant_filmography(vec![voice, lead], 15, 10);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].character, "Lead");
    }
}
