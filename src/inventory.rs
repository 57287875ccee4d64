//! Selectors behind the reel stock table.
//!
//! All functions here are pure: they take the snapshot fetched from the
//! backend plus a [`FilterState`] and derive what the page shows. Filters and
//! option lists are always computed against the full snapshot, never against
//! an already filtered subset.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::format::round2;
use crate::models::Reel;

/// Search and filter values of the stock table
///
/// An empty value matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterState {
    /// Case-insensitive substring of the barcode identifier
    pub barcode: String,
    /// Case-insensitive substring of the supplier name
    pub supplier: String,
    /// Case-insensitive exact status
    pub status: String,
    pub gsm: String,
    pub bf: String,
    pub deckle: String,
    pub unit: String,
    pub paper_type: String,
    /// Prefix of the creation timestamp, usually `YYYY-MM-DD`
    pub created: String,
}

impl FilterState {
    /// Does `reel` satisfy every active predicate?
    pub fn matches(&self, reel: &Reel) -> bool {
        contains_ci(reel.barcode_id.as_deref(), &self.barcode)
            && contains_ci(reel.supplier_name.as_deref(), &self.supplier)
            && eq_ci(reel.status.as_deref(), &self.status)
            && eq_exact(reel.gsm.as_deref(), &self.gsm)
            && eq_exact(reel.bf.as_deref(), &self.bf)
            && eq_exact(reel.deckle.as_deref(), &self.deckle)
            && eq_exact(reel.unit.as_deref(), &self.unit)
            && eq_exact(reel.paper_type.as_deref(), &self.paper_type)
            && starts_with(reel.created_at.as_deref(), &self.created)
    }
}

fn contains_ci(field: Option<&str>, needle: &str) -> bool {
    needle.is_empty()
        || field.is_some_and(|f| f.to_lowercase().contains(&needle.to_lowercase()))
}

fn eq_ci(field: Option<&str>, wanted: &str) -> bool {
    wanted.is_empty() || field.is_some_and(|f| f.eq_ignore_ascii_case(wanted))
}

fn eq_exact(field: Option<&str>, wanted: &str) -> bool {
    wanted.is_empty() || field == Some(wanted)
}

fn starts_with(field: Option<&str>, prefix: &str) -> bool {
    prefix.is_empty() || field.is_some_and(|f| f.starts_with(prefix))
}

/// Fixed initial ordering applied once after fetch
///
/// In-use reels first, then everything else; ascending deckle within each
/// group. The sort is stable, so backend order breaks ties.
pub fn sort_for_display(reels: &mut [Reel]) {
    reels.sort_by(|a, b| {
        b.is_in_use()
            .cmp(&a.is_in_use())
            .then_with(|| a.deckle_value().total_cmp(&b.deckle_value()))
    });
}

/// Filter the full snapshot; the result keeps snapshot order
pub fn apply(reels: &[Reel], filters: &FilterState) -> Vec<Reel> {
    reels.iter().filter(|r| filters.matches(r)).cloned().collect()
}

/// Count and total current weight of a set of reels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub total_current_weight: f64,
}

impl Summary {
    pub fn of(reels: &[Reel]) -> Self {
        let total: f64 = reels.iter().filter_map(|r| r.current_weight).sum();
        Summary {
            count: reels.len(),
            total_current_weight: round2(total),
        }
    }

    pub fn total_display(&self) -> String {
        format!("{:.2}", self.total_current_weight)
    }
}

/// Option lists for the filter drop-downs, taken from the unfiltered snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub status: Vec<String>,
    pub gsm: Vec<String>,
    pub bf: Vec<String>,
    pub deckle: Vec<String>,
    pub unit: Vec<String>,
    pub paper_type: Vec<String>,
    pub created: Vec<String>,
}

impl FilterOptions {
    pub fn from_snapshot(reels: &[Reel]) -> Self {
        FilterOptions {
            status: distinct(reels.iter().map(|r| r.status.as_deref())),
            gsm: distinct(reels.iter().map(|r| r.gsm.as_deref())),
            bf: distinct(reels.iter().map(|r| r.bf.as_deref())),
            deckle: distinct_numeric(reels.iter().map(|r| r.deckle.as_deref())),
            unit: distinct(reels.iter().map(|r| r.unit.as_deref())),
            paper_type: distinct(reels.iter().map(|r| r.paper_type.as_deref())),
            created: distinct(reels.iter().map(|r| r.created_at.as_deref().map(date_part))),
        }
    }
}

/// The calendar date part of a creation timestamp
fn date_part(ts: &str) -> &str {
    ts.split_once('T').map(|(d, _)| d).unwrap_or(ts)
}

fn distinct<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    values
        .flatten()
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct raw deckles ordered by numeric value
///
/// Values are kept verbatim so each option selects exactly the reels that
/// carry it (`30` and `30.0` stay separate). Unparsable values go last, in
/// lexicographic order.
fn distinct_numeric<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    let mut options = distinct(values);
    let key = |v: &str| v.trim().parse::<f64>().ok().filter(|n| n.is_finite());
    options.sort_by(|a, b| match (key(a), key(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.cmp(b),
    });
    options
}


#[cfg(test)]
mod properties {
    use proptest::prelude::*;

    use super::*;

    const STATUSES: &[&str] = &["IN_USE", "NOT_IN_USE", "PARTIALLY_USED_AVAILABLE", "USE_COMPLETED"];
    const GSMS: &[&str] = &["100", "120", "150"];
    const BFS: &[&str] = &["16", "18", "22"];
    const DECKLES: &[&str] = &["10", "25", "30", "30.0", " 44.5", "wide"];
    const UNITS: &[&str] = &["kg", "ton"];
    const PAPER_TYPES: &[&str] = &["Kraft", "Duplex", "Golden Kraft"];

    fn pick(values: &'static [&'static str]) -> impl Strategy<Value = String> {
        prop::sample::select(values).prop_map(str::to_string)
    }

    fn reel_strategy() -> impl Strategy<Value = Reel> {
        (
            ("[A-Z]{1,2}[0-9]{1,3}", "(Alpha|Beta|Gamma) Mills", pick(STATUSES)),
            (pick(GSMS), pick(BFS), pick(DECKLES), pick(UNITS), pick(PAPER_TYPES)),
            0u32..100_000,
            "2024-0[1-3]-1[0-9]",
        )
            .prop_map(
                |((barcode, supplier, status), (gsm, bf, deckle, unit, paper_type), centi, day)| Reel {
                    barcode_id: Some(barcode),
                    supplier_name: Some(supplier),
                    status: Some(status),
                    gsm: Some(gsm),
                    bf: Some(bf),
                    deckle: Some(deckle),
                    unit: Some(unit),
                    paper_type: Some(paper_type),
                    current_weight: Some(centi as f64 / 100.0),
                    created_at: Some(format!("{}T08:00:00Z", day)),
                    ..Reel::default()
                },
            )
    }

    fn optional(values: &'static [&'static str]) -> impl Strategy<Value = String> {
        prop_oneof![Just(String::new()), pick(values)]
    }

    fn filter_strategy() -> impl Strategy<Value = FilterState> {
        (
            (
                prop_oneof![Just(String::new()), "[a-z0-9]{1,2}"],
                prop_oneof![Just(String::new()), Just("alpha".to_string()), Just("MILLS".to_string())],
                optional(STATUSES),
            ),
            (optional(GSMS), optional(BFS), optional(DECKLES), optional(UNITS), optional(PAPER_TYPES)),
            prop_oneof![Just(String::new()), Just("2024-02".to_string())],
        )
            .prop_map(
                |((barcode, supplier, status), (gsm, bf, deckle, unit, paper_type), created)| FilterState {
                    barcode,
                    supplier,
                    status,
                    gsm,
                    bf,
                    deckle,
                    unit,
                    paper_type,
                    created,
                },
            )
    }

    proptest! {
        #[test]
        fn filtered_is_intersection_of_predicates(
            reels in prop::collection::vec(reel_strategy(), 0..30),
            filters in filter_strategy(),
        ) {
            let filtered = apply(&reels, &filters);
            for r in &filtered {
                prop_assert!(reels.contains(r));
            }

            let single_field = |f: FilterState| reels.iter().map(move |r| f.matches(r)).collect::<Vec<_>>();
            let fields = [
                FilterState { barcode: filters.barcode.clone(), ..FilterState::default() },
                FilterState { supplier: filters.supplier.clone(), ..FilterState::default() },
                FilterState { status: filters.status.clone(), ..FilterState::default() },
                FilterState { gsm: filters.gsm.clone(), ..FilterState::default() },
                FilterState { bf: filters.bf.clone(), ..FilterState::default() },
                FilterState { deckle: filters.deckle.clone(), ..FilterState::default() },
                FilterState { unit: filters.unit.clone(), ..FilterState::default() },
                FilterState { paper_type: filters.paper_type.clone(), ..FilterState::default() },
                FilterState { created: filters.created.clone(), ..FilterState::default() },
            ];
            let per_field: Vec<Vec<bool>> = fields.into_iter().map(single_field).collect();
            let expected: Vec<Reel> = reels
                .iter()
                .enumerate()
                .filter(|(i, _)| per_field.iter().all(|m| m[*i]))
                .map(|(_, r)| r.clone())
                .collect();
            prop_assert_eq!(filtered, expected);
        }

        #[test]
        fn filtering_is_idempotent(
            reels in prop::collection::vec(reel_strategy(), 0..30),
            filters in filter_strategy(),
        ) {
            let once = apply(&reels, &filters);
            let twice = apply(&once, &filters);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn in_use_precede_others_and_deckle_non_decreasing(
            mut reels in prop::collection::vec(reel_strategy(), 0..30),
        ) {
            sort_for_display(&mut reels);
            let split = reels.iter().take_while(|r| r.is_in_use()).count();
            prop_assert!(reels[split..].iter().all(|r| !r.is_in_use()));
            for part in [&reels[..split], &reels[split..]] {
                for pair in part.windows(2) {
                    prop_assert!(pair[0].deckle_value() <= pair[1].deckle_value());
                }
            }
        }

        #[test]
        fn summary_matches_filtered_weights(
            reels in prop::collection::vec(reel_strategy(), 0..30),
            filters in filter_strategy(),
        ) {
            let filtered = apply(&reels, &filters);
            let summary = Summary::of(&filtered);
            let expected: f64 = filtered.iter().map(|r| r.current_weight.unwrap_or(0.0)).sum();
            prop_assert_eq!(summary.count, filtered.len());
            prop_assert_eq!(summary.total_display(), format!("{:.2}", expected));
        }

        #[test]
        fn every_reel_is_selectable_by_deckle(
            reels in prop::collection::vec(reel_strategy(), 1..30),
        ) {
            let options = FilterOptions::from_snapshot(&reels);
            for (i, reel) in reels.iter().enumerate() {
                let reachable = options.deckle.iter().any(|d| {
                    let filters = FilterState { deckle: d.clone(), ..FilterState::default() };
                    filters.matches(reel)
                });
                prop_assert!(reachable, "reel {} not reachable", i);
            }
        }

        #[test]
        fn options_ignore_filters(
            reels in prop::collection::vec(reel_strategy(), 1..30),
            filters in filter_strategy(),
        ) {
            let before = FilterOptions::from_snapshot(&reels);
            let _ = apply(&reels, &filters);
            prop_assert_eq!(before, FilterOptions::from_snapshot(&reels));
        }
    }
}
