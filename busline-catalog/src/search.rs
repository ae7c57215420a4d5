use busline_core::{Actor, Capability, CoreResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::trip::{Trip, TripSummary};

/// Listing order for trips. Rating sorts best first, every other key ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortBy {
    Departure,
    DepartureDate,
    Arrival,
    ArrivalDate,
    AvailableSeats,
    Rating,
}

/// Order trips by `sort_by`, or keep the input order when it is `None`.
///
/// The sort is stable, so ties keep their input order and sorting an already
/// sorted list changes nothing. Unrated trips go last when sorting by rating.
pub fn sort_trips<'a, I>(trips: I, sort_by: Option<SortBy>) -> Vec<&'a Trip>
where
    I: IntoIterator<Item = &'a Trip>,
{
    let mut trips: Vec<&Trip> = trips.into_iter().collect();
    if let Some(key) = sort_by {
        trips.sort_by(|a, b| compare(a, b, key));
    }
    trips
}

pub fn list_trips<'a, I>(
    actor: &Actor,
    trips: I,
    sort_by: Option<SortBy>,
) -> CoreResult<Vec<TripSummary>>
where
    I: IntoIterator<Item = &'a Trip>,
{
    actor.require(Capability::ListTrips)?;

    Ok(sort_trips(trips, sort_by)
        .into_iter()
        .map(Trip::summary)
        .collect())
}

fn compare(a: &Trip, b: &Trip, key: SortBy) -> Ordering {
    match key {
        SortBy::Departure => a.departure().cmp(b.departure()),
        SortBy::DepartureDate => a.departure_date().cmp(&b.departure_date()),
        SortBy::Arrival => a.arrival().cmp(b.arrival()),
        SortBy::ArrivalDate => a.arrival_date().cmp(&b.arrival_date()),
        SortBy::AvailableSeats => a.available_seats().cmp(&b.available_seats()),
        SortBy::Rating => match (a.average_rating().ok(), b.average_rating().ok()) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trip::NewTrip;
    use busline_core::{RatingScale, Role};
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn trip(departure: &str, arrival: &str, day: u32, seats: u32) -> Trip {
        Trip::new(NewTrip {
            price_cents: 10100,
            departure: departure.to_string(),
            departure_date: NaiveDate::from_ymd_opt(2026, 11, day).unwrap(),
            arrival: arrival.to_string(),
            arrival_date: NaiveDate::from_ymd_opt(2026, 11, day + 1).unwrap(),
            total_seats: seats,
        })
        .unwrap()
    }

    fn rated(mut trip: Trip, scores: &[f64]) -> Trip {
        let rider = Actor::new("Dwayne", "dwayne@example.com", Role::Authorized);
        for score in scores {
            trip.add_rating(&rider, *score, &RatingScale::default()).unwrap();
        }
        trip
    }

    fn names(trips: &[&Trip]) -> Vec<String> {
        trips.iter().map(|t| t.departure().to_string()).collect()
    }

    #[test]
    fn test_no_key_keeps_input_order() {
        let trips = vec![trip("Odesa", "Uman", 19, 32), trip("Kyiv", "Poltava", 7, 15)];
        let sorted = sort_trips(&trips, None);
        assert_eq!(names(&sorted), vec!["Odesa", "Kyiv"]);
    }

    #[test]
    fn test_ascending_keys() {
        let trips = vec![
            trip("Odesa", "Uman", 19, 32),
            trip("Kyiv", "Poltava", 7, 15),
            trip("Lviv", "Ternopil", 21, 20),
        ];

        let by_name = sort_trips(&trips, Some(SortBy::Departure));
        assert_eq!(names(&by_name), vec!["Kyiv", "Lviv", "Odesa"]);

        let by_date = sort_trips(&trips, Some(SortBy::DepartureDate));
        assert_eq!(names(&by_date), vec!["Kyiv", "Odesa", "Lviv"]);

        let by_arrival = sort_trips(&trips, Some(SortBy::Arrival));
        assert_eq!(names(&by_arrival), vec!["Kyiv", "Lviv", "Odesa"]);

        let by_arrival_date = sort_trips(&trips, Some(SortBy::ArrivalDate));
        assert_eq!(names(&by_arrival_date), vec!["Kyiv", "Odesa", "Lviv"]);

        let by_seats = sort_trips(&trips, Some(SortBy::AvailableSeats));
        assert_eq!(names(&by_seats), vec!["Kyiv", "Lviv", "Odesa"]);
    }

    #[test]
    fn test_rating_descending_unrated_last() {
        let trips = vec![
            rated(trip("Odesa", "Uman", 19, 32), &[4.3, 4.9]),
            trip("Dnipro", "Kharkiv", 2, 40),
            rated(trip("Kyiv", "Poltava", 7, 15), &[4.9, 4.1]),
            rated(trip("Lviv", "Ternopil", 21, 20), &[4.5, 2.8]),
        ];

        let sorted = sort_trips(&trips, Some(SortBy::Rating));
        assert_eq!(names(&sorted), vec!["Odesa", "Kyiv", "Lviv", "Dnipro"]);
    }

    #[test]
    fn test_list_trips_open_to_every_actor() {
        let trips = vec![trip("Kyiv", "Poltava", 7, 15)];
        let guest = Actor::new("John", "john@example.com", Role::Guest);

        let rows = list_trips(&guest, &trips, Some(SortBy::ArrivalDate)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].available_seats, 15);

        let mut stripped = guest.clone();
        stripped.revoke(Capability::ListTrips);
        assert_eq!(list_trips(&stripped, &trips, None).unwrap().len(), 1);
    }

    fn sort_key() -> impl Strategy<Value = SortBy> {
        prop_oneof![
            Just(SortBy::Departure),
            Just(SortBy::DepartureDate),
            Just(SortBy::Arrival),
            Just(SortBy::ArrivalDate),
            Just(SortBy::AvailableSeats),
            Just(SortBy::Rating),
        ]
    }

    fn arbitrary_trip() -> impl Strategy<Value = Trip> {
        (
            "[A-Z][a-z]{1,6}",
            "[A-Z][a-z]{1,6}",
            1u32..28,
            1u32..50,
            proptest::collection::vec(0.0f64..=5.0, 0..4),
        )
            .prop_map(|(departure, arrival, day, seats, scores)| {
                rated(trip(&departure, &arrival, day, seats), &scores)
            })
    }

    proptest! {
        #[test]
        fn prop_sort_is_ordered_and_idempotent(
            trips in proptest::collection::vec(arbitrary_trip(), 0..12),
            key in sort_key(),
        ) {
            let once = sort_trips(&trips, Some(key));
            let twice = sort_trips(once.iter().copied(), Some(key));

            let once_ids: Vec<_> = once.iter().map(|t| t.id()).collect();
            let twice_ids: Vec<_> = twice.iter().map(|t| t.id()).collect();
            prop_assert_eq!(once_ids, twice_ids);

            for pair in once.windows(2) {
                prop_assert_ne!(compare(pair[0], pair[1], key), Ordering::Greater);
            }

            if key == SortBy::Rating {
                let ratings: Vec<f64> = once
                    .iter()
                    .filter_map(|t| t.average_rating().ok())
                    .collect();
                for pair in ratings.windows(2) {
                    prop_assert!(pair[0] >= pair[1]);
                }
            }
        }
    }
}
