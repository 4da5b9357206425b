//! Embedded flight, hotel, and places catalogs.
//!
//! The records ship inside the binary; loading only parses and derives the
//! per-record scores the search paths rank by.

use serde::Deserialize;
use thiserror::Error;

use wayfarer_core::models::{
    FlightOption, FlightSort, HotelOption, HotelQuery, HotelSort, Place, SearchResult,
};
use wayfarer_core::planner::TravelCatalog;

const FLIGHTS_JSON: &str = include_str!("../data/flights.json");
const HOTELS_JSON: &str = include_str!("../data/hotels.json");
const PLACES_JSON: &str = include_str!("../data/places.json");

/// Search results are capped to keep replies scannable.
const MAX_MATCHES: usize = 3;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to parse embedded {name} dataset: {source}")]
    Parse {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug)]
pub struct TravelDatasets {
    flights: Vec<FlightOption>,
    hotels: Vec<HotelOption>,
    places: Vec<Place>,
}

impl TravelDatasets {
    pub fn load() -> Result<Self, DatasetError> {
        let mut flights: Vec<FlightOption> = parse("flights", FLIGHTS_JSON)?;
        for flight in &mut flights {
            let minutes = (flight.arrival_time - flight.departure_time).num_minutes();
            flight.duration_hours = round2(minutes as f64 / 60.0);
        }

        let mut hotels: Vec<HotelOption> = parse("hotels", HOTELS_JSON)?;
        for hotel in &mut hotels {
            hotel.value_score = round2(f64::from(hotel.stars) / (hotel.price_per_night as f64 / 1000.0));
        }

        let places = parse("places", PLACES_JSON)?;

        Ok(Self {
            flights,
            hotels,
            places,
        })
    }

    pub fn flight_count(&self) -> usize {
        self.flights.len()
    }

    pub fn hotel_count(&self) -> usize {
        self.hotels.len()
    }

    pub fn place_count(&self) -> usize {
        self.places.len()
    }
}

fn parse<T: for<'de> Deserialize<'de>>(
    name: &'static str,
    raw: &str,
) -> Result<Vec<T>, DatasetError> {
    serde_json::from_str(raw).map_err(|source| DatasetError::Parse { name, source })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl TravelCatalog for TravelDatasets {
    fn search_flights(
        &self,
        source: &str,
        destination: &str,
        sort: FlightSort,
    ) -> SearchResult<FlightOption> {
        let mut matches: Vec<FlightOption> = self
            .flights
            .iter()
            .filter(|flight| {
                flight.from.eq_ignore_ascii_case(source.trim())
                    && flight.to.eq_ignore_ascii_case(destination.trim())
            })
            .cloned()
            .collect();

        if matches.is_empty() {
            return SearchResult::empty(format!("No flights from {source} to {destination}."));
        }

        match sort {
            FlightSort::Cheapest => matches.sort_by_key(|flight| flight.price),
            FlightSort::Fastest => matches.sort_by(|a, b| {
                a.duration_hours
                    .partial_cmp(&b.duration_hours)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
        }
        matches.truncate(MAX_MATCHES);

        let criterion = match sort {
            FlightSort::Cheapest => "lowest price",
            FlightSort::Fastest => "shortest duration",
        };
        SearchResult {
            reasoning: format!(
                "{} flight(s) from {source} to {destination}, ranked by {criterion}.",
                matches.len()
            ),
            matches,
        }
    }

    fn search_hotels(&self, query: &HotelQuery) -> SearchResult<HotelOption> {
        let mut matches: Vec<HotelOption> = self
            .hotels
            .iter()
            .filter(|hotel| hotel.city.eq_ignore_ascii_case(query.city.trim()))
            .filter(|hotel| hotel.stars >= query.min_stars)
            .filter(|hotel| {
                query
                    .max_price_per_night
                    .map(|cap| hotel.price_per_night <= cap)
                    .unwrap_or(true)
            })
            .filter(|hotel| {
                query.required_amenities.iter().all(|wanted| {
                    hotel
                        .amenities
                        .iter()
                        .any(|have| have.eq_ignore_ascii_case(wanted))
                })
            })
            .cloned()
            .collect();

        if matches.is_empty() {
            return SearchResult::empty(format!(
                "No hotel in {} matched {} star(s) and the price constraints.",
                query.city, query.min_stars
            ));
        }

        match query.sort {
            HotelSort::Price => matches.sort_by_key(|hotel| hotel.price_per_night),
            HotelSort::Stars => {
                matches.sort_by_key(|hotel| (std::cmp::Reverse(hotel.stars), hotel.price_per_night))
            }
            HotelSort::Value => matches.sort_by(|a, b| {
                b.value_score
                    .partial_cmp(&a.value_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
        }
        matches.truncate(MAX_MATCHES);

        let criterion = match query.sort {
            HotelSort::Price => "lowest price",
            HotelSort::Stars => "highest rating",
            HotelSort::Value => "best value for money",
        };
        SearchResult {
            reasoning: format!(
                "{} hotel(s) in {}, ranked by {criterion}.",
                matches.len(),
                query.city
            ),
            matches,
        }
    }

    fn search_places(
        &self,
        city: &str,
        min_rating: f32,
        max_results: usize,
    ) -> SearchResult<Place> {
        let mut matches: Vec<Place> = self
            .places
            .iter()
            .filter(|place| place.city.eq_ignore_ascii_case(city.trim()))
            .filter(|place| place.rating >= min_rating)
            .cloned()
            .collect();

        matches.sort_by(|a, b| {
            b.rating
                .partial_cmp(&a.rating)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(max_results);

        SearchResult {
            reasoning: format!("{} top-rated place(s) in {city}.", matches.len()),
            matches,
        }
    }
}
