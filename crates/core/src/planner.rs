use chrono::Duration;

use crate::gazetteer::city_list;
use crate::models::{
    format_inr, BudgetAnalysis, BudgetBreakdown, BudgetLine, BudgetTier, ClosestOption,
    DayForecast, FlightOption, FlightSort, HotelOption, HotelQuery, HotelSort, ItineraryDay, Place,
    PlanFailure, PlanFailureKind, PlannedTrip, ResolvedTrip, SearchResult, TripPlan, TripSummary,
    TripTier, WeatherReport, DAILY_EXPENSE_BUDGET, DAILY_EXPENSE_FLOOR, DAILY_EXPENSE_STANDARD,
    MIN_HOTEL_NIGHTLY,
};

/// Read-only lookups over the flight, hotel, and places datasets.
///
/// Implementations must match cities case-insensitively and return matches in
/// the requested preference order, recommended option first.
pub trait TravelCatalog {
    fn search_flights(
        &self,
        source: &str,
        destination: &str,
        sort: FlightSort,
    ) -> SearchResult<FlightOption>;

    fn search_hotels(&self, query: &HotelQuery) -> SearchResult<HotelOption>;

    fn search_places(&self, city: &str, min_rating: f32, max_results: usize)
        -> SearchResult<Place>;
}

/// Allocate the trip budget across flight, hotel, and daily expenses.
///
/// Deterministic pipeline; every infeasibility short-circuits into a
/// structured failure rather than a partial plan. The weather report is a
/// best-effort enrichment fetched by the caller beforehand; `None` degrades
/// the itinerary but never fails the plan.
pub fn plan_trip(
    trip: &ResolvedTrip,
    catalog: &dyn TravelCatalog,
    weather: Option<WeatherReport>,
) -> TripPlan {
    let mut trace = Vec::new();

    let days = i64::from(trip.num_days);
    let nights = days - 1;
    let travelers = i64::from(trip.travelers);

    // Step 1: cheapest direct flight, or there is no trip at all.
    let flights = catalog.search_flights(&trip.source, &trip.destination, FlightSort::Cheapest);
    let Some(flight) = flights.recommended().cloned() else {
        return TripPlan::Failure(PlanFailure {
            kind: PlanFailureKind::NoFlightRoute,
            message: format!(
                "No flights found from {} to {}.",
                trip.source, trip.destination
            ),
            suggestion: format!("Try one of the supported cities: {}.", city_list()),
            analysis: None,
            closest_option: None,
            reasoning: trace,
        });
    };
    let round_trip_cost = flight.price * 2 * travelers;
    trace.push(format!(
        "Cheapest flight: {} at {} one-way, {} round trip for {} traveler(s).",
        flight.airline,
        format_inr(flight.price),
        format_inr(round_trip_cost),
        travelers
    ));

    let mut daily_expense = match trip.tier {
        BudgetTier::Budget => DAILY_EXPENSE_BUDGET,
        _ => DAILY_EXPENSE_STANDARD,
    };
    let mut daily_cost = daily_expense * days * travelers;

    // Step 5: per-night hotel ceiling when a hard cap was stated.
    let mut per_night_cap = None;
    if let Some(max_budget) = trip.max_budget {
        let remaining = max_budget - round_trip_cost - daily_cost;
        let per_night = if nights > 0 {
            remaining.div_euclid(nights)
        } else {
            remaining
        };

        if per_night < MIN_HOTEL_NIGHTLY {
            let min_viable = round_trip_cost + 1_500 * nights + daily_cost;
            return TripPlan::Failure(PlanFailure {
                kind: PlanFailureKind::BudgetTooLow,
                message: format!(
                    "A budget of {} is too low for this trip: after flights and daily \
                     expenses only {} per night remains for a hotel.",
                    format_inr(max_budget),
                    format_inr(per_night)
                ),
                suggestion: format!(
                    "A realistic minimum for this trip is about {}. Increase the budget \
                     or shorten the stay.",
                    format_inr(min_viable)
                ),
                analysis: Some(BudgetAnalysis {
                    max_budget,
                    flight_cost: round_trip_cost,
                    min_daily_cost: daily_cost,
                    remaining_for_hotel: remaining,
                    nights,
                    per_night_available: per_night,
                }),
                closest_option: None,
                reasoning: trace,
            });
        }

        per_night_cap = Some(per_night);
        trace.push(format!(
            "Budget {}: {} left for the hotel, up to {} per night.",
            format_inr(max_budget),
            format_inr(remaining),
            format_inr(per_night)
        ));
    }

    // Step 6: hotel search, with one constraint relaxation on a miss.
    let star_floor = if trip.tier == BudgetTier::Budget {
        1
    } else {
        trip.min_hotel_stars
    };
    let sort = if trip.tier == BudgetTier::Budget || per_night_cap.is_some() {
        HotelSort::Price
    } else {
        HotelSort::Value
    };
    let mut hotels = catalog.search_hotels(&HotelQuery {
        city: trip.destination.clone(),
        min_stars: star_floor,
        max_price_per_night: per_night_cap,
        required_amenities: Vec::new(),
        sort,
    });
    // Retry only when there was a constraint to relax; the relaxed search
    // drops the price ceiling, which is what lets an over-cap hotel flow
    // into the daily-expense trim and the shortfall report below.
    if !hotels.success() && (star_floor > 1 || per_night_cap.is_some()) {
        trace.push(
            "No hotel matched the constraints; retrying with any rating and no price ceiling."
                .to_string(),
        );
        hotels = catalog.search_hotels(&HotelQuery {
            city: trip.destination.clone(),
            min_stars: 1,
            max_price_per_night: None,
            required_amenities: Vec::new(),
            sort: HotelSort::Price,
        });
    }
    let Some(hotel) = hotels.recommended().cloned() else {
        return TripPlan::Failure(PlanFailure {
            kind: PlanFailureKind::NoHotelInBudget,
            message: format!(
                "No hotel in {} fits within {} per night.",
                trip.destination,
                per_night_cap.map(format_inr).unwrap_or_else(|| "the stated constraints".to_string())
            ),
            suggestion: "Raise the budget or shorten the trip to free up more per night."
                .to_string(),
            analysis: None,
            closest_option: None,
            reasoning: trace,
        });
    };
    let hotel_total = hotel.price_per_night * nights.max(0);
    trace.push(format!(
        "Hotel: {} ({}-star) at {} per night, {} for {} night(s).",
        hotel.name,
        hotel.stars,
        format_inr(hotel.price_per_night),
        format_inr(hotel_total),
        nights.max(0)
    ));

    // Step 8: total check, with one daily-expense relaxation to the floor.
    let mut total = round_trip_cost + hotel_total + daily_cost;
    if let Some(max_budget) = trip.max_budget {
        if total > max_budget && daily_expense > DAILY_EXPENSE_FLOOR {
            daily_expense = DAILY_EXPENSE_FLOOR;
            daily_cost = daily_expense * days * travelers;
            total = round_trip_cost + hotel_total + daily_cost;
            trace.push(format!(
                "Over budget at the usual daily spend; trimmed daily expenses to {} per person.",
                format_inr(daily_expense)
            ));
        }
        if total > max_budget {
            let shortfall = total - max_budget;
            return TripPlan::Failure(PlanFailure {
                kind: PlanFailureKind::CannotMeetBudget,
                message: format!(
                    "The cheapest workable trip costs {}, which is {} over the {} budget.",
                    format_inr(total),
                    format_inr(shortfall),
                    format_inr(max_budget)
                ),
                suggestion: format!(
                    "Increase the budget by at least {}, or try fewer days.",
                    format_inr(shortfall)
                ),
                analysis: None,
                closest_option: Some(ClosestOption {
                    total,
                    flight: round_trip_cost,
                    hotel: hotel_total,
                    expenses: daily_cost,
                    shortfall,
                }),
                reasoning: trace,
            });
        }
    }

    // Step 9: best-effort enrichments.
    let places = catalog
        .search_places(&trip.destination, 3.5, 2 * trip.num_days as usize)
        .matches;
    trace.push(format!(
        "Found {} top-rated places in {}.",
        places.len(),
        trip.destination
    ));
    if weather.as_ref().is_some_and(|report| report.simulated) {
        trace.push("Live forecast unavailable; using a simulated one.".to_string());
    }

    let itinerary = build_itinerary(trip, &places, weather.as_ref());

    // Step 11: breakdown and tier classification.
    let per_person = (total as f64 / travelers as f64).round() as i64;
    let trip_tier = TripTier::from_per_person(per_person);
    let within_budget = trip.max_budget.map(|max| total <= max).unwrap_or(true);
    let savings = trip.max_budget.map(|max| max - total).unwrap_or(0);
    trace.push(format!(
        "Total {} ({} per person): {} trip.",
        format_inr(total),
        format_inr(per_person),
        trip_tier.label()
    ));

    let budget = BudgetBreakdown {
        flights: BudgetLine {
            description: format!("Round-trip flights ({})", flight.airline),
            unit_price: flight.price,
            quantity: 2 * travelers,
            subtotal: round_trip_cost,
        },
        accommodation: BudgetLine {
            description: format!("{} ({}-star)", hotel.name, hotel.stars),
            unit_price: hotel.price_per_night,
            quantity: nights.max(0),
            subtotal: hotel_total,
        },
        daily_expenses: BudgetLine {
            description: "Food, transport, and activities".to_string(),
            unit_price: daily_expense,
            quantity: days * travelers,
            subtotal: daily_cost,
        },
        grand_total: total,
        per_person,
        trip_tier,
        max_budget: trip.max_budget,
        within_budget,
        savings,
    };

    TripPlan::Success(Box::new(PlannedTrip {
        summary: TripSummary {
            title: format!(
                "{}-day trip from {} to {}",
                trip.num_days, trip.source, trip.destination
            ),
            source: trip.source.clone(),
            destination: trip.destination.clone(),
            start_date: trip.start_date,
            num_days: trip.num_days,
            travelers: trip.travelers,
        },
        flight,
        round_trip_cost,
        hotel,
        hotel_total,
        weather,
        places,
        itinerary,
        budget,
        reasoning: trace,
    }))
}

/// Spread places evenly across the stay. Each day gets
/// `floor(places/days)`; leftover places are dropped from the tail.
fn build_itinerary(
    trip: &ResolvedTrip,
    places: &[Place],
    weather: Option<&WeatherReport>,
) -> Vec<ItineraryDay> {
    let days = trip.num_days as usize;
    let per_day = places.len() / days.max(1);

    (0..days)
        .map(|index| {
            let date = trip.start_date + Duration::days(index as i64);
            let day_places: Vec<Place> =
                places.iter().skip(index * per_day).take(per_day).cloned().collect();

            let mut activities = Vec::new();
            if index == 0 {
                activities.push(format!("Arrive in {} and check in", trip.destination));
            }
            for place in &day_places {
                activities.push(format!("Visit {}", place.name));
            }
            if day_places.is_empty() {
                activities.push(format!("Explore {} at your own pace", trip.destination));
            }
            activities.push("Try the local food".to_string());
            if index + 1 == days {
                activities.push(format!("Check out and depart for {}", trip.source));
            }

            ItineraryDay {
                day: (index + 1) as u8,
                date,
                weather: day_forecast(weather, index),
                places: day_places,
                activities,
            }
        })
        .collect()
}

fn day_forecast(weather: Option<&WeatherReport>, index: usize) -> Option<DayForecast> {
    weather.and_then(|report| report.forecast.get(index)).cloned()
}
