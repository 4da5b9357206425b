use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Standard daily per-person spend (food, transport, activities) in INR.
pub const DAILY_EXPENSE_STANDARD: i64 = 2_500;
/// Reduced daily spend applied when the traveler asked for a budget trip.
pub const DAILY_EXPENSE_BUDGET: i64 = 1_500;
/// Hard floor the planner may drop to once when a capped trip overshoots.
pub const DAILY_EXPENSE_FLOOR: i64 = 1_000;
/// Below this per-night ceiling no usable hotel exists anywhere in the data.
pub const MIN_HOTEL_NIGHTLY: i64 = 1_000;

pub const MIN_TRIP_DAYS: u8 = 1;
pub const MAX_TRIP_DAYS: u8 = 14;
pub const MAX_TRAVELERS: u8 = 10;

/// Per-person spend thresholds for labeling the finished trip.
pub const TRIP_TIER_BUDGET_MAX: i64 = 8_000;
pub const TRIP_TIER_MID_RANGE_MAX: i64 = 15_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetTier {
    Budget,
    Balanced,
    Premium,
}

impl BudgetTier {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "budget" | "cheap" | "economy" => Some(Self::Budget),
            "balanced" | "moderate" | "mid-range" => Some(Self::Balanced),
            "premium" | "luxury" => Some(Self::Premium),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Budget => "budget",
            Self::Balanced => "balanced",
            Self::Premium => "premium",
        }
    }
}

/// Classification of the finished trip by per-person spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripTier {
    Budget,
    MidRange,
    Premium,
}

impl TripTier {
    pub fn from_per_person(per_person: i64) -> Self {
        if per_person < TRIP_TIER_BUDGET_MAX {
            Self::Budget
        } else if per_person < TRIP_TIER_MID_RANGE_MAX {
            Self::MidRange
        } else {
            Self::Premium
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Budget => "Budget",
            Self::MidRange => "Mid-Range",
            Self::Premium => "Premium",
        }
    }
}

/// One named trip parameter the conversation must fill before planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripSlot {
    Source,
    Destination,
    NumDays,
}

impl TripSlot {
    pub fn label(self) -> &'static str {
        match self {
            Self::Source => "source city",
            Self::Destination => "destination city",
            Self::NumDays => "number of days",
        }
    }
}

/// Accumulated trip parameters for one conversation.
///
/// Mandatory slots are source, destination, and day count; everything else
/// falls back to a default at read time via the accessor methods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripContext {
    pub source: Option<String>,
    pub destination: Option<String>,
    pub num_days: Option<u8>,
    pub start_date: Option<NaiveDate>,
    pub num_travelers: Option<u8>,
    pub budget_tier: Option<BudgetTier>,
    pub min_hotel_stars: Option<u8>,
    pub max_budget: Option<i64>,
}

impl TripContext {
    pub fn travelers(&self) -> u8 {
        self.num_travelers.unwrap_or(1)
    }

    pub fn tier(&self) -> BudgetTier {
        self.budget_tier.unwrap_or(BudgetTier::Balanced)
    }

    pub fn hotel_stars(&self) -> u8 {
        self.min_hotel_stars.unwrap_or(3)
    }

    /// Start date, defaulting to a week out when never stated.
    pub fn start_or_default(&self, today: NaiveDate) -> NaiveDate {
        self.start_date.unwrap_or(today + Duration::days(7))
    }

    /// Concrete parameters for the planner; `None` while mandatory slots
    /// are still missing.
    pub fn resolve(&self, today: NaiveDate) -> Option<ResolvedTrip> {
        let source = self.source.clone()?;
        let destination = self.destination.clone()?;
        let num_days = self.num_days?;

        Some(ResolvedTrip {
            source,
            destination,
            num_days,
            start_date: self.start_or_default(today),
            travelers: self.travelers(),
            tier: self.tier(),
            min_hotel_stars: self.hotel_stars(),
            max_budget: self.max_budget,
        })
    }
}

/// Slots contributed by a single utterance. `None` means the utterance said
/// nothing about that field; the merger keeps the prior value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedSlots {
    pub source: Option<String>,
    pub destination: Option<String>,
    pub num_days: Option<u8>,
    pub start_date: Option<NaiveDate>,
    pub num_travelers: Option<u8>,
    pub budget_tier: Option<BudgetTier>,
    pub min_hotel_stars: Option<u8>,
    pub max_budget: Option<i64>,
}

/// Fully determined trip parameters handed to the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTrip {
    pub source: String,
    pub destination: String,
    pub num_days: u8,
    pub start_date: NaiveDate,
    pub travelers: u8,
    pub tier: BudgetTier,
    pub min_hotel_stars: u8,
    pub max_budget: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightOption {
    pub flight_id: String,
    pub airline: String,
    pub from: String,
    pub to: String,
    pub departure_time: NaiveDateTime,
    pub arrival_time: NaiveDateTime,
    #[serde(default)]
    pub duration_hours: f64,
    pub price: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelOption {
    pub hotel_id: String,
    pub name: String,
    pub city: String,
    pub stars: u8,
    pub price_per_night: i64,
    pub amenities: Vec<String>,
    /// Stars per thousand rupees of nightly price.
    #[serde(default)]
    pub value_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub place_id: String,
    pub name: String,
    pub city: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub rating: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightSort {
    Cheapest,
    Fastest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HotelSort {
    Price,
    Stars,
    Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HotelQuery {
    pub city: String,
    pub min_stars: u8,
    pub max_price_per_night: Option<i64>,
    pub required_amenities: Vec<String>,
    pub sort: HotelSort,
}

/// Outcome of one catalog query: matches in preference order plus a short
/// note on how they were ranked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult<T> {
    pub matches: Vec<T>,
    pub reasoning: String,
}

impl<T> SearchResult<T> {
    pub fn empty(reasoning: impl Into<String>) -> Self {
        Self {
            matches: Vec::new(),
            reasoning: reasoning.into(),
        }
    }

    pub fn success(&self) -> bool {
        !self.matches.is_empty()
    }

    pub fn recommended(&self) -> Option<&T> {
        self.matches.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayForecast {
    pub date: NaiveDate,
    pub condition: String,
    pub temperature_max: f64,
    pub temperature_min: f64,
    pub precipitation_chance: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub city: String,
    pub forecast: Vec<DayForecast>,
    pub summary: String,
    pub recommendations: Vec<String>,
    pub simulated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetLine {
    pub description: String,
    pub unit_price: i64,
    pub quantity: i64,
    pub subtotal: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetBreakdown {
    pub flights: BudgetLine,
    pub accommodation: BudgetLine,
    pub daily_expenses: BudgetLine,
    pub grand_total: i64,
    pub per_person: i64,
    pub trip_tier: TripTier,
    pub max_budget: Option<i64>,
    pub within_budget: bool,
    pub savings: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryDay {
    pub day: u8,
    pub date: NaiveDate,
    pub weather: Option<DayForecast>,
    pub places: Vec<Place>,
    pub activities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripSummary {
    pub title: String,
    pub source: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub num_days: u8,
    pub travelers: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedTrip {
    pub summary: TripSummary,
    pub flight: FlightOption,
    pub round_trip_cost: i64,
    pub hotel: HotelOption,
    pub hotel_total: i64,
    pub weather: Option<WeatherReport>,
    pub places: Vec<Place>,
    pub itinerary: Vec<ItineraryDay>,
    pub budget: BudgetBreakdown,
    pub reasoning: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanFailureKind {
    NoFlightRoute,
    BudgetTooLow,
    NoHotelInBudget,
    CannotMeetBudget,
}

/// Numbers behind a `BudgetTooLow` rejection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetAnalysis {
    pub max_budget: i64,
    pub flight_cost: i64,
    pub min_daily_cost: i64,
    pub remaining_for_hotel: i64,
    pub nights: i64,
    pub per_night_available: i64,
}

/// Cheapest combination the planner could assemble before giving up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosestOption {
    pub total: i64,
    pub flight: i64,
    pub hotel: i64,
    pub expenses: i64,
    pub shortfall: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanFailure {
    pub kind: PlanFailureKind,
    pub message: String,
    pub suggestion: String,
    pub analysis: Option<BudgetAnalysis>,
    pub closest_option: Option<ClosestOption>,
    pub reasoning: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TripPlan {
    Success(Box<PlannedTrip>),
    Failure(PlanFailure),
}

impl TripPlan {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn failure(&self) -> Option<&PlanFailure> {
        match self {
            Self::Failure(failure) => Some(failure),
            Self::Success(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub at: DateTime<Utc>,
    pub user_text: String,
    pub assistant_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerSession {
    pub session_id: String,
    pub context: TripContext,
    pub expires_at: DateTime<Utc>,
    pub turns: Vec<ConversationTurn>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatInput {
    pub session_id: Option<String>,
    pub text: String,
    /// Discard the accumulated context and start a fresh conversation.
    #[serde(default)]
    pub reset: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnReply {
    pub session_id: String,
    pub reply_text: String,
    pub missing_slots: Vec<TripSlot>,
    pub context: TripContext,
    pub plan: Option<TripPlan>,
}

/// Rupee amount with western thousands grouping, e.g. `₹15,000`.
pub fn format_inr(amount: i64) -> String {
    let digits = amount.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-₹{grouped}")
    } else {
        format!("₹{grouped}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_rupees_with_grouping() {
        assert_eq!(format_inr(0), "₹0");
        assert_eq!(format_inr(999), "₹999");
        assert_eq!(format_inr(15_000), "₹15,000");
        assert_eq!(format_inr(1_234_567), "₹1,234,567");
        assert_eq!(format_inr(-2_500), "-₹2,500");
    }

    #[test]
    fn trip_tier_thresholds() {
        assert_eq!(TripTier::from_per_person(7_999), TripTier::Budget);
        assert_eq!(TripTier::from_per_person(8_000), TripTier::MidRange);
        assert_eq!(TripTier::from_per_person(14_999), TripTier::MidRange);
        assert_eq!(TripTier::from_per_person(15_000), TripTier::Premium);
    }

    #[test]
    fn context_resolves_only_when_mandatory_slots_set() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let mut ctx = TripContext::default();
        assert!(ctx.resolve(today).is_none());

        ctx.source = Some("Mumbai".to_string());
        ctx.destination = Some("Goa".to_string());
        assert!(ctx.resolve(today).is_none());

        ctx.num_days = Some(3);
        let resolved = ctx.resolve(today).expect("mandatory slots are set");
        assert_eq!(resolved.travelers, 1);
        assert_eq!(resolved.tier, BudgetTier::Balanced);
        assert_eq!(resolved.min_hotel_stars, 3);
        assert_eq!(resolved.start_date, today + Duration::days(7));
    }
}
