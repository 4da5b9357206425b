pub mod context;
pub mod gazetteer;
pub mod models;
pub mod planner;
pub mod slots;

pub use context::{confirmation_message, merge, missing_prompt, missing_slots, parse_and_merge};
pub use gazetteer::{city_list, coordinates, resolve_city, CITIES};
pub use models::{
    BudgetAnalysis, BudgetBreakdown, BudgetLine, BudgetTier, ChatInput, ClosestOption,
    ConversationTurn, DayForecast, FlightOption, FlightSort, HotelOption, HotelQuery, HotelSort,
    ItineraryDay, ParsedSlots, Place, PlanFailure, PlanFailureKind, PlannedTrip, PlannerSession,
    ResolvedTrip, SearchResult, TripContext, TripPlan, TripSlot, TripSummary, TripTier, TurnReply,
    WeatherReport,
};
pub use planner::{plan_trip, TravelCatalog};
pub use slots::extract_slots;
