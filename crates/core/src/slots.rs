use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::gazetteer::resolve_city;
use crate::models::{BudgetTier, ParsedSlots, MAX_TRAVELERS, MAX_TRIP_DAYS, MIN_TRIP_DAYS};

static FROM_TO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"from\s+(\w+)\s+to\s+(\w+)").expect("static regex"));
static PAIR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w+)\s+to\s+(\w+)").expect("static regex"));
static TO_ONLY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bto\s+(\w+)").expect("static regex"));
static FROM_ONLY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"from\s+(\w+)").expect("static regex"));
static TRAVEL_VERB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:visiting|visit|trip to|travel to|going to)\s+(\w+)").expect("static regex")
});
static DAYS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*(?:days?|nights?)").expect("static regex"));
static WORD_DAYS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(one|two|three|four|five|six|seven|eight|nine|ten|an|a)\s*(?:days?|nights?)")
        .expect("static regex")
});
static TRAVELERS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*(?:people|persons?|travelers?|adults?)").expect("static regex"));
static BUDGET_LEAD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:under|within|budget|max|upto|up to)\s*(?:rs\.?|₹|inr)?\s*(\d+)\s*(k|thousand)?")
        .expect("static regex")
});
static BUDGET_BARE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:rs\.?|₹|inr)?\s*(\d+)\s*(k|thousand)?(?:\s*budget)?").expect("static regex")
});
static STARS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*star").expect("static regex"));

/// Keyword table for the budget preference tier, checked in order.
const TIER_KEYWORDS: &[(&str, BudgetTier)] = &[
    ("cheap", BudgetTier::Budget),
    ("budget", BudgetTier::Budget),
    ("affordable", BudgetTier::Budget),
    ("low cost", BudgetTier::Budget),
    ("economy", BudgetTier::Budget),
    ("economical", BudgetTier::Budget),
    // A stated cap ("under 20k") is itself evidence of cost-consciousness.
    ("under", BudgetTier::Budget),
    ("balanced", BudgetTier::Balanced),
    ("moderate", BudgetTier::Balanced),
    ("mid-range", BudgetTier::Balanced),
    ("luxury", BudgetTier::Premium),
    ("premium", BudgetTier::Premium),
    ("expensive", BudgetTier::Premium),
    ("high-end", BudgetTier::Premium),
    ("5 star", BudgetTier::Premium),
    ("five star", BudgetTier::Premium),
];

const NUMBER_WORDS: &[(&str, u8)] = &[
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("a", 1),
    ("an", 1),
];

/// Extract everything a single utterance says about the trip.
///
/// Each sub-extraction runs independently over the lowercased text; `today`
/// anchors the relative date phrases.
pub fn extract_slots(utterance: &str, today: NaiveDate) -> ParsedSlots {
    let query = utterance.to_lowercase();
    let (source, destination) = extract_cities(&query);

    ParsedSlots {
        source: source.map(str::to_string),
        destination: destination.map(str::to_string),
        num_days: extract_days(&query),
        start_date: extract_date(&query, today),
        num_travelers: extract_travelers(&query),
        budget_tier: extract_tier(&query),
        min_hotel_stars: extract_stars(&query),
        max_budget: extract_budget_amount(&query),
    }
}

/// Ordered city rules, strongest pattern first.
fn extract_cities(query: &str) -> (Option<&'static str>, Option<&'static str>) {
    // Rule 1: "from A to B" decides both roles outright, even when a side
    // fails to resolve.
    if let Some(caps) = FROM_TO_RE.captures(query) {
        return (resolve_city(&caps[1]), resolve_city(&caps[2]));
    }

    let mut source = None;
    let mut destination = None;

    // Rule 2: bare "A to B" counts only when both sides resolve; a resolved
    // right side alone still contributes the destination.
    if let Some(caps) = PAIR_RE.captures(query) {
        let src = resolve_city(&caps[1]);
        let dst = resolve_city(&caps[2]);
        if src.is_some() && dst.is_some() {
            return (src, dst);
        }
        destination = dst;
    }

    // Rule 3: "to B" alone.
    if destination.is_none() {
        if let Some(caps) = TO_ONLY_RE.captures(query) {
            destination = resolve_city(&caps[1]);
        }
    }

    // Rule 4: "from A" alone.
    if source.is_none() {
        if let Some(caps) = FROM_ONLY_RE.captures(query) {
            source = resolve_city(&caps[1]);
        }
    }

    // Rule 5: verbs of travel name the destination.
    if destination.is_none() {
        if let Some(caps) = TRAVEL_VERB_RE.captures(query) {
            destination = resolve_city(&caps[1]);
        }
    }

    // Rule 6: bare-city fallback for follow-up answers like "hyderabad".
    // Assigns to source, which is only right when the destination is already
    // known from prior turns; kept as-is deliberately.
    if source.is_none() && destination.is_none() {
        for word in query.split_whitespace() {
            if let Some(city) = resolve_city(word) {
                source = Some(city);
                break;
            }
        }
    }

    (source, destination)
}

fn extract_days(query: &str) -> Option<u8> {
    if let Some(caps) = DAYS_RE.captures(query) {
        let value: u16 = caps[1].parse().ok()?;
        return Some(clamp_days(value));
    }

    if let Some(caps) = WORD_DAYS_RE.captures(query) {
        let word = &caps[1];
        if let Some((_, value)) = NUMBER_WORDS.iter().find(|(name, _)| *name == word) {
            return Some(*value);
        }
    }

    if query.contains("week") && !query.contains("weekend") {
        return Some(7);
    }
    if query.contains("weekend") {
        return Some(2);
    }

    None
}

fn extract_date(query: &str, today: NaiveDate) -> Option<NaiveDate> {
    if query.contains("tomorrow") {
        return Some(today + Duration::days(1));
    }
    if query.contains("next week") {
        return Some(today + Duration::days(7));
    }
    if query.contains("next month") {
        return Some(today + Duration::days(30));
    }
    None
}

fn extract_travelers(query: &str) -> Option<u8> {
    if let Some(caps) = TRAVELERS_RE.captures(query) {
        let value: u16 = caps[1].parse().ok()?;
        return Some(value.clamp(1, MAX_TRAVELERS as u16) as u8);
    }

    if query.contains("couple") {
        return Some(2);
    }
    if query.contains("family") {
        return Some(4);
    }
    if query.contains("solo") {
        return Some(1);
    }

    None
}

fn extract_budget_amount(query: &str) -> Option<i64> {
    // Rule 1: a lead word ("under 20k", "budget 20000", "within 15k").
    if let Some(caps) = BUDGET_LEAD_RE.captures(query) {
        return scaled_amount(&caps).filter(|amount| *amount > 0);
    }

    // Rule 2: a bare amount ("20k", "₹20000"), accepted only in a plausible
    // budget range so day counts and the like are not misread.
    if let Some(caps) = BUDGET_BARE_RE.captures(query) {
        let amount = scaled_amount(&caps)?;
        if (5_000..=500_000).contains(&amount) {
            return Some(amount);
        }
    }

    None
}

fn scaled_amount(caps: &regex::Captures<'_>) -> Option<i64> {
    let mut amount: i64 = caps[1].parse().ok()?;
    let suffix = caps.get(2).map(|m| m.as_str());
    if suffix == Some("k") {
        amount *= 1_000;
    } else if amount < 100 {
        // A small raw number almost always means thousands ("under 20").
        amount *= 1_000;
    }
    Some(amount)
}

/// First matching tier keyword. A balanced result is indistinguishable from
/// the default, so it never overrides prior context.
fn extract_tier(query: &str) -> Option<BudgetTier> {
    let tier = TIER_KEYWORDS
        .iter()
        .find(|(keyword, _)| query.contains(keyword))
        .map(|(_, tier)| *tier)
        .unwrap_or(BudgetTier::Balanced);

    if tier == BudgetTier::Balanced {
        None
    } else {
        Some(tier)
    }
}

/// Star preference; a result equal to the default of 3 never overrides prior
/// context.
fn extract_stars(query: &str) -> Option<u8> {
    let stars = if let Some(caps) = STARS_RE.captures(query) {
        caps[1]
            .parse::<u16>()
            .map(|value| value.clamp(1, 5) as u8)
            .unwrap_or(3)
    } else if query.contains("luxury") || query.contains("premium") {
        5
    } else if query.contains("budget") || query.contains("cheap") {
        2
    } else {
        3
    };

    if stars == 3 {
        None
    } else {
        Some(stars)
    }
}

fn clamp_days(value: u16) -> u8 {
    value.clamp(MIN_TRIP_DAYS as u16, MAX_TRIP_DAYS as u16) as u8
}
