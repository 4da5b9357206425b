use chrono::NaiveDate;

use crate::gazetteer::city_list;
use crate::models::{format_inr, ParsedSlots, TripContext, TripSlot};
use crate::slots::extract_slots;

/// One-call turn helper: extract the utterance's slots, fold them into the
/// context, and produce the next prompt — a clarification while mandatory
/// slots are missing, the confirmation line once none are.
pub fn parse_and_merge(
    utterance: &str,
    context: &TripContext,
    today: NaiveDate,
) -> (TripContext, Vec<TripSlot>, String) {
    let slots = extract_slots(utterance, today);
    let merged = merge(context, &slots);
    let missing = missing_slots(&merged);
    let prompt = if missing.is_empty() {
        confirmation_message(&merged)
    } else {
        missing_prompt(&merged, &missing)
    };
    (merged, missing, prompt)
}

/// Fold one utterance's slots into the accumulated context, returning the
/// new context value. Non-null fields win; everything else is retained.
///
/// An explicit budget amount force-sets the tier to `budget` first, so a
/// tier keyword from the same utterance can still override it. That order is
/// load-bearing for the confirmation messages.
pub fn merge(context: &TripContext, slots: &ParsedSlots) -> TripContext {
    let mut next = context.clone();

    if let Some(source) = &slots.source {
        next.source = Some(source.clone());
    }
    if let Some(destination) = &slots.destination {
        next.destination = Some(destination.clone());
    }
    if let Some(num_days) = slots.num_days {
        next.num_days = Some(num_days);
    }
    if let Some(start_date) = slots.start_date {
        next.start_date = Some(start_date);
    }
    if let Some(num_travelers) = slots.num_travelers {
        next.num_travelers = Some(num_travelers);
    }

    if let Some(max_budget) = slots.max_budget {
        next.max_budget = Some(max_budget);
        next.budget_tier = Some(crate::models::BudgetTier::Budget);
    }
    if let Some(tier) = slots.budget_tier {
        next.budget_tier = Some(tier);
    }

    if let Some(stars) = slots.min_hotel_stars {
        next.min_hotel_stars = Some(stars);
    }

    next
}

/// Mandatory slots still unset, in fixed prompt order.
pub fn missing_slots(context: &TripContext) -> Vec<TripSlot> {
    let mut missing = Vec::new();
    if context.source.is_none() {
        missing.push(TripSlot::Source);
    }
    if context.destination.is_none() {
        missing.push(TripSlot::Destination);
    }
    if context.num_days.is_none() {
        missing.push(TripSlot::NumDays);
    }
    missing
}

/// Disambiguation prompt: what was understood so far, then one question per
/// missing mandatory slot annotated with the valid value domain.
pub fn missing_prompt(context: &TripContext, missing: &[TripSlot]) -> String {
    let mut understood = Vec::new();
    if let Some(source) = &context.source {
        understood.push(format!("from {source}"));
    }
    if let Some(destination) = &context.destination {
        understood.push(format!("to {destination}"));
    }
    if let Some(num_days) = context.num_days {
        understood.push(format!("for {num_days} days"));
    }
    if let Some(max_budget) = context.max_budget {
        understood.push(format!("within {}", format_inr(max_budget)));
    }

    let mut message = String::new();
    if !understood.is_empty() {
        message.push_str(&format!(
            "Got it! Planning a trip {}.\n\n",
            understood.join(", ")
        ));
    }

    message.push_str("I just need:\n");
    for slot in missing {
        match slot {
            TripSlot::Source => {
                message.push_str(&format!("- Where from? ({})\n", city_list()));
            }
            TripSlot::Destination => {
                message.push_str(&format!("- Where to? ({})\n", city_list()));
            }
            TripSlot::NumDays => {
                message.push_str("- How many days?\n");
            }
        }
    }

    message
}

/// Confirmation line emitted once every mandatory slot is filled.
pub fn confirmation_message(context: &TripContext) -> String {
    let budget_info = context
        .max_budget
        .map(|amount| format!(" within {}", format_inr(amount)))
        .unwrap_or_default();

    format!(
        "Planning a {}-day {} trip from {} to {}{} for {} traveler(s). Finding the best options...",
        context.num_days.unwrap_or_default(),
        context.tier().as_str(),
        context.source.as_deref().unwrap_or("?"),
        context.destination.as_deref().unwrap_or("?"),
        budget_info,
        context.travelers(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BudgetTier;
    use crate::slots::extract_slots;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    #[test]
    fn non_null_fields_overwrite_and_others_are_kept() {
        let mut context = TripContext::default();
        context.source = Some("Delhi".to_string());
        context.num_days = Some(5);

        let slots = ParsedSlots {
            destination: Some("Goa".to_string()),
            num_days: Some(3),
            ..ParsedSlots::default()
        };

        let merged = merge(&context, &slots);
        assert_eq!(merged.source.as_deref(), Some("Delhi"));
        assert_eq!(merged.destination.as_deref(), Some("Goa"));
        assert_eq!(merged.num_days, Some(3));
    }

    #[test]
    fn budget_amount_forces_budget_tier_before_keyword_override() {
        let context = TripContext::default();

        let amount_only = ParsedSlots {
            max_budget: Some(40_000),
            ..ParsedSlots::default()
        };
        let merged = merge(&context, &amount_only);
        assert_eq!(merged.budget_tier, Some(BudgetTier::Budget));

        // A tier keyword in the same utterance wins over the inferred tier.
        let amount_and_keyword = ParsedSlots {
            max_budget: Some(40_000),
            budget_tier: Some(BudgetTier::Premium),
            ..ParsedSlots::default()
        };
        let merged = merge(&context, &amount_and_keyword);
        assert_eq!(merged.budget_tier, Some(BudgetTier::Premium));
        assert_eq!(merged.max_budget, Some(40_000));
    }

    #[test]
    fn sequential_merge_equals_union_merge() {
        let base = TripContext::default();
        let first = ParsedSlots {
            source: Some("Mumbai".to_string()),
            num_days: Some(4),
            ..ParsedSlots::default()
        };
        let second = ParsedSlots {
            destination: Some("Goa".to_string()),
            num_days: Some(3),
            ..ParsedSlots::default()
        };

        let sequential = merge(&merge(&base, &first), &second);

        let union = ParsedSlots {
            source: first.source.clone(),
            destination: second.destination.clone(),
            num_days: second.num_days,
            ..ParsedSlots::default()
        };
        let unioned = merge(&base, &union);

        assert_eq!(sequential, unioned);
    }

    #[test]
    fn missing_slots_order_and_emptiness() {
        let mut context = TripContext::default();
        assert_eq!(
            missing_slots(&context),
            vec![TripSlot::Source, TripSlot::Destination, TripSlot::NumDays]
        );

        context.destination = Some("Goa".to_string());
        assert_eq!(
            missing_slots(&context),
            vec![TripSlot::Source, TripSlot::NumDays]
        );

        context.source = Some("Mumbai".to_string());
        context.num_days = Some(3);
        assert!(missing_slots(&context).is_empty());

        // Optional fields never affect the mandatory check.
        context.max_budget = Some(10_000);
        assert!(missing_slots(&context).is_empty());
    }

    #[test]
    fn prompt_lists_understood_fields_and_city_domain() {
        let slots = extract_slots("trip to goa under 15k", today());
        let context = merge(&TripContext::default(), &slots);
        let missing = missing_slots(&context);
        let prompt = missing_prompt(&context, &missing);

        assert!(prompt.contains("to Goa"));
        assert!(prompt.contains("within ₹15,000"));
        assert!(prompt.contains("Where from?"));
        assert!(prompt.contains("Mumbai"));
        assert!(prompt.contains("How many days?"));
        assert!(!prompt.contains("Where to?"));
    }

    #[test]
    fn parse_and_merge_switches_from_clarification_to_confirmation() {
        let (context, missing, prompt) =
            parse_and_merge("plan a trip to goa", &TripContext::default(), today());
        assert_eq!(missing, vec![TripSlot::Source, TripSlot::NumDays]);
        assert!(prompt.contains("Where from?"));

        let (context, missing, prompt) = parse_and_merge("from mumbai, 3 days", &context, today());
        assert!(missing.is_empty());
        assert!(prompt.starts_with("Planning a 3-day"));
        assert_eq!(context.destination.as_deref(), Some("Goa"));
    }

    #[test]
    fn full_utterance_parses_into_complete_context() {
        let slots = extract_slots("3 day trip Mumbai to Goa under 15k", today());
        let context = merge(&TripContext::default(), &slots);

        assert!(missing_slots(&context).is_empty());
        assert_eq!(context.source.as_deref(), Some("Mumbai"));
        assert_eq!(context.destination.as_deref(), Some("Goa"));
        assert_eq!(context.num_days, Some(3));
        assert_eq!(context.max_budget, Some(15_000));
        assert_eq!(context.budget_tier, Some(BudgetTier::Budget));

        let confirmation = confirmation_message(&context);
        assert!(confirmation.contains("3-day budget trip"));
        assert!(confirmation.contains("from Mumbai to Goa"));
        assert!(confirmation.contains("₹15,000"));
    }
}
