use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Result};
use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use wayfarer_core::{
    missing_slots, parse_and_merge, plan_trip, ChatInput, ConversationTurn, PlannerSession,
    TripContext, TripPlan, TurnReply, WeatherReport,
};
use wayfarer_datasets::TravelDatasets;
use wayfarer_observability::AppMetrics;
use wayfarer_storage::{session_deadline, SessionRepository};
use wayfarer_weather::WeatherService;

const MAX_SESSION_TURNS: usize = 40;

/// Drives one conversation turn end to end: parse, merge, clarify or plan,
/// persist. Sessions are loaded and saved through the repository so the
/// agent itself stays stateless.
#[derive(Clone)]
pub struct TripAgent<S>
where
    S: SessionRepository,
{
    catalog: Arc<TravelDatasets>,
    weather: Arc<WeatherService>,
    store: Arc<S>,
    metrics: Arc<AppMetrics>,
}

impl<S> TripAgent<S>
where
    S: SessionRepository,
{
    pub fn new(
        catalog: Arc<TravelDatasets>,
        weather: Arc<WeatherService>,
        store: Arc<S>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            catalog,
            weather,
            store,
            metrics,
        }
    }

    #[instrument(skip(self, input))]
    pub async fn handle_turn(&self, input: ChatInput) -> Result<TurnReply> {
        let started = Instant::now();
        self.metrics.inc_request();

        let session_id = input
            .session_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let prior = if input.reset {
            None
        } else {
            self.store.load_session(&session_id).await?
        };
        let mut session = prior.unwrap_or_else(|| fresh_session(&session_id));

        let today = Utc::now().date_naive();
        let (context, missing, prompt) = parse_and_merge(&input.text, &session.context, today);

        let (reply_text, plan) = if missing.is_empty() {
            let plan = self.plan_from_context(&context, today).await;
            (describe_outcome(&prompt, &plan), Some(plan))
        } else {
            self.metrics.inc_clarification();
            (prompt, None)
        };

        session.context = context.clone();
        session.expires_at = session_deadline();
        session.turns.push(ConversationTurn {
            at: Utc::now(),
            user_text: input.text.clone(),
            assistant_text: reply_text.clone(),
        });
        if session.turns.len() > MAX_SESSION_TURNS {
            let keep_from = session.turns.len() - MAX_SESSION_TURNS;
            session.turns = session.turns.split_off(keep_from);
        }
        self.store.upsert_session(session).await?;

        self.metrics
            .record_latency(started.elapsed().as_millis() as u64);
        info!(
            session_id = %session_id,
            missing = missing.len(),
            planned = plan.is_some(),
            "turn handled"
        );

        Ok(TurnReply {
            session_id,
            reply_text,
            missing_slots: missing,
            context,
            plan,
        })
    }

    /// Direct planning entry point for callers that already hold a full
    /// context (the one-shot API route and the CLI).
    pub async fn plan_trip(&self, context: &TripContext) -> Result<TripPlan> {
        self.metrics.inc_request();

        let today = Utc::now().date_naive();
        let missing = missing_slots(context);
        if !missing.is_empty() {
            let labels: Vec<&str> = missing.iter().map(|slot| slot.label()).collect();
            bail!("cannot plan yet, still missing: {}", labels.join(", "));
        }

        Ok(self.plan_from_context(context, today).await)
    }

    pub async fn purge_expired_sessions(&self) -> Result<usize> {
        self.store.purge_expired().await
    }

    async fn plan_from_context(&self, context: &TripContext, today: chrono::NaiveDate) -> TripPlan {
        // Guarded by the missing-slot checks at both call sites.
        let Some(resolved) = context.resolve(today) else {
            unreachable!("plan_from_context called with mandatory slots unset");
        };

        let weather = self.fetch_weather(&resolved).await;
        let plan = plan_trip(&resolved, self.catalog.as_ref(), weather);
        if plan.is_success() {
            self.metrics.inc_plan();
        } else {
            self.metrics.inc_plan_failure();
        }
        plan
    }

    async fn fetch_weather(
        &self,
        resolved: &wayfarer_core::ResolvedTrip,
    ) -> Option<WeatherReport> {
        match self
            .weather
            .forecast(&resolved.destination, resolved.start_date, resolved.num_days)
            .await
        {
            Ok(report) => {
                if report.simulated {
                    self.metrics.inc_weather_fallback();
                }
                Some(report)
            }
            Err(error) => {
                info!(%error, destination = %resolved.destination, "skipping weather");
                None
            }
        }
    }
}

fn describe_outcome(confirmation: &str, plan: &TripPlan) -> String {
    match plan {
        TripPlan::Success(planned) => format!(
            "{confirmation}\n\n{}: {} total ({} per person, {} trip).",
            planned.summary.title,
            wayfarer_core::models::format_inr(planned.budget.grand_total),
            wayfarer_core::models::format_inr(planned.budget.per_person),
            planned.budget.trip_tier.label()
        ),
        TripPlan::Failure(failure) => {
            format!("{confirmation}\n\n{} {}", failure.message, failure.suggestion)
        }
    }
}

fn fresh_session(session_id: &str) -> PlannerSession {
    PlannerSession {
        session_id: session_id.to_string(),
        context: TripContext::default(),
        expires_at: session_deadline(),
        turns: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_core::models::TripSlot;
    use wayfarer_storage::MemoryStore;

    fn agent() -> TripAgent<MemoryStore> {
        // Unreachable weather endpoint so every plan uses the simulated
        // fallback instead of the network.
        let weather = WeatherService::with_base_url("http://127.0.0.1:9").expect("client");
        TripAgent::new(
            Arc::new(TravelDatasets::load().expect("embedded data")),
            Arc::new(weather),
            Arc::new(MemoryStore::new()),
            Arc::new(AppMetrics::new()),
        )
    }

    fn turn(session_id: Option<&str>, text: &str) -> ChatInput {
        ChatInput {
            session_id: session_id.map(str::to_string),
            text: text.to_string(),
            reset: false,
        }
    }

    #[tokio::test]
    async fn incomplete_utterance_asks_for_missing_slots() {
        let agent = agent();
        let reply = agent
            .handle_turn(turn(None, "plan a trip to goa"))
            .await
            .unwrap();

        assert_eq!(
            reply.missing_slots,
            vec![TripSlot::Source, TripSlot::NumDays]
        );
        assert!(reply.plan.is_none());
        assert!(reply.reply_text.contains("Where from?"));
    }

    #[tokio::test]
    async fn context_accumulates_across_turns_until_planning() {
        let agent = agent();
        let first = agent
            .handle_turn(turn(Some("s1"), "plan a trip to goa"))
            .await
            .unwrap();
        assert!(first.plan.is_none());

        let second = agent
            .handle_turn(turn(Some("s1"), "from mumbai, 3 days, under 15k"))
            .await
            .unwrap();
        assert!(second.missing_slots.is_empty());
        let plan = second.plan.expect("all slots filled");
        assert!(plan.is_success());
        assert_eq!(second.context.source.as_deref(), Some("Mumbai"));
    }

    #[tokio::test]
    async fn reset_discards_the_accumulated_context() {
        let agent = agent();
        agent
            .handle_turn(turn(Some("s2"), "3 day trip mumbai to goa"))
            .await
            .unwrap();

        let reply = agent
            .handle_turn(ChatInput {
                session_id: Some("s2".to_string()),
                text: "trip to jaipur".to_string(),
                reset: true,
            })
            .await
            .unwrap();

        assert_eq!(reply.context.destination.as_deref(), Some("Jaipur"));
        assert!(reply.context.source.is_none());
        assert!(reply.context.num_days.is_none());
    }

    #[tokio::test]
    async fn direct_planning_rejects_incomplete_context() {
        let agent = agent();
        let mut context = TripContext::default();
        context.destination = Some("Goa".to_string());

        let error = agent.plan_trip(&context).await.unwrap_err();
        assert!(error.to_string().contains("source city"));
    }

    #[tokio::test]
    async fn one_shot_utterance_plans_within_budget() {
        let agent = agent();
        let reply = agent
            .handle_turn(turn(None, "3 day trip Mumbai to Goa under 15k"))
            .await
            .unwrap();

        let plan = reply.plan.expect("complete utterance");
        let TripPlan::Success(planned) = plan else {
            panic!("reference trip should be feasible");
        };
        assert!(planned.budget.grand_total <= 15_000);
        assert!(planned.weather.as_ref().is_some_and(|w| w.simulated));
    }
}
