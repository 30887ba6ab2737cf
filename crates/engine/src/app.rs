//! Application state and composition.

use std::sync::Arc;

use wayfarer_domain::CampaignId;

use crate::infrastructure::in_memory::SeedData;
use crate::infrastructure::ports::{CampaignRepo, ClockPort, ShipRepo, StarMap};
use crate::infrastructure::settings::EngineSettings;
use crate::use_cases;
use crate::use_cases::time::{CallbackHandle, CoordinatorError, TimeCoordinator};

/// Main application state.
///
/// Holds the record store ports, the campaign clock registry and all use cases.
pub struct App {
    pub repositories: Repositories,
    pub coordinator: TimeCoordinator,
    pub use_cases: UseCases,
}

/// Container for the record store ports.
pub struct Repositories {
    pub campaign: Arc<dyn CampaignRepo>,
    pub ship: Arc<dyn ShipRepo>,
    pub star_map: Arc<dyn StarMap>,
}

impl Repositories {
    /// In-memory stores filled from seed records.
    pub fn from_seed(seed: SeedData) -> Self {
        let (campaign, ship, star_map) = seed.into_stores();
        Self {
            campaign: Arc::new(campaign),
            ship: Arc::new(ship),
            star_map: Arc::new(star_map),
        }
    }
}

/// Container for all use cases.
pub struct UseCases {
    pub time: use_cases::TimeUseCases,
    pub jump: use_cases::JumpUseCases,
    pub fuel: Arc<use_cases::FuelProcessing>,
}

impl App {
    /// Create a new App with all dependencies wired up.
    pub fn new(
        repositories: Repositories,
        clock: Arc<dyn ClockPort>,
        settings: &EngineSettings,
    ) -> Self {
        let coordinator =
            TimeCoordinator::new(repositories.campaign.clone(), clock, settings.clock);

        // Jump travel first (needed by time advance)
        let travel = Arc::new(use_cases::jump::JumpTravel::new(
            repositories.ship.clone(),
            repositories.campaign.clone(),
            repositories.star_map.clone(),
            coordinator.clone(),
            settings.jump_rules,
        ));
        let jump = use_cases::JumpUseCases::new(
            travel.clone(),
            Arc::new(use_cases::jump::VerifyPosition::new(
                repositories.ship.clone(),
                coordinator.clone(),
            )),
        );

        let time = use_cases::TimeUseCases::new(Arc::new(use_cases::time::AdvanceTime::new(
            coordinator.clone(),
            travel,
        )));

        let fuel = Arc::new(use_cases::FuelProcessing::new(repositories.ship.clone()));

        Self {
            repositories,
            coordinator,
            use_cases: UseCases { time, jump, fuel },
        }
    }

    /// Register the standard interval callbacks for a campaign.
    pub fn attach_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<CallbackHandle>, CoordinatorError> {
        let fuel =
            use_cases::FuelProcessing::register(&self.use_cases.fuel, &self.coordinator, campaign_id)?;
        tracing::info!(campaign_id = %campaign_id, "Attached campaign clock callbacks");
        Ok(vec![fuel])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::SystemClock;
    use crate::infrastructure::settings::ClockSettings;
    use crate::use_cases::time::AdvanceOptions;
    use crate::use_cases::jump::InitiateOutcome;
    use std::time::Duration;
    use wayfarer_domain::{Campaign, FuelPool, JumpDestination, Ship, SystemLocation};

    #[tokio::test]
    async fn wired_app_runs_a_session() {
        let campaign = Campaign::new(
            "Spinward Run",
            "1105-001 08:00".parse().expect("valid date"),
            SystemLocation::at("Regina", "Spinward Marches", "1910"),
        )
        .expect("valid campaign");
        let campaign_id = campaign.id();
        let ship = Ship::new(campaign_id, "Annic Nova", 100, 2)
            .expect("valid ship")
            .with_fuel(FuelPool::new(40.0, 0.0, 40.0).expect("valid fuel"))
            .with_fuel_processor(1.0);
        let ship_id = ship.id();

        let seed = SeedData {
            campaigns: vec![campaign],
            ships: vec![ship],
            systems: vec![SystemLocation::at("Efate", "Spinward Marches", "1705")],
        };
        let settings = EngineSettings {
            clock: ClockSettings {
                debounce_window: Duration::ZERO,
                ..ClockSettings::default()
            },
            ..EngineSettings::default()
        };
        let app = App::new(
            Repositories::from_seed(seed),
            Arc::new(SystemClock::new()),
            &settings,
        );
        let _handles = app.attach_campaign(campaign_id).expect("attach");

        // Two hours of refining before departure
        let result = app
            .use_cases
            .time
            .advance
            .execute(campaign_id, 120, AdvanceOptions::default())
            .await
            .expect("advance");
        assert_eq!(result.outcome.version(), 1);
        let docked = app.repositories.ship.get(ship_id).await.expect("get").expect("ship");
        assert_eq!(docked.fuel().processed(), 2.0);

        let outcome = app
            .use_cases
            .jump
            .travel
            .initiate(ship_id, JumpDestination::named("Efate"), 1)
            .await
            .expect("initiate");
        assert!(matches!(outcome, InitiateOutcome::Started(_)));

        // A week in jump space refines nothing
        let result = app
            .use_cases
            .time
            .advance
            .execute(campaign_id, 168 * 60, AdvanceOptions::default())
            .await
            .expect("advance");
        assert_eq!(result.due_transits.len(), 1);
        let in_jump = app.repositories.ship.get(ship_id).await.expect("get").expect("ship");
        assert_eq!(in_jump.fuel().unrefined(), 38.0);

        app.use_cases.jump.travel.complete(ship_id).await.expect("complete");
        assert!(app
            .use_cases
            .jump
            .verify_position
            .execute(ship_id)
            .await
            .expect("verify"));

        let campaign = app
            .repositories
            .campaign
            .get(campaign_id)
            .await
            .expect("get")
            .expect("campaign");
        assert_eq!(campaign.location().name, "Efate");
        assert_eq!(campaign.current_date().to_string(), "1105-008 10:00");
    }
}
