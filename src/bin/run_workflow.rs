//! Demo workflow against the live service
//!
//! Creates a project, predicts a route for an example molecule, turns the
//! best path into a synthesis, fixes up drying steps, launches it and saves
//! the analysis reports. Reports go to the directory given as first argument
//! (default `reports`).

use anyhow::Context;
use rxn_orchestrator::models::{Action, Parameter, PredictionStatus};
use rxn_orchestrator::polling::{PollOutcome, PollPolicy};
use rxn_orchestrator::workflow::{PathSelection, PlanCache, SynthesisWorkflow};
use rxn_orchestrator::{Config, RxnClient};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

const DEMO_PRODUCT: &str = "CC(=O)NC1=CC=C(Br)C=C1";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load configuration
    let config = Config::from_env();
    info!("Configuration loaded: {:?}", config);
    let report_dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("reports"));

    let mut client = RxnClient::new(&config).context("Failed to build client")?;
    let mut policy = PollPolicy::from_config(&config);
    policy.acquire().await;
    let project = client.create_project("demo").await?;
    info!("Created project {} ({})", project.name, project.id);

    let mut workflow = SynthesisWorkflow::new(&client, policy);

    let prediction = match workflow
        .plan_route(DEMO_PRODUCT, &config.prediction.model_id)
        .await?
    {
        PollOutcome::Finished(prediction) => prediction,
        PollOutcome::GaveUp { last, attempts } => {
            anyhow::bail!(
                "Prediction {} still {} after {} polls",
                last.prediction_id,
                last.status,
                attempts
            );
        }
    };
    if prediction.status != PredictionStatus::Success {
        anyhow::bail!(
            "Prediction {} ended with status {}",
            prediction.prediction_id,
            prediction.status
        );
    }
    info!(
        "Prediction {} returned {} paths",
        prediction.prediction_id,
        prediction.retrosynthetic_paths.len()
    );

    let path = SynthesisWorkflow::<RxnClient>::select_path(&prediction, PathSelection::Best)?;
    let plan = workflow.prepare_synthesis(path).await?;
    let synthesis_id = plan.synthesis_id.clone();

    // Drying steps need an explicit duration before the robot accepts them
    let mut cache = PlanCache::new(&client);
    for node in plan.tree.dependency_order() {
        let mut actions = node.actions.clone();
        let mut changed = false;
        for action in actions.iter_mut() {
            if matches!(action, Action::DrySolution { duration: None, .. }) {
                action.set_parameter("duration", Parameter::new(30).with_unit("minute"));
                changed = true;
            }
        }
        if changed {
            workflow.acquire_request().await;
            cache
                .update_node_actions(&synthesis_id, &node.id, &actions)
                .await
                .with_context(|| format!("Failed to update actions of node {}", node.id))?;
            info!("Updated drying steps of node {}", node.id);
        }
    }
    workflow.acquire_request().await;
    let plan = cache.plan(&synthesis_id).await?;
    info!(
        "Synthesis {} has {} actions over {} reactions",
        plan.synthesis_id,
        plan.actions.len(),
        plan.reactions.len()
    );

    let (execution_id, outcome) = workflow.launch_and_wait(&synthesis_id).await?;
    match outcome {
        PollOutcome::Finished(status) => info!("Execution {} ended: {}", execution_id, status),
        PollOutcome::GaveUp { last, attempts } => {
            warn!(
                "Execution {} still {} after {} polls, collecting available reports",
                execution_id, last, attempts
            );
        }
    }

    let saved = workflow.collect_reports(&execution_id, &report_dir).await?;
    if saved.is_empty() {
        info!("No analysis reports available yet");
    }
    for path in &saved {
        info!("Report saved to {}", path.display());
    }

    Ok(())
}
