use std::sync::Arc;

use deskpilot_core::automation::CapabilityProvider;
use deskpilot_core::config::AppConfig;
use deskpilot_core::error::{CliError, ExecutorError};
use deskpilot_core::events::start_event_writer;
use deskpilot_core::generate::{MessageIntent, MessageTriage, TaskDecomposer};
use deskpilot_core::store::{ConversationStore, ConversationTurn};
use deskpilot_core::task::{TaskDecomposition, TaskExecutionResult};
use deskpilot_plugins::backend::{NativeProvider, WorkerProvider};
use deskpilot_plugins::factory;

use crate::commands::{PlanArgs, RunArgs};

/// Full pipeline: triage, decompose, execute. Ctrl-C cancels the running
/// task at the next step boundary instead of killing the process.
pub async fn run(args: RunArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let store = factory::build_store();
    let (text, vision) = factory::build_chat_models(cfg)?;

    store
        .append(ConversationTurn::user(args.instruction.clone()))
        .await;
    let turns = store.recent(10).await;

    if !args.force {
        let triage = MessageTriage::new(Arc::clone(&text), cfg.llm.max_attempts);
        if triage.classify(&turns).await == MessageIntent::Chat {
            println!(
                "This reads as conversation, not an automation task; nothing to execute. \
                 Re-run with --force to execute it anyway."
            );
            return Ok(0);
        }
    }

    let events = start_event_writer(&cfg.events);
    let supervisor = factory::build_supervisor(cfg, text, vision, events, store.clone()).await?;

    let plan = supervisor.decompose(&turns).await?;
    print_plan(&plan);
    if args.dry_run {
        return Ok(0);
    }

    let task_id = uuid::Uuid::new_v4().to_string();
    let mut handle = supervisor.execute(task_id.clone(), plan)?;

    let joined = tokio::select! {
        joined = &mut handle => joined,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("interrupt received, cancelling after the current step");
            supervisor.cancel(&task_id);
            (&mut handle).await
        }
    };
    let result = joined.map_err(|err| CliError::Anyhow(err.into()))?;
    tracing::info!(task_id = %result.task_id, state = %result.state, "task finished");

    print_result(&result);
    Ok(if result.success { 0 } else { 1 })
}

/// Decompose only; the plan goes to stdout as JSON for scripting.
pub async fn plan(args: PlanArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let (text, _vision) = factory::build_chat_models(cfg)?;
    let decomposer = TaskDecomposer::new(text, cfg.llm.max_attempts);
    let turns = vec![ConversationTurn::user(args.instruction.clone())];
    let plan = decomposer
        .decompose(&turns)
        .await
        .map_err(ExecutorError::Decomposition)?;
    let json = serde_json::to_string_pretty(&plan).map_err(|err| CliError::Anyhow(err.into()))?;
    println!("{json}");
    Ok(0)
}

/// Availability report for both capability providers.
pub async fn probe(cfg: &AppConfig) -> Result<i32, CliError> {
    let native = NativeProvider::new();
    let worker = WorkerProvider::discover(
        &cfg.automation.worker_paths,
        cfg.automation.worker_timeout_ms,
    );
    let native_ok = native.is_available().await;
    let worker_ok = worker.is_available().await;

    println!("native provider: {}", availability(native_ok));
    println!("worker provider: {}", availability(worker_ok));

    let selected = match (cfg.automation.prefer_native, native_ok, worker_ok) {
        (true, true, _) | (false, true, false) => Some("native"),
        (true, false, true) | (false, _, true) => Some("worker"),
        _ => None,
    };
    match selected {
        Some(name) => println!(
            "selected: {name} (prefer_native = {})",
            cfg.automation.prefer_native
        ),
        None => println!("no capability provider available"),
    }
    Ok(if selected.is_some() { 0 } else { 1 })
}

fn availability(ok: bool) -> &'static str {
    if ok {
        "available"
    } else {
        "unavailable"
    }
}

fn print_plan(plan: &TaskDecomposition) {
    println!("Task: {}", plan.description);
    println!(
        "  complexity {} | risk {} | ~{}s | {} steps",
        plan.task_type,
        plan.risk_level,
        plan.estimated_time_seconds,
        plan.steps.len()
    );
    for (index, step) in plan.steps.iter().enumerate() {
        let optional = if step.optional { ", optional" } else { "" };
        let grounded = if step.requires_screen_analysis {
            ", screen"
        } else {
            ""
        };
        println!(
            "  {:>2}. [{}{optional}{grounded}] {}",
            index + 1,
            step.step_type,
            step.description
        );
    }
    println!("Expected outcome: {}", plan.expected_outcome);
}

fn print_result(result: &TaskExecutionResult) {
    println!(
        "State: {} | success: {} | rate: {:.0}% | errors: {}",
        result.state,
        result.success,
        result.success_rate * 100.0,
        result.error_count
    );
    if !result.message.is_empty() {
        println!("{}", result.message);
    }
    for step in result.steps.iter().filter(|s| !s.success) {
        println!(
            "  step {} ({}) failed: {}",
            step.step_index + 1,
            step.step_type,
            step.error.as_deref().unwrap_or(&step.message)
        );
    }
}
