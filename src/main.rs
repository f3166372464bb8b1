//! Lead qualifier - conversational lead qualification agent
//!
//! Walks inbound leads through consent and a short questionnaire, records
//! outcomes to CSV, and nudges leads that go quiet.

mod config;
mod llm;
mod messages;
mod runtime;
mod state_machine;
mod store;

use config::AgentConfig;
use futures::StreamExt;
use llm::LlmConfig;
use messages::{FallbackMessages, LlmMessageSource, StaticMessages};
use runtime::{AgentError, FollowUpScheduler, FollowUpStream, MessageSource, ProductionAgent};
use std::sync::Arc;
use store::CsvRecordStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lead_qualifier=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = AgentConfig::from_env()?;

    tracing::info!(path = %config.leads_path.display(), "Initializing lead record store");
    let record_store = CsvRecordStore::create(&config.leads_path)?;

    let llm_config = LlmConfig::from_env();
    let source: Arc<dyn MessageSource> = match llm_config.build_service()? {
        Some(llm) => {
            tracing::info!(model = %llm.model_id(), "Message generator initialized");
            Arc::new(LlmMessageSource::new(llm))
        }
        None => {
            tracing::warn!("No LLM API key configured. Set GEMINI_API_KEY or LLM_GATEWAY; using canonical messages.");
            Arc::new(StaticMessages)
        }
    };
    let messages = FallbackMessages::new(source).with_timeout(config.generation_timeout);

    let agent: Arc<ProductionAgent> = Arc::new(runtime::LeadAgent::new(
        config.context(),
        config.idle_threshold,
        record_store,
        messages,
    ));

    // Three leads talk to the agent at once
    let demo = [
        ("Alice", &["Yes", "34", "Brazil", "Managed Databases"][..]),
        ("Bob", &["No"][..]),
        ("Charlie", &["Sure", "45"][..]),
    ];
    let conversations = demo.into_iter().map(|(name, replies)| {
        let agent = Arc::clone(&agent);
        let lead_id = uuid::Uuid::new_v4().to_string();
        async move { run_conversation(&agent, &lead_id, name, replies).await }
    });
    futures::future::try_join_all(conversations).await?;

    // Watch for idle leads for one threshold plus the buffer
    let window = config.follow_up_window();
    tracing::info!(window_secs = window.as_secs(), "Watching for idle leads");
    let mut follow_ups: FollowUpStream = FollowUpScheduler::spawn(Arc::clone(&agent), config.tick);
    follow_ups.stop_after(window);

    // Ctrl-C ends the window early
    let interrupt = follow_ups.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, stopping follow-ups");
            interrupt.cancel();
        }
    });

    while let Some(item) = follow_ups.next().await {
        let follow_up = item?;
        println!("[follow-up] {follow_up}");
    }
    follow_ups.shutdown().await;

    let records = store::read_records(&config.leads_path)?;
    tracing::info!(
        path = %config.leads_path.display(),
        leads = agent.registry().len().await,
        records = records.len(),
        "Lead qualification run finished"
    );

    Ok(())
}

/// Open a lead, then feed it each reply in order
async fn run_conversation(
    agent: &ProductionAgent,
    lead_id: &str,
    name: &str,
    replies: &[&str],
) -> Result<(), AgentError> {
    let greeting = agent.handle_interaction(lead_id, "", name).await?;
    println!("[{name}] agent: {greeting}");

    for reply in replies {
        println!("[{name}] lead: {reply}");
        let response = agent.handle_interaction(lead_id, reply, name).await?;
        println!("[{name}] agent: {response}");
    }

    if let Some(state) = agent.snapshot(lead_id).await {
        tracing::info!(
            lead_id = %lead_id,
            status = %state.status,
            answered = state.current_question_index,
            "Demo conversation finished"
        );
    }
    Ok(())
}
