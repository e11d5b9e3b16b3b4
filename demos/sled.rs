//! Walks a drug from registration to recall against an on-disk sled ledger.
//!
//! ```text
//! RUST_LOG=drug_provenance=debug cargo run --example sled
//! ```

use anyhow::Context;
use drug_provenance::{
    clock::SystemClock, config::EngineConfig, drug::DrugRegistration, events::TracingEvents,
    service::DrugLedger, store::SledStore, utils,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "drug_provenance=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EngineConfig::load().context("failed to load engine configuration")?;
    let db = sled::open(&config.db_path)
        .with_context(|| format!("failed to open ledger at {}", config.db_path.display()))?;
    tracing::info!(path = %config.db_path.display(), "ledger opened");

    let ledger = DrugLedger::new(
        SledStore::new(Arc::new(db)),
        &config,
        Arc::new(SystemClock),
        Arc::new(TracingEvents),
    );

    let manufacturer = config.manufacturer_role.to_string();
    let regulator = config.regulator_role.to_string();
    let drug_id = utils::new_drug_id("drug")?;

    ledger.register_drug(
        &manufacturer,
        DrugRegistration::new(&drug_id)
            .set_name("Paracetamol")
            .set_batch_number("B100")
            .set_mfg_date("2024-01-01")
            .set_expiry_date("2026-01-01")
            .set_composition("500mg"),
    )?;
    ledger.ship_drug(&manufacturer, &drug_id, "MedlifeMSP")?;
    ledger.receive_drug("MedlifeMSP", &drug_id)?;
    ledger.ship_drug("MedlifeMSP", &drug_id, "ApolloMSP")?;
    ledger.receive_drug("ApolloMSP", &drug_id)?;
    ledger.recall_drug(&regulator, &drug_id, "contamination found in batch B100")?;

    if let Err(err) = ledger.ship_drug("ApolloMSP", &drug_id, "MedlifeMSP") {
        tracing::info!(error = %err, "recalled drug stays put");
    }

    let drug = ledger.track_drug("ApolloMSP", &drug_id)?;
    println!(
        "{} ({}) owner={} status={} fingerprint={}",
        drug.id,
        drug.name,
        drug.current_owner,
        drug.status,
        drug.fingerprint()?
    );
    for row in drug.view_history() {
        println!("  {row}");
    }
    for note in &drug.inspection_notes {
        println!("  note: {note}");
    }

    Ok(())
}
