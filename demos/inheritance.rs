//! Datapoint Inheritance Example
//!
//! Builds a small experiment tree, shares baseline datapoints from a parent
//! dataset, and shows how a stale instance catches up after a reload.
//!
//! Run with: RUST_LOG=hards=debug cargo run --example inheritance

use hards::{Database, HasData, HasDatasets, HasFiles, TreeNode};
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== HARDS Datapoint Inheritance ===\n");

    let scratch = tempfile::tempdir()?;
    let db = Database::create(scratch.path().join("experiments"))?;

    // -------------------------------------------------------------------------
    // 1. An experiment with a shared baseline
    // -------------------------------------------------------------------------
    println!("1. Creating experiment with baseline datapoints...");

    let exp1 = db.create_dataset("exp1")?;
    exp1.add_data([
        ("model", json!("resnet50")),
        ("learning_rate", json!(0.001)),
    ])?;

    let baseline = exp1.create_datapoint("p1")?;
    baseline.add_data([("accuracy", json!(0.71))])?;

    let config = scratch.path().join("config.toml");
    std::fs::write(&config, "epochs = 10\n")?;
    exp1.add_file(&config, None)?;

    println!("   Dataset: {}", exp1.fullname());
    println!("   Metadata: {}", serde_json::to_string(&exp1.data())?);
    println!("   Files: {:?}", exp1.files());

    // -------------------------------------------------------------------------
    // 2. A run that inherits the baseline
    // -------------------------------------------------------------------------
    println!("\n2. Creating run...");

    let run1 = exp1.create_dataset("run1")?;
    run1.create_datapoint("p2")?
        .add_data([("accuracy", json!(0.78))])?;

    for datapoint in run1.inherited_datapoints()? {
        println!(
            "   {:<14} accuracy={}",
            datapoint.fullname(),
            datapoint.get_data("accuracy").unwrap_or_default()
        );
    }

    // -------------------------------------------------------------------------
    // 3. Staleness and reload
    // -------------------------------------------------------------------------
    println!("\n3. Adding a datapoint through a second instance...");

    let other_exp1 = db.resolve_dataset("exp1")?;
    other_exp1.create_datapoint("p0")?;

    let stale = run1.collect_datapoints(true, false)?;
    let fresh = run1.collect_datapoints(true, true)?;
    println!("   Without reload: {} datapoints", stale.len());
    println!("   With reload:    {} datapoints", fresh.len());

    let file = db.resolve_dataset("exp1")?.get_file("config.toml")?;
    println!("\n   Managed copy: {}", serde_json::to_string(&file.record()?)?);

    println!("\n=== Done ===");
    Ok(())
}
