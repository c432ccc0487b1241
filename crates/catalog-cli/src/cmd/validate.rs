use crate::output::{print_json, print_table};
use catalog_core::validator::BatchValidation;
use std::path::Path;

pub fn run(root: &Path, path: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let catalog = super::open_catalog(root)?;
    let batch = catalog.validate(path)?;

    if json {
        print_json(&summary_json(&batch))?;
        return Ok(());
    }

    if !batch.invalid.is_empty() {
        let rows = batch
            .invalid
            .iter()
            .map(|v| {
                vec![
                    v.file.file_path.clone(),
                    v.result.category.to_string(),
                    v.result.reason.clone(),
                ]
            })
            .collect();
        print_table(&["PATH", "CATEGORY", "REASON"], rows);
        println!();
    }
    println!(
        "{} files: {} valid, {} invalid",
        batch.stats.total, batch.stats.valid, batch.stats.invalid
    );
    Ok(())
}

fn summary_json(batch: &BatchValidation) -> serde_json::Value {
    let invalid: Vec<serde_json::Value> = batch
        .invalid
        .iter()
        .map(|v| {
            serde_json::json!({
                "path": v.file.file_path,
                "category": v.result.category,
                "reason": v.result.reason,
            })
        })
        .collect();
    let valid: Vec<&str> = batch
        .valid
        .iter()
        .map(|v| v.file.file_path.as_str())
        .collect();
    serde_json::json!({
        "stats": batch.stats,
        "valid": valid,
        "invalid": invalid,
    })
}
