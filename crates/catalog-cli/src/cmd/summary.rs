use crate::output::{print_json, print_table};
use std::path::Path;

pub fn categories(root: &Path, json: bool) -> anyhow::Result<()> {
    let catalog = super::open_catalog(root)?;
    let categories = catalog.categories()?;
    if json {
        return print_json(&categories);
    }
    let rows = categories
        .iter()
        .map(|c| {
            vec![
                c.category.id.clone(),
                c.category.display_name.clone(),
                c.category.source_directory.clone(),
                c.count.to_string(),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "DIRECTORY", "COUNT"], rows);
    Ok(())
}

pub fn technologies(root: &Path, json: bool) -> anyhow::Result<()> {
    let catalog = super::open_catalog(root)?;
    let technologies = catalog.technologies()?;
    if json {
        return print_json(&technologies);
    }
    if technologies.is_empty() {
        println!("No technologies indexed.");
        return Ok(());
    }
    let rows = technologies
        .iter()
        .map(|t| vec![t.name.clone(), t.count.to_string()])
        .collect();
    print_table(&["TECHNOLOGY", "COUNT"], rows);
    Ok(())
}
