use crate::output::{print_json, print_table};
use crate::ListArgs;
use catalog_core::query::SubagentFilter;
use std::path::Path;

impl ListArgs {
    fn into_filter(self) -> SubagentFilter {
        SubagentFilter {
            category: self.category,
            technologies: self.technologies,
            experience_level: self.level,
            complexity: self.complexity,
            search: self.search,
            sort_by: self.sort,
            sort_order: self.order,
            page: self.page,
            limit: self.limit,
        }
    }
}

pub fn run(root: &Path, args: ListArgs, json: bool) -> anyhow::Result<()> {
    let catalog = super::open_catalog(root)?;
    let result = catalog.query(&args.into_filter())?;

    if json {
        return print_json(&result);
    }

    if result.subagents.is_empty() {
        println!("No subagents match.");
        return Ok(());
    }

    let rows = result
        .subagents
        .iter()
        .map(|r| {
            vec![
                r.id.clone(),
                r.category.display_name.clone(),
                r.experience_level.to_string(),
                r.complexity.to_string(),
                r.technologies.join(", "),
            ]
        })
        .collect();
    print_table(
        &["ID", "CATEGORY", "LEVEL", "COMPLEXITY", "TECHNOLOGIES"],
        rows,
    );
    println!(
        "\npage {}/{} ({} total)",
        result.page,
        result.total_pages.max(1),
        result.total
    );
    Ok(())
}
