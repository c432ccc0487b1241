use crate::output::print_json;
use std::path::Path;

pub fn run(root: &Path, id: &str, content: bool, json: bool) -> anyhow::Result<()> {
    let catalog = super::open_catalog(root)?;

    if content {
        let text = catalog.content(id)?;
        if json {
            return print_json(&serde_json::json!({ "id": id, "content": text }));
        }
        print!("{text}");
        return Ok(());
    }

    let r = catalog.subagent(id)?;
    if json {
        return print_json(&r);
    }

    println!("{} ({})", r.title, r.id);
    println!("{}", r.description);
    println!();
    println!("Category:     {}", r.category.display_name);
    println!("Level:        {}", r.experience_level);
    println!("Complexity:   {}", r.complexity);
    if let Some(model) = &r.model {
        println!("Model:        {model}");
    }
    if !r.technologies.is_empty() {
        println!("Technologies: {}", r.technologies.join(", "));
    }
    if !r.integrations.is_empty() {
        println!("Works with:   {}", r.integrations.join(", "));
    }
    println!("Path:         {}", r.relative_path);

    if !r.when_to_use.is_empty() {
        println!("\nWhen to use:");
        for item in &r.when_to_use {
            println!("  - {item}");
        }
    }
    if !r.what_to_do_next.is_empty() {
        println!("\nNext steps:");
        for item in &r.what_to_do_next {
            println!("  - {item}");
        }
    }
    Ok(())
}
