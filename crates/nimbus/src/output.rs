use colored::Colorize;
use nimbus_driver::Resource;
use serde::Serialize;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn header(columns: &str, width: usize) {
    println!("{}", columns.bold());
    println!("{}", "─".repeat(width).dimmed());
}

fn colored_state(state: &str) -> colored::ColoredString {
    match state {
        "running" | "available" => state.green(),
        "stopped" | "finish" | "deleted" => state.red(),
        "pending" | "stopping" | "creating" => state.yellow(),
        _ => state.normal(),
    }
}

pub fn resource_table(resources: &[Resource]) {
    if resources.is_empty() {
        println!("{}", "No resources found".dimmed());
        return;
    }

    header(
        &format!("{:<12} {:<12} {:<24} {:<30}", "ID", "STATE", "ACTIONS", "NAME"),
        80,
    );
    for resource in resources {
        let state = resource.state.as_deref().unwrap_or("-");
        let name = resource.get_attribute::<String>("name").unwrap_or_default();
        println!(
            "{:<12} {:<12} {:<24} {:<30}",
            resource.id,
            colored_state(state),
            resource.actions.join(","),
            name
        );
    }
}

pub fn resource_detail(resource: &Resource) {
    println!("{} {}", resource.collection.to_string().bold(), resource.id.cyan());
    if let Some(state) = &resource.state {
        println!("  {:<18} {}", "state", colored_state(state));
    }
    if !resource.actions.is_empty() {
        println!("  {:<18} {}", "actions", resource.actions.join(", "));
    }
    if let Some(owner) = &resource.owner_id {
        println!("  {:<18} {}", "owner_id", owner);
    }
    if let Some(created_at) = &resource.created_at {
        println!("  {:<18} {}", "created_at", created_at.to_rfc3339());
    }
    for (key, value) in &resource.attributes {
        let value = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        println!("  {:<18} {}", key, value);
    }
}
