//! Commands that only read driver declarations

use super::{Context, DRIVERS, parse_pairs};
use crate::output::{header, print_json};
use colored::Colorize;
use nimbus_driver::{Collection, ProfilePredicate};
use serde_json::json;

pub fn drivers(json: bool) -> anyhow::Result<()> {
    if json {
        let drivers: Vec<_> = DRIVERS
            .iter()
            .map(|(name, display)| json!({ "name": name, "display_name": display }))
            .collect();
        return print_json(&drivers);
    }

    header(&format!("{:<12} {:<20}", "NAME", "DISPLAY NAME"), 32);
    for (name, display) in DRIVERS {
        println!("{:<12} {:<20}", name.cyan(), display);
    }
    Ok(())
}

pub fn profiles(ctx: &Context, filters: &[String]) -> anyhow::Result<()> {
    let predicate = ProfilePredicate::from_options(parse_pairs(filters)?);
    let profiles = ctx.dispatcher.hardware_profiles(&predicate);

    if ctx.json {
        return print_json(&profiles);
    }
    if profiles.is_empty() {
        println!("{}", "No hardware profiles match".dimmed());
        return Ok(());
    }

    for profile in profiles {
        println!("{}", profile.name.bold());
        for property in &profile.properties {
            let default = property
                .default_value()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {:<14} {:<6} {:<36} default {}",
                property.name,
                property.unit(),
                describe_domain(&property.domain),
                default
            );
        }
    }
    Ok(())
}

fn describe_domain(domain: &nimbus_driver::Domain) -> String {
    use nimbus_driver::Domain;
    match domain {
        Domain::Fixed { values } => values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", "),
        Domain::Range { min, max } => format!("{}..{}", min, max),
        Domain::Stepped { min, max, step } => format!("{}..{} step {}", min, max, step),
    }
}

pub fn features(ctx: &Context) -> anyhow::Result<()> {
    let declarations = ctx.dispatcher.declarations();
    let capabilities = declarations.capabilities();

    if ctx.json {
        let document: serde_json::Map<String, serde_json::Value> = Collection::ALL
            .iter()
            .filter(|c| ctx.dispatcher.has_capability(**c))
            .map(|c| {
                let features: serde_json::Map<String, serde_json::Value> = capabilities
                    .features(*c)
                    .into_iter()
                    .map(|f| {
                        let constraints = capabilities.constraints_for(*c, f);
                        (f.to_string(), json!(constraints))
                    })
                    .collect();
                (c.to_string(), serde_json::Value::Object(features))
            })
            .collect();
        return print_json(&document);
    }

    for collection in Collection::ALL {
        if !ctx.dispatcher.has_capability(collection) {
            continue;
        }
        println!("{}", collection.to_string().bold());
        let features = capabilities.features(collection);
        if features.is_empty() {
            println!("  {}", "(none)".dimmed());
        }
        for feature in features {
            let constraints = capabilities.constraints_for(collection, feature);
            if constraints.is_empty() {
                println!("  {}", feature.cyan());
            } else {
                let details: Vec<String> = constraints
                    .iter()
                    .map(|(key, value)| format!("{}={}", key, value))
                    .collect();
                println!("  {} ({})", feature.cyan(), details.join(", "));
            }
        }
    }
    Ok(())
}

pub fn states(ctx: &Context, collection: Collection) -> anyhow::Result<()> {
    let states = ctx.dispatcher.states(collection)?;

    if ctx.json {
        return print_json(&states);
    }

    for state in states {
        let mut label = state.name.bold().to_string();
        if state.initial {
            label.push_str(&" (initial)".dimmed().to_string());
        }
        if state.terminal {
            label.push_str(&" (terminal)".dimmed().to_string());
        }
        println!("{}", label);
        for transition in state.transitions {
            let trigger = match &transition.action {
                Some(action) => action.cyan().to_string(),
                None => "automatically".yellow().to_string(),
            };
            println!("  → {} {}", transition.to, trigger);
        }
    }
    Ok(())
}
