use colored::Colorize;
use fleetflow_cloud::{Attribute, Lifecycle, Schema};
use fleetflow_cloud_exoscale::default_registry;

/// リソース型とデータソース型のスキーマを表示する
pub fn handle(resource_type: Option<&str>, data: bool) -> anyhow::Result<()> {
    let registry = default_registry();

    let Some(resource_type) = resource_type else {
        println!("{}", "リソース:".bold());
        for name in registry.resource_types() {
            println!("  {}", name.cyan());
        }
        println!("{}", "データソース:".bold());
        for name in registry.data_source_types() {
            println!("  {}", name.cyan());
        }
        return Ok(());
    };

    let schema = if data {
        registry.data_source_schema(resource_type)?
    } else {
        registry.resource(resource_type)?.schema()
    };

    let kind = if data { "data" } else { "resource" };
    println!("{} {}", kind, resource_type.cyan().bold());
    print_schema(&schema);
    Ok(())
}

fn mode(attribute: &Attribute) -> &'static str {
    if attribute.required {
        "required"
    } else if attribute.is_computed_only() {
        "computed"
    } else {
        "optional"
    }
}

fn print_schema(schema: &Schema) {
    if !schema.description.is_empty() {
        println!("  {}", schema.description.dimmed());
    }
    println!();

    for (key, attribute) in &schema.attributes {
        let mut flags = vec![mode(attribute).to_string()];
        if attribute.force_new {
            flags.push("force-new".into());
        }
        if let Some(default) = &attribute.default {
            flags.push(format!("default={}", default));
        }
        if !attribute.conflicts_with.is_empty() {
            flags.push(format!("conflicts={}", attribute.conflicts_with.join(",")));
        }

        println!(
            "  {} ({}) [{}]",
            key.green(),
            attribute.kind,
            flags.join(", ")
        );
        if !attribute.description.is_empty() {
            println!("      {}", attribute.description);
        }
        if let Some(message) = &attribute.deprecated {
            println!("      {} {}", "非推奨:".yellow(), message);
        }
    }
}
