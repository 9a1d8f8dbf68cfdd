use mojo_tools_core::{PluginDescriptor, report::PluginOverview};

pub fn print_descriptor_summary(descriptor: &PluginDescriptor) {
    println!("🔍 Plugin: {}", descriptor.plugin.display_id());
    println!("{}", "=".repeat(80));
    for entry in &descriptor.goals {
        println!(
            "   🎯 {}:{} ({}, {} parameter{})",
            descriptor.plugin.effective_goal_prefix(),
            entry.goal,
            entry.implementation,
            entry.parameters.len(),
            if entry.parameters.len() == 1 { "" } else { "s" }
        );
    }
}

pub fn print_overview(overview: &PluginOverview) {
    print!("{}", format_overview(overview));
}

/// One block per goal with an indented line per configurable parameter
pub fn format_overview(overview: &PluginOverview) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "📦 {} (prefix: {})\n",
        overview
            .plugin
            .name
            .clone()
            .unwrap_or_else(|| overview.plugin.display_id()),
        overview.goal_prefix
    ));
    out.push_str(&"=".repeat(80));
    out.push('\n');

    for goal in &overview.goals {
        out.push_str(&format!("{}\n", goal.invocation));
        if let Some(summary) = &goal.summary {
            out.push_str(&format!("   {}\n", summary));
        }
        if let Some(phase) = &goal.phase {
            out.push_str(&format!("   Phase: {}\n", phase));
        }
        if let Some(reason) = &goal.deprecated {
            out.push_str(&format!("   ⚠️  Deprecated: {}\n", reason));
        }

        for parameter in &goal.parameters {
            let mut line = format!("   - {}: {}", parameter.name, parameter.short_type);
            if parameter.required {
                line.push_str(" (required)");
            }
            if let Some(default_value) = &parameter.default_value {
                line.push_str(&format!(" [default: {}]", default_value));
            }
            if let Some(property) = &parameter.property {
                line.push_str(&format!(" [property: {}]", property));
            }
            if let Some(since) = &parameter.since {
                line.push_str(&format!(" [since: {}]", since));
            }
            if let Some(link) = &parameter.link {
                line.push_str(&format!(" <{}>", link));
            }
            out.push_str(&line);
            out.push('\n');
        }
        out.push('\n');
    }
    out
}
