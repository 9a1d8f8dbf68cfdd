//! Descriptor document codec.
//!
//! Writes the `plugin.xml` shape consumed by the build host and reads it
//! back. Element order is fixed so that re-serializing a document produced
//! here yields identical bytes. The reader also accepts documents written
//! by older generators that placed a parameter's `<since>` next to the
//! `<parameter>` element instead of inside it.

mod reader;
pub mod xml_writer;

use crate::error::Result;
use crate::types::{DescriptorEntry, ParameterEntry, PluginDescriptor};
use xml_writer::XmlWriter;

pub use reader::deserialize;

/// Which consumer the document is written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFlavor {
    /// Everything the build host needs to configure and run the goals
    #[default]
    Full,
    /// The subset the help goal renders: editable parameters only, goals
    /// sorted by name, no component requirements
    Help,
}

pub fn serialize(descriptor: &PluginDescriptor, flavor: DocumentFlavor) -> String {
    let mut writer = XmlWriter::new();
    let plugin = &descriptor.plugin;

    writer.start("plugin");
    writer.optional("name", plugin.name.as_deref());
    writer.optional("description", plugin.description.as_deref());
    writer.element("groupId", &plugin.group_id);
    writer.element("artifactId", &plugin.artifact_id);
    writer.element("version", &plugin.version);
    writer.element("goalPrefix", &plugin.effective_goal_prefix());
    writer.flag("isolatedRealm", plugin.isolated_realm);
    writer.flag("inheritedByDefault", plugin.inherited_by_default);

    let mut goals: Vec<&DescriptorEntry> = descriptor.goals.iter().collect();
    if flavor == DocumentFlavor::Help {
        goals.sort_by(|a, b| a.goal.cmp(&b.goal));
    }

    if !goals.is_empty() {
        writer.start("mojos");
        for entry in goals {
            write_entry(&mut writer, entry, flavor);
        }
        writer.end();
    }
    writer.end();
    writer.finish()
}

/// Parse a document and write it again
pub fn normalize(xml: &str, flavor: DocumentFlavor) -> Result<String> {
    Ok(serialize(&deserialize(xml)?, flavor))
}

fn write_entry(writer: &mut XmlWriter, entry: &DescriptorEntry, flavor: DocumentFlavor) {
    writer.start("mojo");
    writer.element("goal", &entry.goal);
    writer.optional("description", entry.description.as_deref());
    writer.optional("phase", entry.phase.as_deref());
    if let Some(execute) = &entry.execute {
        writer.optional("executePhase", execute.phase.as_deref());
        writer.optional("executeGoal", execute.goal.as_deref());
        writer.optional("executeLifecycle", execute.lifecycle.as_deref());
    }
    if let Some(scope) = entry.dependency_resolution {
        writer.element("requiresDependencyResolution", scope.id());
    }
    if let Some(scope) = entry.dependency_collection {
        writer.element("requiresDependencyCollection", scope.id());
    }
    writer.flag("requiresDirectInvocation", entry.direct_invocation_only);
    writer.flag("requiresProject", entry.project_required);
    writer.flag("requiresReports", entry.reports_required);
    writer.flag("aggregator", entry.aggregator);
    writer.flag("requiresOnline", entry.online_required);
    writer.flag("inheritedByDefault", entry.inherited_by_default);
    writer.flag("threadSafe", entry.thread_safe);
    writer.element("implementation", &entry.implementation);
    writer.element("language", &entry.language);
    writer.optional("configurator", entry.configurator.as_deref());
    writer.optional("composer", entry.composer.as_deref());
    writer.element("instantiationStrategy", &entry.instantiation_strategy);
    writer.element("executionStrategy", &entry.execution_strategy);
    writer.optional("since", entry.since.as_deref());
    writer.optional("deprecated", entry.deprecated.as_deref());

    let parameters: Vec<&ParameterEntry> = match flavor {
        DocumentFlavor::Full => entry.parameters.iter().collect(),
        DocumentFlavor::Help => entry.editable_parameters().collect(),
    };

    if !parameters.is_empty() {
        writer.start("parameters");
        for parameter in &parameters {
            write_parameter(writer, parameter);
        }
        writer.end();
    }

    // Some consumers only read this block, so defaults never live in <parameters>
    let configured: Vec<&&ParameterEntry> = parameters
        .iter()
        .filter(|p| p.default_value.is_some() || p.expression.is_some())
        .collect();
    if !configured.is_empty() {
        writer.start("configuration");
        for parameter in configured {
            let mut attributes = vec![("implementation", parameter.erased_type())];
            if let Some(default_value) = parameter.default_value.as_deref() {
                attributes.push(("default-value", default_value));
            }
            writer.element_with_attributes(
                &parameter.name,
                &attributes,
                parameter.expression.as_deref(),
            );
        }
        writer.end();
    }

    if flavor == DocumentFlavor::Full && !entry.requirements.is_empty() {
        writer.start("requirements");
        for requirement in &entry.requirements {
            writer.start("requirement");
            writer.element("role", &requirement.role);
            writer.element("role-hint", &requirement.role_hint);
            writer.element("field-name", &requirement.field_name);
            writer.end();
        }
        writer.end();
    }
    writer.end();
}

fn write_parameter(writer: &mut XmlWriter, parameter: &ParameterEntry) {
    writer.start("parameter");
    writer.element("name", &parameter.name);
    writer.optional("alias", parameter.alias.as_deref());
    writer.element("type", &parameter.type_name);
    writer.optional("since", parameter.since.as_deref());
    writer.optional("deprecated", parameter.deprecated.as_deref());
    writer.optional("implementation", parameter.implementation.as_deref());
    writer.flag("required", parameter.required);
    writer.flag("editable", !parameter.read_only);
    writer.optional("description", parameter.description.as_deref());
    writer.end();
}
