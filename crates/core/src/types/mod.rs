pub mod descriptor;
pub mod dialect;
pub mod group_key;
pub mod marker;

// Re-export commonly used types
pub use descriptor::{
    DependencyRequirement, DescriptorEntry, ExecuteTrigger, ParameterEntry, PluginDescriptor,
    PluginInfo, ResolutionScope, default_goal_prefix,
};
pub use dialect::Dialect;
pub use group_key::GroupKey;
pub use marker::{
    ClassMarker, DependencyMarker, ExecuteMarker, GoalMarker, MarkerRecord, MemberKind,
    MemberMarker, ParameterMarker,
};
