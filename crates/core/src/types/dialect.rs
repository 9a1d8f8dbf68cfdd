use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::GroupKey;
use crate::error::Error;
use crate::impl_deserialize_from_str;

/// Source dialects a goal can be declared in. Each dialect maps to one
/// extraction backend in the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub enum Dialect {
    /// Annotations read from compiled class files
    Annotations,
    /// Doc-comment tags in Java sources
    Javadoc,
    /// Ant build scripts described by `*.mojos.xml` metadata
    Ant,
    /// Beanshell scripts carrying doc-comment tags
    Beanshell,
}

impl Dialect {
    pub const ALL: [Dialect; 4] = [
        Dialect::Annotations,
        Dialect::Javadoc,
        Dialect::Ant,
        Dialect::Beanshell,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Dialect::Annotations => "java-annotations",
            Dialect::Javadoc => "java-javadoc",
            Dialect::Ant => "ant",
            Dialect::Beanshell => "bsh",
        }
    }

    /// Value written to the `language` element of each goal
    pub fn language(&self) -> &'static str {
        match self {
            Dialect::Annotations | Dialect::Javadoc => "java",
            Dialect::Ant => "ant-mojo",
            Dialect::Beanshell => "bsh",
        }
    }

    pub fn group_key(&self) -> GroupKey {
        match self {
            Dialect::Annotations => GroupKey::primary(100),
            Dialect::Javadoc => GroupKey::primary(200),
            Dialect::Ant => GroupKey::new("ant", 100),
            Dialect::Beanshell => GroupKey::new("bsh", 100),
        }
    }

    pub fn is_deprecated(&self) -> bool {
        !matches!(self, Dialect::Annotations)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl From<Dialect> for String {
    fn from(dialect: Dialect) -> Self {
        dialect.id().to_string()
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Dialect::ALL
            .into_iter()
            .find(|dialect| dialect.id() == wanted)
            .ok_or_else(|| Error::UnknownExtractor(s.to_string()))
    }
}

impl_deserialize_from_str!(Dialect);
