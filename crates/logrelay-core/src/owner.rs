use crate::traits::Owner;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque token identifying the owner an endpoint was created for.
///
/// Registries keep this token instead of a reference to the owner itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(u64);

impl OwnerId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "owner#{}", self.0)
    }
}

/// A named node living in a namespace, e.g. `/robot` + `nav`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeOwner {
    id: OwnerId,
    namespace: String,
    name: String,
}

impl NodeOwner {
    pub fn new(id: OwnerId, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Owner for NodeOwner {
    fn id(&self) -> OwnerId {
        self.id
    }

    /// `/robot/base` + `nav` becomes `robot.base.nav`; the root namespace adds nothing.
    fn logger_name(&self) -> Option<String> {
        if self.name.is_empty() {
            return None;
        }

        let namespace = self.namespace.trim_matches('/');
        if namespace.is_empty() {
            Some(self.name.clone())
        } else {
            Some(format!("{}.{}", namespace.replace('/', "."), self.name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_name_with_namespace() {
        let node = NodeOwner::new(OwnerId::new(1), "/robot", "nav");
        assert_eq!(node.logger_name().as_deref(), Some("robot.nav"));

        let nested = NodeOwner::new(OwnerId::new(2), "/robot/base/", "odom");
        assert_eq!(nested.logger_name().as_deref(), Some("robot.base.odom"));
    }

    #[test]
    fn test_logger_name_root_namespace() {
        let node = NodeOwner::new(OwnerId::new(1), "/", "talker");
        assert_eq!(node.logger_name().as_deref(), Some("talker"));
    }

    #[test]
    fn test_logger_name_missing() {
        let node = NodeOwner::new(OwnerId::new(1), "/robot", "");
        assert_eq!(node.logger_name(), None);
    }

    #[test]
    fn test_owner_id_display() {
        assert_eq!(OwnerId::new(42).to_string(), "owner#42");
        assert_eq!(OwnerId::new(42).get(), 42);
    }
}
