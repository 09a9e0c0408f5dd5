use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A stable index into the node arena of a `DependencyGraph`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline(always)]
    pub fn index(&self) -> usize { self.0 as usize }
    pub fn new(idx: usize) -> Self { Self(idx as u32) }
}

/// Checked conversion for ids arriving from outside the crate.
impl TryFrom<usize> for NodeId {
    type Error = std::num::TryFromIntError;

    fn try_from(idx: usize) -> Result<Self, Self::Error> {
        u32::try_from(idx).map(Self)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UniqueId(pub String);

impl UniqueId {
    pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The tag of a computation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TargetType {
    /// No specific object; a global, context-free computation.
    Primitive,
    Security,
    Position,
    MultiplePositions,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Primitive => "PRIMITIVE",
            TargetType::Security => "SECURITY",
            TargetType::Position => "POSITION",
            TargetType::MultiplePositions => "MULTIPLE_POSITIONS",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PRIMITIVE" => Ok(TargetType::Primitive),
            "SECURITY" => Ok(TargetType::Security),
            "POSITION" => Ok(TargetType::Position),
            "MULTIPLE_POSITIONS" | "PORTFOLIO_NODE" => Ok(TargetType::MultiplePositions),
            other => Err(format!("Unknown target type '{}'", other)),
        }
    }
}

/// A reference to a computation target: what a `ValueRequirement` points at
/// before the target itself has been resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetSpecification {
    pub target_type: TargetType,
    pub id: UniqueId,
}

impl TargetSpecification {
    pub fn new(target_type: TargetType, id: impl Into<String>) -> Self {
        Self { target_type, id: UniqueId::new(id) }
    }

    pub fn primitive(id: impl Into<String>) -> Self { Self::new(TargetType::Primitive, id) }
    pub fn security(id: impl Into<String>) -> Self { Self::new(TargetType::Security, id) }
    pub fn position(id: impl Into<String>) -> Self { Self::new(TargetType::Position, id) }
}

impl fmt::Display for TargetSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}", self.target_type, self.id)
    }
}

/// Parses the `TYPE~id` form produced by `Display`.
impl FromStr for TargetSpecification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s.split_once('~').ok_or_else(|| format!("Expected TYPE~id, got '{}'", s))?;
        if id.is_empty() {
            return Err(format!("Missing id in '{}'", s));
        }
        Ok(Self::new(kind.parse()?, id))
    }
}

// --- Domain objects ---
// These are owned by the security/position masters; the graph only needs
// their identity and tag.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Security {
    pub id: UniqueId,
    pub security_type: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: UniqueId,
    pub security: UniqueId,
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioNode {
    pub id: UniqueId,
    pub name: String,
    pub positions: Vec<Arc<Position>>,
}

/// The object a value is computed about.
#[derive(Debug, Clone)]
pub enum ComputationTarget {
    Primitive(UniqueId),
    Security(Arc<Security>),
    Position(Arc<Position>),
    MultiplePositions(Arc<PortfolioNode>),
}

impl ComputationTarget {
    pub fn primitive(id: impl Into<String>) -> Self {
        ComputationTarget::Primitive(UniqueId::new(id))
    }

    pub fn target_type(&self) -> TargetType {
        match self {
            ComputationTarget::Primitive(_) => TargetType::Primitive,
            ComputationTarget::Security(_) => TargetType::Security,
            ComputationTarget::Position(_) => TargetType::Position,
            ComputationTarget::MultiplePositions(_) => TargetType::MultiplePositions,
        }
    }

    pub fn unique_id(&self) -> &UniqueId {
        match self {
            ComputationTarget::Primitive(id) => id,
            ComputationTarget::Security(s) => &s.id,
            ComputationTarget::Position(p) => &p.id,
            ComputationTarget::MultiplePositions(n) => &n.id,
        }
    }

    pub fn specification(&self) -> TargetSpecification {
        TargetSpecification { target_type: self.target_type(), id: self.unique_id().clone() }
    }
}

// Targets are identified by their tag and id; the payload is not compared.
impl PartialEq for ComputationTarget {
    fn eq(&self, other: &Self) -> bool {
        self.target_type() == other.target_type() && self.unique_id() == other.unique_id()
    }
}

impl Eq for ComputationTarget {}

impl fmt::Display for ComputationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}", self.target_type(), self.unique_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("PRIMITIVE", TargetType::Primitive)]
    #[case("security", TargetType::Security)]
    #[case("Position", TargetType::Position)]
    #[case("MULTIPLE_POSITIONS", TargetType::MultiplePositions)]
    #[case("PORTFOLIO_NODE", TargetType::MultiplePositions)]
    fn test_target_type_parsing(#[case] input: &str, #[case] expected: TargetType) {
        assert_eq!(input.parse::<TargetType>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_target_type_rejected() {
        assert!("TRADE".parse::<TargetType>().is_err());
    }

    #[test]
    fn test_target_equality_ignores_payload() {
        let a = ComputationTarget::Security(Arc::new(Security {
            id: UniqueId::new("X"),
            security_type: "BOND".into(),
            name: "Bond X".into(),
        }));
        let b = ComputationTarget::Security(Arc::new(Security {
            id: UniqueId::new("X"),
            security_type: "BOND".into(),
            name: "Renamed".into(),
        }));
        assert_eq!(a, b);
        assert_ne!(a, ComputationTarget::primitive("X"));
        assert_eq!(a.specification(), TargetSpecification::security("X"));
    }

    #[rstest]
    #[case("SECURITY~X", Some(TargetSpecification::security("X")))]
    #[case("primitive~USD", Some(TargetSpecification::primitive("USD")))]
    #[case("POSITION~P~1", Some(TargetSpecification::position("P~1")))]
    #[case("SECURITY", None)]
    #[case("SECURITY~", None)]
    #[case("TRADE~X", None)]
    fn test_target_specification_parsing(#[case] input: &str, #[case] expected: Option<TargetSpecification>) {
        assert_eq!(input.parse::<TargetSpecification>().ok(), expected);
    }

    #[test]
    fn test_portfolio_node_serializes_shared_positions() {
        let position = Arc::new(Position { id: UniqueId::new("P1"), security: UniqueId::new("X"), quantity: 250.0 });
        let node = PortfolioNode { id: UniqueId::new("Book"), name: "Rates".into(), positions: vec![position.clone(), position] };
        let json = serde_json::to_string(&node).unwrap();
        let parsed: PortfolioNode = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, node);
        assert_eq!(parsed.positions[1].quantity, 250.0);
    }

    #[test]
    fn test_node_id_conversion_rejects_overflow() {
        assert_eq!(NodeId::try_from(7usize), Ok(NodeId(7)));
        assert!(NodeId::try_from(u32::MAX as usize + 1).is_err());
    }
}
