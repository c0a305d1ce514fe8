//! Authorization data models: ranked permission actions, grants, and the
//! resource names the API protects.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

// ═══════════════════════════════════════════════════════════════════════════════
// Resources
// ═══════════════════════════════════════════════════════════════════════════════

/// Resource names recognised by the GraphQL guards.
///
/// Grants may name any resource string; only these four are ever checked.
pub mod resources {
    pub const USER: &str = "USER";
    pub const ROUTINE: &str = "ROUTINE";
    pub const EXERCISE: &str = "EXERCISE";
    pub const SESSION: &str = "SESSION";

    /// Every resource a guard can ask about.
    pub const ALL: [&str; 4] = [USER, ROUTINE, EXERCISE, SESSION];
}

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Raised when an action string is not one of the five ranked actions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown permission action: {0:?}")]
pub struct UnknownPermissionAction(pub String);

/// Errors from parsing a `resource:ACTION` grant string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrantParseError {
    #[error("grant {0:?} is missing the ':' separator")]
    MissingSeparator(String),

    #[error("grant {0:?} has an empty resource name")]
    EmptyResource(String),

    #[error(transparent)]
    UnknownAction(#[from] UnknownPermissionAction),
}

// ═══════════════════════════════════════════════════════════════════════════════
// Permission Action
// ═══════════════════════════════════════════════════════════════════════════════

/// A ranked permission level.
///
/// Holding an action implies every action of equal or lower rank:
/// `View(1) < Edit(2) < Create(3) < Delete(4) < Manage(5)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionAction {
    View,
    Edit,
    Create,
    Delete,
    Manage,
}

impl PermissionAction {
    /// All actions in ascending rank order.
    pub const ALL: [PermissionAction; 5] = [
        Self::View,
        Self::Edit,
        Self::Create,
        Self::Delete,
        Self::Manage,
    ];

    /// Numeric rank used for comparisons. Ranks are unique and contiguous.
    pub const fn rank(self) -> u8 {
        match self {
            Self::View => 1,
            Self::Edit => 2,
            Self::Create => 3,
            Self::Delete => 4,
            Self::Manage => 5,
        }
    }

    /// Wire name of the action.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::View => "VIEW",
            Self::Edit => "EDIT",
            Self::Create => "CREATE",
            Self::Delete => "DELETE",
            Self::Manage => "MANAGE",
        }
    }

    /// Whether holding `self` is enough to perform `required`.
    pub const fn satisfies(self, required: PermissionAction) -> bool {
        self.rank() >= required.rank()
    }
}

impl PartialOrd for PermissionAction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PermissionAction {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for PermissionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionAction {
    type Err = UnknownPermissionAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| UnknownPermissionAction(s.to_string()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Permission Grant
// ═══════════════════════════════════════════════════════════════════════════════

/// One grant held by a principal: an action on a named resource.
///
/// Serialized as `"RESOURCE:ACTION"`, e.g. `"ROUTINE:EDIT"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionGrant {
    pub resource: String,
    pub action: PermissionAction,
}

impl PermissionGrant {
    pub fn new(resource: impl Into<String>, action: PermissionAction) -> Self {
        Self {
            resource: resource.into(),
            action,
        }
    }

    /// Parse a single `resource:ACTION` string.
    pub fn parse(raw: &str) -> Result<Self, GrantParseError> {
        let (resource, action) = raw
            .rsplit_once(':')
            .ok_or_else(|| GrantParseError::MissingSeparator(raw.to_string()))?;

        let resource = resource.trim();
        if resource.is_empty() {
            return Err(GrantParseError::EmptyResource(raw.to_string()));
        }

        Ok(Self::new(resource, action.trim().parse()?))
    }

    /// Parse grants carried by an upstream credential.
    ///
    /// Fails closed: if any entry is malformed the whole set is dropped and
    /// the principal ends up with no grants at all.
    pub fn parse_all<I, S>(raw: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parsed: Result<Vec<_>, _> = raw.into_iter().map(|s| Self::parse(s.as_ref())).collect();
        match parsed {
            Ok(grants) => grants,
            Err(e) => {
                warn!(error = %e, "Discarding malformed permission grants");
                Vec::new()
            }
        }
    }
}

impl fmt::Display for PermissionGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)
    }
}

impl FromStr for PermissionGrant {
    type Err = GrantParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PermissionGrant {
    type Error = GrantParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PermissionGrant> for String {
    fn from(grant: PermissionGrant) -> Self {
        grant.to_string()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranks_are_contiguous() {
        let ranks: Vec<u8> = PermissionAction::ALL.iter().map(|a| a.rank()).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_ordering_follows_rank() {
        assert!(PermissionAction::View < PermissionAction::Edit);
        assert!(PermissionAction::Edit < PermissionAction::Create);
        assert!(PermissionAction::Create < PermissionAction::Delete);
        assert!(PermissionAction::Delete < PermissionAction::Manage);
        assert_eq!(
            PermissionAction::ALL.iter().max(),
            Some(&PermissionAction::Manage)
        );
    }

    #[test]
    fn test_satisfies_is_monotonic() {
        for held in PermissionAction::ALL {
            for required in PermissionAction::ALL {
                assert_eq!(held.satisfies(required), held.rank() >= required.rank());
            }
        }
        assert!(PermissionAction::Create.satisfies(PermissionAction::Edit));
        assert!(!PermissionAction::Edit.satisfies(PermissionAction::Create));
    }

    #[test]
    fn test_action_from_str() {
        assert_eq!("MANAGE".parse::<PermissionAction>(), Ok(PermissionAction::Manage));
        assert_eq!("VIEW".parse::<PermissionAction>(), Ok(PermissionAction::View));
        assert!("ADMIN".parse::<PermissionAction>().is_err());
        assert!("view".parse::<PermissionAction>().is_err());
    }

    #[test]
    fn test_action_serde_uses_wire_names() {
        let json = serde_json::to_string(&PermissionAction::Delete).unwrap();
        assert_eq!(json, "\"DELETE\"");
        let back: PermissionAction = serde_json::from_str("\"EDIT\"").unwrap();
        assert_eq!(back, PermissionAction::Edit);
    }

    #[test]
    fn test_grant_parse() {
        let grant = PermissionGrant::parse("ROUTINE:EDIT").unwrap();
        assert_eq!(grant.resource, "ROUTINE");
        assert_eq!(grant.action, PermissionAction::Edit);
        assert_eq!(grant.to_string(), "ROUTINE:EDIT");
    }

    #[test]
    fn test_grant_parse_errors() {
        assert!(matches!(
            PermissionGrant::parse("ROUTINE"),
            Err(GrantParseError::MissingSeparator(_))
        ));
        assert!(matches!(
            PermissionGrant::parse(":VIEW"),
            Err(GrantParseError::EmptyResource(_))
        ));
        assert!(matches!(
            PermissionGrant::parse("ROUTINE:OWN"),
            Err(GrantParseError::UnknownAction(_))
        ));
    }

    #[test]
    fn test_parse_all_fails_closed() {
        let good = PermissionGrant::parse_all(["USER:VIEW", "SESSION:CREATE"]);
        assert_eq!(good.len(), 2);

        let bad = PermissionGrant::parse_all(["USER:VIEW", "SESSION:EVERYTHING"]);
        assert!(bad.is_empty());
    }

    #[test]
    fn test_grant_deserializes_from_string() {
        let grants: Vec<PermissionGrant> =
            serde_json::from_str(r#"["USER:MANAGE", "EXERCISE:VIEW"]"#).unwrap();
        assert_eq!(grants[0], PermissionGrant::new("USER", PermissionAction::Manage));
        assert_eq!(grants[1], PermissionGrant::new("EXERCISE", PermissionAction::View));

        let err = serde_json::from_str::<Vec<PermissionGrant>>(r#"["USER:ROOT"]"#);
        assert!(err.is_err());
    }
}
