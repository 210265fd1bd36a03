//! Route access table.
//!
//! Rules are matched segment by segment, first match wins:
//! - `:name` matches exactly one segment
//! - `**` (last segment only) matches zero or more remaining segments
//!
//! Paths no rule matches only require a logged-in user.

use crate::models::Role;
use crate::session::SessionContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Roles(&'static [Role]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    RedirectToLogin,
    Forbidden,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
    Rest,
}

#[derive(Debug, Clone)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    pub fn parse(pattern: &str) -> Self {
        let segments = split(pattern)
            .map(|s| match s {
                "**" => Segment::Rest,
                p if p.starts_with(':') => Segment::Param,
                lit => Segment::Literal(lit.to_string()),
            })
            .collect();
        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = split(path).collect();
        let mut i = 0;
        for seg in &self.segments {
            match seg {
                Segment::Rest => return true,
                Segment::Param => {
                    if i >= parts.len() {
                        return false;
                    }
                }
                Segment::Literal(lit) => {
                    if parts.get(i) != Some(&lit.as_str()) {
                        return false;
                    }
                }
            }
            i += 1;
        }
        i == parts.len()
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    let path = path.split(['?', '#']).next().unwrap_or("");
    path.split('/').filter(|s| !s.is_empty())
}

#[derive(Debug, Clone)]
pub struct AccessRule {
    pub pattern: RoutePattern,
    pub access: Access,
}

#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    rules: Vec<AccessRule>,
}

const ADMIN: &[Role] = &[Role::Admin];
const PROVIDER: &[Role] = &[Role::Provider];
const CUSTOMER: &[Role] = &[Role::Customer];

impl AccessPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, pattern: &str, access: Access) -> Self {
        self.rules.push(AccessRule {
            pattern: RoutePattern::parse(pattern),
            access,
        });
        self
    }

    /// The booking platform's route table.
    pub fn standard() -> Self {
        Self::new()
            .rule("/", Access::Public)
            .rule("/login", Access::Public)
            .rule("/registration", Access::Public)
            .rule("/provider/registration", Access::Public)
            .rule("/admin/login", Access::Public)
            .rule("/create-admin", Access::Public)
            .rule("/admin/**", Access::Roles(ADMIN))
            .rule("/provider/**", Access::Roles(PROVIDER))
            .rule("/customer/**", Access::Roles(CUSTOMER))
            .rule("/booking/:resource_id", Access::Roles(CUSTOMER))
    }

    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }

    pub fn access_for(&self, path: &str) -> Access {
        self.rules
            .iter()
            .find(|r| r.pattern.matches(path))
            .map(|r| r.access)
            .unwrap_or(Access::Authenticated)
    }

    pub fn check(&self, session: &SessionContext, path: &str) -> AccessDecision {
        let access = self.access_for(path);
        let decision = match (access, session.role()) {
            (Access::Public, _) => AccessDecision::Allow,
            (_, None) => AccessDecision::RedirectToLogin,
            (Access::Authenticated, Some(_)) => AccessDecision::Allow,
            (Access::Roles(allowed), Some(role)) if allowed.contains(&role) => AccessDecision::Allow,
            (Access::Roles(_), Some(_)) => AccessDecision::Forbidden,
        };
        if decision != AccessDecision::Allow {
            tracing::debug!(path, ?decision, "route access denied");
        }
        decision
    }
}
