//! Decides which stream events trigger a build
//!
//! - `patchset-created`: everything except `NO_CHANGE` patch sets
//! - `comment-added`: only recheck comments
//! - anything else is dropped

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use super::types::{Event, COMMENT_ADDED, NO_CHANGE_KIND, PATCHSET_CREATED};
use crate::config::{ConfigError, RecheckConfig};
use crate::forwarder::ForwardPayload;

/// A line holding only `recheck`, on any line of the comment.
///
/// Gerrit prefixes comments with a `Patch Set N:` header, so the keyword is
/// never on the first line in practice.
pub const DEFAULT_RECHECK_PATTERN: &str = r"(?imR)^\s*recheck$";

/// Variant that accepts `<ci-token> recheck` and a remark after the keyword,
/// e.g. `sap-openstack-ci recheck - flaky network`. `{prefix}` is replaced by
/// the escaped token.
pub const CI_PREFIX_RECHECK_TEMPLATE: &str = r"(?imR)^\s*(?:{prefix}\s+)?recheck(?:\s|$)";

static DEFAULT_RECHECK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(DEFAULT_RECHECK_PATTERN).expect("Invalid regex pattern"));

/// Detects comments asking for the checks to be re-run.
#[derive(Debug, Clone)]
pub struct RecheckMatcher {
    regex: Regex,
}

impl RecheckMatcher {
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    /// Matcher tolerating `ci_prefix` right before the keyword
    pub fn with_ci_prefix(ci_prefix: &str) -> Result<Self, ConfigError> {
        let pattern = CI_PREFIX_RECHECK_TEMPLATE.replace("{prefix}", &regex::escape(ci_prefix));
        Self::new(&pattern)
    }

    /// Explicit pattern first, then the CI prefix variant, then the default.
    pub fn from_config(config: &RecheckConfig) -> Result<Self, ConfigError> {
        match (&config.pattern, &config.ci_prefix) {
            (Some(pattern), _) => Self::new(pattern),
            (None, Some(prefix)) => Self::with_ci_prefix(prefix),
            (None, None) => Ok(Self::default()),
        }
    }

    pub fn is_recheck(&self, comment: &str) -> bool {
        self.regex.is_match(comment.trim_end())
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

impl Default for RecheckMatcher {
    fn default() -> Self {
        Self {
            regex: DEFAULT_RECHECK_RE.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Patch set flagged `NO_CHANGE`
    NoChangePatchSet,
    /// `comment-added` without a `comment` field
    MissingComment,
    /// Comment is not a recheck request
    NotRecheck,
    /// Event type not handled by the gateway
    UnhandledType(Option<String>),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::NoChangePatchSet => write!(f, "patchSet.kind={}", NO_CHANGE_KIND),
            RejectReason::MissingComment => write!(f, "comment missing"),
            RejectReason::NotRecheck => write!(f, "comment not matching recheck pattern"),
            RejectReason::UnhandledType(Some(t)) => write!(f, "unhandled type {t}"),
            RejectReason::UnhandledType(None) => write!(f, "no type"),
        }
    }
}

#[derive(Debug)]
pub enum Verdict {
    Accept(ForwardPayload),
    Reject { reason: RejectReason, event: Event },
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept(_))
    }
}

/// Pure accept/reject logic, no I/O.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    recheck: RecheckMatcher,
}

impl Classifier {
    pub fn new(recheck: RecheckMatcher) -> Self {
        Self { recheck }
    }

    pub fn from_config(config: &RecheckConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(RecheckMatcher::from_config(config)?))
    }

    pub fn classify(&self, event: Event) -> Verdict {
        match check_event(&self.recheck, &event) {
            None => Verdict::Accept(ForwardPayload::new(event)),
            Some(reason) => Verdict::Reject { reason, event },
        }
    }
}

fn check_event(recheck: &RecheckMatcher, event: &Event) -> Option<RejectReason> {
    match event.event_type() {
        Some(PATCHSET_CREATED) => match event.patch_set_kind() {
            Some(NO_CHANGE_KIND) => Some(RejectReason::NoChangePatchSet),
            _ => None,
        },
        Some(COMMENT_ADDED) => match event.comment() {
            None => Some(RejectReason::MissingComment),
            Some(comment) if recheck.is_recheck(comment) => None,
            Some(_) => Some(RejectReason::NotRecheck),
        },
        other => Some(RejectReason::UnhandledType(other.map(String::from))),
    }
}
