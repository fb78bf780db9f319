//! Gerrit stream events and the rules deciding which of them are forwarded

pub mod classifier;
pub mod types;

pub use classifier::{
    Classifier, RecheckMatcher, RejectReason, Verdict, CI_PREFIX_RECHECK_TEMPLATE,
    DEFAULT_RECHECK_PATTERN,
};
pub use types::{Event, COMMENT_ADDED, NO_CHANGE_KIND, PATCHSET_CREATED};
