use std::collections::BTreeSet;

/// Campaign summary projection (name, participant counts, next session).
pub const SCOPE_SUMMARY: &str = "campaign.summary";
/// Participant list projection.
pub const SCOPE_PARTICIPANTS: &str = "participants";
/// Session list projection.
pub const SCOPE_SESSIONS: &str = "sessions";
/// Character roster projection.
pub const SCOPE_CHARACTERS: &str = "characters";
/// Pending-invite projection (per viewer).
pub const SCOPE_INVITES: &str = "invites";

/// Every scope known to the cache, i.e. the blast radius of an event we
/// cannot classify.
pub const ALL_SCOPES: [&str; 5] = [
    SCOPE_SUMMARY,
    SCOPE_PARTICIPANTS,
    SCOPE_SESSIONS,
    SCOPE_CHARACTERS,
    SCOPE_INVITES,
];

/// How a rule's pattern is compared against an event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleMatch {
    /// Pattern must equal the event type.
    Exact,
    /// Pattern must be a prefix of the event type.
    Prefix,
}

/// One entry of the classification table: event types matching `pattern`
/// invalidate exactly `scopes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeRule {
    pub matcher: RuleMatch,
    pub pattern: &'static str,
    pub scopes: &'static [&'static str],
}

impl ScopeRule {
    const fn exact(pattern: &'static str, scopes: &'static [&'static str]) -> Self {
        Self {
            matcher: RuleMatch::Exact,
            pattern,
            scopes,
        }
    }

    const fn prefix(pattern: &'static str, scopes: &'static [&'static str]) -> Self {
        Self {
            matcher: RuleMatch::Prefix,
            pattern,
            scopes,
        }
    }

    fn matches(&self, event_type: &str) -> bool {
        match self.matcher {
            RuleMatch::Exact => event_type == self.pattern,
            RuleMatch::Prefix => event_type.starts_with(self.pattern),
        }
    }
}

/// Ordered classification table; the first matching rule wins, so exact
/// rules sit above the prefix rule they specialize.
const SCOPE_RULES: &[ScopeRule] = &[
    // Role changes don't affect headcounts shown on the summary.
    ScopeRule::exact("participant.role_changed", &[SCOPE_PARTICIPANTS]),
    ScopeRule::prefix("participant.", &[SCOPE_PARTICIPANTS, SCOPE_SUMMARY]),
    // Scheduling a session moves the "next session" shown on the summary.
    ScopeRule::exact("session.scheduled", &[SCOPE_SESSIONS, SCOPE_SUMMARY]),
    ScopeRule::prefix("session.", &[SCOPE_SESSIONS]),
    ScopeRule::prefix("character.", &[SCOPE_CHARACTERS]),
    // Accepting an invite also lands a new participant.
    ScopeRule::prefix("invite.", &[SCOPE_INVITES, SCOPE_PARTICIPANTS, SCOPE_SUMMARY]),
    ScopeRule::prefix("campaign.", &[SCOPE_SUMMARY]),
];

/// Returns the full scope set.
pub fn all_scopes() -> BTreeSet<String> {
    ALL_SCOPES.iter().map(|s| s.to_string()).collect()
}

/// Classifies an event type into the cache scopes it invalidates.
///
/// Walks the ordered rule table and returns the first match. An event type
/// no rule recognizes invalidates **every** scope: a missed invalidation is
/// a correctness bug, an extra one is just one upstream refetch.
pub fn scopes_for_event_type(event_type: &str) -> BTreeSet<String> {
    for rule in SCOPE_RULES {
        if rule.matches(event_type) {
            return rule.scopes.iter().map(|s| s.to_string()).collect();
        }
    }
    all_scopes()
}

/// Decides which scopes to invalidate for a campaign whose head is at
/// `head_seq` and whose persisted cursor is at `latest_seq`.
///
/// * No cursor yet (first sync) or head not ahead: nothing to invalidate.
/// * Head ahead but the delta scan produced no concrete scopes: invalidate
///   everything, same fail-safe default as an unclassified event.
/// * Otherwise: invalidate exactly what the delta scan found.
pub fn resolve_stale_scopes(
    cursor_known: bool,
    latest_seq: u64,
    head_seq: u64,
    delta_scopes: Option<&BTreeSet<String>>,
) -> BTreeSet<String> {
    if !cursor_known || head_seq <= latest_seq {
        return BTreeSet::new();
    }
    match delta_scopes {
        Some(scopes) if !scopes.is_empty() => scopes.clone(),
        _ => all_scopes(),
    }
}
