mod rules;

pub use rules::{
    all_scopes, resolve_stale_scopes, scopes_for_event_type, RuleMatch, ScopeRule, ALL_SCOPES,
    SCOPE_CHARACTERS, SCOPE_INVITES, SCOPE_PARTICIPANTS, SCOPE_SESSIONS, SCOPE_SUMMARY,
};
