use uuid::Uuid;

/// Returns the cache key for a campaign-wide scope (e.g. sessions list).
pub fn scope_key(campaign_id: Uuid, scope: &str) -> String {
    format!("campaign:{}:{}", campaign_id, scope)
}

/// Returns the cache key for a per-viewer scope (e.g. a member's invites).
pub fn owner_scope_key(campaign_id: Uuid, scope: &str, owner_id: Uuid) -> String {
    format!("campaign:{}:{}:{}", campaign_id, scope, owner_id)
}

/// Returns the pattern matching every key of one campaign scope,
/// campaign-wide and per-viewer alike.
pub fn scope_pattern(campaign_id: Uuid, scope: &str) -> String {
    format!("campaign:{}:{}*", campaign_id, scope)
}

/// Extracts the campaign ID from a cache key, if present.
///
/// Returns `None` for keys that don't follow the `campaign:{uuid}:...`
/// shape.
pub fn extract_campaign_id_from_key(key: &str) -> Option<Uuid> {
    let rest = key.strip_prefix("campaign:")?;
    let uuid_part = rest.split(':').next()?;
    Uuid::parse_str(uuid_part).ok()
}

/// Extracts the scope segment from a cache key, if present.
pub fn extract_scope_from_key(key: &str) -> Option<&str> {
    let rest = key.strip_prefix("campaign:")?;
    let mut parts = rest.split(':');
    let uuid_part = parts.next()?;
    Uuid::parse_str(uuid_part).ok()?;
    parts.next()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_uuid() -> Uuid {
        Uuid::nil()
    }

    #[test]
    fn test_scope_key() {
        let key = scope_key(test_uuid(), "sessions");
        assert_eq!(key, "campaign:00000000-0000-0000-0000-000000000000:sessions");
    }

    #[test]
    fn test_owner_scope_key() {
        let owner = Uuid::parse_str("11111111-1111-1111-1111-111111111111").unwrap();
        let key = owner_scope_key(test_uuid(), "invites", owner);
        assert_eq!(
            key,
            "campaign:00000000-0000-0000-0000-000000000000:invites:11111111-1111-1111-1111-111111111111"
        );
    }

    #[test]
    fn test_scope_pattern() {
        let pattern = scope_pattern(test_uuid(), "invites");
        assert_eq!(
            pattern,
            "campaign:00000000-0000-0000-0000-000000000000:invites*"
        );
    }

    #[test]
    fn test_extract_campaign_id_from_key() {
        let id = test_uuid();
        let key = scope_key(id, "participants");
        assert_eq!(extract_campaign_id_from_key(&key), Some(id));
    }

    #[test]
    fn test_extract_campaign_id_from_non_campaign_key() {
        assert_eq!(extract_campaign_id_from_key("user:123"), None);
        assert_eq!(extract_campaign_id_from_key("campaign:not-a-uuid:x"), None);
    }

    #[test]
    fn test_extract_scope_from_key() {
        let id = test_uuid();
        let owner = Uuid::parse_str("11111111-1111-1111-1111-111111111111").unwrap();
        assert_eq!(
            extract_scope_from_key(&scope_key(id, "sessions")),
            Some("sessions")
        );
        assert_eq!(
            extract_scope_from_key(&owner_scope_key(id, "invites", owner)),
            Some("invites")
        );
        assert_eq!(extract_scope_from_key("user:123"), None);
    }
}
