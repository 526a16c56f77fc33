use hashbrown::HashMap;

/// Per-display memory of which tokens have been announced.
///
/// `last_announced` is written only after the speech call for a token has
/// been issued and is never rolled back, even if synthesis fails later.
/// `in_flight` holds every token dispatched but not yet spoken (waiting on
/// its chime delay or on an earlier announcement), so a repeated feed
/// delivery cannot dispatch any of them twice.
#[derive(Debug, Clone, Default)]
pub struct AnnouncementRecord {
    last_announced: HashMap<String, String>,
    in_flight: HashMap<String, Vec<String>>,
}

impl AnnouncementRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_announced(&self, scope_key: &str) -> Option<&str> {
        self.last_announced.get(scope_key).map(String::as_str)
    }

    /// Pending tokens for `scope_key`, oldest dispatch first
    pub fn in_flight(&self, scope_key: &str) -> &[String] {
        self.in_flight
            .get(scope_key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_in_flight(&self, scope_key: &str, token: &str) -> bool {
        self.in_flight(scope_key).iter().any(|t| t == token)
    }

    pub(crate) fn mark_in_flight(&mut self, scope_key: &str, token: &str) {
        let pending = self.in_flight.entry_ref(scope_key).or_default();
        if !pending.iter().any(|t| t == token) {
            pending.push(token.to_string());
        }
    }

    fn remove_pending(&mut self, scope_key: &str, token: &str) -> bool {
        let Some(pending) = self.in_flight.get_mut(scope_key) else {
            return false;
        };
        let before = pending.len();
        pending.retain(|t| t != token);
        let removed = pending.len() != before;
        if pending.is_empty() {
            self.in_flight.remove(scope_key);
        }
        removed
    }

    /// Record `token` as announced for `scope_key`.
    pub(crate) fn commit(&mut self, scope_key: &str, token: &str) {
        self.remove_pending(scope_key, token);
        self.last_announced
            .insert(scope_key.to_string(), token.to_string());
    }

    /// Forget one dispatch whose speech call never happened.
    pub(crate) fn abandon(&mut self, scope_key: &str, token: &str) -> bool {
        self.remove_pending(scope_key, token)
    }

    /// Forget every pending dispatch for `scope_key`.
    pub(crate) fn abandon_all(&mut self, scope_key: &str) -> Vec<String> {
        self.in_flight.remove(scope_key).unwrap_or_default()
    }
}
