//! Per-user interaction store
//!
//! Interactions are shared as `Arc<Interaction>` between the user's ring
//! buffer and the owning session's list. Each user lives in its own DashMap
//! shard entry, so recording for one user never blocks another.

use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use smartui_common::{Interaction, Modality, ValidationError};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::RingBuffer;

/// Smoothing factor for the running success rate
const SUCCESS_RATE_ALPHA: f64 = 0.1;

/// Running per-user statistics updated on every record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealtimeStats {
    pub interaction_count: u64,
    /// Exponentially smoothed success rate
    pub success_rate: f64,
    pub last_modality: Modality,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl RealtimeStats {
    fn seed(interaction: &Interaction) -> Self {
        Self {
            interaction_count: 1,
            success_rate: if interaction.success { 1.0 } else { 0.0 },
            last_modality: interaction.modality,
            first_seen: interaction.timestamp,
            last_seen: interaction.timestamp,
        }
    }

    fn update(&mut self, interaction: &Interaction) {
        let current = if interaction.success { 1.0 } else { 0.0 };
        self.interaction_count += 1;
        self.success_rate =
            (1.0 - SUCCESS_RATE_ALPHA) * self.success_rate + SUCCESS_RATE_ALPHA * current;
        self.last_modality = interaction.modality;
        if interaction.timestamp > self.last_seen {
            self.last_seen = interaction.timestamp;
        }
    }
}

struct UserBuffer {
    interactions: RingBuffer<Arc<Interaction>>,
    stats: RealtimeStats,
}

struct SessionRecord {
    user_id: String,
    started_at: DateTime<Utc>,
    interactions: VecDeque<Arc<Interaction>>,
}

/// Snapshot of one session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub user_id: String,
    pub started_at: DateTime<Utc>,
    pub interactions: Vec<Arc<Interaction>>,
}

/// Bounded in-memory interaction store
pub struct InteractionStore {
    users: DashMap<String, UserBuffer>,
    sessions: DashMap<String, SessionRecord>,
    capacity: usize,
}

impl InteractionStore {
    /// Create a store with the given per-user (and per-session) capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            users: DashMap::new(),
            sessions: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record an interaction.
    ///
    /// Validation and session ownership are checked before anything is
    /// written, so a rejected interaction leaves the store untouched.
    #[instrument(skip(self, interaction), fields(user = %interaction.user_id, session = %interaction.session_id))]
    pub fn record(&self, interaction: Interaction) -> Result<Arc<Interaction>, ValidationError> {
        interaction.validate()?;
        let interaction = Arc::new(interaction);

        match self.sessions.entry(interaction.session_id.clone()) {
            Entry::Occupied(mut entry) => {
                let session = entry.get_mut();
                if session.user_id != interaction.user_id {
                    return Err(ValidationError::SessionOwnership {
                        session_id: interaction.session_id.clone(),
                        owner: session.user_id.clone(),
                        user_id: interaction.user_id.clone(),
                    });
                }
                if session.interactions.len() >= self.capacity {
                    session.interactions.pop_front();
                }
                session.interactions.push_back(Arc::clone(&interaction));
            }
            Entry::Vacant(entry) => {
                let mut interactions = VecDeque::new();
                interactions.push_back(Arc::clone(&interaction));
                entry.insert(SessionRecord {
                    user_id: interaction.user_id.clone(),
                    started_at: interaction.timestamp,
                    interactions,
                });
            }
        }

        match self.users.entry(interaction.user_id.clone()) {
            Entry::Occupied(mut entry) => {
                let buffer = entry.get_mut();
                buffer.interactions.push(Arc::clone(&interaction));
                buffer.stats.update(&interaction);
            }
            Entry::Vacant(entry) => {
                let mut interactions = RingBuffer::new(self.capacity);
                interactions.push(Arc::clone(&interaction));
                entry.insert(UserBuffer {
                    interactions,
                    stats: RealtimeStats::seed(&interaction),
                });
            }
        }

        debug!(modality = %interaction.modality, success = interaction.success, "Recorded interaction");
        Ok(interaction)
    }

    /// Interactions within `duration` of now, in chronological order
    pub fn recent_window(&self, user_id: &str, duration: Duration) -> Vec<Arc<Interaction>> {
        self.recent_window_at(user_id, duration, Utc::now())
    }

    /// Interactions with timestamp >= `now - duration`, in chronological order
    pub fn recent_window_at(
        &self,
        user_id: &str,
        duration: Duration,
        now: DateTime<Utc>,
    ) -> Vec<Arc<Interaction>> {
        let cutoff = now
            .checked_sub_signed(duration)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let mut window: Vec<Arc<Interaction>> = self
            .users
            .get(user_id)
            .map(|buffer| {
                buffer
                    .interactions
                    .iter()
                    .filter(|i| i.timestamp >= cutoff)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        window.sort_by_key(|i| i.timestamp);
        window
    }

    /// The newest `n` interactions of a user, oldest first
    pub fn recent(&self, user_id: &str, n: usize) -> Vec<Arc<Interaction>> {
        self.users
            .get(user_id)
            .map(|buffer| buffer.interactions.tail(n))
            .unwrap_or_default()
    }

    /// Number of buffered interactions for a user
    pub fn len(&self, user_id: &str) -> usize {
        self.users
            .get(user_id)
            .map(|buffer| buffer.interactions.len())
            .unwrap_or(0)
    }

    pub fn contains_user(&self, user_id: &str) -> bool {
        self.users.contains_key(user_id)
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn realtime_stats(&self, user_id: &str) -> Option<RealtimeStats> {
        self.users.get(user_id).map(|buffer| buffer.stats.clone())
    }

    pub fn session(&self, session_id: &str) -> Option<SessionSummary> {
        self.sessions.get(session_id).map(|session| SessionSummary {
            session_id: session_id.to_string(),
            user_id: session.user_id.clone(),
            started_at: session.started_at,
            interactions: session.interactions.iter().cloned().collect(),
        })
    }

    /// Drop a user's buffer and sessions
    pub fn remove_user(&self, user_id: &str) -> bool {
        let removed = self.users.remove(user_id).is_some();
        if removed {
            self.sessions.retain(|_, session| session.user_id != user_id);
        }
        removed
    }

    /// Remove users not seen since `now - idle_ttl`, returning their ids
    #[instrument(skip(self))]
    pub fn evict_idle(&self, now: DateTime<Utc>, idle_ttl: Duration) -> Vec<String> {
        let cutoff = now
            .checked_sub_signed(idle_ttl)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let idle: Vec<String> = self
            .users
            .iter()
            .filter(|entry| entry.stats.last_seen < cutoff)
            .map(|entry| entry.key().clone())
            .collect();

        for user_id in &idle {
            self.remove_user(user_id);
        }
        if !idle.is_empty() {
            info!(evicted = idle.len(), "Evicted idle users");
        }
        idle
    }

    /// Evict least-recently-seen users until at most `max_users` remain
    #[instrument(skip(self))]
    pub fn enforce_user_cap(&self, max_users: usize) -> Vec<String> {
        let excess = self.users.len().saturating_sub(max_users);
        if excess == 0 {
            return Vec::new();
        }

        let mut by_last_seen: Vec<(DateTime<Utc>, String)> = self
            .users
            .iter()
            .map(|entry| (entry.stats.last_seen, entry.key().clone()))
            .collect();
        by_last_seen.sort();

        let evicted: Vec<String> = by_last_seen
            .into_iter()
            .take(excess)
            .map(|(_, user_id)| user_id)
            .collect();
        for user_id in &evicted {
            self.remove_user(user_id);
        }
        info!(evicted = evicted.len(), max_users, "Enforced tracked user cap");
        evicted
    }
}
