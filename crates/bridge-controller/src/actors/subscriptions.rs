//! Per-bridge subscription registry.
//!
//! Each managed bridge has exactly one entry holding the engine subscriptions
//! registered for it and the channels admitted by the controller whose
//! `ChannelEnteredBridge` event has not arrived yet. Entries are removed
//! explicitly when the bridge is retired.

use crate::engine::{BridgeId, ChannelId, SubscriptionId};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Subscription state for one managed bridge.
#[derive(Debug, Clone)]
pub struct BridgeSubscription {
    bridge_id: BridgeId,
    subscriptions: Vec<SubscriptionId>,
    awaiting_entry: HashSet<ChannelId>,
    last_reported_members: usize,
    adopted: bool,
    created_at: DateTime<Utc>,
}

impl BridgeSubscription {
    /// Entry for a bridge created by this controller.
    #[must_use]
    pub fn created(bridge_id: BridgeId, subscriptions: Vec<SubscriptionId>) -> Self {
        Self::new(bridge_id, subscriptions, false)
    }

    /// Entry for a pre-existing bridge taken under management.
    #[must_use]
    pub fn adopted(
        bridge_id: BridgeId,
        subscriptions: Vec<SubscriptionId>,
        members: usize,
    ) -> Self {
        let mut entry = Self::new(bridge_id, subscriptions, true);
        entry.last_reported_members = members;
        entry
    }

    fn new(bridge_id: BridgeId, subscriptions: Vec<SubscriptionId>, adopted: bool) -> Self {
        Self {
            bridge_id,
            subscriptions,
            awaiting_entry: HashSet::new(),
            last_reported_members: 0,
            adopted,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn bridge_id(&self) -> &BridgeId {
        &self.bridge_id
    }

    #[must_use]
    pub fn subscriptions(&self) -> &[SubscriptionId] {
        &self.subscriptions
    }

    #[must_use]
    pub fn is_adopted(&self) -> bool {
        self.adopted
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Membership from the most recent event (or lookup) for this bridge.
    #[must_use]
    pub fn last_reported_members(&self) -> usize {
        self.last_reported_members
    }

    pub fn record_members(&mut self, members: usize) {
        self.last_reported_members = members;
    }

    /// Note a channel whose add was accepted but whose entered event is pending.
    pub fn expect_entry(&mut self, channel_id: ChannelId) {
        self.awaiting_entry.insert(channel_id);
    }

    /// Clear a pending admission. Returns whether it was pending.
    pub fn mark_entered(&mut self, channel_id: &ChannelId) -> bool {
        self.awaiting_entry.remove(channel_id)
    }

    #[must_use]
    pub fn is_awaiting(&self, channel_id: &ChannelId) -> bool {
        self.awaiting_entry.contains(channel_id)
    }

    /// Whether any admitted channel has not produced its entered event yet.
    #[must_use]
    pub fn admission_in_flight(&self) -> bool {
        !self.awaiting_entry.is_empty()
    }
}

/// Registry of managed bridges.
///
/// Holds at most a handful of entries (one mixing bridge, plus any bridge
/// whose destroy failed and was adopted again), so a vector is enough.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    entries: Vec<BridgeSubscription>,
}

impl SubscriptionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, replacing any existing entry for the same bridge.
    ///
    /// Returns the replaced entry so its subscriptions can be released.
    pub fn insert(&mut self, entry: BridgeSubscription) -> Option<BridgeSubscription> {
        let replaced = self.remove(entry.bridge_id());
        self.entries.push(entry);
        replaced
    }

    #[must_use]
    pub fn contains(&self, bridge_id: &BridgeId) -> bool {
        self.get(bridge_id).is_some()
    }

    #[must_use]
    pub fn get(&self, bridge_id: &BridgeId) -> Option<&BridgeSubscription> {
        self.entries
            .iter()
            .find(|entry| &entry.bridge_id == bridge_id)
    }

    pub fn get_mut(&mut self, bridge_id: &BridgeId) -> Option<&mut BridgeSubscription> {
        self.entries
            .iter_mut()
            .find(|entry| &entry.bridge_id == bridge_id)
    }

    pub fn remove(&mut self, bridge_id: &BridgeId) -> Option<BridgeSubscription> {
        let index = self
            .entries
            .iter()
            .position(|entry| &entry.bridge_id == bridge_id)?;
        Some(self.entries.remove(index))
    }

    /// Most recently registered bridge.
    #[must_use]
    pub fn current(&self) -> Option<&BridgeSubscription> {
        self.entries.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BridgeSubscription> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return every entry.
    pub fn drain(&mut self) -> Vec<BridgeSubscription> {
        std::mem::take(&mut self.entries)
    }
}
