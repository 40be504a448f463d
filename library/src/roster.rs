use std::collections::BTreeSet;

use wasm_call_protocol::PeerId;

/// Peers the relay currently reports as reachable.
///
/// Pure bookkeeping: the dispatcher decides what a departure means for the running call.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    peers: BTreeSet<PeerId>,
}

impl Roster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole roster with the relay's view.
    /// Returns the peers that were listed before but are not anymore.
    pub fn apply_full_update(&mut self, peers: impl IntoIterator<Item = PeerId>) -> Vec<PeerId> {
        let updated: BTreeSet<PeerId> = peers.into_iter().collect();
        let departed = self.peers.difference(&updated).cloned().collect();
        self.peers = updated;
        departed
    }

    /// Returns `true` if the peer was not listed yet.
    pub fn add_peer(&mut self, peer: PeerId) -> bool {
        self.peers.insert(peer)
    }

    /// Returns `true` if the peer was listed.
    pub fn remove_peer(&mut self, peer: &PeerId) -> bool {
        self.peers.remove(peer)
    }

    pub fn clear(&mut self) {
        self.peers.clear();
    }

    #[must_use]
    pub fn contains(&self, peer: &PeerId) -> bool {
        self.peers.contains(peer)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<PeerId> {
        self.peers.iter().cloned().collect()
    }
}

#[cfg(test)]
mod test {
    use wasm_call_protocol::PeerId;

    use super::Roster;

    fn peers(ids: &[&str]) -> Vec<PeerId> {
        ids.iter().map(|id| PeerId::from(*id)).collect()
    }

    #[test]
    fn add_peer_is_idempotent() {
        let mut roster = Roster::new();
        assert!(roster.add_peer(PeerId::from("peer-1")));
        assert!(!roster.add_peer(PeerId::from("peer-1")));
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn remove_peer_is_idempotent() {
        let mut roster = Roster::new();
        roster.add_peer(PeerId::from("peer-1"));
        assert!(roster.remove_peer(&PeerId::from("peer-1")));
        assert!(!roster.remove_peer(&PeerId::from("peer-1")));
        assert!(roster.is_empty());
    }

    #[test]
    fn full_update_reports_departed_peers() {
        let mut roster = Roster::new();
        roster.apply_full_update(peers(&["peer-1", "peer-2", "peer-3"]));

        let departed = roster.apply_full_update(peers(&["peer-2", "peer-4"]));

        assert_eq!(departed, peers(&["peer-1", "peer-3"]));
        assert_eq!(roster.to_vec(), peers(&["peer-2", "peer-4"]));
    }

    #[test]
    fn full_update_collapses_duplicates() {
        let mut roster = Roster::new();
        roster.apply_full_update(peers(&["peer-1", "peer-1", "peer-2"]));
        assert_eq!(roster.len(), 2);
        assert!(roster.contains(&PeerId::from("peer-1")));
    }
}
