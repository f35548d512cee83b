use crate::consensus::term::{Term, TERM_RATCHET_STEP};
use crate::consensus::timeouts::{self, Timeouts};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum PeerState {
    Leader,
    Candidate,
    Follower,
}

/// Peer is this node's view of one cluster member. The local peer is the only one we ever
/// transition ourselves; every other peer is a mirror refreshed from the messages it sends us.
/// The whole struct doubles as the descriptor that's attached to every RPC.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Peer {
    pub(crate) address: String,
    pub(crate) term: Term,
    pub(crate) state: PeerState,
    pub(crate) vote_for: Option<String>,
    pub(crate) leader_due_ms: i64,
    pub(crate) heartbeat_due_ms: i64,
}

impl Peer {
    fn new(address: String, timeouts: &Timeouts) -> Self {
        Peer {
            address,
            term: Term::default(),
            state: PeerState::Follower,
            vote_for: None,
            leader_due_ms: timeouts.initial_leader_due_ms(),
            heartbeat_due_ms: timeouts.initial_heartbeat_due_ms(),
        }
    }
}

/// PeerSet is the membership registry. It owns the local peer, the mirrors of every remote
/// member, and the cached leader. From this node's point of view, at most one peer is in the
/// `Leader` state at any time.
pub(crate) struct PeerSet {
    logger: slog::Logger,
    local: Peer,
    // BTreeMap so that iteration (and therefore vote tallying) is deterministic.
    remotes: BTreeMap<String, Peer>,
    leader: Option<String>,
    sites: BTreeSet<String>,
    timeouts: Timeouts,
    // While leading: ms left before each remote's last beat ack goes stale.
    beat_leases: HashMap<String, i64>,
}

impl PeerSet {
    pub(crate) fn new(logger: slog::Logger, local_address: String, members: &[String], timeouts: Timeouts) -> Self {
        let local = Peer::new(local_address, &timeouts);
        let mut peer_set = PeerSet {
            logger,
            local,
            remotes: BTreeMap::new(),
            leader: None,
            sites: BTreeSet::new(),
            timeouts,
            beat_leases: HashMap::new(),
        };
        peer_set.add(members);
        peer_set.ensure_standalone_leader();

        peer_set
    }

    // ------- Membership --------

    pub(crate) fn add(&mut self, addresses: &[String]) {
        for address in addresses {
            if self.contains(address) {
                continue;
            }
            slog::info!(self.logger, "Adding peer {}", address);
            self.remotes
                .insert(address.clone(), Peer::new(address.clone(), &self.timeouts));
        }
        self.ensure_standalone_leader();
    }

    pub(crate) fn remove(&mut self, addresses: &[String]) {
        for address in addresses {
            if *address == self.local.address {
                slog::warn!(self.logger, "Refusing to remove local peer {} from membership", address);
                continue;
            }
            self.beat_leases.remove(address);
            if self.remotes.remove(address).is_some() {
                slog::info!(self.logger, "Removed peer {}", address);
                if self.leader.as_deref() == Some(address.as_str()) {
                    self.leader = None;
                }
            }
        }
        self.ensure_standalone_leader();
    }

    /// Reconcile membership with an externally supplied address list. The local peer always
    /// stays. Returns true if membership changed.
    pub(crate) fn reconcile(&mut self, addresses: &[String]) -> bool {
        let to_add: Vec<String> = addresses.iter().filter(|a| !self.contains(a)).cloned().collect();
        let to_remove: Vec<String> = self
            .remotes
            .keys()
            .filter(|known| !addresses.contains(known))
            .cloned()
            .collect();

        let changed = !to_add.is_empty() || !to_remove.is_empty();
        self.add(&to_add);
        self.remove(&to_remove);

        changed
    }

    pub(crate) fn ensure_standalone_leader(&mut self) {
        if !self.is_standalone() || self.leader.as_deref() == Some(self.local.address.as_str()) {
            return;
        }
        slog::info!(self.logger, "Standalone mode. Local peer is leader.");
        self.local.state = PeerState::Leader;
        self.local.vote_for = Some(self.local.address.clone());
        self.leader = Some(self.local.address.clone());
    }

    pub(crate) fn is_standalone(&self) -> bool {
        self.remotes.is_empty()
    }

    pub(crate) fn size(&self) -> usize {
        self.remotes.len() + 1
    }

    pub(crate) fn majority_count(&self) -> usize {
        self.size() / 2 + 1
    }

    pub(crate) fn contains(&self, address: &str) -> bool {
        self.local.address == address || self.remotes.contains_key(address)
    }

    pub(crate) fn remote_addresses(&self) -> Vec<String> {
        self.remotes.keys().cloned().collect()
    }

    pub(crate) fn add_sites<I: IntoIterator<Item = String>>(&mut self, sites: I) {
        self.sites.extend(sites);
    }

    pub(crate) fn sites(&self) -> Vec<String> {
        self.sites.iter().cloned().collect()
    }

    // ------- Local peer --------

    pub(crate) fn local(&self) -> &Peer {
        &self.local
    }

    pub(crate) fn local_mut(&mut self) -> &mut Peer {
        &mut self.local
    }

    pub(crate) fn reset_leader_due(&mut self) {
        self.local.leader_due_ms = self.timeouts.leader_due_ms();
    }

    pub(crate) fn reset_heartbeat_due(&mut self) {
        self.local.heartbeat_due_ms = self.timeouts.heartbeat_due_ms();
    }

    pub(crate) fn term(&self) -> Term {
        self.local.term
    }

    /// Monotonic: a lower term is silently ignored. Returns true if the term was accepted.
    pub(crate) fn set_term(&mut self, term: Term) -> bool {
        if term < self.local.term {
            slog::debug!(
                self.logger,
                "Ignoring term {:?} lower than local term {:?}",
                term,
                self.local.term
            );
            return false;
        }
        self.local.term = term;
        true
    }

    /// Leader side of the write-driven term ratchet. The caller persists it, then installs it
    /// with `set_term`.
    pub(crate) fn term_after_write(&self) -> Term {
        self.local.term.plus(TERM_RATCHET_STEP)
    }

    /// Follower side of the write-driven term ratchet. Adopts `source_term` if it's within one
    /// step of ours, otherwise moves one step toward it. Never below the local term.
    pub(crate) fn ratcheted_term(&self, source_term: Term) -> Term {
        let step = self.local.term.plus(TERM_RATCHET_STEP);
        if step > source_term {
            source_term.max(self.local.term)
        } else {
            step
        }
    }

    pub(crate) fn ratchet_term_toward(&mut self, source_term: Term) {
        let new_term = self.ratcheted_term(source_term);

        if let Some(leader_address) = self.leader.clone() {
            if let Some(leader) = self.remotes.get_mut(&leader_address) {
                leader.term = leader.term.max(source_term);
            }
        }
        self.set_term(new_term);
    }

    /// Local peer leaves the leader role. Forgets ourselves as the cached leader, so we stop
    /// accepting leader-only writes immediately.
    pub(crate) fn step_down(&mut self, new_state: PeerState) {
        self.local.state = new_state;
        if self.leader.as_deref() == Some(self.local.address.as_str()) {
            self.leader = None;
        }
    }

    // ------- Leadership --------

    pub(crate) fn is_leader(&self, address: &str) -> bool {
        self.is_standalone() || self.leader.as_deref() == Some(address)
    }

    pub(crate) fn is_local_leader(&self) -> bool {
        self.is_leader(&self.local.address)
    }

    pub(crate) fn leader_address(&self) -> Option<&str> {
        self.leader.as_deref()
    }

    pub(crate) fn get(&self, address: &str) -> Option<&Peer> {
        if self.local.address == address {
            Some(&self.local)
        } else {
            self.remotes.get(address)
        }
    }

    /// Start of a new election round: forget the leader and every vote.
    pub(crate) fn reset(&mut self) {
        self.leader = None;
        self.local.vote_for = None;
        for peer in self.remotes.values_mut() {
            peer.vote_for = None;
        }
    }

    /// Record a vote reply and recompute the leader from every peer's `vote_for`. The address with
    /// the most votes wins if it has a majority. Ties go to the lexicographically smallest
    /// address. Returns the leader after the decision.
    pub(crate) fn decide_leader(&mut self, candidate: Peer) -> Option<String> {
        if candidate.address != self.local.address {
            if !self.remotes.contains_key(&candidate.address) {
                slog::warn!(self.logger, "Ignoring vote from unknown peer {}", candidate.address);
                return self.leader.clone();
            }
            self.update(candidate);
        }

        let mut tally: BTreeMap<&str, usize> = BTreeMap::new();
        for peer in std::iter::once(&self.local).chain(self.remotes.values()) {
            if let Some(vote_for) = peer.vote_for.as_deref() {
                *tally.entry(vote_for).or_insert(0) += 1;
            }
        }

        let mut winner: Option<(&str, usize)> = None;
        for (address, count) in tally {
            // Strictly greater keeps the smallest address among equal counts.
            if winner.map_or(true, |(_, best)| count > best) {
                winner = Some((address, count));
            }
        }

        if let Some((address, count)) = winner {
            if count >= self.majority_count() && self.contains(address) {
                let address = address.to_string();
                self.install_elected_leader(address);
            }
        }

        self.leader.clone()
    }

    fn install_elected_leader(&mut self, address: String) {
        for (other, peer) in self.remotes.iter_mut() {
            if *other != address && peer.state == PeerState::Leader {
                peer.state = PeerState::Follower;
            }
        }

        if address == self.local.address {
            let newly_elected = self.local.state != PeerState::Leader;
            self.local.state = PeerState::Leader;
            if newly_elected {
                // Beat on the very next heartbeat tick instead of waiting out a full interval.
                self.local.heartbeat_due_ms = 0;
                // The votes that just elected us count as the first round of acks.
                self.grant_beat_leases();
            }
        } else {
            if self.local.state == PeerState::Leader {
                self.local.state = PeerState::Follower;
            }
            if let Some(peer) = self.remotes.get_mut(&address) {
                peer.state = PeerState::Leader;
            }
        }

        if self.leader.as_deref() != Some(address.as_str()) {
            slog::info!(
                self.logger,
                "Leader elected: {} (term {:?}, votes needed {})",
                address,
                self.local.term,
                self.majority_count()
            );
            self.leader = Some(address);
        }
    }

    // ------- Leader lease --------

    fn grant_beat_leases(&mut self) {
        let lease_ms = timeouts::millis(self.timeouts.leader_timeout);
        self.beat_leases = self.remotes.keys().map(|address| (address.clone(), lease_ms)).collect();
    }

    /// A remote answered one of our beats.
    pub(crate) fn record_beat_ack(&mut self, address: &str) {
        if self.remotes.contains_key(address) {
            self.beat_leases
                .insert(address.to_string(), timeouts::millis(self.timeouts.leader_timeout));
        }
    }

    pub(crate) fn age_beat_leases(&mut self, elapsed_ms: i64) {
        for remaining_ms in self.beat_leases.values_mut() {
            *remaining_ms -= elapsed_ms;
        }
    }

    /// True while a majority, counting ourselves, acked a beat within the last leader timeout.
    pub(crate) fn has_quorum_lease(&self) -> bool {
        let live_remotes = self
            .remotes
            .keys()
            .filter(|address| self.beat_leases.get(*address).map_or(false, |ms| *ms > 0))
            .count();

        live_remotes + 1 >= self.majority_count()
    }

    /// Accept `remote` as leader unconditionally (it just sent us a valid beat). Any other peer we
    /// still believed to be leader is demoted locally. Returns those peers' addresses so the
    /// caller can refresh their real state from them.
    pub(crate) fn make_leader(&mut self, remote: Peer) -> Vec<String> {
        let address = remote.address.clone();
        if self.leader.as_deref() != Some(address.as_str()) {
            slog::info!(
                self.logger,
                "Leader changed: {:?} -> {} (term {:?})",
                self.leader,
                address,
                remote.term
            );
            self.leader = Some(address.clone());
        }

        if self.local.state == PeerState::Leader && self.local.address != address {
            self.local.state = PeerState::Follower;
        }

        let mut stale_leaders = Vec::new();
        for (other, peer) in self.remotes.iter_mut() {
            if *other != address && peer.state == PeerState::Leader {
                peer.state = PeerState::Follower;
                stale_leaders.push(other.clone());
            }
        }

        if self.remotes.contains_key(&address) {
            self.remotes.insert(address, remote);
        }

        stale_leaders
    }

    /// Refresh a remote mirror from a descriptor it sent us. A claim of leadership from anyone
    /// other than the cached leader is recorded as follower, to keep a single leader in our view.
    pub(crate) fn update(&mut self, mut peer: Peer) {
        if peer.address == self.local.address || !self.remotes.contains_key(&peer.address) {
            return;
        }
        if peer.state == PeerState::Leader && self.leader.as_deref() != Some(peer.address.as_str()) {
            slog::debug!(
                self.logger,
                "Peer {} claims leadership but cached leader is {:?}",
                peer.address,
                self.leader
            );
            peer.state = PeerState::Follower;
        }
        self.remotes.insert(peer.address.clone(), peer);
    }

    /// A remote peer failed an RPC. Its mirror falls back to follower, unless it is the cached
    /// leader: leadership only moves through elections and beats.
    pub(crate) fn mark_unreachable(&mut self, address: &str) {
        if self.leader.as_deref() == Some(address) {
            return;
        }
        if let Some(peer) = self.remotes.get_mut(address) {
            peer.state = PeerState::Follower;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn timeouts() -> Timeouts {
        Timeouts {
            leader_timeout: Duration::from_millis(2000),
            leader_timeout_jitter: Duration::from_millis(0),
            heartbeat_interval: Duration::from_millis(1000),
        }
    }

    fn logger() -> slog::Logger {
        slog::Logger::root(slog::Discard, slog::o!())
    }

    fn addrs(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn peer_set(local: &str, members: &[&str]) -> PeerSet {
        PeerSet::new(logger(), local.to_string(), &addrs(members), timeouts())
    }

    fn vote(from: &str, vote_for: &str, term: u64) -> Peer {
        Peer {
            address: from.to_string(),
            term: Term::new(term),
            state: PeerState::Follower,
            vote_for: Some(vote_for.to_string()),
            leader_due_ms: 0,
            heartbeat_due_ms: 0,
        }
    }

    #[test]
    fn majority_count() {
        assert_eq!(peer_set("a", &["a"]).majority_count(), 1);
        assert_eq!(peer_set("a", &["a", "b"]).majority_count(), 2);
        assert_eq!(peer_set("a", &["a", "b", "c"]).majority_count(), 2);
        assert_eq!(peer_set("a", &["a", "b", "c", "d"]).majority_count(), 3);
        assert_eq!(peer_set("a", &["a", "b", "c", "d", "e"]).majority_count(), 3);
    }

    #[test]
    fn standalone_is_immediately_leader() {
        let peers = peer_set("a", &["a"]);

        assert!(peers.is_standalone());
        assert!(peers.is_local_leader());
        assert_eq!(peers.local().state, PeerState::Leader);
        assert_eq!(peers.local().vote_for.as_deref(), Some("a"));
        assert_eq!(peers.leader_address(), Some("a"));
    }

    #[test]
    fn decide_leader_needs_majority() {
        let mut peers = peer_set("a", &["a", "b", "c", "d", "e"]);
        peers.local_mut().vote_for = Some("a".into());

        assert_eq!(peers.decide_leader(vote("b", "a", 1)), None);
        assert_eq!(peers.local().state, PeerState::Follower);

        assert_eq!(peers.decide_leader(vote("c", "a", 1)), Some("a".into()));
        assert_eq!(peers.local().state, PeerState::Leader);
        assert_eq!(peers.local().heartbeat_due_ms, 0);
        assert!(peers.is_local_leader());
    }

    #[test]
    fn decide_leader_split_vote_elects_nobody() {
        let mut peers = peer_set("d", &["a", "b", "c", "d"]);
        // 2 votes for "c", 2 votes for "b". Majority of 4 is 3, so nobody wins yet.
        peers.local_mut().vote_for = Some("c".into());
        peers.decide_leader(vote("a", "b", 1));
        peers.decide_leader(vote("b", "b", 1));
        assert_eq!(peers.decide_leader(vote("c", "c", 1)), None);

        // Once "y" holds 2 of 3 votes it wins.
        let mut peers = peer_set("x", &["x", "y", "z"]);
        peers.local_mut().vote_for = Some("z".into());
        peers.decide_leader(vote("y", "y", 1));
        assert_eq!(peers.leader_address(), None);
        assert_eq!(peers.decide_leader(vote("z", "y", 1)), Some("y".into()));
    }

    #[test]
    fn decide_leader_two_member_cluster_needs_both_votes() {
        // Two-member cluster: majority is 2. "b" votes for itself, then "a" votes for "b".
        let mut peers = peer_set("a", &["a", "b"]);
        peers.local_mut().vote_for = Some("b".into());
        assert_eq!(peers.decide_leader(vote("b", "b", 1)), Some("b".into()));

        // 1-1 split in a 2-node view never elects anyone.
        let mut peers = peer_set("a", &["a", "b"]);
        peers.local_mut().vote_for = Some("a".into());
        assert_eq!(peers.decide_leader(vote("b", "b", 1)), None);
    }

    #[test]
    fn decide_leader_ignores_unknown_peers() {
        let mut peers = peer_set("a", &["a", "b", "c"]);
        peers.local_mut().vote_for = Some("z".into());

        assert_eq!(peers.decide_leader(vote("z", "z", 9)), None);
        assert!(peers.get("z").is_none());
    }

    #[test]
    fn set_term_is_monotonic() {
        let mut peers = peer_set("a", &["a", "b", "c"]);

        assert!(peers.set_term(Term::new(5)));
        assert!(!peers.set_term(Term::new(4)));
        assert_eq!(peers.term(), Term::new(5));
        assert!(peers.set_term(Term::new(5)));
    }

    #[test]
    fn ratchet_term_toward_source() {
        let mut peers = peer_set("a", &["a", "b", "c"]);
        peers.set_term(Term::new(10));

        // Within one step: adopt.
        peers.ratchet_term_toward(Term::new(60));
        assert_eq!(peers.term(), Term::new(60));

        // Far behind: move by one step.
        peers.ratchet_term_toward(Term::new(1000));
        assert_eq!(peers.term(), Term::new(160));

        // Leader side.
        assert_eq!(peers.term_after_write(), Term::new(260));
        assert_eq!(peers.term(), Term::new(160));

        // A lagging source never moves us backwards.
        assert_eq!(peers.ratcheted_term(Term::new(5)), Term::new(160));
    }

    #[test]
    fn leader_lease_needs_a_majority_of_beat_acks() {
        let mut peers = peer_set("a", &["a", "b", "c"]);
        peers.local_mut().vote_for = Some("a".into());
        peers.decide_leader(vote("b", "a", 1));
        assert!(peers.is_local_leader());
        assert!(peers.has_quorum_lease());

        peers.age_beat_leases(1500);
        peers.record_beat_ack("c");
        peers.age_beat_leases(1000);
        assert!(peers.has_quorum_lease());

        peers.age_beat_leases(1000);
        assert!(!peers.has_quorum_lease());

        peers.record_beat_ack("z");
        assert!(!peers.has_quorum_lease());
        peers.record_beat_ack("b");
        assert!(peers.has_quorum_lease());
    }

    #[test]
    fn make_leader_demotes_stale_leaders() {
        let mut peers = peer_set("a", &["a", "b", "c"]);
        peers.local_mut().vote_for = Some("b".into());
        peers.decide_leader(vote("c", "b", 1));
        assert_eq!(peers.leader_address(), Some("b"));

        let mut remote = vote("c", "c", 2);
        remote.state = PeerState::Leader;
        let stale = peers.make_leader(remote);

        assert_eq!(stale, vec!["b".to_string()]);
        assert_eq!(peers.leader_address(), Some("c"));
        assert_eq!(peers.get("b").map(|p| p.state), Some(PeerState::Follower));
        assert_eq!(peers.get("c").map(|p| p.state), Some(PeerState::Leader));
    }

    #[test]
    fn step_down_forgets_local_leadership() {
        let mut peers = peer_set("a", &["a", "b", "c"]);
        peers.local_mut().vote_for = Some("a".into());
        peers.decide_leader(vote("b", "a", 1));
        assert!(peers.is_local_leader());

        peers.step_down(PeerState::Follower);

        assert!(!peers.is_local_leader());
        assert_eq!(peers.leader_address(), None);
    }

    #[test]
    fn update_records_foreign_leader_claims_as_follower() {
        let mut peers = peer_set("a", &["a", "b", "c"]);
        let mut claim = vote("b", "b", 3);
        claim.state = PeerState::Leader;

        peers.update(claim);

        assert_eq!(peers.get("b").map(|p| p.state), Some(PeerState::Follower));
        assert_eq!(peers.get("b").map(|p| p.term), Some(Term::new(3)));
    }

    #[test]
    fn reconcile_adds_and_removes_but_keeps_local() {
        let mut peers = peer_set("a", &["a", "b", "c"]);

        assert!(peers.reconcile(&addrs(&["b", "d"])));
        let mut remotes = peers.remote_addresses();
        remotes.sort();
        assert_eq!(remotes, addrs(&["b", "d"]));
        assert!(peers.contains("a"));

        assert!(!peers.reconcile(&addrs(&["a", "b", "d"])));

        // Shrinking down to just us flips into standalone leadership.
        peers.reconcile(&addrs(&["a"]));
        assert!(peers.is_standalone());
        assert!(peers.is_local_leader());
    }

    #[test]
    fn removing_leader_clears_cached_leader() {
        let mut peers = peer_set("a", &["a", "b", "c"]);
        let mut remote = vote("b", "b", 1);
        remote.state = PeerState::Leader;
        peers.make_leader(remote);

        peers.remove(&addrs(&["b"]));

        assert_eq!(peers.leader_address(), None);
    }

    #[test]
    fn unreachable_leader_keeps_leadership() {
        let mut peers = peer_set("a", &["a", "b", "c"]);
        let mut remote = vote("b", "b", 1);
        remote.state = PeerState::Leader;
        peers.make_leader(remote);

        peers.mark_unreachable("b");
        assert_eq!(peers.get("b").map(|p| p.state), Some(PeerState::Leader));

        let mut c = vote("c", "b", 1);
        c.state = PeerState::Candidate;
        peers.update(c);
        peers.mark_unreachable("c");
        assert_eq!(peers.get("c").map(|p| p.state), Some(PeerState::Follower));
    }
}
