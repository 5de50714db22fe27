//! Arbitration of contested food sites.
//!
//! Each food site that has received at least one claim gets an
//! [`Arbitrator`]. The arbitrator records claimants in arrival order, caps
//! them at [`MAX_CLAIMANTS_PER_FOOD`], and after a fixed lockup period
//! resolves who eats how much:
//!
//! | claimants                  | first   | second  |
//! |----------------------------|---------|---------|
//! | one                        | full    | --      |
//! | two, neither greedy        | half    | half    |
//! | two, first greedy          | full    | none    |
//! | two, second greedy         | none    | full    |
//! | two, both greedy           | none    | none    |
//!
//! Every claimant is sent home when its food resolves.
//!
//! # Concurrency
//!
//! Claims arrive from many blobs in parallel during the agent phase, so the
//! [`ArbitratorStore`] is a sharded lock table: a `RwLock` over the map and a
//! `Mutex` per food site. The map lock is always released before a slot
//! lock is taken, so no thread ever holds two locks at once and contention
//! is limited to blobs racing for the same site. Resolution
//! ([`ArbitratorStore::advance_all`]) takes `&mut self` and runs strictly
//! between agent phases.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};

use forage_types::{BlobId, FoodId, FoodState, RewardLevel};
use tracing::debug;

use crate::error::WorldError;

/// The most blobs that may claim one food site.
pub const MAX_CLAIMANTS_PER_FOOD: usize = 2;

/// A blob's claim on a food site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Claimant {
    /// The claiming blob.
    pub blob: BlobId,
    /// Whether the blob refuses to share.
    pub greedy: bool,
}

/// The reward one claimant receives when its food site resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Award {
    /// The rewarded blob. It must also be sent home.
    pub blob: BlobId,
    /// How much it ate.
    pub reward: RewardLevel,
}

/// Outcome of one food site's lockup period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The food site that is now consumed.
    pub food: FoodId,
    /// One award per claimant, in claim order.
    pub awards: Vec<Award>,
}

/// Claim bookkeeping for a single food site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arbitrator {
    /// The food site this arbitrator owns.
    food: FoodId,
    /// Claimants in arrival order.
    claimants: Vec<Claimant>,
    /// Ticks advanced since creation.
    elapsed: u32,
    /// Ticks after which the site resolves.
    lockup_ticks: u32,
    /// Consumed once resolved.
    state: FoodState,
}

impl Arbitrator {
    /// Create an arbitrator with no claimants.
    pub const fn new(food: FoodId, lockup_ticks: u32) -> Self {
        Self {
            food,
            claimants: Vec::new(),
            elapsed: 0,
            lockup_ticks,
            state: FoodState::Available,
        }
    }

    /// The food site this arbitrator owns.
    pub const fn food(&self) -> FoodId {
        self.food
    }

    /// Claimants in arrival order.
    pub fn claimants(&self) -> &[Claimant] {
        &self.claimants
    }

    /// Ticks advanced so far.
    pub const fn elapsed(&self) -> u32 {
        self.elapsed
    }

    /// Whether the site has been resolved.
    pub const fn is_consumed(&self) -> bool {
        matches!(self.state, FoodState::Consumed)
    }

    /// Record a claim. Returns `false` without changing anything when the
    /// site is full, already resolved, or the blob has already claimed it.
    pub fn claim(&mut self, claimant: Claimant) -> bool {
        if self.is_consumed()
            || self.claimants.len() >= MAX_CLAIMANTS_PER_FOOD
            || self.claimants.iter().any(|c| c.blob == claimant.blob)
        {
            return false;
        }
        self.claimants.push(claimant);
        true
    }

    /// A site with one claimant is still open to a second.
    pub const fn is_available(&self) -> bool {
        self.claimants.len() <= 1 && !self.is_consumed()
    }

    /// Count one tick. Once the lockup period is reached the site is marked
    /// consumed and its awards are returned; before that, and after it,
    /// this returns `None`.
    pub fn advance(&mut self) -> Result<Option<Resolution>, WorldError> {
        if self.is_consumed() {
            return Ok(None);
        }
        self.elapsed = self.elapsed.saturating_add(1);
        if self.elapsed < self.lockup_ticks {
            return Ok(None);
        }
        let awards = resolve_awards(self.food, &self.claimants)?;
        self.state = FoodState::Consumed;
        Ok(Some(Resolution {
            food: self.food,
            awards,
        }))
    }
}

/// Rewards for two claimants keyed by their greedy flags, in claim order.
pub const fn split_rewards(first_greedy: bool, second_greedy: bool) -> (RewardLevel, RewardLevel) {
    match (first_greedy, second_greedy) {
        (false, false) => (RewardLevel::Half, RewardLevel::Half),
        (true, false) => (RewardLevel::Full, RewardLevel::None),
        (false, true) => (RewardLevel::None, RewardLevel::Full),
        (true, true) => (RewardLevel::None, RewardLevel::None),
    }
}

/// Apply the outcome matrix to a claimant list.
fn resolve_awards(food: FoodId, claimants: &[Claimant]) -> Result<Vec<Award>, WorldError> {
    match claimants {
        [only] => Ok(vec![Award {
            blob: only.blob,
            reward: RewardLevel::Full,
        }]),
        [first, second] => {
            let (first_reward, second_reward) = split_rewards(first.greedy, second.greedy);
            Ok(vec![
                Award {
                    blob: first.blob,
                    reward: first_reward,
                },
                Award {
                    blob: second.blob,
                    reward: second_reward,
                },
            ])
        }
        _ => Err(WorldError::InvalidClaimantCount {
            food,
            count: claimants.len(),
        }),
    }
}

/// A shared, lockable arbitrator slot.
type Slot = Arc<Mutex<Arbitrator>>;

/// The per-food lock table.
///
/// Slots are created on the first claim against a food site and pruned once
/// the site is consumed.
#[derive(Debug)]
pub struct ArbitratorStore {
    /// Ticks from first claim to resolution.
    lockup_ticks: u32,
    /// Active arbitrators keyed by food site.
    slots: RwLock<BTreeMap<FoodId, Slot>>,
}

impl ArbitratorStore {
    /// Create an empty table.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidParameter`] if `lockup_ticks` is zero.
    pub fn new(lockup_ticks: u32) -> Result<Self, WorldError> {
        if lockup_ticks == 0 {
            return Err(WorldError::InvalidParameter {
                name: "food_lockup_ticks",
                reason: "must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            lockup_ticks,
            slots: RwLock::new(BTreeMap::new()),
        })
    }

    /// Ticks from first claim to resolution.
    pub const fn lockup_ticks(&self) -> u32 {
        self.lockup_ticks
    }

    /// Claim `food` for `claimant`. Safe to call from many threads at once.
    ///
    /// Returns `Ok(false)` when the site is full or the blob already holds a
    /// claim on it.
    pub fn try_claim(&self, food: FoodId, claimant: Claimant) -> Result<bool, WorldError> {
        let slot = self.slot_or_insert(food)?;
        let mut arbitrator = slot.lock().map_err(|poison| poisoned(food, &poison))?;
        let accepted = arbitrator.claim(claimant);
        debug!(
            %food,
            blob = %claimant.blob,
            greedy = claimant.greedy,
            accepted,
            claimants = arbitrator.claimants().len(),
            "Food claim"
        );
        Ok(accepted)
    }

    /// Whether `food` can still take a claim. Sites nobody has claimed yet
    /// are available.
    pub fn is_available(&self, food: FoodId) -> Result<bool, WorldError> {
        let Some(slot) = self.slot(food)? else {
            return Ok(true);
        };
        let arbitrator = slot.lock().map_err(|poison| poisoned(food, &poison))?;
        Ok(arbitrator.is_available())
    }

    /// Current claimants of `food`, in claim order.
    pub fn claimants(&self, food: FoodId) -> Result<Vec<Claimant>, WorldError> {
        let Some(slot) = self.slot(food)? else {
            return Ok(Vec::new());
        };
        let arbitrator = slot.lock().map_err(|poison| poisoned(food, &poison))?;
        Ok(arbitrator.claimants().to_vec())
    }

    /// Number of live arbitrators.
    pub fn len(&self) -> Result<usize, WorldError> {
        let slots = self
            .slots
            .read()
            .map_err(|poison| table_poisoned(&poison))?;
        Ok(slots.len())
    }

    /// Whether no food site has a pending claim.
    pub fn is_empty(&self) -> Result<bool, WorldError> {
        Ok(self.len()? == 0)
    }

    /// Advance every arbitrator by one tick and collect the sites that
    /// resolved. Resolved slots are removed from the table.
    pub fn advance_all(&mut self) -> Result<Vec<Resolution>, WorldError> {
        let slots = self
            .slots
            .get_mut()
            .map_err(|poison| table_poisoned(&poison))?;

        let mut resolutions = Vec::new();
        for (food, slot) in slots.iter() {
            let mut arbitrator = slot.lock().map_err(|poison| poisoned(*food, &poison))?;
            if let Some(resolution) = arbitrator.advance()? {
                debug!(
                    %food,
                    claimants = resolution.awards.len(),
                    "Food resolved"
                );
                resolutions.push(resolution);
            }
        }

        for resolution in &resolutions {
            slots.remove(&resolution.food);
        }

        Ok(resolutions)
    }

    /// Drop every arbitrator. Called between epochs.
    pub fn clear(&mut self) -> Result<(), WorldError> {
        self.slots
            .get_mut()
            .map_err(|poison| table_poisoned(&poison))?
            .clear();
        Ok(())
    }

    /// Look up a slot, releasing the map lock before returning.
    fn slot(&self, food: FoodId) -> Result<Option<Slot>, WorldError> {
        let slots = self
            .slots
            .read()
            .map_err(|poison| table_poisoned(&poison))?;
        Ok(slots.get(&food).map(Arc::clone))
    }

    /// Look up a slot, creating it if this is the site's first claim.
    fn slot_or_insert(&self, food: FoodId) -> Result<Slot, WorldError> {
        if let Some(slot) = self.slot(food)? {
            return Ok(slot);
        }
        let mut slots = self
            .slots
            .write()
            .map_err(|poison| table_poisoned(&poison))?;
        let lockup_ticks = self.lockup_ticks;
        let slot = slots
            .entry(food)
            .or_insert_with(|| Arc::new(Mutex::new(Arbitrator::new(food, lockup_ticks))));
        Ok(Arc::clone(slot))
    }
}

fn poisoned(food: FoodId, poison: &impl core::fmt::Display) -> WorldError {
    WorldError::LockPoisoned {
        context: format!("arbitrator for food {food}: {poison}"),
    }
}

fn table_poisoned(poison: &impl core::fmt::Display) -> WorldError {
    WorldError::LockPoisoned {
        context: format!("arbitrator table: {poison}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rayon::prelude::*;

    use super::*;

    fn claimant(greedy: bool) -> Claimant {
        Claimant {
            blob: BlobId::new(),
            greedy,
        }
    }

    #[test]
    fn third_claim_is_rejected_and_list_unchanged() {
        let mut arb = Arbitrator::new(FoodId::new(), 3);
        let a = claimant(false);
        let b = claimant(true);
        assert!(arb.claim(a));
        assert!(arb.claim(b));

        assert!(!arb.claim(claimant(false)));
        assert_eq!(arb.claimants(), &[a, b]);
    }

    #[test]
    fn duplicate_claim_is_rejected() {
        let mut arb = Arbitrator::new(FoodId::new(), 3);
        let a = claimant(false);
        assert!(arb.claim(a));
        assert!(!arb.claim(a));
        assert_eq!(arb.claimants().len(), 1);
    }

    #[test]
    fn availability_tracks_claim_count() {
        let mut arb = Arbitrator::new(FoodId::new(), 3);
        assert!(arb.is_available());
        arb.claim(claimant(false));
        assert!(arb.is_available());
        arb.claim(claimant(false));
        assert!(!arb.is_available());
    }

    #[test]
    fn resolves_only_after_lockup() {
        let mut arb = Arbitrator::new(FoodId::new(), 3);
        arb.claim(claimant(false));
        assert_eq!(arb.advance().unwrap(), None);
        assert_eq!(arb.advance().unwrap(), None);
        let resolution = arb.advance().unwrap();
        assert!(resolution.is_some());
        assert!(arb.is_consumed());
        assert!(!arb.is_available());
        assert_eq!(arb.advance().unwrap(), None);
    }

    #[test]
    fn consumed_site_refuses_claims() {
        let mut arb = Arbitrator::new(FoodId::new(), 1);
        arb.claim(claimant(false));
        arb.advance().unwrap();
        assert!(!arb.claim(claimant(false)));
    }

    #[test]
    fn outcome_matrix() {
        use RewardLevel as R;

        let table: &[(&[bool], &[RewardLevel])] = &[
            (&[false], &[R::Full]),
            (&[true], &[R::Full]),
            (&[false, false], &[R::Half, R::Half]),
            (&[true, false], &[R::Full, R::None]),
            (&[false, true], &[R::None, R::Full]),
            (&[true, true], &[R::None, R::None]),
        ];

        for (flags, expected) in table {
            let mut arb = Arbitrator::new(FoodId::new(), 1);
            let claimants: Vec<Claimant> = flags.iter().map(|&g| claimant(g)).collect();
            for c in &claimants {
                assert!(arb.claim(*c));
            }
            let resolution = arb.advance().unwrap().unwrap();
            let rewards: Vec<RewardLevel> = resolution.awards.iter().map(|a| a.reward).collect();
            assert_eq!(rewards.as_slice(), *expected, "greedy flags {flags:?}");
            let blobs: Vec<BlobId> = resolution.awards.iter().map(|a| a.blob).collect();
            let claimed: Vec<BlobId> = claimants.iter().map(|c| c.blob).collect();
            assert_eq!(blobs, claimed);
        }
    }

    #[test]
    fn oversized_claimant_list_is_fatal() {
        let food = FoodId::new();
        let three = [claimant(false), claimant(false), claimant(true)];
        assert!(matches!(
            resolve_awards(food, &three),
            Err(WorldError::InvalidClaimantCount { count: 3, .. })
        ));
        assert!(matches!(
            resolve_awards(food, &[]),
            Err(WorldError::InvalidClaimantCount { count: 0, .. })
        ));
    }

    #[test]
    fn zero_lockup_is_rejected() {
        assert!(matches!(
            ArbitratorStore::new(0),
            Err(WorldError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn unseen_food_is_available() {
        let store = ArbitratorStore::new(3).unwrap();
        assert!(store.is_available(FoodId::new()).unwrap());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn store_creates_slot_on_first_claim() {
        let store = ArbitratorStore::new(3).unwrap();
        let food = FoodId::new();
        let a = claimant(true);
        assert!(store.try_claim(food, a).unwrap());
        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(store.claimants(food).unwrap(), vec![a]);
        assert!(store.is_available(food).unwrap());
    }

    #[test]
    fn concurrent_claims_never_exceed_capacity() {
        let store = ArbitratorStore::new(3).unwrap();
        let food = FoodId::new();
        let contenders: Vec<Claimant> = (0..64).map(|i| claimant(i % 2 == 0)).collect();

        let accepted = contenders
            .par_iter()
            .filter(|c| store.try_claim(food, **c).unwrap())
            .count();

        assert_eq!(accepted, MAX_CLAIMANTS_PER_FOOD);
        assert_eq!(store.claimants(food).unwrap().len(), MAX_CLAIMANTS_PER_FOOD);
        assert!(!store.is_available(food).unwrap());
    }

    #[test]
    fn concurrent_claims_across_sites_are_independent() {
        let store = ArbitratorStore::new(3).unwrap();
        let foods: Vec<FoodId> = (0..8).map(|_| FoodId::new()).collect();

        foods.par_iter().for_each(|food| {
            for _ in 0..4 {
                let _ = store.try_claim(*food, claimant(false)).unwrap();
            }
        });

        assert_eq!(store.len().unwrap(), foods.len());
        for food in &foods {
            assert_eq!(store.claimants(*food).unwrap().len(), 2);
        }
    }

    #[test]
    fn advance_all_resolves_and_prunes() {
        let mut store = ArbitratorStore::new(2).unwrap();
        let early = FoodId::new();
        let late = FoodId::new();
        store.try_claim(early, claimant(false)).unwrap();

        assert!(store.advance_all().unwrap().is_empty());
        store.try_claim(late, claimant(false)).unwrap();

        let resolved = store.advance_all().unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved.first().map(|r| r.food), Some(early));
        assert_eq!(store.len().unwrap(), 1);
        assert!(store.is_available(early).unwrap());

        let resolved = store.advance_all().unwrap();
        assert_eq!(resolved.first().map(|r| r.food), Some(late));
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn clear_drops_everything() {
        let mut store = ArbitratorStore::new(5).unwrap();
        store.try_claim(FoodId::new(), claimant(false)).unwrap();
        store.try_claim(FoodId::new(), claimant(true)).unwrap();
        store.clear().unwrap();
        assert!(store.is_empty().unwrap());
    }
}
