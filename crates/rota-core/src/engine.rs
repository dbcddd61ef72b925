//! Rotation arithmetic: lookups, postponement, and weekly advancement.
//!
//! The engine is the only writer of the rotation. Mutations take the engine's
//! mutation lock so that a postpone and an advance can never interleave and break
//! due-date uniqueness. Every date argument is anchored with [`WeekAnchor`].

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::dates::{add_weeks, Clock, SystemClock, WeekAnchor};
use crate::error::{RotaError, RotaResult};
use crate::store::RotationStore;
use crate::types::{Assignment, UserPair};

/// Rotation engine over a [`RotationStore`].
pub struct RotationEngine {
    store: Arc<dyn RotationStore>,
    clock: Arc<dyn Clock>,
    mutation_lock: Mutex<()>,
}

impl RotationEngine {
    /// Create an engine reading "today" from the local system clock.
    pub fn new(store: Arc<dyn RotationStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Create an engine with an explicit clock.
    pub fn with_clock(store: Arc<dyn RotationStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            mutation_lock: Mutex::new(()),
        }
    }

    /// Today's date according to the engine's clock.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// The Monday of the current week.
    pub fn current_week(&self) -> NaiveDate {
        self.clock.today().week_monday()
    }

    /// The full rotation, ordered by due date.
    pub fn schedule(&self) -> RotaResult<Vec<Assignment>> {
        self.store.list_all()
    }

    /// Number of pairs in the rotation.
    pub fn pair_count(&self) -> RotaResult<usize> {
        Ok(self.store.list_all()?.len())
    }

    /// The assignment with the earliest due date on or after this week's Monday.
    pub fn get_next(&self) -> RotaResult<Option<Assignment>> {
        let monday = self.current_week();
        Ok(self
            .store
            .list_all()?
            .into_iter()
            .find(|a| a.due_date >= monday))
    }

    /// The assignment due soonest strictly after the given week.
    pub fn get_follower(&self, after: impl WeekAnchor) -> RotaResult<Option<Assignment>> {
        let after = after.week_monday();
        Ok(self
            .store
            .list_all()?
            .into_iter()
            .find(|a| a.due_date > after))
    }

    /// The pair on duty during the given week.
    pub fn get_users(&self, date: impl WeekAnchor) -> RotaResult<Option<UserPair>> {
        Ok(self
            .store
            .find_by_due_date(date.week_monday())?
            .map(|a| a.users))
    }

    /// The due date of the user's upcoming assignment.
    ///
    /// A date before this week's Monday is stale (the advance job has not run yet)
    /// and reads as `None`, the same cut-off `get_next` uses.
    pub fn get_date(&self, user: &str) -> RotaResult<Option<NaiveDate>> {
        let monday = self.current_week();
        Ok(self
            .store
            .find_by_user(user)?
            .map(|a| a.due_date)
            .filter(|due| *due >= monday))
    }

    /// Push the assignment due in the given week back by one week.
    ///
    /// Returns the moved assignment, or `None` when nobody is due that week.
    /// Fails with `ScheduleConflict` when the following week is already taken; the
    /// rotation is left untouched in that case.
    pub async fn postpone(&self, date: impl WeekAnchor) -> RotaResult<Option<Assignment>> {
        let _guard = self.mutation_lock.lock().await;
        let target = date.week_monday();

        let Some(assignment) = self.store.find_by_due_date(target)? else {
            debug!(date = %target, "Nothing due, nothing to postpone");
            return Ok(None);
        };

        let new_date = add_weeks(target, 1);
        if let Some(occupant) = self.store.find_by_due_date(new_date)? {
            warn!(
                date = %target,
                occupied_on = %new_date,
                occupied_by = %occupant.users,
                "Postpone rejected"
            );
            return Err(RotaError::ScheduleConflict {
                date: target,
                occupied_on: new_date,
                occupied_by: occupant.users.to_string(),
            });
        }

        self.store.set_due_date(&assignment.users.first, new_date)?;
        info!(pair = %assignment.users, from = %target, to = %new_date, "Assignment postponed");

        Ok(Some(Assignment::new(assignment.users, new_date)))
    }

    /// Roll every assignment due on or before `today`'s week to the back of the rotation.
    ///
    /// Each such pair moves to `today + N weeks` where N is the pair count. Running
    /// twice in one week is a no-op because moved pairs are then due in the future.
    /// If several pairs are overdue at once they keep their order and take
    /// consecutive free weeks from that point on. A target week already held by a
    /// postponed pair is skipped as well: due dates stay unique even when that
    /// stretches the spacing past N weeks.
    pub async fn advance(&self, today: impl WeekAnchor) -> RotaResult<Vec<Assignment>> {
        let _guard = self.mutation_lock.lock().await;
        let today = today.week_monday();

        let snapshot = self.store.list_all()?;
        let pair_count = snapshot.len() as u64;

        let (overdue, upcoming): (Vec<Assignment>, Vec<Assignment>) =
            snapshot.into_iter().partition(|a| a.due_date <= today);
        if overdue.is_empty() {
            debug!(week = %today, "No assignments due, nothing to advance");
            return Ok(Vec::new());
        }

        let mut taken: BTreeSet<NaiveDate> = upcoming.iter().map(|a| a.due_date).collect();
        let mut candidate = add_weeks(today, pair_count);
        let mut updates = Vec::with_capacity(overdue.len());
        let mut advanced = Vec::with_capacity(overdue.len());

        for assignment in overdue {
            let wanted = candidate;
            while taken.contains(&candidate) {
                candidate = add_weeks(candidate, 1);
            }
            if candidate != wanted {
                warn!(
                    pair = %assignment.users,
                    target = %wanted,
                    due = %candidate,
                    "Target week taken, advancing further"
                );
            }
            taken.insert(candidate);
            updates.push((assignment.users.first.clone(), candidate));
            advanced.push(Assignment::new(assignment.users, candidate));
            candidate = add_weeks(candidate, 1);
        }

        self.store.set_due_dates(&updates)?;
        for assignment in &advanced {
            info!(pair = %assignment.users, due = %assignment.due_date, "Assignment advanced");
        }

        Ok(advanced)
    }

    /// Move the user's assignment to a specific week.
    pub async fn set_due_date(&self, user: &str, date: impl WeekAnchor) -> RotaResult<Assignment> {
        let _guard = self.mutation_lock.lock().await;
        let new_date = date.week_monday();

        let assignment = self
            .store
            .find_by_user(user)?
            .ok_or_else(|| RotaError::not_found(user))?;

        if let Some(occupant) = self.store.find_by_due_date(new_date)? {
            if occupant.users != assignment.users {
                return Err(RotaError::ScheduleConflict {
                    date: assignment.due_date,
                    occupied_on: new_date,
                    occupied_by: occupant.users.to_string(),
                });
            }
        }

        self.store.set_due_date(user, new_date)?;
        Ok(Assignment::new(assignment.users, new_date))
    }

    /// Insert the initial pairs on consecutive weeks, unless the rotation already exists.
    ///
    /// Returns the number of assignments created.
    pub async fn seed(&self, pairs: &[UserPair], first_due: impl WeekAnchor) -> RotaResult<usize> {
        let _guard = self.mutation_lock.lock().await;
        if !self.store.is_empty()? {
            debug!("Rotation already seeded");
            return Ok(0);
        }

        let first_due = first_due.week_monday();
        for (i, pair) in pairs.iter().enumerate() {
            self.store
                .insert(&Assignment::new(pair.clone(), add_weeks(first_due, i as u64)))?;
        }
        info!(pairs = pairs.len(), first_due = %first_due, "Rotation seeded");
        Ok(pairs.len())
    }
}
