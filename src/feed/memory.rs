use crate::core::error::FeedError;
use crate::core::expense::Expense;
use crate::core::member::{GroupId, Member, MemberId};
use crate::core::settlement::Settlement;
use crate::feed::ports::{FactFeed, FactSink, GroupSnapshot, MemberDirectory};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

#[derive(Debug, Default)]
struct Store {
    groups: HashMap<GroupId, GroupSnapshot>,
    users: HashMap<MemberId, Member>,
}

/// A thread-safe in-memory fact store.
///
/// Uses `Arc<RwLock<..>>` so clones share the same facts. Snapshots are
/// taken under a single read lock, so a balance read never observes half
/// of a concurrent write.
#[derive(Debug, Default, Clone)]
pub struct InMemoryFacts {
    inner: Arc<RwLock<Store>>,
}

impl InMemoryFacts {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from an existing snapshot.
    pub fn from_snapshot(group: GroupId, snapshot: GroupSnapshot) -> Self {
        let facts = Self::new();
        {
            let mut store = match facts.inner.write() {
                Ok(store) => store,
                Err(poisoned) => poisoned.into_inner(),
            };
            for member in &snapshot.members {
                store.users.insert(member.id.clone(), member.clone());
            }
            store.groups.insert(group, snapshot);
        }
        facts
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Store>, FeedError> {
        self.inner
            .read()
            .map_err(|e| FeedError::Unavailable(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Store>, FeedError> {
        self.inner
            .write()
            .map_err(|e| FeedError::Unavailable(e.to_string()))
    }

    /// Create an empty group. Existing groups are left as they are.
    pub fn create_group(&self, group: GroupId) -> Result<(), FeedError> {
        self.write()?.groups.entry(group).or_default();
        Ok(())
    }

    /// Make a user known to the directory without joining any group.
    pub fn register_user(&self, member: Member) -> Result<(), FeedError> {
        self.write()?.users.insert(member.id.clone(), member);
        Ok(())
    }

    /// Add a member to a group's roster, registering the user as well.
    pub fn add_member(&self, group: &GroupId, member: Member) -> Result<(), FeedError> {
        let mut store = self.write()?;
        store.users.insert(member.id.clone(), member.clone());
        let snapshot = store
            .groups
            .get_mut(group)
            .ok_or_else(|| FeedError::GroupNotFound(group.clone()))?;
        if !snapshot.members.iter().any(|m| m.id == member.id) {
            snapshot.members.push(member);
        }
        Ok(())
    }

    fn with_group<T>(
        &self,
        group: &GroupId,
        f: impl FnOnce(&GroupSnapshot) -> T,
    ) -> Result<T, FeedError> {
        let store = self.read()?;
        store
            .groups
            .get(group)
            .map(f)
            .ok_or_else(|| FeedError::GroupNotFound(group.clone()))
    }

    fn with_group_mut<T>(
        &self,
        group: &GroupId,
        f: impl FnOnce(&mut GroupSnapshot) -> Result<T, FeedError>,
    ) -> Result<T, FeedError> {
        let mut store = self.write()?;
        let snapshot = store
            .groups
            .get_mut(group)
            .ok_or_else(|| FeedError::GroupNotFound(group.clone()))?;
        f(snapshot)
    }
}

impl FactFeed for InMemoryFacts {
    fn list_members(&self, group: &GroupId) -> Result<Vec<Member>, FeedError> {
        self.with_group(group, |g| g.members.clone())
    }

    fn list_expenses_with_shares(&self, group: &GroupId) -> Result<Vec<Expense>, FeedError> {
        self.with_group(group, |g| g.expenses.clone())
    }

    fn list_settlements(&self, group: &GroupId) -> Result<Vec<Settlement>, FeedError> {
        self.with_group(group, |g| g.settlements.clone())
    }

    fn snapshot(&self, group: &GroupId) -> Result<GroupSnapshot, FeedError> {
        self.with_group(group, |g| g.clone())
    }
}

impl FactSink for InMemoryFacts {
    fn append_expense(&self, expense: Expense) -> Result<(), FeedError> {
        let group = expense.group_id().clone();
        self.with_group_mut(&group, |g| {
            g.expenses.push(expense);
            Ok(())
        })
    }

    fn append_settlement(&self, settlement: Settlement) -> Result<(), FeedError> {
        let group = settlement.group_id().clone();
        self.with_group_mut(&group, |g| {
            g.settlements.push(settlement);
            Ok(())
        })
    }

    fn mark_share_settled(
        &self,
        group: &GroupId,
        expense_id: Uuid,
        member: &MemberId,
    ) -> Result<(), FeedError> {
        self.with_group_mut(group, |g| {
            let expense = g
                .expenses
                .iter_mut()
                .find(|e| e.id() == expense_id)
                .ok_or_else(|| FeedError::NotFound(format!("expense {}", expense_id)))?;
            if expense.mark_settled(member) {
                Ok(())
            } else {
                Err(FeedError::NotFound(format!(
                    "share of {} in expense {}",
                    member, expense_id
                )))
            }
        })
    }

    fn remove_expense(&self, group: &GroupId, expense_id: Uuid) -> Result<(), FeedError> {
        self.with_group_mut(group, |g| {
            let before = g.expenses.len();
            g.expenses.retain(|e| e.id() != expense_id);
            if g.expenses.len() == before {
                return Err(FeedError::NotFound(format!("expense {}", expense_id)));
            }
            Ok(())
        })
    }
}

impl MemberDirectory for InMemoryFacts {
    fn lookup(&self, member: &MemberId) -> Result<Member, FeedError> {
        self.read()?
            .users
            .get(member)
            .cloned()
            .ok_or_else(|| FeedError::MemberNotFound(member.clone()))
    }
}
