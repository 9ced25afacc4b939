use crate::core::error::FeedError;
use crate::core::expense::Expense;
use crate::core::member::{GroupId, Member, MemberId};
use crate::core::settlement::Settlement;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Every fact about one group as of a single logical instant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupSnapshot {
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub settlements: Vec<Settlement>,
}

/// Read side of the fact store.
///
/// Implementations must serve [`FactFeed::snapshot`] from one consistent
/// read; the default implementation only does so if the store is not being
/// written concurrently.
pub trait FactFeed {
    fn list_members(&self, group: &GroupId) -> Result<Vec<Member>, FeedError>;

    fn list_expenses_with_shares(&self, group: &GroupId) -> Result<Vec<Expense>, FeedError>;

    fn list_settlements(&self, group: &GroupId) -> Result<Vec<Settlement>, FeedError>;

    fn snapshot(&self, group: &GroupId) -> Result<GroupSnapshot, FeedError> {
        Ok(GroupSnapshot {
            members: self.list_members(group)?,
            expenses: self.list_expenses_with_shares(group)?,
            settlements: self.list_settlements(group)?,
        })
    }
}

/// Write side of the fact store. Facts are appended, never edited, except
/// for flipping a share's settled flag.
pub trait FactSink {
    fn append_expense(&self, expense: Expense) -> Result<(), FeedError>;

    fn append_settlement(&self, settlement: Settlement) -> Result<(), FeedError>;

    fn mark_share_settled(
        &self,
        group: &GroupId,
        expense_id: Uuid,
        member: &MemberId,
    ) -> Result<(), FeedError>;

    fn remove_expense(&self, group: &GroupId, expense_id: Uuid) -> Result<(), FeedError>;
}

/// User lookup, used for members that are not on a group's roster.
pub trait MemberDirectory {
    fn lookup(&self, member: &MemberId) -> Result<Member, FeedError>;
}
