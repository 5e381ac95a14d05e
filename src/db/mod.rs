pub mod applicationdb;
pub mod chatdb;
pub mod complaintdb;
pub mod db;
pub mod deliverabledb;
pub mod missiondb;
pub mod profiledb;
pub mod userdb;


#[cfg(test)]
pub mod memory;

use self::{
    applicationdb::ApplicationExt, chatdb::ChatExt, complaintdb::ComplaintExt,
    deliverabledb::DeliverableExt, missiondb::MissionExt, profiledb::ProfileExt, userdb::UserExt,
};

/// Everything the engines need from persistence. `DBClient` is the
/// production implementation.
pub trait MarketStore:
    UserExt
    + ProfileExt
    + MissionExt
    + ApplicationExt
    + DeliverableExt
    + ChatExt
    + ComplaintExt
    + Send
    + Sync
{
}

impl<T> MarketStore for T where
    T: UserExt
        + ProfileExt
        + MissionExt
        + ApplicationExt
        + DeliverableExt
        + ChatExt
        + ComplaintExt
        + Send
        + Sync
{
}
