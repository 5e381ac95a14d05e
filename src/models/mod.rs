pub mod chatmodel;
pub mod complaintmodel;
pub mod deliverablemodel;
pub mod missionmodel;
pub mod portfoliomodel;
pub mod usermodel;
