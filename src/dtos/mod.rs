pub mod admindtos;
pub mod chatdtos;
pub mod commondtos;
pub mod deliverabledtos;
pub mod missiondtos;
pub mod profiledtos;
pub mod userdtos;
