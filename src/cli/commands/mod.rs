pub mod audit;
pub mod blacklist;
pub mod damage;
pub mod version;
