pub mod links;
pub mod serve;
