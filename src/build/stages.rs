pub mod articles;
pub mod knowledge;
pub mod load;
