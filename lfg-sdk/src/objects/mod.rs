pub mod convoke;
pub mod discourse;
