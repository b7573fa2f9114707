pub mod fixtures;
pub mod walker_tests;
