pub mod utils;

mod pagination_tests;
