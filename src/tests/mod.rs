pub mod merkle_tests;
pub mod abi_tests;
pub mod event_tests;
