#[path = "mod_connect.rs"]
mod connect_tests;
#[path = "mod_context.rs"]
mod context_tests;
