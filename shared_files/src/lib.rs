pub mod core_header;
pub mod greeter;
