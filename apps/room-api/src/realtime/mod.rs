pub mod events;
pub mod fanout;
pub mod reducer;
pub mod server;
