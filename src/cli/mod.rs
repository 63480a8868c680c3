mod client;
mod status;

pub use client::{Client, ClientError, DEFAULT_SERVER_URL};
pub use status::{print_doctor, print_status};
