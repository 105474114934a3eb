pub mod apple_connect;
pub mod apple_feed;
pub mod google_csv;
