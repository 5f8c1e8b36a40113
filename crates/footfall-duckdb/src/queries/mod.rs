pub mod realtime;
pub mod window;
