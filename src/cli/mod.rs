pub mod chat;
pub mod signup;
