pub mod media_item;
pub mod picker_session;
pub mod user;
