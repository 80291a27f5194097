pub mod login_session;
pub mod media_browser;
pub mod oauth;
pub mod picker_session;
pub mod session_store;
