pub mod economy;
pub mod game;
pub mod moderation;
pub mod verification;
