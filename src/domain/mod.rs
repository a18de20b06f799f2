pub mod ladder;
pub mod question;
pub mod rules;
