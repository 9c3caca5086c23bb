pub mod character;
pub mod user;

pub use character::{Character, NewCharacter, RecordId, Skill, Spell};
pub use user::{NewUser, User};
