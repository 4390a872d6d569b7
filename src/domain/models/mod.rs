pub mod cat;
pub mod finance;
pub mod health;
pub mod pregnancy;
pub mod settings;
pub mod todo;
