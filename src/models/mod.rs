// Data models
pub mod appeal;
pub mod guild;
