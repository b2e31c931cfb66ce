pub mod answer_references;
pub mod answers;
pub mod question_images;
pub mod question_tags;
pub mod questions;
pub mod sessions;
pub mod tags;
pub mod users;
pub mod votes;
