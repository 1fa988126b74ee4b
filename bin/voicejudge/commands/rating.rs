//! Rating command

use crate::style::*;
use voice_judge::Rating;

pub fn run(score: f64) {
    let rating = Rating::from_score(score);
    print_key_value("Score", &score.to_string());
    print_key_value_colored("Rating", rating.as_str(), rating_color(rating));
}
