pub mod card;
pub mod deck;
pub mod game_mode;
pub mod hand;
pub mod hand_state;
pub mod play_rules;
pub mod player;
pub mod rank;
pub mod score;
pub mod suit;
pub mod trick;
