pub mod bricks;
pub mod constants;
pub mod events;
pub mod game_loop;
pub mod state;
pub mod systems;
pub mod trajectory;
pub mod turn;
