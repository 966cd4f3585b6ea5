pub mod clock;
pub mod collision;
pub mod engine;
pub mod entity;
pub mod food;
pub mod highscores;
pub mod npc;
pub mod physics;
pub mod split;
pub mod world;
