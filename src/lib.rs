//! Arena Duel - two-player arena game over a peer-to-peer link
//!
//! One peer hosts and owns the ball and the score; the other dials in and
//! mirrors them. Both players can also share a single device.

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod net;
pub mod util;
