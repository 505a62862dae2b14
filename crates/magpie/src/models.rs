//! These models represent the objects passed around during a chat turn
//!
//! Two wire formats meet here: the OpenAI-style messages/tools sent to the
//! completion endpoint, and the tool requests/results exchanged with the
//! registered tool handlers. Both are converted to and from these internal
//! structs at the boundary (see providers::utils), so the internal models do
//! not exactly match either wire shape.
pub mod message;
pub mod role;
pub mod tool;
