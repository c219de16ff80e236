//! Pure combat resolution helpers.
//!
//! Nothing here touches combat state; the state machine calls these and then
//! writes the results back through its own mutation API.

mod damage;
mod hit;

pub use damage::{Absorption, absorb_damage};
pub use hit::{hit_probability, revalidate};
