//! Arena generation phases

pub mod bsp;
pub mod connectivity;
pub mod platforms;
pub mod rails;
pub mod structures;
pub mod zones;
