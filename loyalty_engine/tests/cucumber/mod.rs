mod loyalty_world;

pub use loyalty_world::LoyaltyWorld;
