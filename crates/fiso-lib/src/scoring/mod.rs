//! Provider scoring and recommendation
//!
//! This module provides:
//! - A weighted efficiency score combining latency, cost and availability
//! - Ranking of the providers that answered a round, with a readable justification

mod recommender;
mod scorer;

pub use recommender::{
    availability_tier, cost_tier, rank, recommend, response_time_tier, Tier,
};
pub use scorer::{
    efficiency_score, AVAILABILITY_WEIGHT, COST_CEILING, COST_WEIGHT, RESPONSE_TIME_CEILING_MS,
    RESPONSE_TIME_WEIGHT,
};
